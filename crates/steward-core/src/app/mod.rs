//! App - ports の上に組み立てたユースケース
//!
//! - poller: waiter を終端状態まで回す
//! - reconciler: タグを desired に合わせる
//! - invoker: 任意の operation を 1 回呼ぶ

pub mod invoker;
pub mod poller;
pub mod reconciler;

pub use self::invoker::{Invocation, Invoker};
pub use self::poller::Poller;
pub use self::reconciler::{Reconciler, Reconciliation, TagMode};
