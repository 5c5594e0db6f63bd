//! Ports - 抽象化レイヤー
//!
//! 外部システム（クラウドプロバイダー API、タイマー）へのインターフェースを定義し、
//! 実装の詳細を隠蔽します。実装は `impls` を参照してください。

pub mod clock;
pub mod cloud;

pub use self::clock::{Clock, RecordingClock, SystemClock};
pub use self::cloud::{CloudClient, Waiter};
