//! steward-core
//!
//! Building blocks for reconciling cloud resources against a desired state.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（tags, wait, errors, report, ids）
//! - **ports**: 抽象化レイヤー（CloudClient, Waiter, Clock）
//! - **app**: ユースケース（Poller, Reconciler, Invoker）
//! - **impls**: 実装（InMemoryCloud, FixtureCloud）
//! - **config**: 設定の読み込み（ファイル + 環境変数）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::app::{Invoker, Poller, Reconciler, TagMode};
pub use self::domain::StewardError;
