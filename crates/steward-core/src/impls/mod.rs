//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryCloud**: テスト用のプロバイダー（呼び出し回数を記録）
//! - **FixtureCloud**: JSON ファイルを正本とするプロバイダー（CLI 用）
//!
//! 実プロバイダーの SDK 実装は `CloudClient` を実装する別クレートに置きます。

pub mod fixture;
pub mod memory;

pub use self::fixture::{FixtureCloud, FixtureDocument};
pub use self::memory::{CallCounts, InMemoryCloud, RegistryError, Step, WaiterScript};
