//! # Driver Layer (Presentation)
//!
//! CLIやその他の外部インターフェースを提供
//!
//! ## 特徴
//!
//! - ファサードを呼び出してビジネスフローを起動
//! - 依存性注入（DI）を行い、全てを組み立てる
//! - ユーザーとのインターフェース
//!
//! ## 構成要素
//!
//! - **cli**: CLI引数のパース
//! - **workflow**: サブコマンドの実行と結果の整形
//! - **blocking**: 同期呼び出し用のラッパー

pub mod blocking;
pub mod cli;
pub mod workflow;

pub use blocking::BlockingWarehouse;
pub use cli::{Args, Command};
pub use workflow::CommandRunner;
