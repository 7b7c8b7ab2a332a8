//! # littlebq
//!
//! BigQuery のクエリ実行とテーブル管理のための小さなクライアント
//!
//! このプロジェクトはクリーンアーキテクチャを採用しており、以下の4層で構成されています：
//!
//! - **Domain層**: エンティティ、エラー分類、リポジトリ trait（外部依存なし）
//! - **Application層**: ユースケースとファサード `Warehouse`
//! - **Adapter層**: 外部システムとの統合（BigQuery, 設定ファイル, 認証）
//! - **Driver層**: CLI、同期ラッパー、依存性注入

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
// カバレッジ計測時に外部サービス依存コードを除外するために使用
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

// Domain層（純粋なビジネスロジック）
pub mod domain;

// Application層（ユースケース）
pub mod application;

// Adapter層（Infrastructure）
pub mod adapter;

// Driver層（Presentation）
pub mod driver;

pub use adapter::auth::Credentials;
pub use adapter::connect;
pub use application::dto::warehouse_options::{PollOptions, WarehouseOptions};
pub use application::warehouse::Warehouse;
pub use domain::error::{ServiceError, WarehouseError};
pub use driver::BlockingWarehouse;
