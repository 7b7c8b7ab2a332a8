//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **schema**: カラム型とテーブルスキーマ
//! - **table**: テーブル参照・パーティショニング・テーブル記述
//! - **job**: クエリ/ロードジョブと状態
//! - **result_page**: クエリ結果の生データ

pub mod job;
pub mod result_page;
pub mod schema;
pub mod table;
