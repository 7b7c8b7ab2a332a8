//! # Domain Layer
//!
//! このモジュールはウェアハウス操作の核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - BigQuery SDK に依存しない
//! - フレームワークに依存しない
//! - サービスとの通信は Repository trait を通じてのみ行う
//!
//! ## 構成要素
//!
//! - **entities**: スキーマ・テーブル・ジョブ・結果ページ
//! - **error**: サービスエラーとファサードのエラー分類
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: Domain Service（検証と表形式への変換）

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
