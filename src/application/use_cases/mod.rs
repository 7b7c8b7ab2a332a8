//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **WaitForJobUseCase**: ジョブ完了待ち（上限付きポーリング）
//! - **RunQueryUseCase**: クエリ実行と結果の表形式への変換
//! - **ManageTablesUseCase**: テーブルの作成・削除・記述・パーティション化
//! - **LoadCsvUseCase**: Cloud Storage 上の CSV のロード
//! - **ManageDatasetsUseCase**: データセット・テーブル一覧の操作

pub mod load_csv;
pub mod manage_datasets;
pub mod manage_tables;
pub mod run_query;
pub mod wait_for_job;
