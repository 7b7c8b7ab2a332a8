//! # Warehouse Repository Trait
//!
//! データウェアハウスサービスへの個々のリクエストを抽象化
//!
//! 各メソッドは1回のリクエストに対応し、ジョブ完了の待機や結果の変換は
//! Application層が順序付けする。

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::job::{JobRef, JobSpec, JobStatus};
use crate::domain::entities::result_page::ResultPage;
use crate::domain::entities::table::{TableDefinition, TableDescription, TableRef, TimePartitioning};
use crate::domain::error::ServiceError;

/// ウェアハウスリポジトリ
///
/// 本番では BigQuery REST API、テストではスタンドインで実装する
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    /// ジョブを投入し、投入直後の状態を返す
    async fn insert_job(&self, job: &JobSpec) -> Result<JobStatus, ServiceError>;

    /// ジョブの現在の状態を取得
    async fn get_job(&self, job: &JobRef) -> Result<JobStatus, ServiceError>;

    /// 完了したクエリジョブの結果を1ページ取得
    async fn get_query_results(
        &self,
        job: &JobRef,
        page_token: Option<String>,
    ) -> Result<ResultPage, ServiceError>;

    /// テーブルを作成（既に存在する場合は 409）
    async fn create_table(&self, table: &TableDefinition) -> Result<(), ServiceError>;

    /// テーブルのメタデータを取得（存在しない場合は 404）
    async fn get_table(&self, table: &TableRef) -> Result<TableDescription, ServiceError>;

    /// テーブルの時間パーティショニングを変更
    async fn set_time_partitioning(
        &self,
        table: &TableRef,
        partitioning: &TimePartitioning,
    ) -> Result<(), ServiceError>;

    /// テーブルを削除（存在しない場合は 404）
    async fn delete_table(&self, table: &TableRef) -> Result<(), ServiceError>;
}
