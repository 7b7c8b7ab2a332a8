//! # Warehouse
//!
//! 1つのプロジェクトとデフォルトデータセットに紐づくクライアントファサード。
//! すべての操作はサービス側の処理完了を待ってから返る。

use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use super::dto::warehouse_options::WarehouseOptions;
use super::use_cases::load_csv::LoadCsvUseCase;
use super::use_cases::manage_datasets::ManageDatasetsUseCase;
use super::use_cases::manage_tables::ManageTablesUseCase;
use super::use_cases::run_query::{QueryRows, RunQueryUseCase};
use crate::domain::entities::schema::TableSchema;
use crate::domain::entities::table::{
    IfExists, PartitionGranularity, TableDescription, TimePartitioning,
};
use crate::domain::error::{Result, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;
use crate::domain::services::identifier::{validate_dataset_id, validate_project_id};

/// ウェアハウスクライアント
///
/// 構築後は不変。`with_dataset` は同じ接続を共有する別のハンドルを返す。
pub struct Warehouse<R: WarehouseRepository> {
    project_id: String,
    dataset_id: String,
    options: WarehouseOptions,
    query: Arc<RunQueryUseCase<R>>,
    tables: Arc<ManageTablesUseCase<R>>,
    loads: Arc<LoadCsvUseCase<R>>,
    datasets: Arc<ManageDatasetsUseCase<R>>,
}

impl<R: WarehouseRepository> Clone for Warehouse<R> {
    fn clone(&self) -> Self {
        Self {
            project_id: self.project_id.clone(),
            dataset_id: self.dataset_id.clone(),
            options: self.options.clone(),
            query: self.query.clone(),
            tables: self.tables.clone(),
            loads: self.loads.clone(),
            datasets: self.datasets.clone(),
        }
    }
}

impl<R: WarehouseRepository> Warehouse<R> {
    /// 新しいファサードを作成
    ///
    /// # Arguments
    ///
    /// * `repository` - サービスへのリポジトリ実装
    /// * `project_id` - プロジェクトID
    /// * `dataset_id` - デフォルトデータセット
    /// * `options` - ポーリング・タイムアウト等の設定
    pub fn new(
        repository: Arc<R>,
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        options: WarehouseOptions,
    ) -> Result<Self> {
        let project_id = project_id.into();
        let dataset_id = dataset_id.into();
        validate_project_id(&project_id)?;
        validate_dataset_id(&dataset_id)?;

        let query = Arc::new(RunQueryUseCase::new(
            repository.clone(),
            project_id.clone(),
            options.clone(),
        ));
        let tables = Arc::new(ManageTablesUseCase::new(repository.clone(), project_id.clone()));
        let loads = Arc::new(LoadCsvUseCase::new(
            repository,
            project_id.clone(),
            options.clone(),
        ));
        let datasets = Arc::new(ManageDatasetsUseCase::new(
            query.clone(),
            project_id.clone(),
            options.clone(),
        ));

        Ok(Self {
            project_id,
            dataset_id,
            options,
            query,
            tables,
            loads,
            datasets,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn options(&self) -> &WarehouseOptions {
        &self.options
    }

    /// デフォルトデータセットを切り替えたハンドルを返す
    pub fn with_dataset(&self, dataset_id: &str) -> Result<Self> {
        validate_dataset_id(dataset_id)?;
        let mut warehouse = self.clone();
        warehouse.dataset_id = dataset_id.to_string();
        Ok(warehouse)
    }

    /// クエリを実行して結果を表形式で返す
    ///
    /// DDL/DML のように結果スキーマがない場合は列のない空の RecordBatch
    pub async fn query(&self, sql: &str) -> Result<RecordBatch> {
        self.query.execute(sql).await
    }

    /// クエリを実行して変換前の行を返す
    pub async fn query_raw(&self, sql: &str) -> Result<QueryRows> {
        self.query
            .fetch(sql, self.options.use_legacy_sql, WarehouseError::Query)
            .await
    }

    pub async fn create_table(&self, name: &str, schema: &TableSchema) -> Result<()> {
        self.tables.create(&self.dataset_id, name, schema, None).await
    }

    /// TIMESTAMP 列で日単位に分割されたテーブルを作成
    pub async fn create_partitioned_table(
        &self,
        name: &str,
        schema: &TableSchema,
        column: &str,
    ) -> Result<()> {
        self.tables
            .create(
                &self.dataset_id,
                name,
                schema,
                Some(TimePartitioning::daily(column)),
            )
            .await
    }

    /// CSV（`gs://` URI）からテーブルを作成
    pub async fn create_table_from_csv(
        &self,
        name: &str,
        schema: &TableSchema,
        source_uri: &str,
        if_exists: IfExists,
    ) -> Result<()> {
        self.loads
            .create_from_csv(&self.dataset_id, name, schema, source_uri, if_exists)
            .await
    }

    /// 既存テーブルに CSV を追記
    pub async fn append_from_csv(&self, name: &str, source_uri: &str) -> Result<()> {
        self.loads
            .append_from_csv(&self.dataset_id, name, source_uri)
            .await
    }

    pub async fn drop_table(&self, name: &str) -> Result<()> {
        self.tables.drop_table(&self.dataset_id, name).await
    }

    /// テーブル（`name$YYYYMMDD` でパーティション）のメタデータ
    pub async fn desc(&self, name: &str) -> Result<TableDescription> {
        self.tables.describe(&self.dataset_id, name).await
    }

    /// TIMESTAMP 列で日単位の時間パーティショニングを設定
    pub async fn time_partition(&self, name: &str, column: &str) -> Result<()> {
        self.time_partition_by(name, column, PartitionGranularity::Day)
            .await
    }

    pub async fn time_partition_by(
        &self,
        name: &str,
        column: &str,
        granularity: PartitionGranularity,
    ) -> Result<()> {
        self.tables
            .time_partition(&self.dataset_id, name, column, granularity)
            .await
    }

    /// デフォルトデータセットのテーブル名一覧
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.datasets.list_tables(&self.dataset_id).await
    }

    pub async fn list_datasets(&self) -> Result<Vec<String>> {
        self.datasets.list_datasets().await
    }

    pub async fn create_dataset(&self, name: &str, description: Option<&str>) -> Result<()> {
        self.datasets.create_dataset(name, description).await
    }

    pub async fn delete_dataset(&self, name: &str, delete_contents: bool) -> Result<()> {
        self.datasets.delete_dataset(name, delete_contents).await
    }
}
