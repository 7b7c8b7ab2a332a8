//! Blocking Warehouse
//!
//! 非同期ファサードを専用の current-thread ランタイムで同期的に呼び出すラッパー。
//! 非同期コンテキストの内側から呼び出すとパニックする（tokio の `block_on` の制約）。

use arrow::record_batch::RecordBatch;
use tokio::runtime::{Builder, Runtime};

use crate::adapter::auth::Credentials;
use crate::adapter::bigquery::BigQueryWarehouseRepository;
use crate::application::dto::warehouse_options::WarehouseOptions;
use crate::application::warehouse::Warehouse;
use crate::domain::entities::schema::TableSchema;
use crate::domain::entities::table::{IfExists, PartitionGranularity, TableDescription};
use crate::domain::error::Result;
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// 同期版ウェアハウスクライアント
pub struct BlockingWarehouse<R: WarehouseRepository = BigQueryWarehouseRepository> {
    runtime: Runtime,
    inner: Warehouse<R>,
}

impl BlockingWarehouse<BigQueryWarehouseRepository> {
    /// BigQuery に接続
    pub fn connect(
        project_id: &str,
        dataset_id: &str,
        credentials: &Credentials,
        options: WarehouseOptions,
    ) -> Result<Self> {
        let runtime = runtime()?;
        let inner = runtime.block_on(crate::adapter::connect(
            project_id,
            dataset_id,
            credentials,
            options,
        ))?;
        Ok(Self { runtime, inner })
    }
}

impl<R: WarehouseRepository> BlockingWarehouse<R> {
    pub fn new(inner: Warehouse<R>) -> Result<Self> {
        Ok(Self {
            runtime: runtime()?,
            inner,
        })
    }

    pub fn inner(&self) -> &Warehouse<R> {
        &self.inner
    }

    pub fn project_id(&self) -> &str {
        self.inner.project_id()
    }

    pub fn dataset_id(&self) -> &str {
        self.inner.dataset_id()
    }

    /// デフォルトデータセットを切り替えたクライアントを返す（ランタイムは新規）
    pub fn with_dataset(&self, dataset_id: &str) -> Result<Self> {
        Self::new(self.inner.with_dataset(dataset_id)?)
    }

    pub fn query(&self, sql: &str) -> Result<RecordBatch> {
        self.runtime.block_on(self.inner.query(sql))
    }

    pub fn create_table(&self, name: &str, schema: &TableSchema) -> Result<()> {
        self.runtime.block_on(self.inner.create_table(name, schema))
    }

    pub fn create_partitioned_table(
        &self,
        name: &str,
        schema: &TableSchema,
        column: &str,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.create_partitioned_table(name, schema, column))
    }

    pub fn create_table_from_csv(
        &self,
        name: &str,
        schema: &TableSchema,
        source_uri: &str,
        if_exists: IfExists,
    ) -> Result<()> {
        self.runtime.block_on(
            self.inner
                .create_table_from_csv(name, schema, source_uri, if_exists),
        )
    }

    pub fn append_from_csv(&self, name: &str, source_uri: &str) -> Result<()> {
        self.runtime
            .block_on(self.inner.append_from_csv(name, source_uri))
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.runtime.block_on(self.inner.drop_table(name))
    }

    pub fn desc(&self, name: &str) -> Result<TableDescription> {
        self.runtime.block_on(self.inner.desc(name))
    }

    pub fn time_partition(&self, name: &str, column: &str) -> Result<()> {
        self.runtime.block_on(self.inner.time_partition(name, column))
    }

    pub fn time_partition_by(
        &self,
        name: &str,
        column: &str,
        granularity: PartitionGranularity,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.time_partition_by(name, column, granularity))
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.list_tables())
    }

    pub fn list_datasets(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.list_datasets())
    }

    pub fn create_dataset(&self, name: &str, description: Option<&str>) -> Result<()> {
        self.runtime
            .block_on(self.inner.create_dataset(name, description))
    }

    pub fn delete_dataset(&self, name: &str, delete_contents: bool) -> Result<()> {
        self.runtime
            .block_on(self.inner.delete_dataset(name, delete_contents))
    }
}
