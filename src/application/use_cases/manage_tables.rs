//! # Manage Tables Use Case
//!
//! テーブルの作成・削除・記述・時間パーティショニング

use std::sync::Arc;

use log::info;

use crate::domain::entities::schema::{ColumnType, TableSchema};
use crate::domain::entities::table::{
    PartitionGranularity, TableDefinition, TableDescription, TableRef, TimePartitioning,
};
use crate::domain::error::{Result, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;
use crate::domain::services::identifier::{
    validate_dataset_id, validate_table_name, validate_table_or_partition,
};

/// パーティション列が TIMESTAMP 型であることを確認
pub fn check_partition_column(table: &str, schema: &TableSchema, column: &str) -> Result<()> {
    let found = schema
        .column(column)
        .ok_or_else(|| WarehouseError::ColumnNotFound {
            table: table.to_string(),
            column: column.to_string(),
        })?;
    if found.column_type != ColumnType::Timestamp {
        return Err(WarehouseError::ColumnType {
            column: found.name.clone(),
            actual: found.column_type.to_string(),
            expected: ColumnType::Timestamp.to_string(),
        });
    }
    Ok(())
}

/// テーブル管理ユースケース
pub struct ManageTablesUseCase<R: WarehouseRepository> {
    repository: Arc<R>,
    project_id: String,
}

impl<R: WarehouseRepository> ManageTablesUseCase<R> {
    pub fn new(repository: Arc<R>, project_id: String) -> Self {
        Self {
            repository,
            project_id,
        }
    }

    fn table_ref(&self, dataset: &str, name: &str) -> TableRef {
        TableRef::new(&self.project_id, dataset, name)
    }

    /// テーブルを作成
    ///
    /// # Errors
    ///
    /// 同名のテーブルが存在する場合は `TableExists`
    pub async fn create(
        &self,
        dataset: &str,
        name: &str,
        schema: &TableSchema,
        time_partitioning: Option<TimePartitioning>,
    ) -> Result<()> {
        validate_dataset_id(dataset)?;
        validate_table_name(name)?;
        if let Some(field) = time_partitioning.as_ref().and_then(|p| p.field.as_deref()) {
            check_partition_column(name, schema, field)?;
        }

        let definition = TableDefinition {
            reference: self.table_ref(dataset, name),
            schema: schema.clone(),
            time_partitioning,
        };
        self.repository
            .create_table(&definition)
            .await
            .map_err(|e| {
                WarehouseError::classify(e, |e| {
                    if e.is_already_exists() {
                        WarehouseError::TableExists {
                            table: name.to_string(),
                            source: Some(e),
                        }
                    } else {
                        WarehouseError::Service(e)
                    }
                })
            })?;
        info!("Created table {}", definition.reference);
        Ok(())
    }

    /// テーブルを削除
    pub async fn drop_table(&self, dataset: &str, name: &str) -> Result<()> {
        validate_dataset_id(dataset)?;
        validate_table_name(name)?;
        let reference = self.table_ref(dataset, name);
        self.repository
            .delete_table(&reference)
            .await
            .map_err(|e| WarehouseError::classify(e, WarehouseError::for_table(name)))?;
        info!("Dropped table {}", reference);
        Ok(())
    }

    /// テーブル（またはパーティション）を記述
    pub async fn describe(&self, dataset: &str, name: &str) -> Result<TableDescription> {
        validate_dataset_id(dataset)?;
        validate_table_or_partition(name)?;
        self.repository
            .get_table(&self.table_ref(dataset, name))
            .await
            .map_err(|e| WarehouseError::classify(e, WarehouseError::for_table(name)))
    }

    /// 既存テーブルを TIMESTAMP 列で時間パーティション化
    ///
    /// 列の検証に失敗した場合、テーブルは変更しない
    pub async fn time_partition(
        &self,
        dataset: &str,
        name: &str,
        column: &str,
        granularity: PartitionGranularity,
    ) -> Result<()> {
        validate_table_name(name)?;
        let description = self.describe(dataset, name).await?;
        check_partition_column(name, &description.schema, column)?;

        let partitioning = TimePartitioning {
            granularity,
            field: Some(column.to_string()),
        };
        self.repository
            .set_time_partitioning(&description.table, &partitioning)
            .await
            .map_err(|e| WarehouseError::classify(e, WarehouseError::for_table(name)))?;
        info!(
            "Partitioned table {} by {} on {}",
            description.table,
            granularity.as_str(),
            column
        );
        Ok(())
    }
}
