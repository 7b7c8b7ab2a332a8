//! # Manage Datasets Use Case
//!
//! データセットとテーブル一覧の操作（標準SQLのクエリジョブで実行）

use std::sync::Arc;

use log::info;

use super::run_query::{QueryRows, RunQueryUseCase};
use crate::application::dto::warehouse_options::WarehouseOptions;
use crate::domain::entities::result_page::RawValue;
use crate::domain::error::{Result, WarehouseError};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;
use crate::domain::services::identifier::{quote_identifier, quote_string, validate_dataset_id};

pub const DEFAULT_DATASET_DESCRIPTION: &str = "Dataset created by littlebq";

/// データセット管理ユースケース
pub struct ManageDatasetsUseCase<R: WarehouseRepository> {
    query: Arc<RunQueryUseCase<R>>,
    project_id: String,
    options: WarehouseOptions,
}

impl<R: WarehouseRepository> ManageDatasetsUseCase<R> {
    pub fn new(
        query: Arc<RunQueryUseCase<R>>,
        project_id: String,
        options: WarehouseOptions,
    ) -> Self {
        Self {
            query,
            project_id,
            options,
        }
    }

    /// データセット内のテーブル名一覧
    pub async fn list_tables(&self, dataset: &str) -> Result<Vec<String>> {
        validate_dataset_id(dataset)?;
        let sql = format!(
            "SELECT table_name FROM {}.INFORMATION_SCHEMA.TABLES ORDER BY table_name",
            quote_identifier(&[&self.project_id, dataset])
        );
        let rows = self.run(&sql).await?;
        Ok(first_column(&rows))
    }

    /// プロジェクト内（設定リージョン）のデータセット名一覧
    pub async fn list_datasets(&self) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT schema_name FROM {}.{}.INFORMATION_SCHEMA.SCHEMATA ORDER BY schema_name",
            quote_identifier(&[&self.project_id]),
            quote_identifier(&[&self.options.region_qualifier()])
        );
        let rows = self.run(&sql).await?;
        Ok(first_column(&rows))
    }

    pub async fn create_dataset(&self, name: &str, description: Option<&str>) -> Result<()> {
        validate_dataset_id(name)?;
        let mut options = vec![format!(
            "description={}",
            quote_string(description.unwrap_or(DEFAULT_DATASET_DESCRIPTION))
        )];
        if let Some(location) = &self.options.location {
            options.push(format!("location={}", quote_string(location)));
        }
        let sql = format!(
            "CREATE SCHEMA {} OPTIONS({})",
            quote_identifier(&[&self.project_id, name]),
            options.join(", ")
        );
        self.run(&sql).await?;
        info!("Created dataset {}.{}", self.project_id, name);
        Ok(())
    }

    /// データセットを削除
    ///
    /// `delete_contents` が false でテーブルが残っている場合、サービス側で失敗する
    pub async fn delete_dataset(&self, name: &str, delete_contents: bool) -> Result<()> {
        validate_dataset_id(name)?;
        let mut sql = format!("DROP SCHEMA {}", quote_identifier(&[&self.project_id, name]));
        if delete_contents {
            sql.push_str(" CASCADE");
        }
        self.run(&sql).await?;
        info!("Deleted dataset {}.{}", self.project_id, name);
        Ok(())
    }

    async fn run(&self, sql: &str) -> Result<QueryRows> {
        self.query.fetch(sql, false, WarehouseError::Service).await
    }
}

fn first_column(rows: &QueryRows) -> Vec<String> {
    rows.rows
        .iter()
        .filter_map(|row| match row.first() {
            Some(RawValue::Scalar(value)) => Some(value.clone()),
            _ => None,
        })
        .collect()
}
