//! Command Execution
//!
//! サブコマンドをファサードの操作に対応付けて実行し、表示用の文字列を返す

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use log::info;

use super::cli::Command;
use crate::application::warehouse::Warehouse;
use crate::domain::entities::schema::TableSchema;
use crate::domain::entities::table::{IfExists, TableDescription};
use crate::domain::repositories::warehouse_repository::WarehouseRepository;

/// Render a result table, or a short notice for statements without rows
pub fn render_batch(batch: &RecordBatch) -> Result<String> {
    if batch.num_columns() == 0 {
        return Ok("✓ Statement executed".to_string());
    }
    let table = pretty_format_batches(std::slice::from_ref(batch))
        .context("Failed to format result table")?;
    Ok(format!("{}\n({} rows)", table, batch.num_rows()))
}

/// Render table metadata followed by its schema
pub fn render_description(description: &TableDescription) -> Result<String> {
    let mut lines = vec![format!("Table: {}", description.table)];
    if let Some(text) = &description.description {
        lines.push(format!("Description: {}", text));
    }
    if let Some(rows) = description.num_rows {
        lines.push(format!("Rows: {}", rows));
    }
    if let Some(bytes) = description.num_bytes {
        lines.push(format!("Bytes: {}", bytes));
    }
    if let Some(created) = description.creation_time {
        lines.push(format!("Created: {}", created.to_rfc3339()));
    }
    if let Some(partitioning) = &description.time_partitioning {
        lines.push(format!(
            "Partitioning: {} on {}",
            partitioning.granularity.as_str(),
            partitioning.field.as_deref().unwrap_or("_PARTITIONTIME")
        ));
    }
    let schema = pretty_format_batches(&[description.to_record_batch()?])
        .context("Failed to format table schema")?;
    lines.push(schema.to_string());
    Ok(lines.join("\n"))
}

fn render_names(kind: &str, names: &[String]) -> String {
    if names.is_empty() {
        return format!("No {} found.", kind);
    }
    names.join("\n")
}

/// Command Runner
pub struct CommandRunner<R: WarehouseRepository> {
    warehouse: Warehouse<R>,
}

impl<R: WarehouseRepository> CommandRunner<R> {
    pub fn new(warehouse: Warehouse<R>) -> Self {
        Self { warehouse }
    }

    /// Execute one command and return the text to print
    pub async fn run(&self, command: &Command) -> Result<String> {
        let warehouse = &self.warehouse;
        info!(
            "Running {:?} on {}.{}",
            command,
            warehouse.project_id(),
            warehouse.dataset_id()
        );

        let output = match command {
            Command::Query { sql } => {
                let batch = warehouse.query(sql).await.context("Query failed")?;
                render_batch(&batch)?
            }
            Command::CreateTable {
                name,
                columns,
                partition_column,
            } => {
                let schema = TableSchema::new(columns.clone())?;
                match partition_column {
                    Some(column) => warehouse
                        .create_partitioned_table(name, &schema, column)
                        .await
                        .with_context(|| format!("Failed to create table {}", name))?,
                    None => warehouse
                        .create_table(name, &schema)
                        .await
                        .with_context(|| format!("Failed to create table {}", name))?,
                }
                format!("✓ Created table {}", name)
            }
            Command::LoadCsv {
                name,
                uri,
                columns,
                overwrite,
            } => {
                let schema = TableSchema::new(columns.clone())?;
                let if_exists = if *overwrite {
                    IfExists::Overwrite
                } else {
                    IfExists::Fail
                };
                warehouse
                    .create_table_from_csv(name, &schema, uri, if_exists)
                    .await
                    .with_context(|| format!("Failed to load {} into {}", uri, name))?;
                format!("✓ Loaded {} into {}", uri, name)
            }
            Command::AppendCsv { name, uri } => {
                warehouse
                    .append_from_csv(name, uri)
                    .await
                    .with_context(|| format!("Failed to append {} to {}", uri, name))?;
                format!("✓ Appended {} to {}", uri, name)
            }
            Command::DropTable { name } => {
                warehouse
                    .drop_table(name)
                    .await
                    .with_context(|| format!("Failed to drop table {}", name))?;
                format!("✓ Dropped table {}", name)
            }
            Command::Desc { name } => {
                let description = warehouse
                    .desc(name)
                    .await
                    .with_context(|| format!("Failed to describe {}", name))?;
                render_description(&description)?
            }
            Command::Partition { name, column, by } => {
                warehouse
                    .time_partition_by(name, column, *by)
                    .await
                    .with_context(|| format!("Failed to partition {}", name))?;
                format!("✓ Partitioned {} by {} on {}", name, by.as_str(), column)
            }
            Command::Tables => {
                let tables = warehouse.list_tables().await.context("Failed to list tables")?;
                render_names("tables", &tables)
            }
            Command::Datasets => {
                let datasets = warehouse
                    .list_datasets()
                    .await
                    .context("Failed to list datasets")?;
                render_names("datasets", &datasets)
            }
            Command::CreateDataset { name, description } => {
                warehouse
                    .create_dataset(name, description.as_deref())
                    .await
                    .with_context(|| format!("Failed to create dataset {}", name))?;
                format!("✓ Created dataset {}", name)
            }
            Command::DropDataset {
                name,
                delete_contents,
            } => {
                warehouse
                    .delete_dataset(name, *delete_contents)
                    .await
                    .with_context(|| format!("Failed to delete dataset {}", name))?;
                format!("✓ Deleted dataset {}", name)
            }
        };
        Ok(output)
    }
}
