//! # Table Entities
//!
//! テーブル参照・パーティショニング・テーブル記述

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};

use super::schema::{Column, TableSchema};
use crate::domain::error::{Result, WarehouseError};

/// テーブル参照（プロジェクト・データセット・テーブル）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// パーティションの粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PartitionGranularity {
    Hour,
    #[default]
    Day,
    Month,
    Year,
}

impl PartitionGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionGranularity::Hour => "HOUR",
            PartitionGranularity::Day => "DAY",
            PartitionGranularity::Month => "MONTH",
            PartitionGranularity::Year => "YEAR",
        }
    }
}

impl FromStr for PartitionGranularity {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HOUR" => Ok(PartitionGranularity::Hour),
            "DAY" => Ok(PartitionGranularity::Day),
            "MONTH" => Ok(PartitionGranularity::Month),
            "YEAR" => Ok(PartitionGranularity::Year),
            other => Err(WarehouseError::invalid(format!(
                "unsupported partition granularity: {}",
                other
            ))),
        }
    }
}

/// 時間パーティショニング設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePartitioning {
    pub granularity: PartitionGranularity,
    /// パーティション列（`None` は取り込み時間によるパーティション）
    pub field: Option<String>,
}

impl TimePartitioning {
    pub fn daily(field: impl Into<String>) -> Self {
        Self {
            granularity: PartitionGranularity::Day,
            field: Some(field.into()),
        }
    }
}

/// 作成するテーブルの定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub reference: TableRef,
    pub schema: TableSchema,
    pub time_partitioning: Option<TimePartitioning>,
}

/// 既存テーブルがある場合の CSV 作成の振る舞い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfExists {
    /// `TableExists` で失敗する
    #[default]
    Fail,
    /// 既存の内容を置き換える
    Overwrite,
}

/// テーブル（またはパーティション）の記述
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub table: TableRef,
    pub schema: TableSchema,
    pub num_rows: Option<u64>,
    pub num_bytes: Option<u64>,
    pub time_partitioning: Option<TimePartitioning>,
    pub creation_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl TableDescription {
    /// スキーマを `(column_name, data_type, mode)` の表形式で返す
    ///
    /// RECORD のサブフィールドは `parent.child` として展開する。
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut names = Vec::new();
        let mut types = Vec::new();
        let mut modes = Vec::new();
        flatten_columns("", self.schema.columns(), &mut |name, column| {
            names.push(name);
            types.push(column.column_type.as_str());
            modes.push(column.mode.as_str());
        });

        let schema = Arc::new(Schema::new(vec![
            Field::new("column_name", DataType::Utf8, false),
            Field::new("data_type", DataType::Utf8, false),
            Field::new("mode", DataType::Utf8, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(names)),
            Arc::new(StringArray::from(types)),
            Arc::new(StringArray::from(modes)),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

fn flatten_columns(prefix: &str, columns: &[Column], visit: &mut dyn FnMut(String, &Column)) {
    for column in columns {
        let name = if prefix.is_empty() {
            column.name.clone()
        } else {
            format!("{}.{}", prefix, column.name)
        };
        visit(name.clone(), column);
        flatten_columns(&name, &column.fields, visit);
    }
}
