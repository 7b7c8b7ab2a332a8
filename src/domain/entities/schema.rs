//! # Table Schema
//!
//! カラム型とスキーマのバリューオブジェクト

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::{Result, WarehouseError};
use crate::domain::services::identifier::validate_column_name;

/// カラムの型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Bytes,
    Integer,
    Float,
    Numeric,
    BigNumeric,
    Boolean,
    Timestamp,
    Date,
    Time,
    DateTime,
    Geography,
    Json,
    Record,
}

impl ColumnType {
    /// Canonical name as the service reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "STRING",
            ColumnType::Bytes => "BYTES",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::BigNumeric => "BIGNUMERIC",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Geography => "GEOGRAPHY",
            ColumnType::Json => "JSON",
            ColumnType::Record => "RECORD",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        let column_type = match s.trim().to_ascii_uppercase().as_str() {
            "STRING" => ColumnType::String,
            "BYTES" => ColumnType::Bytes,
            "INTEGER" | "INT64" => ColumnType::Integer,
            "FLOAT" | "FLOAT64" => ColumnType::Float,
            "NUMERIC" => ColumnType::Numeric,
            "BIGNUMERIC" => ColumnType::BigNumeric,
            "BOOLEAN" | "BOOL" => ColumnType::Boolean,
            "TIMESTAMP" => ColumnType::Timestamp,
            "DATE" => ColumnType::Date,
            "TIME" => ColumnType::Time,
            "DATETIME" => ColumnType::DateTime,
            "GEOGRAPHY" => ColumnType::Geography,
            "JSON" => ColumnType::Json,
            "RECORD" | "STRUCT" => ColumnType::Record,
            other => {
                return Err(WarehouseError::invalid(format!(
                    "unsupported column type: {}",
                    other
                )))
            }
        };
        Ok(column_type)
    }
}

/// カラムのモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColumnMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

impl ColumnMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnMode::Nullable => "NULLABLE",
            ColumnMode::Required => "REQUIRED",
            ColumnMode::Repeated => "REPEATED",
        }
    }
}

impl FromStr for ColumnMode {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "NULLABLE" => Ok(ColumnMode::Nullable),
            "REQUIRED" => Ok(ColumnMode::Required),
            "REPEATED" => Ok(ColumnMode::Repeated),
            other => Err(WarehouseError::invalid(format!(
                "unsupported column mode: {}",
                other
            ))),
        }
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub mode: ColumnMode,
    /// RECORD 型のサブフィールド
    pub fields: Vec<Column>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            mode: ColumnMode::Nullable,
            fields: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: ColumnMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn record(name: impl Into<String>, fields: Vec<Column>) -> Self {
        Self {
            fields,
            ..Self::new(name, ColumnType::Record)
        }
    }

    fn validate(&self) -> Result<()> {
        validate_column_name(&self.name)?;
        match (self.column_type, self.fields.is_empty()) {
            (ColumnType::Record, true) => Err(WarehouseError::invalid(format!(
                "RECORD column {} needs at least one field",
                self.name
            ))),
            (ColumnType::Record, false) => {
                ensure_unique(&self.fields)?;
                self.fields.iter().try_for_each(Column::validate)
            }
            (_, false) => Err(WarehouseError::invalid(format!(
                "only RECORD columns may have fields: {}",
                self.name
            ))),
            (_, true) => Ok(()),
        }
    }
}

impl FromStr for Column {
    type Err = WarehouseError;

    /// Parses `name:TYPE`.
    fn from_str(s: &str) -> Result<Self> {
        let (name, column_type) = s.split_once(':').ok_or_else(|| {
            WarehouseError::invalid(format!("expected name:TYPE, got {:?}", s))
        })?;
        let column = Column::new(name.trim(), column_type.parse()?);
        column.validate()?;
        Ok(column)
    }
}

fn ensure_unique(columns: &[Column]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.name.to_ascii_lowercase()) {
            return Err(WarehouseError::invalid(format!(
                "duplicate column name: {}",
                column.name
            )));
        }
    }
    Ok(())
}

/// テーブルスキーマ
///
/// 順序付き・空でない・カラム名が一意（大文字小文字を区別しない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// 検証済みのスキーマを作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use littlebq::domain::entities::schema::{Column, ColumnType, TableSchema};
    ///
    /// let schema = TableSchema::new(vec![
    ///     Column::new("id", ColumnType::Integer),
    ///     Column::new("email", ColumnType::String),
    /// ])
    /// .unwrap();
    /// assert_eq!(schema.len(), 2);
    ///
    /// // カラム名の重複はエラー
    /// assert!(TableSchema::new(vec![
    ///     Column::new("id", ColumnType::Integer),
    ///     Column::new("ID", ColumnType::String),
    /// ])
    /// .is_err());
    /// ```
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if columns.is_empty() {
            return Err(WarehouseError::invalid("schema must have at least one column"));
        }
        ensure_unique(&columns)?;
        columns.iter().try_for_each(Column::validate)?;
        Ok(Self { columns })
    }

    /// `(name, TYPE)` の組からスキーマを作成
    pub fn from_pairs<N: AsRef<str>, T: AsRef<str>>(pairs: &[(N, T)]) -> Result<Self> {
        let columns = pairs
            .iter()
            .map(|(name, column_type)| {
                Ok(Column::new(name.as_ref(), column_type.as_ref().parse()?))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(columns)
    }

    /// Schema reported by the service; it is trusted and not re-validated.
    pub(crate) fn from_service(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// `(name, TYPE)` の組として返す
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.column_type.to_string()))
            .collect()
    }
}
