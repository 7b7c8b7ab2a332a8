//! # Tabular Conversion
//!
//! クエリ結果の生データを Arrow の RecordBatch に変換
//!
//! 型の対応:
//!
//! | サービスの型 | Arrow の型 |
//! |---|---|
//! | INTEGER | Int64 |
//! | FLOAT | Float64 |
//! | BOOLEAN | Boolean |
//! | TIMESTAMP | Timestamp(Microsecond, "UTC") |
//! | RECORD / REPEATED | Utf8（JSON文字列） |
//! | その他 | Utf8（そのまま） |

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::{Map, Value};

use crate::domain::entities::result_page::{RawRow, RawValue};
use crate::domain::entities::schema::{Column, ColumnMode, ColumnType, TableSchema};
use crate::domain::error::Result;

const UTC: &str = "UTC";

/// 結果スキーマと行から RecordBatch を作成
///
/// スキーマがない場合（DDL/DML）はカラムも行もない RecordBatch を返す
pub fn to_record_batch(schema: Option<&TableSchema>, rows: &[RawRow]) -> Result<RecordBatch> {
    let Some(schema) = schema else {
        let options = RecordBatchOptions::new().with_row_count(Some(0));
        return Ok(RecordBatch::try_new_with_options(
            Arc::new(Schema::empty()),
            vec![],
            &options,
        )?);
    };

    let mut fields = Vec::with_capacity(schema.len());
    let mut arrays = Vec::with_capacity(schema.len());
    for (index, column) in schema.columns().iter().enumerate() {
        let array = build_array(column, index, rows)?;
        fields.push(Field::new(&column.name, data_type(column), true));
        arrays.push(array);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        arrays,
        &options,
    )?)
}

fn is_json(column: &Column) -> bool {
    column.mode == ColumnMode::Repeated || column.column_type == ColumnType::Record
}

fn data_type(column: &Column) -> DataType {
    if is_json(column) {
        return DataType::Utf8;
    }
    match column.column_type {
        ColumnType::Integer => DataType::Int64,
        ColumnType::Float => DataType::Float64,
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into())),
        _ => DataType::Utf8,
    }
}

fn cell<'a>(rows: &'a [RawRow], row: usize, index: usize) -> &'a RawValue {
    rows[row].get(index).unwrap_or(&RawValue::Null)
}

/// スカラー列の値を列挙（NULL は `None`）
fn scalars<'a>(
    rows: &'a [RawRow],
    index: usize,
    column: &'a Column,
) -> impl Iterator<Item = std::result::Result<Option<&'a str>, ArrowError>> + 'a {
    (0..rows.len()).map(move |row| match cell(rows, row, index) {
        RawValue::Null => Ok(None),
        RawValue::Scalar(s) => Ok(Some(s.as_str())),
        other => Err(ArrowError::ParseError(format!(
            "column {} expects a scalar, got {:?}",
            column.name, other
        ))),
    })
}

fn parse_error(column: &Column, value: &str) -> ArrowError {
    ArrowError::ParseError(format!(
        "cannot parse {:?} as {} in column {}",
        value, column.column_type, column.name
    ))
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// 浮動小数点の秒（例: "1.4141232E9"）をマイクロ秒に変換
fn parse_timestamp_micros(value: &str) -> Option<i64> {
    let seconds: f64 = value.parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    Some((seconds * 1_000_000.0).round() as i64)
}

fn build_array(column: &Column, index: usize, rows: &[RawRow]) -> Result<ArrayRef> {
    if is_json(column) {
        let mut builder = StringBuilder::new();
        for row in 0..rows.len() {
            match cell(rows, row, index) {
                RawValue::Null => builder.append_null(),
                value => builder.append_value(to_json(value, column, true).to_string()),
            }
        }
        return Ok(Arc::new(builder.finish()));
    }

    let array: ArrayRef = match column.column_type {
        ColumnType::Integer => {
            let mut builder = Int64Builder::new();
            for value in scalars(rows, index, column) {
                match value? {
                    Some(s) => builder.append_value(s.parse().map_err(|_| parse_error(column, s))?),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Float => {
            let mut builder = Float64Builder::new();
            for value in scalars(rows, index, column) {
                match value? {
                    Some(s) => builder.append_value(s.parse().map_err(|_| parse_error(column, s))?),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Boolean => {
            let mut builder = BooleanBuilder::new();
            for value in scalars(rows, index, column) {
                match value? {
                    Some(s) => {
                        builder.append_value(parse_bool(s).ok_or_else(|| parse_error(column, s))?)
                    }
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::new();
            for value in scalars(rows, index, column) {
                match value? {
                    Some(s) => builder.append_value(
                        parse_timestamp_micros(s).ok_or_else(|| parse_error(column, s))?,
                    ),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish().with_timezone(UTC))
        }
        _ => {
            let mut builder = StringBuilder::new();
            for value in scalars(rows, index, column) {
                match value? {
                    Some(s) => builder.append_value(s),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    };
    Ok(array)
}

/// RECORD / REPEATED の値を JSON に変換
fn to_json(value: &RawValue, column: &Column, honor_mode: bool) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Array(items) if honor_mode && column.mode == ColumnMode::Repeated => Value::Array(
            items
                .iter()
                .map(|item| to_json(item, column, false))
                .collect(),
        ),
        RawValue::Record(values) if column.column_type == ColumnType::Record => {
            let mut object = Map::new();
            for (field, value) in column.fields.iter().zip(values) {
                object.insert(field.name.clone(), to_json(value, field, true));
            }
            Value::Object(object)
        }
        RawValue::Scalar(s) => scalar_json(s, column.column_type),
        RawValue::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| to_json(item, column, false))
                .collect(),
        ),
        RawValue::Record(values) => Value::Array(
            values
                .iter()
                .map(|item| to_json(item, column, false))
                .collect(),
        ),
    }
}

fn scalar_json(value: &str, column_type: ColumnType) -> Value {
    let parsed = match column_type {
        ColumnType::Integer => value.parse::<i64>().ok().map(Value::from),
        ColumnType::Float => value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        ColumnType::Boolean => parse_bool(value).map(Value::Bool),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(value.to_string()))
}
