//! BigQuery Models
//!
//! REST API のリソースとドメインエンティティの相互変換。
//! スキーマ・パーティショニング・結果行は REST の JSON 表現を経由して変換する。

use chrono::{DateTime, Utc};
use google_cloud_bigquery::http::job::{
    CreateDisposition as SdkCreateDisposition, Job, JobConfiguration, JobConfigurationLoad,
    JobConfigurationQuery, JobReference, JobState as SdkJobState, JobType,
    WriteDisposition as SdkWriteDisposition,
};
use google_cloud_bigquery::http::table::{SourceFormat, TableReference};
use serde_json::{json, Map, Value};

use super::errors::invalid_response;
use crate::domain::entities::job::{
    CreateDisposition, JobKind, JobRef, JobSpec, JobState, JobStatus, WriteDisposition,
};
use crate::domain::entities::result_page::{RawRow, RawValue, ResultPage};
use crate::domain::entities::schema::{Column, ColumnMode, ColumnType, TableSchema};
use crate::domain::entities::table::{
    PartitionGranularity, TableDescription, TableRef, TimePartitioning,
};
use crate::domain::error::ServiceError;

pub fn table_reference(table: &TableRef) -> TableReference {
    TableReference {
        project_id: table.project_id.clone(),
        dataset_id: table.dataset_id.clone(),
        table_id: table.table_id.clone(),
    }
}

// ---- schema ----

fn column_to_json(column: &Column) -> Value {
    let mut field = Map::new();
    field.insert("name".to_string(), json!(column.name));
    field.insert("type".to_string(), json!(column.column_type.as_str()));
    field.insert("mode".to_string(), json!(column.mode.as_str()));
    if !column.fields.is_empty() {
        let fields: Vec<Value> = column.fields.iter().map(column_to_json).collect();
        field.insert("fields".to_string(), Value::Array(fields));
    }
    Value::Object(field)
}

/// `{"fields": [{"name", "type", "mode", "fields"}]}`
pub fn schema_to_json(schema: &TableSchema) -> Value {
    let fields: Vec<Value> = schema.columns().iter().map(column_to_json).collect();
    json!({ "fields": fields })
}

fn column_from_json(field: &Value) -> Result<Column, ServiceError> {
    let name = field
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("schema field without name"))?;
    // Types this crate has no dedicated handling for (INTERVAL, RANGE) are read as text.
    let column_type = field
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<ColumnType>().ok())
        .unwrap_or(ColumnType::String);
    let mode = field
        .get("mode")
        .and_then(Value::as_str)
        .and_then(|m| m.parse::<ColumnMode>().ok())
        .unwrap_or_default();
    let fields = match field.get("fields").and_then(Value::as_array) {
        Some(children) => children
            .iter()
            .map(column_from_json)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };
    Ok(Column {
        name: name.to_string(),
        column_type,
        mode,
        fields,
    })
}

pub fn schema_from_json(schema: &Value) -> Result<TableSchema, ServiceError> {
    let columns = schema
        .get("fields")
        .and_then(Value::as_array)
        .map(|fields| fields.iter().map(column_from_json).collect())
        .unwrap_or_else(|| Ok(Vec::new()))?;
    Ok(TableSchema::from_service(columns))
}

// ---- time partitioning ----

pub fn time_partitioning_to_json(partitioning: &TimePartitioning) -> Value {
    let mut value = json!({ "type": partitioning.granularity.as_str() });
    if let Some(field) = &partitioning.field {
        value["field"] = json!(field);
    }
    value
}

pub fn time_partitioning_from_json(value: &Value) -> Option<TimePartitioning> {
    let granularity = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<PartitionGranularity>().ok())?;
    let field = value
        .get("field")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(TimePartitioning { granularity, field })
}

// ---- rows ----

fn cell_value(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::String(s) => RawValue::Scalar(s.clone()),
        Value::Bool(b) => RawValue::Scalar(b.to_string()),
        Value::Number(n) => RawValue::Scalar(n.to_string()),
        Value::Array(items) => RawValue::Array(
            items
                .iter()
                .map(|item| cell_value(item.get("v").unwrap_or(item)))
                .collect(),
        ),
        Value::Object(object) => match object.get("f") {
            Some(Value::Array(cells)) => RawValue::Record(tuple_values(cells)),
            _ => match object.get("v") {
                Some(inner) => cell_value(inner),
                None => RawValue::Scalar(value.to_string()),
            },
        },
    }
}

fn tuple_values(cells: &[Value]) -> Vec<RawValue> {
    cells
        .iter()
        .map(|cell| cell_value(cell.get("v").unwrap_or(&Value::Null)))
        .collect()
}

/// `[{"f": [{"v": ...}]}]` を行に変換
pub fn rows_from_json(rows: &Value) -> Vec<RawRow> {
    rows.as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| match row.get("f") {
                    Some(Value::Array(cells)) => tuple_values(cells),
                    _ => Vec::new(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// getQueryResults のレスポンスを1ページに変換
pub fn result_page_from_json(response: &Value) -> Result<ResultPage, ServiceError> {
    let job_complete = response
        .get("jobComplete")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let schema = match response.get("schema") {
        Some(schema) if !schema.is_null() => Some(schema_from_json(schema)?),
        _ => None,
    }
    .filter(|schema| !schema.is_empty());
    let page_token = response
        .get("pageToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    Ok(ResultPage {
        schema,
        rows: response.get("rows").map(rows_from_json).unwrap_or_default(),
        page_token,
        job_complete,
    })
}

// ---- jobs ----

fn create_disposition(disposition: CreateDisposition) -> SdkCreateDisposition {
    match disposition {
        CreateDisposition::CreateIfNeeded => SdkCreateDisposition::CreateIfNeeded,
        CreateDisposition::CreateNever => SdkCreateDisposition::CreateNever,
    }
}

fn write_disposition(disposition: WriteDisposition) -> SdkWriteDisposition {
    match disposition {
        WriteDisposition::WriteEmpty => SdkWriteDisposition::WriteEmpty,
        WriteDisposition::WriteTruncate => SdkWriteDisposition::WriteTruncate,
        WriteDisposition::WriteAppend => SdkWriteDisposition::WriteAppend,
    }
}

/// ジョブ定義を REST の Job リソースに変換
pub fn to_sdk_job(spec: &JobSpec) -> Result<Job, ServiceError> {
    let job = match &spec.kind {
        JobKind::Query {
            sql,
            use_legacy_sql,
        } => JobType::Query(JobConfigurationQuery {
            query: sql.clone(),
            use_legacy_sql: Some(*use_legacy_sql),
            ..Default::default()
        }),
        JobKind::Load(load) => {
            let schema = match &load.schema {
                Some(schema) => Some(
                    serde_json::from_value(schema_to_json(schema))
                        .map_err(|e| invalid_response("load schema", e))?,
                ),
                None => None,
            };
            JobType::Load(JobConfigurationLoad {
                source_uris: load.source_uris.clone(),
                schema,
                destination_table: table_reference(&load.destination),
                create_disposition: Some(create_disposition(load.create_disposition)),
                write_disposition: Some(write_disposition(load.write_disposition)),
                source_format: Some(SourceFormat::Csv),
                skip_leading_rows: Some(i64::from(load.csv.skip_leading_rows)),
                field_delimiter: Some(load.csv.field_delimiter.clone()),
                max_bad_records: Some(0),
                ..Default::default()
            })
        }
    };

    Ok(Job {
        job_reference: JobReference {
            project_id: spec.reference.project_id.clone(),
            job_id: spec.reference.job_id.clone(),
            location: spec.reference.location.clone(),
        },
        configuration: JobConfiguration {
            job,
            ..Default::default()
        },
        ..Default::default()
    })
}

/// `status.errorResult` を ServiceError に変換
pub fn job_error_from_json(status: &Value) -> Option<ServiceError> {
    let error = status.get("errorResult").filter(|e| !e.is_null())?;
    let reason = error
        .get("reason")
        .and_then(Value::as_str)
        .map(str::to_string);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("job failed without a message");
    Some(ServiceError::new(None, reason, message))
}

/// サービスが返したジョブ参照（リージョンを含む）を優先し、欠けている部分は投入時の参照で補う
fn returned_reference(submitted: &JobRef, returned: &JobReference) -> JobRef {
    let or_submitted = |value: &str, fallback: &str| {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };
    JobRef {
        project_id: or_submitted(&returned.project_id, &submitted.project_id),
        job_id: or_submitted(&returned.job_id, &submitted.job_id),
        location: returned
            .location
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| submitted.location.clone()),
    }
}

pub fn job_status(reference: &JobRef, job: &Job) -> Result<JobStatus, ServiceError> {
    let state = match job.status.state {
        SdkJobState::Done => JobState::Done,
        SdkJobState::Running => JobState::Running,
        _ => JobState::Pending,
    };
    let status =
        serde_json::to_value(&job.status).map_err(|e| invalid_response("job status", e))?;
    Ok(JobStatus {
        reference: returned_reference(reference, &job.job_reference),
        state,
        error: job_error_from_json(&status),
    })
}

// ---- tables ----

fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn lenient_millis(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let millis = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }?;
    DateTime::from_timestamp_millis(millis)
}

/// テーブルリソースの JSON を TableDescription に変換
pub fn table_description_from_json(
    reference: &TableRef,
    table: &Value,
) -> Result<TableDescription, ServiceError> {
    let schema = match table.get("schema") {
        Some(schema) if !schema.is_null() => schema_from_json(schema)?,
        _ => TableSchema::from_service(Vec::new()),
    };
    Ok(TableDescription {
        table: reference.clone(),
        schema,
        num_rows: lenient_u64(table.get("numRows")),
        num_bytes: lenient_u64(table.get("numBytes")),
        time_partitioning: table
            .get("timePartitioning")
            .and_then(time_partitioning_from_json),
        creation_time: lenient_millis(table.get("creationTime")),
        description: table
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn malformed(message: &str) -> ServiceError {
    ServiceError::new(
        None,
        Some(super::errors::REASON_INVALID_RESPONSE.to_string()),
        message,
    )
}
