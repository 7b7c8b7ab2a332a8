//! # Identifier Validation
//!
//! データセット名・テーブル名・カラム名・ソースURIの検証
//!
//! リクエストを送信する前に境界で検証し、違反は `InvalidArgument` として返す。

use crate::domain::error::{Result, WarehouseError};

const MAX_DATASET_LEN: usize = 1024;
const MAX_TABLE_LEN: usize = 1024;
const MAX_COLUMN_LEN: usize = 300;

/// プロジェクトIDを検証
///
/// `domain.com:project` 形式も許可するため、空・空白・バッククォートのみを拒否する
pub fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.trim().is_empty() {
        return Err(WarehouseError::invalid("project id is empty"));
    }
    if project_id.chars().any(|c| c == '`' || c.is_whitespace()) {
        return Err(WarehouseError::invalid(format!(
            "project id may not contain backticks or whitespace: {:?}",
            project_id
        )));
    }
    Ok(())
}

/// データセットIDを検証
pub fn validate_dataset_id(dataset_id: &str) -> Result<()> {
    if dataset_id.is_empty() || dataset_id.len() > MAX_DATASET_LEN {
        return Err(WarehouseError::invalid(format!(
            "dataset id must be 1 to {} characters: {:?}",
            MAX_DATASET_LEN, dataset_id
        )));
    }
    if !dataset_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(WarehouseError::invalid(format!(
            "dataset id may only contain letters, digits and underscores: {:?}",
            dataset_id
        )));
    }
    Ok(())
}

/// テーブル名を検証（パーティションデコレータは不可）
pub fn validate_table_name(name: &str) -> Result<()> {
    let (base, decorator) = split_decorator(name);
    if decorator.is_some() {
        return Err(WarehouseError::invalid(format!(
            "partition decorators are only allowed when describing a table: {:?}",
            name
        )));
    }
    validate_table_base(base)
}

/// テーブル名を検証（`$YYYYMMDD` 形式のパーティションデコレータを許可）
pub fn validate_table_or_partition(name: &str) -> Result<()> {
    let (base, decorator) = split_decorator(name);
    validate_table_base(base)?;
    if let Some(decorator) = decorator {
        let valid = (4..=10).contains(&decorator.len())
            && decorator.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(WarehouseError::invalid(format!(
                "partition decorator must be 4 to 10 digits: {:?}",
                name
            )));
        }
    }
    Ok(())
}

fn split_decorator(name: &str) -> (&str, Option<&str>) {
    match name.split_once('$') {
        Some((base, decorator)) => (base, Some(decorator)),
        None => (name, None),
    }
}

fn validate_table_base(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().count() > MAX_TABLE_LEN {
        return Err(WarehouseError::invalid(format!(
            "table name must be 1 to {} characters: {:?}",
            MAX_TABLE_LEN, name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '.' | '`' | '/' | '$') || c.is_whitespace())
    {
        return Err(WarehouseError::invalid(format!(
            "table name contains {:?}: {:?}",
            c, name
        )));
    }
    Ok(())
}

/// カラム名を検証
pub fn validate_column_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !first_ok
        || name.len() > MAX_COLUMN_LEN
        || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(WarehouseError::invalid(format!(
            "column name must start with a letter or underscore, contain only letters, digits and underscores, and be at most {} characters: {:?}",
            MAX_COLUMN_LEN, name
        )));
    }
    Ok(())
}

/// Cloud Storage のソースURIを検証（ワイルドカード `*` はそのまま渡す）
pub fn validate_source_uri(uri: &str) -> Result<()> {
    let rest = uri.strip_prefix("gs://").ok_or_else(|| {
        WarehouseError::invalid(format!("source uri must start with gs://: {:?}", uri))
    })?;
    match rest.split_once('/') {
        Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok(()),
        _ => Err(WarehouseError::invalid(format!(
            "source uri must name a bucket and an object: {:?}",
            uri
        ))),
    }
}

/// SQL中でバッククォートで囲むための識別子
pub fn quote_identifier(parts: &[&str]) -> String {
    format!("`{}`", parts.join("."))
}

/// SQL文字列リテラルにエスケープ
pub fn quote_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
