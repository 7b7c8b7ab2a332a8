//! # Query Result Page
//!
//! getQueryResults の1ページ分の生データ

use super::schema::TableSchema;

/// セルの生の値
///
/// サービスはスカラー値を全て文字列で返す
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Null,
    Scalar(String),
    Array(Vec<RawValue>),
    Record(Vec<RawValue>),
}

impl RawValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        RawValue::Scalar(value.into())
    }
}

pub type RawRow = Vec<RawValue>;

/// クエリ結果の1ページ
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultPage {
    /// DDL/DML など結果スキーマがない場合は `None`
    pub schema: Option<TableSchema>,
    pub rows: Vec<RawRow>,
    pub page_token: Option<String>,
    pub job_complete: bool,
}
