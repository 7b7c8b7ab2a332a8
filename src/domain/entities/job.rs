//! # Job Entities
//!
//! クエリジョブ・ロードジョブとその状態

use super::schema::TableSchema;
use super::table::TableRef;
use crate::domain::error::ServiceError;

/// ジョブ参照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobRef {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

impl JobRef {
    /// 新しいジョブID（UUID v4）でジョブ参照を作成
    pub fn generate(project_id: impl Into<String>, location: Option<String>) -> Self {
        Self {
            project_id: project_id.into(),
            job_id: uuid::Uuid::new_v4().to_string(),
            location,
        }
    }
}

/// テーブルが存在しない場合の振る舞い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateDisposition {
    CreateIfNeeded,
    CreateNever,
}

/// テーブルが存在する場合の書き込みの振る舞い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// 空のテーブルにのみ書き込む
    WriteEmpty,
    WriteTruncate,
    WriteAppend,
}

/// CSV のパース設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    pub skip_leading_rows: u32,
    pub field_delimiter: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            skip_leading_rows: 0,
            field_delimiter: ",".to_string(),
        }
    }
}

/// ロードジョブの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    pub destination: TableRef,
    pub source_uris: Vec<String>,
    /// `None` の場合は既存テーブルのスキーマを使う
    pub schema: Option<TableSchema>,
    pub create_disposition: CreateDisposition,
    pub write_disposition: WriteDisposition,
    pub csv: CsvOptions,
}

/// ジョブの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    Query { sql: String, use_legacy_sql: bool },
    Load(LoadJob),
}

/// 投入するジョブ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub reference: JobRef,
    pub kind: JobKind,
}

impl JobSpec {
    pub fn query(reference: JobRef, sql: impl Into<String>, use_legacy_sql: bool) -> Self {
        Self {
            reference,
            kind: JobKind::Query {
                sql: sql.into(),
                use_legacy_sql,
            },
        }
    }

    pub fn load(reference: JobRef, load: LoadJob) -> Self {
        Self {
            reference,
            kind: JobKind::Load(load),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
}

/// ジョブの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub reference: JobRef,
    pub state: JobState,
    /// DONE の場合のみ意味を持つ。ジョブ全体の失敗理由
    pub error: Option<ServiceError>,
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        self.state == JobState::Done
    }
}
