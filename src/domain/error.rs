//! # Domain Errors
//!
//! サービスエラーとファサードのエラー分類

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Reason attached to errors raised when a request or a job wait expires.
pub const REASON_TIMEOUT: &str = "timeout";
/// Reason attached to errors raised while resolving credentials.
pub const REASON_CREDENTIALS: &str = "credentials";

/// サービスから返されたエラー
///
/// HTTPステータスコード、BigQueryの reason、メッセージをそのまま保持する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    /// HTTPステータスコード（ジョブ内エラーの場合は `None`）
    pub code: Option<u16>,
    /// BigQuery の reason（例: "notFound", "duplicate", "invalid"）
    pub reason: Option<String>,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: Option<u16>, reason: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason,
            message: message.into(),
        }
    }

    pub fn http(code: u16, message: impl Into<String>) -> Self {
        Self::new(Some(code), None, message)
    }

    pub fn timeout(operation: &str, after: Duration) -> Self {
        Self::new(
            None,
            Some(REASON_TIMEOUT.to_string()),
            format!("{} did not complete within {:?}", operation, after),
        )
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(None, Some(REASON_CREDENTIALS.to_string()), message)
    }

    fn reason_is(&self, reason: &str) -> bool {
        self.reason.as_deref() == Some(reason)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Some(404) || self.reason_is("notFound")
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == Some(409) || self.reason_is("duplicate")
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == Some(401) || self.reason_is(REASON_CREDENTIALS)
    }

    pub fn is_timeout(&self) -> bool {
        self.reason_is(REASON_TIMEOUT)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        match (&self.code, &self.reason) {
            (Some(code), Some(reason)) => write!(f, " (code {}, reason {})", code, reason),
            (Some(code), None) => write!(f, " (code {})", code),
            (None, Some(reason)) => write!(f, " (reason {})", reason),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for ServiceError {}

/// ファサード操作のエラー
///
/// どのバリアントも元のサービスエラーを保持し、リカバリーやリトライは行わない
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("authentication failed: {0}")]
    Authentication(#[source] ServiceError),

    #[error("query failed: {0}")]
    Query(#[source] ServiceError),

    #[error("table already exists: {table}")]
    TableExists {
        table: String,
        #[source]
        source: Option<ServiceError>,
    },

    #[error("table not found: {table}")]
    TableNotFound {
        table: String,
        #[source]
        source: Option<ServiceError>,
    },

    #[error("load job failed: {0}")]
    Load(#[source] ServiceError),

    #[error("column {column} has type {actual}, expected {expected}")]
    ColumnType {
        column: String,
        actual: String,
        expected: String,
    },

    #[error("column not found: {column} in {table}")]
    ColumnNotFound { table: String, column: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service error: {0}")]
    Service(#[source] ServiceError),

    #[error("result conversion failed: {0}")]
    Conversion(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WarehouseError {
    /// Classifies a service error.
    ///
    /// Request timeouts and credential failures are recognised for every
    /// operation; anything else is handed to `otherwise`.
    pub fn classify(err: ServiceError, otherwise: impl FnOnce(ServiceError) -> Self) -> Self {
        if err.is_timeout() {
            WarehouseError::Timeout(err.message)
        } else if err.is_unauthenticated() {
            WarehouseError::Authentication(err)
        } else {
            otherwise(err)
        }
    }

    /// Classification for operations addressing one existing table.
    pub fn for_table(table: &str) -> impl FnOnce(ServiceError) -> Self + '_ {
        move |err| {
            if err.is_not_found() {
                WarehouseError::TableNotFound {
                    table: table.to_string(),
                    source: Some(err),
                }
            } else {
                WarehouseError::Service(err)
            }
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        WarehouseError::InvalidArgument(message.into())
    }

    /// The preserved service error, if this failure came from the service.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            WarehouseError::Authentication(e)
            | WarehouseError::Query(e)
            | WarehouseError::Load(e)
            | WarehouseError::Service(e) => Some(e),
            WarehouseError::TableExists { source, .. }
            | WarehouseError::TableNotFound { source, .. } => source.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
