//! Configuration
//!
//! JSON 設定ファイルの読み込み

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::auth::Credentials;
use crate::application::dto::warehouse_options::{PollOptions, WarehouseOptions};
use crate::domain::entities::job::CsvOptions;

pub const DEFAULT_CONFIG_PATH: &str = "./.littlebq/config.json";

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_job_timeout_secs() -> u64 {
    600
}

fn default_field_delimiter() -> String {
    ",".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub project_id: String,
    pub dataset: String,
    #[serde(default)]
    pub location: Option<String>,

    // Authentication（未指定なら Application Default Credentials）
    #[serde(default)]
    pub service_account_key_path: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
    #[serde(default)]
    pub use_legacy_sql: bool,

    // CSV loads
    #[serde(default)]
    pub skip_leading_rows: u32,
    #[serde(default = "default_field_delimiter")]
    pub field_delimiter: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }

    pub fn options(&self) -> WarehouseOptions {
        WarehouseOptions {
            location: self.location.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            poll: PollOptions {
                interval: Duration::from_millis(self.poll_interval_ms),
                timeout: Duration::from_secs(self.job_timeout_secs),
            },
            use_legacy_sql: self.use_legacy_sql,
            csv: CsvOptions {
                skip_leading_rows: self.skip_leading_rows,
                field_delimiter: self.field_delimiter.clone(),
            },
        }
    }

    pub fn credentials(&self) -> Credentials {
        match &self.service_account_key_path {
            Some(path) => Credentials::KeyFile(path.clone()),
            None => Credentials::ApplicationDefault,
        }
    }
}
