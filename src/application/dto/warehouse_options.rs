//! # Warehouse Options DTO
//!
//! ファサードの動作設定のData Transfer Object

use std::time::Duration;

use crate::domain::entities::job::CsvOptions;

/// ジョブ完了待ちのポーリング設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    /// ジョブ状態を確認する間隔
    pub interval: Duration,
    /// ジョブ完了を待つ上限
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
        }
    }
}

/// ウェアハウス設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseOptions {
    /// BigQueryロケーション（例: "US", "asia-northeast1"）
    pub location: Option<String>,
    /// 個々のリクエストのタイムアウト
    pub request_timeout: Duration,
    pub poll: PollOptions,
    /// レガシーSQLでクエリを実行するかどうか
    pub use_legacy_sql: bool,
    pub csv: CsvOptions,
}

impl Default for WarehouseOptions {
    fn default() -> Self {
        Self {
            location: None,
            request_timeout: Duration::from_secs(60),
            poll: PollOptions::default(),
            use_legacy_sql: false,
            csv: CsvOptions::default(),
        }
    }
}

impl WarehouseOptions {
    /// INFORMATION_SCHEMA のリージョン修飾子（例: `region-us`）
    pub fn region_qualifier(&self) -> String {
        let location = self.location.as_deref().unwrap_or("US");
        format!("region-{}", location.to_ascii_lowercase())
    }
}
