//! Adapter Layer
//!
//! 外部システム（BigQuery, 設定ファイル）との統合

pub mod auth;
pub mod bigquery;
pub mod config;

use std::sync::Arc;

use log::info;

use crate::application::dto::warehouse_options::WarehouseOptions;
use crate::application::warehouse::Warehouse;
use crate::domain::error::{Result, WarehouseError};
use auth::{create_bigquery_client, Credentials};
use bigquery::BigQueryWarehouseRepository;

/// BigQuery に接続したファサードを作成
///
/// # Errors
///
/// 認証情報を解決できない場合は `Authentication`
pub async fn connect(
    project_id: &str,
    dataset_id: &str,
    credentials: &Credentials,
    options: WarehouseOptions,
) -> Result<Warehouse<BigQueryWarehouseRepository>> {
    let client = create_bigquery_client(credentials)
        .await
        .map_err(WarehouseError::Authentication)?;
    info!("Connected to project {} (dataset {})", project_id, dataset_id);

    let repository = BigQueryWarehouseRepository::new(client, options.request_timeout);
    Warehouse::new(Arc::new(repository), project_id, dataset_id, options)
}
