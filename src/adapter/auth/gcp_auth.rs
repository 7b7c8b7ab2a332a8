//! GCP Authentication
//!
//! Google Cloud Platform認証機能（認証情報は明示的に渡す）

use google_cloud_bigquery::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_bigquery::client::{Client, ClientConfig};
use log::info;

use crate::domain::error::ServiceError;

/// BigQuery クライアントの認証情報
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// サービスアカウントキーファイルのパス（`~` 展開あり）
    KeyFile(String),
    /// サービスアカウントキーの JSON 文字列
    KeyJson(String),
    /// Application Default Credentials
    #[default]
    ApplicationDefault,
}

/// Expands tilde in path and returns the full path
pub fn expand_key_path(key_path: &str) -> String {
    shellexpand::tilde(key_path).to_string()
}

async fn config_from(credentials: &Credentials) -> Result<ClientConfig, ServiceError> {
    let file = match credentials {
        Credentials::KeyFile(path) => {
            let path = expand_key_path(path);
            info!("Using service account key {}", path);
            CredentialsFile::new_from_file(path.clone())
                .await
                .map_err(|e| {
                    ServiceError::credentials(format!("failed to read key file {}: {}", path, e))
                })?
        }
        Credentials::KeyJson(json) => CredentialsFile::new_from_str(json)
            .await
            .map_err(|e| ServiceError::credentials(format!("invalid service account key: {}", e)))?,
        Credentials::ApplicationDefault => {
            info!("Using application default credentials");
            let (config, _project_id) = ClientConfig::new_with_auth()
                .await
                .map_err(|e| ServiceError::credentials(e.to_string()))?;
            return Ok(config);
        }
    };

    let (config, _project_id) = ClientConfig::new_with_credentials(file)
        .await
        .map_err(|e| ServiceError::credentials(e.to_string()))?;
    Ok(config)
}

/// Creates a BigQuery client from explicitly supplied credentials
///
/// # Errors
///
/// 認証情報を解決できない場合は reason が `credentials` の ServiceError
pub async fn create_bigquery_client(credentials: &Credentials) -> Result<Client, ServiceError> {
    let config = config_from(credentials).await?;
    Client::new(config)
        .await
        .map_err(|e| ServiceError::credentials(format!("failed to create BigQuery client: {}", e)))
}
