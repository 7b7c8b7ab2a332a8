//! BigQuery Error Translation
//!
//! SDKのエラーをドメインの ServiceError に変換

use std::error::Error as StdError;

use google_cloud_bigquery::http::error::Error as SdkError;

use crate::domain::error::ServiceError;

pub const REASON_TRANSPORT: &str = "transport";
pub const REASON_INVALID_RESPONSE: &str = "invalidResponse";

/// Convert an error and all of its causes to one message
pub fn error_chain_to_string(e: &(dyn StdError + 'static)) -> String {
    let mut messages = vec![e.to_string()];
    let mut source = e.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !messages.contains(&message) {
            messages.push(message);
        }
        source = cause.source();
    }
    messages.join(" | ")
}

/// Reason string BigQuery uses for a given HTTP status
pub fn reason_for_status(code: u16) -> Option<&'static str> {
    match code {
        400 => Some("invalid"),
        401 => Some("unauthorized"),
        403 => Some("accessDenied"),
        404 => Some("notFound"),
        409 => Some("duplicate"),
        500 => Some("backendError"),
        _ => None,
    }
}

/// SDKエラーを ServiceError に変換（ステータスコードとメッセージを保持）
pub fn service_error(err: SdkError) -> ServiceError {
    match err {
        SdkError::Response(response) => ServiceError::new(
            Some(response.code),
            reason_for_status(response.code).map(str::to_string),
            response.message,
        ),
        SdkError::TokenSource(e) => ServiceError::credentials(e.to_string()),
        other => ServiceError::new(
            None,
            Some(REASON_TRANSPORT.to_string()),
            error_chain_to_string(&other),
        ),
    }
}

/// レスポンスの読み取りに失敗した場合のエラー
pub fn invalid_response(context: &str, err: serde_json::Error) -> ServiceError {
    ServiceError::new(
        None,
        Some(REASON_INVALID_RESPONSE.to_string()),
        format!("{}: {}", context, err),
    )
}
