use crate::utils::error::{PermissionsError, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Maps a reqwest failure to a timeout or transport error.
pub fn transport_error(
    error: reqwest::Error,
    service: &'static str,
    operation: &'static str,
    timeout_ms: u64,
) -> PermissionsError {
    if error.is_timeout() {
        PermissionsError::Timeout {
            service,
            operation,
            timeout_ms,
        }
    } else {
        PermissionsError::Transport {
            service,
            operation,
            source: error,
        }
    }
}

/// 讀取回應內容並轉成指定型別，非 2xx 一律視為錯誤
pub async fn parse<T: DeserializeOwned>(
    response: Response,
    service: &'static str,
    operation: &'static str,
    timeout_ms: u64,
) -> Result<(StatusCode, T)> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, service, operation, timeout_ms))?;

    if !status.is_success() {
        return Err(PermissionsError::UpstreamStatus {
            service,
            operation,
            status: status.as_u16(),
            body,
        });
    }

    let value = parse_body(&body, service, operation)?;
    Ok((status, value))
}

pub fn parse_body<T: DeserializeOwned>(
    body: &str,
    service: &'static str,
    operation: &'static str,
) -> Result<T> {
    serde_json::from_str(body).map_err(|source| PermissionsError::Deserialization {
        service,
        operation,
        source,
    })
}

/// Exactly one element, otherwise a cardinality error naming `entity`.
pub fn expect_single<T>(items: Vec<T>, entity: &'static str) -> Result<T> {
    let actual = items.len();
    let mut items = items.into_iter();
    match (items.next(), actual) {
        (Some(item), 1) => Ok(item),
        _ => Err(PermissionsError::Cardinality { entity, actual }),
    }
}
