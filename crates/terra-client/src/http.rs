use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use terra_core::error::AppError;
use terra_core::HttpConfig;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = "Terra/0.1 (country-refresh)";

/// Parses a configured source URL.
pub(crate) fn parse_source_url(url: &str) -> Result<Url, AppError> {
    Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{} ({})", url, e)))
}

/// Builds the HTTP client shared by the adapters.
pub(crate) fn build_client(config: &HttpConfig) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()
        .map_err(|e| AppError::ClientError(e.to_string()))
}

/// Performs one GET and decodes the JSON body.
///
/// Every failure is reported as `ExternalSourceUnavailable` for
/// `source_name`:
/// - timeouts and connection errors
/// - non-2xx statuses
/// - bodies that are not JSON of the expected shape
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: &Url,
    source_name: &str,
    timeout: Duration,
) -> Result<T, AppError> {
    debug!("GET {}", url);

    let resp = client.get(url.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            AppError::source_unavailable(
                source_name,
                format!("request timed out after {} seconds", timeout.as_secs()),
            )
        } else if e.is_connect() {
            AppError::source_unavailable(source_name, format!("connection failed: {}", e))
        } else {
            AppError::source_unavailable(source_name, e.to_string())
        }
    })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::source_unavailable(
            source_name,
            format!("HTTP {} from {}", status.as_u16(), url),
        ));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| AppError::source_unavailable(source_name, e.to_string()))?;

    serde_json::from_slice(&body).map_err(|e| {
        AppError::source_unavailable(source_name, format!("malformed response: {}", e))
    })
}
