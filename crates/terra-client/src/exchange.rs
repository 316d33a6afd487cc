use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use terra_core::error::AppError;
use terra_core::source::{ExchangeRateSource, ExchangeRates};
use terra_core::HttpConfig;
use tracing::info;
use url::Url;

use crate::http::{build_client, fetch_json, parse_source_url};

const SOURCE_NAME: &str = "exchange rates";

/// Rate table document.
///
/// ```json
/// {
///     "result": "success",
///     "base_code": "USD",
///     "rates": {"USD": 1, "EUR": 0.85, "NGN": 1600.5}
/// }
/// ```
///
/// A missing `rates` object is an empty table. `"result": "error"` is how
/// the provider reports failures with a 200 status.
#[derive(Deserialize, Debug)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, Decimal>>,
}

/// HTTP client for the currency rate table.
///
/// # Examples
///
/// ```no_run
/// use terra_client::ExchangeRateClient;
/// use terra_core::source::ExchangeRateSource;
/// use terra_core::HttpConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ExchangeRateClient::new(
///     "https://open.er-api.com/v6/latest/USD",
///     &HttpConfig::default(),
/// )?;
/// let rates = client.fetch_exchange_rates().await?;
/// println!("EUR: {:?}", rates.get("EUR"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl ExchangeRateClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(url: &str, config: &HttpConfig) -> Result<Self, AppError> {
        let url = parse_source_url(url)?;
        let client = build_client(config)?;

        Ok(Self {
            client,
            url,
            timeout: config.timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ExchangeRateSource for ExchangeRateClient {
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, AppError> {
        let resp: RatesResponse =
            fetch_json(&self.client, &self.url, SOURCE_NAME, self.timeout).await?;

        if resp.result.as_deref() == Some("error") {
            return Err(AppError::source_unavailable(
                SOURCE_NAME,
                format!(
                    "provider reported error: {}",
                    resp.error_type.as_deref().unwrap_or("unknown")
                ),
            ));
        }

        let rates = resp.rates.unwrap_or_default();
        info!(
            "Fetched {} exchange rates (base {})",
            rates.len(),
            resp.base_code.as_deref().unwrap_or("unknown")
        );
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use terra_core::error::ErrorKind;

    async fn client_for(server: &mockito::ServerGuard) -> ExchangeRateClient {
        ExchangeRateClient::new(&format!("{}/v6/latest/USD", server.url()), &HttpConfig::default())
            .unwrap()
    }

    #[test]
    fn test_rates_response_deserialization() {
        let json = r#"{
            "result": "success",
            "base_code": "USD",
            "rates": {"USD": 1, "EUR": 0.85, "NGN": 1600.5}
        }"#;

        let resp: RatesResponse = serde_json::from_str(json).unwrap();
        let rates = resp.rates.unwrap();
        assert_eq!(rates["USD"], dec!(1));
        assert_eq!(rates["EUR"], dec!(0.85));
        assert_eq!(rates["NGN"], dec!(1600.5));
    }

    #[test]
    fn test_numeric_rates_keep_their_digits() {
        let json = r#"{"rates": {"BTC": 0.000015234, "IRR": 42105, "EUR": 0.1}}"#;

        let rates = serde_json::from_str::<RatesResponse>(json).unwrap().rates.unwrap();
        assert_eq!(rates["BTC"], dec!(0.000015234));
        assert_eq!(rates["IRR"], dec!(42105));
        assert_eq!(rates["EUR"], dec!(0.1));
    }

    #[test]
    fn test_new_with_invalid_url() {
        let result = ExchangeRateClient::new("::nope::", &HttpConfig::default());
        assert!(matches!(result, Err(AppError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_exchange_rates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"result": "success", "base_code": "USD", "rates": {"EUR": 0.85, "GHS": 15.2}}"#)
            .create_async()
            .await;

        let rates = client_for(&server).await.fetch_exchange_rates().await.unwrap();

        mock.assert_async().await;
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("EUR"), Some(&dec!(0.85)));
        assert_eq!(rates.get("GHS"), Some(&dec!(15.2)));
    }

    #[tokio::test]
    async fn test_missing_rates_is_empty_table() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(r#"{"result": "success"}"#)
            .create_async()
            .await;

        let rates = client_for(&server).await.fetch_exchange_rates().await.unwrap();
        assert!(rates.is_empty());
    }

    #[tokio::test]
    async fn test_in_band_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(r#"{"result": "error", "error-type": "unsupported-code"}"#)
            .create_async()
            .await;

        let err = client_for(&server).await.fetch_exchange_rates().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert!(err.to_string().contains("unsupported-code"));
    }

    #[tokio::test]
    async fn test_not_found_status_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server).await.fetch_exchange_rates().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::ExternalSourceUnavailable { ref source_name, ref reason }
                if source_name == "exchange rates" && reason.contains("HTTP 404")
        ));
    }

    #[tokio::test]
    async fn test_non_numeric_rate_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v6/latest/USD")
            .with_status(200)
            .with_body(r#"{"rates": {"EUR": "lots"}}"#)
            .create_async()
            .await;

        let err = client_for(&server).await.fetch_exchange_rates().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }
}
