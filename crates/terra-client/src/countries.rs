use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use terra_core::error::AppError;
use terra_core::source::{CountrySource, RawCountry};
use terra_core::HttpConfig;
use tracing::info;
use url::Url;

use crate::http::{build_client, fetch_json, parse_source_url};

const SOURCE_NAME: &str = "countries";

/// HTTP client for the country list.
///
/// The endpoint must return a JSON array of country objects in the
/// REST Countries v2 shape (`name`, `capital`, `region`, `population`,
/// `flag`, `currencies`).
///
/// # Examples
///
/// ```no_run
/// use terra_client::CountriesClient;
/// use terra_core::source::CountrySource;
/// use terra_core::HttpConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CountriesClient::new(
///     "https://restcountries.com/v2/all?fields=name,population,currencies",
///     &HttpConfig::default(),
/// )?;
/// let countries = client.fetch_countries().await?;
/// println!("Found {} countries", countries.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CountriesClient {
    client: Client,
    url: Url,
    timeout: Duration,
}

impl CountriesClient {
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
impl CountrySource for CountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, AppError> {
        let countries: Vec<RawCountry> =
            fetch_json(&self.client, &self.url, SOURCE_NAME, self.timeout).await?;
        info!("Fetched {} country documents", countries.len());
        Ok(countries)
    }
}
