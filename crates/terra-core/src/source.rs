//! Contracts for the two external data sources.
//!
//! Implementations live in `terra-client`; the refresh pipeline only sees
//! these traits, so tests can feed it canned documents.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::AppError;

/// Exchange rates keyed by currency code, as published by the rate source.
pub type ExchangeRates = HashMap<String, Decimal>;

/// One entry of a country's `currencies` array.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl RawCurrency {
    pub fn with_code(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
            ..Default::default()
        }
    }
}

/// A country document exactly as the country source returns it.
///
/// Every field is optional on the wire; the refresh pipeline decides which
/// absences are fatal for the document. Unknown fields are ignored.
///
/// # Examples
///
/// ```
/// use terra_core::source::RawCountry;
///
/// let json = r#"{
///     "name": "Ghana",
///     "capital": "Accra",
///     "region": "Africa",
///     "population": 31072940,
///     "flag": "https://flagcdn.com/gh.svg",
///     "currencies": [{"code": "GHS", "name": "Ghanaian cedi", "symbol": "₵"}],
///     "independent": true
/// }"#;
///
/// let raw: RawCountry = serde_json::from_str(json).unwrap();
/// assert_eq!(raw.name.as_deref(), Some("Ghana"));
/// assert_eq!(raw.currencies.unwrap()[0].code.as_deref(), Some("GHS"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCountry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_population")]
    pub population: Option<i64>,
    #[serde(default, rename = "flag")]
    pub flag_url: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<RawCurrency>>,
}

/// Reads `population` without letting one odd value fail the whole list.
///
/// Floats such as `29000.0` are truncated toward zero. Anything that is not
/// a number within `i64` range reads as absent, which skips only that
/// document.
fn lenient_population<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(population_from_value))
}

fn population_from_value(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f.trunc() as i64)
}

/// Source of the country list document.
#[async_trait]
pub trait CountrySource: Send + Sync {
    /// Fetches every country document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ExternalSourceUnavailable` on any transport,
    /// status or parse failure. Never returns a partial list.
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, AppError>;
}

/// Source of the currency rate table.
#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Fetches the rate table keyed by currency code.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ExternalSourceUnavailable` on any transport,
    /// status or parse failure.
    async fn fetch_exchange_rates(&self) -> Result<ExchangeRates, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_country_missing_fields() {
        let raw: RawCountry = serde_json::from_str(r#"{"population": 500}"#).unwrap();
        assert!(raw.name.is_none());
        assert_eq!(raw.population, Some(500));
        assert!(raw.currencies.is_none());
    }

    #[test]
    fn test_raw_country_null_fields() {
        let raw: RawCountry =
            serde_json::from_str(r#"{"name": "Utopia", "capital": null, "currencies": null}"#)
                .unwrap();
        assert_eq!(raw.name.as_deref(), Some("Utopia"));
        assert!(raw.capital.is_none());
        assert!(raw.currencies.is_none());
    }

    #[test]
    fn test_raw_currency_without_code() {
        let raw: RawCountry =
            serde_json::from_str(r#"{"name": "X", "currencies": [{"name": "Nothing"}]}"#)
                .unwrap();
        let currencies = raw.currencies.unwrap();
        assert_eq!(currencies.len(), 1);
        assert!(currencies[0].code.is_none());
    }

    #[test]
    fn test_population_accepts_floats() {
        let raw: RawCountry =
            serde_json::from_str(r#"{"name": "Aland", "population": 29000.0}"#).unwrap();
        assert_eq!(raw.population, Some(29_000));

        let raw: RawCountry =
            serde_json::from_str(r#"{"name": "Aland", "population": 29000.7}"#).unwrap();
        assert_eq!(raw.population, Some(29_000));
    }

    #[test]
    fn test_odd_population_skips_only_that_document() {
        let docs: Vec<RawCountry> = serde_json::from_str(
            r#"[
                {"name": "Aland", "population": 29000.0},
                {"name": "Textland", "population": "many"},
                {"name": "Hugeland", "population": 1e300},
                {"name": "Ghana", "population": 31072940},
                {"name": "Nulland", "population": null}
            ]"#,
        )
        .unwrap();

        let populations: Vec<Option<i64>> = docs.iter().map(|d| d.population).collect();
        assert_eq!(
            populations,
            vec![Some(29_000), None, None, Some(31_072_940), None]
        );
    }

    #[test]
    fn test_negative_population_is_kept_for_the_merge_to_reject() {
        let raw: RawCountry = serde_json::from_str(r#"{"population": -5}"#).unwrap();
        assert_eq!(raw.population, Some(-5));
    }
}
