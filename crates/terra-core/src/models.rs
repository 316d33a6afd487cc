use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Returns the identity key for a country name.
///
/// Two names that differ only by case map to the same key, so the key is what
/// storage indexes on. Surrounding whitespace is not part of the identity.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A stored country row.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Country {
    pub id: Uuid,
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub estimated_gdp: Option<Decimal>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Values written by a refresh for a single country (DTO).
///
/// Every field is written on update, including `None`s: an upsert is a full
/// replace, never a partial merge. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCountry {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<Decimal>,
    pub estimated_gdp: Option<Decimal>,
    pub flag_url: Option<String>,
}

impl NewCountry {
    /// The case-insensitive identity key of this record.
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(Uuid),
    Updated(Uuid),
}

impl UpsertOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            UpsertOutcome::Created(id) | UpsertOutcome::Updated(id) => *id,
        }
    }
}

/// The singleton aggregate describing the last write to the country table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct RefreshMetadata {
    pub total_countries: i64,
    pub last_refreshed_at: DateTime<Utc>,
}

/// Sort orders accepted by the list query.
///
/// The string forms (`gdp_desc`, `population_asc`, ...) are the ones API
/// clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    GdpAsc,
    GdpDesc,
    PopulationAsc,
    PopulationDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::GdpAsc,
        SortKey::GdpDesc,
        SortKey::PopulationAsc,
        SortKey::PopulationDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::GdpAsc => "gdp_asc",
            SortKey::GdpDesc => "gdp_desc",
            SortKey::PopulationAsc => "population_asc",
            SortKey::PopulationDesc => "population_desc",
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown sort key: {}", s))
    }
}

/// Filters and ordering for listing stored countries.
///
/// Region and currency filters compare case-insensitively. Without a sort
/// key, results are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<SortKey>,
}

impl CountryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Returns true if `country` passes the region and currency filters.
    pub fn matches(&self, country: &Country) -> bool {
        fn eq_ignore_case(filter: &Option<String>, value: &Option<String>) -> bool {
            match filter {
                None => true,
                Some(f) => value
                    .as_deref()
                    .is_some_and(|v| v.to_lowercase() == f.to_lowercase()),
            }
        }

        eq_ignore_case(&self.region, &country.region)
            && eq_ignore_case(&self.currency, &country.currency_code)
    }
}
