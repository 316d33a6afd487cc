//! Storage contracts for countries and the refresh metadata singleton.
//!
//! `terra-db` provides a PostgreSQL implementation and an in-memory one.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Country, CountryQuery, NewCountry, RefreshMetadata, UpsertOutcome};

/// Country table keyed by case-insensitive name.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Inserts the country, or fully replaces the record whose name matches
    /// case-insensitively. The write stamps `last_refreshed_at` and must be
    /// atomic per name.
    async fn upsert_country(&self, country: &NewCountry) -> Result<UpsertOutcome, AppError>;

    /// Finds a country by case-insensitive name.
    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError>;

    /// Lists countries matching the query filters, in the query's order.
    async fn list_countries(&self, query: &CountryQuery) -> Result<Vec<Country>, AppError>;

    /// Deletes the country matching `name` case-insensitively. Returns true
    /// if a record was removed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError>;

    /// Current number of stored countries.
    async fn count_countries(&self) -> Result<i64, AppError>;
}

/// Owner of the refresh metadata singleton.
#[async_trait]
pub trait RefreshMetadataStore: Send + Sync {
    /// Returns the singleton, creating it (zero countries, stamped now) on
    /// first access. Concurrent first accesses yield one instance.
    async fn get_or_create_metadata(&self) -> Result<RefreshMetadata, AppError>;

    /// Overwrites the total and stamps the current time.
    async fn record_refresh(&self, total_countries: i64) -> Result<RefreshMetadata, AppError>;
}
