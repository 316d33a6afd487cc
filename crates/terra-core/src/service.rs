//! Refresh orchestration and the country query surface.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::models::{Country, CountryQuery, RefreshMetadata};
use crate::source::{CountrySource, ExchangeRateSource};
use crate::store::{CountryStore, RefreshMetadataStore};
use crate::sync::{merge_country, MergeDecision, RefreshSummary, SyncOutcome, SyncStats};

/// Ties the sources and the store together.
///
/// Refreshes and deletes both rewrite the metadata singleton; they take the
/// same lock so that, within a process, they never interleave.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use terra_core::service::CountryService;
/// # use terra_core::source::{CountrySource, ExchangeRateSource};
/// # use terra_core::store::{CountryStore, RefreshMetadataStore};
///
/// # async fn example<S>(
/// #     countries: Arc<dyn CountrySource>,
/// #     rates: Arc<dyn ExchangeRateSource>,
/// #     store: Arc<S>,
/// # ) -> Result<(), terra_core::AppError>
/// # where S: CountryStore + RefreshMetadataStore + 'static {
/// let service = CountryService::new(countries, rates, store);
/// let summary = service.refresh().await?;
/// println!("Refreshed {} countries", summary.processed_count);
/// # Ok(())
/// # }
/// ```
pub struct CountryService {
    countries: Arc<dyn CountrySource>,
    rates: Arc<dyn ExchangeRateSource>,
    store: Arc<dyn CountryStore>,
    metadata: Arc<dyn RefreshMetadataStore>,
    write_lock: Mutex<()>,
}

impl CountryService {
    pub fn new<S>(
        countries: Arc<dyn CountrySource>,
        rates: Arc<dyn ExchangeRateSource>,
        store: Arc<S>,
    ) -> Self
    where
        S: CountryStore + RefreshMetadataStore + 'static,
    {
        Self {
            countries,
            rates,
            store: store.clone(),
            metadata: store,
            write_lock: Mutex::new(()),
        }
    }

    /// Runs a full refresh with an entropy-seeded generator.
    pub async fn refresh(&self) -> Result<RefreshSummary, AppError> {
        let mut rng = StdRng::from_entropy();
        self.synchronize(&mut rng).await
    }

    /// Fetches both sources, merges every document and upserts the results,
    /// then rewrites the metadata with the stored total.
    ///
    /// Both fetches complete before the first write, so a source failure
    /// leaves storage untouched. A failed write aborts the loop; earlier
    /// writes stay. Names missing from the new snapshot are not pruned.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ExternalSourceUnavailable` if either source fails,
    /// or the store's error if a write fails.
    pub async fn synchronize<R>(&self, rng: &mut R) -> Result<RefreshSummary, AppError>
    where
        R: Rng + Send + ?Sized,
    {
        let _guard = self.write_lock.lock().await;

        info!("Fetching country list...");
        let documents = self.countries.fetch_countries().await.inspect_err(|e| {
            error!("Country source failed: {}", e);
        })?;

        info!("Fetching exchange rates...");
        let rates = self.rates.fetch_exchange_rates().await.inspect_err(|e| {
            error!("Exchange rate source failed: {}", e);
        })?;

        info!(
            "Merging {} country documents with {} exchange rates",
            documents.len(),
            rates.len()
        );

        let total = documents.len();
        let mut stats = SyncStats::new();

        for (i, raw) in documents.iter().enumerate() {
            match merge_country(raw, &rates, &mut *rng) {
                MergeDecision::Skip(reason) => {
                    warn!("[{}/{}] Skipped document: {}", i + 1, total, reason.as_str());
                    stats.record(SyncOutcome::Skipped);
                }
                MergeDecision::Upsert(country) => {
                    let outcome = self.store.upsert_country(&country).await.inspect_err(|e| {
                        error!("[{}/{}] Failed to save {}: {}", i + 1, total, country.name, e);
                    })?;
                    debug!("[{}/{}] Saved: {} ({})", i + 1, total, country.name, outcome.id());
                    stats.record(outcome.into());
                }
            }
        }

        let total_countries = self.store.count_countries().await?;
        let metadata = self.metadata.record_refresh(total_countries).await?;

        info!(
            "Refresh complete: {} created, {} updated, {} skipped; {} countries stored",
            stats.created, stats.updated, stats.skipped, metadata.total_countries
        );

        Ok(RefreshSummary::new(stats, metadata))
    }

    /// Looks up one country by case-insensitive name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CountryNotFound` if no record matches.
    pub async fn get_country(&self, name: &str) -> Result<Country, AppError> {
        self.store
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::CountryNotFound(name.to_string()))
    }

    /// Lists stored countries with optional filters and ordering.
    pub async fn list_countries(&self, query: &CountryQuery) -> Result<Vec<Country>, AppError> {
        self.store.list_countries(query).await
    }

    /// Deletes one country by case-insensitive name and recounts.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CountryNotFound` if no record matches; the
    /// metadata is left unchanged in that case.
    pub async fn delete_country(&self, name: &str) -> Result<RefreshMetadata, AppError> {
        let _guard = self.write_lock.lock().await;

        if !self.store.delete_by_name(name).await? {
            return Err(AppError::CountryNotFound(name.to_string()));
        }
        info!("Deleted country: {}", name);

        let total_countries = self.store.count_countries().await?;
        self.metadata.record_refresh(total_countries).await
    }

    /// Returns the current refresh metadata, creating it if needed.
    pub async fn status(&self) -> Result<RefreshMetadata, AppError> {
        self.metadata.get_or_create_metadata().await
    }
}
