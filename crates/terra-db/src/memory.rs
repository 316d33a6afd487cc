//! Process-local store with the same semantics as the PostgreSQL repository.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use terra_core::error::AppError;
use terra_core::models::{
    name_key, Country, CountryQuery, NewCountry, RefreshMetadata, SortKey, UpsertOutcome,
};
use terra_core::store::{CountryStore, RefreshMetadataStore};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Countries indexed by lower-cased name, plus the metadata singleton.
///
/// Each upsert runs under the write lock, so it is atomic per name.
///
/// Names sort by their lower-cased form, then by exact spelling, matching the
/// repository's `name_key` ordering. PostgreSQL compares keys under the
/// database collation, so accented names (`Åland`) can still land in a
/// different position than they do here.
///
/// # Examples
///
/// ```
/// use terra_core::store::CountryStore;
/// use terra_core::NewCountry;
/// use terra_db::InMemoryStore;
///
/// # tokio_test(async {
/// let store = InMemoryStore::new();
/// let ghana = NewCountry {
///     name: "Ghana".to_string(),
///     capital: Some("Accra".to_string()),
///     region: Some("Africa".to_string()),
///     population: 31_072_940,
///     currency_code: None,
///     exchange_rate: None,
///     estimated_gdp: None,
///     flag_url: None,
/// };
/// store.upsert_country(&ghana).await.unwrap();
/// assert!(store.find_by_name("GHANA").await.unwrap().is_some());
/// # });
/// # fn tokio_test<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Default)]
pub struct InMemoryStore {
    countries: RwLock<HashMap<String, Country>>,
    metadata: Mutex<Option<RefreshMetadata>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Unset estimates go last regardless of direction.
fn cmp_gdp(a: Option<Decimal>, b: Option<Decimal>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Country, b: &Country, sort: Option<SortKey>) -> Ordering {
    let by_name = name_key(&a.name)
        .cmp(&name_key(&b.name))
        .then_with(|| a.name.cmp(&b.name));
    match sort {
        Some(SortKey::GdpAsc) => cmp_gdp(a.estimated_gdp, b.estimated_gdp, false).then(by_name),
        Some(SortKey::GdpDesc) => cmp_gdp(a.estimated_gdp, b.estimated_gdp, true).then(by_name),
        Some(SortKey::PopulationAsc) => a.population.cmp(&b.population).then(by_name),
        Some(SortKey::PopulationDesc) => b.population.cmp(&a.population).then(by_name),
        Some(SortKey::NameDesc) => by_name.reverse(),
        Some(SortKey::NameAsc) | None => by_name,
    }
}

#[async_trait]
impl CountryStore for InMemoryStore {
    async fn upsert_country(&self, country: &NewCountry) -> Result<UpsertOutcome, AppError> {
        let mut countries = self.countries.write().await;
        let key = country.name_key();
        let existing = countries.get(&key).map(|c| c.id);
        let id = existing.unwrap_or_else(Uuid::new_v4);

        countries.insert(
            key,
            Country {
                id,
                name: country.name.clone(),
                capital: country.capital.clone(),
                region: country.region.clone(),
                population: country.population,
                currency_code: country.currency_code.clone(),
                exchange_rate: country.exchange_rate,
                estimated_gdp: country.estimated_gdp,
                flag_url: country.flag_url.clone(),
                last_refreshed_at: Utc::now(),
            },
        );

        Ok(match existing {
            Some(id) => UpsertOutcome::Updated(id),
            None => UpsertOutcome::Created(id),
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError> {
        Ok(self.countries.read().await.get(&name_key(name)).cloned())
    }

    async fn list_countries(&self, query: &CountryQuery) -> Result<Vec<Country>, AppError> {
        let mut result: Vec<Country> = self
            .countries
            .read()
            .await
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        result.sort_by(|a, b| compare(a, b, query.sort));
        Ok(result)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError> {
        Ok(self
            .countries
            .write()
            .await
            .remove(&name_key(name))
            .is_some())
    }

    async fn count_countries(&self) -> Result<i64, AppError> {
        Ok(self.countries.read().await.len() as i64)
    }
}

#[async_trait]
impl RefreshMetadataStore for InMemoryStore {
    async fn get_or_create_metadata(&self) -> Result<RefreshMetadata, AppError> {
        let mut slot = self.metadata.lock().await;
        Ok(slot
            .get_or_insert_with(|| RefreshMetadata {
                total_countries: 0,
                last_refreshed_at: Utc::now(),
            })
            .clone())
    }

    async fn record_refresh(&self, total_countries: i64) -> Result<RefreshMetadata, AppError> {
        let metadata = RefreshMetadata {
            total_countries,
            last_refreshed_at: Utc::now(),
        };
        *self.metadata.lock().await = Some(metadata.clone());
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_country(name: &str, population: i64, gdp: Option<Decimal>) -> NewCountry {
        NewCountry {
            name: name.to_string(),
            capital: None,
            region: None,
            population,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            flag_url: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_case_insensitive() {
        let store = InMemoryStore::new();
        let first = store.upsert_country(&new_country("Ghana", 1, None)).await.unwrap();
        let second = store.upsert_country(&new_country("GHANA", 2, None)).await.unwrap();

        assert!(matches!(first, UpsertOutcome::Created(_)));
        assert_eq!(second, UpsertOutcome::Updated(first.id()));
        assert_eq!(store.count_countries().await.unwrap(), 1);

        let stored = store.find_by_name("ghana").await.unwrap().unwrap();
        assert_eq!(stored.name, "GHANA");
        assert_eq!(stored.population, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_every_field() {
        let store = InMemoryStore::new();
        let mut full = new_country("Kenya", 50, Some(dec!(10.00)));
        full.capital = Some("Nairobi".to_string());
        full.exchange_rate = Some(dec!(129.5));
        store.upsert_country(&full).await.unwrap();

        store.upsert_country(&new_country("Kenya", 51, None)).await.unwrap();

        let stored = store.find_by_name("Kenya").await.unwrap().unwrap();
        assert!(stored.capital.is_none());
        assert!(stored.exchange_rate.is_none());
        assert!(stored.estimated_gdp.is_none());
    }

    #[tokio::test]
    async fn test_upsert_stamps_timestamp() {
        let store = InMemoryStore::new();
        store.upsert_country(&new_country("Chad", 1, None)).await.unwrap();
        let before = store.find_by_name("Chad").await.unwrap().unwrap().last_refreshed_at;

        store.upsert_country(&new_country("Chad", 1, None)).await.unwrap();
        let after = store.find_by_name("Chad").await.unwrap().unwrap().last_refreshed_at;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_collapse_to_one_record() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = ["peru", "PERU", "Peru", "pErU"]
            .into_iter()
            .map(|name| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert_country(&new_country(name, 1, None)).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if let UpsertOutcome::Created(_) = handle.await.unwrap().unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.count_countries().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_sorts_gdp_with_unset_last() {
        let store = InMemoryStore::new();
        store.upsert_country(&new_country("A", 1, Some(dec!(5)))).await.unwrap();
        store.upsert_country(&new_country("B", 1, None)).await.unwrap();
        store.upsert_country(&new_country("C", 1, Some(dec!(9)))).await.unwrap();

        let names = |v: Vec<Country>| v.into_iter().map(|c| c.name).collect::<Vec<_>>();

        let desc = store
            .list_countries(&CountryQuery::new().sort(SortKey::GdpDesc))
            .await
            .unwrap();
        assert_eq!(names(desc), vec!["C", "A", "B"]);

        let asc = store
            .list_countries(&CountryQuery::new().sort(SortKey::GdpAsc))
            .await
            .unwrap();
        assert_eq!(names(asc), vec!["A", "C", "B"]);
    }

    #[tokio::test]
    async fn test_list_sorts_population_and_name() {
        let store = InMemoryStore::new();
        store.upsert_country(&new_country("Brazil", 200, None)).await.unwrap();
        store.upsert_country(&new_country("Andorra", 1, None)).await.unwrap();
        store.upsert_country(&new_country("Chile", 20, None)).await.unwrap();

        let names = |v: Vec<Country>| v.into_iter().map(|c| c.name).collect::<Vec<_>>();

        let pop_desc = store
            .list_countries(&CountryQuery::new().sort(SortKey::PopulationDesc))
            .await
            .unwrap();
        assert_eq!(names(pop_desc), vec!["Brazil", "Chile", "Andorra"]);

        let default = store.list_countries(&CountryQuery::default()).await.unwrap();
        assert_eq!(names(default), vec!["Andorra", "Brazil", "Chile"]);

        let name_desc = store
            .list_countries(&CountryQuery::new().sort(SortKey::NameDesc))
            .await
            .unwrap();
        assert_eq!(names(name_desc), vec!["Chile", "Brazil", "Andorra"]);
    }

    #[tokio::test]
    async fn test_name_order_ignores_case() {
        let store = InMemoryStore::new();
        store.upsert_country(&new_country("Zambia", 1, None)).await.unwrap();
        store.upsert_country(&new_country("ghana", 1, None)).await.unwrap();
        store.upsert_country(&new_country("Benin", 1, None)).await.unwrap();

        let names = |v: Vec<Country>| v.into_iter().map(|c| c.name).collect::<Vec<_>>();

        let asc = store.list_countries(&CountryQuery::default()).await.unwrap();
        assert_eq!(names(asc), vec!["Benin", "ghana", "Zambia"]);

        let desc = store
            .list_countries(&CountryQuery::new().sort(SortKey::NameDesc))
            .await
            .unwrap();
        assert_eq!(names(desc), vec!["Zambia", "ghana", "Benin"]);
    }

    #[tokio::test]
    async fn test_delete_by_name() {
        let store = InMemoryStore::new();
        store.upsert_country(&new_country("Mali", 1, None)).await.unwrap();

        assert!(store.delete_by_name("MALI").await.unwrap());
        assert!(!store.delete_by_name("Mali").await.unwrap());
        assert_eq!(store.count_countries().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_metadata_get_or_create_is_stable() {
        let store = InMemoryStore::new();
        let first = store.get_or_create_metadata().await.unwrap();
        let second = store.get_or_create_metadata().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_countries, 0);

        let updated = store.record_refresh(12).await.unwrap();
        assert_eq!(updated.total_countries, 12);
        assert_eq!(store.get_or_create_metadata().await.unwrap(), updated);
    }
}
