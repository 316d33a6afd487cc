//! Country repository for PostgreSQL.
//!
//! Identity is the `name_key` column (lower-cased name) with a unique index,
//! so every upsert is a single `INSERT ... ON CONFLICT` statement and two
//! spellings of the same name can never produce two rows.
//!
//! # Testing
//!
//! Query building is unit tested here. The SQL itself needs a PostgreSQL
//! instance; the behavior it must match is covered against [`crate::InMemoryStore`]
//! in `tests/pipeline.rs`.

use async_trait::async_trait;
use sqlx::{PgPool, Pool, Postgres};
use terra_core::error::AppError;
use terra_core::models::{
    name_key, Country, CountryQuery, NewCountry, RefreshMetadata, SortKey, UpsertOutcome,
};
use terra_core::store::{CountryStore, RefreshMetadataStore};
use uuid::Uuid;

/// Column list for SELECT queries. Must remain a const literal to ensure SQL safety
/// since format!() bypasses sqlx compile-time validation.
const COUNTRY_COLUMNS: &str = "id, name, capital, region, population, currency_code, exchange_rate, estimated_gdp, flag_url, last_refreshed_at";

/// Repository for country persistence in PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use terra_db::CountryRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/terra")
///     .await?;
///
/// let repo = CountryRepository::new(pool);
/// repo.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CountryRepository {
    pool: Pool<Postgres>,
}

impl CountryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.into()))
    }
}

/// Returns the ORDER BY clause for a sort key. Unset estimates sort last in
/// both directions; ties fall back to the lower-cased name, then its spelling.
fn order_clause(sort: Option<SortKey>) -> &'static str {
    match sort {
        Some(SortKey::GdpAsc) => "estimated_gdp ASC NULLS LAST, name_key ASC, name ASC",
        Some(SortKey::GdpDesc) => "estimated_gdp DESC NULLS LAST, name_key ASC, name ASC",
        Some(SortKey::PopulationAsc) => "population ASC, name_key ASC, name ASC",
        Some(SortKey::PopulationDesc) => "population DESC, name_key ASC, name ASC",
        Some(SortKey::NameDesc) => "name_key DESC, name DESC",
        Some(SortKey::NameAsc) | None => "name_key ASC, name ASC",
    }
}

/// Builds the list query and its bind values. Filter values are always bound,
/// never interpolated.
fn build_list_query(query: &CountryQuery) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(region) = &query.region {
        binds.push(region.to_lowercase());
        conditions.push(format!("lower(region) = ${}", binds.len()));
    }
    if let Some(currency) = &query.currency {
        binds.push(currency.to_lowercase());
        conditions.push(format!("lower(currency_code) = ${}", binds.len()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT {} FROM countries{} ORDER BY {}",
        COUNTRY_COLUMNS,
        where_clause,
        order_clause(query.sort)
    );

    (sql, binds)
}

#[async_trait]
impl CountryStore for CountryRepository {
    async fn upsert_country(&self, country: &NewCountry) -> Result<UpsertOutcome, AppError> {
        // xmax is 0 only for a freshly inserted tuple.
        let (id, inserted): (Uuid, bool) = sqlx::query_as(
            r#"
            INSERT INTO countries (
                name,
                name_key,
                capital,
                region,
                population,
                currency_code,
                exchange_rate,
                estimated_gdp,
                flag_url,
                last_refreshed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (name_key)
            DO UPDATE SET
                name = EXCLUDED.name,
                capital = EXCLUDED.capital,
                region = EXCLUDED.region,
                population = EXCLUDED.population,
                currency_code = EXCLUDED.currency_code,
                exchange_rate = EXCLUDED.exchange_rate,
                estimated_gdp = EXCLUDED.estimated_gdp,
                flag_url = EXCLUDED.flag_url,
                last_refreshed_at = NOW()
            RETURNING id, (xmax = 0) AS inserted
            "#,
        )
        .bind(&country.name)
        .bind(country.name_key())
        .bind(&country.capital)
        .bind(&country.region)
        .bind(country.population)
        .bind(&country.currency_code)
        .bind(country.exchange_rate)
        .bind(country.estimated_gdp)
        .bind(&country.flag_url)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        Ok(if inserted {
            UpsertOutcome::Created(id)
        } else {
            UpsertOutcome::Updated(id)
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Country>, AppError> {
        let query = format!("SELECT {} FROM countries WHERE name_key = $1", COUNTRY_COLUMNS);
        let result = sqlx::query_as::<_, Country>(&query)
            .bind(name_key(name))
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result)
    }

    async fn list_countries(&self, query: &CountryQuery) -> Result<Vec<Country>, AppError> {
        let (sql, binds) = build_list_query(query);

        let mut q = sqlx::query_as::<_, Country>(&sql);
        for value in binds {
            q = q.bind(value);
        }

        q.fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM countries WHERE name_key = $1")
            .bind(name_key(name))
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_countries(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)
    }
}

#[async_trait]
impl RefreshMetadataStore for CountryRepository {
    async fn get_or_create_metadata(&self) -> Result<RefreshMetadata, AppError> {
        // ON CONFLICT makes concurrent first accesses converge on one row.
        sqlx::query(
            r#"
            INSERT INTO refresh_metadata (id, total_countries, last_refreshed_at)
            VALUES (1, 0, NOW())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(AppError::DatabaseError)?;

        sqlx::query_as::<_, RefreshMetadata>(
            "SELECT total_countries, last_refreshed_at FROM refresh_metadata WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }

    async fn record_refresh(&self, total_countries: i64) -> Result<RefreshMetadata, AppError> {
        sqlx::query_as::<_, RefreshMetadata>(
            r#"
            INSERT INTO refresh_metadata (id, total_countries, last_refreshed_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id)
            DO UPDATE SET
                total_countries = EXCLUDED.total_countries,
                last_refreshed_at = NOW()
            RETURNING total_countries, last_refreshed_at
            "#,
        )
        .bind(total_countries)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::DatabaseError)
    }
}
