//! Merge logic and statistics for a refresh.
//!
//! This module holds the pure part of the pipeline: turning one raw country
//! document plus the rate table into the record to upsert. Fetching and
//! writing live in [`crate::service`].

use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::resolve_currency_code;
use crate::models::{NewCountry, RefreshMetadata, UpsertOutcome};
use crate::source::{ExchangeRates, RawCountry};
use crate::valuation;

/// Why a source document produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingPopulation,
    NegativePopulation,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingName => "missing name",
            SkipReason::MissingPopulation => "missing population",
            SkipReason::NegativePopulation => "negative population",
        }
    }
}

/// Result of merging one country document with the rate table.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeDecision {
    /// The document is unusable; nothing is written for it.
    Skip(SkipReason),
    /// The document yields this record.
    Upsert(NewCountry),
}

/// Merges a raw country document with the rate table.
///
/// - Documents without a name or population are skipped.
/// - With no resolvable currency, the rate stays unset and the estimate is
///   a known `0.00`.
/// - With a currency missing from the rate table, rate and estimate both
///   stay unset.
/// - Otherwise the estimate comes from [`valuation::estimate`]; a zero or
///   negative rate leaves it unset.
pub fn merge_country<R: Rng + ?Sized>(
    raw: &RawCountry,
    rates: &ExchangeRates,
    rng: &mut R,
) -> MergeDecision {
    let name = match raw.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return MergeDecision::Skip(SkipReason::MissingName),
    };
    let population = match raw.population {
        Some(p) if p >= 0 => p,
        Some(_) => return MergeDecision::Skip(SkipReason::NegativePopulation),
        None => return MergeDecision::Skip(SkipReason::MissingPopulation),
    };

    let currency_code = resolve_currency_code(raw.currencies.as_deref());

    let (exchange_rate, estimated_gdp) = match currency_code {
        Some(code) => match rates.get(code).copied() {
            Some(rate) => (
                Some(rate),
                valuation::estimate(population as u64, Some(rate), rng),
            ),
            None => (None, None),
        },
        None => (None, Some(Decimal::new(0, valuation::ESTIMATE_DP))),
    };

    MergeDecision::Upsert(NewCountry {
        name: name.to_string(),
        capital: raw.capital.clone(),
        region: raw.region.clone(),
        population,
        currency_code: currency_code.map(str::to_string),
        exchange_rate,
        estimated_gdp,
        flag_url: raw.flag_url.clone(),
    })
}

/// Outcome of processing a single document during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First time this name was stored
    Created,
    /// An existing record (same name, any case) was replaced
    Updated,
    /// The document was unusable
    Skipped,
}

impl From<UpsertOutcome> for SyncOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created(_) => SyncOutcome::Created,
            UpsertOutcome::Updated(_) => SyncOutcome::Updated,
        }
    }
}

/// Statistics for a refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl SyncStats {
    /// Creates a new empty stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Documents that produced a write.
    pub fn processed(&self) -> usize {
        self.created + self.updated
    }

    /// Every document seen, skipped ones included.
    pub fn total(&self) -> usize {
        self.processed() + self.skipped
    }
}

/// What a completed refresh reports back to its trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub processed_count: usize,
    pub stats: SyncStats,
    pub metadata: RefreshMetadata,
}

impl RefreshSummary {
    pub fn new(stats: SyncStats, metadata: RefreshMetadata) -> Self {
        Self {
            processed_count: stats.processed(),
            stats,
            metadata,
        }
    }
}
