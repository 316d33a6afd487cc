//! Terra Core - Domain types, merge pipeline, error handling, and configuration.

pub mod config;
pub mod currency;
pub mod error;
pub mod models;
pub mod service;
pub mod source;
pub mod store;
pub mod sync;
pub mod valuation;

pub use config::{
    default_config_path, load_sources_config, DbConfig, HttpConfig, SourcesConfig,
};
pub use error::{AppError, ErrorKind};
pub use models::{
    name_key, Country, CountryQuery, NewCountry, RefreshMetadata, SortKey, UpsertOutcome,
};
pub use service::CountryService;
pub use source::{CountrySource, ExchangeRateSource, ExchangeRates, RawCountry, RawCurrency};
pub use store::{CountryStore, RefreshMetadataStore};
pub use sync::{merge_country, MergeDecision, RefreshSummary, SkipReason, SyncOutcome, SyncStats};
