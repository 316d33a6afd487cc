//! Terra Client - HTTP source adapters
//!
//! This crate provides the two external data sources of a refresh:
//!
//! - [`countries`] - the country list (REST Countries v2 shape)
//! - [`exchange`] - the currency rate table (ExchangeRate-API shape)
//!
//! # Overview
//!
//! Each adapter performs a single GET with a bounded timeout. Any transport,
//! status or parse failure becomes `AppError::ExternalSourceUnavailable`;
//! nothing is retried or cached.

pub mod countries;
pub mod exchange;
mod http;

// Re-export main client types
pub use countries::CountriesClient;
pub use exchange::ExchangeRateClient;
