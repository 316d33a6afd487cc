//! Terra DB - storage implementations
//!
//! - [`CountryRepository`] - PostgreSQL via sqlx, with embedded migrations
//! - [`InMemoryStore`] - process-local store with the same semantics
//!
//! Both implement `CountryStore` and `RefreshMetadataStore` from `terra-core`.

pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::CountryRepository;
