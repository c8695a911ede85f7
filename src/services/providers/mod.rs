//! Movie catalog providers
//!
//! The catalog is read-only third-party data. `TmdbProvider` talks to TMDB;
//! `CachedProvider` layers the Redis response cache on top of any provider.

pub mod cached;
pub mod catalog;
pub mod tmdb;

pub use cached::CachedProvider;
pub use catalog::{CatalogProvider, Listing};
#[cfg(test)]
pub use catalog::MockCatalogProvider;
pub use tmdb::TmdbProvider;
