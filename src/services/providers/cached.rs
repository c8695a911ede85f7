use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{MovieDetails, MoviePage, TmdbId},
    services::providers::{CatalogProvider, Listing},
};

const LISTING_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 86400; // 1 day

/// Wraps a provider with a Redis read-through cache.
///
/// Catalog data is read-only, so entries only ever expire; nothing invalidates them.
#[derive(Clone)]
pub struct CachedProvider {
    inner: Arc<dyn CatalogProvider>,
    cache: Cache,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn CatalogProvider>, cache: Cache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for CachedProvider {
    async fn list(&self, listing: Listing, page: u32) -> AppResult<MoviePage> {
        cached!(
            self.cache,
            CacheKey::CatalogPage {
                listing: listing.cache_segment(),
                page,
            },
            LISTING_CACHE_TTL,
            self.inner.list(listing.clone(), page)
        )
    }

    async fn details(&self, id: TmdbId) -> AppResult<MovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(id),
            DETAILS_CACHE_TTL,
            self.inner.details(id)
        )
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
