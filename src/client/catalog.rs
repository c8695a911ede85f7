use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use super::ClientResult;
use crate::{
    models::{MovieDetails, MoviePage, TmdbId},
    services::providers::{CatalogProvider, Listing},
};

/// Session-lifetime memo of catalog responses.
///
/// Catalog data is read-only from the user's point of view, so entries are
/// never invalidated; library mutations leave this cache alone.
pub struct CatalogCache {
    provider: Arc<dyn CatalogProvider>,
    pages: Mutex<HashMap<(Listing, u32), MoviePage>>,
    details: Mutex<HashMap<TmdbId, MovieDetails>>,
}

impl CatalogCache {
    pub fn new(provider: Arc<dyn CatalogProvider>) -> Self {
        Self {
            provider,
            pages: Mutex::new(HashMap::new()),
            details: Mutex::new(HashMap::new()),
        }
    }

    pub async fn page(&self, listing: &Listing, page: u32) -> ClientResult<MoviePage> {
        let key = (listing.clone(), page);
        if let Some(cached) = self.pages.lock().await.get(&key) {
            return Ok(cached.clone());
        }

        tracing::debug!(provider = self.provider.name(), %listing, page, "Catalog page miss");
        let fetched = self.provider.list(listing.clone(), page).await?;
        self.pages.lock().await.insert(key, fetched.clone());
        Ok(fetched)
    }

    pub async fn details(&self, id: TmdbId) -> ClientResult<MovieDetails> {
        if let Some(cached) = self.details.lock().await.get(&id) {
            return Ok(cached.clone());
        }

        let fetched = self.provider.details(id).await?;
        self.details.lock().await.insert(id, fetched.clone());
        Ok(fetched)
    }

    pub async fn cached_pages(&self) -> usize {
        self.pages.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::error::AppError;
    use crate::models::Movie;
    use crate::services::providers::MockCatalogProvider;

    fn page_of(page: u32, ids: &[TmdbId]) -> MoviePage {
        MoviePage {
            page,
            results: ids
                .iter()
                .map(|id| Movie {
                    id: *id,
                    title: format!("Movie {}", id),
                    poster_path: None,
                    backdrop_path: None,
                    vote_average: 6.5,
                    release_date: None,
                    overview: None,
                })
                .collect(),
            total_pages: 3,
            total_results: 60,
        }
    }

    #[test]
    fn test_pages_are_memoized_per_listing_and_page() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_list()
            .times(2)
            .returning(|_, page| Ok(page_of(page, &[page as TmdbId])));

        let cache = CatalogCache::new(Arc::new(provider));

        tokio_test::block_on(async {
            let first = cache.page(&Listing::Trending, 1).await.unwrap();
            let again = cache.page(&Listing::Trending, 1).await.unwrap();
            assert_eq!(first, again);

            cache.page(&Listing::Trending, 2).await.unwrap();
            assert_eq!(cache.cached_pages().await, 2);
        });
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_cached() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_list()
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("TMDB returned 500".to_string())));

        let cache = CatalogCache::new(Arc::new(provider));
        let err = cache.page(&Listing::Popular, 1).await.unwrap_err();

        assert!(matches!(err, ClientError::Catalog(AppError::ExternalApi(_))));
        assert_eq!(cache.cached_pages().await, 0);
    }
}
