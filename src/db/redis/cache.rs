use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::{
    error::{AppError, AppResult},
    models::TmdbId,
};

/// Keys of cached catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One page of a listing, keyed by the listing's cache segment
    CatalogPage { listing: String, page: u32 },
    MovieDetails(TmdbId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::CatalogPage { listing, page } => {
                write!(f, "catalog:{}:{}", listing.to_lowercase(), page)
            }
            CacheKey::MovieDetails(id) => write!(f, "movie:{}", id),
        }
    }
}

/// Opens a client for the catalog cache and the user store; connections are made lazily
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// A serialized catalog response waiting for the writer task
struct PendingWrite {
    key: String,
    json: String,
    ttl_secs: u64,
}

/// Catalog response cache in Redis, written by a background task
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    pending: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the catalog cache writer once the server has finished serving
pub struct CacheWriterHandle {
    stop: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer; queued catalog pages are still flushed before it exits
    pub async fn shutdown(self) {
        if self.stop.send(()).await.is_err() {
            tracing::warn!("Cache writer already stopped");
            return;
        }
        tracing::info!("Catalog cache writer stopping");
    }
}

impl Cache {
    /// Spawns the writer task. Proxy handlers only enqueue, so a slow Redis
    /// never delays a catalog response.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (pending, queue) = mpsc::unbounded_channel();
        let (stop, stopped) = mpsc::channel(1);

        tokio::spawn(Self::run_writer(redis_client.clone(), queue, stopped));

        (
            Self {
                redis_client,
                pending,
            },
            CacheWriterHandle { stop },
        )
    }

    /// Writes queued entries until stopped, then drains whatever is still queued.
    ///
    /// A failed write is logged and dropped; cached catalog data is always
    /// refetchable.
    async fn run_writer(
        client: Client,
        mut queue: mpsc::UnboundedReceiver<PendingWrite>,
        mut stopped: mpsc::Receiver<()>,
    ) {
        tracing::info!("Catalog cache writer started");

        loop {
            tokio::select! {
                Some(write) = queue.recv() => {
                    let key = write.key.clone();
                    if let Err(e) = Self::write_entry(&client, write).await {
                        tracing::error!(error = %e, key = %key, "Catalog cache write failed");
                    }
                }
                _ = stopped.recv() => {
                    // Cache clones keep senders alive, so drain without waiting
                    let mut flushed = 0usize;
                    while let Ok(write) = queue.try_recv() {
                        match Self::write_entry(&client, write).await {
                            Ok(()) => flushed += 1,
                            Err(e) => tracing::error!(error = %e, "Catalog cache flush failed"),
                        }
                    }

                    tracing::info!(flushed, "Catalog cache writer stopped");
                    break;
                }
            }
        }
    }

    async fn write_entry(client: &Client, write: PendingWrite) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(write.key, write.json, write.ttl_secs).await?;
        Ok(())
    }

    /// Looks up a cached response, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Internal(format!("Corrupt cache entry {}: {}", key, e)))
        })
        .transpose()
    }

    /// Queues a value for the background writer; returns without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Could not serialize catalog response");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl_secs,
        };
        if self.pending.send(write).is_err() {
            tracing::warn!(key = %key, "Catalog cache writer is gone, skipping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoviePage;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_cache_key_display_catalog_page() {
        let key = CacheKey::CatalogPage {
            listing: "trending".to_string(),
            page: 2,
        };
        assert_eq!(key.to_string(), "catalog:trending:2");
    }

    #[test]
    fn test_cache_key_display_search_is_case_insensitive() {
        let upper = CacheKey::CatalogPage {
            listing: "search:THE MATRIX".to_string(),
            page: 1,
        };
        let lower = CacheKey::CatalogPage {
            listing: "search:the matrix".to_string(),
            page: 1,
        };
        assert_eq!(format!("{}", upper), format!("{}", lower));
    }

    #[test]
    fn test_cache_key_display_movie_details() {
        let key = CacheKey::MovieDetails(603);
        assert_eq!(key.to_string(), "movie:603");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client).await;

        let missing: Option<MoviePage> = cache
            .get_from_cache(&CacheKey::MovieDetails(999_999_999))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_queued_page_is_flushed_on_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone()).await;

        let key = CacheKey::CatalogPage {
            listing: "search:__flush_test".to_string(),
            page: 1,
        };
        let page = MoviePage::empty(1);

        cache.set_in_background(&key, &page, 60);
        handle.shutdown().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let stored: Option<MoviePage> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(stored, Some(page));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
