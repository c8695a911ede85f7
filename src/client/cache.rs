use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::{ClientResult, LibraryBackend, LibraryMutation, MutationResult};
use crate::models::Library;

/// Bookkeeping behind the `UserLibrary` tag
#[derive(Debug, Default)]
struct CacheState {
    library: Option<Library>,
    /// False once the tag has been invalidated
    valid: bool,
    /// Bumped on every invalidation; a fetch started under an older generation is superseded
    generation: u64,
}

/// Client-side cache of the signed-in user's library.
///
/// There is a single tag for the whole library. Every successful mutation
/// invalidates it and notifies subscribers; the next [`PersonalCache::library`]
/// call refetches everything. Nothing is patched locally, so views keep showing
/// the previous state until that round trip completes.
///
/// The state lock is only held for bookkeeping, never across a request.
pub struct PersonalCache {
    backend: Arc<dyn LibraryBackend>,
    state: Mutex<CacheState>,
    tag: watch::Sender<u64>,
}

impl PersonalCache {
    pub fn new(backend: Arc<dyn LibraryBackend>) -> Self {
        let (tag, _) = watch::channel(0);
        Self {
            backend,
            state: Mutex::new(CacheState::default()),
            tag,
        }
    }

    /// Returns the cached library, fetching it when absent or invalidated.
    ///
    /// When the tag is invalidated while the fetch is in flight, the result is
    /// still returned to the caller but not cached.
    pub async fn library(&self) -> ClientResult<Library> {
        let generation = {
            let state = self.state.lock().await;
            if let (true, Some(library)) = (state.valid, state.library.as_ref()) {
                return Ok(library.clone());
            }
            state.generation
        };

        let library = self.backend.fetch_library().await?;

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.library = Some(library.clone());
            state.valid = true;
        } else {
            tracing::debug!(
                started = generation,
                current = state.generation,
                "Discarding superseded library fetch"
            );
        }

        Ok(library)
    }

    /// Whatever is cached right now, possibly stale; never fetches
    pub async fn snapshot(&self) -> Option<Library> {
        self.state.lock().await.library.clone()
    }

    pub async fn is_valid(&self) -> bool {
        self.state.lock().await.valid
    }

    /// Issues the mutation, then invalidates the library tag.
    ///
    /// On failure the error is returned and the cache is left untouched.
    pub async fn mutate(&self, mutation: LibraryMutation) -> ClientResult<MutationResult> {
        let result = self.backend.apply(mutation).await?;
        self.invalidate().await;
        Ok(result)
    }

    /// Marks the library stale and notifies every subscriber
    pub async fn invalidate(&self) {
        let generation = {
            let mut state = self.state.lock().await;
            state.valid = false;
            state.generation += 1;
            state.generation
        };

        tracing::debug!(generation, "Library tag invalidated");
        self.tag.send_replace(generation);
    }

    /// Drops the cached library, e.g. on logout
    pub async fn clear(&self) {
        {
            let mut state = self.state.lock().await;
            state.library = None;
        }
        self.invalidate().await;
    }

    /// Receiver of tag generations; changes whenever the library must be refetched
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tag.subscribe()
    }
}
