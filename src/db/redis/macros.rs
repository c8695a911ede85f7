/// Read-through caching for catalog lookups.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds and returns it.
/// A failed cache read is logged and treated as a miss, so an unavailable Redis
/// degrades to uncached upstream calls.
///
/// # Example
/// ```rust,ignore
/// let details: MovieDetails = cached!(self.cache, CacheKey::MovieDetails(603), 3600, async move {
///     self.inner.details(603).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            result => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, fetching upstream");
                }
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
