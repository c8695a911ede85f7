use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use watchledger::{
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle, MemoryStore, RedisStore, UserStore},
    routes::{create_router, with_cors, AppState},
    services::{CachedProvider, CatalogProvider, TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("watchledger=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let redis_client = config
        .redis_url
        .as_deref()
        .map(create_redis_client)
        .transpose()?;

    let store: Arc<dyn UserStore> = match &redis_client {
        Some(client) => Arc::new(RedisStore::new(client.clone())),
        None => {
            tracing::warn!("REDIS_URL not set, user data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let mut cache_writer: Option<CacheWriterHandle> = None;
    let catalog: Option<Arc<dyn CatalogProvider>> = match &config.tmdb_api_key {
        Some(api_key) => {
            let tmdb: Arc<dyn CatalogProvider> = Arc::new(TmdbProvider::new(
                api_key.clone(),
                config.tmdb_api_url.clone(),
            ));
            match &redis_client {
                Some(client) => {
                    let (cache, handle) = Cache::new(client.clone()).await;
                    cache_writer = Some(handle);
                    let cached: Arc<dyn CatalogProvider> =
                        Arc::new(CachedProvider::new(tmdb, cache));
                    Some(cached)
                }
                None => Some(tmdb),
            }
        }
        None => {
            tracing::warn!("TMDB_API_KEY not set, /api/movies will answer 503");
            None
        }
    };

    let state = Arc::new(AppState::new(
        store.clone(),
        catalog,
        config.session_ttl(),
    ));

    let mut app = create_router(state);
    if config.cors_allow_any {
        app = with_cors(app);
    }

    let address = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, store = store.name(), "WatchLedger API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
