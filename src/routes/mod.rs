use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::UserStore,
    middleware::{make_span_with_request_id, request_id_middleware, require_user},
    services::{AuthService, CatalogProvider},
};

pub mod auth;
pub mod extract;
pub mod movies;
pub mod user;

/// Shared state handed to every handler
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub auth: AuthService,
    /// Catalog proxy; `None` when no TMDB key is configured
    pub catalog: Option<Arc<dyn CatalogProvider>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        catalog: Option<Arc<dyn CatalogProvider>>,
        session_ttl: chrono::Duration,
    ) -> Self {
        Self {
            auth: AuthService::new(store.clone(), session_ttl),
            store,
            catalog,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/user", user_routes(state.clone()))
        .nest("/api/movies", movie_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Adds a permissive CORS layer for browser clients on other origins
pub fn with_cors(router: Router) -> Router {
    router.layer(CorsLayer::permissive())
}

/// Routes under /api/auth
fn auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let guard = middleware::from_fn_with_state(state, require_user);

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me).route_layer(guard.clone()))
        .route("/logout", post(auth::logout).route_layer(guard))
}

/// Routes under /api/user, all behind the bearer-token guard
fn user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/library", get(user::get_library))
        .route("/watchlist", post(user::update_watchlist))
        .route("/watchlist/:tmdb_id", delete(user::remove_from_watchlist))
        .route("/like/:tmdb_id", post(user::toggle_like))
        .route("/reviews", post(user::update_review))
        .route("/reviews/:tmdb_id", delete(user::delete_review))
        .route_layer(middleware::from_fn_with_state(state, require_user))
}

/// Public catalog proxy under /api/movies
fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trending", get(movies::trending))
        .route("/popular", get(movies::popular))
        .route("/top_rated", get(movies::top_rated))
        .route("/search", get(movies::search))
        .route("/:tmdb_id", get(movies::details))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to WatchLedger API" }))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
