use std::sync::Arc;

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage, TmdbId},
    routes::{
        extract::{PathParam, QueryParams},
        AppState,
    },
    services::{CatalogProvider, Listing},
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: String,
    page: Option<u32>,
}

fn catalog(state: &AppState) -> AppResult<&Arc<dyn CatalogProvider>> {
    state
        .catalog
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("Movie catalog is not configured".to_string()))
}

async fn list(state: &AppState, listing: Listing, page: Option<u32>) -> AppResult<Json<MoviePage>> {
    let page = page.unwrap_or(1).max(1);
    let movies = catalog(state)?.list(listing, page).await?;
    Ok(Json(movies))
}

pub async fn trending(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    list(&state, Listing::Trending, params.page).await
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    list(&state, Listing::Popular, params.page).await
}

pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageQuery>,
) -> AppResult<Json<MoviePage>> {
    list(&state, Listing::TopRated, params.page).await
}

/// Handler for movie search; a blank query is rejected rather than listing trending
pub async fn search(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchQuery>,
) -> AppResult<Json<MoviePage>> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    list(&state, Listing::Search(query.to_string()), params.page).await
}

pub async fn details(
    State(state): State<Arc<AppState>>,
    PathParam(tmdb_id): PathParam<TmdbId>,
) -> AppResult<Json<MovieDetails>> {
    let details = catalog(&state)?.details(tmdb_id).await?;
    Ok(Json(details))
}
