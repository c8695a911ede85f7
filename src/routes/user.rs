//! Library endpoints. Each mutation reads the user document, applies the change
//! and returns the affected list.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{
        Library, LikeRequest, LikesResponse, ReviewRequest, ReviewsResponse, TmdbId,
        WatchlistRequest, WatchlistResponse,
    },
    routes::{
        extract::{JsonBody, PathParam},
        AppState,
    },
    services::library,
};

pub async fn get_library(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Library>> {
    let library = library::get_library(state.store.as_ref(), user.user_id).await?;
    Ok(Json(library))
}

/// Adds the movie when absent, removes it when present
pub async fn update_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<WatchlistRequest>,
) -> AppResult<Json<WatchlistResponse>> {
    let tmdb_id = request
        .tmdb_id
        .filter(|id| *id != 0)
        .ok_or_else(|| AppError::InvalidInput("Movie ID (tmdbId) is required".to_string()))?;

    let (toggle, library) = library::modify_library(state.store.as_ref(), user.user_id, |lib| {
        library::toggle_watchlist(lib, tmdb_id, request.title, request.poster_path)
    })
    .await?;

    tracing::info!(user_id = %user.user_id, tmdb_id, ?toggle, "Watchlist toggled");

    Ok(Json(library.watchlist))
}

pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    PathParam(tmdb_id): PathParam<TmdbId>,
) -> AppResult<Json<WatchlistResponse>> {
    let ((), library) = library::modify_library(state.store.as_ref(), user.user_id, |lib| {
        library::remove_from_watchlist(lib, tmdb_id);
        Ok(())
    })
    .await?;

    Ok(Json(library.watchlist))
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    PathParam(tmdb_id): PathParam<TmdbId>,
    body: Result<Json<LikeRequest>, JsonRejection>,
) -> AppResult<Json<LikesResponse>> {
    if tmdb_id == 0 {
        return Err(AppError::InvalidInput("Movie ID is required".to_string()));
    }
    // The body is optional; only a present but malformed one is rejected
    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => LikeRequest::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let (toggle, library) = library::modify_library(state.store.as_ref(), user.user_id, |lib| {
        Ok(library::toggle_like(
            lib,
            tmdb_id,
            request.title,
            request.poster_path,
        ))
    })
    .await?;

    tracing::info!(user_id = %user.user_id, tmdb_id, ?toggle, "Like toggled");

    Ok(Json(library.likes))
}

pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> AppResult<Json<ReviewsResponse>> {
    let (tmdb_id, rating) = library::review_fields(&request)?;

    let (upsert, library) = library::modify_library(state.store.as_ref(), user.user_id, |lib| {
        library::upsert_review(lib, tmdb_id, rating, request.text, request.title)
    })
    .await?;

    tracing::info!(user_id = %user.user_id, tmdb_id, ?upsert, "Review saved");

    Ok(Json(library.reviews))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    PathParam(tmdb_id): PathParam<TmdbId>,
) -> AppResult<Json<ReviewsResponse>> {
    let ((), library) = library::modify_library(state.store.as_ref(), user.user_id, |lib| {
        library::delete_review(lib, tmdb_id);
        Ok(())
    })
    .await?;

    Ok(Json(library.reviews))
}
