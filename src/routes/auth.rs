use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    error::AppResult,
    middleware::{AuthUser, RequestId},
    models::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
    routes::{extract::JsonBody, AppState},
};

pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    tracing::info!(request_id = %request_id, "Processing registration");

    let response = state.auth.register(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let response = state.auth.login(&request).await?;
    Ok(Json(response))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.auth.profile(user.user_id).await?;
    Ok(Json(profile))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<StatusCode> {
    state.auth.logout(&user.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
