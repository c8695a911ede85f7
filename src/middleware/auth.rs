use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, routes::AppState};

/// The authenticated caller, inserted into request extensions by [`require_user`]
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: String,
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware guarding the `/api/user` routes and `/api/auth/me`.
///
/// Rejects the request with 401 before any handler runs when the bearer token
/// is missing, unknown or expired.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".to_string()))?;

    let user_id = state.auth.authenticate(&token).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        e
    })?;

    request
        .extensions_mut()
        .insert(AuthUser { user_id, token });

    Ok(next.run(request).await)
}
