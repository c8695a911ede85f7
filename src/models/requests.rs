use serde::{Deserialize, Serialize};

use super::{LibraryEntry, ReviewEntry, TmdbId, UserProfile};

// Request/Response types shared by the HTTP handlers and the client

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Body of `POST /api/user/watchlist`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistRequest {
    #[serde(default)]
    pub tmdb_id: Option<TmdbId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Body of `POST /api/user/like/:tmdbId`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Body of `POST /api/user/reviews`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub tmdb_id: Option<TmdbId>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

pub type WatchlistResponse = Vec<LibraryEntry>;
pub type LikesResponse = Vec<LibraryEntry>;
pub type ReviewsResponse = Vec<ReviewEntry>;
