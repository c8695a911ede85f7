use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{ClientError, ClientResult};
use crate::{
    models::{
        AuthResponse, Library, LibraryEntry, LikeRequest, LoginRequest, Movie, RegisterRequest,
        ReviewEntry, ReviewRequest, TmdbId, UserProfile, WatchlistRequest,
    },
    services::validation::{
        validate_login, validate_rating, validate_registration, validate_review_text,
    },
};

/// A change to the personal library, issued through the server
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryMutation {
    AddToWatchlist {
        tmdb_id: TmdbId,
        title: String,
        poster_path: Option<String>,
    },
    RemoveFromWatchlist(TmdbId),
    ToggleLike {
        tmdb_id: TmdbId,
        title: String,
        poster_path: Option<String>,
    },
    UpsertReview(ReviewRequest),
    DeleteReview(TmdbId),
}

impl LibraryMutation {
    pub fn add_to_watchlist(movie: &Movie) -> Self {
        LibraryMutation::AddToWatchlist {
            tmdb_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
        }
    }

    pub fn toggle_like(movie: &Movie) -> Self {
        LibraryMutation::ToggleLike {
            tmdb_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
        }
    }
}

/// The list the server returns after a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum MutationResult {
    Watchlist(Vec<LibraryEntry>),
    Likes(Vec<LibraryEntry>),
    Reviews(Vec<ReviewEntry>),
}

/// Server-side library operations as seen by the client cache
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LibraryBackend: Send + Sync {
    async fn fetch_library(&self) -> ClientResult<Library>;

    async fn apply(&self, mutation: LibraryMutation) -> ClientResult<MutationResult>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for the WatchLedger REST API.
///
/// Holds the bearer token of the signed-in user; requests to `/api/user/*`
/// fail with [`ClientError::Unauthorized`] when there is none.
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        let request = validate_registration(request)?;
        let response: AuthResponse = self
            .send(self.request(Method::POST, "/auth/register").json(&request))
            .await?;
        self.set_token(Some(response.token.clone())).await;
        Ok(response)
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        let request = validate_login(request)?;
        let response: AuthResponse = self
            .send(self.request(Method::POST, "/auth/login").json(&request))
            .await?;
        self.set_token(Some(response.token.clone())).await;
        Ok(response)
    }

    pub async fn me(&self) -> ClientResult<UserProfile> {
        let request = self.authorized(Method::GET, "/auth/me").await?;
        self.send(request).await
    }

    /// Revokes the session server-side and forgets the token
    pub async fn logout(&self) -> ClientResult<()> {
        if self.is_authenticated().await {
            let request = self.authorized(Method::POST, "/auth/logout").await?;
            let response = request.send().await?;
            Self::check_status(response).await?;
        }
        self.set_token(None).await;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn authorized(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self
            .token()
            .await
            .ok_or_else(|| ClientError::Unauthorized("Not authorized, no token".to_string()))?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Maps non-2xx responses to errors, passing the server's message through
    async fn check_status(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| "Server Error".to_string());

        tracing::warn!(status = status.as_u16(), message = %message, "API request failed");

        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let mut request = self.authorized(method, path).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }
}

#[async_trait::async_trait]
impl LibraryBackend for ApiClient {
    async fn fetch_library(&self) -> ClientResult<Library> {
        self.send_json::<(), _>(Method::GET, "/user/library", None)
            .await
    }

    async fn apply(&self, mutation: LibraryMutation) -> ClientResult<MutationResult> {
        match mutation {
            LibraryMutation::AddToWatchlist {
                tmdb_id,
                title,
                poster_path,
            } => {
                let body = WatchlistRequest {
                    tmdb_id: Some(tmdb_id),
                    title: Some(title),
                    poster_path,
                };
                let watchlist: Vec<LibraryEntry> = self
                    .send_json(Method::POST, "/user/watchlist", Some(&body))
                    .await?;
                Ok(MutationResult::Watchlist(watchlist))
            }
            LibraryMutation::RemoveFromWatchlist(tmdb_id) => {
                let path = format!("/user/watchlist/{}", tmdb_id);
                let watchlist: Vec<LibraryEntry> = self
                    .send_json::<(), _>(Method::DELETE, &path, None)
                    .await?;
                Ok(MutationResult::Watchlist(watchlist))
            }
            LibraryMutation::ToggleLike {
                tmdb_id,
                title,
                poster_path,
            } => {
                let path = format!("/user/like/{}", tmdb_id);
                let body = LikeRequest {
                    title: Some(title),
                    poster_path,
                };
                let likes: Vec<LibraryEntry> = self.send_json(Method::POST, &path, Some(&body)).await?;
                Ok(MutationResult::Likes(likes))
            }
            LibraryMutation::UpsertReview(review) => {
                if let Some(rating) = review.rating {
                    validate_rating(rating)?;
                }
                validate_review_text(review.text.as_deref())?;
                let reviews: Vec<ReviewEntry> = self
                    .send_json(Method::POST, "/user/reviews", Some(&review))
                    .await?;
                Ok(MutationResult::Reviews(reviews))
            }
            LibraryMutation::DeleteReview(tmdb_id) => {
                let path = format!("/user/reviews/{}", tmdb_id);
                let reviews: Vec<ReviewEntry> = self
                    .send_json::<(), _>(Method::DELETE, &path, None)
                    .await?;
                Ok(MutationResult::Reviews(reviews))
            }
        }
    }
}
