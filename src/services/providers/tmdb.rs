//! TMDB v3 catalog provider
//!
//! Endpoints:
//! 1. Listings: /trending/movie/week, /movie/popular, /movie/top_rated, /search/movie
//! 2. Details: /movie/{id}?append_to_response=credits,videos,similar
//!
//! Every request carries the `api_key` query parameter.
use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage, TmdbId},
    services::providers::{CatalogProvider, Listing},
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

pub const DEFAULT_TMDB_API_URL: &str = "https://api.themoviedb.org/3";

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Path and extra query parameters of a listing page
    fn listing_request(listing: &Listing) -> (&'static str, Option<&str>) {
        match listing {
            Listing::Trending => ("/trending/movie/week", None),
            Listing::Popular => ("/movie/popular", None),
            Listing::TopRated => ("/movie/top_rated", None),
            Listing::Search(query) => ("/search/movie", Some(query.as_str())),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {} not found", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(error = %e, path = %path, "Failed to deserialize TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn list(&self, listing: Listing, page: u32) -> AppResult<MoviePage> {
        let (path, query) = Self::listing_request(&listing);

        let mut params = vec![("page", page.max(1).to_string())];
        if let Some(query) = query {
            if query.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "Search query cannot be empty".to_string(),
                ));
            }
            params.push(("query", query.to_string()));
        }

        let movies: MoviePage = self.get_json(path, &params).await?;

        tracing::info!(
            listing = %listing,
            page = movies.page,
            results = movies.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(movies)
    }

    async fn details(&self, id: TmdbId) -> AppResult<MovieDetails> {
        let path = format!("/movie/{}", id);
        let details: MovieDetails = self
            .get_json(
                &path,
                &[("append_to_response", "credits,videos,similar".to_string())],
            )
            .await?;

        tracing::info!(tmdb_id = id, provider = "tmdb", "Movie details fetched");

        Ok(details)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
