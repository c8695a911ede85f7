use std::sync::Arc;

use super::{
    view, ActionOutcome, ApiClient, CatalogCache, ClientResult, LibraryMutation, MovieActions,
    MovieCard, MovieFeed, MutationResult, PersonalCache,
};
use crate::{
    models::{
        AuthResponse, Library, LoginRequest, Movie, MovieDetails, RegisterRequest, ReviewEntry,
        ReviewRequest, TmdbId, UserProfile,
    },
    services::providers::CatalogProvider,
};

/// Everything one signed-in (or anonymous) browser session holds.
///
/// The API client doubles as the backend of the personal cache, so the token
/// set by `login` is the one every library request carries.
pub struct ClientSession {
    api: Arc<ApiClient>,
    library: PersonalCache,
    catalog: CatalogCache,
}

/// The movie details page: catalog data plus the user's own state for it
#[derive(Debug, Clone)]
pub struct MovieDetailsView {
    pub details: MovieDetails,
    pub is_watchlisted: bool,
    pub is_liked: bool,
    pub review: Option<ReviewEntry>,
}

impl ClientSession {
    pub fn new(api_base_url: impl Into<String>, catalog: Arc<dyn CatalogProvider>) -> Self {
        let api = Arc::new(ApiClient::new(api_base_url));
        Self {
            library: PersonalCache::new(api.clone()),
            catalog: CatalogCache::new(catalog),
            api,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn library_cache(&self) -> &PersonalCache {
        &self.library
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub async fn is_authenticated(&self) -> bool {
        self.api.is_authenticated().await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<AuthResponse> {
        let response = self.api.register(request).await?;
        self.library.clear().await;
        tracing::info!(user_id = %response.user.id, "Registered");
        Ok(response)
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        let response = self.api.login(request).await?;
        self.library.clear().await;
        tracing::info!(user_id = %response.user.id, "Logged in");
        Ok(response)
    }

    pub async fn me(&self) -> ClientResult<UserProfile> {
        self.api.me().await
    }

    /// Signs out and drops the cached library; the catalog cache survives
    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.api.logout().await;
        self.api.set_token(None).await;
        self.library.clear().await;
        result
    }

    pub async fn actions(&self) -> MovieActions<'_> {
        MovieActions::new(&self.library, self.is_authenticated().await)
    }

    pub async fn toggle_watchlist(&self, movie: &Movie) -> ClientResult<ActionOutcome> {
        self.actions().await.toggle_watchlist(movie).await
    }

    pub async fn toggle_like(&self, movie: &Movie) -> ClientResult<ActionOutcome> {
        self.actions().await.toggle_like(movie).await
    }

    pub async fn save_review(&self, review: ReviewRequest) -> ClientResult<MutationResult> {
        self.library.mutate(LibraryMutation::UpsertReview(review)).await
    }

    pub async fn delete_review(&self, tmdb_id: TmdbId) -> ClientResult<MutationResult> {
        self.library.mutate(LibraryMutation::DeleteReview(tmdb_id)).await
    }

    /// Library for flag computation; `None` when signed out
    async fn current_library(&self) -> ClientResult<Option<Library>> {
        if !self.is_authenticated().await {
            return Ok(None);
        }
        self.library.library().await.map(Some)
    }

    /// Cards of the home grid with flags from the current library
    pub async fn home_cards(&self, feed: &MovieFeed) -> ClientResult<Vec<MovieCard>> {
        let library = self.current_library().await?;
        Ok(view::cards(feed.movies(), library.as_ref()))
    }

    /// Cards of the library page, built from watchlist snapshots
    pub async fn library_page(&self) -> ClientResult<Vec<MovieCard>> {
        let library = self.library.library().await?;
        let movies = view::watchlist_movies(&library);
        Ok(view::cards(&movies, Some(&library)))
    }

    pub async fn movie_details(&self, tmdb_id: TmdbId) -> ClientResult<MovieDetailsView> {
        let details = self.catalog.details(tmdb_id).await?;
        let library = self.current_library().await?;
        let library = library.as_ref();

        Ok(MovieDetailsView {
            is_watchlisted: super::actions::is_watchlisted(library, tmdb_id),
            is_liked: super::actions::is_liked(library, tmdb_id),
            review: library.and_then(|library| library.review_for(tmdb_id).cloned()),
            details,
        })
    }
}
