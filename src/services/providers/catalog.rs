use std::fmt::Display;

use crate::{
    error::AppResult,
    models::{MovieDetails, MoviePage, TmdbId},
};

/// A paginated catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Listing {
    Trending,
    Popular,
    TopRated,
    Search(String),
}

impl Listing {
    /// Maps an optional search box value to a listing; blank input means trending
    pub fn from_search(query: Option<&str>) -> Self {
        match query.map(str::trim) {
            Some(q) if !q.is_empty() => Listing::Search(q.to_string()),
            _ => Listing::Trending,
        }
    }

    /// Segment used in cache keys
    pub fn cache_segment(&self) -> String {
        self.to_string()
    }
}

impl Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listing::Trending => write!(f, "trending"),
            Listing::Popular => write!(f, "popular"),
            Listing::TopRated => write!(f, "top_rated"),
            Listing::Search(query) => write!(f, "search:{}", query),
        }
    }
}

/// Read-only source of movie metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches one page (1-based) of a listing
    async fn list(&self, listing: Listing, page: u32) -> AppResult<MoviePage>;

    /// Fetches full details, credits, videos and similar movies
    async fn details(&self, id: TmdbId) -> AppResult<MovieDetails>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_search_means_trending() {
        assert_eq!(Listing::from_search(None), Listing::Trending);
        assert_eq!(Listing::from_search(Some("   ")), Listing::Trending);
        assert_eq!(
            Listing::from_search(Some(" dune ")),
            Listing::Search("dune".to_string())
        );
    }

    #[test]
    fn test_cache_segments() {
        assert_eq!(Listing::TopRated.cache_segment(), "top_rated");
        assert_eq!(
            Listing::Search("Blade Runner".to_string()).cache_segment(),
            "search:Blade Runner"
        );
    }
}
