use std::collections::HashSet;

use super::{CatalogCache, ClientResult};
use crate::{
    models::{Movie, MoviePage},
    services::providers::Listing,
};

/// Identifies the page a fetch was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub listing: Listing,
    pub page: u32,
}

/// A growing, id-deduplicated list of catalog results for one listing.
///
/// Changing the listing (a new search term) empties the list right away, so
/// the previous results never show while the first new page is loading.
#[derive(Debug, Clone)]
pub struct MovieFeed {
    listing: Listing,
    page: u32,
    movies: Vec<Movie>,
    total_pages: Option<u32>,
    in_flight: Option<FeedRequest>,
}

impl Default for MovieFeed {
    fn default() -> Self {
        Self::new(Listing::Trending)
    }
}

impl MovieFeed {
    pub fn new(listing: Listing) -> Self {
        Self {
            listing,
            page: 1,
            movies: Vec::new(),
            total_pages: None,
            in_flight: None,
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Applies the search box value; blank input falls back to trending
    pub fn set_search(&mut self, query: Option<&str>) -> bool {
        self.set_listing(Listing::from_search(query))
    }

    /// Switches to another listing. Returns false when the key is unchanged.
    pub fn set_listing(&mut self, listing: Listing) -> bool {
        if listing == self.listing {
            return false;
        }
        tracing::debug!(from = %self.listing, to = %listing, "Feed reset");
        self.listing = listing;
        self.page = 1;
        self.movies.clear();
        self.total_pages = None;
        self.in_flight = None;
        true
    }

    /// Marks the current page as loading and returns its key
    pub fn begin_fetch(&mut self) -> FeedRequest {
        let request = FeedRequest {
            listing: self.listing.clone(),
            page: self.page,
        };
        self.in_flight = Some(request.clone());
        request
    }

    /// Merges a fetched page. Returns false when the response is stale.
    pub fn apply_page(&mut self, request: &FeedRequest, page: MoviePage) -> bool {
        if request.listing != self.listing || request.page != self.page {
            tracing::debug!(listing = %request.listing, page = request.page, "Ignoring stale page");
            return false;
        }
        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
        }
        self.total_pages = Some(page.total_pages);

        if request.page == 1 {
            self.movies = page.results;
            return true;
        }

        let mut seen: HashSet<_> = self.movies.iter().map(|movie| movie.id).collect();
        self.movies.extend(
            page.results
                .into_iter()
                .filter(|movie| seen.insert(movie.id)),
        );
        true
    }

    /// Clears the in-flight marker after a failed fetch so it can be retried
    pub fn fail(&mut self, request: &FeedRequest) {
        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// True while nothing has been shown yet for the current listing
    pub fn is_loading_first_page(&self) -> bool {
        self.page == 1 && self.movies.is_empty() && self.is_loading()
    }

    pub fn has_more(&self) -> bool {
        self.total_pages.is_some_and(|total| self.page < total)
    }

    /// Advances to the next page, e.g. when the scroll sentinel comes into view.
    ///
    /// Does nothing while a fetch is in flight or the last page has been reached.
    pub fn request_more(&mut self) -> bool {
        if self.is_loading() || !self.has_more() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Backdrop of the first movie, shown in the hero banner
    pub fn hero_backdrop(&self) -> Option<&str> {
        self.movies.first().and_then(|movie| movie.backdrop_path.as_deref())
    }
}

/// Fills a [`MovieFeed`] from the catalog cache
pub struct FeedLoader;

impl FeedLoader {
    /// Fetches the feed's current page and merges it. Returns whether it was applied.
    pub async fn load(feed: &mut MovieFeed, catalog: &CatalogCache) -> ClientResult<bool> {
        let request = feed.begin_fetch();
        match catalog.page(&request.listing, request.page).await {
            Ok(page) => Ok(feed.apply_page(&request, page)),
            Err(err) => {
                feed.fail(&request);
                Err(err)
            }
        }
    }

    /// Loads the next page when there is one
    pub async fn load_more(feed: &mut MovieFeed, catalog: &CatalogCache) -> ClientResult<bool> {
        if !feed.request_more() {
            return Ok(false);
        }
        Self::load(feed, catalog).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TmdbId;
    use crate::services::providers::MockCatalogProvider;
    use std::sync::Arc;

    fn movie(id: TmdbId) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            poster_path: None,
            backdrop_path: Some(format!("/backdrop{}.jpg", id)),
            vote_average: 7.0,
            release_date: None,
            overview: None,
        }
    }

    fn page(page: u32, ids: &[TmdbId], total_pages: u32) -> MoviePage {
        MoviePage {
            page,
            results: ids.iter().copied().map(movie).collect(),
            total_pages,
            total_results: total_pages * 20,
        }
    }

    fn ids(feed: &MovieFeed) -> Vec<TmdbId> {
        feed.movies().iter().map(|movie| movie.id).collect()
    }

    #[test]
    fn test_search_resets_to_first_page_results() {
        let mut feed = MovieFeed::default();
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(1, &[1, 2, 3], 5));
        assert!(feed.request_more());
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(2, &[4, 5], 5));
        assert_eq!(ids(&feed), vec![1, 2, 3, 4, 5]);

        assert!(feed.set_search(Some("alien")));
        assert!(feed.movies().is_empty());
        assert_eq!(feed.page(), 1);

        let request = feed.begin_fetch();
        assert!(feed.is_loading_first_page());
        feed.apply_page(&request, page(1, &[10, 11], 1));
        assert_eq!(ids(&feed), vec![10, 11]);
        assert!(!feed.has_more());
    }

    #[test]
    fn test_same_search_does_not_reset() {
        let mut feed = MovieFeed::new(Listing::Search("alien".to_string()));
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(1, &[1], 2));

        assert!(!feed.set_search(Some(" alien ")));
        assert_eq!(ids(&feed), vec![1]);
    }

    #[test]
    fn test_later_pages_drop_duplicate_ids() {
        let mut feed = MovieFeed::default();
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(1, &[1, 2, 3], 3));
        feed.request_more();
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(2, &[3, 4, 4, 1, 5], 3));

        assert_eq!(ids(&feed), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_stale_page_for_previous_search_is_ignored() {
        let mut feed = MovieFeed::default();
        let old = feed.begin_fetch();
        feed.set_search(Some("heat"));
        let current = feed.begin_fetch();

        assert!(!feed.apply_page(&old, page(1, &[1, 2], 4)));
        assert!(feed.movies().is_empty());
        assert!(feed.apply_page(&current, page(1, &[9], 1)));
        assert_eq!(ids(&feed), vec![9]);
    }

    #[test]
    fn test_request_more_waits_for_in_flight_fetch() {
        let mut feed = MovieFeed::default();
        assert!(!feed.request_more());

        let request = feed.begin_fetch();
        feed.apply_page(&request, page(1, &[1], 3));
        feed.request_more();
        let request = feed.begin_fetch();
        assert!(!feed.request_more());

        feed.fail(&request);
        assert!(!feed.is_loading());
        assert_eq!(feed.page(), 2);
    }

    #[test]
    fn test_hero_backdrop_comes_from_first_movie() {
        let mut feed = MovieFeed::default();
        assert_eq!(feed.hero_backdrop(), None);
        let request = feed.begin_fetch();
        feed.apply_page(&request, page(1, &[7, 8], 1));
        assert_eq!(feed.hero_backdrop(), Some("/backdrop7.jpg"));
    }

    #[tokio::test]
    async fn test_loader_accumulates_pages_from_catalog() {
        let mut provider = MockCatalogProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_list()
            .withf(|listing, _| *listing == Listing::Trending)
            .times(2)
            .returning(|_, n| {
                if n == 1 {
                    Ok(page(1, &[1, 2], 2))
                } else {
                    Ok(page(2, &[2, 3], 2))
                }
            });
        let catalog = CatalogCache::new(Arc::new(provider));
        let mut feed = MovieFeed::default();

        assert!(FeedLoader::load(&mut feed, &catalog).await.unwrap());
        assert!(FeedLoader::load_more(&mut feed, &catalog).await.unwrap());
        assert!(!FeedLoader::load_more(&mut feed, &catalog).await.unwrap());

        assert_eq!(ids(&feed), vec![1, 2, 3]);
    }
}
