use serde::Serialize;

use super::actions::Membership;
use crate::models::{Library, Movie};

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

pub fn poster_url(path: Option<&str>) -> Option<String> {
    path.map(|path| format!("{}{}", POSTER_BASE_URL, path))
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    path.map(|path| format!("{}{}", BACKDROP_BASE_URL, path))
}

/// What a movie card renders: catalog data plus the user's membership flags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub movie: Movie,
    pub poster_url: Option<String>,
    pub is_watchlisted: bool,
    pub is_liked: bool,
}

impl MovieCard {
    pub fn new(movie: Movie, library: Option<&Library>) -> Self {
        let membership = Membership::of(library, movie.id);
        Self {
            poster_url: poster_url(movie.poster_path.as_deref()),
            is_watchlisted: membership.watchlisted,
            is_liked: membership.liked,
            movie,
        }
    }
}

/// Builds cards for a grid; with no cached library every flag is false
pub fn cards(movies: &[Movie], library: Option<&Library>) -> Vec<MovieCard> {
    movies
        .iter()
        .cloned()
        .map(|movie| MovieCard::new(movie, library))
        .collect()
}

/// Watchlist entries as movies for the library page.
///
/// Entries only carry a title and poster snapshot, so the rating is zero.
pub fn watchlist_movies(library: &Library) -> Vec<Movie> {
    library
        .watchlist
        .iter()
        .map(|entry| Movie {
            id: entry.tmdb_id,
            title: entry.title.clone(),
            poster_path: entry.poster_path.clone(),
            backdrop_path: None,
            vote_average: 0.0,
            release_date: None,
            overview: None,
        })
        .collect()
}
