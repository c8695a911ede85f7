use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TmdbId;

/// A denormalized movie snapshot held in the watchlist or likes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub tmdb_id: TmdbId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl LibraryEntry {
    pub fn new(tmdb_id: TmdbId, title: String, poster_path: Option<String>) -> Self {
        Self {
            tmdb_id,
            title,
            poster_path,
            added_at: Utc::now(),
        }
    }
}

/// A user's rating and optional text for one movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub tmdb_id: TmdbId,
    /// Title snapshot taken when the review was first written
    #[serde(default)]
    pub title: Option<String>,
    pub rating: f64,
    #[serde(default)]
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The union of a user's watchlist, likes and reviews.
///
/// The three lists are independent; membership is always decided by a linear
/// scan for `tmdb_id` equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Library {
    #[serde(default)]
    pub watchlist: Vec<LibraryEntry>,
    #[serde(default)]
    pub likes: Vec<LibraryEntry>,
    #[serde(default)]
    pub reviews: Vec<ReviewEntry>,
}

impl Library {
    pub fn in_watchlist(&self, tmdb_id: TmdbId) -> bool {
        self.watchlist.iter().any(|entry| entry.tmdb_id == tmdb_id)
    }

    pub fn is_liked(&self, tmdb_id: TmdbId) -> bool {
        self.likes.iter().any(|entry| entry.tmdb_id == tmdb_id)
    }

    pub fn review_for(&self, tmdb_id: TmdbId) -> Option<&ReviewEntry> {
        self.reviews.iter().find(|review| review.tmdb_id == tmdb_id)
    }
}
