//! Client-side state synchronization.
//!
//! Two independent caches back every view: the read-only [`CatalogCache`] of
//! TMDB pages and the read-write [`PersonalCache`] of the signed-in user's
//! library. Library mutations never patch the cache; they invalidate the
//! library tag so every view refetches and recomputes its membership flags.

pub mod actions;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod feed;
pub mod session;
pub mod view;

pub use actions::{ActionOutcome, MovieActions};
pub use api::{ApiClient, LibraryBackend, LibraryMutation, MutationResult};
pub use cache::PersonalCache;
pub use catalog::CatalogCache;
pub use feed::{FeedLoader, FeedRequest, MovieFeed};
pub use session::{ClientSession, MovieDetailsView};
pub use view::MovieCard;

use crate::{error::AppError, services::validation::ValidationError};

/// Errors surfaced to the client UI
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] AppError),
}

impl ClientError {
    /// The text shown in the error toast
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(message) | ClientError::Api { message, .. } => message.clone(),
            ClientError::Unauthorized(_) => "Please log in to continue".to_string(),
            ClientError::Http(_) => "Server Error".to_string(),
            ClientError::Catalog(_) => {
                "Error loading movies. Please check your API Key or connection.".to_string()
            }
        }
    }
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Validation(err.0)
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
