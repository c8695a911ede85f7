pub mod auth;
pub mod library;
pub mod providers;
pub mod validation;

pub use auth::AuthService;
pub use providers::{CachedProvider, CatalogProvider, Listing, TmdbProvider};
