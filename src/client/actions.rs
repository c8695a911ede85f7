use super::{ClientResult, LibraryMutation, MutationResult, PersonalCache};
use crate::models::{Library, Movie, TmdbId};

pub fn is_watchlisted(library: Option<&Library>, tmdb_id: TmdbId) -> bool {
    library.is_some_and(|library| library.in_watchlist(tmdb_id))
}

pub fn is_liked(library: Option<&Library>, tmdb_id: TmdbId) -> bool {
    library.is_some_and(|library| library.is_liked(tmdb_id))
}

/// Membership flags of one movie as the views render them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Membership {
    pub watchlisted: bool,
    pub liked: bool,
}

impl Membership {
    pub fn of(library: Option<&Library>, tmdb_id: TmdbId) -> Self {
        Self {
            watchlisted: is_watchlisted(library, tmdb_id),
            liked: is_liked(library, tmdb_id),
        }
    }
}

/// What a click on a card action did
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Not signed in; the UI should route to the login page
    LoginRequired,
    Applied(MutationResult),
}

/// Click handlers of a movie card.
///
/// The add-or-remove decision for the watchlist is made from the cached,
/// possibly stale, library; the server then re-checks and flips on its own.
/// A fast double click against a stale cache can therefore leave the shown
/// state out of step with the server until the next refetch.
pub struct MovieActions<'a> {
    cache: &'a PersonalCache,
    authenticated: bool,
}

impl<'a> MovieActions<'a> {
    pub fn new(cache: &'a PersonalCache, authenticated: bool) -> Self {
        Self {
            cache,
            authenticated,
        }
    }

    /// Current flags for the movie; all false when signed out
    pub async fn membership(&self, movie: &Movie) -> ClientResult<Membership> {
        if !self.authenticated {
            return Ok(Membership::default());
        }
        let library = self.cache.library().await?;
        Ok(Membership::of(Some(&library), movie.id))
    }

    pub async fn toggle_watchlist(&self, movie: &Movie) -> ClientResult<ActionOutcome> {
        if !self.authenticated {
            return Ok(ActionOutcome::LoginRequired);
        }

        let library = self.cache.library().await?;
        let mutation = if library.in_watchlist(movie.id) {
            LibraryMutation::RemoveFromWatchlist(movie.id)
        } else {
            LibraryMutation::add_to_watchlist(movie)
        };

        tracing::debug!(tmdb_id = movie.id, ?mutation, "Watchlist click");
        let result = self.cache.mutate(mutation).await?;
        Ok(ActionOutcome::Applied(result))
    }

    /// Always posts a toggle; the server decides whether this likes or unlikes
    pub async fn toggle_like(&self, movie: &Movie) -> ClientResult<ActionOutcome> {
        if !self.authenticated {
            return Ok(ActionOutcome::LoginRequired);
        }

        let result = self
            .cache
            .mutate(LibraryMutation::toggle_like(movie))
            .await?;
        Ok(ActionOutcome::Applied(result))
    }
}
