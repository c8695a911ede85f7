use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{Library, LibraryEntry, ReviewEntry, ReviewRequest, TmdbId},
    services::validation::{validate_rating, validate_review_text},
};

/// Title stored for likes that arrive without one
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Outcome of a toggle on the watchlist or likes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Outcome of a review upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewUpsert {
    Created,
    Updated,
}

fn position(entries: &[LibraryEntry], tmdb_id: TmdbId) -> Option<usize> {
    entries.iter().position(|entry| entry.tmdb_id == tmdb_id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Flips watchlist membership. Adding requires a title snapshot.
pub fn toggle_watchlist(
    library: &mut Library,
    tmdb_id: TmdbId,
    title: Option<String>,
    poster_path: Option<String>,
) -> AppResult<Toggle> {
    if let Some(index) = position(&library.watchlist, tmdb_id) {
        library.watchlist.remove(index);
        return Ok(Toggle::Removed);
    }

    let title = non_empty(title).ok_or_else(|| {
        AppError::InvalidInput("Title is required for adding to watchlist".to_string())
    })?;
    library
        .watchlist
        .push(LibraryEntry::new(tmdb_id, title, poster_path));
    Ok(Toggle::Added)
}

/// Removes every watchlist entry for the movie; absent ids are a no-op
pub fn remove_from_watchlist(library: &mut Library, tmdb_id: TmdbId) {
    library.watchlist.retain(|entry| entry.tmdb_id != tmdb_id);
}

/// Flips like membership, falling back to [`UNKNOWN_TITLE`] when none is given
pub fn toggle_like(
    library: &mut Library,
    tmdb_id: TmdbId,
    title: Option<String>,
    poster_path: Option<String>,
) -> Toggle {
    if let Some(index) = position(&library.likes, tmdb_id) {
        library.likes.remove(index);
        return Toggle::Removed;
    }

    let title = non_empty(title).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    library
        .likes
        .push(LibraryEntry::new(tmdb_id, title, poster_path));
    Toggle::Added
}

/// Inserts a review or updates the existing one for the same movie in place.
///
/// An update replaces the rating, replaces the text only when a non-empty text
/// is given, and keeps the original title snapshot and creation time.
pub fn upsert_review(
    library: &mut Library,
    tmdb_id: TmdbId,
    rating: f64,
    text: Option<String>,
    title: Option<String>,
) -> AppResult<ReviewUpsert> {
    let rating = validate_rating(rating)?;
    validate_review_text(text.as_deref())?;
    let text = non_empty(text);

    if let Some(review) = library
        .reviews
        .iter_mut()
        .find(|review| review.tmdb_id == tmdb_id)
    {
        review.rating = rating;
        if text.is_some() {
            review.text = text;
        }
        return Ok(ReviewUpsert::Updated);
    }

    library.reviews.push(ReviewEntry {
        tmdb_id,
        title: non_empty(title),
        rating,
        text,
        created_at: Utc::now(),
    });
    Ok(ReviewUpsert::Created)
}

pub fn delete_review(library: &mut Library, tmdb_id: TmdbId) {
    library.reviews.retain(|review| review.tmdb_id != tmdb_id);
}

/// Extracts the required review fields from a request body
pub fn review_fields(request: &ReviewRequest) -> AppResult<(TmdbId, f64)> {
    match (request.tmdb_id, request.rating) {
        (Some(tmdb_id), Some(rating)) if tmdb_id != 0 && rating != 0.0 => Ok((tmdb_id, rating)),
        _ => Err(AppError::InvalidInput(
            "Movie ID and Rating are required".to_string(),
        )),
    }
}

/// Loads the user's library
pub async fn get_library(store: &dyn UserStore, user_id: Uuid) -> AppResult<Library> {
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(user.library)
}

/// Reads the user document, applies `apply` to its library and writes it back.
///
/// There is no concurrency token: two concurrent calls for the same user both
/// read the same document and the last write wins.
pub async fn modify_library<T>(
    store: &dyn UserStore,
    user_id: Uuid,
    apply: impl FnOnce(&mut Library) -> AppResult<T>,
) -> AppResult<(T, Library)> {
    let mut user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let outcome = apply(&mut user.library)?;
    user.updated_at = Utc::now();
    store.save_user(&user).await?;

    Ok((outcome, user.library))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::User;

    #[test]
    fn test_watchlist_add_then_remove_restores_prior_state() {
        let mut library = Library::default();
        toggle_watchlist(&mut library, 1, Some("Alien".to_string()), None).unwrap();
        let before = library.watchlist.clone();

        let added = toggle_watchlist(&mut library, 2, Some("Aliens".to_string()), None).unwrap();
        assert_eq!(added, Toggle::Added);
        assert_eq!(library.watchlist.len(), 2);

        remove_from_watchlist(&mut library, 2);
        assert_eq!(library.watchlist, before);
    }

    #[test]
    fn test_watchlist_toggle_removes_existing_entry() {
        let mut library = Library::default();
        toggle_watchlist(&mut library, 7, Some("Se7en".to_string()), None).unwrap();

        let outcome = toggle_watchlist(&mut library, 7, None, None).unwrap();
        assert_eq!(outcome, Toggle::Removed);
        assert!(library.watchlist.is_empty());
    }

    #[test]
    fn test_watchlist_add_requires_title() {
        let mut library = Library::default();
        let err = toggle_watchlist(&mut library, 7, Some("  ".to_string()), None).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(library.watchlist.is_empty());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut library = Library::default();
        toggle_watchlist(&mut library, 1, Some("Alien".to_string()), None).unwrap();
        remove_from_watchlist(&mut library, 99);
        assert_eq!(library.watchlist.len(), 1);
    }

    #[test]
    fn test_like_toggled_twice_restores_likes() {
        let mut library = Library::default();
        toggle_like(&mut library, 10, Some("Heat".to_string()), None);
        let before = library.likes.clone();

        assert_eq!(toggle_like(&mut library, 11, None, None), Toggle::Added);
        assert_eq!(library.likes[1].title, UNKNOWN_TITLE);
        assert_eq!(toggle_like(&mut library, 11, None, None), Toggle::Removed);
        assert_eq!(library.likes, before);
    }

    #[test]
    fn test_review_upsert_updates_in_place() {
        let mut library = Library::default();
        let created = upsert_review(
            &mut library,
            603,
            4.0,
            Some("Great".to_string()),
            Some("The Matrix".to_string()),
        )
        .unwrap();
        assert_eq!(created, ReviewUpsert::Created);
        let created_at = library.reviews[0].created_at;

        let updated = upsert_review(
            &mut library,
            603,
            4.5,
            Some("Even better".to_string()),
            Some("Renamed".to_string()),
        )
        .unwrap();
        assert_eq!(updated, ReviewUpsert::Updated);
        assert_eq!(library.reviews.len(), 1);
        assert_eq!(library.reviews[0].rating, 4.5);
        assert_eq!(library.reviews[0].text.as_deref(), Some("Even better"));
        assert_eq!(library.reviews[0].title.as_deref(), Some("The Matrix"));
        assert_eq!(library.reviews[0].created_at, created_at);
    }

    #[test]
    fn test_review_update_without_text_keeps_old_text() {
        let mut library = Library::default();
        upsert_review(&mut library, 603, 4.0, Some("Great".to_string()), None).unwrap();
        upsert_review(&mut library, 603, 3.0, None, None).unwrap();

        assert_eq!(library.reviews[0].rating, 3.0);
        assert_eq!(library.reviews[0].text.as_deref(), Some("Great"));
    }

    #[test]
    fn test_review_rejects_out_of_range_rating() {
        let mut library = Library::default();
        assert!(upsert_review(&mut library, 603, 6.0, None, None).is_err());
        assert!(library.reviews.is_empty());
    }

    #[test]
    fn test_review_fields_required() {
        let missing = ReviewRequest {
            tmdb_id: Some(603),
            ..Default::default()
        };
        assert!(review_fields(&missing).is_err());

        let complete = ReviewRequest {
            tmdb_id: Some(603),
            rating: Some(3.5),
            ..Default::default()
        };
        assert_eq!(review_fields(&complete).unwrap(), (603, 3.5));
    }

    #[test]
    fn test_delete_review() {
        let mut library = Library::default();
        upsert_review(&mut library, 1, 2.0, None, None).unwrap();
        upsert_review(&mut library, 2, 3.0, None, None).unwrap();
        delete_review(&mut library, 1);
        assert_eq!(library.reviews.len(), 1);
        assert_eq!(library.reviews[0].tmdb_id, 2);
    }

    #[tokio::test]
    async fn test_modify_library_persists_changes() {
        let store = MemoryStore::new();
        let user = User::new("viewer".to_string(), "v@example.com".to_string(), "hash".to_string());
        store.insert_user(&user).await.unwrap();

        let (outcome, library) = modify_library(&store, user.id, |library| {
            toggle_watchlist(library, 42, Some("Hitchhiker".to_string()), None)
        })
        .await
        .unwrap();

        assert_eq!(outcome, Toggle::Added);
        assert_eq!(library.watchlist.len(), 1);
        assert_eq!(get_library(&store, user.id).await.unwrap(), library);
    }

    #[tokio::test]
    async fn test_failed_modification_is_not_saved() {
        let store = MemoryStore::new();
        let user = User::new("viewer".to_string(), "v@example.com".to_string(), "hash".to_string());
        store.insert_user(&user).await.unwrap();

        let result = modify_library(&store, user.id, |library| {
            toggle_watchlist(library, 42, None, None)
        })
        .await;

        assert!(result.is_err());
        assert!(get_library(&store, user.id).await.unwrap().watchlist.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = get_library(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
