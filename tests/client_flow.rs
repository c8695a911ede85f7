use std::sync::Arc;

use watchledger::{
    client::{ActionOutcome, ClientSession, MutationResult},
    db::MemoryStore,
    error::{AppError, AppResult},
    models::{Movie, MovieDetails, MoviePage, RegisterRequest, ReviewRequest, TmdbId},
    routes::{create_router, AppState},
    services::{CatalogProvider, Listing},
};

struct EmptyCatalog;

#[async_trait::async_trait]
impl CatalogProvider for EmptyCatalog {
    async fn list(&self, _listing: Listing, page: u32) -> AppResult<MoviePage> {
        Ok(MoviePage::empty(page))
    }

    async fn details(&self, id: TmdbId) -> AppResult<MovieDetails> {
        Err(AppError::NotFound(format!("Movie {} not found", id)))
    }

    fn name(&self) -> &'static str {
        "empty"
    }
}

/// Starts the API on an ephemeral port and returns its `/api` base URL
async fn spawn_server() -> String {
    let state = Arc::new(AppState::new(
        Arc::new(MemoryStore::new()),
        None,
        chrono::Duration::hours(1),
    ));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    format!("http://{}/api", address)
}

fn movie(id: TmdbId, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{}.jpg", id)),
        backdrop_path: None,
        vote_average: 7.5,
        release_date: None,
        overview: None,
    }
}

async fn signed_in_session() -> ClientSession {
    let session = ClientSession::new(spawn_server().await, Arc::new(EmptyCatalog));
    session
        .register(&RegisterRequest {
            username: "cinephile".to_string(),
            email: "film@example.com".to_string(),
            password: "correct horse".to_string(),
        })
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn test_toggle_invalidates_and_refetches_library() {
    let session = signed_in_session().await;
    let blade_runner = movie(78, "Blade Runner");
    let mut tag = session.library_cache().subscribe();

    assert!(session.library_cache().library().await.unwrap().watchlist.is_empty());

    let outcome = session.toggle_watchlist(&blade_runner).await.unwrap();
    match outcome {
        ActionOutcome::Applied(MutationResult::Watchlist(list)) => assert_eq!(list.len(), 1),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(tag.has_changed().unwrap());
    tag.mark_unchanged();

    // The next read refetches and sees the server state
    let library = session.library_cache().library().await.unwrap();
    assert!(library.in_watchlist(78));

    // Second click removes because the refetched library has the movie
    session.toggle_watchlist(&blade_runner).await.unwrap();
    assert!(tag.has_changed().unwrap());
    assert!(!session.library_cache().library().await.unwrap().in_watchlist(78));
}

#[tokio::test]
async fn test_like_and_review_flow_updates_every_view() {
    let session = signed_in_session().await;
    let heat = movie(949, "Heat");

    session.toggle_like(&heat).await.unwrap();
    session
        .save_review(ReviewRequest {
            tmdb_id: Some(949),
            rating: Some(4.5),
            text: Some("Diner scene".to_string()),
            title: Some("Heat".to_string()),
        })
        .await
        .unwrap();

    let library = session.library_cache().library().await.unwrap();
    assert!(library.is_liked(949));
    assert_eq!(library.review_for(949).map(|r| r.rating), Some(4.5));

    session.toggle_watchlist(&heat).await.unwrap();
    let cards = session.library_page().await.unwrap();
    assert_eq!(cards.len(), 1);
    assert!(cards[0].is_watchlisted && cards[0].is_liked);
    assert_eq!(cards[0].movie.vote_average, 0.0);
}

#[tokio::test]
async fn test_logout_requires_login_again() {
    let session = signed_in_session().await;
    assert!(session.me().await.is_ok());

    session.logout().await.unwrap();

    assert!(!session.is_authenticated().await);
    assert_eq!(
        session.toggle_watchlist(&movie(1, "Alien")).await.unwrap(),
        ActionOutcome::LoginRequired
    );
    assert!(session.library_cache().snapshot().await.is_none());
}
