use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Session, User},
};

/// Persistence for user documents and login sessions
///
/// A user document carries its whole library; callers read the document,
/// modify it and save it back. Stores do not provide transactions.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user, failing with `Conflict` when the email or username is taken
    async fn insert_user(&self, user: &User) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Looks a user up by their (already lowercased) email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Overwrites an existing user document
    async fn save_user(&self, user: &User) -> AppResult<()>;

    async fn create_session(&self, session: &Session) -> AppResult<()>;

    async fn find_session(&self, token: &str) -> AppResult<Option<Session>>;

    async fn delete_session(&self, token: &str) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
