use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::{
    error::{AppError, AppResult},
    models::{Session, User},
};

/// In-process store used when no Redis URL is configured, and in tests
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>,
    usernames: HashMap<String, Uuid>,
    sessions: HashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;

        if inner.emails.contains_key(&user.email) || inner.usernames.contains_key(&user.username)
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        inner.emails.insert(user.email.clone(), user.id);
        inner.usernames.insert(user.username.clone(), user.id);
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn create_session(&self, session: &Session) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AppResult<Option<Session>> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get(token).cloned() {
            Some(session) if session.is_expired() => {
                inner.sessions.remove(token);
                Ok(None)
            }
            session => Ok(session),
        }
    }

    async fn delete_session(&self, token: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.sessions.remove(token);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
