use std::{fmt::Display, sync::LazyLock};

use chrono::Utc;
use redis::{AsyncCommands, Client, Script};
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{Session, User},
};

/// Keys of the user documents and their indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKey {
    User(Uuid),
    EmailIndex(String),
    UsernameIndex(String),
    Session(String),
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::User(id) => write!(f, "user:{}", id),
            StoreKey::EmailIndex(email) => write!(f, "user:email:{}", email),
            StoreKey::UsernameIndex(username) => write!(f, "user:name:{}", username),
            StoreKey::Session(token) => write!(f, "session:{}", token),
        }
    }
}

/// Claims both unique indices and writes the document in one step.
///
/// KEYS: email index, username index, user document. ARGV: user id, document JSON.
/// Returns 0 without writing anything when either index is taken.
static INSERT_USER: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 1 or redis.call('EXISTS', KEYS[2]) == 1 then
            return 0
        end
        redis.call('SET', KEYS[1], ARGV[1])
        redis.call('SET', KEYS[2], ARGV[1])
        redis.call('SET', KEYS[3], ARGV[2])
        return 1
        ",
    )
});

/// User documents stored as JSON strings in Redis.
///
/// Uniqueness of emails and usernames is claimed atomically with the document
/// write, so a rejected or failed insert never leaves index keys behind.
/// Sessions expire through the key TTL.
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
}

impl RedisStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        Ok(self.redis_client.get_multiplexed_async_connection().await?)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &StoreKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;
        raw.map(|json| serde_json::from_str(&json).map_err(AppError::from))
            .transpose()
    }
}

#[async_trait::async_trait]
impl UserStore for RedisStore {
    async fn insert_user(&self, user: &User) -> AppResult<()> {
        let json = serde_json::to_string(user)?;
        let mut conn = self.connection().await?;

        let inserted: i32 = INSERT_USER
            .key(StoreKey::EmailIndex(user.email.clone()).to_string())
            .key(StoreKey::UsernameIndex(user.username.clone()).to_string())
            .key(StoreKey::User(user.id).to_string())
            .arg(user.id.to_string())
            .arg(json)
            .invoke_async(&mut conn)
            .await?;

        if inserted == 0 {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        tracing::debug!(user_id = %user.id, "Inserted user document");
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        self.get_json(&StoreKey::User(id)).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = self.connection().await?;
        let id: Option<String> = conn
            .get(StoreKey::EmailIndex(email.to_string()).to_string())
            .await?;

        match id.and_then(|id| Uuid::parse_str(&id).ok()) {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let key = StoreKey::User(user.id).to_string();
        let json = serde_json::to_string(user)?;

        // SET XX: only overwrite an existing document
        let written: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("XX")
            .query_async(&mut conn)
            .await?;

        match written {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }

    async fn create_session(&self, session: &Session) -> AppResult<()> {
        let ttl = (session.expires_at - Utc::now()).num_seconds().max(1) as u64;
        let json = serde_json::to_string(session)?;

        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(StoreKey::Session(session.token.clone()).to_string(), json, ttl)
            .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AppResult<Option<Session>> {
        let session: Option<Session> = self
            .get_json(&StoreKey::Session(token.to_string()))
            .await?;
        Ok(session.filter(|session| !session.is_expired()))
    }

    async fn delete_session(&self, token: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .del(StoreKey::Session(token.to_string()).to_string())
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_store_key_display() {
        let id = Uuid::nil();
        assert_eq!(
            StoreKey::User(id).to_string(),
            "user:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            StoreKey::EmailIndex("a@b.co".to_string()).to_string(),
            "user:email:a@b.co"
        );
        assert_eq!(
            StoreKey::UsernameIndex("alice".to_string()).to_string(),
            "user:name:alice"
        );
        assert_eq!(StoreKey::Session("tok".to_string()).to_string(), "session:tok");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_user_round_trip_and_conflict() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let store = RedisStore::new(Client::open(redis_url).unwrap());

        let suffix = Uuid::new_v4().simple().to_string();
        let user = User::new(
            format!("u{}", &suffix[..8]),
            format!("{}@example.com", suffix),
            "hash".to_string(),
        );
        store.insert_user(&user).await.unwrap();

        let found = store.find_by_email(&user.email).await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let duplicate = store.insert_user(&user).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let session = Session {
            token: suffix.clone(),
            user_id: user.id,
            expires_at: Utc::now() + Duration::minutes(5),
        };
        store.create_session(&session).await.unwrap();
        assert_eq!(store.find_session(&suffix).await.unwrap(), Some(session));
        store.delete_session(&suffix).await.unwrap();
        assert_eq!(store.find_session(&suffix).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_rejected_insert_leaves_no_index_behind() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let store = RedisStore::new(Client::open(redis_url).unwrap());

        let suffix = Uuid::new_v4().simple().to_string();
        let taken_name = format!("n{}", &suffix[..8]);
        let first = User::new(
            taken_name.clone(),
            format!("first-{}@example.com", suffix),
            "hash".to_string(),
        );
        store.insert_user(&first).await.unwrap();

        // Username clash: the new email must not stay claimed
        let clash = User::new(
            taken_name,
            format!("second-{}@example.com", suffix),
            "hash".to_string(),
        );
        let err = store.insert_user(&clash).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.find_by_email(&clash.email).await.unwrap(), None);
        assert_eq!(store.find_by_id(clash.id).await.unwrap(), None);

        let retry = User::new(
            format!("r{}", &suffix[..8]),
            clash.email.clone(),
            "hash".to_string(),
        );
        store.insert_user(&retry).await.unwrap();
        assert_eq!(
            store.find_by_email(&retry.email).await.unwrap().map(|u| u.id),
            Some(retry.id)
        );
    }
}
