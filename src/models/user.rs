use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Library;

/// A registered account and the library it owns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string; never leaves the server
    pub password_hash: String,
    #[serde(default)]
    pub library: Library,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            library: Library::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// A login session keyed by its bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_profile_omits_password_hash() {
        let user = User::new(
            "cinephile".to_string(),
            "film@example.com".to_string(),
            "$argon2id$v=19$...".to_string(),
        );
        let value = serde_json::to_value(user.profile()).unwrap();

        assert_eq!(value["username"], "cinephile");
        assert!(value.get("password_hash").is_none());
    }

    #[test]
    fn test_session_expiry() {
        let live = Session {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::hours(1),
        };
        let dead = Session {
            expires_at: Utc::now() - Duration::seconds(1),
            ..live.clone()
        };

        assert!(!live.is_expired());
        assert!(dead.is_expired());
    }
}
