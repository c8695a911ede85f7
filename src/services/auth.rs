use std::sync::Arc;

use argon2::password_hash::{
    rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::Argon2;
use chrono::{Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{AuthResponse, LoginRequest, RegisterRequest, Session, User, UserProfile},
    services::validation::{validate_login, validate_registration},
};

const SESSION_TOKEN_LEN: usize = 48;

/// Registration, login and bearer-token resolution
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, session_ttl: Duration) -> Self {
        Self { store, session_ttl }
    }

    pub async fn register(&self, request: &RegisterRequest) -> AppResult<AuthResponse> {
        let request = validate_registration(request)?;

        if self.store.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(request.username, request.email, password_hash);
        self.store.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, store = self.store.name(), "User registered");

        self.issue_session(&user).await
    }

    pub async fn login(&self, request: &LoginRequest) -> AppResult<AuthResponse> {
        let request = validate_login(request)?;
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.password_hash, &request.password)? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        tracing::info!(user_id = %user.id, "User logged in");

        self.issue_session(&user).await
    }

    /// Resolves a bearer token to the owning user id
    pub async fn authenticate(&self, token: &str) -> AppResult<Uuid> {
        let session = self
            .store
            .find_session(token)
            .await?
            .filter(|session| !session.is_expired())
            .ok_or_else(|| AppError::Unauthorized("Not authorized, token failed".to_string()))?;
        Ok(session.user_id)
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(|user| user.profile())
            .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".to_string()))
    }

    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.store.delete_session(token).await
    }

    async fn issue_session(&self, user: &User) -> AppResult<AuthResponse> {
        let expires_at = Utc::now()
            .checked_add_signed(self.session_ttl)
            .ok_or_else(|| AppError::Internal("session expiry out of range".to_string()))?;
        let session = Session {
            token: generate_token(SESSION_TOKEN_LEN),
            user_id: user.id,
            expires_at,
        };
        self.store.create_session(&session).await?;

        Ok(AuthResponse {
            token: session.token,
            user: user.profile(),
        })
    }
}

fn generate_token(length: usize) -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
}

fn verify_password(expected_hash: &str, candidate: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(expected_hash)
        .map_err(|err| AppError::Internal(format!("invalid stored hash: {err}")))?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(err) => Err(AppError::Internal(format!("failed to verify password: {err}"))),
    }
}
