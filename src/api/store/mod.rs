//! Persistence seams for users, sessions and networks.
//!
//! Handlers only talk to the traits below. `PgStore` backs all three in
//! production; tests use an in-memory implementation with the same uniqueness
//! rules.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::PgStore;

/// A registered account. `password` holds an Argon2 PHC string.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub verified: bool,
}

/// Fields required to create a user; new users always start unverified.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Network {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

/// Outcome when attempting to create a user.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(User),
    /// Email or username already taken; nothing was written.
    Conflict,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<CreateOutcome>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Set `verified`; repeating it is a no-op.
    async fn mark_verified(&self, id: Uuid) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

/// Sessions are keyed by the SHA-256 of the raw cookie token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session and return the raw token for the cookie. Expired
    /// sessions are purged on the way.
    async fn create_session(&self, user_id: Uuid, ttl_seconds: i64) -> Result<String>;

    /// Resolve a raw token into a user id, ignoring expired sessions.
    async fn lookup_session(&self, token: &str) -> Result<Option<Uuid>>;

    async fn delete_session(&self, token: &str) -> Result<()>;
}

#[async_trait]
pub trait NetworkStore: Send + Sync {
    async fn list_networks(&self) -> Result<Vec<Network>>;
}

/// The three store handles shared by every request.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub networks: Arc<dyn NetworkStore>,
}

/// Create a new session token for the auth cookie.
/// The raw value is only returned to set the cookie; the database stores a hash.
pub(crate) fn generate_session_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a session token so raw values never touch the database.
pub(crate) fn hash_session_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

impl Stores {
    /// Share one backend that implements every store trait.
    pub fn from_backend<T>(backend: T) -> Self
    where
        T: UserStore + SessionStore + NetworkStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: backend.clone(),
            sessions: backend.clone(),
            networks: backend,
        }
    }
}
