//! In-memory store used by handler tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    generate_session_token, hash_session_token, CreateOutcome, Network, NetworkStore, NewUser,
    SessionStore, User, UserStore,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    sessions: HashMap<Vec<u8>, (Uuid, Instant)>,
    networks: Vec<Network>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub(crate) fn with_networks(networks: Vec<Network>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                networks,
                ..Inner::default()
            }),
        }
    }

    pub(crate) async fn user_count(&self) -> usize {
        self.inner.lock().await.users.len()
    }

    pub(crate) async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<CreateOutcome> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .iter()
            .any(|existing| existing.email == user.email || existing.username == user.username)
        {
            return Ok(CreateOutcome::Conflict);
        }

        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            surname: user.surname,
            email: user.email,
            username: user.username,
            password: user.password,
            verified: false,
        };
        inner.users.push(created.clone());
        Ok(CreateOutcome::Created(created))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.verified = true;
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: Uuid, ttl_seconds: i64) -> Result<String> {
        let token = generate_session_token()?;
        let ttl = Duration::from_secs(u64::try_from(ttl_seconds).unwrap_or(0));
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        inner
            .sessions
            .insert(hash_session_token(&token), (user_id, now + ttl));
        Ok(token)
    }

    async fn lookup_session(&self, token: &str) -> Result<Option<Uuid>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(&hash_session_token(token))
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(user_id, _)| *user_id))
    }

    async fn delete_session(&self, token: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.sessions.remove(&hash_session_token(token));
        Ok(())
    }
}

#[async_trait]
impl NetworkStore for MemoryStore {
    async fn list_networks(&self) -> Result<Vec<Network>> {
        let inner = self.inner.lock().await;
        let mut networks = inner.networks.clone();
        networks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(networks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_or_username() -> Result<()> {
        let store = MemoryStore::default();
        assert!(matches!(
            store.create(new_user("ada@example.com", "ada")).await?,
            CreateOutcome::Created(_)
        ));
        assert!(matches!(
            store.create(new_user("ada@example.com", "other")).await?,
            CreateOutcome::Conflict
        ));
        assert!(matches!(
            store.create(new_user("ada@example.org", "ada")).await?,
            CreateOutcome::Conflict
        ));
        assert_eq!(store.user_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_are_ignored() -> Result<()> {
        let store = MemoryStore::default();
        let user_id = Uuid::new_v4();

        let live = store.create_session(user_id, 60).await?;
        let expired = store.create_session(user_id, 0).await?;

        assert_eq!(store.lookup_session(&live).await?, Some(user_id));
        assert_eq!(store.lookup_session(&expired).await?, None);

        store.delete_session(&live).await?;
        assert_eq!(store.lookup_session(&live).await?, None);
        assert_eq!(store.session_count().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn creating_a_session_purges_expired_ones() -> Result<()> {
        let store = MemoryStore::default();
        let user_id = Uuid::new_v4();

        store.create_session(user_id, 0).await?;
        store.create_session(user_id, 0).await?;
        assert_eq!(store.session_count().await, 1);

        let live = store.create_session(user_id, 60).await?;
        assert_eq!(store.session_count().await, 1);
        assert_eq!(store.lookup_session(&live).await?, Some(user_id));
        Ok(())
    }
}
