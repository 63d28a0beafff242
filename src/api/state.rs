//! Shared application state.

use super::{
    email::Mailer, password::Passwords, store::Stores, templates::Templates, token::TokenCodec,
};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    base_url: String,
    session_ttl_seconds: i64,
}

impl AppConfig {
    #[must_use]
    pub fn new(base_url: String) -> Self {
        // Ensure the base URL does not have a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Session cookies get `Secure` when the public URL is HTTPS.
    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Absolute link placed in verification emails.
    #[must_use]
    pub fn verify_url(&self, token: &str) -> String {
        format!("{}/verify/{token}", self.base_url)
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub codec: TokenCodec,
    pub stores: Stores,
    pub mailer: Mailer,
    pub templates: Templates,
    pub passwords: Passwords,
}
