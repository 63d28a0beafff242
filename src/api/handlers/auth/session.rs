//! Cookie sessions: create on login, resolve per request, delete on logout.
//!
//! The cookie holds a random token; the store only ever sees its SHA-256.
//! Sessions reference the user by id and the row is re-read on every request,
//! so a verification that happens in another tab is visible immediately.

use anyhow::{Context, Result};
use axum::http::{header::InvalidHeaderValue, HeaderMap, HeaderValue};
use tracing::error;

use crate::api::{
    handlers::read_cookie,
    state::{AppConfig, AppState},
    store::User,
};

const SESSION_COOKIE_NAME: &str = "latchkey_session";

/// Resolve the session cookie into its user, if any.
///
/// Returns `Ok(None)` when the cookie is missing, unknown or expired, or when
/// the user row no longer exists.
///
/// # Errors
/// Returns an error if a store lookup fails.
pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Option<User>> {
    let Some(token) = read_cookie(headers, SESSION_COOKIE_NAME) else {
        return Ok(None);
    };
    let Some(user_id) = state.stores.sessions.lookup_session(&token).await? else {
        return Ok(None);
    };
    state.stores.users.find_by_id(user_id).await
}

/// Start a session for `user` and return the `Set-Cookie` value.
///
/// A session named by the request cookie is deleted first, so logging in again
/// never leaves the previous token usable.
///
/// # Errors
/// Returns an error if the session cannot be stored or encoded.
pub(crate) async fn login_user(
    state: &AppState,
    headers: &HeaderMap,
    user: &User,
) -> Result<HeaderValue> {
    if let Some(previous) = read_cookie(headers, SESSION_COOKIE_NAME) {
        state
            .stores
            .sessions
            .delete_session(&previous)
            .await
            .context("failed to replace previous session")?;
    }

    let token = state
        .stores
        .sessions
        .create_session(user.id, state.config.session_ttl_seconds())
        .await?;
    session_cookie(&state.config, &token).context("failed to encode session cookie")
}

/// End the current session, if any, and return the cookie-clearing value.
pub(crate) async fn logout_user(state: &AppState, headers: &HeaderMap) -> Option<HeaderValue> {
    if let Some(token) = read_cookie(headers, SESSION_COOKIE_NAME) {
        if let Err(err) = state.stores.sessions.delete_session(&token).await {
            error!("Failed to delete session: {err:#}");
        }
    }

    // Always clear the cookie, even if the session record was missing.
    clear_session_cookie(&state.config)
        .map_err(|err| error!("Failed to encode session cookie: {err}"))
        .ok()
}

/// Build an `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AppConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    // Only mark cookies secure when the site is served over HTTPS.
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AppConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_flags_follow_base_url() -> Result<(), InvalidHeaderValue> {
        let plain = AppConfig::new("http://localhost:8080".to_string()).with_session_ttl_seconds(60);
        assert_eq!(
            session_cookie(&plain, "tok")?,
            "latchkey_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );

        let secure = AppConfig::new("https://latchkey.dev".to_string()).with_session_ttl_seconds(60);
        let cookie = session_cookie(&secure, "tok")?;
        assert!(cookie.to_str().unwrap_or_default().ends_with("; Secure"));
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> Result<(), InvalidHeaderValue> {
        let config = AppConfig::new("http://localhost:8080".to_string());
        let cookie = clear_session_cookie(&config)?;
        assert!(cookie.to_str().unwrap_or_default().contains("Max-Age=0"));
        Ok(())
    }
}
