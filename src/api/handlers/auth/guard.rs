//! Access guards for authenticated and verified pages.
//!
//! Flow Overview: `require_auth` resolves the session cookie to a user or
//! redirects to the login page; `require_verified` runs on that user and
//! redirects unverified accounts to `/unverified`. The extractors below always
//! run them in that order.

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Uri},
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use super::{session::authenticate, utils::login_redirect_url};
use crate::api::{
    handlers::{
        flash::{Category, Flashes},
        internal_error, redirect,
    },
    state::AppState,
    store::User,
};

pub(crate) const LOGIN_REQUIRED: &str = "Please log in to access this page.";
pub(crate) const VERIFY_REQUIRED: &str = "Please verify your account!";

/// Resolve the principal or end the request with a redirect to `/login`.
///
/// # Errors
/// Returns the response to send instead: a login redirect for anonymous
/// requests or a 500 when the session store fails.
pub async fn require_auth(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<User, Response> {
    match authenticate(state, headers).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            let target = uri
                .path_and_query()
                .map_or_else(|| uri.path(), |path_and_query| path_and_query.as_str());
            let flashes = Flashes::from_headers(headers).with(Category::Message, LOGIN_REQUIRED);
            Err(redirect(&login_redirect_url(target), &flashes))
        }
        Err(err) => Err(internal_error(&err)),
    }
}

/// Let verified principals through; send everyone else to `/unverified`.
///
/// # Errors
/// Returns the redirect response for unverified users.
pub fn require_verified(user: User, headers: &HeaderMap) -> Result<User, Response> {
    if user.verified {
        Ok(user)
    } else {
        let flashes = Flashes::from_headers(headers).with(Category::Warning, VERIFY_REQUIRED);
        Err(redirect("/unverified", &flashes))
    }
}

fn app_state(parts: &Parts) -> Result<Arc<AppState>, Response> {
    parts
        .extensions
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| internal_error(&anyhow!("application state extension missing")))
}

/// Authenticated principal.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Authenticated principal whose email is verified.
#[derive(Clone, Debug)]
pub struct VerifiedUser(pub User);

/// Principal if logged in; pages open to everyone use it for the nav bar.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        require_auth(&state, &parts.headers, &parts.uri)
            .await
            .map(Self)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        let user = require_auth(&state, &parts.headers, &parts.uri).await?;
        require_verified(user, &parts.headers).map(Self)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let state = app_state(parts)?;
        match authenticate(&state, &parts.headers).await {
            Ok(user) => Ok(Self(user)),
            Err(err) => {
                error!("Failed to resolve session: {err:#}");
                Ok(Self(None))
            }
        }
    }
}
