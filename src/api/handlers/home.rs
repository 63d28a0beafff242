//! Landing pages and the not-found fallback.

use axum::{extract::Extension, http::StatusCode, response::Response};
use std::sync::Arc;
use tera::Context;

use super::{
    auth::{MaybeUser, VerifiedUser},
    flash::Flashes,
    internal_error, render, render_with_status,
};
use crate::api::state::AppState;

/// Network listing for verified users.
pub async fn home(
    VerifiedUser(user): VerifiedUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    let networks = match state.stores.networks.list_networks().await {
        Ok(networks) => networks,
        Err(err) => return internal_error(&err),
    };

    let mut context = Context::new();
    context.insert("networks", &networks);
    render(&state, "home.html", context, &flashes, Some(&user))
}

pub async fn welcome(
    MaybeUser(user): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    render(&state, "welcome.html", Context::new(), &flashes, user.as_ref())
}

pub async fn not_found(
    MaybeUser(user): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    render_with_status(
        &state,
        StatusCode::NOT_FOUND,
        "not_found.html",
        Context::new(),
        &flashes,
        user.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::TestApp;
    use anyhow::Result;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn unknown_paths_render_not_found() -> Result<()> {
        let app = TestApp::new()?;
        let response = app.client().get("/no/such/page").await?;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(response.body.contains("Not Found"));
        Ok(())
    }

    #[tokio::test]
    async fn home_without_networks_says_so() -> Result<()> {
        let app = TestApp::new()?;
        let mut client = app.client();
        client
            .post_form(
                "/register",
                &[
                    ("name", "Ada"),
                    ("surname", "Lovelace"),
                    ("email", "ada@example.com"),
                    ("password", "analytical"),
                    ("confirm", "analytical"),
                ],
            )
            .await?;
        let token = app.state.codec.issue("ada@example.com")?;
        client.get(&format!("/verify/{token}")).await?;

        let response = client.get("/").await?;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("No networks yet."));
        Ok(())
    }
}
