//! Email verification: mint and send links, redeem them, and the waiting page.
//!
//! Flow Overview:
//! 1) Registration and `/resend` mint a token for the principal's email and
//!    mail the absolute `/verify/{token}` link.
//! 2) `/verify/{token}` checks the signature and age. Any failure, including a
//!    token for an address with no account, gets the same notice; a valid token
//!    flips `verified` on the matching account.
//! 3) Tokens are not single-use, so redeeming again only changes the notice.

use anyhow::Result;
use axum::{
    extract::{Extension, Path},
    response::Response,
};
use std::sync::Arc;
use tera::Context;
use tracing::{debug, info, instrument};

use super::guard::{CurrentUser, VERIFY_REQUIRED};
use crate::api::{
    handlers::{
        flash::{Category, Flashes},
        internal_error, redirect, render,
    },
    state::AppState,
    token::TokenStatus,
};

pub(crate) const VERIFY_SUBJECT: &str = "Please verify your email";
const INVALID_LINK: &str = "Verification link is invalid or has expired.";

/// Mint a fresh token for `email` and mail the verification link.
///
/// Delivery failures are logged by the mailer and not reported here.
///
/// # Errors
/// Returns an error if the token cannot be minted or the email rendered.
pub(crate) async fn send_verification_email(state: &AppState, email: &str) -> Result<()> {
    let token = state.codec.issue(email)?;

    let mut context = Context::new();
    context.insert("confirm_url", &state.config.verify_url(&token));
    context.insert("max_age_minutes", &(state.codec.max_age().as_secs() / 60));
    let html = state.templates.render("activate.html", &context)?;

    state.mailer.send(email, VERIFY_SUBJECT, html).await;
    Ok(())
}

#[instrument(skip_all)]
pub async fn verify_email(
    Path(token): Path<String>,
    CurrentUser(_): CurrentUser,
    mut flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    let email = match state.codec.redeem(&token) {
        TokenStatus::Valid(email) => email,
        TokenStatus::Invalid => {
            flashes.push(Category::Danger, INVALID_LINK);
            return redirect("/", &flashes);
        }
    };

    let user = match state.stores.users.find_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("verification token names an unknown account");
            flashes.push(Category::Danger, INVALID_LINK);
            return redirect("/", &flashes);
        }
        Err(err) => return internal_error(&err),
    };

    if user.verified {
        flashes.push(Category::Success, "Account already verified. Please login.");
    } else {
        if let Err(err) = state.stores.users.mark_verified(user.id).await {
            return internal_error(&err);
        }
        info!(user_id = %user.id, "account verified");
        flashes.push(Category::Success, "You have verified your account. Thanks!");
    }

    redirect("/", &flashes)
}

pub async fn unverified(
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    if user.verified {
        return redirect("/", &flashes);
    }

    let flashes = flashes.with(Category::Warning, VERIFY_REQUIRED);
    render(&state, "unverified.html", Context::new(), &flashes, Some(&user))
}

#[instrument(skip_all)]
pub async fn resend_verification(
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    if let Err(err) = send_verification_email(&state, &user.email).await {
        return internal_error(&err);
    }

    let flashes = flashes.with(Category::Success, "A new verification email has been sent.");
    redirect("/unverified", &flashes)
}
