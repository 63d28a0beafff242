//! Account registration.
//!
//! Flow Overview:
//! 1) Validate the form; field errors re-render the page.
//! 2) Hash the password and insert the user unverified. A duplicate email or
//!    username re-renders the form with a notice and leaves the session alone.
//! 3) Mail a verification link, log the new user in and redirect to
//!    `/unverified`.

use axum::{
    extract::{Extension, Form},
    http::{header::SET_COOKIE, HeaderMap},
    response::Response,
};
use std::sync::Arc;
use tera::Context;
use tracing::{error, info, instrument};

use super::{
    forms::{RegisterErrors, RegisterForm},
    guard::MaybeUser,
    session::login_user,
    utils::{normalize_email, username_from_email},
    verification::send_verification_email,
};
use crate::api::{
    handlers::{
        flash::{Category, Flashes},
        internal_error, redirect, render,
    },
    state::AppState,
    store::{CreateOutcome, NewUser, User},
};

fn register_page_response(
    state: &AppState,
    form: &RegisterForm,
    errors: &RegisterErrors,
    flashes: &Flashes,
    user: Option<&User>,
) -> Response {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render(state, "register.html", context, flashes, user)
}

pub async fn register_page(
    MaybeUser(user): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    register_page_response(
        &state,
        &RegisterForm::default(),
        &RegisterErrors::default(),
        &flashes,
        user.as_ref(),
    )
}

#[instrument(skip_all)]
pub async fn register(
    MaybeUser(current): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return register_page_response(&state, &form, &errors, &flashes, current.as_ref());
    }

    let email = normalize_email(&form.email);
    let password = match state.passwords.hash(&form.password) {
        Ok(hash) => hash,
        Err(err) => return internal_error(&err),
    };

    let new_user = NewUser {
        name: form.name.trim().to_string(),
        surname: form.surname.trim().to_string(),
        username: username_from_email(&email),
        email,
        password,
    };

    let user = match state.stores.users.create(new_user).await {
        Ok(CreateOutcome::Created(user)) => user,
        Ok(CreateOutcome::Conflict) => {
            let flashes = flashes.with(Category::Error, "User already exists!");
            return register_page_response(&state, &form, &errors, &flashes, current.as_ref());
        }
        Err(err) => return internal_error(&err),
    };
    info!(user_id = %user.id, "user registered");

    // The account exists either way; a failed send can be retried via /resend.
    if let Err(err) = send_verification_email(&state, &user.email).await {
        error!(user_id = %user.id, "Failed to send verification email: {err:#}");
    }

    let cookie = match login_user(&state, &headers, &user).await {
        Ok(cookie) => cookie,
        Err(err) => return internal_error(&err),
    };

    let flashes = flashes.with(Category::Success, "Verification link has been sent via email");
    let mut response = redirect("/unverified", &flashes);
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}
