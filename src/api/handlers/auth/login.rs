//! Username/password login and logout.

use axum::{
    extract::{Extension, Form, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;
use tracing::{info, instrument};

use super::{
    forms::{LoginErrors, LoginForm},
    guard::{CurrentUser, MaybeUser},
    session::{login_user, logout_user},
    utils::{normalize_email, safe_next},
};
use crate::api::{
    handlers::{
        flash::{Category, Flashes},
        internal_error, redirect, render,
    },
    state::AppState,
    store::User,
};

const INVALID_CREDENTIALS: &str = "Invalid Credentials. Please try again.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

fn login_page_response(
    state: &AppState,
    form: &LoginForm,
    errors: &LoginErrors,
    error: Option<&str>,
    next: Option<&str>,
    flashes: &Flashes,
    user: Option<&User>,
) -> Response {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("error", &error);
    context.insert("next", &next);
    render(state, "login.html", context, flashes, user)
}

pub async fn login_page(
    Query(query): Query<NextQuery>,
    MaybeUser(user): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
) -> Response {
    login_page_response(
        &state,
        &LoginForm::default(),
        &LoginErrors::default(),
        None,
        safe_next(query.next.as_deref()),
        &flashes,
        user.as_ref(),
    )
}

#[instrument(skip_all)]
pub async fn login(
    Query(query): Query<NextQuery>,
    MaybeUser(current): MaybeUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(query.next.as_deref());

    let errors = form.validate();
    if !errors.is_empty() {
        return login_page_response(&state, &form, &errors, None, next, &flashes, current.as_ref());
    }

    let username = normalize_email(&form.username);
    let user = match state.stores.users.find_by_username(&username).await {
        Ok(user) => user,
        Err(err) => return internal_error(&err),
    };

    // Unknown users and wrong passwords take the same path and the same time.
    let user = match user {
        Some(user) if state.passwords.verify(&form.password, &user.password) => Some(user),
        Some(_) => None,
        None => {
            state.passwords.verify_dummy(&form.password);
            None
        }
    };

    let Some(user) = user else {
        return login_page_response(
            &state,
            &form,
            &errors,
            Some(INVALID_CREDENTIALS),
            next,
            &flashes,
            current.as_ref(),
        );
    };

    let cookie = match login_user(&state, &headers, &user).await {
        Ok(cookie) => cookie,
        Err(err) => return internal_error(&err),
    };
    info!(user_id = %user.id, "user logged in");

    let flashes = flashes.with(Category::Message, "You are logged in.");
    let mut response = redirect(next.unwrap_or("/"), &flashes);
    response.headers_mut().append(SET_COOKIE, cookie);
    response
}

pub async fn logout(
    CurrentUser(user): CurrentUser,
    flashes: Flashes,
    state: Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let cookie = logout_user(&state, &headers).await;
    info!(user_id = %user.id, "user logged out");

    let flashes = flashes.with(Category::Message, "You are logged out.");
    let mut response = redirect("/welcome", &flashes);
    if let Some(cookie) = cookie {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
