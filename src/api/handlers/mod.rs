//! Route handlers and the response helpers they share.
//!
//! Every page is either rendered HTML or a `302 Found` redirect. Flash
//! messages ride along on redirects and are consumed by the next render.

pub mod auth;
pub mod flash;
pub mod health;
pub mod home;

use axum::{
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{Html, IntoResponse, Response},
};
use tera::Context;
use tracing::error;

use crate::api::{state::AppState, store::User};
use flash::Flashes;

/// Value of the first cookie called `name`, if any.
pub(crate) fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

/// `302 Found` to `location`, re-emitting any pending flash messages.
pub(crate) fn redirect(location: &str, flashes: &Flashes) -> Response {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(LOCATION, value);
        }
        Err(err) => {
            error!("invalid redirect location {location:?}: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    if !flashes.is_empty() {
        match flashes.set_cookie() {
            Ok(cookie) => {
                headers.append(SET_COOKIE, cookie);
            }
            Err(err) => error!("failed to encode flash cookie: {err}"),
        }
    } else if flashes.from_cookie() {
        headers.append(SET_COOKIE, Flashes::clear_cookie());
    }

    (StatusCode::FOUND, headers).into_response()
}

/// Render a full page with status 200.
pub(crate) fn render(
    state: &AppState,
    template: &str,
    context: Context,
    flashes: &Flashes,
    user: Option<&User>,
) -> Response {
    render_with_status(state, StatusCode::OK, template, context, flashes, user)
}

/// Render a page; shown flash messages are cleared from the browser.
pub(crate) fn render_with_status(
    state: &AppState,
    status: StatusCode,
    template: &str,
    mut context: Context,
    flashes: &Flashes,
    user: Option<&User>,
) -> Response {
    context.insert("flashes", flashes.messages());
    context.insert("current_user", &user);

    match state.templates.render(template, &context) {
        Ok(html) => {
            let mut headers = HeaderMap::new();
            if flashes.from_cookie() {
                headers.insert(SET_COOKIE, Flashes::clear_cookie());
            }
            (status, headers, Html(html)).into_response()
        }
        Err(err) => internal_error(&err),
    }
}

pub(crate) fn internal_error(err: &anyhow::Error) -> Response {
    error!("request failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
