//! One-shot notices carried across a redirect.
//!
//! Pending messages live in the `latchkey_flash` cookie as base64url JSON.
//! A redirect re-emits everything still pending plus whatever the handler
//! added; the next rendered page shows them all and clears the cookie.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::InvalidHeaderValue, request::Parts, HeaderMap, HeaderValue},
};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::debug;

use super::read_cookie;

const FLASH_COOKIE_NAME: &str = "latchkey_flash";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Message,
    Success,
    Warning,
    Danger,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: Category,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct Flashes {
    messages: Vec<FlashMessage>,
    // The request carried a flash cookie that must be cleared once shown.
    from_cookie: bool,
}

impl Flashes {
    /// Pending messages from the request cookie. Garbage is dropped.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let Some(raw) = read_cookie(headers, FLASH_COOKIE_NAME) else {
            return Self::default();
        };
        let mut flashes = Self {
            messages: Vec::new(),
            from_cookie: true,
        };

        let decoded = Base64UrlUnpadded::decode_vec(&raw)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<Vec<FlashMessage>>(&bytes).ok());

        match decoded {
            Some(messages) => {
                for message in messages {
                    flashes.push(message.category, message.message);
                }
            }
            None => debug!("ignoring unreadable flash cookie"),
        }
        flashes
    }

    /// Queue a message; an identical pending message is not repeated.
    pub fn push(&mut self, category: Category, message: impl Into<String>) {
        let message = FlashMessage {
            category,
            message: message.into(),
        };
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    #[must_use]
    pub fn with(mut self, category: Category, message: impl Into<String>) -> Self {
        self.push(category, message);
        self
    }

    #[must_use]
    pub fn messages(&self) -> &[FlashMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether the browser holds a flash cookie that needs clearing.
    #[must_use]
    pub fn from_cookie(&self) -> bool {
        self.from_cookie
    }

    /// `Set-Cookie` value carrying the pending messages.
    ///
    /// # Errors
    /// Returns an error if the cookie cannot be encoded as a header.
    pub fn set_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let json = serde_json::to_vec(&self.messages).unwrap_or_default();
        let value = Base64UrlUnpadded::encode_string(&json);
        HeaderValue::from_str(&format!(
            "{FLASH_COOKIE_NAME}={value}; Path=/; HttpOnly; SameSite=Lax"
        ))
    }

    #[must_use]
    pub fn clear_cookie() -> HeaderValue {
        HeaderValue::from_static("latchkey_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
