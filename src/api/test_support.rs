//! Router-level test harness: in-memory stores, a recording mailer and a
//! client that keeps cookies between requests.

use anyhow::{anyhow, Result};
use argon2::Params;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    Router,
};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt;

use super::{
    email::{EmailMessage, EmailSender, Mailer},
    password::Passwords,
    router,
    state::{AppConfig, AppState},
    store::{memory::MemoryStore, Network, Stores},
    templates::Templates,
    token::TokenCodec,
};

pub(crate) const BASE_URL: &str = "http://latchkey.test";
pub(crate) const MAX_AGE_SECONDS: u64 = 3600;

#[derive(Default)]
pub(crate) struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub(crate) async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

pub(crate) struct TestApp {
    pub(crate) state: Arc<AppState>,
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) mailbox: Arc<RecordingEmailSender>,
    pub(crate) router: Router,
}

pub(crate) fn test_codec() -> TokenCodec {
    TokenCodec::new(
        SecretString::from("test-signing-secret-0123456789".to_string()),
        "email-verification",
        Duration::from_secs(MAX_AGE_SECONDS),
    )
}

impl TestApp {
    pub(crate) fn new() -> Result<Self> {
        Self::with_networks(Vec::new())
    }

    pub(crate) fn with_networks(networks: Vec<Network>) -> Result<Self> {
        let store = Arc::new(MemoryStore::with_networks(networks));
        let mailbox = Arc::new(RecordingEmailSender::default());
        // Minimal Argon2 cost keeps the suite fast.
        let params = Params::new(8, 1, 1, None).map_err(|err| anyhow!("{err}"))?;

        let state = Arc::new(AppState {
            config: AppConfig::new(BASE_URL.to_string()),
            codec: test_codec(),
            stores: Stores {
                users: store.clone(),
                sessions: store.clone(),
                networks: store.clone(),
            },
            mailer: Mailer::new(mailbox.clone()),
            templates: Templates::new()?,
            passwords: Passwords::with_params(params)?,
        });

        Ok(Self {
            router: router(state.clone()),
            state,
            store,
            mailbox,
        })
    }

    pub(crate) fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct TestResponse {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: String,
}

impl TestResponse {
    pub(crate) fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }
}

/// Browser stand-in that remembers cookies set by the app.
pub(crate) struct TestClient {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub(crate) async fn get(&mut self, path: &str) -> Result<TestResponse> {
        let request = self.request("GET", path).body(Body::empty())?;
        self.send(request).await
    }

    pub(crate) async fn post_form(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<TestResponse> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))?;
        self.send(request).await
    }

    /// Follow redirects until a page renders.
    pub(crate) async fn follow(&mut self, mut response: TestResponse) -> Result<TestResponse> {
        for _ in 0..5 {
            if response.status != StatusCode::FOUND {
                return Ok(response);
            }
            let location = response
                .location()
                .ok_or_else(|| anyhow!("redirect without location"))?
                .to_string();
            response = self.get(&location).await?;
        }
        Err(anyhow!("too many redirects"))
    }

    pub(crate) fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub(crate) fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    pub(crate) fn forget_cookies(&mut self) {
        self.cookies.clear();
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        if self.cookies.is_empty() {
            return builder;
        }
        let cookie = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(COOKIE, cookie)
    }

    async fn send(&mut self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();

        for value in headers.get_all(SET_COOKIE) {
            let Some((name, value)) = value
                .to_str()?
                .split(';')
                .next()
                .and_then(|pair| pair.split_once('='))
            else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec())?,
        })
    }
}
