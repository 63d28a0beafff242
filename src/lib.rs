//! # Latchkey
//!
//! `latchkey` is a small server-rendered authentication service: users register
//! with a name, surname, email and password, log in with a username derived from
//! their email, and prove mailbox ownership by following a signed, time-limited
//! link that is emailed to them.
//!
//! ## Verification Tokens
//!
//! Tokens are stateless. Each one carries the email address, the issue time and a
//! random nonce, signed with HMAC-SHA256 under a process-wide secret. Any valid,
//! unexpired token for an address verifies that account; tokens are not revoked
//! after use.
//!
//! ## Access Gating
//!
//! Routes are gated by two guards evaluated in a fixed order: the authentication
//! guard resolves the session cookie into a user, then the verification guard
//! checks the user's `verified` flag as stored in the database. Either guard may end
//! the request with a redirect.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
