//! Auth handlers and supporting modules.
//!
//! This module coordinates registration, password login, cookie sessions and
//! email verification.
//!
//! ## Verification Links
//!
//! Links carry a stateless signed token (see `api::token`). They stay valid for
//! the configured max age and can be redeemed any number of times; `/resend`
//! simply mints another one.
//!
//! ## Guards
//!
//! `CurrentUser` redirects anonymous requests to `/login?next=...`.
//! `VerifiedUser` does the same and then redirects unverified accounts to
//! `/unverified`. The `verified` flag is read from the store on every request.

mod forms;
pub(crate) mod guard;
pub(crate) mod login;
pub(crate) mod register;
pub(crate) mod session;
mod utils;
pub(crate) mod verification;

pub use guard::{require_auth, require_verified, CurrentUser, MaybeUser, VerifiedUser};
