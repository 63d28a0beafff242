//! Small helpers for form normalization and redirect targets.

use regex::Regex;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Login name derived from the local part of a normalized email.
pub(super) fn username_from_email(email_normalized: &str) -> String {
    email_normalized
        .split_once('@')
        .map_or(email_normalized, |(local, _)| local)
        .to_string()
}

/// Accept only same-origin absolute paths as post-login targets.
pub(super) fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|path| {
        path.starts_with('/')
            && !path.starts_with("//")
            && !path.contains('\\')
            && !path.chars().any(char::is_control)
    })
}

/// `/login?next=<path>` for a request that needs a session.
pub(super) fn login_redirect_url(path_and_query: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(path_and_query.as_bytes()).collect();
    format!("/login?next={next}")
}
