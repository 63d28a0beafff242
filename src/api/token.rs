//! Stateless email verification tokens.
//!
//! A token is four unpadded base64url segments joined by `.`:
//! `email . issued_at (u64 BE) . nonce (96 bits) . HMAC-SHA256`.
//! The MAC covers the salt and the first three segments, so any edit to the
//! address, the timestamp or the signature invalidates the token.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;

/// Result of redeeming a token. The cause of a failure is never exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(String),
    Invalid,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum TokenError {
    #[error("token does not have four segments")]
    Malformed,
    #[error("token segment is not valid base64url")]
    Encoding,
    #[error("token signature mismatch")]
    Signature,
    #[error("token issued in the future")]
    FromFuture,
    #[error("token expired")]
    Expired,
}

pub struct TokenCodec {
    secret: SecretString,
    salt: String,
    max_age: Duration,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: SecretString, salt: impl Into<String>, max_age: Duration) -> Self {
        Self {
            secret,
            salt: salt.into(),
            max_age,
        }
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Mint a token for `email` stamped with the current time.
    ///
    /// # Errors
    /// Returns an error if the clock is before the Unix epoch or the OS RNG fails.
    pub fn issue(&self, email: &str) -> Result<String> {
        self.issue_at(email, unix_now()?)
    }

    /// Mint a token for `email` stamped with `issued_at` (Unix seconds).
    ///
    /// # Errors
    /// Returns an error if the OS RNG fails.
    pub fn issue_at(&self, email: &str, issued_at: u64) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce)
            .context("failed to generate token nonce")?;

        let payload = format!(
            "{}.{}.{}",
            Base64UrlUnpadded::encode_string(email.as_bytes()),
            Base64UrlUnpadded::encode_string(&issued_at.to_be_bytes()),
            Base64UrlUnpadded::encode_string(&nonce)
        );
        let signature = self.mac(&payload)?.finalize().into_bytes();

        Ok(format!(
            "{payload}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Validate `token` against the current time.
    #[must_use]
    pub fn redeem(&self, token: &str) -> TokenStatus {
        match unix_now() {
            Ok(now) => self.redeem_at(token, now),
            Err(err) => {
                debug!("token rejected: {err:#}");
                TokenStatus::Invalid
            }
        }
    }

    /// Validate `token` as if the current time were `now` (Unix seconds).
    #[must_use]
    pub fn redeem_at(&self, token: &str, now: u64) -> TokenStatus {
        match self.decode(token, now) {
            Ok(email) => TokenStatus::Valid(email),
            Err(err) => {
                debug!("token rejected: {err}");
                TokenStatus::Invalid
            }
        }
    }

    fn decode(&self, token: &str, now: u64) -> Result<String, TokenError> {
        let (payload, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let signature =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| TokenError::Encoding)?;

        self.mac(payload)
            .map_err(|_| TokenError::Signature)?
            .verify_slice(&signature)
            .map_err(|_| TokenError::Signature)?;

        let mut segments = payload.split('.');
        let (Some(email), Some(issued_at), Some(_nonce), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Malformed);
        };

        let email = Base64UrlUnpadded::decode_vec(email)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(TokenError::Encoding)?;

        let issued_at: [u8; 8] = Base64UrlUnpadded::decode_vec(issued_at)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(TokenError::Encoding)?;
        let issued_at = u64::from_be_bytes(issued_at);

        let age = now.checked_sub(issued_at).ok_or(TokenError::FromFuture)?;
        if age > self.max_age.as_secs() {
            return Err(TokenError::Expired);
        }

        Ok(email)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .context("invalid token signing key")?;
        mac.update(self.salt.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the Unix epoch")?
        .as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISSUED: u64 = 1_700_000_000;
    const EMAIL: &str = "ada@example.com";

    fn codec() -> TokenCodec {
        TokenCodec::new(
            SecretString::from("0123456789abcdef-secret".to_string()),
            "email-verification",
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn redeems_within_window() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED)?;
        assert_eq!(
            codec.redeem_at(&token, ISSUED),
            TokenStatus::Valid(EMAIL.to_string())
        );
        assert_eq!(
            codec.redeem_at(&token, ISSUED + 1800),
            TokenStatus::Valid(EMAIL.to_string())
        );
        Ok(())
    }

    #[test]
    fn expiry_boundary_is_inclusive() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED)?;
        assert_eq!(
            codec.redeem_at(&token, ISSUED + 3600),
            TokenStatus::Valid(EMAIL.to_string())
        );
        assert_eq!(codec.redeem_at(&token, ISSUED + 3601), TokenStatus::Invalid);
        Ok(())
    }

    #[test]
    fn future_timestamp_is_rejected() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED + 10)?;
        assert_eq!(codec.redeem_at(&token, ISSUED), TokenStatus::Invalid);
        Ok(())
    }

    #[test]
    fn single_character_signature_change_fails() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED)?;

        let index = token.len() - 10;
        let original = token.as_bytes()[index];
        for replacement in [b'A', b'B'] {
            if replacement == original {
                continue;
            }
            let mut tampered = token.clone().into_bytes();
            tampered[index] = replacement;
            let tampered = String::from_utf8(tampered)?;
            assert_eq!(codec.redeem_at(&tampered, ISSUED), TokenStatus::Invalid);
        }
        Ok(())
    }

    #[test]
    fn swapped_email_segment_fails() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED)?;
        let (_, rest) = token.split_once('.').unwrap_or_default();
        let forged = format!(
            "{}.{rest}",
            Base64UrlUnpadded::encode_string(b"eve@example.com")
        );
        assert_eq!(codec.redeem_at(&forged, ISSUED), TokenStatus::Invalid);
        Ok(())
    }

    #[test]
    fn other_secret_or_salt_fails() -> Result<()> {
        let token = codec().issue_at(EMAIL, ISSUED)?;

        let other_secret = TokenCodec::new(
            SecretString::from("another-signing-secret".to_string()),
            "email-verification",
            Duration::from_secs(3600),
        );
        assert_eq!(other_secret.redeem_at(&token, ISSUED), TokenStatus::Invalid);

        let other_salt = TokenCodec::new(
            SecretString::from("0123456789abcdef-secret".to_string()),
            "password-reset",
            Duration::from_secs(3600),
        );
        assert_eq!(other_salt.redeem_at(&token, ISSUED), TokenStatus::Invalid);
        Ok(())
    }

    #[test]
    fn malformed_input_is_invalid() {
        let codec = codec();
        for token in ["", "abc", "a.b", "a.b.c.d", "...", "not base64!.x.y.z"] {
            assert_eq!(codec.redeem_at(token, ISSUED), TokenStatus::Invalid);
        }
    }

    #[test]
    fn decode_reports_cause() -> Result<()> {
        let codec = codec();
        let token = codec.issue_at(EMAIL, ISSUED)?;
        assert_eq!(codec.decode("abc", ISSUED), Err(TokenError::Malformed));
        assert_eq!(
            codec.decode(&token, ISSUED + 3601),
            Err(TokenError::Expired)
        );
        assert_eq!(codec.decode(&token, ISSUED - 1), Err(TokenError::FromFuture));
        Ok(())
    }

    #[test]
    fn reissue_differs_but_both_redeem() -> Result<()> {
        let codec = codec();
        let first = codec.issue_at(EMAIL, ISSUED)?;
        let second = codec.issue_at(EMAIL, ISSUED)?;
        assert_ne!(first, second);
        assert_eq!(
            codec.redeem_at(&first, ISSUED),
            TokenStatus::Valid(EMAIL.to_string())
        );
        assert_eq!(
            codec.redeem_at(&second, ISSUED),
            TokenStatus::Valid(EMAIL.to_string())
        );
        Ok(())
    }

    #[test]
    fn token_is_path_safe() -> Result<()> {
        let token = codec().issue(EMAIL)?;
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
        assert_eq!(codec().redeem(&token), TokenStatus::Valid(EMAIL.to_string()));
        Ok(())
    }
}
