//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes, which today is
//! always starting the web server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, email};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let email_opts = email::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        secret_key: auth_opts.secret_key,
        token_salt: auth_opts.token_salt,
        token_max_age_seconds: auth_opts.token_max_age_seconds,
        base_url: auth_opts.base_url,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        smtp_host: email_opts.smtp_host,
        smtp_port: email_opts.smtp_port,
        smtp_username: email_opts.smtp_username,
        smtp_password: email_opts.smtp_password,
        mail_from: email_opts.mail_from,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn matches_from(args: &[&str]) -> clap::ArgMatches {
        temp_env::with_vars(
            [
                ("LATCHKEY_SMTP_HOST", None::<&str>),
                ("LATCHKEY_SMTP_USERNAME", None::<&str>),
                ("LATCHKEY_SMTP_PASSWORD", None::<&str>),
                ("LATCHKEY_SECRET_KEY", None::<&str>),
            ],
            || crate::cli::commands::new().get_matches_from(args.iter().copied()),
        )
    }

    #[test]
    fn server_action_carries_options() -> Result<()> {
        let matches = matches_from(&[
            "latchkey",
            "--dsn",
            "postgres://localhost/latchkey",
            "--secret-key",
            "a-long-enough-signing-key",
            "--smtp-host",
            "smtp.latchkey.dev",
        ]);

        let Action::Server(args) = handler(&matches)?;
        assert_eq!(args.port, 8080);
        assert_eq!(args.dsn, "postgres://localhost/latchkey");
        assert_eq!(args.secret_key.expose_secret(), "a-long-enough-signing-key");
        assert_eq!(args.token_salt, "email-verification");
        assert_eq!(args.smtp_host.as_deref(), Some("smtp.latchkey.dev"));
        assert_eq!(args.smtp_port, 587);
        assert!(args.smtp_username.is_none());
        Ok(())
    }

    #[test]
    fn short_secret_key_is_rejected() {
        let matches = matches_from(&[
            "latchkey",
            "--dsn",
            "postgres://localhost/latchkey",
            "--secret-key",
            "short",
        ]);

        let result = handler(&matches);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("--secret-key"));
        }
    }

    #[test]
    fn smtp_credentials_must_be_paired() {
        let matches = matches_from(&[
            "latchkey",
            "--dsn",
            "postgres://localhost/latchkey",
            "--secret-key",
            "a-long-enough-signing-key",
            "--smtp-username",
            "mailer",
        ]);

        assert!(handler(&matches).is_err());
    }
}
