use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SECRET_KEY: &str = "secret-key";
pub const ARG_TOKEN_SALT: &str = "token-salt";
pub const ARG_TOKEN_MAX_AGE_SECONDS: &str = "token-max-age-seconds";
pub const ARG_BASE_URL: &str = "base-url";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

const MIN_SECRET_KEY_LEN: usize = 16;
// One year.
const MAX_SESSION_TTL_SECONDS: i64 = 31_536_000;

#[derive(Debug)]
pub struct Options {
    pub secret_key: SecretString,
    pub token_salt: String,
    pub token_max_age_seconds: u64,
    pub base_url: String,
    pub session_ttl_seconds: i64,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the secret key is missing or too short.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret_key = matches
            .get_one::<String>(ARG_SECRET_KEY)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SECRET_KEY}"))?;

        if secret_key.len() < MIN_SECRET_KEY_LEN {
            anyhow::bail!("--{ARG_SECRET_KEY} must be at least {MIN_SECRET_KEY_LEN} characters");
        }

        Ok(Self {
            secret_key: SecretString::from(secret_key),
            token_salt: matches
                .get_one::<String>(ARG_TOKEN_SALT)
                .cloned()
                .unwrap_or_else(|| "email-verification".to_string()),
            token_max_age_seconds: matches
                .get_one::<u64>(ARG_TOKEN_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(3600),
            base_url: matches
                .get_one::<String>(ARG_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(604_800),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SECRET_KEY)
                .long(ARG_SECRET_KEY)
                .help("Secret used to sign email verification tokens")
                .env("LATCHKEY_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_SALT)
                .long(ARG_TOKEN_SALT)
                .help("Salt mixed into verification token signatures")
                .env("LATCHKEY_TOKEN_SALT")
                .default_value("email-verification"),
        )
        .arg(
            Arg::new(ARG_TOKEN_MAX_AGE_SECONDS)
                .long(ARG_TOKEN_MAX_AGE_SECONDS)
                .help("How long a verification link stays valid, in seconds")
                .env("LATCHKEY_TOKEN_MAX_AGE_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL used to build verification links")
                .env("LATCHKEY_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("LATCHKEY_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_SESSION_TTL_SECONDS)),
        )
}
