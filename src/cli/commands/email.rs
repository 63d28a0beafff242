use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_MAIL_FROM: &str = "mail-from";

#[derive(Debug)]
pub struct Options {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub mail_from: String,
}

impl Options {
    /// Parse outbound mail arguments from matches.
    ///
    /// # Errors
    /// Returns an error if only one half of the SMTP credentials is set.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let smtp_username = get_non_empty(ARG_SMTP_USERNAME);
        let smtp_password = get_non_empty(ARG_SMTP_PASSWORD);
        if smtp_username.is_some() != smtp_password.is_some() {
            anyhow::bail!("--{ARG_SMTP_USERNAME} and --{ARG_SMTP_PASSWORD} must be set together");
        }

        Ok(Self {
            smtp_host: get_non_empty(ARG_SMTP_HOST),
            smtp_port: matches.get_one::<u16>(ARG_SMTP_PORT).copied().unwrap_or(587),
            smtp_username,
            smtp_password: smtp_password.map(SecretString::from),
            mail_from: get_non_empty(ARG_MAIL_FROM)
                .unwrap_or_else(|| "latchkey <noreply@localhost>".to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host; when unset, emails are only logged")
                .env("LATCHKEY_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port (STARTTLS)")
                .env("LATCHKEY_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("LATCHKEY_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("LATCHKEY_SMTP_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_MAIL_FROM)
                .long(ARG_MAIL_FROM)
                .help("From address for outbound email")
                .env("LATCHKEY_MAIL_FROM")
                .default_value("latchkey <noreply@localhost>"),
        )
}
