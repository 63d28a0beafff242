use crate::api::{
    self,
    email::{EmailSender, LogEmailSender, SmtpConfig, SmtpEmailSender},
    state::AppConfig,
    token::TokenCodec,
};
use crate::cli::telemetry;
use anyhow::Result;
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret_key: SecretString,
    pub token_salt: String,
    pub token_max_age_seconds: u64,
    pub base_url: String,
    pub session_ttl_seconds: i64,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub mail_from: String,
}

/// Start the web server with the given configuration.
/// # Errors
/// Returns an error if the mail transport cannot be built or the server fails.
pub async fn execute(args: Args) -> Result<()> {
    let config = AppConfig::new(args.base_url).with_session_ttl_seconds(args.session_ttl_seconds);

    let codec = TokenCodec::new(
        args.secret_key,
        args.token_salt,
        Duration::from_secs(args.token_max_age_seconds),
    );

    let sender: Arc<dyn EmailSender> = match args.smtp_host {
        Some(host) => {
            info!("Sending email through SMTP relay {host}:{}", args.smtp_port);
            Arc::new(SmtpEmailSender::new(SmtpConfig {
                host,
                port: args.smtp_port,
                username: args.smtp_username,
                password: args.smtp_password,
                from: args.mail_from,
            })?)
        }
        None => {
            info!("No SMTP host configured, outbound email will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let result = api::new(args.port, &args.dsn, config, codec, sender).await;

    telemetry::shutdown_tracer();

    result
}
