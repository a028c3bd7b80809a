use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::completion_client::CompletionClient;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::scraper::Scraper;

#[derive(Deserialize, Clone)]
pub struct Configuration {
    pub application: ApplicationConfigs,
    pub database: DatabaseConfigs,
    pub email_client: EmailClientConfigs,
    pub completion_client: CompletionClientConfigs,
    pub content: ContentConfigs,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationConfigs {
    pub port: u16,
    pub host: String,
    /// Public base URL embedded in verification and unsubscribe links.
    pub base_url: String,
    /// Key for deriving unsubscribe tokens. Rotating it invalidates every
    /// unsubscribe link already delivered.
    pub unsubscribe_secret: Secret<String>,
    /// Where to send the browser after a successful email verification.
    /// When unset a plain confirmation page is rendered instead.
    pub confirm_redirect_url: Option<String>,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseConfigs {
    pub username: String,
    pub password: Secret<String>,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseConfigs {
    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
            .database(&self.database_name)
    }
}

#[derive(Deserialize, Clone)]
pub struct EmailClientConfigs {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    pub timeout_milliseconds: u64,
}

impl EmailClientConfigs {
    /// Build the provider client. Panics on malformed configuration; this
    /// runs once at startup.
    pub fn client(self) -> EmailClient {
        let sender = self.sender().expect("Invalid sender email address.");
        let timeout = self.timeout();
        let base_url =
            reqwest::Url::parse(&self.base_url).expect("Invalid email client base URL.");

        EmailClient::new(base_url, sender, self.authorization_token, timeout)
    }

    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize, Clone)]
pub struct CompletionClientConfigs {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub timeout_milliseconds: u64,
}

impl CompletionClientConfigs {
    pub fn client(self) -> CompletionClient {
        let base_url =
            reqwest::Url::parse(&self.base_url).expect("Invalid completion client base URL.");
        let timeout = std::time::Duration::from_millis(self.timeout_milliseconds);

        CompletionClient::new(base_url, self.api_key, self.model, timeout)
    }
}

#[derive(Deserialize, Clone)]
pub struct ContentConfigs {
    /// Search URL harvested by the job listing scraper.
    pub job_board_url: String,
    pub scrape_timeout_milliseconds: u64,
}

impl ContentConfigs {
    pub fn scraper(&self) -> Scraper {
        Scraper::new(std::time::Duration::from_millis(
            self.scrape_timeout_milliseconds,
        ))
    }
}

pub fn get_config() -> Result<Configuration, config::ConfigError> {
    // initialise config reader
    let configs = config::Config::builder()
        .add_source(config::File::new("config.yaml", config::FileFormat::Yaml))
        // APP_APPLICATION__PORT=5001 overrides application.port
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    // convert the config values to config type
    configs.try_deserialize::<Configuration>()
}
