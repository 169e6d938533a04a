//! Service configuration.
//!
//! Every option can be given as a command-line flag or an environment
//! variable; a `.env` file in the working directory is loaded first.
//! Rocket's own settings (address, port, body limits) stay in `Rocket.toml`
//! or `ROCKET_*` variables.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PUBLIC_BASE_URL must start with http:// or https://, got `{0}`")]
    InvalidBaseUrl(String),
    #[error("JWT_SECRET must not be empty")]
    EmptyJwtSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Parser, Clone)]
#[command(name = "scrapcraft-api", about = "Creative ScrapCraft marketplace backend")]
pub struct AppConfig {
    #[arg(long, env = "MONGO_URI", default_value = "mongodb://localhost:27017")]
    pub mongo_uri: String,

    #[arg(long, env = "MONGO_DATABASE", default_value = "scrapcraft")]
    pub mongo_database: String,

    /// Prefix applied to stored relative media references when they are served.
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:5000")]
    pub public_base_url: String,

    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    #[arg(long, env = "APP_ENV", value_enum, default_value = "production")]
    pub environment: Environment,

    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// Mailbox used both as SMTP login and as the From address.
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    /// Frontend origin that checkout success/cancel redirects point at.
    #[arg(long, env = "CLIENT_URL", default_value = "http://localhost:3000")]
    pub client_url: String,

    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: Option<String>,

    #[arg(long, env = "STRIPE_CURRENCY", default_value = "pkr")]
    pub stripe_currency: String,

    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    pub unsplash_access_key: Option<String>,
}

impl AppConfig {
    /// Loads `.env` (if present), parses flags and environment, and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !crate::media::is_absolute(&self.public_base_url) {
            return Err(ConfigError::InvalidBaseUrl(self.public_base_url.clone()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptyJwtSecret);
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// SMTP credentials, present only when both halves are configured.
    pub fn smtp_credentials(&self) -> Option<(&str, &str)> {
        match (&self.email_user, &self.email_password) {
            (Some(user), Some(password)) if !user.is_empty() => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mongo_uri", &"[REDACTED]")
            .field("mongo_database", &self.mongo_database)
            .field("public_base_url", &self.public_base_url)
            .field("upload_dir", &self.upload_dir)
            .field("jwt_secret", &"[REDACTED]")
            .field("allowed_origins", &self.allowed_origins)
            .field("environment", &self.environment)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("email_user", &self.email_user)
            .field("email_password", &self.email_password.as_ref().map(|_| "[REDACTED]"))
            .field("client_url", &self.client_url)
            .field("stripe_secret_key", &self.stripe_secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("stripe_currency", &self.stripe_currency)
            .field("unsplash_access_key", &self.unsplash_access_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> AppConfig {
        let mut args = vec!["scrapcraft-api", "--jwt-secret", "test-secret"];
        args.extend_from_slice(extra);
        AppConfig::parse_from(args)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[
            "--public-base-url",
            "http://localhost:5000",
            "--environment",
            "production",
        ]);
        assert_eq!(config.smtp_port, 587);
        assert!(!config.is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let config = parse(&["--public-base-url", "/static"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_allowed_origins_split_on_comma() {
        let config = parse(&[
            "--allowed-origins",
            "http://localhost:3000,https://creative-scrapcraft.vercel.app",
        ]);
        assert_eq!(config.allowed_origins.len(), 2);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = parse(&["--stripe-secret-key", "sk_test_123"]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("test-secret"));
        assert!(!rendered.contains("sk_test_123"));
    }

    #[test]
    fn test_smtp_credentials_need_both_halves() {
        let config = parse(&["--email-user", "shop@example.com"]);
        assert!(config.smtp_credentials().is_none());
        let config = parse(&[
            "--email-user",
            "shop@example.com",
            "--email-password",
            "app-password",
        ]);
        assert_eq!(
            config.smtp_credentials(),
            Some(("shop@example.com", "app-password"))
        );
    }
}
