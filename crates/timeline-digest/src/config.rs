//! Configuration for the timeline digest.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::twitter::{OAuthCredentials, DEFAULT_TIMELINE_URL};

/// Default SMTP host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default cursor file location.
pub const DEFAULT_CURSOR_PATH: &str = "/data/cursor.json";

/// Default trigger server port.
pub const DEFAULT_PORT: u16 = 8080;

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    /// Twitter app and user credentials.
    pub twitter: OAuthCredentials,
    /// Timeline endpoint.
    pub timeline_url: String,
    /// Outgoing mail relay.
    pub smtp: SmtpSettings,
    /// Sender address.
    pub from_address: String,
    /// Recipient address.
    pub to_address: String,
    /// Where the cursor is persisted.
    pub cursor_path: PathBuf,
    /// Shared secret for the HTTP trigger.
    pub secret: Option<String>,
    /// Trigger server port.
    pub port: u16,
}

impl DigestConfig {
    /// Create configuration from environment variables.
    ///
    /// # Required Environment Variables
    /// - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`
    /// - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
    /// - `SMTP_USERNAME`, `SMTP_PASSWORD`
    /// - `TO_ADDRESS`
    ///
    /// # Optional Environment Variables
    /// - `TIMELINE_URL`: default home timeline
    /// - `SMTP_HOST` / `SMTP_PORT`: default smtp.gmail.com:587
    /// - `FROM_ADDRESS`: default `SMTP_USERNAME`
    /// - `CURSOR_PATH`: default /data/cursor.json
    /// - `SECRET`: required only by the trigger server
    /// - `PORT`: default 8080
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));
        let port = |name: &'static str, default: u16| -> Result<u16, ConfigError> {
            optional(name).map_or(Ok(default), |v| {
                v.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                    name,
                    reason: e.to_string(),
                })
            })
        };

        let twitter = OAuthCredentials {
            consumer_key: required("TWITTER_CONSUMER_KEY")?,
            consumer_secret: required("TWITTER_CONSUMER_SECRET")?,
            access_token: required("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required("TWITTER_ACCESS_TOKEN_SECRET")?,
        };

        let smtp = SmtpSettings {
            host: optional("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port: port("SMTP_PORT", DEFAULT_SMTP_PORT)?,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
        };

        let from_address = optional("FROM_ADDRESS").unwrap_or_else(|| smtp.username.clone());

        Ok(Self {
            twitter,
            timeline_url: optional("TIMELINE_URL")
                .unwrap_or_else(|| DEFAULT_TIMELINE_URL.to_string()),
            smtp,
            from_address,
            to_address: required("TO_ADDRESS")?,
            cursor_path: optional("CURSOR_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CURSOR_PATH), PathBuf::from),
            secret: optional("SECRET"),
            port: port("PORT", DEFAULT_PORT)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("TWITTER_CONSUMER_KEY", "ck"),
            ("TWITTER_CONSUMER_SECRET", "cs"),
            ("TWITTER_ACCESS_TOKEN", "at"),
            ("TWITTER_ACCESS_TOKEN_SECRET", "ats"),
            ("SMTP_USERNAME", "bot@example.com"),
            ("SMTP_PASSWORD", "app-password"),
            ("TO_ADDRESS", "reader@example.com"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<DigestConfig, ConfigError> {
        DigestConfig::from_lookup(|name| env.get(name).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.timeline_url, DEFAULT_TIMELINE_URL);
        assert_eq!(config.smtp.host, DEFAULT_SMTP_HOST);
        assert_eq!(config.smtp.port, DEFAULT_SMTP_PORT);
        assert_eq!(config.from_address, "bot@example.com");
        assert_eq!(config.cursor_path, PathBuf::from(DEFAULT_CURSOR_PATH));
        assert_eq!(config.secret, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("FROM_ADDRESS", "digest@example.com");
        env.insert("SMTP_PORT", "2525");
        env.insert("CURSOR_PATH", "/tmp/cursor.json");
        env.insert("SECRET", "s3cret");

        let config = load(&env).unwrap();
        assert_eq!(config.from_address, "digest@example.com");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.cursor_path, PathBuf::from("/tmp/cursor.json"));
        assert_eq!(config.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_missing_required() {
        let mut env = base_env();
        env.remove("TWITTER_ACCESS_TOKEN");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TWITTER_ACCESS_TOKEN")));
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let mut env = base_env();
        env.insert("TO_ADDRESS", "  ");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TO_ADDRESS")));
    }

    #[test]
    fn test_invalid_port() {
        let mut env = base_env();
        env.insert("PORT", "eighty");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = load(&base_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("app-password"));
        assert!(!debug.contains("\"cs\""));
    }
}
