//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use sabi_assistant_core::PasswordPolicy;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub chat_temperature: f32,
    pub max_reply_tokens: u32,
    pub gateway_timeout: Duration,
    pub admin_emails: Vec<String>,
    pub password_policy: PasswordPolicy,
    pub guest_message_limit: Option<u32>,
    pub ipqs_api_key: Option<String>,
    pub ipqs_api_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Gateway Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let chat_temperature = env_parse("CHAT_TEMPERATURE", 0.7f32)?;
        let max_reply_tokens = env_parse("CHAT_MAX_REPLY_TOKENS", 512u32)?;
        let gateway_timeout =
            Duration::from_secs(env_parse("GATEWAY_TIMEOUT_SECS", 30u64)?);

        // --- Load Access Policies ---
        let admin_emails =
            parse_admin_emails(&std::env::var("ADMIN_EMAILS").unwrap_or_default());

        let password_policy = PasswordPolicy {
            min_length: env_parse("PASSWORD_MIN_LENGTH", 8usize)?,
            require_mixed_case: env_flag("PASSWORD_REQUIRE_MIXED_CASE", true)?,
            require_digit: env_flag("PASSWORD_REQUIRE_DIGIT", true)?,
        };

        // Unset means unlimited anonymous use; 0 means login-only chat.
        let guest_message_limit = match std::env::var("GUEST_MESSAGE_LIMIT") {
            Ok(raw) => Some(raw.parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "GUEST_MESSAGE_LIMIT".to_string(),
                    format!("'{}' is not a valid message count", raw),
                )
            })?),
            Err(_) => None,
        };

        // --- Load Safety Checker Settings (optional collaborator) ---
        let ipqs_api_key = std::env::var("IPQS_API_KEY").ok();
        let ipqs_api_url = std::env::var("IPQS_API_URL")
            .unwrap_or_else(|_| "https://www.ipqualityscore.com/api/json/url".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            openai_api_key,
            chat_model,
            chat_temperature,
            max_reply_tokens,
            gateway_timeout,
            admin_emails,
            password_policy,
            guest_message_limit,
            ipqs_api_key,
            ipqs_api_url,
        })
    }
}

/// Parses an environment variable, falling back to `default` when unset.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}' could not be parsed", raw))
        }),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw).ok_or_else(|| {
            ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a boolean", raw))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Splits the comma-separated administrator allow-list, normalizing each
/// entry the same way login emails are normalized (trimmed, lowercased).
fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_emails_are_normalized() {
        let emails = parse_admin_emails(" Root@Sabi.app , ops@sabi.app ,, ");
        assert_eq!(emails, vec!["root@sabi.app", "ops@sabi.app"]);
    }

    #[test]
    fn empty_admin_list_parses_to_nothing() {
        assert!(parse_admin_emails("").is_empty());
    }

    #[test]
    fn flag_values() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("Off"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
