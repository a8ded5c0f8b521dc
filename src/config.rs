//! Environment configuration

use chrono::{DateTime, Utc};
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::backend::HttpBackendConfig;
use crate::services::Campaign;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub currency: String,
    pub fetch_size: u32,
    pub backend_timeout: Duration,
    pub campaign_code: String,
    pub campaign_ends_at: Option<DateTime<Utc>>,
    pub campaign_claimed_percent: f64,
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn env_parse<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError { key: key.to_string(), details: e.to_string() })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let campaign_ends_at = match env::var("CAMPAIGN_ENDS_AT") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                DateTime::parse_from_rfc3339(raw.trim())
                    .map_err(|e| ConfigError::ParseError { key: "CAMPAIGN_ENDS_AT".into(), details: e.to_string() })?
                    .with_timezone(&Utc),
            ),
            _ => None,
        };

        Ok(Self {
            port: env_parse("PORT", "8083")?,
            backend_url: env_required("BACKEND_URL")?,
            currency: env_or_default("STORE_CURRENCY", "IDR").to_uppercase(),
            fetch_size: env_parse("CATALOG_FETCH_SIZE", "50")?,
            backend_timeout: Duration::from_secs(env_parse("BACKEND_TIMEOUT_SECS", "10")?),
            campaign_code: env_or_default("CAMPAIGN_CODE", "BLACKBOX20"),
            campaign_ends_at,
            campaign_claimed_percent: env_parse("CAMPAIGN_CLAIMED_PERCENT", "52")?,
        })
    }

    pub fn backend(&self) -> HttpBackendConfig {
        HttpBackendConfig { base_url: self.backend_url.clone(), currency: self.currency.clone(), timeout: self.backend_timeout }
    }

    pub fn campaign(&self, now: DateTime<Utc>) -> Campaign {
        let ends_at = self.campaign_ends_at.unwrap_or_else(|| Campaign::default_end(now));
        Campaign::new(self.campaign_code.clone(), ends_at, self.campaign_claimed_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("BACKEND_URL", Some("https://api.example.com/api")),
                ("PORT", None),
                ("STORE_CURRENCY", None),
                ("CATALOG_FETCH_SIZE", None),
                ("BACKEND_TIMEOUT_SECS", None),
                ("CAMPAIGN_CODE", None),
                ("CAMPAIGN_ENDS_AT", None),
                ("CAMPAIGN_CLAIMED_PERCENT", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.port, 8083);
                assert_eq!(config.currency, "IDR");
                assert_eq!(config.fetch_size, 50);
                assert_eq!(config.backend_timeout, Duration::from_secs(10));
                assert_eq!(config.campaign_code, "BLACKBOX20");
                assert!(config.campaign_ends_at.is_none());
                assert_eq!(config.campaign(Utc::now()).percent_claimed, 52);
            },
        );
    }

    #[test]
    fn test_backend_url_required() {
        temp_env::with_var_unset("BACKEND_URL", || {
            let err = Config::from_env().unwrap_err();
            assert_eq!(err, ConfigError::MissingEnvVar("BACKEND_URL".into()));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_parse_errors_name_the_variable() {
        temp_env::with_vars([("BACKEND_URL", Some("http://x")), ("PORT", Some("eighty"))], || {
            let err = Config::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "PORT"));
        });
    }

    #[test]
    fn test_campaign_end_override() {
        temp_env::with_vars(
            [("BACKEND_URL", Some("http://x")), ("PORT", None), ("CAMPAIGN_ENDS_AT", Some("2030-01-01T00:00:00Z"))],
            || {
                let config = Config::from_env().unwrap();
                let campaign = config.campaign(Utc::now());
                assert_eq!(campaign.ends_at.to_rfc3339(), "2030-01-01T00:00:00+00:00");
            },
        );
    }
}
