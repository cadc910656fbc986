use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.sparkpost.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub timeout_seconds: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            api_key: env::var("SPARKPOST_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            api_url: env::var("SPARKPOST_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeout_seconds: parse_timeout(env::var("SPARKPOST_TIMEOUT_SECONDS").ok())?,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

fn parse_timeout(raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|raw| raw.trim().parse().map_err(|_| ConfigError::InvalidTimeout(raw)))
        .transpose()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SPARKPOST_TIMEOUT_SECONDS value: {0}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.api_key.is_none());
        assert_eq!(config.api_url, "https://api.sparkpost.com");
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config {
            timeout_seconds: Some(15),
            ..Config::default()
        };

        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    // Only test in the crate that touches SPARKPOST_* variables.
    #[test]
    fn test_from_env() {
        env::set_var("SPARKPOST_API_KEY", "env-key");
        env::set_var("SPARKPOST_API_URL", "https://api.eu.sparkpost.com");
        env::set_var("SPARKPOST_TIMEOUT_SECONDS", "20");

        let config = Config::from_env().expect("Should load config");
        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.api_url, "https://api.eu.sparkpost.com");
        assert_eq!(config.timeout_seconds, Some(20));

        env::set_var("SPARKPOST_API_KEY", "   ");
        env::remove_var("SPARKPOST_API_URL");
        env::set_var("SPARKPOST_TIMEOUT_SECONDS", "later");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(raw) if raw == "later"));

        env::remove_var("SPARKPOST_TIMEOUT_SECONDS");

        let config = Config::from_env().expect("Should load config");
        assert!(config.api_key.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.timeout_seconds.is_none());

        env::remove_var("SPARKPOST_API_KEY");
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(None).unwrap(), None);
        assert_eq!(parse_timeout(Some(" 30 ".to_string())).unwrap(), Some(30));

        let err = parse_timeout(Some("soon".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(raw) if raw == "soon"));
    }
}
