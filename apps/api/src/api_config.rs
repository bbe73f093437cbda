use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use constructmate_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_UPSTREAM_API_URL: &str = "https://localhost:7047/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreConfig {
    Memory,
    Redis { redis_url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub upstream_api_url: Url,
    pub upstream_timeout: Duration,
    pub session_store: SessionStoreConfig,
    pub cookie_secure: bool,
    pub reference_data_seed_path: Option<PathBuf>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let upstream_api_url = lookup("UPSTREAM_API_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_API_URL.to_owned());
        let upstream_api_url = Url::parse(upstream_api_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid UPSTREAM_API_URL: {error}"))
        })?;

        let upstream_timeout_secs = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|error| {
                AppError::Validation(format!("invalid UPSTREAM_TIMEOUT_SECS: {error}"))
            })?,
            None => 10,
        };
        if upstream_timeout_secs == 0 {
            return Err(AppError::Validation(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        let session_store = match lookup("SESSION_STORE")
            .unwrap_or_else(|| "memory".to_owned())
            .trim()
        {
            "memory" => SessionStoreConfig::Memory,
            "redis" => SessionStoreConfig::Redis {
                redis_url: required_non_empty(&lookup, "REDIS_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "SESSION_STORE must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let reference_data_seed_path = lookup("REFERENCE_DATA_SEED_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            upstream_api_url,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
            session_store,
            cookie_secure,
            reference_data_seed_path,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use constructmate_core::AppError;

    use super::{ApiConfig, SessionStoreConfig};

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap_or_else(|_| unreachable!());

        assert_eq!(config.api_port, 3001);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.upstream_api_url.as_str(), "https://localhost:7047/api");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.session_store, SessionStoreConfig::Memory);
        assert!(!config.cookie_secure);
        assert!(config.reference_data_seed_path.is_none());
        assert!(config.socket_address().is_ok());
    }

    #[test]
    fn redis_store_requires_url() {
        let missing = config_from(&[("SESSION_STORE", "redis")]);
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let config = config_from(&[
            ("SESSION_STORE", "redis"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
        ])
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(
            config.session_store,
            SessionStoreConfig::Redis {
                redis_url: "redis://127.0.0.1:6379".to_owned()
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config_from(&[("UPSTREAM_API_URL", "not a url")]).is_err());
        assert!(config_from(&[("UPSTREAM_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("UPSTREAM_TIMEOUT_SECS", "ten")]).is_err());
        assert!(config_from(&[("SESSION_STORE", "postgres")]).is_err());
    }

    #[test]
    fn seed_path_and_cookie_flag_are_read() {
        let config = config_from(&[
            ("REFERENCE_DATA_SEED_PATH", "./seed.json"),
            ("SESSION_COOKIE_SECURE", "TRUE"),
        ])
        .unwrap_or_else(|_| unreachable!());

        assert!(config.cookie_secure);
        assert_eq!(
            config
                .reference_data_seed_path
                .as_deref()
                .and_then(|path| path.to_str()),
            Some("./seed.json")
        );
    }
}
