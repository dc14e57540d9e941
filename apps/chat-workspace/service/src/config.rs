use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use session_bridge::{DeploymentEnv, SessionBackendConfig, SessionError};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8790";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_SESSION_BACKEND_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_STATIC_DIR: &str = "apps/chat-workspace/service/static";

pub const ENV_BIND_ADDR: &str = "CW_BIND_ADDR";
pub const ENV_LOG_FILTER: &str = "CW_LOG_FILTER";
pub const ENV_LOG_FORMAT: &str = "CW_LOG_FORMAT";
pub const ENV_DEPLOY_ENV: &str = "CW_DEPLOY_ENV";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CW_REQUEST_TIMEOUT_MS";
pub const ENV_STATIC_DIR: &str = "CW_STATIC_DIR";
pub const ENV_SESSION_BACKEND_URL: &str = "CW_SESSION_BACKEND_URL";
pub const ENV_SESSION_BACKEND_ANON_KEY: &str = "CW_SESSION_BACKEND_ANON_KEY";
pub const ENV_SESSION_BACKEND_TIMEOUT_MS: &str = "CW_SESSION_BACKEND_TIMEOUT_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub deployment: DeploymentEnv,
    pub request_timeout_ms: u64,
    pub static_dir: PathBuf,
    pub session_backend: SessionBackendConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid CW_BIND_ADDR value '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("missing required environment variable {name}")]
    MissingEnv { name: &'static str },
    #[error(transparent)]
    SessionBackend(#[from] SessionError),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr_raw =
            non_empty(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_addr_raw,
                source,
            })?;

        let log_filter =
            non_empty(ENV_LOG_FILTER).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_format = match non_empty(ENV_LOG_FORMAT).map(|value| value.to_lowercase()) {
            Some(value) if value == "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let deployment = non_empty(ENV_DEPLOY_ENV)
            .map(|value| DeploymentEnv::parse(&value))
            .unwrap_or_default();

        let request_timeout_ms = non_empty(ENV_REQUEST_TIMEOUT_MS)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
            .max(100);

        let static_dir = non_empty(ENV_STATIC_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let session_backend_url =
            non_empty(ENV_SESSION_BACKEND_URL).ok_or(ConfigError::MissingEnv {
                name: ENV_SESSION_BACKEND_URL,
            })?;
        let session_backend_anon_key =
            non_empty(ENV_SESSION_BACKEND_ANON_KEY).ok_or(ConfigError::MissingEnv {
                name: ENV_SESSION_BACKEND_ANON_KEY,
            })?;
        let session_backend_timeout_ms = non_empty(ENV_SESSION_BACKEND_TIMEOUT_MS)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_BACKEND_TIMEOUT_MS)
            .max(250);
        let session_backend =
            SessionBackendConfig::new(&session_backend_url, session_backend_anon_key, deployment)?
                .with_request_timeout(Duration::from_millis(session_backend_timeout_ms));

        Ok(Self {
            bind_addr,
            log_filter,
            log_format,
            deployment,
            request_timeout_ms,
            static_dir,
            session_backend,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(static_dir: PathBuf, session_backend_url: &str) -> Self {
        let deployment = DeploymentEnv::Development;
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_filter: "debug".to_string(),
            log_format: LogFormat::Text,
            deployment,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            static_dir,
            session_backend: SessionBackendConfig::new(
                session_backend_url,
                "test-anon-key",
                deployment,
            )
            .unwrap_or_else(|error| panic!("invalid test backend url: {error}"))
            .with_request_timeout(Duration::from_millis(DEFAULT_SESSION_BACKEND_TIMEOUT_MS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use session_bridge::DeploymentEnv;

    use super::{
        Config, ConfigError, ENV_BIND_ADDR, ENV_DEPLOY_ENV, ENV_LOG_FORMAT,
        ENV_SESSION_BACKEND_ANON_KEY, ENV_SESSION_BACKEND_TIMEOUT_MS, ENV_SESSION_BACKEND_URL,
        LogFormat,
    };

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_backend_is_set() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SESSION_BACKEND_URL, "https://proj.backend.example"),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
        ]))
        .expect("config");
        assert_eq!(config.bind_addr.port(), 8790);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.deployment, DeploymentEnv::Development);
        assert!(config.static_dir.ends_with("static"));
        assert_eq!(
            config.session_backend.session_cookie_name(),
            "sb-proj-auth-token"
        );
    }

    #[test]
    fn missing_backend_env_is_a_startup_error() {
        let error = Config::from_lookup(lookup(&[(ENV_SESSION_BACKEND_URL, "https://x.test")]))
            .err();
        assert!(matches!(
            error,
            Some(ConfigError::MissingEnv {
                name: ENV_SESSION_BACKEND_ANON_KEY
            })
        ));

        let error = Config::from_lookup(lookup(&[
            (ENV_SESSION_BACKEND_URL, "   "),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
        ]))
        .err();
        assert!(matches!(
            error,
            Some(ConfigError::MissingEnv {
                name: ENV_SESSION_BACKEND_URL
            })
        ));
    }

    #[test]
    fn production_and_json_logging_are_read_from_env() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SESSION_BACKEND_URL, "https://proj.backend.example"),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
            (ENV_DEPLOY_ENV, "production"),
            (ENV_LOG_FORMAT, "JSON"),
        ]))
        .expect("config");
        assert!(config.deployment.is_production());
        assert!(config.session_backend.deployment().is_production());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn session_backend_timeout_is_read_with_a_floor() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SESSION_BACKEND_URL, "https://proj.backend.example"),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
        ]))
        .expect("config");
        assert_eq!(config.session_backend.request_timeout().as_millis(), 5_000);

        let config = Config::from_lookup(lookup(&[
            (ENV_SESSION_BACKEND_URL, "https://proj.backend.example"),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
            (ENV_SESSION_BACKEND_TIMEOUT_MS, "10"),
        ]))
        .expect("config");
        assert_eq!(config.session_backend.request_timeout().as_millis(), 250);
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let error = Config::from_lookup(lookup(&[
            (ENV_BIND_ADDR, "nowhere"),
            (ENV_SESSION_BACKEND_URL, "https://proj.backend.example"),
            (ENV_SESSION_BACKEND_ANON_KEY, "anon"),
        ]))
        .err();
        assert!(matches!(error, Some(ConfigError::InvalidBindAddr { .. })));
    }
}
