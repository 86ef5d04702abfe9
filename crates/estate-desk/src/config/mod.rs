use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the portal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let raw_base_url =
            env::var("PORTAL_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let base_url = Url::parse(raw_base_url.trim()).map_err(|source| {
            ConfigError::InvalidBaseUrl {
                value: raw_base_url.clone(),
                source,
            }
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::NotABaseUrl(raw_base_url));
        }

        let request_timeout = seconds_from_env("PORTAL_REQUEST_TIMEOUT_SECS", 10)?;
        let poll_interval = seconds_from_env("PORTAL_POLL_INTERVAL_SECS", 5)?;
        let session_ttl = seconds_from_env("PORTAL_SESSION_CACHE_SECS", 60)?;

        let service_token = env::var("PORTAL_SERVICE_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            backend: BackendConfig {
                base_url,
                request_timeout,
                service_token,
                session_ttl,
            },
            polling: PollingConfig {
                interval: poll_interval,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn seconds_from_env(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let seconds = match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidDuration { key })?,
        Err(_) => default,
    };

    if seconds == 0 {
        return Err(ConfigError::InvalidDuration { key });
    }

    Ok(Duration::from_secs(seconds))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Addressing for the backend REST service. Every outbound call is resolved
/// against `base_url`.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    /// Token the service itself presents when polling on behalf of admins.
    pub service_token: Option<String>,
    /// How long a caller's session stays trusted after the backend confirmed it.
    pub session_ttl: Duration,
}

impl BackendConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(10),
            service_token: None,
            session_ttl: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollingConfig {
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    NotABaseUrl(String),
    InvalidDuration {
        key: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl { value, .. } => {
                write!(f, "PORTAL_API_BASE_URL '{}' is not a valid URL", value)
            }
            ConfigError::NotABaseUrl(value) => {
                write!(f, "PORTAL_API_BASE_URL '{}' cannot be used as a base", value)
            }
            ConfigError::InvalidDuration { key } => {
                write!(f, "{} must be a positive number of seconds", key)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidBaseUrl { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::NotABaseUrl(_)
            | ConfigError::InvalidDuration { .. } => None,
        }
    }
}

/// Serializes tests that read or write process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PORTAL_API_BASE_URL",
            "PORTAL_REQUEST_TIMEOUT_SECS",
            "PORTAL_POLL_INTERVAL_SECS",
            "PORTAL_SERVICE_TOKEN",
            "PORTAL_SESSION_CACHE_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.backend.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.backend.request_timeout, Duration::from_secs(10));
        assert_eq!(config.polling.interval, Duration::from_secs(5));
        assert!(config.backend.service_token.is_none());
        assert_eq!(config.backend.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn backend_address_comes_from_one_variable() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_API_BASE_URL", "https://api.example.test/v2/");
        env::set_var("PORTAL_SERVICE_TOKEN", "  svc-token ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.backend.base_url.as_str(),
            "https://api.example.test/v2/"
        );
        assert_eq!(config.backend.service_token.as_deref(), Some("svc-token"));
        reset_env();
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_POLL_INTERVAL_SECS", "0");
        let err = AppConfig::load().expect_err("zero interval rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                key: "PORTAL_POLL_INTERVAL_SECS"
            }
        ));
        reset_env();
    }

    #[test]
    fn rejects_malformed_base_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_API_BASE_URL", "not a url");
        let err = AppConfig::load().expect_err("malformed url rejected");
        assert!(err.to_string().contains("not a url"));
        reset_env();
    }

    #[test]
    fn reads_session_cache_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_SESSION_CACHE_SECS", "15");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.backend.session_ttl, Duration::from_secs(15));
        reset_env();
    }
}
