//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_GUARD_RESOLVE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_TOKEN_PATH: &str = ".artconnect-token.json";

/// Parse an environment variable, falling back to `default` when the
/// variable is missing or malformed.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Runtime configuration for the application core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL for the records/identity REST API.
    pub api_base_url: String,
    /// Timeout applied to every outgoing HTTP request.
    pub request_timeout: Duration,
    /// Upper bound the navigation guard waits for session resolution.
    pub guard_resolve_timeout: Duration,
    /// File the bearer token is persisted to across restarts.
    pub token_path: PathBuf,
}

impl AppConfig {
    /// Load from `ARTCONNECT_*` environment variables, with defaults for
    /// anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url =
            std::env::var("ARTCONNECT_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let token_path = std::env::var("ARTCONNECT_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH));
        Self {
            api_base_url,
            request_timeout: Duration::from_millis(env_parse(
                "ARTCONNECT_REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            guard_resolve_timeout: Duration::from_millis(env_parse(
                "ARTCONNECT_GUARD_TIMEOUT_MS",
                DEFAULT_GUARD_RESOLVE_TIMEOUT_MS,
            )),
            token_path,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            guard_resolve_timeout: Duration::from_millis(DEFAULT_GUARD_RESOLVE_TIMEOUT_MS),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_missing_uses_default() {
        assert_eq!(env_parse("ARTCONNECT_TEST_NO_SUCH_VAR", 42_u64), 42);
    }

    #[test]
    fn default_config_matches_constants() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_millis(15_000));
        assert_eq!(config.guard_resolve_timeout, Duration::from_millis(5_000));
        assert_eq!(config.token_path, PathBuf::from(DEFAULT_TOKEN_PATH));
    }
}
