// Client configuration, read from the environment with defaults

use crate::endpoints::DEFAULT_API_URL;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SUBMISSIONS_TTL_SECS: u64 = 30;
pub const DEFAULT_AUTH_URL: &str = "http://localhost:8081/";
pub const DEFAULT_AUTH_REALM: &str = "scd-leetcode";
pub const DEFAULT_AUTH_CLIENT_ID: &str = "scd-leetcode-client";
/// Refresh the access token when it expires within this window
pub const DEFAULT_MIN_TOKEN_VALIDITY_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub request_timeout: Duration,
    pub submissions_ttl: Duration,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub auth_url: String,
    pub realm: String,
    pub client_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub min_validity: Duration,
}

impl AuthConfig {
    /// OpenID Connect token endpoint of the realm
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.auth_url.trim_end_matches('/'),
            self.realm
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ClientConfig {
    /// Load from `CODEBENCH_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs = |key: &str, default: u64| match lookup(key) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!(key = key, value = %raw, default = default, "Invalid duration, using default");
                default
            }),
            None => default,
        };
        let secret = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            api_url: text("CODEBENCH_API_URL", DEFAULT_API_URL),
            request_timeout: Duration::from_secs(secs(
                "CODEBENCH_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            submissions_ttl: Duration::from_secs(secs(
                "CODEBENCH_SUBMISSIONS_TTL_SECS",
                DEFAULT_SUBMISSIONS_TTL_SECS,
            )),
            auth: AuthConfig {
                auth_url: text("CODEBENCH_AUTH_URL", DEFAULT_AUTH_URL),
                realm: text("CODEBENCH_AUTH_REALM", DEFAULT_AUTH_REALM),
                client_id: text("CODEBENCH_AUTH_CLIENT_ID", DEFAULT_AUTH_CLIENT_ID),
                access_token: secret("CODEBENCH_TOKEN"),
                refresh_token: secret("CODEBENCH_REFRESH_TOKEN"),
                min_validity: Duration::from_secs(DEFAULT_MIN_TOKEN_VALIDITY_SECS),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:5001/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.auth.access_token.is_none());
        assert_eq!(
            config.auth.token_endpoint(),
            "http://localhost:8081/realms/scd-leetcode/protocol/openid-connect/token"
        );
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CODEBENCH_API_URL", "https://judge.example/api"),
            ("CODEBENCH_REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("CODEBENCH_SUBMISSIONS_TTL_SECS", "5"),
            ("CODEBENCH_TOKEN", "abc"),
            ("CODEBENCH_REFRESH_TOKEN", "  "),
        ]);
        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://judge.example/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.submissions_ttl, Duration::from_secs(5));
        assert_eq!(config.auth.access_token.as_deref(), Some("abc"));
        assert!(config.auth.refresh_token.is_none());
    }
}
