//! Console configuration from `FLEETSNAP_*` environment variables.
//!
//! Everything has a default; the console runs with no environment at all.
//! Credentials may be supplied via `FLEETSNAP_USERNAME`/`FLEETSNAP_PASSWORD`
//! to skip the interactive prompts, for scripted runs.

use std::time::Duration;

use fleetsnap_common::Credentials;

const DEFAULT_SCHEME: &str = "https";
const DEFAULT_PORT: u16 = 443;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// URL scheme for the endpoint, `https` unless overridden.
    pub scheme: String,
    /// Endpoint port.
    pub port: u16,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip TLS verification. Lab endpoints with self-signed certs only.
    pub accept_invalid_certs: bool,
    /// Credentials from the environment, present only when both halves are.
    pub credentials: Option<Credentials>,
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        let scheme = std::env::var("FLEETSNAP_API_SCHEME")
            .unwrap_or_else(|_| DEFAULT_SCHEME.to_string());
        let port = std::env::var("FLEETSNAP_API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let timeout_secs = std::env::var("FLEETSNAP_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let accept_invalid_certs = std::env::var("FLEETSNAP_INSECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let credentials = match (
            std::env::var("FLEETSNAP_USERNAME"),
            std::env::var("FLEETSNAP_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(Credentials::new(username, password)),
            _ => None,
        };

        Self {
            scheme,
            port,
            timeout: Duration::from_secs(timeout_secs),
            accept_invalid_certs,
            credentials,
        }
    }

    /// Endpoint base URL for one host.
    pub fn base_url(&self, host: &str) -> String {
        format!("{}://{}:{}", self.scheme, host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "FLEETSNAP_API_SCHEME",
        "FLEETSNAP_API_PORT",
        "FLEETSNAP_TIMEOUT_SECS",
        "FLEETSNAP_INSECURE",
        "FLEETSNAP_USERNAME",
        "FLEETSNAP_PASSWORD",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_env_unset() {
        clear_env();
        let config = ConsoleConfig::from_env();
        assert_eq!(config.scheme, "https");
        assert_eq!(config.port, 443);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.accept_invalid_certs);
        assert!(config.credentials.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_every_field() {
        clear_env();
        std::env::set_var("FLEETSNAP_API_SCHEME", "http");
        std::env::set_var("FLEETSNAP_API_PORT", "8443");
        std::env::set_var("FLEETSNAP_TIMEOUT_SECS", "5");
        std::env::set_var("FLEETSNAP_INSECURE", "true");
        std::env::set_var("FLEETSNAP_USERNAME", "svc-snap");
        std::env::set_var("FLEETSNAP_PASSWORD", "pw");

        let config = ConsoleConfig::from_env();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.port, 8443);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.accept_invalid_certs);
        assert_eq!(
            config.credentials,
            Some(Credentials::new("svc-snap", "pw"))
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_port_falls_back_to_default() {
        clear_env();
        std::env::set_var("FLEETSNAP_API_PORT", "not-a-port");
        let config = ConsoleConfig::from_env();
        assert_eq!(config.port, 443);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_credentials_require_both_halves() {
        clear_env();
        std::env::set_var("FLEETSNAP_USERNAME", "svc-snap");
        let config = ConsoleConfig::from_env();
        assert!(config.credentials.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_base_url_formats_host() {
        clear_env();
        let config = ConsoleConfig::from_env();
        assert_eq!(
            config.base_url("esx-lab-01.internal"),
            "https://esx-lab-01.internal:443"
        );
    }
}
