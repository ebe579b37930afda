//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `LIBRARY_CLIENT_*` environment variables or a
//! configuration file; command-line flags may override the API URL and the
//! session file path afterwards.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{FineRate, Money};

/// API root used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_FILE: &str = ".library-client/session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration values for the library client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LIBRARY_CLIENT")]
pub struct ClientSettings {
    /// Base URL of the library REST API.
    pub api_url: Option<String>,
    /// Where the signed-in session is persisted.
    pub session_file: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Estimated fine per overdue day, in cents.
    pub fine_rate_cents: Option<i64>,
    /// Emit logs as JSON lines.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

impl ClientSettings {
    /// Configured API URL, parsed; falls back to [`DEFAULT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns the parse error when the configured value is not a URL.
    pub fn api_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.api_url.as_deref().unwrap_or(DEFAULT_API_URL))
    }

    /// Configured session file, falling back to `.library-client/session.json`.
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Daily fine used for client-side estimates.
    pub fn fine_rate(&self) -> FineRate {
        self.fine_rate_cents
            .map_or_else(FineRate::default, |cents| {
                FineRate::per_day(Money::from_cents(cents))
            })
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for client configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 5] = [
        "LIBRARY_CLIENT_API_URL",
        "LIBRARY_CLIENT_SESSION_FILE",
        "LIBRARY_CLIENT_REQUEST_TIMEOUT_SECS",
        "LIBRARY_CLIENT_FINE_RATE_CENTS",
        "LIBRARY_CLIENT_LOG_JSON",
    ];

    fn load_from_empty_args() -> ClientSettings {
        ClientSettings::load_from_iter([OsString::from("library-client")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(KEYS.map(|key| (key, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(settings.api_url().expect("url").as_str(), DEFAULT_API_URL);
        assert_eq!(settings.session_file(), PathBuf::from(DEFAULT_SESSION_FILE));
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
        assert_eq!(settings.fine_rate(), FineRate::default());
        assert!(!settings.log_json);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("LIBRARY_CLIENT_API_URL", Some("https://library.test/api".to_owned())),
            ("LIBRARY_CLIENT_SESSION_FILE", Some("/tmp/desk.json".to_owned())),
            ("LIBRARY_CLIENT_REQUEST_TIMEOUT_SECS", Some("5".to_owned())),
            ("LIBRARY_CLIENT_FINE_RATE_CENTS", Some("25".to_owned())),
            ("LIBRARY_CLIENT_LOG_JSON", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.api_url().expect("url").as_str(),
            "https://library.test/api"
        );
        assert_eq!(settings.session_file(), PathBuf::from("/tmp/desk.json"));
        assert_eq!(settings.request_timeout(), Duration::from_secs(5));
        assert_eq!(settings.fine_rate().daily(), Money::from_cents(25));
        assert!(settings.log_json);
    }

    #[rstest]
    fn malformed_url_is_reported() {
        let _guard = lock_env([("LIBRARY_CLIENT_API_URL", Some("not a url".to_owned()))]);
        assert!(load_from_empty_args().api_url().is_err());
    }
}
