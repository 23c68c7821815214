//! # Client Settings
//!
//! [`ClientOptions`] is the loose, all-optional input (CLI flags, a config file, or
//! code). [`ClientSettings`] is the validated result the accessor is built from.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::credentials::{Credential, SecretSource};
use crate::errors::ConfigError;

/// Versioned API root used when no base URL is given.
pub const DEFAULT_BASE_URL: &str = "https://api.oplab.com.br/v3";
/// Per-call timeout used when none is given.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClientOptions {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Validates the options into immutable settings.
    ///
    /// The credential is checked first so a missing token always surfaces as
    /// [`ConfigError::MissingCredential`], whatever else is wrong.
    pub fn resolve(&self, secrets: &dyn SecretSource) -> Result<ClientSettings, ConfigError> {
        let credential = Credential::resolve(self.token.as_deref(), secrets)?;
        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if secs == 0 {
            return Err(ConfigError::InvalidTimeout(secs));
        }

        Ok(ClientSettings {
            credential,
            base_url,
            timeout: Duration::from_secs(secs),
        })
    }
}

/// Immutable session configuration shared by every call.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub credential: Credential,
    /// Absolute base URL without trailing separators.
    pub base_url: String,
    pub timeout: Duration,
}

/// Checks `raw` is an absolute http(s) URL and strips trailing separators.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        url: trimmed.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme(trimmed.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::credentials::{MapSecrets, TOKEN_ENV_VAR};

    fn secrets() -> MapSecrets {
        MapSecrets::new().with(TOKEN_ENV_VAR, "tok")
    }

    #[test]
    fn test_defaults() {
        let settings = ClientOptions::default().resolve(&secrets()).unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout, Duration::from_secs(20));
        assert_eq!(settings.credential.expose(), "tok");
    }

    #[test]
    fn test_trailing_separator_is_stripped() {
        let settings = ClientOptions::default()
            .with_base_url("http://localhost:8080/v3/")
            .resolve(&secrets())
            .unwrap();
        assert_eq!(settings.base_url, "http://localhost:8080/v3");
    }

    #[test]
    fn test_missing_credential_reported_before_bad_url() {
        let err = ClientOptions::default()
            .with_base_url("not a url")
            .resolve(&MapSecrets::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn test_rejects_relative_and_non_http_urls() {
        let rel = ClientOptions::default().with_base_url("market/v3").resolve(&secrets());
        assert!(matches!(rel, Err(ConfigError::InvalidBaseUrl { .. })));

        let ftp = ClientOptions::default().with_base_url("ftp://host/v3").resolve(&secrets());
        assert!(matches!(ftp, Err(ConfigError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = ClientOptions::default().with_timeout_secs(0).resolve(&secrets()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(0)));
    }

    #[test]
    fn test_options_deserialize_from_camel_case() {
        let opts: ClientOptions =
            serde_json::from_str(r#"{"baseUrl":"https://h/v3","timeoutSecs":5}"#).unwrap();
        assert_eq!(opts.base_url.as_deref(), Some("https://h/v3"));
        assert_eq!(opts.timeout_secs, Some(5));
        assert!(opts.token.is_none());
    }
}
