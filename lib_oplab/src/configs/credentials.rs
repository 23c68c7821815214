//! # Credential Resolution
//!
//! The access token is resolved exactly once, when a client is built. An explicit
//! value wins; otherwise the injected [`SecretSource`] is consulted. Call paths never
//! look the token up again.

use std::collections::BTreeMap;
use std::env;
use std::fmt;

use crate::errors::ConfigError;

/// Environment variable holding the OpLab access token.
pub const TOKEN_ENV_VAR: &str = "OPLAB_ACCESS_TOKEN";

/// A place secrets can be read from.
pub trait SecretSource {
    /// Returns the raw value stored under `key`, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// In-memory secrets, handy for tests and for config files already parsed elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MapSecrets(BTreeMap<String, String>);

impl MapSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl SecretSource for MapSecrets {
    fn lookup(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// A non-empty bearer token sent in the `Access-Token` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Resolves the token from `explicit` first, then from `source`.
    ///
    /// Blank values count as absent.
    ///
    /// # Errors
    /// [`ConfigError::MissingCredential`] when neither yields a token.
    pub fn resolve(explicit: Option<&str>, source: &dyn SecretSource) -> Result<Self, ConfigError> {
        explicit
            .and_then(Self::non_blank)
            .or_else(|| source.lookup(TOKEN_ENV_VAR).as_deref().and_then(Self::non_blank))
            .ok_or(ConfigError::MissingCredential(TOKEN_ENV_VAR))
    }

    /// The raw value is kept as given; trimming only decides blankness.
    fn non_blank(raw: &str) -> Option<Self> {
        (!raw.trim().is_empty()).then(|| Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_token_wins_over_source() {
        let source = MapSecrets::new().with(TOKEN_ENV_VAR, "from-source");
        let cred = Credential::resolve(Some("explicit"), &source).unwrap();
        assert_eq!(cred.expose(), "explicit");
    }

    #[test]
    fn test_falls_back_to_source() {
        let source = MapSecrets::new().with(TOKEN_ENV_VAR, "from-source");
        let cred = Credential::resolve(None, &source).unwrap();
        assert_eq!(cred.expose(), "from-source");
    }

    #[test]
    fn test_token_is_kept_verbatim() {
        let cred = Credential::resolve(Some(" tok en "), &MapSecrets::new()).unwrap();
        assert_eq!(cred.expose(), " tok en ");
    }

    #[test]
    fn test_blank_explicit_token_falls_through() {
        let source = MapSecrets::new().with(TOKEN_ENV_VAR, "from-source");
        let cred = Credential::resolve(Some("   "), &source).unwrap();
        assert_eq!(cred.expose(), "from-source");
    }

    #[test]
    fn test_missing_everywhere_is_fatal() {
        let err = Credential::resolve(None, &MapSecrets::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(TOKEN_ENV_VAR)));

        let blank = MapSecrets::new().with(TOKEN_ENV_VAR, "");
        assert!(Credential::resolve(Some(""), &blank).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = Credential::resolve(Some("super-secret"), &MapSecrets::new()).unwrap();
        assert!(!format!("{:?}", cred).contains("super-secret"));
    }
}
