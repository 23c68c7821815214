//! # Transport Seam
//!
//! The retry loop in [`super::ky_http`] talks to the network only through
//! [`Transport`] and waits only through [`Sleeper`]. Production uses
//! [`HttpTransport`] (a `reqwest::blocking` session) and [`ThreadSleeper`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use crate::configs::settings::ClientSettings;
use crate::errors::{BoxError, ConfigError};

/// Header carrying the credential on every request.
pub const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, for error reports.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A failure below HTTP: no status line was received.
#[derive(Debug)]
pub enum Fault {
    /// Worth another attempt (connect, timeout, send, body read).
    Transient(BoxError),
    /// Retrying cannot help (malformed request, redirect policy, ...).
    Permanent(BoxError),
}

impl Fault {
    pub fn is_transient(&self) -> bool {
        matches!(self, Fault::Transient(_))
    }

    pub fn into_source(self) -> BoxError {
        match self {
            Fault::Transient(e) | Fault::Permanent(e) => e,
        }
    }
}

/// Issues one GET and reports either a response or a fault.
pub trait Transport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, Fault>;
}

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Blocking HTTP session with the credential and timeout baked in.
///
/// `reqwest::blocking::Client` is `Send + Sync` and pools connections, so one
/// instance can be shared; no extra locking is added here.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Client,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let mut token = HeaderValue::from_str(settings.credential.expose())
            .map_err(|_| ConfigError::InvalidCredential)?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let inner = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { inner })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, Fault> {
        let response = self.inner.get(url).query(query).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(classify)?;
        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// Sorts reqwest failures into transient and permanent faults.
fn classify(err: reqwest::Error) -> Fault {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        Fault::Transient(Box::new(err))
    } else {
        Fault::Permanent(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::credentials::{MapSecrets, TOKEN_ENV_VAR};
    use crate::configs::settings::ClientOptions;

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(429, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
    }

    #[test]
    fn test_fault_keeps_source() {
        let fault = Fault::Permanent("bad request line".into());
        assert!(!fault.is_transient());
        assert_eq!(fault.into_source().to_string(), "bad request line");
    }

    #[test]
    fn test_transport_builds_from_settings() {
        let settings = ClientOptions::default()
            .resolve(&MapSecrets::new().with(TOKEN_ENV_VAR, "tok"))
            .unwrap();
        assert!(HttpTransport::new(&settings).is_ok());
    }

    #[test]
    fn test_connection_refused_is_transient() {
        let settings = ClientOptions::default()
            .with_timeout_secs(2)
            .resolve(&MapSecrets::new().with(TOKEN_ENV_VAR, "tok"))
            .unwrap();
        let transport = HttpTransport::new(&settings).unwrap();
        // Port 9 (discard) on loopback is closed on any sane test host.
        let fault = transport.get("http://127.0.0.1:9/market/stocks/all", &[]).unwrap_err();
        assert!(fault.is_transient());
    }
}
