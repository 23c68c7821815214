//! # HTTP Retrieval Utilities
//!
//! [`ApiClient`] is the resilient remote-resource accessor. Every resource call in
//! this crate funnels through [`ApiClient::fetch`], which owns the retry policy:
//!
//! - `429 Too Many Requests`: back off and retry.
//! - Transient transport fault: back off and retry; the last one is propagated verbatim.
//! - Permanent transport fault or any other non-2xx status: fail immediately.
//! - 2xx: decode JSON, or return [`Payload::NoContent`] for an empty body.
//!
//! The backoff is linear: `1.5s * (attempt_index + 1)`, at most three attempts.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::descriptor::{join_url, RequestDescriptor, Scalar};
use super::transport::{Fault, HttpTransport, RawResponse, Sleeper, ThreadSleeper, Transport};
use crate::configs::credentials::{EnvSecrets, SecretSource};
use crate::configs::settings::{normalize_base_url, ClientOptions, ClientSettings};
use crate::errors::{OpLabError, Result};

const RATE_LIMITED: u16 = 429;

/// Decoded body of a successful call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    /// The server answered 2xx with an empty body.
    NoContent,
}

impl Payload {
    pub fn is_no_content(&self) -> bool {
        matches!(self, Payload::NoContent)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::NoContent => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(v) => Some(v),
            Payload::NoContent => None,
        }
    }
}

/// Attempt budget and linear backoff step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt with zero-based index `attempt_index`.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.backoff_step * (attempt_index + 1)
    }
}

/// Blocking accessor over the OpLab REST API.
///
/// Holds only immutable session state. Sharing it between threads is safe exactly
/// when the transport and sleeper are; the defaults are.
pub struct ApiClient<T = HttpTransport, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    base_url: String,
    policy: RetryPolicy,
}

impl ApiClient {
    /// Builds a client from options, resolving the token from the environment when
    /// `options.token` is absent.
    ///
    /// # Errors
    /// Fails before any network activity when no token resolves or the options are invalid.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Self::with_secrets(options, &EnvSecrets)
    }

    /// Same as [`ApiClient::new`] with an explicit secret source.
    pub fn with_secrets(options: &ClientOptions, secrets: &dyn SecretSource) -> Result<Self> {
        let settings = options.resolve(secrets)?;
        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(settings)?;
        Ok(Self {
            transport,
            sleeper: ThreadSleeper,
            base_url: settings.base_url.clone(),
            policy: RetryPolicy::default(),
        })
    }
}

impl<T: Transport, S: Sleeper> ApiClient<T, S> {
    /// Assembles a client from explicit parts. The base URL is validated and normalised.
    pub fn from_parts(base_url: &str, transport: T, sleeper: S) -> Result<Self> {
        Ok(Self {
            transport,
            sleeper,
            base_url: normalize_base_url(base_url)?,
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Absolute URL a descriptor resolves to.
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Shorthand for [`ApiClient::fetch`] with an ad-hoc descriptor.
    pub fn get(&self, path: &str, params: &[(&str, Scalar)]) -> Result<Payload> {
        let descriptor = params
            .iter()
            .fold(RequestDescriptor::new(path), |d, (k, v)| d.param(*k, v.clone()));
        self.fetch(&descriptor)
    }

    /// Issues the request described by `descriptor`, retrying per the policy.
    ///
    /// This is the only network entry point of the crate.
    pub fn fetch(&self, descriptor: &RequestDescriptor) -> Result<Payload> {
        let url = self.url_for(&descriptor.path);
        let query = descriptor.query_pairs();
        let max = self.policy.max_attempts.max(1);

        for attempt in 0..max {
            let attempt_no = attempt + 1;
            let last = attempt_no == max;
            debug!(url = %url, attempt = attempt_no, "GET");

            match self.transport.get(&url, &query) {
                Ok(resp) if resp.status == RATE_LIMITED => {
                    if last {
                        error!(url = %url, attempts = attempt_no, "rate limit persisted, giving up");
                        return Err(OpLabError::RateLimited { url, attempts: attempt_no });
                    }
                    self.back_off(&url, attempt, "rate limited");
                }
                Ok(resp) => return decode(url, resp),
                Err(Fault::Transient(source)) => {
                    if last {
                        error!(url = %url, attempts = attempt_no, error = %source, "transport fault, giving up");
                        return Err(OpLabError::Transport {
                            url,
                            attempts: attempt_no,
                            transient: true,
                            source,
                        });
                    }
                    warn!(url = %url, error = %source, "transport fault");
                    self.back_off(&url, attempt, "transport fault");
                }
                Err(Fault::Permanent(source)) => {
                    error!(url = %url, error = %source, "non-retryable transport fault");
                    return Err(OpLabError::Transport {
                        url,
                        attempts: attempt_no,
                        transient: false,
                        source,
                    });
                }
            }
        }

        // The last attempt always returns above.
        Err(OpLabError::RateLimited { url, attempts: max })
    }

    fn back_off(&self, url: &str, attempt: u32, reason: &str) {
        let delay = self.policy.delay_for(attempt);
        warn!(
            url = %url,
            attempt = attempt + 1,
            max_attempts = self.policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            reason,
            "retrying"
        );
        self.sleeper.sleep(delay);
    }
}

fn decode(url: String, resp: RawResponse) -> Result<Payload> {
    if !resp.is_success() {
        error!(url = %url, status = resp.status, "request failed");
        return Err(OpLabError::Status {
            body: resp.body_text(),
            status: resp.status,
            url,
        });
    }
    if resp.body.is_empty() {
        return Ok(Payload::NoContent);
    }
    serde_json::from_slice(&resp.body)
        .map(Payload::Json)
        .map_err(|source| OpLabError::Decode { url, source })
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport and recording sleeper shared by the crate's unit tests.

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::super::transport::{Fault, RawResponse, Sleeper, Transport};

    #[derive(Debug)]
    pub struct MockFault(pub &'static str);

    impl std::fmt::Display for MockFault {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "mock fault: {}", self.0)
        }
    }

    impl std::error::Error for MockFault {}

    pub enum Step {
        Respond(u16, &'static str),
        Transient(&'static str),
        Permanent(&'static str),
    }

    /// Replays `steps` in order and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedTransport {
        steps: RefCell<VecDeque<Step>>,
        pub seen: RefCell<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedTransport {
        pub fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: RefCell::new(steps.into()),
                seen: RefCell::default(),
            }
        }

        pub fn calls(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, Fault> {
            self.seen.borrow_mut().push((url.to_string(), query.to_vec()));
            match self.steps.borrow_mut().pop_front() {
                Some(Step::Respond(status, body)) => Ok(RawResponse::new(status, body)),
                Some(Step::Transient(msg)) => Err(Fault::Transient(Box::new(MockFault(msg)))),
                Some(Step::Permanent(msg)) => Err(Fault::Permanent(Box::new(MockFault(msg)))),
                None => Ok(RawResponse::new(200, "[]")),
            }
        }
    }

    #[derive(Default)]
    pub struct RecordingSleeper {
        pub slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, delay: Duration) {
            self.slept.borrow_mut().push(delay);
        }
    }
}
