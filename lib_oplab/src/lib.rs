//! # lib_oplab
//!
//! Blocking, retrying client for the OpLab v3 market-data API: B3 underlyings,
//! option chains, covered-call scans, remote Black-Scholes pricing and benchmark
//! interest rates.
//!
//! ```no_run
//! use lib_oplab::{ClientOptions, OpLabApi};
//!
//! let api = OpLabApi::new(&ClientOptions::default())?;
//! let chain = api.options("PETR4")?;
//! println!("{}", serde_json::to_string_pretty(&chain)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// Credential resolution and client settings.
pub mod configs;
/// Error taxonomy.
pub mod errors;
/// Provider-specific resource operations.
pub mod markets;
/// Descriptors, transport seam and the retrying accessor.
pub mod retrieve;

pub use configs::credentials::{Credential, EnvSecrets, MapSecrets, SecretSource, TOKEN_ENV_VAR};
pub use configs::settings::{ClientOptions, ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use errors::{ConfigError, OpLabError};
pub use markets::oplab::{BsArgs, BsParam, OpLabApi, OptionKind};
pub use retrieve::descriptor::{RequestDescriptor, Scalar};
pub use retrieve::ky_http::{ApiClient, Payload, RetryPolicy};
