//! # Data Retrieval Module
//!
//! Generic plumbing for talking to the OpLab REST API, kept apart from the
//! resource-specific operations in [`crate::markets`].
//!
//! ## Contained Modules:
//!
//! - **`descriptor`**: request descriptors (path + query pairs) and URL joining.
//! - **`transport`**: the [`transport::Transport`] and [`transport::Sleeper`] seams and
//!   the blocking `reqwest` implementation.
//! - **`ky_http`**: [`ky_http::ApiClient`], the accessor with the retry/backoff loop.

/// Request descriptors and URL joining.
pub mod descriptor;
/// Accessor with retry and linear backoff.
pub mod ky_http;
/// Network and sleep seams.
pub mod transport;
