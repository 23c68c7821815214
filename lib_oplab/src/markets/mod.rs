//! # Financial Market APIs Module
//!
//! Provider-specific clients built on [`crate::retrieve`]. Only OpLab (B3 stocks and
//! options) is wired in.

/// Client for the OpLab v3 REST API.
pub mod oplab;
