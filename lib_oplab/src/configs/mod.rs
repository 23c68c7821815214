//! # Configuration Modules
//!
//! Credential resolution and the validated session settings the accessor is built from.

/// Token lookup through an injected secret source.
pub mod credentials;

/// Client options, defaults and validation.
pub mod settings;
