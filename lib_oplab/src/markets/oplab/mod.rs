//! # OpLab API Integration Module
//!
//! Typed access to the OpLab v3 market endpoints for B3 stocks and listed options.
//!
//! ## Contained Modules:
//!
//! - **`endpoints`**: pure descriptor builders, one per resource, plus symbol validation.
//! - **`apicall`**: [`apicall::OpLabApi`], the resource operations over the shared accessor.
//! - **`bs`**: whitelisted Black-Scholes arguments.
//! - **`universe`**: paginated loading of the underlyings that have options.
//! - **`rows`**: filtering and sorting of tabular JSON responses.

/// Resource operations over the shared accessor.
pub mod apicall;
/// Whitelisted pricing arguments.
pub mod bs;
/// Descriptor builders and symbol validation.
pub mod endpoints;
/// Row filters and safe sorting.
pub mod rows;
/// Paginated universe loading.
pub mod universe;

pub use apicall::OpLabApi;
pub use bs::{BsArgs, BsParam, OptionKind};
