//! # Underlying Universe
//!
//! Pages through `market/stocks/all` and keeps the underlyings that have listed
//! options. Paging stops at the first empty page, `NoContent`, or a page shorter
//! than `per`.

use serde_json::Value;
use tracing::{debug, info};

use super::apicall::OpLabApi;
use super::rows::with_options_only;
use crate::errors::{OpLabError, Result};
use crate::retrieve::ky_http::Payload;
use crate::retrieve::transport::{Sleeper, Transport};

pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Loads up to `max_pages` pages of `per` rows each.
///
/// # Errors
/// Propagates any fetch failure, and [`OpLabError::UnexpectedShape`] when a page is
/// not a JSON array.
pub fn load_universe<T: Transport, S: Sleeper>(
    api: &OpLabApi<T, S>,
    max_pages: u32,
    per: u32,
) -> Result<Vec<Value>> {
    let mut rows = Vec::new();

    for page in 1..=max_pages {
        let batch = match api.list_stocks(page, per, None)? {
            Payload::NoContent => break,
            Payload::Json(Value::Array(items)) => items,
            Payload::Json(other) => {
                return Err(OpLabError::UnexpectedShape(format!(
                    "page {} of market/stocks/all is {} instead of an array",
                    page,
                    kind_of(&other)
                )))
            }
        };

        let fetched = batch.len();
        debug!(page, fetched, "universe page");
        rows.extend(batch);
        if fetched == 0 || fetched < per as usize {
            break;
        }
    }

    let total = rows.len();
    let kept = with_options_only(rows);
    info!(total, with_options = kept.len(), "universe loaded");
    Ok(kept)
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
