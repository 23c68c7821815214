//! Filtering, sorting and derived columns for tabular JSON rows (arrays of objects).

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::bs::OptionKind;

/// Default ordering of an option chain: expiry, then type, then strike.
pub const CHAIN_SORT_KEYS: [&str; 3] = ["due-date", "type", "strike"];
/// Default ranking of covered-call candidates.
pub const COVERED_SORT_KEYS: [&str; 2] = ["potential_return_pct", "premium_pct"];

/// Client-side filter over the underlying universe.
#[derive(Debug, Clone, Default)]
pub struct UniverseFilter {
    /// Case-insensitive substring the `symbol` must contain.
    pub query: Option<String>,
    /// Minimum `financial_volume`; zero disables the check.
    pub min_financial_volume: f64,
}

impl UniverseFilter {
    pub fn matches(&self, row: &Value) -> bool {
        if self.min_financial_volume > 0.0 {
            let volume = row.get("financial_volume").and_then(Value::as_f64).unwrap_or(0.0);
            if volume < self.min_financial_volume {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => row
                .get("symbol")
                .and_then(Value::as_str)
                .map(|s| s.to_uppercase().contains(&q.to_uppercase()))
                .unwrap_or(false),
            None => true,
        }
    }

    pub fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Client-side filter over an option chain.
///
/// Each check only runs when at least one row carries its column. Within an active
/// check a missing value counts as 9999 days to maturity, zero volume and zero IV,
/// and a missing type never matches.
#[derive(Debug, Clone, Default)]
pub struct ChainFilter {
    /// Accepted option types; empty accepts both.
    pub kinds: Vec<OptionKind>,
    pub max_days_to_maturity: Option<f64>,
    pub min_volume: f64,
    /// Minimum implied volatility in percent. Rows carry it as a fraction.
    pub min_iv_percent: f64,
}

impl ChainFilter {
    pub fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        let has = |key: &str| rows.iter().any(|r| r.get(key).is_some());
        let check_kind = !self.kinds.is_empty() && has("type");
        let check_dtm = self.max_days_to_maturity.is_some() && has("days-to-maturity");
        let check_volume = has("volume");
        let check_iv = has("volatility");

        let number = |row: &Value, key: &str, missing: f64| row.get(key).and_then(Value::as_f64).unwrap_or(missing);

        rows.into_iter()
            .filter(|row| {
                if check_kind {
                    let kind = row.get("type").and_then(Value::as_str).unwrap_or_default();
                    if !self.kinds.iter().any(|k| k.as_str().eq_ignore_ascii_case(kind)) {
                        return false;
                    }
                }
                if let Some(max) = self.max_days_to_maturity.filter(|_| check_dtm) {
                    if number(row, "days-to-maturity", 9999.0) > max {
                        return false;
                    }
                }
                if check_volume && number(row, "volume", 0.0) < self.min_volume {
                    return false;
                }
                !(check_iv && number(row, "volatility", 0.0) < self.min_iv_percent / 100.0)
            })
            .collect()
    }
}

/// Return figures of a covered call, all in percent of the spot price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoveredCallMetrics {
    /// Bid over spot.
    pub premium_pct: f64,
    /// Strike over spot; negative when the call is in the money.
    pub upside_pct: f64,
    /// Premium plus the non-negative part of the upside.
    pub potential_return_pct: f64,
}

impl CoveredCallMetrics {
    /// Needs numeric `bid`, `spotprice` and `strike`, with a positive spot.
    pub fn from_row(row: &Value) -> Option<Self> {
        let field = |key: &str| row.get(key).and_then(Value::as_f64);
        let (bid, spot, strike) = (field("bid")?, field("spotprice")?, field("strike")?);
        if spot <= 0.0 {
            return None;
        }
        let premium_pct = bid / spot * 100.0;
        let upside_pct = (strike - spot) / spot * 100.0;
        Some(Self {
            premium_pct,
            upside_pct,
            potential_return_pct: premium_pct + upside_pct.max(0.0),
        })
    }

    fn write_into(self, row: &mut Map<String, Value>) {
        row.insert("premium_pct".into(), Value::from(self.premium_pct));
        row.insert("upside_pct".into(), Value::from(self.upside_pct));
        row.insert("potential_return_pct".into(), Value::from(self.potential_return_pct));
    }

    /// Adds the three metric columns to every row they can be computed for.
    pub fn annotate(rows: &mut [Value]) {
        for row in rows.iter_mut() {
            if let Some(metrics) = Self::from_row(row) {
                if let Value::Object(map) = row {
                    metrics.write_into(map);
                }
            }
        }
    }
}

/// Keeps rows flagged `has_options == true`, but only when some row carries the flag.
pub fn with_options_only(rows: Vec<Value>) -> Vec<Value> {
    if !rows.iter().any(|r| r.get("has_options").is_some()) {
        return rows;
    }
    rows.into_iter()
        .filter(|r| r.get("has_options") == Some(&Value::Bool(true)))
        .collect()
}

/// Stable sort by the given keys, ignoring keys that no row has.
///
/// Within a key, numbers come before strings and everything else (missing, null,
/// nested) comes last regardless of direction. `ascending` only flips the order
/// inside the number and string groups.
pub fn sort_rows(rows: &mut [Value], keys: &[&str], ascending: bool) {
    let present: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|k| rows.iter().any(|r| r.get(*k).is_some()))
        .collect();
    if present.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        present
            .iter()
            .map(|k| compare_cells(a.get(*k), b.get(*k), ascending))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    let (a, b) = (Cell::of(a), Cell::of(b));
    a.rank().cmp(&b.rank()).then_with(|| {
        let within = match (a, b) {
            (Cell::Num(x), Cell::Num(y)) => x.total_cmp(&y),
            (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        };
        if ascending {
            within
        } else {
            within.reverse()
        }
    })
}

#[derive(Clone, Copy)]
enum Cell<'a> {
    Num(f64),
    Text(&'a str),
    Other,
}

impl<'a> Cell<'a> {
    fn of(v: Option<&'a Value>) -> Self {
        match v {
            Some(Value::Number(n)) => n.as_f64().map_or(Cell::Other, Cell::Num),
            Some(Value::String(s)) => Cell::Text(s),
            _ => Cell::Other,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Cell::Num(_) => 0,
            Cell::Text(_) => 1,
            Cell::Other => 2,
        }
    }
}
