//! # Black-Scholes Arguments
//!
//! The pricing endpoint takes a loose bag of named scalars. [`BsArgs`] keeps that
//! pass-through behaviour but only for the names the endpoint understands.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::OpLabError;
use crate::retrieve::descriptor::Scalar;

/// Parameters accepted by `market/options/bs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BsParam {
    /// Option ticker, lets the server fill in strike and due date.
    Symbol,
    /// Annual interest rate, in percent.
    Irate,
    /// `CALL` or `PUT`.
    Type,
    SpotPrice,
    Strike,
    Premium,
    /// Days to maturity.
    Dtm,
    /// Volatility, in percent.
    Vol,
    /// Expiration date, `YYYY-MM-DD`.
    DueDate,
    Amount,
}

impl BsParam {
    pub const ALL: [BsParam; 10] = [
        BsParam::Symbol,
        BsParam::Irate,
        BsParam::Type,
        BsParam::SpotPrice,
        BsParam::Strike,
        BsParam::Premium,
        BsParam::Dtm,
        BsParam::Vol,
        BsParam::DueDate,
        BsParam::Amount,
    ];

    /// Query-string name.
    pub fn name(self) -> &'static str {
        match self {
            BsParam::Symbol => "symbol",
            BsParam::Irate => "irate",
            BsParam::Type => "type",
            BsParam::SpotPrice => "spotprice",
            BsParam::Strike => "strike",
            BsParam::Premium => "premium",
            BsParam::Dtm => "dtm",
            BsParam::Vol => "vol",
            BsParam::DueDate => "duedate",
            BsParam::Amount => "amount",
        }
    }
}

impl fmt::Display for BsParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BsParam {
    type Err = OpLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BsParam::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| OpLabError::UnknownParameter(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Call => "CALL",
            OptionKind::Put => "PUT",
        }
    }
}

impl FromStr for OptionKind {
    type Err = OpLabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CALL" => Ok(OptionKind::Call),
            "PUT" => Ok(OptionKind::Put),
            _ => Err(OpLabError::UnknownParameter(s.to_string())),
        }
    }
}

impl From<OptionKind> for Scalar {
    fn from(kind: OptionKind) -> Self {
        Scalar::Text(kind.as_str().to_string())
    }
}

/// Whitelisted pricing arguments. Unset parameters are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BsArgs {
    values: BTreeMap<BsParam, Scalar>,
}

impl BsArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, param: BsParam, value: impl Into<Scalar>) -> Self {
        self.values.insert(param, value.into());
        self
    }

    /// Sets `param` when `value` is present and clears it otherwise.
    pub fn set_opt<V: Into<Scalar>>(mut self, param: BsParam, value: Option<V>) -> Self {
        match value {
            Some(v) => {
                self.values.insert(param, v.into());
            }
            None => {
                self.values.remove(&param);
            }
        }
        self
    }

    /// Name-based setter for pass-through callers such as the CLI.
    ///
    /// # Errors
    /// [`OpLabError::UnknownParameter`] when `name` is not whitelisted.
    pub fn set_named(self, name: &str, value: impl Into<Scalar>) -> Result<Self, OpLabError> {
        let param = name.parse::<BsParam>()?;
        Ok(self.set(param, value))
    }

    pub fn kind(self, kind: OptionKind) -> Self {
        self.set(BsParam::Type, kind)
    }

    pub fn get(&self, param: BsParam) -> Option<&Scalar> {
        self.values.get(&param)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameters in whitelist order.
    pub fn iter(&self) -> impl Iterator<Item = (BsParam, &Scalar)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}
