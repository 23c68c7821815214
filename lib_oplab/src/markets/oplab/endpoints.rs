//! # OpLab Endpoint Descriptors
//!
//! Pure builders: each function turns its arguments into the exact
//! [`RequestDescriptor`] the matching API call sends. No I/O happens here.

use super::bs::BsArgs;
use crate::errors::{OpLabError, Result};
use crate::retrieve::descriptor::RequestDescriptor;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 200;
pub const DEFAULT_WITH_FINANCIALS: &str = "none";
pub const DEFAULT_RATE_ID: &str = "SELIC";

const MAX_SYMBOL_LEN: usize = 32;

/// Checks a value that will be spliced into a URL path segment.
///
/// Accepts ASCII alphanumerics plus `_`, `-` and `.`, never `..`.
pub fn validate_symbol(symbol: &str) -> Result<&str> {
    let ok = !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && !symbol.contains("..")
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if ok {
        Ok(symbol)
    } else {
        Err(OpLabError::InvalidSymbol(symbol.to_string()))
    }
}

pub fn list_stocks(page: u32, per: u32, financial_volume_start: Option<i64>) -> RequestDescriptor {
    RequestDescriptor::new("market/stocks/all")
        .param("page", page)
        .param("per", per)
        .opt_param("financial_volume_start", financial_volume_start)
}

pub fn stock(symbol: &str, with_financials: Option<&str>) -> Result<RequestDescriptor> {
    let symbol = validate_symbol(symbol)?;
    Ok(RequestDescriptor::new(format!("market/stocks/{}", symbol))
        .param("with_financials", with_financials.unwrap_or(DEFAULT_WITH_FINANCIALS)))
}

pub fn options(underlying: &str) -> Result<RequestDescriptor> {
    let underlying = validate_symbol(underlying)?;
    Ok(RequestDescriptor::new(format!("market/options/{}", underlying)))
}

pub fn option_details(option_symbol: &str) -> Result<RequestDescriptor> {
    let option_symbol = validate_symbol(option_symbol)?;
    Ok(RequestDescriptor::new(format!("market/options/details/{}", option_symbol)))
}

pub fn covered_calls(underlying: &str) -> Result<RequestDescriptor> {
    let underlying = validate_symbol(underlying)?;
    Ok(RequestDescriptor::new("market/options/strategies/covered").param("underlying", underlying))
}

/// Pricing and greeks. Arguments are passed through verbatim, in whitelist order.
pub fn black_scholes(args: &BsArgs) -> RequestDescriptor {
    args.iter()
        .fold(RequestDescriptor::new("market/options/bs"), |d, (param, value)| {
            d.param(param.name(), value.clone())
        })
}

pub fn interest_rate(rate_id: Option<&str>) -> Result<RequestDescriptor> {
    let rate_id = validate_symbol(rate_id.unwrap_or(DEFAULT_RATE_ID))?;
    Ok(RequestDescriptor::new(format!("market/interest_rates/{}", rate_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::oplab::bs::{BsParam, OptionKind};
    use crate::retrieve::descriptor::Scalar;

    fn pairs(d: &RequestDescriptor) -> Vec<(String, String)> {
        d.query_pairs()
    }

    fn kv(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_list_stocks_defaults_and_filter() {
        let d = list_stocks(DEFAULT_PAGE, DEFAULT_PER_PAGE, None);
        assert_eq!(d.path, "market/stocks/all");
        assert_eq!(pairs(&d), vec![kv("page", "1"), kv("per", "200")]);

        let d = list_stocks(3, 50, Some(1_000_000));
        assert_eq!(
            pairs(&d),
            vec![kv("page", "3"), kv("per", "50"), kv("financial_volume_start", "1000000")]
        );

        let d = list_stocks(1, 200, Some(i64::MAX));
        assert_eq!(d.get("financial_volume_start"), Some(&Scalar::Int(i64::MAX)));
    }

    #[test]
    fn test_stock_defaults_to_no_financials() {
        let d = stock("VALE3", None).unwrap();
        assert_eq!(d.path, "market/stocks/VALE3");
        assert_eq!(pairs(&d), vec![kv("with_financials", "none")]);

        let d = stock("VALE3", Some("all")).unwrap();
        assert_eq!(d.get("with_financials"), Some(&Scalar::Text("all".into())));
    }

    #[test]
    fn test_option_chain_for_petr4() {
        let d = options("PETR4").unwrap();
        assert_eq!(d.path, "market/options/PETR4");
        assert!(d.params.is_empty());
    }

    #[test]
    fn test_option_details() {
        let d = option_details("PETRJ365").unwrap();
        assert_eq!(d.path, "market/options/details/PETRJ365");
        assert!(d.params.is_empty());
    }

    #[test]
    fn test_covered_calls_passes_underlying() {
        let d = covered_calls("ITUB4").unwrap();
        assert_eq!(d.path, "market/options/strategies/covered");
        assert_eq!(pairs(&d), vec![kv("underlying", "ITUB4")]);
    }

    #[test]
    fn test_black_scholes_passes_arguments_verbatim() {
        let args = BsArgs::new()
            .set(BsParam::Symbol, "PETRJ365")
            .kind(OptionKind::Call)
            .set(BsParam::SpotPrice, 36.5)
            .set(BsParam::Strike, 36.0)
            .set(BsParam::Dtm, 21i64);
        let d = black_scholes(&args);
        assert_eq!(d.path, "market/options/bs");
        assert_eq!(
            pairs(&d),
            vec![
                kv("symbol", "PETRJ365"),
                kv("type", "CALL"),
                kv("spotprice", "36.5"),
                kv("strike", "36"),
                kv("dtm", "21"),
            ]
        );
        assert!(black_scholes(&BsArgs::new()).params.is_empty());
    }

    #[test]
    fn test_interest_rate_default_is_selic() {
        assert_eq!(interest_rate(None).unwrap().path, "market/interest_rates/SELIC");
        assert_eq!(interest_rate(Some("CETIP")).unwrap().path, "market/interest_rates/CETIP");
    }

    #[test]
    fn test_symbols_that_would_escape_the_path_are_rejected() {
        let too_long = "A".repeat(33);
        for bad in ["", "..", "PETR4/../x", "a b", "PETR4?x=1", "%2F", too_long.as_str()] {
            assert!(matches!(options(bad), Err(OpLabError::InvalidSymbol(_))), "{bad:?}");
        }
        assert!(validate_symbol("BOVA11").is_ok());
        assert!(validate_symbol("BRK.B").is_ok());
    }
}
