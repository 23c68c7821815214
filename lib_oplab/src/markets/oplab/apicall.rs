//! # OpLab API Call Client
//!
//! Resource operations over the shared [`ApiClient`]. Each method builds its
//! descriptor in [`super::endpoints`] and hands it to [`ApiClient::fetch`]; retry and
//! backoff live there and nowhere else.

use serde_json::Value;
use tracing::{debug, warn};

use super::bs::{BsArgs, BsParam};
use super::endpoints;
use crate::configs::settings::ClientOptions;
use crate::errors::Result;
use crate::retrieve::descriptor::Scalar;
use crate::retrieve::ky_http::{ApiClient, Payload};
use crate::retrieve::transport::{HttpTransport, Sleeper, ThreadSleeper, Transport};

/// # OpLab API Call Client
///
/// Stock, option-chain, strategy, pricing and interest-rate lookups for B3.
pub struct OpLabApi<T = HttpTransport, S = ThreadSleeper> {
    client: ApiClient<T, S>,
}

impl OpLabApi {
    /// Builds the production client; the token falls back to `OPLAB_ACCESS_TOKEN`.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Ok(Self::from_client(ApiClient::new(options)?))
    }
}

impl<T: Transport, S: Sleeper> OpLabApi<T, S> {
    pub fn from_client(client: ApiClient<T, S>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient<T, S> {
        &self.client
    }

    /// One page of the underlying universe.
    pub fn list_stocks(&self, page: u32, per: u32, financial_volume_start: Option<i64>) -> Result<Payload> {
        debug!(page, per, ?financial_volume_start, "list stocks");
        self.client.fetch(&endpoints::list_stocks(page, per, financial_volume_start))
    }

    /// Quote and metrics for one underlying. `with_financials` defaults to `"none"`.
    pub fn stock(&self, symbol: &str, with_financials: Option<&str>) -> Result<Payload> {
        self.client.fetch(&endpoints::stock(symbol, with_financials)?)
    }

    /// Full option chain of `underlying`.
    pub fn options(&self, underlying: &str) -> Result<Payload> {
        self.client.fetch(&endpoints::options(underlying)?)
    }

    pub fn option_details(&self, option_symbol: &str) -> Result<Payload> {
        self.client.fetch(&endpoints::option_details(option_symbol)?)
    }

    /// Covered-call candidates for `underlying`, as ranked by the server.
    pub fn covered_calls(&self, underlying: &str) -> Result<Payload> {
        self.client.fetch(&endpoints::covered_calls(underlying)?)
    }

    /// Theoretical price, greeks, IV and PoE computed remotely.
    pub fn black_scholes(&self, args: &BsArgs) -> Result<Payload> {
        self.client.fetch(&endpoints::black_scholes(args))
    }

    /// Benchmark rate; `None` means SELIC.
    pub fn interest_rate(&self, rate_id: Option<&str>) -> Result<Payload> {
        self.client.fetch(&endpoints::interest_rate(rate_id)?)
    }

    /// Fills `irate` from the current SELIC when it is unset or zero.
    ///
    /// A failed or valueless rate lookup leaves `args` untouched; pricing then runs
    /// with whatever rate the caller gave.
    pub fn with_benchmark_rate(&self, args: BsArgs) -> BsArgs {
        let unset = match args.get(BsParam::Irate) {
            None => true,
            Some(Scalar::Int(0)) => true,
            Some(Scalar::Float(x)) => *x == 0.0,
            Some(_) => false,
        };
        if !unset {
            return args;
        }
        match self.interest_rate(None) {
            Ok(payload) => match payload.as_json().and_then(|v| v.get("value")).and_then(Value::as_f64) {
                Some(rate) => {
                    debug!(rate, "irate taken from SELIC");
                    args.set(BsParam::Irate, rate)
                }
                None => {
                    warn!("SELIC response has no numeric value, irate left as given");
                    args
                }
            },
            Err(e) => {
                warn!(error = %e, "SELIC lookup failed, irate left as given");
                args
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OpLabError;
    use crate::markets::oplab::bs::{BsParam, OptionKind};
    use crate::retrieve::ky_http::testing::{RecordingSleeper, ScriptedTransport, Step};

    fn api(steps: Vec<Step>) -> OpLabApi<ScriptedTransport, RecordingSleeper> {
        let client = ApiClient::from_parts(
            "https://api.oplab.com.br/v3",
            ScriptedTransport::new(steps),
            RecordingSleeper::default(),
        )
        .unwrap();
        OpLabApi::from_client(client)
    }

    fn last_request(api: &OpLabApi<ScriptedTransport, RecordingSleeper>) -> (String, Vec<(String, String)>) {
        api.client().transport().seen.borrow().last().cloned().unwrap()
    }

    #[test]
    fn test_option_chain_hits_expected_url() {
        let api = api(vec![Step::Respond(200, r#"[{"symbol":"PETRJ365"}]"#)]);
        let payload = api.options("PETR4").unwrap();
        assert!(payload.as_json().unwrap().is_array());
        let (url, query) = last_request(&api);
        assert_eq!(url, "https://api.oplab.com.br/v3/market/options/PETR4");
        assert!(query.is_empty());
    }

    #[test]
    fn test_stock_sends_with_financials() {
        let api = api(vec![Step::Respond(200, r#"{"symbol":"VALE3"}"#)]);
        api.stock("VALE3", None).unwrap();
        let (url, query) = last_request(&api);
        assert_eq!(url, "https://api.oplab.com.br/v3/market/stocks/VALE3");
        assert_eq!(query, vec![("with_financials".to_string(), "none".to_string())]);
    }

    #[test]
    fn test_covered_calls_and_rate() {
        let api = api(vec![Step::Respond(200, "[]"), Step::Respond(200, r#"{"value":10.75}"#)]);
        api.covered_calls("BBAS3").unwrap();
        assert_eq!(
            last_request(&api).1,
            vec![("underlying".to_string(), "BBAS3".to_string())]
        );
        api.interest_rate(None).unwrap();
        assert!(last_request(&api).0.ends_with("/market/interest_rates/SELIC"));
    }

    #[test]
    fn test_black_scholes_forwards_whitelisted_args() {
        let api = api(vec![Step::Respond(200, r#"{"price":1.23,"delta":0.5}"#)]);
        let args = BsArgs::new().kind(OptionKind::Call).set(BsParam::Vol, 30.0);
        api.black_scholes(&args).unwrap();
        let (url, query) = last_request(&api);
        assert!(url.ends_with("/market/options/bs"));
        assert_eq!(
            query,
            vec![("type".to_string(), "CALL".to_string()), ("vol".to_string(), "30".to_string())]
        );
    }

    #[test]
    fn test_invalid_symbol_never_reaches_transport() {
        let api = api(vec![]);
        assert!(matches!(api.option_details("../admin"), Err(OpLabError::InvalidSymbol(_))));
        assert_eq!(api.client().transport().calls(), 0);
    }

    #[test]
    fn test_resource_calls_share_the_retry_loop() {
        let api = api(vec![Step::Respond(429, ""), Step::Respond(200, "")]);
        let payload = api.list_stocks(1, 200, Some(5_000_000)).unwrap();
        assert!(payload.is_no_content());
        assert_eq!(api.client().transport().calls(), 2);
        assert_eq!(api.client().sleeper().slept.borrow().len(), 1);
    }

    #[test]
    fn test_benchmark_rate_fills_missing_irate() {
        let api = api(vec![Step::Respond(200, r#"{"uid":"SELIC","value":10.75}"#)]);
        let args = api.with_benchmark_rate(BsArgs::new().set(BsParam::Irate, 0i64));
        assert_eq!(args.get(BsParam::Irate), Some(&Scalar::Float(10.75)));
        assert!(last_request(&api).0.ends_with("/market/interest_rates/SELIC"));
    }

    #[test]
    fn test_benchmark_rate_keeps_explicit_irate() {
        let api = api(vec![]);
        let args = api.with_benchmark_rate(BsArgs::new().set(BsParam::Irate, 13.25));
        assert_eq!(args.get(BsParam::Irate), Some(&Scalar::Float(13.25)));
        assert_eq!(api.client().transport().calls(), 0);
    }

    #[test]
    fn test_benchmark_rate_failure_leaves_args() {
        let api = api(vec![Step::Respond(500, "down")]);
        let args = api.with_benchmark_rate(BsArgs::new().kind(OptionKind::Put));
        assert!(args.get(BsParam::Irate).is_none());
        assert_eq!(args.get(BsParam::Type), Some(&Scalar::Text("PUT".into())));
    }
}
