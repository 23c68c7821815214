//! # OpLab Command-Line Client
//!
//! Thin front end over `lib_oplab`: every subcommand maps to one resource
//! operation and prints the payload as pretty JSON on stdout. Logs go to stderr
//! (and optionally to a daily-rolling JSON file), so stdout stays pipeable.
//!
//! Settings come from flags, then environment variables, then a `.env` file in the
//! working directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lib_oplab::markets::oplab::endpoints::{DEFAULT_PAGE, DEFAULT_PER_PAGE, DEFAULT_WITH_FINANCIALS};
use lib_oplab::markets::oplab::rows::{
    CHAIN_SORT_KEYS, COVERED_SORT_KEYS, ChainFilter, CoveredCallMetrics, UniverseFilter, sort_rows,
};
use lib_oplab::markets::oplab::universe::{DEFAULT_MAX_PAGES, load_universe};
use lib_oplab::{BsArgs, ClientOptions, OpLabApi, OptionKind, Payload, Scalar};
use serde_json::Value;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// # Application Configuration
///
/// Parsed from command-line arguments with environment-variable fallbacks.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Query B3 stocks, option chains, covered calls and Black-Scholes pricing through OpLab v3."
)]
struct Cli {
    #[clap(long, env = "OPLAB_ACCESS_TOKEN", hide_env_values = true, help = "OpLab access token.")]
    token: Option<String>,

    #[clap(long, env = "OPLAB_BASE_URL", help = "API root, defaults to https://api.oplab.com.br/v3.")]
    base_url: Option<String>,

    #[clap(long, env = "OPLAB_TIMEOUT_SECS", help = "Per-request timeout in seconds (default 20).")]
    timeout_secs: Option<u64>,

    #[clap(long, env = "OPLAB_LOG_LEVEL", default_value = "info", help = "Logging level or EnvFilter directive.")]
    log_level: String,

    #[clap(long, env = "OPLAB_LOG_DIR", help = "Also write JSON logs to a daily file in this directory.")]
    log_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One page of the underlying universe.
    Stocks {
        #[clap(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[clap(long, default_value_t = DEFAULT_PER_PAGE)]
        per: u32,
        #[clap(long, help = "Server-side minimum financial volume.")]
        financial_volume_start: Option<i64>,
    },
    /// Quote and metrics of one underlying.
    Stock {
        symbol: String,
        #[clap(long, default_value = DEFAULT_WITH_FINANCIALS)]
        with_financials: String,
    },
    /// Option chain of an underlying, filtered client-side.
    Options {
        underlying: String,
        #[clap(long = "kind", value_delimiter = ',', help = "Keep only these types: call, put.")]
        kinds: Vec<OptionKind>,
        #[clap(long, help = "Maximum days to maturity.")]
        max_dtm: Option<f64>,
        #[clap(long, default_value_t = 0.0)]
        min_volume: f64,
        #[clap(long, default_value_t = 0.0, help = "Minimum implied volatility, in percent.")]
        min_iv: f64,
        #[clap(long, value_delimiter = ',', help = "Sort by these fields (comma separated), default due-date,type,strike.")]
        sort_by: Vec<String>,
        #[clap(long, help = "Sort descending.")]
        desc: bool,
    },
    /// Details of one option contract.
    #[clap(name = "option")]
    OptionDetails { symbol: String },
    /// Covered-call opportunities with premium, upside and potential return in percent.
    Covered {
        underlying: String,
        #[clap(
            long,
            value_delimiter = ',',
            help = "Sort by these fields (comma separated), default potential_return_pct,premium_pct."
        )]
        sort_by: Vec<String>,
        #[clap(long, help = "Sort descending.")]
        desc: bool,
    },
    /// Remote Black-Scholes price and greeks, e.g. `--arg symbol=PETRJ365 --arg vol=32.5`.
    ///
    /// A missing or zero `irate` is filled from the current SELIC.
    Bs {
        #[clap(long = "arg", value_parser = parse_pair, help = "name=value, repeatable.")]
        args: Vec<(String, String)>,
        #[clap(long, help = "Do not fill a missing irate from SELIC.")]
        no_selic: bool,
    },
    /// Benchmark interest rate (SELIC by default).
    Rate { rate_id: Option<String> },
    /// All underlyings with listed options, paged and filtered client-side.
    Universe {
        #[clap(long, default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: u32,
        #[clap(long, default_value_t = DEFAULT_PER_PAGE)]
        per: u32,
        #[clap(long, help = "Keep symbols containing this text (case-insensitive).")]
        query: Option<String>,
        #[clap(long, default_value_t = 0.0)]
        min_financial_volume: f64,
        #[clap(long, help = "Print at most this many rows.")]
        limit: Option<usize>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected name=value, got {:?}", raw)),
    }
}

/// Integers stay integers, decimals become floats, anything else is sent as text.
fn infer_scalar(raw: &str) -> Scalar {
    if let Ok(i) = raw.parse::<i64>() {
        Scalar::Int(i)
    } else if let Ok(x) = raw.parse::<f64>() {
        Scalar::Float(x)
    } else {
        Scalar::Text(raw.to_string())
    }
}

fn bs_args(pairs: &[(String, String)]) -> Result<BsArgs> {
    if pairs.is_empty() {
        bail!("bs needs at least one --arg name=value");
    }
    pairs.iter().try_fold(BsArgs::new(), |args, (k, v)| {
        args.set_named(k, infer_scalar(v))
            .with_context(|| format!("rejected pricing argument {:?}", k))
    })
}

fn init_logging(log_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("invalid log level {:?}", log_level))?;

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "oplab");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    debug!(log_level, "logging initialized");
    Ok(guard)
}

/// Sorts array payloads by `keys`, or by `default_keys` when none are given.
fn sorted(payload: Payload, keys: &[String], default_keys: &[&str], desc: bool) -> Payload {
    let keys: Vec<&str> = if keys.is_empty() {
        default_keys.to_vec()
    } else {
        keys.iter().map(String::as_str).collect()
    };
    match payload {
        Payload::Json(Value::Array(mut rows)) if !keys.is_empty() => {
            sort_rows(&mut rows, &keys, !desc);
            Payload::Json(Value::Array(rows))
        }
        other => other,
    }
}

/// Applies `f` to the rows of an array payload; anything else passes through.
fn map_rows(payload: Payload, f: impl FnOnce(Vec<Value>) -> Vec<Value>) -> Payload {
    match payload {
        Payload::Json(Value::Array(rows)) => Payload::Json(Value::Array(f(rows))),
        other => other,
    }
}

fn with_metrics(mut rows: Vec<Value>) -> Vec<Value> {
    CoveredCallMetrics::annotate(&mut rows);
    rows
}

fn print_payload(payload: &Payload) -> Result<()> {
    if payload.is_no_content() {
        info!("server returned no content");
    }
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let options = ClientOptions {
        token: cli.token,
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
    };
    let api = OpLabApi::new(&options).context("failed to configure the OpLab client")?;

    let payload = match cli.command {
        Command::Stocks { page, per, financial_volume_start } => api.list_stocks(page, per, financial_volume_start)?,
        Command::Stock { symbol, with_financials } => api.stock(&symbol, Some(with_financials.as_str()))?,
        Command::Options { underlying, kinds, max_dtm, min_volume, min_iv, sort_by, desc } => {
            let filter = ChainFilter {
                kinds,
                max_days_to_maturity: max_dtm,
                min_volume,
                min_iv_percent: min_iv,
            };
            let chain = map_rows(api.options(&underlying)?, |rows| filter.apply(rows));
            sorted(chain, &sort_by, &CHAIN_SORT_KEYS, desc)
        }
        Command::OptionDetails { symbol } => api.option_details(&symbol)?,
        Command::Covered { underlying, sort_by, desc } => {
            let covered = map_rows(api.covered_calls(&underlying)?, with_metrics);
            sorted(covered, &sort_by, &COVERED_SORT_KEYS, desc)
        }
        Command::Bs { args, no_selic } => {
            let args = bs_args(&args)?;
            let args = if no_selic { args } else { api.with_benchmark_rate(args) };
            api.black_scholes(&args)?
        }
        Command::Rate { rate_id } => api.interest_rate(rate_id.as_deref())?,
        Command::Universe { max_pages, per, query, min_financial_volume, limit } => {
            let rows = load_universe(&api, max_pages, per)?;
            let filter = UniverseFilter { query, min_financial_volume };
            let mut rows = filter.apply(rows);
            if let Some(limit) = limit {
                rows.truncate(limit);
            }
            Payload::Json(Value::Array(rows))
        }
    };

    print_payload(&payload)
}

fn main() -> Result<()> {
    // A missing .env file is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_level, cli.log_dir.as_deref())?;
    run(cli)
}
