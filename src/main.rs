//! CLI entry point for the bus stop info service.
//!
//! `serve` runs the HTTP API; `lookup` performs a single aggregation and
//! prints the JSON that the API would return.

use anyhow::Result;
use bus_stop_info::{
    config::AggregatorConfig,
    infra::baseride::DEFAULT_BASE_URL,
    output::{print_pretty, write_json},
    server::{self, AppState},
};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bus_stop_info")]
#[command(about = "Real-time bus arrival estimates for a stop", long_about = None)]
struct Cli {
    #[command(flatten)]
    upstream: UpstreamArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct UpstreamArgs {
    /// Base URL of the transit data provider
    #[arg(long, env = "UPSTREAM_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    upstream_base_url: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Connect timeout for upstream requests, in seconds
    #[arg(long, env = "UPSTREAM_CONNECT_TIMEOUT_SECS", default_value_t = 10, global = true)]
    connect_timeout_secs: u64,

    /// Maximum route variant fetches in flight per lookup (1 = sequential)
    #[arg(long, env = "ROUTE_FETCH_CONCURRENCY", default_value_t = 4, global = true)]
    route_fetch_concurrency: usize,
}

impl From<UpstreamArgs> for AggregatorConfig {
    fn from(args: UpstreamArgs) -> Self {
        Self {
            upstream_base_url: args.upstream_base_url,
            timeout: Duration::from_secs(args.timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
            route_fetch_concurrency: args.route_fetch_concurrency,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 10000)]
        port: u16,
    },
    /// Aggregate a single stop and print the JSON response
    Lookup {
        /// Stop ID to look up
        #[arg(value_name = "STOP_ID")]
        stop_id: String,

        /// Indent the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_logging()?;

    let cli = Cli::parse();
    let config = AggregatorConfig::from(cli.upstream);
    info!(
        upstream = %config.upstream_base_url,
        timeout_secs = config.timeout.as_secs(),
        route_fetch_concurrency = config.route_fetch_concurrency,
        "Configuration loaded"
    );
    let aggregator = config.build_aggregator()?;

    match cli.command {
        Commands::Serve { bind, port } => {
            let listener = TcpListener::bind((bind.as_str(), port)).await?;
            server::serve(listener, AppState::new(aggregator)).await?;
        }
        Commands::Lookup { stop_id, pretty } => {
            let info = aggregator.stop_info(&stop_id).await;
            print_pretty(&info);
            write_json(std::io::stdout().lock(), &info, pretty)?;
        }
    }

    Ok(())
}

/// Colored stderr output plus a JSON rolling log file.
///
/// The returned guard must stay alive for the file writer to flush.
fn init_logging() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bus_stop_info.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bus_stop_info.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}
