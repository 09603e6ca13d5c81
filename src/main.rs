//! kallm binary.
//!
//! Loads configuration from the environment, initializes logging, and
//! runs the proxy server. Exits 1 on invalid configuration or a fatal
//! server error.

use anyhow::Context;
use clap::Parser;
use kallm::{run_server, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("KALLM_COMMIT"),
    ", built: ",
    env!("KALLM_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "kallm",
    version,
    long_version = LONG_VERSION,
    about = "Semantic caching proxy for Chat-Completions-style LLM APIs"
)]
struct Cli {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(&config);

    tracing::info!(
        version = LONG_VERSION,
        port = config.port,
        similarity_threshold = config.similarity_threshold,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "starting kallm"
    );

    config.validate().context("invalid configuration")?;

    run_server(config).await
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kallm=info,tower_http=info"));

    if config.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(filter)
            .init();
    }
}
