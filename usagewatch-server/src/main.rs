// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! usagewatch - broadband and mobile data usage over HTTP.
//!
//! Polls the iiNet toolbox feed and the My Vodafone portal on a tick
//! schedule and serves both as one JSON document on `GET /`.
//!
//! # Examples
//!
//! ```bash
//! # Credentials come from the environment
//! export IINET_USERNAME=... IINET_PASSWORD=...
//! export VODAFONE_MOBILE_NUMBER=... VODAFONE_PASSWORD=...
//!
//! # Serve on the default port (3000)
//! usagewatch
//!
//! # Custom port, fixed refresh schedule, debug logging
//! usagewatch --port 8080 --policy fixed --verbose
//! ```

mod refresh;
mod server;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use usagewatch_core::ProviderKind;
use usagewatch_fetch::{FetchContext, HttpClient};
use usagewatch_providers::ProviderRegistry;
use usagewatch_store::{Config, RefreshCadence, RefreshPolicy, UsageStore};

use refresh::Refresher;
use server::AppState;

// ============================================================================
// CLI Definition
// ============================================================================

/// usagewatch - broadband and mobile data usage over HTTP.
#[derive(Parser)]
#[command(name = "usagewatch")]
#[command(about = "Serves iiNet and Vodafone data usage as JSON")]
#[command(long_about = r"
usagewatch polls provider accounts and serves the latest usage on GET /.

Environment:
  IINET_USERNAME, IINET_PASSWORD               iiNet toolbox login
  VODAFONE_MOBILE_NUMBER, VODAFONE_PASSWORD    My Vodafone login
  PORT              listen port (default 3000)
  VERSION           release string echoed in responses
  REFRESH_POLICY    adaptive (default) or fixed
  REFRESH_TICK_SECS scheduler tick (default 60)
  RUST_LOG          log filter (default usagewatch=info)
")]
#[command(version)]
pub struct Cli {
    /// Listen port (overrides PORT).
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Refresh policy (overrides REFRESH_POLICY).
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Verbose output (debug logging, overrides RUST_LOG).
    #[arg(long, short)]
    pub verbose: bool,
}

/// Refresh policy options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Back off when idle, refresh sooner while being watched.
    Adaptive,
    /// Refresh on a fixed schedule.
    Fixed,
}

impl From<PolicyArg> for RefreshPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Adaptive => RefreshPolicy::Adaptive,
            PolicyArg::Fixed => RefreshPolicy::Fixed,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("usagewatch=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("usagewatch=info,warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(policy) = cli.policy {
        config.policy = policy.into();
    }

    info!(
        version = %config.version,
        port = config.port,
        policy = %config.policy,
        "Starting usagewatch"
    );

    let http = HttpClient::new()?.allow_domains(ProviderRegistry::allowed_domains())?;
    let ctx = Arc::new(FetchContext::builder().http(Arc::new(http)).build()?);

    let store = UsageStore::new();
    let cadence = RefreshCadence::new(config.policy);

    let refreshers = ProviderKind::all()
        .iter()
        .map(|kind| {
            let strategy = ProviderRegistry::strategy(*kind, config.credentials(*kind).clone())
                .with_context(|| format!("no strategy registered for {kind}"))?;
            Ok(Refresher::new(strategy, ctx.clone(), store.clone(), cadence.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    for refresher in &refreshers {
        refresher.initial_refresh().await;
    }

    let tasks: Vec<_> = refreshers
        .into_iter()
        .map(|refresher| refresher.spawn(config.tick))
        .collect();

    let app = server::router(AppState::new(store, cadence, config.version.clone()));
    let result = server::serve(config.port, app).await;

    for task in tasks {
        task.abort();
    }
    info!("usagewatch stopped");

    result
}
