//! # Callback Node
//!
//! Process wiring for the callback gateway.
//!
//! ## Startup Sequence
//!
//! 1. Parse flags
//! 2. Install logging (`RUST_LOG`, optional JSON output)
//! 3. Load configuration: defaults, `--config` file, `CB_*` environment, flags
//! 4. Validate, then bind and serve
//! 5. Drain in-flight requests on Ctrl+C

use std::path::PathBuf;

use anyhow::{Context, Result};
use callback_gateway::{CallbackGatewayService, GatewayConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable switching logs to JSON.
pub const ENV_JSON_LOGS: &str = "CB_JSON_LOGS";

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Callback Node: webhook verification endpoint
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "callback-node")]
#[command(about = "Verifies and decrypts messaging platform callbacks")]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// HTTP port (overrides file and environment)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Build the effective configuration.
///
/// `lookup` resolves environment variables.
pub fn load_config<F>(args: &Args, lookup: F) -> Result<GatewayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    config
        .apply_env(&lookup)
        .context("invalid environment override")?;

    if let Some(port) = args.port {
        config.http.port = port;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Whether JSON logs were requested by flag or environment.
pub fn json_logs_enabled<F>(args: &Args, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    args.json_logs
        || lookup(ENV_JSON_LOGS)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
}

/// Install the global subscriber.
pub fn init_logging(json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("invalid log filter")?;

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .context("failed to install subscriber")?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("failed to install subscriber")?;
    }

    Ok(())
}

/// Serve until Ctrl+C or a server failure.
pub async fn run(config: GatewayConfig) -> Result<()> {
    let mut service = CallbackGatewayService::new(config).context("failed to build gateway")?;
    let addr = service.start().await?;

    info!(%addr, "Callback node is running. Press Ctrl+C to stop.");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C");
        }
        result = service.wait() => {
            return result.context("gateway exited unexpectedly");
        }
    }

    // Graceful shutdown
    service.shutdown();
    service.wait().await?;
    Ok(())
}
