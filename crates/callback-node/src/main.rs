//! # Callback Node
//!
//! Entry point for the webhook verification endpoint.

use anyhow::Result;
use callback_node::{init_logging, json_logs_enabled, load_config, run, Args};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = |key: &str| std::env::var(key).ok();

    // Initialize logging
    init_logging(json_logs_enabled(&args, env))?;

    // Load configuration
    let config = load_config(&args, env)?;
    info!(
        addr = %config.http_addr(),
        plain = %config.routes.plain_path,
        encrypted = %config.routes.encrypted_path,
        verify_receive_id = config.credentials.verify_receive_id,
        "Configuration loaded"
    );

    run(config).await
}
