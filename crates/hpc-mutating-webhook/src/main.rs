//! hpc-mutating-webhook - rewrites agnhost containers in Windows host-process pods

use std::sync::Arc;

use admission_core::{install_crypto_provider, serve, telemetry, ReviewHandler, ServeArgs};
use clap::Parser;
use tracing::info;

use hpc_mutating_webhook::HpcPolicy;

/// Mutating admission webhook for HPC containers
#[derive(Parser, Debug)]
#[command(name = "hpc-mutating-webhook", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_crypto_provider()?;
    telemetry::init_tracing()?;

    let cli = Cli::parse();
    let config = cli.serve.server_config();

    info!(addr = %config.addr, "Starting HPC mutating webhook");

    let handler = ReviewHandler::with_json_codec(Arc::new(HpcPolicy));
    serve(config, handler).await?;
    Ok(())
}
