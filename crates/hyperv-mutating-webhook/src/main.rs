//! hyperv-mutating-webhook - assigns a Hyper-V runtime class to Windows pods

use std::sync::Arc;

use admission_core::{install_crypto_provider, serve, telemetry, ReviewHandler, ServeArgs};
use clap::Parser;
use tracing::info;

use hyperv_mutating_webhook::{resolve_runtime_class_name, HypervPolicy, DEFAULT_RUNTIME_CLASS_NAME};

/// Mutating admission webhook assigning a Hyper-V runtime class to pods
#[derive(Parser, Debug)]
#[command(name = "hyperv-mutating-webhook", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,

    /// Runtime class assigned to pods that do not set one
    #[arg(long, env = "RUNTIME_CLASS_NAME", default_value = DEFAULT_RUNTIME_CLASS_NAME)]
    runtime_class_name: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    install_crypto_provider()?;
    telemetry::init_tracing()?;

    let cli = Cli::parse();
    let config = cli.serve.server_config();
    let policy = HypervPolicy::new(resolve_runtime_class_name(Some(cli.runtime_class_name.as_str())));

    info!(
        addr = %config.addr,
        runtime_class = policy.runtime_class_name(),
        "Starting Hyper-V mutating webhook"
    );

    let handler = ReviewHandler::with_json_codec(Arc::new(policy));
    serve(config, handler).await?;
    Ok(())
}
