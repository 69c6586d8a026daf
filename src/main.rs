//! rpc-service: runs a single RPC service until SIGINT/SIGTERM.
//!
//! Serves two demo methods so a deployment can be smoke-tested:
//! - `POST /health.v1.Health/Check`: `{"status":"SERVING"}`
//! - `POST /echo.v1.Echo/Say`: echoes the JSON body back

use std::path::PathBuf;

use axum::routing::post;
use axum::Json;
use clap::Parser;
use serde_json::{json, Value};

use rpc_service::config::{resolve_config, ConfigOverrides};
use rpc_service::observability::{logging, metrics};
use rpc_service::{ServiceBuilder, TransportServer};

#[derive(Parser)]
#[command(name = "rpc-service")]
#[command(about = "Run an RPC service with graceful shutdown", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the service name.
    #[arg(short, long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Overrides are validated together with the file (or the defaults).
    let config = resolve_config(
        cli.config.as_deref(),
        ConfigOverrides {
            port: cli.port,
            name: cli.name,
        },
    )?;

    logging::init(&config.observability.log_filter)?;

    tracing::info!(
        service = %config.name,
        address = %config.socket_addr(),
        tls = config.tls.enabled,
        drain_timeout_secs = config.shutdown.drain_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let service_name = config.name.clone();
    let service = ServiceBuilder::from_config(&config)
        .register_handler(register_demo_methods)
        .on_shutdown(move || tracing::info!(service = %service_name, "Shutdown hook ran"))
        .build()
        .await?;

    // Bind failure is fatal: main returns the error and the process exits non-zero.
    let outcome = service.start_and_wait_on(config.socket_addr()).await?;

    tracing::info!(outcome = outcome.as_label(), "Shutdown complete");
    Ok(())
}

fn register_demo_methods(server: &mut TransportServer) {
    server
        .add_method(
            "/health.v1.Health/Check",
            post(|| async { Json(json!({ "status": "SERVING" })) }),
        )
        .add_method(
            "/echo.v1.Echo/Say",
            post(|Json(body): Json<Value>| async move { Json(body) }),
        );
}
