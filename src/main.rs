use std::path::PathBuf;

use clap::Parser;

use zint_gateway::renderer::{GatewayConfig, RendererState, resolve_zint_path};
use zint_gateway::server;

/// HTTP gateway for single and batch barcode generation via the zint CLI
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Host to bind the server
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind the server
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Path to the zint executable (default: search PATH, then /usr/bin/zint)
    #[arg(long)]
    zint_path: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = GatewayConfig {
        host: args.host,
        port: args.port,
        zint_path: resolve_zint_path(args.zint_path),
    };
    let state = RendererState::new(&config);
    actix_web::rt::System::new().block_on(server::startup(config, state))?;
    Ok(())
}
