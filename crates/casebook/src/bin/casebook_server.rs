//! Casebook REST Server
//!
//! HTTP API for registering diagnostic cases and searching them.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use casebook::config::ServerConfig;
use casebook::server::startup::start_server;

#[derive(Parser)]
#[command(name = "casebook_server")]
#[command(about = "Casebook REST API Server")]
#[command(version)]
struct Args {
  #[command(flatten)]
  server: ServerConfig,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("debug,hyper=info,lance=warn,lance_datafusion=warn,datafusion=warn")
  } else {
    EnvFilter::new(
      "casebook=info,bentley=info,tower_http=info,lance=error,lance_datafusion=error,datafusion=error,warn",
    )
  };

  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  bentley::info!("Starting Casebook REST Server v{}", env!("CARGO_PKG_VERSION"));
  bentley::info!("Binding to address: {}", args.server.bind);

  start_server(args.server).await
}
