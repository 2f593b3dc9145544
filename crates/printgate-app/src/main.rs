// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate: web front end for a CUPS print server.
//
// Entry point. Loads `.env`, initialises logging and services, then serves
// HTTP until Ctrl-C.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use printgate_app::{AppState, create_router};
use printgate_app::services::AppServices;
use printgate_core::GatewayConfig;
use printgate_core::error::{GatewayError, Result};

#[derive(Debug, Parser)]
#[command(name = "printgate", version, about = "Web print gateway for CUPS")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "printgate stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = GatewayConfig::from_env()?;

    tokio::fs::create_dir_all(&config.upload_dir).await.map_err(|e| {
        GatewayError::FileSystem(format!("create {}: {e}", config.upload_dir.display()))
    })?;

    let services = AppServices::init(config)?;
    let app = create_router(AppState::new(services)?);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %args.bind, "Printgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Printgate shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
