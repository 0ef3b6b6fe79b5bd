// ABOUTME: Server binary for the Cube Gateway demo service
// ABOUTME: Loads configuration from the environment and serves until Ctrl-C or SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cube Gateway Contributors

//! # Cube Gateway Server
//!
//! Reads `PORT`, `DATABASE_URL` and `RUST_LOG`, registers the demo catalog and
//! listens on `0.0.0.0`. Exits with status 1 if anything fails before the
//! listener is up.

use std::process;

use cube_gateway::{
    config::environment::ServerConfig,
    errors::AppResult,
    logging::{init_logging, LoggingConfig},
    server::{GatewayServer, ServiceComponents},
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Failed to start server: {e}");
        eprintln!("Failed to start server: {e}");
        process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    init_logging(&LoggingConfig::from_env())?;

    let config = ServerConfig::from_env()?;
    info!(
        port = config.http_port,
        database = %config.database.url,
        "Starting Cube Gateway"
    );

    GatewayServer::start(config, ServiceComponents::demo()).await
}
