// ABOUTME: Server binary wiring configuration, database, and HTTP routes
// ABOUTME: Runs the tenant identity layer as a standalone axum service
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Tribunal Server Binary
//!
//! Starts the multi-tenant tribunal server with host-based tenant
//! resolution, per-tenant OAuth, and role synchronization.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tribunal_server::{
    config::ServerConfig,
    database_plugins::{factory::Database, DatabaseProvider},
    logging,
    resources::ServerResources,
    routes,
};

#[derive(Parser)]
#[command(name = "tribunal-server")]
#[command(about = "Tribunal - multi-tenant report review platform")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = tribunal_server::config::DatabaseUrl::parse_url(&database_url);
    }

    logging::init_from_env()?;

    info!("Starting Tribunal server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url.to_connection_string()).await?;
    info!(
        "Database initialized successfully: {}",
        database.backend_info()
    );

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, database)?);
    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("HTTP server listening on port {}", http_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolve when the process receives a termination signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install shutdown signal handler: {}", e);
    }
    info!("shutdown signal received");
}
