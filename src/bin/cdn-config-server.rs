// ABOUTME: Server binary for the CDN profile/parameter configuration API
// ABOUTME: Loads environment configuration, applies CLI overrides, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # CDN Config Server Binary
//!
//! Starts the `/api/3.0` configuration API over the configured association store.

use anyhow::{Context, Result};
use cdn_config_plane::{
    config::{DatabaseUrl, ServerConfig},
    logging, server,
};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cdn-config-server")]
#[command(about = "CDN configuration plane - profiles, parameters and conditional config delivery")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind address
    #[arg(long)]
    host: Option<String>,

    /// Override store location (`memory`, `sqlite::memory:`, `sqlite:<path>`)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http.port = http_port;
    }
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(url) = args.database_url {
        config.database.url = DatabaseUrl::parse_url(&url)
            .with_context(|| format!("Invalid --database-url value '{url}'"))?;
    }
    config.validate()?;

    info!("Starting CDN config server");
    info!("{}", config.summary());

    if let Err(e) = server::run(config).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
