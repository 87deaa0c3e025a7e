// ABOUTME: Server binary for the Level Up Fitness progression API
// ABOUTME: Loads configuration, initializes logging and storage, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Level Up Fitness Server Binary

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use level_up_fitness::{
    config::ServerConfig, logging, resources::ServerResources, server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "level-up-server")]
#[command(about = "Level Up Fitness - gamified progression ledger API")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    info!("{}", config.summary());

    let port = config.http_port;
    let resources = Arc::new(ServerResources::from_config(config).await?);
    resources.bootstrap_admin().await?;

    info!("Ready to level up on port {port}");
    if let Err(e) = server::serve(resources, port).await {
        error!("Server error: {e}");
        return Err(e.into());
    }
    Ok(())
}
