// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use cmd::{AppConfig, load_app_config};
use diagnostics::*;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "volupload")]
struct Cli {
    /// YAML configuration file; the environment is read when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_diagnostics();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            debug!("Loading configuration from: {path}", path: path.display().to_string());
            load_app_config(path)
                .with_context(|| format!("Failed to load configuration from: {}", path.display()))?
        }
        None => AppConfig::from_env().context("Failed to read configuration from environment")?,
    };
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    cmd::web::serve(config).await
}
