//! OhMyBank API server entry point.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ohmybank::{api, Config, Dataset, Server};

/// Read-only API over the OhMyBank user and activity datasets.
#[derive(Parser, Debug)]
#[command(name = "ohmybank")]
#[command(version)]
struct Args {
    /// Port to listen on [env: PORT, default: 3000].
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind [env: LISTEN_HOST, default: 0.0.0.0].
    #[arg(long)]
    host: Option<IpAddr>,

    /// Users dataset, a JSON array of objects [env: USERS_FILE].
    #[arg(long)]
    users: Option<PathBuf>,

    /// Activities dataset, a JSON array of objects with `user_id` [env: ACTIVITIES_FILE].
    #[arg(long)]
    activities: Option<PathBuf>,

    /// Enable debug logging, including one line per request.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.listen_host = host;
    }
    if let Some(users) = args.users {
        config.users_file = users;
    }
    if let Some(activities) = args.activities {
        config.activities_file = activities;
    }

    let filter = if args.verbose {
        EnvFilter::new("ohmybank=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // The server never starts on a partial dataset.
    let dataset = Dataset::load(&config.users_file, &config.activities_file).map_err(|e| {
        error!("failed to load dataset: {e}");
        e
    })?;

    info!(addr = %config.socket_addr(), "starting OhMyBank API");

    Server::bind(config.socket_addr())
        .serve(api::router(dataset))
        .await?;

    Ok(())
}
