//! Terraform Provider for FortiManager
//!
//! This provider speaks a newline-delimited JSON rendition of the Terraform
//! plugin protocol and manages FortiGate device objects through the
//! FortiManager JSON-RPC API.

mod client;
mod config;
mod provider;
mod resources;
mod schema;
mod wire;

use clap::Parser;
use provider::FortiManagerProvider;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Terraform Provider for FortiManager
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-fortimanager")]
#[command(about = "Terraform provider for FortiManager managed FortiGate devices")]
struct Args {
    /// Enable debug logging
    #[arg(long, env = "FORTIMANAGER_PROVIDER_DEBUG")]
    debug: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the protocol
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.debug { "debug" } else { "info" }));
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }

    tracing::info!("Starting Terraform Provider for FortiManager");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    let provider = FortiManagerProvider::new()?;

    for line in stdin.lock().lines() {
        let input = match line {
            Ok(input) => input,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if input.trim().is_empty() {
            continue;
        }

        let response = provider.handle_request(&input);
        if let Err(e) = writeln!(stdout_lock, "{}", response).and_then(|_| stdout_lock.flush()) {
            tracing::error!("Failed to write response: {}", e);
            break;
        }
    }

    tracing::info!("Terraform Provider shutting down");
    Ok(())
}
