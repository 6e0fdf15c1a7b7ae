//! haprobe CLI - diagnostic WebSocket probe.
//!
//! This is the binary entry point. See the `haprobe` library for the
//! transport session, protocol state machine, and event demultiplexer.

use std::time::Duration;

use clap::Parser;
use haprobe::{probe, ProbeConfig};
use mimalloc::MiMalloc;

/// Global allocator configured per M-MIMALLOC-APPS guideline.
/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// CLI
#[derive(Parser, Debug)]
#[command(name = "haprobe")]
#[command(version)]
#[command(about = "Probe a Home Assistant-style WebSocket API and echo all traffic")]
struct Cli {
    /// WebSocket endpoint URL (http/https URLs are converted)
    #[arg(long)]
    url: Option<String>,

    /// Long-lived access token (or set HAPROBE_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Entity to subscribe to and query
    #[arg(long)]
    entity: Option<String>,

    /// End the run after this many received messages
    #[arg(long)]
    max_events: Option<u32>,

    /// Per-receive timeout in seconds
    #[arg(long)]
    timeout: Option<f64>,
}

/// Merge CLI flags over env-overridden defaults.
///
/// Returns `Err` with a usage message when a flag value is unusable; the
/// caller maps that to exit code 2.
fn build_config(cli: Cli) -> Result<ProbeConfig, String> {
    let mut config = ProbeConfig::load();

    if let Some(url) = cli.url {
        config.url = url;
    }
    if let Some(token) = cli.token {
        config.token = token;
    }
    if let Some(entity) = cli.entity {
        config.entity_id = entity;
    }
    if let Some(max_events) = cli.max_events {
        config.max_events = max_events;
    }
    if let Some(timeout) = cli.timeout {
        if !timeout.is_finite() || timeout <= 0.0 {
            return Err(format!("--timeout must be a positive number of seconds, got {timeout}"));
        }
        config.receive_timeout = Duration::from_secs_f64(timeout);
    }

    if !config.has_token() {
        return Err("an access token is required (--token or HAPROBE_TOKEN)".to_string());
    }

    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match build_config(cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(2);
        }
    };

    if let Err(err) = probe::run(&config).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
