//! imgshift server: HTTP image and document conversion service.
//!
//! Main entry point that loads configuration, initializes logging, and
//! starts the server.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use imgshift_core::config::{AppConfig, LoggingConfig};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "imgshift-server", version, about = "Image and document conversion service")]
struct Args {
    /// Directory holding `default.toml` and the environment overlays.
    #[arg(long, env = "IMGSHIFT_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment overlay to merge (`<config_dir>/<env>.toml`).
    #[arg(long, env = "IMGSHIFT_ENV", default_value = "development")]
    env: String,

    /// Probe the external tools, print a report, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config_dir, &args.env).with_context(|| {
        format!(
            "failed to load configuration from '{}' (env: {})",
            args.config_dir, args.env
        )
    })?;

    init_logging(&config.logging);

    if args.check {
        return check(&config);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %args.env,
        "Starting imgshift"
    );

    imgshift_api::run_server(config)
        .await
        .context("server exited with an error")
}

/// Print tool availability. Fails when a required tool is missing.
fn check(config: &AppConfig) -> anyhow::Result<()> {
    let mut lenient = config.tools.clone();
    lenient.require_all = false;

    let report = imgshift_api::check_tools(&lenient)?;
    for status in &report {
        let mark = if status.available { "ok" } else { "MISSING" };
        println!("{:<14} {:<16} {mark}", status.name, status.command);
    }

    let missing = report.iter().filter(|s| !s.available).count();
    if config.tools.require_all && missing > 0 {
        anyhow::bail!("{missing} required tool(s) not found");
    }
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
