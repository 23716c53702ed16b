// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/seismo-rs

//! Seismo - accelerometer seismometer
//!
//! Samples `termux-sensor` (or a simulated accelerometer in demo mode), keeps a
//! sliding window of readings in `data/seismo.json`, and serves the window at
//! `/api/data` and as a live trace at `/`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use seismo::{core::shutdown_signal, Config, Engine, VERSION};

/// Seismo - accelerometer seismometer
#[derive(Parser, Debug)]
#[command(name = "seismo")]
#[command(author = "Seismo Project")]
#[command(version = VERSION)]
#[command(about = "Samples a motion sensor and serves a windowed seismometer trace")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with a simulated accelerometer
    #[arg(long)]
    demo: bool,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// History window in minutes
    #[arg(long)]
    history_minutes: Option<u64>,

    /// Pause between samples in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// History file path
    #[arg(long)]
    data_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let directives = log_directives(&args, std::env::var("RUST_LOG").ok(), &config);
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {:?}", directives))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Seismo v{}", VERSION);
    config.apply_env();

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(minutes) = args.history_minutes {
        config.storage.history_minutes = minutes;
    }
    if let Some(ms) = args.interval_ms {
        config.sensor.interval_ms = ms;
    }
    if let Some(path) = args.data_file {
        config.storage.path = path;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);
    info!(
        "Sampling every {} ms, keeping {} min in {:?}",
        config.sensor.interval_ms, config.storage.history_minutes, config.storage.path
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let engine = Engine::new(config)?;
        engine.run(shutdown_signal()).await
    })?;

    info!("Seismo shutdown complete");
    Ok(())
}

/// `--trace` and `--debug` win over `RUST_LOG`, which wins over `log_level`
fn log_directives(args: &Args, env: Option<String>, config: &Config) -> String {
    if args.trace {
        Level::TRACE.as_str().to_lowercase()
    } else if args.debug {
        Level::DEBUG.as_str().to_lowercase()
    } else {
        env.filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| config.log_level.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_precedence() {
        let mut config = Config::default();
        config.log_level = "warn".into();

        let plain = Args::parse_from(["seismo"]);
        assert_eq!(log_directives(&plain, None, &config), "warn");
        assert_eq!(log_directives(&plain, Some("".into()), &config), "warn");
        assert_eq!(
            log_directives(&plain, Some("seismo=trace".into()), &config),
            "seismo=trace"
        );

        let debug = Args::parse_from(["seismo", "--debug"]);
        assert_eq!(log_directives(&debug, Some("error".into()), &config), "debug");

        let trace = Args::parse_from(["seismo", "--debug", "--trace"]);
        assert_eq!(log_directives(&trace, None, &config), "trace");
    }
}
