//! Skylift - Entry Point
//!
//! Zero-argument interactive deployer: every parameter is gathered via
//! prompts with sensible defaults. Flags use the --key=value form.

use std::collections::HashMap;
use std::env;

use skylift::app::options::AppOptions;
use skylift::app::run::run;
use skylift::errors::DeployError;
use skylift::logs::{init_logging, LogLevel, LogOptions};
use skylift::utils::version_info;

use tracing::info;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    let log_level: LogLevel = cli_args
        .get("log-level")
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    // Initialize logging
    let log_options = LogOptions {
        log_level: log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    let options = AppOptions {
        log_level,
        assume_defaults: cli_args.contains_key("yes"),
        ..Default::default()
    };

    let result = run(options, await_shutdown_signal()).await;
    match result {
        Ok(()) => {}
        Err(DeployError::Interrupted) => std::process::exit(130),
        Err(_) => std::process::exit(1),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
