//! Stego Ledger - CLI Entry Point
//!
//! Hides JSON payloads in cover images and keeps the metadata and lookup
//! ledgers deduplicated and consistently indexed.
//!
//! This binary is a thin wrapper around the library, handling argument parsing,
//! logging setup, and command dispatch.

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::{debug, info, warn, LevelFilter};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stego_ledger::cli::{self, Args, DualWriter};
use stego_ledger::core::config::Config;

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(ref config_path) = args.config {
        match Config::load(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        }
    } else {
        Config::load_default().unwrap_or_default()
    };

    // Apply CLI overrides to config
    if let Some(ref dir) = args.metadata_dir {
        config.paths.metadata_dir = dir.clone();
    }
    if let Some(ref dir) = args.images_dir {
        config.paths.images_dir = dir.clone();
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }

    // Set up graceful shutdown handler
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if shutdown_flag_clone.load(Ordering::SeqCst) {
            // Second Ctrl+C - force exit
            eprintln!("\nForce shutdown requested. Exiting immediately...");
            std::process::exit(1);
        } else {
            shutdown_flag_clone.store(true, Ordering::SeqCst);
            eprintln!("\nGraceful shutdown requested. Finishing current image... (Press Ctrl+C again to force quit)");
        }
    }) {
        eprintln!("Warning: Failed to set Ctrl+C handler: {}", e);
    }

    init_logging(&config);

    debug!("{} v{}", stego_ledger::NAME, stego_ledger::VERSION);
    debug!(
        "Ledgers: {} and {}",
        config.ledger_store().metadata_path().display(),
        config.ledger_store().lookup_path().display()
    );

    cli::run_command(&args, &config, shutdown_flag)?;

    Ok(())
}

fn init_logging(config: &Config) {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    if config.logging.log_to_file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.logging.log_file);

        match log_file {
            Ok(file) => {
                // Set up logging to both console and file
                Builder::new()
                    .filter_level(log_level)
                    .format(|buf, record| {
                        writeln!(
                            buf,
                            "[{} {} {}] {}",
                            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                            record.level(),
                            record.target(),
                            record.args()
                        )
                    })
                    .target(env_logger::Target::Pipe(Box::new(DualWriter {
                        console: std::io::stderr(),
                        file,
                    })))
                    .init();

                info!("Logging to file: {}", config.logging.log_file.display());
                return;
            }
            Err(e) => {
                Builder::new().filter_level(log_level).init();
                warn!(
                    "Failed to open log file {}: {}; logging to the console only",
                    config.logging.log_file.display(),
                    e
                );
                return;
            }
        }
    }

    Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.level)).init();
}
