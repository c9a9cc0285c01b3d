//! o365-userenum - Office 365 ActiveSync Username Enumerator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use o365_userenum::config::{CliArgs, RunConfig};
use o365_userenum::pipeline::{file_source, Coordinator};
use o365_userenum::probe::{ActiveSyncProber, Prober};
use o365_userenum::progress::{print_header, print_summary};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose);

    // Validate and create config
    let config = RunConfig::from_args(args).context("Invalid configuration")?;

    let output = config.output_path.display().to_string();
    print_header(config.endpoint.as_str(), config.worker_count, &output);

    // Wire up the collaborators
    let source = file_source(&config.users_path).with_context(|| {
        format!("Failed to open users file '{}'", config.users_path.display())
    })?;
    let prober: Arc<dyn Prober> = Arc::new(
        ActiveSyncProber::new(
            config.endpoint.clone(),
            config.password.clone(),
            config.probe_timeout,
        )
        .context("Failed to build HTTP client")?,
    );

    let coordinator = Coordinator::new(config, source, prober);

    // Setup signal handler for graceful shutdown
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Run the enumeration
    let result = coordinator.run().context("Enumeration failed")?;

    print_summary(&result, &output);

    if !result.completed {
        info!("Run was interrupted before completion");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("o365_userenum=debug,warn")
    } else {
        EnvFilter::new("o365_userenum=info,warn")
    };

    // Logs go to stderr; stdout carries only the result records
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
