//! Partitura CLI - static Composer repository generator.
//!
//! Reads a package snapshot and publishes it as a provider-style Composer
//! repository under a webroot that any static file server can serve.

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod output;

use clap::Parser;
use commands::{Cli, Commands};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    if cli.no_ansi {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let working_dir = match cli.working_dir.clone().map_or_else(std::env::current_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => {
            output::error(&format!("Failed to determine working directory: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::error(&format!("Failed to create runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(&cli, working_dir)) {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: &Cli, working_dir: PathBuf) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Dump(args) => commands::dump::run(args.clone(), working_dir, cli.quiet).await,
        Commands::DeletePaths(args) => {
            commands::delete_paths::run(args.clone(), working_dir, cli.quiet).await
        }
    }
}
