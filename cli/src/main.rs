//! # reprotar Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! reprotar writes reproducible tar archives for build pipelines: the same
//! inputs always give the same bytes, whatever the host clock, user or
//! filesystem ordering. This file:
//! - expands `@file` argument files
//! - parses the command line using Clap
//! - sets up logging based on verbosity flags
//! - runs the build command and reports errors
//!
//! ## Examples
//!
//! ```bash
//! # Get help
//! reprotar --help
//!
//! # Build an archive with increased verbosity
//! reprotar -vv --output out.tar --file bin/tool=usr/bin/tool
//!
//! # Read arguments from a parameter file
//! reprotar @out.tar.params
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands; // Command-line front end (build command, argument files)
mod common; // Archive engine, path normalization, filesystem helpers
mod core; // Errors and configuration

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "reprotar",
    about = "Build deterministic, reproducible tar archives",
    long_about = "Build deterministic, reproducible tar archives from files and directory trees.\n\
                  Arguments starting with '@' are read from the named file, one per line.",
    version
)]
struct Cli {
    #[command(flatten)]
    build: commands::build::BuildArgs,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let raw_args = match commands::argfile::expand_args(std::env::args().collect()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };
    let cli = Cli::parse_from(raw_args);

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    if let Err(e) = commands::build::handle_build(cli.build) {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
