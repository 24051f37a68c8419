//! livedoc - live preview for API documentation viewers.

#![allow(dead_code)]

mod actor;
mod bridge;
mod cli;
mod config;
mod core;
mod embed;
mod inject;
mod logger;
mod produce;
mod reload;
mod utils;
mod workspace;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PreviewConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = PreviewConfig::load(&cli)?;

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Inject { args } => cli::inject::run_inject(args, &config),
    }
}
