//! minify-assets - minify CSS and JavaScript through an external program.

mod asset;
mod cli;
mod config;
mod core;
mod dispatch;
mod host;
mod logger;
mod program;
mod report;
mod utils;
mod variant;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::MinifyConfig;
use dispatch::Dispatcher;
use host::{Host, TerminalHost};
use program::ExternalProgram;
use tokio_util::sync::CancellationToken;

/// Exit status for a failed run.
const FAILURE: i32 = 1;

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
    logger::set_verbose(cli.verbose);
    logger::set_json_output(cli.json);

    let config = MinifyConfig::load(&cli)?;
    let host = TerminalHost::from_env();

    // Locate once; every command needs the program
    let program = match ExternalProgram::locate(&config) {
        Ok(program) => program,
        Err(err) => {
            let detail = err.hint().unwrap_or_default();
            host.error(&err.to_string(), &detail);
            std::process::exit(FAILURE);
        }
    };
    debug!("program"; "{} {}", program.interpreter().display(), program.script().display());

    let token = core::register_cancellation(CancellationToken::new());
    let dispatcher = Dispatcher::new(host, program, &config).with_cancellation(token);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let path = cli.command.path().map(PathBuf::as_path);

    match runtime.block_on(dispatcher.execute(cli.command.action(), path)) {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string(&report)?);
            }
            Ok(())
        }
        // Already reported through the host
        Err(_) => std::process::exit(FAILURE),
    }
}
