// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tb: command-line front end for testbench draft sessions

mod backend;
mod commands;
mod duration;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::backend::Backend;
use crate::commands::{draft, job};
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tb", version, about = "Edit generated test drafts and run backend jobs")]
struct Cli {
    /// Backend base URL [env: TB_BACKEND_URL] [default: http://127.0.0.1:8000/api]
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or save entity drafts
    Draft(draft::DraftArgs),
    /// Run generation and execution jobs
    Job(job::JobArgs),
}

/// Logs go to stderr, filtered by TB_LOG (default "warn").
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TB_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let backend = Backend::resolve(cli.backend.as_deref());
    match command {
        Commands::Draft(args) => draft::handle(args.command, &backend, cli.output).await,
        Commands::Job(args) => job::handle(args.command, &backend, cli.output).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if let Some(exit) = err.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("{}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("Error: {err:#}");
        std::process::exit(exit_error::FAILURE);
    }
}
