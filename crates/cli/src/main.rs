//! `bibformat`: transform records with XSLT, categorize their fulltext links
//! and list their editors.

mod cli;
mod commands;
mod error;
mod json;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = cli::Cli::parse();
    match commands::run(&cli) {
        Ok(output) if output.ends_with('\n') => {
            print!("{output}");
            ExitCode::SUCCESS
        },
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::debug!("{err:?}");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        },
    }
}
