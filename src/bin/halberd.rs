//! Halberd CLI binary.

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use halberd::cli::args::*;
use halberd::cli::commands::*;

fn main() {
    let args = HalberdArgs::parse();

    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("halberd={}", args.log_filter())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: HalberdArgs) -> anyhow::Result<()> {
    let name = command_name(&args.command);
    execute_command(args).with_context(|| format!("{name} failed"))
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::CreateIndex(_) => "create-index",
        Command::Index(_) => "index",
        Command::Delete(_) => "delete",
        Command::Search(_) => "search",
        Command::SearchBoolean(_) => "search-boolean",
        Command::Stats(_) => "stats",
    }
}
