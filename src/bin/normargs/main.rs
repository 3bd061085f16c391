//! normargs CLI - inspect availability data and run normalizers

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use normargs::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("normargs=debug")
    } else {
        EnvFilter::new("normargs=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    let color = !cli.no_color && ctx.color();

    // Execute command
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &ctx, color),
        Commands::Tree(args) => commands::tree::execute(args, &ctx),
        Commands::Values(args) => commands::values::execute(args, &ctx),
        Commands::Normalize(args) => commands::normalize::execute(args, &ctx, color),
        Commands::Settings(args) => commands::settings::execute(args, &mut ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
