//! streamconv CLI
//!
//! Command-line interface for running streaming convolution models offline.

use clap::Parser;
use env_logger::Env;
use log::info;

use streamconv::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("streamconv v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("streamconv v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { model } => commands::info(&model),
        Commands::Process {
            model,
            input,
            output,
            precision,
        } => commands::process_wav(&model, &input, &output, precision),
        Commands::Csv {
            model,
            input,
            output,
            precision,
        } => commands::process_csv(&model, &input, output.as_deref(), precision),
    }
}
