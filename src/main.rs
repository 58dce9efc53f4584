// ABOUTME: Entry point for the dockyard CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use dockyard::config::{self, Config};
use dockyard::error::Result;
use dockyard::output::Output;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let output = Output::new(cli.output);
    let result = run(cli).await;

    if let Err(e) = result {
        commands::report_error(&output, &e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(cli.output);
    let cwd = env::current_dir()?;

    let config = match (&cli.command, &cli.config) {
        (Commands::Init { force }, _) => {
            config::init_config(&cwd, *force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            return Ok(());
        }
        (_, Some(path)) => Config::load(path)?,
        (_, None) => Config::discover_or_default(&cwd)?,
    };

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Create {
            repo,
            container_port,
        } => commands::create(&config, &repo, container_port, &output).await,
        Commands::List => commands::list(&config, &output).await,
        Commands::Show { id } => commands::show(&config, id, &output).await,
        Commands::Deploy { id } => commands::deploy(&config, id, output).await,
    }
}
