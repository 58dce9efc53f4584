// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use dockyard::output::OutputMode;
use dockyard::types::{ApplicationId, ContainerPort};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(about = "Deploy GitHub repositories as containers on this host")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: discover dockyard.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputMode::Normal)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a dockyard.yml with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Register a repository as a new application
    Create {
        /// Public GitHub repository URL
        #[arg(long)]
        repo: String,

        /// Port the application listens on inside its container (1024-65535)
        #[arg(long, value_parser = parse_container_port)]
        container_port: ContainerPort,
    },

    /// List registered applications
    List,

    /// Show one application
    Show {
        #[arg(value_parser = parse_application_id)]
        id: ApplicationId,
    },

    /// Sync, build, and run an application
    Deploy {
        #[arg(value_parser = parse_application_id)]
        id: ApplicationId,
    },
}

fn parse_container_port(value: &str) -> Result<ContainerPort, String> {
    let port: u32 = value
        .parse()
        .map_err(|_| format!("not a port number: {value}"))?;
    ContainerPort::new(port).map_err(|e| e.to_string())
}

fn parse_application_id(value: &str) -> Result<ApplicationId, String> {
    value.parse().map_err(|e: dockyard::types::ApplicationIdError| e.to_string())
}
