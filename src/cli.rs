// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hubstack")]
#[command(about = "Provision, secure, and tear down a self-hosted container stack")]
#[command(version)]
pub struct Cli {
    /// Answer every confirmation with its default
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Config file (default: discover hubstack.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (only final result)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a new hubstack.yml
    Init {
        /// Application name
        #[arg(long)]
        name: Option<String>,

        /// Domain to request certificates for
        #[arg(long)]
        domain: Option<String>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Provision TLS and start the stack
    Deploy {
        /// Start every service at once instead of infra-critical first
        #[arg(short, long)]
        parallel: bool,

        /// Deploy into the inactive slot and switch to it once healthy
        #[arg(short = 'S', long)]
        swap: bool,

        #[command(flatten)]
        services: ServiceSelection,

        /// Remove the services' existing containers first
        #[arg(long)]
        clean: bool,
    },

    /// Remove containers and networks of selected services
    Clean {
        #[command(flatten)]
        services: ServiceSelection,

        /// Also delete the data directory (the certificate is preserved)
        #[arg(long)]
        wipe_data: bool,
    },

    /// Remove everything this deployment created
    Revert,

    /// Certificate commands
    Cert {
        #[command(subcommand)]
        command: CertCommands,
    },

    /// Slot commands
    Slot {
        #[command(subcommand)]
        command: SlotCommands,
    },
}

#[derive(Args)]
pub struct ServiceSelection {
    /// Comma-separated services (default: all)
    #[arg(short, long, value_delimiter = ',')]
    pub services: Vec<String>,
}

#[derive(Subcommand)]
pub enum CertCommands {
    /// Show the installed certificate and the last issuance attempt
    Status,

    /// Obtain or renew the certificate now
    Renew,
}

#[derive(Subcommand)]
pub enum SlotCommands {
    /// Show the active slot and its containers
    Status,
}
