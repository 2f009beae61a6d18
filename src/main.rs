// ABOUTME: Entry point for the hubstack CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{CertCommands, Cli, Commands, SlotCommands};
use commands::Host;
use hubstack::config;
use hubstack::deploy::DeployOptions;
use hubstack::error::{Error, Result};
use hubstack::output::{Output, OutputMode};
use hubstack::types::ServiceName;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag decides.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = OutputMode::from_flags(cli.quiet, cli.json);

    if let Err(e) = run(cli, mode).await {
        if e.halts_run() {
            tracing::error!("run halted: {e}");
        }
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let open = || Host::open(cli.config.as_deref(), cli.yes);

    match cli.command {
        Commands::Init {
            ref name,
            ref domain,
            force,
        } => {
            let cwd = std::env::current_dir()?;
            config::init_config(&cwd, name.as_deref(), domain.as_deref(), force)?;
            output.success(&format!("Wrote {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            parallel,
            swap,
            ref services,
            clean,
        } => {
            let options = DeployOptions {
                parallel,
                swap,
                services: parse_services(&services.services)?,
                clean_first: clean,
            };
            commands::deploy(&open()?, options, output).await
        }
        Commands::Clean {
            ref services,
            wipe_data,
        } => {
            let services = parse_services(&services.services)?;
            commands::clean(&open()?, services, wipe_data, output).await
        }
        Commands::Revert => commands::revert(&open()?, output).await,
        Commands::Cert { ref command } => match command {
            CertCommands::Status => commands::cert_status(&open()?, output).await,
            CertCommands::Renew => commands::cert_renew(&open()?, output).await,
        },
        Commands::Slot { ref command } => match command {
            SlotCommands::Status => commands::slot_status(&open()?, output).await,
        },
    }
}

fn parse_services(names: &[String]) -> Result<Vec<ServiceName>> {
    names
        .iter()
        .map(|n| ServiceName::new(n.trim()).map_err(|e| Error::InvalidConfig(format!("{n}: {e}"))))
        .collect()
}
