mod agents;
mod cli;
mod config;
mod error;
mod maven;
mod repository;
mod utils;
mod workflow;

use agents::UpgradeOperation;
use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, TargetArgs, UpgradeCommand};
use colored::Colorize;
use config::Config;
use error::CopilotError;
use maven::parse_maven_coordinate;
use std::process;
use tracing_subscriber::EnvFilter;
use workflow::RunOptions;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns whether every descriptor was processed.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let summary = match cli.command {
        Commands::Upgrade { target, operation } => {
            let operation = to_operation(operation)?;
            workflow::execute_upgrade(&config, &run_options(target), &operation)
                .with_context(|| format!("upgrade {operation} failed"))?
        }
        Commands::Format { target } => {
            workflow::execute_format(&config, &run_options(target)).context("format failed")?
        }
    };

    Ok(!summary.has_failures())
}

fn run_options(target: TargetArgs) -> RunOptions {
    RunOptions {
        target: target.target,
        recursive: target.recursive,
        dry_run: target.dry_run,
        overwrite: target.overwrite,
    }
}

fn to_operation(command: UpgradeCommand) -> error::Result<UpgradeOperation> {
    Ok(match command {
        UpgradeCommand::Dependency {
            group_id,
            artifact_id,
            coordinate: Some(coordinate),
        } if group_id.is_none() && artifact_id.is_none() => {
            let (group, artifact, _) = parse_maven_coordinate(&coordinate).ok_or_else(|| {
                CopilotError::Configuration(format!(
                    "invalid coordinate '{coordinate}', expected group:artifact"
                ))
            })?;
            UpgradeOperation::dependency(Some(&group), Some(&artifact))?
        }
        UpgradeCommand::Dependency {
            group_id,
            artifact_id,
            ..
        } => UpgradeOperation::dependency(group_id.as_deref(), artifact_id.as_deref())?,
        UpgradeCommand::SecondParty => UpgradeOperation::SecondParty,
        UpgradeCommand::ThirdParty => UpgradeOperation::ThirdParty,
        UpgradeCommand::SpringBoot => UpgradeOperation::SpringBoot,
        UpgradeCommand::Kotlin => UpgradeOperation::Kotlin,
        UpgradeCommand::Plugins => UpgradeOperation::Plugins,
        UpgradeCommand::All => UpgradeOperation::All,
    })
}
