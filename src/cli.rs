use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "co-pilot",
    about = "Upgrade and normalize Maven project descriptors",
    version,
    author
)]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, or JSON by extension)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which descriptors to process and whether to write them back
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Project directory or descriptor file
    #[arg(long, global = true, default_value = ".")]
    pub target: PathBuf,

    /// Follow <modules> into child projects
    #[arg(short, long, global = true)]
    pub recursive: bool,

    /// Write changed descriptors back to disk
    #[arg(long, global = true, action = ArgAction::Set, default_value_t = true)]
    pub overwrite: bool,

    /// Report what would change without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upgrade versions in the descriptor
    Upgrade {
        #[command(flatten)]
        target: TargetArgs,

        #[command(subcommand)]
        operation: UpgradeCommand,
    },

    /// Move literal versions into properties and sort dependencies
    Format {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum UpgradeCommand {
    /// Upgrade a single dependency
    Dependency {
        /// groupId of the dependency
        #[arg(short = 'g', long = "groupId")]
        group_id: Option<String>,

        /// artifactId of the dependency
        #[arg(short = 'a', long = "artifactId")]
        artifact_id: Option<String>,

        /// Alternatively, the coordinate as group:artifact
        #[arg(value_name = "COORDINATE", conflicts_with_all = ["group_id", "artifact_id"])]
        coordinate: Option<String>,
    },

    /// Upgrade all second-party dependencies
    #[command(name = "2party")]
    SecondParty,

    /// Upgrade all third-party dependencies
    #[command(name = "3party")]
    ThirdParty,

    /// Upgrade the Spring Boot platform version
    SpringBoot,

    /// Upgrade the Kotlin version
    Kotlin,

    /// Upgrade build plugins
    Plugins,

    /// Run kotlin, spring-boot, 2party, 3party and plugins in order
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dependency_upgrade() {
        let cli = Cli::parse_from([
            "co-pilot", "upgrade", "--dry-run", "dependency", "-g", "org.acme", "-a", "widget",
        ]);
        let Commands::Upgrade { target, operation } = cli.command else {
            panic!("expected upgrade");
        };
        assert!(target.dry_run);
        assert!(target.overwrite);
        assert!(matches!(
            operation,
            UpgradeCommand::Dependency { group_id: Some(g), artifact_id: Some(a), .. }
                if g == "org.acme" && a == "widget"
        ));
    }

    #[test]
    fn target_flags_follow_the_operation() {
        let cli = Cli::parse_from([
            "co-pilot", "upgrade", "2party", "--target", "services", "-r", "--overwrite", "false",
        ]);
        let Commands::Upgrade { target, operation } = cli.command else {
            panic!("expected upgrade");
        };
        assert!(matches!(operation, UpgradeCommand::SecondParty));
        assert_eq!(target.target, PathBuf::from("services"));
        assert!(target.recursive);
        assert!(!target.overwrite);
    }

    #[test]
    fn parses_format_with_global_options() {
        let cli = Cli::parse_from(["co-pilot", "--verbose", "format", "--config", "co.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("co.toml")));
        assert!(matches!(cli.command, Commands::Format { .. }));
    }

    #[test]
    fn verifies_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
