//! Command-line surface, parsed with clap's derive API into [`Cli`].

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// mtr-setup - Install and schedule the mtr-logger network diagnostics tool.
#[derive(Debug, Parser)]
#[command(name = "mtr-setup")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install, update and schedule the logger (default if no command specified)
    Install(InstallArgs),

    /// Remove the logger, its scheduled jobs and its PATH entry
    Uninstall(UninstallArgs),

    /// Preview the schedule for a logging frequency without installing
    Schedule(ScheduleArgs),

    /// Show the recorded installation and its scheduled jobs
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Repository to install from
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    /// Branch to track
    #[arg(long)]
    pub branch: Option<String>,

    /// Minimum acceptable Python version
    #[arg(long, value_name = "VERSION")]
    pub min_python: Option<String>,

    /// YAML file of pre-filled answers
    #[arg(long, value_name = "FILE")]
    pub answers: Option<PathBuf>,

    /// Use defaults, no prompts
    #[arg(long)]
    pub non_interactive: bool,

    /// Never install a Python runtime; fail if none is found
    #[arg(long)]
    pub no_runtime_install: bool,

    /// Skip the post-install trial run
    #[arg(long)]
    pub skip_self_test: bool,
}

impl InstallArgs {
    /// The flags that override answers and defaults.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            repo_url: self.repo_url.clone(),
            branch: self.branch.clone(),
            min_runtime_version: self.min_python.clone(),
        }
    }
}

/// Arguments for the `uninstall` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UninstallArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Also delete the log directory
    #[arg(long)]
    pub purge_logs: bool,

    /// Installation to remove (defaults to the platform location)
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,
}

/// Arguments for the `schedule` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ScheduleArgs {
    /// Reports per hour; must divide 60 evenly (1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30 or 60)
    #[arg(long, default_value_t = 4)]
    pub logs_per_hour: u32,

    /// Seconds kept free at the end of each window
    #[arg(long, default_value_t = 5)]
    pub safety_margin: u32,
}

impl Default for ScheduleArgs {
    fn default() -> Self {
        Self {
            logs_per_hour: 4,
            safety_margin: 5,
        }
    }
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Installation to inspect (defaults to the platform location)
    #[arg(long, value_name = "DIR")]
    pub install_root: Option<PathBuf>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_command_is_none() {
        let cli = Cli::try_parse_from(["mtr-setup"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn install_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "mtr-setup",
            "install",
            "--repo-url",
            "https://example.org/fork.git",
            "--min-python",
            "3.10",
            "--non-interactive",
        ])
        .unwrap();
        let Some(Commands::Install(args)) = cli.command else {
            panic!("expected install");
        };
        assert!(args.non_interactive);
        let overrides = args.overrides();
        assert_eq!(overrides.repo_url.as_deref(), Some("https://example.org/fork.git"));
        assert_eq!(overrides.branch, None);
        assert_eq!(overrides.min_runtime_version.as_deref(), Some("3.10"));
    }

    #[test]
    fn schedule_defaults() {
        let cli = Cli::try_parse_from(["mtr-setup", "schedule"]).unwrap();
        let Some(Commands::Schedule(args)) = cli.command else {
            panic!("expected schedule");
        };
        assert_eq!(args.logs_per_hour, 4);
        assert_eq!(args.safety_margin, 5);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mtr-setup", "uninstall", "-y", "--quiet"]).unwrap();
        assert!(cli.quiet);
        let Some(Commands::Uninstall(args)) = cli.command else {
            panic!("expected uninstall");
        };
        assert!(args.yes);
        assert!(!args.purge_logs);
    }

    #[test]
    fn logs_per_hour_help_lists_every_divisor() {
        let cli = Cli::command();
        let schedule = cli.find_subcommand("schedule").unwrap();
        let arg = schedule
            .get_arguments()
            .find(|a| a.get_id() == "logs_per_hour")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        let (_, list) = help.split_once('(').unwrap();
        let listed: Vec<u32> = list
            .split(|c: char| !c.is_ascii_digit())
            .filter_map(|word| word.parse().ok())
            .collect();
        for n in crate::schedule::VALID_LOGS_PER_HOUR {
            assert!(listed.contains(&n), "{n} missing from {help:?}");
        }
    }
}
