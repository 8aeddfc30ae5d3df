//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::runner::RunRequest;

/// Kettle - run the steps of a data-analysis project, and only the stale ones.
#[derive(Debug, Parser)]
#[command(name = "kettle")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project directory (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output, including step output
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
    /// Run project steps (default if no command specified)
    Run(RunArgs),

    /// Show which steps and dependencies are dirty
    Status(StatusArgs),

    /// Start the local sync server
    Serve(ServeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Steps to run. A trailing number (or run of dots) sets the limit
    #[arg(value_name = "STEP")]
    pub steps: Vec<String>,

    /// Run the steps even if they have not been modified
    #[arg(short, long)]
    pub force: bool,

    /// Also run every step after the first one given
    #[arg(short = 'c', long = "continue")]
    pub continue_after: bool,

    /// Run only the first step that needs to run
    #[arg(short = 's', long = "step")]
    pub single_step: bool,

    /// Maximum number of steps to run, including the first
    #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
    pub limit: i64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            force: false,
            continue_after: false,
            single_step: false,
            limit: -1,
        }
    }
}

impl RunArgs {
    /// Convert to a run request.
    pub fn to_request(&self) -> RunRequest {
        RunRequest {
            steps: self.steps.clone(),
            force: self.force,
            continue_after: self.continue_after,
            single_step: self.single_step,
            limit: self.limit,
        }
    }
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `serve` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ServeArgs {
    /// Address to bind (default from settings, else 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default from settings, else 5010)
    #[arg(long)]
    pub port: Option<u16>,
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
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["kettle"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_parses_steps_and_flags() {
        let cli = Cli::try_parse_from(["kettle", "run", "S02", "S01", "-f", "-c"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.steps, vec!["S02", "S01"]);
        assert!(args.force);
        assert!(args.continue_after);
        assert!(!args.single_step);
        assert_eq!(args.limit, -1);
    }

    #[test]
    fn run_accepts_shorthand_tokens() {
        let cli = Cli::try_parse_from(["kettle", "run", "S01", "..."]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.steps, vec!["S01", "..."]);
    }

    #[test]
    fn run_limit_accepts_negative() {
        let cli = Cli::try_parse_from(["kettle", "run", "--limit", "-1", "-s"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.limit, -1);
        assert!(args.single_step);
    }

    #[test]
    fn run_args_convert_to_request() {
        let args = RunArgs {
            steps: vec!["S01".to_string()],
            limit: 2,
            ..Default::default()
        };
        let request = args.to_request();
        assert_eq!(request.steps, vec!["S01"]);
        assert_eq!(request.limit, 2);
        assert!(!request.force);
    }

    #[test]
    fn serve_parses_bind_address() {
        let cli = Cli::try_parse_from(["kettle", "serve", "--port", "6000"]).unwrap();
        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(6000));
        assert!(args.host.is_none());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["kettle", "status", "--json", "-q"]).unwrap();
        assert!(cli.quiet);
    }
}
