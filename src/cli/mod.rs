//! Command-line interface for commit-gate.
//!
//! This module provides the `cgate` CLI with subcommands for:
//! - `init`: Initialize configuration
//! - `install`: Install git hook
//! - `uninstall`: Remove git hook
//! - `run`: Run the gate against the staged files
//! - `classify`: Show how staged files are categorized
//! - `list`: List categories and their checkers
//! - `validate`: Validate configuration
//! - `config`: Show configuration file location and contents

mod commands;

use crate::core::error::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Commit-time lint gate for staged files.
#[derive(Debug, Parser)]
#[command(
    name = "cgate",
    author,
    version,
    about = "Commit-time gate that classifies staged files and dispatches them to external linters",
    long_about = r#"
commit-gate (cgate) guards commits: it classifies the staged files by
extension, path segment, and shebang, routes each category to its
configured external linter, and aborts the commit on the first failure.
Fix-capable linters have their rewrites re-staged automatically.

Quick start:
  cgate init      # Create configuration
  cgate install   # Install git hook
  # Done! Every commit now runs the gate.

Environment variables:
  CGATE_SKIP=1                  Skip the whole gate
  CGATE_SKIP_<CATEGORY>=1       Skip one category (e.g. CGATE_SKIP_MARKDOWN)
"#,
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize commit-gate configuration.
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Install the git pre-commit hook.
    Install {
        /// Overwrite existing hook.
        #[arg(short, long)]
        force: bool,
    },

    /// Remove the git pre-commit hook.
    Uninstall,

    /// Run the gate against the staged files.
    #[command(visible_alias = "r")]
    Run {
        /// Run only a specific category.
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show how the staged files are categorized.
    #[command(visible_alias = "c")]
    Classify,

    /// List categories, their checkers, and skip switches.
    #[command(visible_alias = "l")]
    List,

    /// Validate the configuration file.
    #[command(visible_alias = "v")]
    Validate,

    /// Show configuration file location and contents.
    Config {
        /// Output raw TOML.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    setup_logging(cli.verbose, cli.quiet);

    // Set up color
    setup_color(cli.color);

    // If no subcommand, run the default action (same as `cgate run`)
    match cli.command {
        Some(Commands::Init { force }) => commands::init(force),
        Some(Commands::Install { force }) => commands::install(force),
        Some(Commands::Uninstall) => commands::uninstall(),
        Some(Commands::Run { category }) => commands::run(category.as_deref()),
        Some(Commands::Classify) => commands::classify(),
        Some(Commands::List) => commands::list(),
        Some(Commands::Validate) => commands::validate(),
        Some(Commands::Config { raw }) => commands::config(raw),
        Some(Commands::Completions { shell }) => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
        None => commands::run(None),
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {
            // Let console crate auto-detect
        },
    }
}
