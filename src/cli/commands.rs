//! CLI command implementations.

use crate::config::{Config, SkipPolicy, CONFIG_FILE_NAME, SKIP_ALL_ENV_VAR};
use crate::core::classify::{categories_for, Category, FsFirstLineReader};
use crate::core::error::{Error, Result};
use crate::core::git::GitRepo;
use crate::core::guard::{check_portable_filenames, GuardVerdict};
use crate::core::runner::{GateResult, Runner, GUARD_FAILURE_LABEL};
use console::style;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Hook script template.
const HOOK_SCRIPT: &str = r#"#!/bin/sh
# commit-gate hook - installed by `cgate install`
# https://github.com/commit-gate/commit-gate

# Skip if CGATE_SKIP is set
if [ -n "$CGATE_SKIP" ]; then
    exit 0
fi

# Run the gate
exec cgate run
"#;

/// Hook marker comment.
const HOOK_MARKER: &str = "# commit-gate hook";

/// Initialize configuration.
pub fn init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    // Check if config already exists
    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    std::fs::write(&config_path, Config::default_toml())
        .map_err(|e| Error::io("write config", e))?;

    eprintln!(
        "{} Created {}",
        style("\u{2713}").green(),
        config_path.display()
    );

    eprintln!("\nNext steps:");
    eprintln!("  1. Review and customize {CONFIG_FILE_NAME}");
    eprintln!("  2. Run: cgate install");

    Ok(ExitCode::SUCCESS)
}

/// Install git hook.
pub fn install(force: bool) -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hooks_dir = repo.hooks_dir();
    let hook_path = hooks_dir.join("pre-commit");

    // Create hooks directory if needed
    if !hooks_dir.exists() {
        std::fs::create_dir_all(&hooks_dir).map_err(|e| Error::io("create hooks dir", e))?;
    }

    // Check for existing hook
    if hook_path.exists() {
        let content =
            std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read existing hook", e))?;

        // Check if it's our hook
        if content.contains(HOOK_MARKER) {
            eprintln!(
                "{} Hook already installed at {}",
                style("\u{2713}").green(),
                hook_path.display()
            );
            return Ok(ExitCode::SUCCESS);
        }

        if !force {
            return Err(Error::HookExists { path: hook_path });
        }

        // Backup existing hook
        let backup_path = hooks_dir.join("pre-commit.bak");
        std::fs::rename(&hook_path, &backup_path).map_err(|e| Error::io("backup hook", e))?;
        eprintln!(
            "{} Backed up existing hook to {}",
            style("\u{2022}").cyan(),
            backup_path.display()
        );
    }

    // Write hook
    std::fs::write(&hook_path, HOOK_SCRIPT).map_err(|e| Error::io("write hook", e))?;

    // Make executable on Unix
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&hook_path)
            .map_err(|e| Error::io("get hook metadata", e))?
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&hook_path, perms).map_err(|e| Error::io("set hook perms", e))?;
    }

    eprintln!(
        "{} Installed pre-commit hook at {}",
        style("\u{2713}").green(),
        hook_path.display()
    );

    Ok(ExitCode::SUCCESS)
}

/// Uninstall git hook.
pub fn uninstall() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let hook_path = repo.hook_path("pre-commit");

    if !hook_path.exists() {
        eprintln!(
            "{} No hook installed at {}",
            style("\u{2022}").cyan(),
            hook_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    // Check if it's our hook
    let content = std::fs::read_to_string(&hook_path).map_err(|e| Error::io("read hook", e))?;

    if !content.contains(HOOK_MARKER) {
        eprintln!(
            "{} Hook at {} was not installed by commit-gate",
            style("!").yellow(),
            hook_path.display()
        );
        eprintln!("  Remove manually if desired.");
        return Ok(ExitCode::FAILURE);
    }

    std::fs::remove_file(&hook_path).map_err(|e| Error::io("remove hook", e))?;

    eprintln!(
        "{} Removed pre-commit hook from {}",
        style("\u{2713}").green(),
        hook_path.display()
    );

    // Check for backup
    let backup_path = repo.hooks_dir().join("pre-commit.bak");
    if backup_path.exists() {
        eprintln!(
            "  Backup exists at {} - restore if needed",
            backup_path.display()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Run the gate.
pub fn run(category: Option<&str>) -> Result<ExitCode> {
    // Check for global skip
    if std::env::var_os(SKIP_ALL_ENV_VAR).is_some_and(|v| !v.is_empty()) {
        eprintln!(
            "{} Skipping gate ({SKIP_ALL_ENV_VAR} set)",
            style("\u{2022}").cyan()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let config = Config::load_or_default()?;
    let skip = SkipPolicy::from_env();
    let repo = GitRepo::discover()?;
    let runner = Runner::new(config, skip, repo.clone());

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal {
            message: format!("Failed to create runtime: {e}"),
        })?
        .block_on(async {
            if let Some(name) = category {
                let category: Category =
                    name.parse().map_err(|_| Error::UnknownCategory {
                        name: name.to_string(),
                    })?;

                // The filename guard is internal, not an external checker;
                // requesting it by name runs it directly
                if category == Category::Filenames {
                    let verdict = check_portable_filenames(&repo.staged_paths_raw()?);
                    if let GuardVerdict::NonPortable { ref path } = verdict {
                        eprintln!(
                            "{} {GUARD_FAILURE_LABEL}: {path}",
                            style("\u{2717}").red()
                        );
                    }
                    return Ok(GateResult {
                        guard: verdict,
                        categories: Vec::new(),
                        duration: std::time::Duration::ZERO,
                    });
                }

                let staged = repo.staged_files()?;
                let outcome = runner.run_category(category, &staged).await?;
                Ok(GateResult {
                    guard: GuardVerdict::Ok,
                    categories: vec![outcome],
                    duration: std::time::Duration::ZERO,
                })
            } else {
                runner.run().await
            }
        })?;

    // Print summary
    eprintln!();
    if result.success() {
        eprintln!(
            "{} Gate passed ({} checked, {} skipped) in {:?}",
            style("\u{2713}").green().bold(),
            result.attempted_count(),
            result.skipped_count(),
            result.duration
        );
        return Ok(ExitCode::SUCCESS);
    }

    let label = result
        .failure_label()
        .unwrap_or_else(|| "unknown".to_string());
    eprintln!(
        "{} Commit aborted: {} failed",
        style("\u{2717}").red().bold(),
        style(&label).bold()
    );

    // Show the failing checker's output
    if let Some(failed) = result.failed_category() {
        if let Some(ref output) = failed.output {
            let combined = output.combined_output();
            if !combined.is_empty() {
                eprintln!();
                for line in combined.lines().take(40) {
                    eprintln!("    {line}");
                }
            }
        }
    }

    Ok(ExitCode::FAILURE)
}

/// Show how the staged files are categorized.
pub fn classify() -> Result<ExitCode> {
    let repo = GitRepo::discover()?;
    let reader = FsFirstLineReader::new(repo.root());
    let staged = repo.staged_files()?;

    if staged.is_empty() {
        eprintln!("{} No staged files", style("\u{2022}").cyan());
        return Ok(ExitCode::SUCCESS);
    }

    for file in &staged {
        let categories = categories_for(file, &reader);
        let names: Vec<_> = categories.iter().map(Category::name).collect();
        eprintln!(
            "  {} {}",
            style(file.display()).cyan(),
            if names.is_empty() {
                "(unclassified)".to_string()
            } else {
                names.join(", ")
            }
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// List categories, their checkers, and skip switches.
pub fn list() -> Result<ExitCode> {
    let config = Config::load_or_default()?;

    eprintln!("{}", style("Categories (dispatch order):").bold());
    for category in Category::ALL {
        match config.checker(*category) {
            Some(checker) => {
                let mut notes = Vec::new();
                if checker.fix {
                    notes.push("fix");
                }
                if checker.optional {
                    notes.push("optional");
                }
                let notes = if notes.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", notes.join(", "))
                };
                eprintln!(
                    "  {} - {}{notes} (skip: {})",
                    style(category.name()).cyan(),
                    checker.command,
                    category.skip_env_var()
                );
            },
            None => {
                eprintln!(
                    "  {} - built-in guard (skip: {})",
                    style(category.name()).cyan(),
                    category.skip_env_var()
                );
            },
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Validate configuration.
pub fn validate() -> Result<ExitCode> {
    match Config::load() {
        Ok(config) => match config.validate() {
            Ok(()) => {
                eprintln!("{} Configuration is valid", style("\u{2713}").green());
                Ok(ExitCode::SUCCESS)
            },
            Err(e) => {
                eprintln!(
                    "{} Configuration validation failed: {e}",
                    style("\u{2717}").red()
                );
                Ok(ExitCode::FAILURE)
            },
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: cgate init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            eprintln!("{} Failed to load configuration: {e}", style("\u{2717}").red());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Show configuration.
pub fn config(raw: bool) -> Result<ExitCode> {
    match Config::find_config_file() {
        Ok(path) => {
            eprintln!("Configuration file: {}", path.display());

            if raw {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io("read config", e))?;
                eprintln!();
                std::io::stdout()
                    .write_all(content.as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            }

            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { .. }) => {
            eprintln!("{} No configuration file found", style("!").yellow());
            eprintln!("  Run: cgate init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e),
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "cgate",
        &mut std::io::stdout(),
    );
}
