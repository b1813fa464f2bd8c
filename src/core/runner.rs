//! Gate runner: category dispatch and result aggregation.
//!
//! Runs the filename guard, then each category in its fixed order against
//! the staged file set, stopping at the first hard failure. Execution is
//! strictly sequential: checkers may mutate files on disk and the runner
//! re-stages after fix-capable successes, so ordering must be deterministic.

use crate::config::{CheckerConfig, Config, SkipPolicy};
use crate::core::classify::{files_for_category, Category, FirstLineReader, FsFirstLineReader};
use crate::core::error::{Error, Result};
use crate::core::executor::{CommandOutput, ExecuteOptions, Executor};
use crate::core::git::GitRepo;
use crate::core::guard::{check_portable_filenames, GuardVerdict};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// Failure label used when the filename guard rejects a path.
pub const GUARD_FAILURE_LABEL: &str = "non-ascii-filename";

/// Result of running a single category.
#[derive(Debug, Clone)]
pub struct CategoryResult {
    /// The category this result belongs to.
    pub category: Category,
    /// Whether the external checker was actually invoked.
    pub attempted: bool,
    /// Exit status of the checker (0 when not attempted).
    pub exit_status: i32,
    /// Whether files were rewritten and re-staged after a successful
    /// fix-capable run.
    pub fixed_files: bool,
    /// Whether the category was suppressed by the skip policy.
    pub skipped: bool,
    /// Checker output, present iff attempted.
    pub output: Option<CommandOutput>,
}

impl CategoryResult {
    fn skipped(category: Category) -> Self {
        Self {
            category,
            attempted: false,
            exit_status: 0,
            fixed_files: false,
            skipped: true,
            output: None,
        }
    }

    fn empty(category: Category) -> Self {
        Self {
            category,
            attempted: false,
            exit_status: 0,
            fixed_files: false,
            skipped: false,
            output: None,
        }
    }

    fn tool_missing(category: Category, hard: bool) -> Self {
        Self {
            category,
            // A missing required tool counts as an attempt that failed
            attempted: hard,
            exit_status: if hard { 127 } else { 0 },
            fixed_files: false,
            skipped: false,
            output: None,
        }
    }

    /// Returns true if this category did not fail the gate.
    #[must_use]
    pub const fn passed(&self) -> bool {
        !self.attempted || self.exit_status == 0
    }
}

/// Result of a full gate run.
#[derive(Debug)]
pub struct GateResult {
    /// Filename guard verdict.
    pub guard: GuardVerdict,
    /// Per-category outcomes, in dispatch order, up to the first hard
    /// failure.
    pub categories: Vec<CategoryResult>,
    /// Total duration.
    pub duration: Duration,
}

impl GateResult {
    /// Returns true if the commit may proceed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.guard.passed() && self.categories.iter().all(CategoryResult::passed)
    }

    /// Returns the label of the failing check, if any.
    #[must_use]
    pub fn failure_label(&self) -> Option<String> {
        if !self.guard.passed() {
            return Some(GUARD_FAILURE_LABEL.to_string());
        }
        self.failed_category().map(|r| r.category.name().to_string())
    }

    /// Returns the failing category result, if any.
    #[must_use]
    pub fn failed_category(&self) -> Option<&CategoryResult> {
        self.categories.iter().find(|r| !r.passed())
    }

    /// Returns the number of categories whose checker ran and passed.
    #[must_use]
    pub fn attempted_count(&self) -> usize {
        self.categories
            .iter()
            .filter(|r| r.attempted && r.passed())
            .count()
    }

    /// Returns the number of skipped categories.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.categories.iter().filter(|r| r.skipped).count()
    }
}

/// Runner executing the gate against a repository.
pub struct Runner {
    config: Config,
    skip: SkipPolicy,
    repo: GitRepo,
    reader: Box<dyn FirstLineReader + Send + Sync>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .field("skip", &self.skip)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Creates a runner with a filesystem-backed first-line reader.
    #[must_use]
    pub fn new(config: Config, skip: SkipPolicy, repo: GitRepo) -> Self {
        let reader = Box::new(FsFirstLineReader::new(repo.root()));
        Self {
            config,
            skip,
            repo,
            reader,
        }
    }

    /// Creates a runner with an injected first-line reader.
    #[must_use]
    pub fn with_reader(
        config: Config,
        skip: SkipPolicy,
        repo: GitRepo,
        reader: Box<dyn FirstLineReader + Send + Sync>,
    ) -> Self {
        Self {
            config,
            skip,
            repo,
            reader,
        }
    }

    /// Runs the gate: guard first, then every category in order,
    /// short-circuiting on the first hard failure.
    pub async fn run(&self) -> Result<GateResult> {
        let start = std::time::Instant::now();

        // The guard runs before anything else touches the staged paths
        if !self.skip.is_skipped(Category::Filenames) {
            let raw_paths = self.repo.staged_paths_raw()?;
            let verdict = check_portable_filenames(&raw_paths);
            if let GuardVerdict::NonPortable { ref path } = verdict {
                eprintln!("{} {GUARD_FAILURE_LABEL}: {path}", style("\u{2717}").red());
            }
            if !verdict.passed() {
                return Ok(GateResult {
                    guard: verdict,
                    categories: Vec::new(),
                    duration: start.elapsed(),
                });
            }
        }

        let staged = self.repo.staged_files()?;
        tracing::debug!(staged = staged.len(), "staged files collected");

        let mut results = Vec::new();

        for category in Category::dispatchable() {
            let result = self.run_category(category, &staged).await?;
            let failed = !result.passed();
            results.push(result);

            // First hard failure aborts the run; later categories are
            // never attempted
            if failed {
                break;
            }
        }

        Ok(GateResult {
            guard: GuardVerdict::Ok,
            categories: results,
            duration: start.elapsed(),
        })
    }

    /// Runs a single category against the staged set.
    pub async fn run_category(
        &self,
        category: Category,
        staged: &[PathBuf],
    ) -> Result<CategoryResult> {
        if self.skip.is_skipped(category) {
            tracing::debug!(%category, "category skipped by policy");
            return Ok(CategoryResult::skipped(category));
        }

        let files = files_for_category(category, staged, self.reader.as_ref());
        if files.is_empty() {
            // An empty file set never invokes the external checker
            return Ok(CategoryResult::empty(category));
        }

        let checker = self
            .config
            .checker(category)
            .ok_or_else(|| Error::Internal {
                message: format!("No checker registered for category {category}"),
            })?;

        if !Executor::command_exists(&checker.command) {
            if checker.optional {
                tracing::warn!(%category, command = %checker.command, "optional checker not installed, skipping");
                eprintln!(
                    "{} {category}: {} not installed, skipping",
                    style("!").yellow(),
                    checker.command
                );
                return Ok(CategoryResult::tool_missing(category, false));
            }

            eprintln!(
                "{} {category}: required checker {} not found",
                style("\u{2717}").red(),
                checker.command
            );
            return Ok(CategoryResult::tool_missing(category, true));
        }

        let output = self.invoke_checker(category, checker, &files).await?;

        // Exit status is decided first; fixes are re-staged only after a
        // zero exit so a failing fixer never alters the index
        let fixed = checker.fix && output.success();
        if fixed {
            tracing::debug!(%category, files = files.len(), "re-staging fixed files");
            self.repo.add(&files)?;
        }

        Ok(CategoryResult {
            category,
            attempted: true,
            exit_status: output.exit_code,
            fixed_files: fixed,
            skipped: false,
            output: Some(output),
        })
    }

    async fn invoke_checker(
        &self,
        category: Category,
        checker: &CheckerConfig,
        files: &[PathBuf],
    ) -> Result<CommandOutput> {
        let mut args = checker.args.clone();
        args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));

        let mut options = ExecuteOptions::default().cwd(self.repo.root());
        if let Some(ref timeout) = checker.timeout {
            if let Ok(duration) = humantime::parse_duration(timeout) {
                options = options.timeout(duration);
            }
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .ok()
                .unwrap_or_else(ProgressStyle::default_spinner),
        );
        pb.set_message(format!("Linting {category} ({} files)...", files.len()));
        pb.enable_steady_tick(Duration::from_millis(100));

        let executor = Executor::new();
        let output = executor.execute(&checker.command, &args, options).await?;

        pb.finish_and_clear();

        if output.success() {
            eprintln!("{} {category}", style("\u{2713}").green());
        } else if output.timed_out {
            eprintln!("{} {category} (timed out)", style("\u{2717}").red());
        } else {
            eprintln!("{} {category}", style("\u{2717}").red());
        }

        Ok(output)
    }
}
