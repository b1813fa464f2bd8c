//! Configuration handling for commit-gate.
//!
//! This module provides configuration loading and validation, covering the
//! checker registry (`commit-gate.toml` overrides merged over built-in
//! defaults) and the env-sourced per-category skip policy.

use crate::core::classify::Category;
use crate::core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "commit-gate.toml";

/// Environment variable that bypasses the whole gate.
pub const SKIP_ALL_ENV_VAR: &str = "CGATE_SKIP";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Checker definitions keyed by category name. File entries override
    /// the built-in registry per key.
    pub checkers: HashMap<String, CheckerConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkers: default_checkers(),
        }
    }
}

impl Config {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file()?;
        Self::load_from(&path)
    }

    /// Loads configuration or returns defaults if not found.
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        // File entries win per key; everything else keeps its default
        for (name, spec) in default_checkers() {
            config.checkers.entry(name).or_insert(spec);
        }

        config.validate()?;

        Ok(config)
    }

    /// Finds the configuration file by searching up the directory tree.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;

        let mut current = cwd.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::ConfigNotFound {
            path: cwd.join(CONFIG_FILE_NAME),
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, checker) in &self.checkers {
            if name.parse::<Category>().is_err() {
                return Err(Error::ConfigInvalid {
                    field: format!("checkers.{name}"),
                    message: "Unknown category name".to_string(),
                });
            }

            if checker.command.is_empty() {
                return Err(Error::ConfigInvalid {
                    field: format!("checkers.{name}.command"),
                    message: "Command must not be empty".to_string(),
                });
            }

            if let Some(ref timeout) = checker.timeout {
                if humantime::parse_duration(timeout).is_err() {
                    return Err(Error::ConfigInvalid {
                        field: format!("checkers.{name}.timeout"),
                        message: format!("Invalid duration: {timeout}"),
                    });
                }
            }
        }

        Ok(())
    }

    /// Returns the checker registered for a category, if any. The filename
    /// guard has no external checker.
    #[must_use]
    pub fn checker(&self, category: Category) -> Option<&CheckerConfig> {
        self.checkers.get(category.name())
    }

    /// Generates default configuration as a string.
    #[must_use]
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Configuration for a single category's external checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Checker binary to invoke.
    pub command: String,
    /// Arguments placed before the target file list (config-file flags,
    /// suppression lists, fix switches).
    pub args: Vec<String>,
    /// Whether the checker rewrites files in place; successful runs trigger
    /// re-staging of the category's files.
    pub fix: bool,
    /// Whether the tool is environment-dependent. Missing optional tools are
    /// a soft warning; missing required tools fail the gate.
    pub optional: bool,
    /// Optional per-invocation timeout (humantime format, e.g. "5m").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            fix: false,
            optional: true,
            timeout: None,
        }
    }
}

impl CheckerConfig {
    fn new(command: &str, args: &[&str], fix: bool, optional: bool) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
            fix,
            optional,
            timeout: None,
        }
    }
}

/// The built-in checker registry.
///
/// Language linters are optional tools; the manifest and license-header
/// checkers are part of the repository toolchain and always required.
fn default_checkers() -> HashMap<String, CheckerConfig> {
    let mut checkers = HashMap::new();

    checkers.insert(
        Category::Markdown.name().to_string(),
        CheckerConfig::new(
            "remark",
            &["--quiet", "--output", "--rc-path", ".remarkrc"],
            true,
            true,
        ),
    );

    checkers.insert(
        Category::PackageManifest.name().to_string(),
        CheckerConfig::new("npmPkgJsonLint", &[], false, false),
    );

    checkers.insert(
        Category::HelpText.name().to_string(),
        CheckerConfig::new("lint-repl-help", &[], false, true),
    );

    checkers.insert(
        Category::JsSource.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::JsCli.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::JsExamples.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.examples.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::JsTests.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.tests.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::JsBenchmarks.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.benchmarks.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::Python.name().to_string(),
        CheckerConfig::new("pylint", &["--rcfile", ".pylintrc"], false, true),
    );

    checkers.insert(
        Category::R.name().to_string(),
        CheckerConfig::new("Rscript", &["etc/r/lint.R"], false, true),
    );

    checkers.insert(
        Category::CSource.name().to_string(),
        CheckerConfig::new(
            "cppcheck",
            &[
                "--error-exitcode=1",
                "--suppressions-list=etc/cppcheck/suppressions.txt",
            ],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::CExamples.name().to_string(),
        CheckerConfig::new(
            "cppcheck",
            &[
                "--error-exitcode=1",
                "--suppressions-list=etc/cppcheck/suppressions.examples.txt",
            ],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::CBenchmarks.name().to_string(),
        CheckerConfig::new(
            "cppcheck",
            &[
                "--error-exitcode=1",
                "--suppressions-list=etc/cppcheck/suppressions.benchmarks.txt",
            ],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::CTestFixtures.name().to_string(),
        CheckerConfig::new("cppcheck", &["--error-exitcode=1"], false, true),
    );

    checkers.insert(
        Category::Shell.name().to_string(),
        CheckerConfig::new("shellcheck", &[], false, true),
    );

    checkers.insert(
        Category::TypeDeclarations.name().to_string(),
        CheckerConfig::new(
            "eslint",
            &["--config", "etc/eslint/.eslintrc.typescript.js"],
            false,
            true,
        ),
    );

    checkers.insert(
        Category::LicenseHeaders.name().to_string(),
        CheckerConfig::new("lint-license-headers", &[], false, false),
    );

    checkers
}

/// Per-category skip switches, resolved once at process start.
///
/// A category whose `CGATE_SKIP_<CATEGORY>` environment variable is set to a
/// non-empty value is suppressed for the entire run. Immutable after
/// construction; no ambient global state is consulted later.
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    skipped: HashSet<Category>,
}

impl SkipPolicy {
    /// Resolves the skip switches from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var_os(var))
    }

    /// Resolves the skip switches from an injected variable lookup.
    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<std::ffi::OsString>,
    {
        let skipped = Category::ALL
            .iter()
            .copied()
            .filter(|category| lookup(category.skip_env_var()).is_some_and(|v| !v.is_empty()))
            .collect();

        Self { skipped }
    }

    /// A policy that skips nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A policy skipping exactly the given categories.
    #[must_use]
    pub fn skipping(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            skipped: categories.into_iter().collect(),
        }
    }

    /// Returns true if the category is suppressed for this run.
    #[must_use]
    pub fn is_skipped(&self, category: Category) -> bool {
        self.skipped.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Registry tests
    // =========================================================================

    #[test]
    fn test_default_registry_covers_all_dispatchable_categories() {
        let config = Config::default();
        for category in Category::dispatchable() {
            assert!(
                config.checker(category).is_some(),
                "missing checker for {category}"
            );
        }
    }

    #[test]
    fn test_filename_guard_has_no_checker() {
        let config = Config::default();
        assert!(config.checker(Category::Filenames).is_none());
    }

    #[test]
    fn test_required_checkers() {
        let config = Config::default();
        let manifest = config
            .checker(Category::PackageManifest)
            .expect("manifest checker");
        let license = config
            .checker(Category::LicenseHeaders)
            .expect("license checker");

        assert!(!manifest.optional);
        assert!(!license.optional);
    }

    #[test]
    fn test_language_linters_are_optional() {
        let config = Config::default();
        for category in [
            Category::JsSource,
            Category::Python,
            Category::R,
            Category::CSource,
            Category::Shell,
            Category::TypeDeclarations,
        ] {
            let checker = config.checker(category).expect("checker");
            assert!(checker.optional, "{category} should be optional");
        }
    }

    #[test]
    fn test_markdown_checker_is_fix_capable() {
        let config = Config::default();
        let markdown = config.checker(Category::Markdown).expect("checker");
        assert!(markdown.fix);
    }

    #[test]
    fn test_js_role_configs_are_distinct() {
        let config = Config::default();
        let source = config.checker(Category::JsSource).expect("checker");
        let examples = config.checker(Category::JsExamples).expect("checker");
        let tests = config.checker(Category::JsTests).expect("checker");
        let benchmarks = config.checker(Category::JsBenchmarks).expect("checker");

        assert_ne!(source.args, examples.args);
        assert_ne!(examples.args, tests.args);
        assert_ne!(tests.args, benchmarks.args);
    }

    #[test]
    fn test_c_role_suppression_lists_are_distinct() {
        let config = Config::default();
        let source = config.checker(Category::CSource).expect("checker");
        let examples = config.checker(Category::CExamples).expect("checker");
        let benchmarks = config.checker(Category::CBenchmarks).expect("checker");

        assert_ne!(source.args, examples.args);
        assert_ne!(examples.args, benchmarks.args);
    }

    // =========================================================================
    // Load / validate tests
    // =========================================================================

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_merges_defaults() {
        let temp = tempfile::TempDir::new().expect("create temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[checkers.markdown]
command = "markdownlint"
args = ["--fix"]
fix = true
"#,
        )
        .expect("write config");

        let config = Config::load_from(&path).expect("load config");

        // Override taken from the file
        let markdown = config.checker(Category::Markdown).expect("checker");
        assert_eq!(markdown.command, "markdownlint");

        // Unmentioned categories keep the built-ins
        let shell = config.checker(Category::Shell).expect("checker");
        assert_eq!(shell.command, "shellcheck");
    }

    #[test]
    fn test_unknown_category_key_rejected() {
        let temp = tempfile::TempDir::new().expect("create temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[checkers.fortran]
command = "flint"
"#,
        )
        .expect("write config");

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut config = Config::default();
        config.checkers.insert(
            Category::Markdown.name().to_string(),
            CheckerConfig::default(),
        );
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let mut config = Config::default();
        if let Some(checker) = config.checkers.get_mut(Category::Shell.name()) {
            checker.timeout = Some("not-a-duration".to_string());
        }
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_valid_timeout_accepted() {
        let mut config = Config::default();
        if let Some(checker) = config.checkers.get_mut(Category::Shell.name()) {
            checker.timeout = Some("5m".to_string());
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml = Config::default_toml();
        assert!(!toml.is_empty());
        assert!(toml.contains("[checkers.markdown]"));
        assert!(toml.contains("[checkers.license-headers]"));
    }

    // =========================================================================
    // SkipPolicy tests
    // =========================================================================

    #[test]
    fn test_skip_policy_none() {
        let policy = SkipPolicy::none();
        for category in Category::ALL {
            assert!(!policy.is_skipped(*category));
        }
    }

    #[test]
    fn test_skip_policy_skipping() {
        let policy = SkipPolicy::skipping([Category::Markdown, Category::Shell]);
        assert!(policy.is_skipped(Category::Markdown));
        assert!(policy.is_skipped(Category::Shell));
        assert!(!policy.is_skipped(Category::Python));
    }

    #[test]
    fn test_skip_policy_lookup_non_empty() {
        let policy = SkipPolicy::from_lookup(|var| {
            (var == "CGATE_SKIP_C_BENCHMARKS").then(|| "1".into())
        });

        assert!(policy.is_skipped(Category::CBenchmarks));
        assert!(!policy.is_skipped(Category::Markdown));
    }

    #[test]
    fn test_skip_policy_lookup_empty_value_runs() {
        let policy = SkipPolicy::from_lookup(|_| Some(std::ffi::OsString::new()));

        for category in Category::ALL {
            assert!(!policy.is_skipped(*category));
        }
    }
}
