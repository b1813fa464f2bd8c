//! Staged-file classification.
//!
//! Maps staged paths (and, for shell scripts, their first line) to lint
//! categories. Each category is evaluated as its own pass over the staged
//! set, so a file may be picked up by several passes (a JavaScript source
//! file is also visited by the license-header pass) while the predicates
//! within one pass stay disjoint.
//!
//! Matching is case-sensitive and suffix-anchored; path segments are matched
//! as whole `/`-delimited components, never as substrings.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// A classification bucket for staged files, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Filename portability guard (internal, no external checker).
    Filenames,
    /// Markdown documents.
    Markdown,
    /// `package.json` manifests (excluding `datapackage.json`).
    PackageManifest,
    /// REPL help text files (`repl.txt`).
    HelpText,
    /// Plain JavaScript source (outside examples, tests, benchmarks).
    JsSource,
    /// JavaScript CLI entry points (`bin/cli`).
    JsCli,
    /// JavaScript examples.
    JsExamples,
    /// JavaScript tests.
    JsTests,
    /// JavaScript benchmarks.
    JsBenchmarks,
    /// Python source.
    Python,
    /// R source.
    R,
    /// Plain C source (outside examples, tests, benchmarks).
    CSource,
    /// C examples.
    CExamples,
    /// C benchmarks.
    CBenchmarks,
    /// C test fixtures.
    CTestFixtures,
    /// Shell scripts (identified by bash shebang, not extension).
    Shell,
    /// TypeScript declaration files (`.d.ts`).
    TypeDeclarations,
    /// License header pass over the whole staged set.
    LicenseHeaders,
}

impl Category {
    /// All categories in their fixed dispatch order.
    pub const ALL: &'static [Self] = &[
        Self::Filenames,
        Self::Markdown,
        Self::PackageManifest,
        Self::HelpText,
        Self::JsSource,
        Self::JsCli,
        Self::JsExamples,
        Self::JsTests,
        Self::JsBenchmarks,
        Self::Python,
        Self::R,
        Self::CSource,
        Self::CExamples,
        Self::CBenchmarks,
        Self::CTestFixtures,
        Self::Shell,
        Self::TypeDeclarations,
        Self::LicenseHeaders,
    ];

    /// Categories dispatched to external checkers (everything after the
    /// filename guard).
    #[must_use]
    pub fn dispatchable() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(|c| *c != Self::Filenames)
    }

    /// Returns the category's kebab-case name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Filenames => "filenames",
            Self::Markdown => "markdown",
            Self::PackageManifest => "package-manifest",
            Self::HelpText => "help-text",
            Self::JsSource => "js-source",
            Self::JsCli => "js-cli",
            Self::JsExamples => "js-examples",
            Self::JsTests => "js-tests",
            Self::JsBenchmarks => "js-benchmarks",
            Self::Python => "python",
            Self::R => "r",
            Self::CSource => "c-source",
            Self::CExamples => "c-examples",
            Self::CBenchmarks => "c-benchmarks",
            Self::CTestFixtures => "c-test-fixtures",
            Self::Shell => "shell",
            Self::TypeDeclarations => "type-declarations",
            Self::LicenseHeaders => "license-headers",
        }
    }

    /// Returns the environment variable that skips this category.
    #[must_use]
    pub const fn skip_env_var(&self) -> &'static str {
        match self {
            Self::Filenames => "CGATE_SKIP_FILENAMES",
            Self::Markdown => "CGATE_SKIP_MARKDOWN",
            Self::PackageManifest => "CGATE_SKIP_PACKAGE_MANIFEST",
            Self::HelpText => "CGATE_SKIP_HELP_TEXT",
            Self::JsSource => "CGATE_SKIP_JS_SOURCE",
            Self::JsCli => "CGATE_SKIP_JS_CLI",
            Self::JsExamples => "CGATE_SKIP_JS_EXAMPLES",
            Self::JsTests => "CGATE_SKIP_JS_TESTS",
            Self::JsBenchmarks => "CGATE_SKIP_JS_BENCHMARKS",
            Self::Python => "CGATE_SKIP_PYTHON",
            Self::R => "CGATE_SKIP_R",
            Self::CSource => "CGATE_SKIP_C_SOURCE",
            Self::CExamples => "CGATE_SKIP_C_EXAMPLES",
            Self::CBenchmarks => "CGATE_SKIP_C_BENCHMARKS",
            Self::CTestFixtures => "CGATE_SKIP_C_TEST_FIXTURES",
            Self::Shell => "CGATE_SKIP_SHELL",
            Self::TypeDeclarations => "CGATE_SKIP_TYPE_DECLARATIONS",
            Self::LicenseHeaders => "CGATE_SKIP_LICENSE_HEADERS",
        }
    }

    /// Returns true if classification for this category needs the file's
    /// first line (shebang sniffing).
    #[must_use]
    pub const fn needs_first_line(&self) -> bool {
        matches!(self, Self::Shell)
    }

    /// Returns true if the path (and optional first line) belongs to this
    /// category's pass.
    #[must_use]
    pub fn matches(&self, path: &str, first_line: Option<&str>) -> bool {
        match self {
            // The guard inspects raw path bytes, not classified files.
            Self::Filenames => false,
            Self::Markdown => path.ends_with(".md"),
            Self::PackageManifest => {
                path.ends_with("package.json") && !path.ends_with("datapackage.json")
            },
            Self::HelpText => path.ends_with("repl.txt"),
            Self::JsSource => path.ends_with(".js") && is_plain_source(path),
            Self::JsCli => has_path_suffix(path, "bin/cli"),
            Self::JsExamples => path.ends_with(".js") && has_segment(path, "examples"),
            Self::JsTests => path.ends_with(".js") && has_segment(path, "test"),
            Self::JsBenchmarks => path.ends_with(".js") && has_segment(path, "benchmark"),
            Self::Python => path.ends_with(".py"),
            Self::R => path.ends_with(".R"),
            Self::CSource => path.ends_with(".c") && is_plain_source(path),
            Self::CExamples => path.ends_with(".c") && has_segment(path, "examples"),
            Self::CBenchmarks => path.ends_with(".c") && has_segment(path, "benchmark"),
            Self::CTestFixtures => path.ends_with(".c") && has_segments(path, "test/fixtures"),
            Self::Shell => first_line.is_some_and(is_bash_shebang),
            Self::TypeDeclarations => path.ends_with(".d.ts"),
            // The license-header pass spans every staged file; the external
            // tool ignores files it does not cover.
            Self::LicenseHeaders => true,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or_else(|| format!("Invalid category: {s}"))
    }
}

/// Root directory of build output; files under it are never plain source.
const BUILD_OUTPUT_ROOT: &str = "build/";

/// Returns true for paths outside the example/test/benchmark trees and the
/// build output root.
fn is_plain_source(path: &str) -> bool {
    !has_segment(path, "examples")
        && !has_segment(path, "test")
        && !has_segment(path, "benchmark")
        && !path.starts_with(BUILD_OUTPUT_ROOT)
}

/// Returns true if `segment` appears as a whole path component.
fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|part| part == segment)
}

/// Returns true if the consecutive components `a/b` appear in the path.
fn has_segments(path: &str, segments: &str) -> bool {
    let normalized = format!("/{path}/");
    normalized.contains(&format!("/{segments}/"))
}

/// Returns true if the path ends with the given `/`-delimited suffix.
fn has_path_suffix(path: &str, suffix: &str) -> bool {
    path == suffix || path.ends_with(&format!("/{suffix}"))
}

/// Returns true if the line is a bash shebang.
///
/// Accepted interpreters: `/bin/bash`, `/usr/bin/bash`, and
/// `/usr/bin/env bash`, with optional trailing arguments.
#[must_use]
pub fn is_bash_shebang(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("#!") else {
        return false;
    };

    let mut words = rest.split_whitespace();
    match words.next() {
        Some("/bin/bash" | "/usr/bin/bash") => true,
        Some("/usr/bin/env") => words.next() == Some("bash"),
        _ => false,
    }
}

/// Reads the first line of a file for content sniffing.
///
/// Injectable so classification can be tested against in-memory fixtures
/// instead of a real filesystem.
pub trait FirstLineReader {
    /// Returns the file's first line without the trailing newline, or None
    /// if the file cannot be read as text.
    fn first_line(&self, path: &Path) -> Option<String>;
}

/// Filesystem-backed first-line reader rooted at the repository.
#[derive(Debug, Clone)]
pub struct FsFirstLineReader {
    root: PathBuf,
}

impl FsFirstLineReader {
    /// Creates a reader resolving paths against the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FirstLineReader for FsFirstLineReader {
    fn first_line(&self, path: &Path) -> Option<String> {
        let file = std::fs::File::open(self.root.join(path)).ok()?;
        let mut line = String::new();
        std::io::BufReader::new(file).read_line(&mut line).ok()?;
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// In-memory first-line reader for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryFirstLineReader {
    lines: HashMap<PathBuf, String>,
}

impl MemoryFirstLineReader {
    /// Creates an empty reader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a first line for a path.
    pub fn insert(&mut self, path: impl Into<PathBuf>, line: impl Into<String>) {
        self.lines.insert(path.into(), line.into());
    }
}

impl FirstLineReader for MemoryFirstLineReader {
    fn first_line(&self, path: &Path) -> Option<String> {
        self.lines.get(path).cloned()
    }
}

/// Selects the files belonging to a category's pass, preserving staged order.
#[must_use]
pub fn files_for_category(
    category: Category,
    files: &[PathBuf],
    reader: &dyn FirstLineReader,
) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|file| {
            let path = file.to_string_lossy();
            let first_line = if category.needs_first_line() {
                reader.first_line(file)
            } else {
                None
            };
            category.matches(&path, first_line.as_deref())
        })
        .cloned()
        .collect()
}

/// Returns every category whose pass picks up the given file.
#[must_use]
pub fn categories_for(path: &Path, reader: &dyn FirstLineReader) -> Vec<Category> {
    let path_str = path.to_string_lossy();
    Category::dispatchable()
        .filter(|category| {
            let first_line = if category.needs_first_line() {
                reader.first_line(path)
            } else {
                None
            };
            category.matches(&path_str, first_line.as_deref())
        })
        .collect()
}
