//! Git repository operations.
//!
//! This module provides the version-control boundary for the gate: finding
//! the repository root, listing staged files, byte-exact staged path output
//! for the filename guard, and re-staging files after a fixer ran.

use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// The well-known git empty-tree object, used as the diff base when the
/// repository has no commits yet.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (where .git is).
    root: PathBuf,
    /// Path to the .git directory (or file for worktrees).
    git_dir: PathBuf,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover() -> Result<Self> {
        Self::discover_from(&std::env::current_dir().map_err(|e| Error::io("get current dir", e))?)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel", "--git-dir"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();

        let root = lines.next().map(PathBuf::from).ok_or(Error::NotGitRepo)?;

        let git_dir = lines
            .next()
            .map(|s| {
                let p = PathBuf::from(s);
                if p.is_absolute() {
                    p
                } else {
                    root.join(p)
                }
            })
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, git_dir })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .git directory path.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the hooks directory path.
    #[must_use]
    pub fn hooks_dir(&self) -> PathBuf {
        // Check for custom hooks path first
        if let Ok(output) = Command::new("git")
            .args(["config", "--get", "core.hooksPath"])
            .current_dir(&self.root)
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    let hooks_path = PathBuf::from(&path);
                    if hooks_path.is_absolute() {
                        return hooks_path;
                    }
                    return self.root.join(hooks_path);
                }
            }
        }

        // Default to .git/hooks
        self.git_dir.join("hooks")
    }

    /// Returns the path to a specific hook.
    #[must_use]
    pub fn hook_path(&self, hook_name: &str) -> PathBuf {
        self.hooks_dir().join(hook_name)
    }

    /// Returns the diff base for the staged changes: `HEAD` when a previous
    /// commit exists, the empty-tree sentinel otherwise.
    #[must_use]
    pub fn diff_base(&self) -> &'static str {
        let has_head = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", "HEAD"])
            .current_dir(&self.root)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);

        if has_head {
            "HEAD"
        } else {
            EMPTY_TREE
        }
    }

    /// Returns the list of staged files, relative to the repository root.
    ///
    /// Covers added, copied, modified, and renamed entries of the staged
    /// diff, in the order git reports them.
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let base = self.diff_base();
        let output = Command::new("git")
            .args([
                "diff",
                "--cached",
                "--name-only",
                "--diff-filter=ACMR",
                base,
            ])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("get staged files", e))?;

        if !output.status.success() {
            return Err(Error::git("diff --cached", "Failed to get staged files"));
        }

        let files = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();

        Ok(files)
    }

    /// Returns the staged paths as raw bytes, NUL-separated by git.
    ///
    /// The filename guard needs the exact on-disk bytes of each path; the
    /// line-oriented listing would mangle non-UTF-8 and quoted names.
    pub fn staged_paths_raw(&self) -> Result<Vec<Vec<u8>>> {
        let base = self.diff_base();
        let output = Command::new("git")
            .args([
                "diff",
                "--cached",
                "--name-only",
                "-z",
                "--diff-filter=ACMR",
                base,
            ])
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("get staged paths", e))?;

        if !output.status.success() {
            return Err(Error::git("diff --cached -z", "Failed to get staged paths"));
        }

        let paths = output
            .stdout
            .split(|&b| b == 0)
            .filter(|p| !p.is_empty())
            .map(<[u8]>::to_vec)
            .collect();

        Ok(paths)
    }

    /// Re-stages the given files (relative to the repository root).
    ///
    /// Used after a fix-capable checker succeeded, so the commit picks up
    /// whatever the checker rewrote on disk.
    pub fn add(&self, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }

        let output = Command::new("git")
            .arg("add")
            .arg("--")
            .args(files)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io("re-stage files", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git("add", stderr.trim().to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path();

        Command::new("git")
            .args(["init"])
            .current_dir(path)
            .output()
            .expect("init repo");

        Command::new("git")
            .args(["config", "user.email", "test@test.com"])
            .current_dir(path)
            .output()
            .expect("set email");

        Command::new("git")
            .args(["config", "user.name", "Test"])
            .current_dir(path)
            .output()
            .expect("set name");

        let repo = GitRepo::discover_from(path).expect("discover repo");
        (temp, repo)
    }

    fn commit_all(path: &Path, message: &str) {
        Command::new("git")
            .args(["add", "."])
            .current_dir(path)
            .output()
            .expect("stage");
        Command::new("git")
            .args(["commit", "-m", message])
            .current_dir(path)
            .output()
            .expect("commit");
    }

    // =========================================================================
    // Discovery tests
    // =========================================================================

    #[test]
    fn test_discover_repo() {
        let (_temp, repo) = create_test_repo();
        assert!(repo.root().exists());
        assert!(repo.git_dir().exists());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (temp, _) = create_test_repo();

        let subdir = temp.path().join("lib/node_modules");
        std::fs::create_dir_all(&subdir).expect("create subdir");

        let repo = GitRepo::discover_from(&subdir).expect("discover from subdir");
        // Canonicalize both paths to handle macOS /var -> /private/var symlinks
        let expected = temp.path().canonicalize().expect("canonicalize temp");
        let actual = repo.root().canonicalize().expect("canonicalize root");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_not_git_repo() {
        let temp = TempDir::new().expect("create temp dir");
        let result = GitRepo::discover_from(temp.path());
        assert!(matches!(result, Err(Error::NotGitRepo)));
    }

    // =========================================================================
    // Hooks tests
    // =========================================================================

    #[test]
    fn test_hooks_dir() {
        let (_temp, repo) = create_test_repo();
        let hooks_dir = repo.hooks_dir();
        assert!(hooks_dir.ends_with("hooks"));
    }

    #[test]
    fn test_hook_path() {
        let (_temp, repo) = create_test_repo();
        let hook_path = repo.hook_path("pre-commit");
        assert!(hook_path.ends_with("pre-commit"));
        assert!(hook_path.to_string_lossy().contains("hooks"));
    }

    // =========================================================================
    // Diff base tests
    // =========================================================================

    #[test]
    fn test_diff_base_no_commits() {
        let (_temp, repo) = create_test_repo();
        assert_eq!(repo.diff_base(), EMPTY_TREE);
    }

    #[test]
    fn test_diff_base_with_commit() {
        let (temp, repo) = create_test_repo();
        std::fs::write(temp.path().join("initial.txt"), "initial").expect("write file");
        commit_all(temp.path(), "initial");

        assert_eq!(repo.diff_base(), "HEAD");
    }

    // =========================================================================
    // Staged files tests
    // =========================================================================

    #[test]
    fn test_staged_files_empty() {
        let (_temp, repo) = create_test_repo();

        let staged = repo.staged_files().expect("get staged files");
        assert!(staged.is_empty());
    }

    #[test]
    fn test_staged_files_before_first_commit() {
        let (temp, repo) = create_test_repo();

        std::fs::write(temp.path().join("new_file.txt"), "content").expect("write file");
        Command::new("git")
            .args(["add", "new_file.txt"])
            .current_dir(temp.path())
            .output()
            .expect("stage file");

        // No HEAD yet; the listing must still work against the empty tree
        let staged = repo.staged_files().expect("get staged files");
        assert_eq!(staged, vec![PathBuf::from("new_file.txt")]);
    }

    #[test]
    fn test_staged_files_relative_paths() {
        let (temp, repo) = create_test_repo();

        std::fs::create_dir_all(temp.path().join("lib")).expect("create dir");
        std::fs::write(temp.path().join("lib/foo.js"), "code").expect("write file");
        Command::new("git")
            .args(["add", "."])
            .current_dir(temp.path())
            .output()
            .expect("stage files");

        let staged = repo.staged_files().expect("get staged files");
        assert_eq!(staged, vec![PathBuf::from("lib/foo.js")]);
    }

    #[test]
    fn test_staged_files_modified_after_commit() {
        let (temp, repo) = create_test_repo();

        std::fs::write(temp.path().join("a.md"), "# a").expect("write file");
        commit_all(temp.path(), "initial");

        std::fs::write(temp.path().join("a.md"), "# a changed").expect("modify file");
        Command::new("git")
            .args(["add", "a.md"])
            .current_dir(temp.path())
            .output()
            .expect("stage file");

        let staged = repo.staged_files().expect("get staged files");
        assert_eq!(staged, vec![PathBuf::from("a.md")]);
    }

    // =========================================================================
    // Raw path tests
    // =========================================================================

    #[test]
    fn test_staged_paths_raw_bytes() {
        let (temp, repo) = create_test_repo();

        std::fs::write(temp.path().join("plain.txt"), "x").expect("write file");
        Command::new("git")
            .args(["add", "."])
            .current_dir(temp.path())
            .output()
            .expect("stage files");

        let raw = repo.staged_paths_raw().expect("get raw paths");
        assert_eq!(raw, vec![b"plain.txt".to_vec()]);
    }

    #[test]
    fn test_staged_paths_raw_empty() {
        let (_temp, repo) = create_test_repo();
        let raw = repo.staged_paths_raw().expect("get raw paths");
        assert!(raw.is_empty());
    }

    // =========================================================================
    // Re-stage tests
    // =========================================================================

    #[test]
    fn test_add_restages_modified_file() {
        let (temp, repo) = create_test_repo();

        std::fs::write(temp.path().join("fixme.md"), "unfixed").expect("write file");
        Command::new("git")
            .args(["add", "fixme.md"])
            .current_dir(temp.path())
            .output()
            .expect("stage file");

        // Simulate a fixer mutating the file on disk
        std::fs::write(temp.path().join("fixme.md"), "fixed").expect("rewrite file");
        repo.add(&[PathBuf::from("fixme.md")]).expect("re-stage");

        // The index should now hold the fixed content
        let output = Command::new("git")
            .args(["show", ":fixme.md"])
            .current_dir(temp.path())
            .output()
            .expect("show index");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "fixed");
    }

    #[test]
    fn test_add_empty_list_is_noop() {
        let (_temp, repo) = create_test_repo();
        repo.add(&[]).expect("no-op add");
    }

    // =========================================================================
    // Clone / Debug tests
    // =========================================================================

    #[test]
    fn test_git_repo_clone() {
        let (_temp, repo) = create_test_repo();
        let cloned = repo.clone();
        assert_eq!(repo.root(), cloned.root());
        assert_eq!(repo.git_dir(), cloned.git_dir());
    }

    #[test]
    fn test_git_repo_debug() {
        let (_temp, repo) = create_test_repo();
        let debug_str = format!("{:?}", repo);
        assert!(debug_str.contains("GitRepo"));
    }
}
