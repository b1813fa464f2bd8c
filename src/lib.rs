//! # commit-gate
//!
//! Commit-time gate that classifies staged files and dispatches each class
//! to an external linter, aborting the commit on any failure.
//!
//! Given the staged file set, the gate first rejects non-portable file names
//! (any path byte outside printable ASCII), then partitions the files into
//! categories by extension, path segment, and shebang sniffing, routes each
//! category to its configured checker, and re-stages files that a
//! fix-capable checker rewrote. Categories run strictly in sequence and the
//! gate stops at the first hard failure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use commit_gate::{Config, GitRepo, Runner, SkipPolicy};
//!
//! #[tokio::main]
//! async fn main() -> commit_gate::Result<()> {
//!     let config = Config::load_or_default()?;
//!     let skip = SkipPolicy::from_env();
//!     let repo = GitRepo::discover()?;
//!
//!     let runner = Runner::new(config, skip, repo);
//!     let result = runner.run().await?;
//!
//!     if result.success() {
//!         Ok(())
//!     } else {
//!         std::process::exit(1);
//!     }
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/commit-gate/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cli;
pub mod config;
pub mod core;

// Re-export main types for convenience
pub use config::{Config, SkipPolicy};
pub use core::classify::{Category, FirstLineReader};
pub use core::error::{Error, Result};
pub use core::git::GitRepo;
pub use core::runner::{CategoryResult, GateResult, Runner};
