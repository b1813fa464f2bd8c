//! Core functionality for commit-gate.
//!
//! This module contains the classification, dispatch, and git plumbing:
//! - `classify`: staged-file categories and predicates
//! - `error`: error types
//! - `executor`: checker process execution
//! - `git`: git repository operations
//! - `guard`: filename portability guard
//! - `runner`: gate orchestration

pub mod classify;
pub mod error;
pub mod executor;
pub mod git;
pub mod guard;
pub mod runner;
