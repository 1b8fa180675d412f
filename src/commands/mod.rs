//! Command implementations
//!
//! This module contains all command implementations, organized into two
//! categories:
//!
//! - `plumbing`: low-level commands for direct object inspection (show)
//! - `porcelain`: user-facing commands for everyday workflows (init,
//!   commit, log)
//!
//! Plumbing commands provide building blocks, while porcelain commands
//! compose them into higher-level operations.

pub mod plumbing;
pub mod porcelain;
