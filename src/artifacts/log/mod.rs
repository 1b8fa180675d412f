//! Commit history traversal and rendering
//!
//! This module implements the `lode log` pipeline:
//!
//! - `sink`: byte sinks the rendered history streams into (pager, writer)
//! - `walker`: the parent-chain walk that fetches, decodes and renders one
//!   commit per iteration, newest first
//!
//! ## Algorithm
//!
//! The walk starts at HEAD and follows each record's parent reference until
//! it reaches the root commit (empty parent). Output is streamed: a block is
//! written as soon as its commit is decoded, so large histories display
//! without being buffered whole.

pub mod sink;
pub mod walker;
