//! # cdbx - compilation database toolbox
//!
//! cdbx reads `compile_commands.json` files, merges them, selects a subset of
//! their entries, rewrites the compiler commands, writes the result back and
//! can re-run every command in parallel.
//!
//! ## Features
//!
//! - **Merge**: combine databases from several build trees, first entry wins
//! - **Filter**: keep or drop entries by explicit path or regex
//! - **Rewrite**: add flags, regex-replace, swap clang/gcc, absolutize includes
//! - **Run**: execute the rewritten commands on a bounded worker pool
//!
//! ## Quick Start
//!
//! ```bash
//! # Merge every database below build/ into ./compile_commands.json
//! cdbx --dir build --merge
//!
//! # Switch to clang, keep only C files and print the result
//! cdbx --file build/compile_commands.json --clang --filter-files '\.c$' -o stdout
//! ```
//!
//! ## Module Organization
//!
//! - [`cdb`] - Entry model, JSON parsing and database files
//! - [`merge`] - Deduplicating merge of several databases
//! - [`filter`] - Entry selection
//! - [`rewrite`] - Per-entry command rewriting
//! - [`exec`] - Parallel execution of the commands
//! - [`pipeline`] - Stages wired together

/// Compilation database model and file access.
pub mod cdb;

/// Configuration file parsing (`cdbx.toml`).
pub mod config;

/// Library error type.
pub mod error;

/// Parallel command execution.
pub mod exec;

/// Entry selection by path list or regex.
pub mod filter;

/// Merging several databases.
pub mod merge;

/// Path normalization and canonical identity.
pub mod paths;

/// Load, filter and rewrite in one go.
pub mod pipeline;

/// Compiler command rewriting.
pub mod rewrite;

/// Terminal UI utilities (tables, progress).
pub mod ui;

pub use cdb::{CommandStyle, CompileEntry, OutputTarget};
pub use error::{CdbError, Result};
