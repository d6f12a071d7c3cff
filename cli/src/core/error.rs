//! # reprotar Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout reprotar. Library-level
//! failures that callers may want to match on are variants of [`ArchiveError`];
//! everything travels as an `anyhow::Error` so command handlers can attach
//! context with `anyhow::Context`.
//!
//! ## Architecture
//!
//! - `ArchiveError`: a `thiserror` enum for configuration, state and naming errors.
//! - `Result<T>`: a type alias for `anyhow::Result<T>`.
//!
//! I/O failures raised while writing the archive or reading source files are
//! **not** wrapped in `ArchiveError`. They are propagated as-is so that
//! `err.downcast_ref::<std::io::Error>()` keeps working for callers.
//!
//! ## Examples
//!
//! ```rust
//! // Pattern matching on a specific failure
//! match builder.add_file("a", EntryKind::File, None, None) {
//!     Err(e) if matches!(e.downcast_ref::<ArchiveError>(), Some(ArchiveError::Closed)) => {
//!         println!("builder already closed");
//!     }
//!     other => other?,
//! }
//! ```
//!
use thiserror::Error;

/// Custom error type for the archive engine and its configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArchiveError {
    /// `default_mtime` was neither an integer nor `"portable"`.
    #[error("Invalid default mtime '{0}': expected an integer or \"portable\"")]
    InvalidMtime(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An add-operation was attempted after `close`.
    #[error("Archive has already been closed")]
    Closed,

    #[error("Invalid entry name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Recursion depth exceeded at '{path}', probably an infinite directory loop")]
    RecursionLimit { path: String },

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;
