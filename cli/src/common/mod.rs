//! # reprotar Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared building blocks used by the command front end (`commands::`) on top
//! of the core infrastructure (`core::`).
//!
//! ## Architecture
//!
//! - **`archive`**: the deterministic tar writer (`ArchiveBuilder`) and its entry types.
//! - **`fs`**: filesystem helpers for the front end (argument files, executable bits).
//! - **`path`**: canonicalization of logical archive paths and ancestor computation.
//!
//! ```rust
//! use crate::common::{archive, path};
//!
//! let p = path::normalize("./bin/tool", Some("pkg"));
//! assert_eq!(p.name, "pkg/bin/tool");
//! ```
//!

/// Deterministic tar archive writing.
pub mod archive;
/// Utilities for filesystem operations used by the front end.
pub mod fs;
/// Logical path normalization.
pub mod path;
