//! # reprotar Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers used by the command front end. Import directly from the
//! submodule, e.g. `use crate::common::fs::io::is_executable;`.
//!

/// Contains basic file I/O operations (`read_file_to_string`, `is_executable`).
pub mod io;
