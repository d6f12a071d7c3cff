//! # reprotar Filesystem I/O Helpers
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! Small wrappers around `std::fs` used by the command front end:
//!
//! - **`read_file_to_string`**: reads a whole file, adding the path to any error.
//! - **`is_executable`**: whether a source file has any execute bit set, which
//!   decides the default mode of files added from the command line.
//!
//! The archive engine itself does not use these helpers. It propagates raw
//! `std::io::Error`s without context.
//!
use crate::core::error::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads the entire content of a file into a string.
///
/// # Errors
///
/// Returns an `Err` if the file cannot be found, opened, or read, with
/// context indicating which file failed.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Returns `true` if any of the owner/group/other execute bits of `path` is set.
///
/// Only the permission bits stored on the file are consulted, never the
/// identity of the current user, so the answer is the same on every machine
/// holding the same tree. On platforms without Unix permissions this is
/// always `false`.
pub fn is_executable(path: &Path) -> Result<bool> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to read metadata of {:?}", path))?;
    let executable = has_exec_bits(&metadata);
    debug!("{:?} executable: {}", path, executable);
    Ok(executable)
}

#[cfg(unix)]
fn has_exec_bits(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bits(_metadata: &fs::Metadata) -> bool {
    false
}
