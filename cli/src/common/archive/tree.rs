//! # reprotar Directory Import (`common::archive::tree`)
//!
//! File: cli/src/common/archive/tree.rs
//!
//! ## Overview
//!
//! Recursive import of an on-disk directory tree into an [`ArchiveBuilder`].
//!
//! The walk is done with `walkdir`, sorted by file name inside every
//! directory, so the archive never depends on the order the host filesystem
//! happens to list entries in. Directories are written before their contents
//! (pre-order), each subtree is finished before its next sibling starts.
//!
//! - Directories are added as directory entries with mode 0o755.
//! - Regular files are streamed from disk with the requested mode (0o644 by default).
//! - Symbolic links are followed; a link cycle surfaces as an I/O error.
//! - Sockets, FIFOs and device nodes are skipped with a warning.
//!
//! Names keep a leading `./` of the destination: importing into `./` gives
//! `./a`, `./a/c`, where `.` is the archive root and is never written.
//!
use super::entry::{EntryRequest, DEFAULT_FILE_MODE};
use super::writer::ArchiveBuilder;
use crate::common::path;
use crate::core::error::{ArchiveError, Result};
use anyhow::Context;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Deepest directory level imported before giving up.
pub const MAX_DEPTH: usize = 100;

impl<W: Write> ArchiveBuilder<W> {
    /// Imports the tree rooted at `source` under the logical path `dest`.
    ///
    /// `mode` applies to regular files only. If `source` is a file rather
    /// than a directory it is added as a single file at `dest`.
    pub fn add_dir(&mut self, dest: &str, source: &Path, mode: Option<u32>) -> Result<()> {
        self.ensure_open()?;
        let file_mode = mode.unwrap_or(DEFAULT_FILE_MODE);

        if !fs::metadata(source)?.is_dir() {
            return self.add_file_from_disk(dest, source, Some(file_mode));
        }

        debug!("Importing directory {} as '{}'", source.display(), dest);
        let walker = WalkDir::new(source).follow_links(true).sort_by_file_name();
        for item in walker {
            let item = item.map_err(io::Error::from)?;
            let relative = item
                .path()
                .strip_prefix(source)
                .with_context(|| format!("{} is outside of {}", item.path().display(), source.display()))?;
            let name = join_logical(dest, relative)?;
            let file_type = item.file_type();

            if file_type.is_dir() {
                self.add_tree_entry(EntryRequest::directory(name))?;
                if item.depth() >= MAX_DEPTH {
                    anyhow::bail!(ArchiveError::RecursionLimit {
                        path: item.path().display().to_string(),
                    });
                }
            } else if file_type.is_file() {
                self.add_tree_entry(disk_file_request(name, item.path(), Some(file_mode))?)?;
            } else {
                warn!("Skipping special file {}", item.path().display());
            }
        }
        Ok(())
    }

    /// Adds the regular file at `source` as `name`, streaming its content.
    /// The size is taken from the opened file; `mode` defaults to 0o644.
    pub fn add_file_from_disk(&mut self, name: &str, source: &Path, mode: Option<u32>) -> Result<()> {
        self.add_entry(disk_file_request(name, source, mode)?)
    }

    fn add_tree_entry(&mut self, request: EntryRequest<'_>) -> Result<()> {
        let path = path::normalize_tree(&request.name, self.root_prefix());
        self.add_normalized(request, path)
    }
}

/// Opens `source` and describes it as a regular file streamed from disk.
fn disk_file_request(
    name: impl Into<String>,
    source: &Path,
    mode: Option<u32>,
) -> Result<EntryRequest<'static>> {
    let file = File::open(source)?;
    let size = file.metadata()?.len();
    Ok(EntryRequest::file(name)
        .with_reader(Box::new(file), size)
        .with_mode(mode.unwrap_or(DEFAULT_FILE_MODE)))
}

/// Appends the `/`-separated form of `relative` to `dest`. A bare `.`
/// destination joins like an empty one.
fn join_logical(dest: &str, relative: &Path) -> Result<String> {
    let mut name = if dest == "." { String::new() } else { dest.to_string() };
    for component in relative.components() {
        let segment = component.as_os_str().to_str().ok_or_else(|| ArchiveError::InvalidName {
            name: relative.display().to_string(),
            reason: "file name is not valid UTF-8".to_string(),
        })?;
        if !name.is_empty() && !name.ends_with('/') {
            name.push('/');
        }
        name.push_str(segment);
    }
    Ok(name)
}
