//! # reprotar Archive Builder (`common::archive::writer`)
//!
//! File: cli/src/common/archive/writer.rs
//!
//! ## Overview
//!
//! [`ArchiveBuilder`] is the archive-writing engine. It accepts "add this
//! path" requests and writes a normalized, reproducible stream of tar entries:
//!
//! - paths are canonicalized by `common::path::normalize`;
//! - every missing ancestor directory is written once, right before the
//!   first entry that needs it;
//! - a directory added again (explicitly or through backfill) is skipped, so
//!   its first occurrence wins;
//! - mode, mtime and ownership come from fixed defaults, never from the host.
//!
//! Entries are written immediately and never reordered. The only state kept is
//! the set of directories already written.
//!
//! ## Lifecycle
//!
//! `open`/`new` → any number of `add_*` calls → `close` (or `finish`).
//! Adding after `close` fails with [`ArchiveError::Closed`]; `close` itself may
//! be called again. A builder dropped without `close` still writes the
//! end-of-archive blocks (errors are ignored in that path).
//!
//! ```rust
//! let options = ArchiveOptions {
//!     default_mtime: DefaultMtime::Portable,
//!     root_directory: Some("pkg".into()),
//!     ..Default::default()
//! };
//! let mut builder = ArchiveBuilder::open(Path::new("out.tar"), options)?;
//! builder.add_file("bin/tool", EntryKind::File, Some(b"#!/bin/sh\n"), Some(0o755))?;
//! builder.close()?;
//! ```
//!
use super::entry::{
    DuplicatePolicy, Entry, EntryContent, EntryKind, EntryRequest, Ownership,
};
use super::header;
use crate::common::path::{self, NormalizedPath};
use crate::core::config::DefaultMtime;
use crate::core::error::{ArchiveError, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Construction-time settings of an [`ArchiveBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub default_mtime: DefaultMtime,
    /// Prefix placed in front of every entry, written first as a directory.
    pub root_directory: Option<String>,
    /// Owner recorded for entries that don't set their own.
    pub ownership: Ownership,
    pub duplicates: DuplicatePolicy,
}

/// Deterministic tar writer. See the module documentation.
pub struct ArchiveBuilder<W: Write> {
    /// `None` once closed.
    tar: Option<tar::Builder<W>>,
    emitted_directories: BTreeSet<String>,
    /// Only consulted under [`DuplicatePolicy::KeepFirst`].
    emitted_files: HashSet<String>,
    default_mtime: u64,
    root_prefix: Option<String>,
    ownership: Ownership,
    duplicates: DuplicatePolicy,
}

impl ArchiveBuilder<File> {
    /// Creates (or truncates) the archive at `output` and opens a builder on it.
    pub fn open(output: &Path, options: ArchiveOptions) -> Result<Self> {
        let file = File::create(output)?;
        info!("Writing archive to {}", output.display());
        Self::new(file, options)
    }
}

impl<W: Write> ArchiveBuilder<W> {
    /// Opens a builder writing to `writer`.
    ///
    /// When a root directory is configured it is written immediately, before
    /// any caller entry.
    pub fn new(writer: W, options: ArchiveOptions) -> Result<Self> {
        let root_prefix = options
            .root_directory
            .as_deref()
            .map(|root| path::normalize(root, None).name)
            .filter(|root| !root.is_empty());
        let default_mtime = options.default_mtime.resolve();
        debug!(
            "Opening archive builder (default_mtime={}, root={:?})",
            default_mtime, root_prefix
        );

        let mut builder = Self {
            tar: Some(tar::Builder::new(writer)),
            emitted_directories: BTreeSet::new(),
            emitted_files: HashSet::new(),
            default_mtime,
            root_prefix,
            ownership: options.ownership,
            duplicates: options.duplicates,
        };

        if builder.root_prefix.is_some() {
            builder.add_entry(EntryRequest::directory(""))?;
        }
        Ok(builder)
    }

    /// The mtime given to entries that don't set their own.
    #[cfg(test)]
    pub fn default_mtime(&self) -> u64 {
        self.default_mtime
    }

    pub fn root_prefix(&self) -> Option<&str> {
        self.root_prefix.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.tar.is_none()
    }

    /// Canonical directory names written so far.
    #[cfg(test)]
    pub fn emitted_directories(&self) -> impl Iterator<Item = &str> {
        self.emitted_directories.iter().map(String::as_str)
    }

    /// Adds one entry.
    ///
    /// Missing ancestors of `name` are written first. If `name` was already
    /// written as a directory nothing else happens. `data` sets the content
    /// of a regular file; `mode` defaults to 0o644 for files and 0o755 for
    /// directories.
    pub fn add_file(
        &mut self,
        name: &str,
        kind: EntryKind,
        data: Option<&[u8]>,
        mode: Option<u32>,
    ) -> Result<()> {
        let mut request = EntryRequest::new(name, kind);
        if let Some(data) = data {
            request = request.with_data(data);
        }
        request.mode = mode;
        self.add_entry(request)
    }

    /// Adds a symbolic link pointing at `target`. The target is not resolved.
    pub fn add_symlink(&mut self, name: &str, target: &str) -> Result<()> {
        self.add_entry(EntryRequest::symlink(name, target))
    }

    /// Adds one entry described by `request`. This is the general form of
    /// [`ArchiveBuilder::add_file`].
    pub fn add_entry(&mut self, request: EntryRequest<'_>) -> Result<()> {
        let path = path::normalize(&request.name, self.root_prefix.as_deref());
        self.add_normalized(request, path)
    }

    /// Adds `request` under the already normalized `path`.
    pub(crate) fn add_normalized(
        &mut self,
        request: EntryRequest<'_>,
        path: NormalizedPath,
    ) -> Result<()> {
        self.ensure_open()?;
        let ownership = request
            .ownership
            .clone()
            .unwrap_or_else(|| self.ownership.clone());

        self.backfill(&path, &ownership)?;

        if path.is_root() {
            if request.kind == EntryKind::Directory {
                debug!("Skipping '{}': the archive root is implicit", request.name);
                return Ok(());
            }
            anyhow::bail!(ArchiveError::InvalidName {
                name: request.name,
                reason: format!("a {} entry needs a non-empty name", request.kind),
            });
        }

        if self.emitted_directories.contains(&path.name) {
            debug!("Directory '{}' already written, skipping", path.name);
            return Ok(());
        }

        if request.kind != EntryKind::Directory
            && self.duplicates == DuplicatePolicy::KeepFirst
            && !self.emitted_files.insert(path.name.clone())
        {
            warn!(
                "Duplicate file in archive: {}, picking first occurrence",
                path.name
            );
            return Ok(());
        }

        let (size, mut content): (u64, Box<dyn Read + '_>) = match request.kind {
            EntryKind::File => match request.content {
                EntryContent::Empty => (0, Box::new(io::empty())),
                EntryContent::Bytes(bytes) => (bytes.len() as u64, Box::new(bytes)),
                EntryContent::Reader { reader, size } => {
                    (size, Box::new(SizedReader::new(reader, size)))
                }
            },
            EntryKind::Directory | EntryKind::Symlink => (0, Box::new(io::empty())),
        };

        let entry = Entry {
            kind: request.kind,
            size,
            mode: request.mode.unwrap_or_else(|| request.kind.default_mode()),
            mtime: request.mtime.unwrap_or(self.default_mtime),
            ownership,
            link_target: match request.kind {
                EntryKind::Symlink => request.link_target,
                _ => None,
            },
            name: path.name,
        };
        self.write_entry(&entry, &mut content)?;

        if entry.kind == EntryKind::Directory {
            self.emitted_directories.insert(entry.name);
        }
        Ok(())
    }

    /// Finalizes the archive. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(tar) = self.tar.take() {
            let mut inner = tar.into_inner()?;
            inner.flush()?;
            info!(
                "Archive finalized ({} directories written)",
                self.emitted_directories.len()
            );
        }
        Ok(())
    }

    /// Finalizes the archive and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let tar = self.tar.take().ok_or(ArchiveError::Closed)?;
        let mut inner = tar.into_inner()?;
        inner.flush()?;
        Ok(inner)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            anyhow::bail!(ArchiveError::Closed);
        }
        Ok(())
    }

    /// Writes every ancestor of `path` not written yet.
    fn backfill(&mut self, path: &NormalizedPath, ownership: &Ownership) -> Result<()> {
        for ancestor in &path.ancestors {
            if self.emitted_directories.contains(ancestor) {
                continue;
            }
            let entry = Entry::directory(ancestor.clone(), self.default_mtime, ownership.clone());
            self.write_entry(&entry, &mut io::empty())?;
            self.emitted_directories.insert(ancestor.clone());
        }
        Ok(())
    }

    fn write_entry(&mut self, entry: &Entry, data: &mut dyn Read) -> Result<()> {
        let tar = self.tar.as_mut().ok_or(ArchiveError::Closed)?;
        header::append_entry(tar, entry, data)?;
        debug!(
            "Added {} '{}' (size={}, mode={:o}, mtime={})",
            entry.kind, entry.name, entry.size, entry.mode, entry.mtime
        );
        Ok(())
    }
}

/// Reads exactly `remaining` bytes from `inner`.
///
/// The header already promised that many bytes, so a source ending early is
/// an `UnexpectedEof` error rather than a short member. Extra bytes are never
/// read.
struct SizedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> SizedReader<R> {
    fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read> Read for SizedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let limit = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        let read = self.inner.read(&mut buf[..limit])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("content ended {} bytes short of its declared size", self.remaining),
            ));
        }
        self.remaining -= read as u64;
        Ok(read)
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::test_support::{list_entries, names};
    use tempfile::tempdir;

    fn builder_with(options: ArchiveOptions) -> ArchiveBuilder<Vec<u8>> {
        ArchiveBuilder::new(Vec::new(), options).expect("builder opens")
    }

    fn builder() -> ArchiveBuilder<Vec<u8>> {
        builder_with(ArchiveOptions::default())
    }

    #[test]
    fn test_empty_archive() -> Result<()> {
        let bytes = builder().finish()?;
        assert!(list_entries(&bytes).is_empty());
        // Two zero blocks of end-of-archive padding.
        assert_eq!(bytes.len(), 1024);
        assert!(bytes.iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_default_mtime_values() {
        assert_eq!(builder().default_mtime(), 0);
        let explicit = builder_with(ArchiveOptions {
            default_mtime: DefaultMtime::Epoch(1234),
            ..Default::default()
        });
        assert_eq!(explicit.default_mtime(), 1234);
        let portable = builder_with(ArchiveOptions {
            default_mtime: DefaultMtime::Portable,
            ..Default::default()
        });
        assert_eq!(portable.default_mtime(), 946684800);
    }

    #[test]
    fn test_dotted_files() -> Result<()> {
        let mut b = builder();
        b.add_file("a", EntryKind::File, None, None)?;
        b.add_file("b/.c", EntryKind::File, None, None)?;
        b.add_file("..d", EntryKind::File, None, None)?;
        b.add_file(".e", EntryKind::File, None, None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["a", "b", "b/.c", "..d", ".e"]);
        Ok(())
    }

    #[test]
    fn test_adding_directories_for_file() -> Result<()> {
        let mut b = builder();
        b.add_file("d/f", EntryKind::File, Some(b"content"), None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["d", "d/f"]);
        assert_eq!(listed[0].kind, tar::EntryType::Directory);
        assert_eq!(listed[0].mode, 0o755);
        assert_eq!(listed[1].kind, tar::EntryType::Regular);
        assert_eq!(listed[1].mode, 0o644);
        assert_eq!(listed[1].data, b"content");
        Ok(())
    }

    #[test]
    fn test_adding_directories_manually() -> Result<()> {
        let mut b = builder();
        b.add_file("d", EntryKind::Directory, None, None)?;
        b.add_file("d/f", EntryKind::File, None, None)?;
        b.add_file("a", EntryKind::Directory, None, None)?;
        b.add_file("a/b", EntryKind::Directory, None, None)?;
        b.add_file("a/b", EntryKind::Directory, None, None)?;
        b.add_file("a/b/", EntryKind::Directory, None, None)?;
        b.add_file("a/b/c/f", EntryKind::File, None, None)?;
        b.add_file("x/y/f", EntryKind::File, None, None)?;
        b.add_file("x", EntryKind::Directory, None, None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(
            names(&listed),
            vec!["d", "d/f", "a", "a/b", "a/b/c", "a/b/c/f", "x", "x/y", "x/y/f"]
        );
        for entry in listed.iter().filter(|e| e.kind == tar::EntryType::Directory) {
            assert_eq!(entry.mode, 0o755, "mode of {}", entry.name);
        }
        Ok(())
    }

    #[test]
    fn test_first_directory_occurrence_wins() -> Result<()> {
        let mut b = builder();
        b.add_file("x/y/f", EntryKind::File, None, None)?;
        // Already backfilled with 0o755; the explicit mode is ignored.
        b.add_file("x", EntryKind::Directory, None, Some(0o700))?;
        b.add_file("z", EntryKind::Directory, None, Some(0o700))?;
        b.add_file("z/", EntryKind::Directory, None, Some(0o711))?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["x", "x/y", "x/y/f", "z"]);
        assert_eq!(listed[0].mode, 0o755);
        assert_eq!(listed[3].mode, 0o700);
        Ok(())
    }

    #[test]
    fn test_changing_root_directory() -> Result<()> {
        let mut b = builder_with(ArchiveOptions {
            root_directory: Some("root".into()),
            ..Default::default()
        });
        b.add_file("d", EntryKind::Directory, None, None)?;
        b.add_file("d/f", EntryKind::File, None, None)?;
        b.add_file("a", EntryKind::Directory, None, None)?;
        b.add_file("a/b", EntryKind::Directory, None, None)?;
        b.add_file("a/b", EntryKind::Directory, None, None)?;
        b.add_file("a/b/", EntryKind::Directory, None, None)?;
        b.add_file("a/b/c/f", EntryKind::File, None, None)?;
        b.add_file("x/y/f", EntryKind::File, None, None)?;
        b.add_file("x", EntryKind::Directory, None, None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(
            names(&listed),
            vec![
                "root",
                "root/d",
                "root/d/f",
                "root/a",
                "root/a/b",
                "root/a/b/c",
                "root/a/b/c/f",
                "root/x",
                "root/x/y",
                "root/x/y/f",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_root_directory_written_first_even_if_unused() -> Result<()> {
        let b = builder_with(ArchiveOptions {
            root_directory: Some("/opt/pkg/".into()),
            ..Default::default()
        });
        assert_eq!(b.root_prefix(), Some("opt/pkg"));
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["opt", "opt/pkg"]);
        Ok(())
    }

    #[test]
    fn test_root_directory_prefix_for_file() -> Result<()> {
        let mut b = builder_with(ArchiveOptions {
            root_directory: Some("root".into()),
            ..Default::default()
        });
        b.add_file("d/f", EntryKind::File, None, None)?;
        // The root itself, named relative to the root, is a no-op.
        b.add_file("./", EntryKind::Directory, None, None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["root", "root/d", "root/d/f"]);
        Ok(())
    }

    #[test]
    fn test_metadata_defaults_and_overrides() -> Result<()> {
        let mut b = builder_with(ArchiveOptions {
            default_mtime: DefaultMtime::Portable,
            ownership: Ownership {
                uid: 0,
                gid: 0,
                uname: "root".into(),
                gname: "wheel".into(),
            },
            ..Default::default()
        });
        b.add_file("plain", EntryKind::File, Some(b"1"), None)?;
        b.add_entry(
            EntryRequest::file("custom/file")
                .with_data(b"22")
                .with_mode(0o600)
                .with_mtime(42)
                .with_ownership(Ownership {
                    uid: 1000,
                    gid: 1000,
                    uname: "dev".into(),
                    gname: "dev".into(),
                }),
        )?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["plain", "custom", "custom/file"]);

        assert_eq!(listed[0].mtime, 946684800);
        assert_eq!((listed[0].uname.as_str(), listed[0].gname.as_str()), ("root", "wheel"));

        // Backfilled directories keep the default mtime.
        assert_eq!(listed[1].mtime, 946684800);
        assert_eq!(listed[1].uid, 1000);

        assert_eq!(listed[2].mode, 0o600);
        assert_eq!(listed[2].mtime, 42);
        assert_eq!(listed[2].uname, "dev");
        assert_eq!(listed[2].data, b"22");
        Ok(())
    }

    #[test]
    fn test_symlink_entry() -> Result<()> {
        let mut b = builder();
        b.add_symlink("lib/libfoo.so", "../other/libfoo.so.1")?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["lib", "lib/libfoo.so"]);
        assert_eq!(listed[1].kind, tar::EntryType::Symlink);
        assert_eq!(listed[1].link.as_deref(), Some("../other/libfoo.so.1"));
        assert_eq!(listed[1].mode, 0o755);
        Ok(())
    }

    #[test]
    fn test_streamed_content_is_bounded_by_size() -> Result<()> {
        let mut b = builder();
        let source: &[u8] = b"abcdef";
        b.add_entry(EntryRequest::file("partial").with_reader(Box::new(source), 3))?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(listed[0].data, b"abc");
        Ok(())
    }

    #[test]
    fn test_short_stream_is_an_error() {
        let mut b = builder();
        let source: &[u8] = b"ab";
        let err = b
            .add_entry(EntryRequest::file("f").with_reader(Box::new(source), 5))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<io::Error>().map(io::Error::kind),
            Some(io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn test_sized_reader_stops_at_size() {
        let mut reader = SizedReader::new(&b"abcdef"[..], 4);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abcd");

        let mut short = SizedReader::new(&b"ab"[..], 3);
        let err = short.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_duplicate_files_pass_through_by_default() -> Result<()> {
        let mut b = builder();
        b.add_file("f", EntryKind::File, Some(b"one"), None)?;
        b.add_file("./f", EntryKind::File, Some(b"two"), None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["f", "f"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_files_keep_first() -> Result<()> {
        let mut b = builder_with(ArchiveOptions {
            duplicates: DuplicatePolicy::KeepFirst,
            ..Default::default()
        });
        b.add_file("f", EntryKind::File, Some(b"one"), None)?;
        b.add_file("f", EntryKind::File, Some(b"two"), None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["f"]);
        assert_eq!(listed[0].data, b"one");
        Ok(())
    }

    #[test]
    fn test_file_named_like_written_directory_is_skipped() -> Result<()> {
        let mut b = builder();
        b.add_file("d/f", EntryKind::File, None, None)?;
        b.add_file("d", EntryKind::File, Some(b"x"), None)?;
        let listed = list_entries(&b.finish()?);
        assert_eq!(names(&listed), vec!["d", "d/f"]);
        Ok(())
    }

    #[test]
    fn test_empty_file_name_is_rejected() {
        let mut b = builder();
        let err = b.add_file("./", EntryKind::File, None, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArchiveError>(),
            Some(ArchiveError::InvalidName { .. })
        ));
        // The root as a directory is simply implicit.
        b.add_file("./", EntryKind::Directory, None, None).unwrap();
    }

    #[test]
    fn test_add_after_close_fails() -> Result<()> {
        let mut b = builder();
        b.add_file("a", EntryKind::File, None, None)?;
        b.close()?;
        assert!(b.is_closed());
        let err = b.add_file("b", EntryKind::File, None, None).unwrap_err();
        assert_eq!(err.downcast_ref::<ArchiveError>(), Some(&ArchiveError::Closed));
        // Closing twice is harmless.
        b.close()?;
        Ok(())
    }

    #[test]
    fn test_open_writes_file_on_disk() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("out.tar");
        let mut b = ArchiveBuilder::open(&output, ArchiveOptions::default())?;
        b.add_file("hello.txt", EntryKind::File, Some(b"hi"), None)?;
        b.close()?;
        let listed = list_entries(&std::fs::read(&output)?);
        assert_eq!(names(&listed), vec!["hello.txt"]);
        Ok(())
    }

    #[test]
    fn test_open_failure_is_io_error() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("missing").join("out.tar");
        let err = ArchiveBuilder::open(&output, ArchiveOptions::default())
            .err()
            .expect("open must fail");
        assert!(err.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn test_drop_without_close_still_finalizes() -> Result<()> {
        let dir = tempdir()?;
        let output = dir.path().join("out.tar");
        {
            let mut b = ArchiveBuilder::open(&output, ArchiveOptions::default())?;
            b.add_file("x", EntryKind::File, Some(b"1"), None)?;
        }
        let listed = list_entries(&std::fs::read(&output)?);
        assert_eq!(names(&listed), vec!["x"]);
        Ok(())
    }

    #[test]
    fn test_same_inputs_same_bytes() -> Result<()> {
        let build = || -> Result<Vec<u8>> {
            let mut b = builder_with(ArchiveOptions {
                default_mtime: DefaultMtime::Portable,
                root_directory: Some("pkg".into()),
                ..Default::default()
            });
            b.add_file("etc/conf", EntryKind::File, Some(b"k=v\n"), None)?;
            b.add_file("bin/run", EntryKind::File, Some(b"#!/bin/sh\n"), Some(0o755))?;
            b.finish()
        };
        assert_eq!(build()?, build()?);
        Ok(())
    }
}
