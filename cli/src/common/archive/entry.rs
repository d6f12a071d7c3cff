//! # reprotar Archive Entries (`common::archive::entry`)
//!
//! File: cli/src/common/archive/entry.rs
//!
//! ## Overview
//!
//! Types describing what goes into the archive:
//!
//! - [`EntryRequest`]: what a caller asks the builder to add, before path
//!   normalization and defaulting.
//! - [`Entry`]: a fully resolved member (canonical name, kind, size, mode,
//!   mtime, ownership), ready for the header encoder.
//! - [`Ownership`] and [`DuplicatePolicy`]: builder-wide settings.
//!
use std::fmt;
use std::io::Read;

/// Default permission bits of a regular file.
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Default permission bits of a directory (and of symlinks).
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// The kind of archive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

impl EntryKind {
    pub fn default_mode(self) -> u32 {
        match self {
            EntryKind::File => DEFAULT_FILE_MODE,
            EntryKind::Directory | EntryKind::Symlink => DEFAULT_DIR_MODE,
        }
    }

    pub fn tar_type(self) -> tar::EntryType {
        match self {
            EntryKind::File => tar::EntryType::Regular,
            EntryKind::Directory => tar::EntryType::Directory,
            EntryKind::Symlink => tar::EntryType::Symlink,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Symlink => "symlink",
        };
        f.write_str(label)
    }
}

/// Owner recorded in each header. Never read from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ownership {
    pub uid: u64,
    pub gid: u64,
    pub uname: String,
    pub gname: String,
}

/// What to do when a non-directory name is added a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Write every occurrence; the archive then holds duplicate member names.
    #[default]
    Allow,
    /// Keep the first occurrence and skip later ones with a warning.
    KeepFirst,
}

/// Content of a requested entry.
pub enum EntryContent<'a> {
    Empty,
    Bytes(&'a [u8]),
    /// A stream with a declared size. At most `size` bytes are read.
    Reader {
        reader: Box<dyn Read + 'a>,
        size: u64,
    },
}

impl fmt::Debug for EntryContent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryContent::Empty => f.write_str("Empty"),
            EntryContent::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            EntryContent::Reader { size, .. } => write!(f, "Reader({} bytes)", size),
        }
    }
}

/// A request to add one entry, built with the `with_*` methods.
///
/// Unset fields take the builder's defaults: the kind's default mode, the
/// builder's `default_mtime` and ownership.
#[derive(Debug)]
pub struct EntryRequest<'a> {
    pub name: String,
    pub kind: EntryKind,
    pub content: EntryContent<'a>,
    pub mode: Option<u32>,
    pub mtime: Option<u64>,
    pub ownership: Option<Ownership>,
    /// Declared target of a symlink, written verbatim.
    pub link_target: Option<String>,
}

impl<'a> EntryRequest<'a> {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            content: EntryContent::Empty,
            mode: None,
            mtime: None,
            ownership: None,
            link_target: None,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::File)
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut request = Self::new(name, EntryKind::Symlink);
        request.link_target = Some(target.into());
        request
    }

    pub fn with_data(mut self, data: &'a [u8]) -> Self {
        self.content = EntryContent::Bytes(data);
        self
    }

    pub fn with_reader(mut self, reader: Box<dyn Read + 'a>, size: u64) -> Self {
        self.content = EntryContent::Reader { reader, size };
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    #[cfg(test)]
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = Some(mtime);
        self
    }

    #[cfg(test)]
    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = Some(ownership);
        self
    }
}

/// A resolved archive member as handed to the header encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Canonical name, without a trailing slash even for directories.
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub mode: u32,
    pub mtime: u64,
    pub ownership: Ownership,
    pub link_target: Option<String>,
}

impl Entry {
    /// A synthesized directory entry, as used for backfill.
    pub fn directory(name: String, mtime: u64, ownership: Ownership) -> Self {
        Self {
            name,
            kind: EntryKind::Directory,
            size: 0,
            mode: DEFAULT_DIR_MODE,
            mtime,
            ownership,
            link_target: None,
        }
    }

    /// The name as it appears in the header. Directories end with `/`.
    pub fn header_name(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.name),
            _ => self.name.clone(),
        }
    }
}
