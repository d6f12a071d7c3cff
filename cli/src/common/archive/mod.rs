//! # reprotar Archive Module (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//!
//! ## Overview
//!
//! Everything needed to write a reproducible tar archive. The `tar` crate does
//! the byte-level encoding; the submodules here decide *what* gets written and
//! in which order.
//!
//! ## Architecture
//!
//! - **`entry`**: request and entry types, default modes, ownership, duplicate policy.
//! - **`header`**: translation of an entry into `tar::Header` blocks.
//! - **`writer`**: [`ArchiveBuilder`], the stateful engine (backfill, dedup, lifecycle).
//! - **`tree`**: `ArchiveBuilder::add_dir`, deterministic import of directory trees.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{entry::EntryKind, ArchiveBuilder, ArchiveOptions};
//!
//! let mut builder = ArchiveBuilder::open(Path::new("layer.tar"), ArchiveOptions::default())?;
//! builder.add_file("etc/motd", EntryKind::File, Some(b"hello\n"), None)?;
//! builder.add_dir("usr/share/doc", Path::new("docs"), None)?;
//! builder.close()?;
//! ```
//!

pub mod entry;
pub mod header;
pub mod tree;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use entry::{DuplicatePolicy, Ownership};
pub use writer::{ArchiveBuilder, ArchiveOptions};
