//! # reprotar CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test files: locating the binary and
//! reading an archive back into a comparable form.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::io::Read;
use std::path::Path;

/// # Get reprotar Command (`reprotar_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `reprotar` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn reprotar_cmd() -> Command {
    Command::cargo_bin("reprotar").expect("Failed to find reprotar binary for testing")
}

/// One archive member: name (without trailing `/`), type, mode, mtime and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub kind: tar::EntryType,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
    pub uname: String,
    pub gname: String,
    pub data: Vec<u8>,
}

/// Reads every member of the archive at `path`.
pub fn read_members(path: &Path) -> Vec<Member> {
    let bytes = std::fs::read(path).expect("archive exists");
    let mut archive = tar::Archive::new(bytes.as_slice());
    archive
        .entries()
        .expect("readable archive")
        .map(|entry| {
            let mut entry = entry.expect("valid entry");
            let name = String::from_utf8_lossy(&entry.path_bytes())
                .trim_end_matches('/')
                .to_string();
            let header = entry.header().clone();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).expect("readable content");
            Member {
                name,
                kind: header.entry_type(),
                mode: header.mode().expect("mode"),
                mtime: header.mtime().expect("mtime"),
                uid: header.uid().expect("uid"),
                gid: header.gid().expect("gid"),
                uname: header.username().expect("uname").unwrap_or("").to_string(),
                gname: header.groupname().expect("gname").unwrap_or("").to_string(),
                data,
            }
        })
        .collect()
}

pub fn member_names(members: &[Member]) -> Vec<&str> {
    members.iter().map(|m| m.name.as_str()).collect()
}
