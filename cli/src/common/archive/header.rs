//! # reprotar Header Encoding (`common::archive::header`)
//!
//! File: cli/src/common/archive/header.rs
//!
//! ## Overview
//!
//! Turns a resolved [`Entry`] into `tar::Header` blocks and hands them to
//! `tar::Builder`. Layout, checksums and padding are the `tar` crate's job.
//!
//! Names are copied into the header byte for byte instead of going through
//! `Header::set_path`, which would drop `.` segments and reject `..`. Names
//! or link targets longer than the 100-byte field are preceded by a GNU
//! `././@LongLink` record, the same extension `tar::Builder` itself uses.
//!
//! Every field is filled from the entry; nothing comes from the host, so the
//! same entry always encodes to the same bytes.
//!
use super::entry::Entry;
use std::io::{self, Read, Write};
use tar::{Builder, EntryType, Header};

/// Size of the `name` and `linkname` fields of a tar header.
const NAME_FIELD_LEN: usize = 100;
const LONG_LINK_NAME: &[u8] = b"././@LongLink";

/// Appends `entry` and its content to the archive.
///
/// `data` must yield exactly `entry.size` bytes.
pub fn append_entry<W: Write>(
    builder: &mut Builder<W>,
    entry: &Entry,
    data: &mut dyn Read,
) -> io::Result<()> {
    let name = entry.header_name();
    if name.len() > NAME_FIELD_LEN {
        append_long_field(builder, EntryType::GNULongName, name.as_bytes())?;
    }
    if let Some(target) = entry.link_target.as_deref() {
        if target.len() > NAME_FIELD_LEN {
            append_long_field(builder, EntryType::GNULongLink, target.as_bytes())?;
        }
    }

    let mut header = Header::new_gnu();
    copy_truncated(&mut header.as_old_mut().name, name.as_bytes());
    if let Some(target) = entry.link_target.as_deref() {
        copy_truncated(&mut header.as_old_mut().linkname, target.as_bytes());
    }
    header.set_entry_type(entry.kind.tar_type());
    header.set_size(entry.size);
    header.set_mode(entry.mode);
    header.set_mtime(entry.mtime);
    header.set_uid(entry.ownership.uid);
    header.set_gid(entry.ownership.gid);
    header.set_username(&entry.ownership.uname)?;
    header.set_groupname(&entry.ownership.gname)?;
    header.set_cksum();

    builder.append(&header, data)
}

/// Writes a GNU long name/link record carrying `value` plus a NUL terminator.
fn append_long_field<W: Write>(
    builder: &mut Builder<W>,
    kind: EntryType,
    value: &[u8],
) -> io::Result<()> {
    let mut header = Header::new_gnu();
    copy_truncated(&mut header.as_old_mut().name, LONG_LINK_NAME);
    header.set_entry_type(kind);
    header.set_size(value.len() as u64 + 1);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_cksum();
    builder.append(&header, value.chain(&b"\0"[..]))
}

fn copy_truncated(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
}
