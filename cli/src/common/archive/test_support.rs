//! Helpers shared by the archive unit tests.
use std::io::Read;

/// One member read back from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listed {
    pub name: String,
    pub kind: tar::EntryType,
    pub mode: u32,
    pub mtime: u64,
    pub uid: u64,
    pub gid: u64,
    pub uname: String,
    pub gname: String,
    pub link: Option<String>,
    pub data: Vec<u8>,
}

/// Reads every member of a tar stream. Trailing `/` on directory names is dropped.
pub fn list_entries(bytes: &[u8]) -> Vec<Listed> {
    let mut archive = tar::Archive::new(bytes);
    let mut listed = Vec::new();
    for entry in archive.entries().expect("readable archive") {
        let mut entry = entry.expect("valid entry");
        let name = String::from_utf8_lossy(&entry.path_bytes())
            .trim_end_matches('/')
            .to_string();
        let link = entry
            .link_name_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());
        let header = entry.header().clone();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).expect("readable content");
        listed.push(Listed {
            name,
            kind: header.entry_type(),
            mode: header.mode().expect("mode"),
            mtime: header.mtime().expect("mtime"),
            uid: header.uid().expect("uid"),
            gid: header.gid().expect("gid"),
            uname: header.username().expect("uname").unwrap_or("").to_string(),
            gname: header.groupname().expect("gname").unwrap_or("").to_string(),
            link,
            data,
        });
    }
    listed
}

pub fn names(listed: &[Listed]) -> Vec<&str> {
    listed.iter().map(|entry| entry.name.as_str()).collect()
}
