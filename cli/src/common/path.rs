//! # reprotar Path Normalization (`common::path`)
//!
//! File: cli/src/common/path.rs
//!
//! ## Overview
//!
//! Maps the logical paths callers hand to the archive builder onto canonical
//! entry names, and computes the ancestor directories each name needs.
//!
//! The transformation is deliberately minimal:
//!
//! - a single leading `./` is removed (it is the only navigation token understood);
//! - a single trailing `/` is removed, so `a/b/` and `a/b` are the same entry;
//! - empty segments from repeated or leading slashes are dropped;
//! - `.` and `..` segments inside the path are kept verbatim.
//!
//! Names such as `.e` or `..d` are ordinary file names and pass through untouched.
//!
//! ```rust
//! let p = path::normalize("./a/b/c/", None);
//! assert_eq!(p.name, "a/b/c");
//! assert_eq!(p.ancestors, vec!["a", "a/b"]);
//! ```
//!

/// A canonical entry name together with the directories that must precede it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    /// Canonical name. Empty when the path denotes the archive root itself.
    pub name: String,
    /// Strict prefixes of `name`, shortest first.
    pub ancestors: Vec<String>,
}

impl NormalizedPath {
    /// True when the path resolved to the archive root (no root prefix configured).
    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }
}

/// Normalizes `path`, optionally placing it below `root`.
///
/// With a root prefix, the prefix and its own ancestors become ancestors of
/// every path, and a path denoting the archive root resolves to the prefix.
pub fn normalize(path: &str, root: Option<&str>) -> NormalizedPath {
    compose(root, segments(path), false)
}

/// Normalizes a name produced by a directory import.
///
/// Unlike [`normalize`], a leading `./` is kept as a `.` segment, so
/// importing into `./` yields `./a`, `./a/c`. That `.` stands for the archive
/// root (or the root prefix) and is never listed as an ancestor. A path that
/// is only `./` still denotes the root.
pub fn normalize_tree(path: &str, root: Option<&str>) -> NormalizedPath {
    let mut path_segments = segments(path);
    let leading_dot = path.starts_with("./") && !path_segments.is_empty();
    if leading_dot {
        path_segments.insert(0, ".");
    }
    compose(root, path_segments, leading_dot)
}

fn compose(root: Option<&str>, path_segments: Vec<&str>, leading_dot: bool) -> NormalizedPath {
    let mut all = root.map(segments).unwrap_or_default();
    // Index one past the `.` segment standing for the root, if any.
    let dot_end = leading_dot.then_some(all.len() + 1);
    all.extend(path_segments);

    let ancestors = (1..all.len())
        .filter(|end| Some(*end) != dot_end)
        .map(|end| all[..end].join("/"))
        .collect();
    NormalizedPath {
        name: all.join("/"),
        ancestors,
    }
}

/// Splits a logical path into its canonical segments.
fn segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path == "." {
        return Vec::new();
    }
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Lexically cleans a destination given on the command line.
///
/// Leading slashes are dropped and `.`/`..` segments are collapsed the way
/// a shell user would expect (`a/../b` becomes `b`). An empty result is `.`.
/// This runs only in the front end; the builder never collapses segments.
pub fn clean_destination(dest: &str) -> String {
    let mut cleaned: Vec<&str> = Vec::new();
    for segment in dest.trim_start_matches('/').split('/') {
        match segment {
            "" | "." => {}
            ".." => match cleaned.last() {
                Some(&last) if last != ".." => {
                    cleaned.pop();
                }
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other),
        }
    }
    if cleaned.is_empty() {
        ".".to_string()
    } else {
        cleaned.join("/")
    }
}
