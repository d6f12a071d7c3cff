//! # reprotar Argument Files (`commands::argfile`)
//!
//! File: cli/src/commands/argfile.rs
//!
//! ## Overview
//!
//! Build systems often pass long input lists through a parameter file. Any
//! command-line argument starting with `@` is replaced by the lines of the
//! named file, one argument per line. Blank lines are ignored; argument files
//! may themselves reference other argument files.
//!
//! ```bash
//! reprotar @layer.params
//! ```
//!
use crate::common::fs::io::read_file_to_string;
use crate::core::error::{ArchiveError, Result};
use std::path::Path;
use tracing::debug;

/// How deeply argument files may include each other.
const MAX_NESTING: usize = 16;

/// Expands `@file` arguments. The first element (program name) is kept as-is.
pub fn expand_args(args: Vec<String>) -> Result<Vec<String>> {
    let mut args = args.into_iter();
    let mut expanded: Vec<String> = args.next().into_iter().collect();
    for arg in args {
        expand_into(arg, &mut expanded, 0)?;
    }
    Ok(expanded)
}

fn expand_into(arg: String, out: &mut Vec<String>, depth: usize) -> Result<()> {
    let Some(file) = arg.strip_prefix('@') else {
        out.push(arg);
        return Ok(());
    };
    if depth >= MAX_NESTING {
        anyhow::bail!(ArchiveError::ArgumentParsing(format!(
            "argument files nested too deeply at '{}'",
            file
        )));
    }
    debug!("Expanding argument file {}", file);
    let content = read_file_to_string(Path::new(file))?;
    for line in content.lines().filter(|line| !line.is_empty()) {
        expand_into(line.to_string(), out, depth + 1)?;
    }
    Ok(())
}

/// Splits `arg` at the first `sep` not escaped by a backslash.
///
/// Backslashes quote the following character in the part before the
/// separator only; the remainder is returned verbatim. Without an unescaped
/// separator the whole (unescaped) string is returned with an empty remainder.
pub fn unquote_and_split(arg: &str, sep: char) -> (String, String) {
    let mut head = String::new();
    let mut chars = arg.char_indices();
    while let Some((index, c)) = chars.next() {
        if c == sep {
            return (head, arg[index + c.len_utf8()..].to_string());
        }
        if c == '\\' {
            match chars.next() {
                Some((_, escaped)) => head.push(escaped),
                // Dangling escape character.
                None => return (head, String::new()),
            }
        } else {
            head.push(c);
        }
    }
    (head, String::new())
}
