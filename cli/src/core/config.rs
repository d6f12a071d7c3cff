//! # reprotar Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module owns the configuration values that influence archive output:
//! the default modification time, the optional root directory, forced file
//! mode, ownership and the duplicate policy. Values come from three sources,
//! in order of precedence:
//!
//! 1. Command-line flags (merged by `commands::build`)
//! 2. A TOML configuration file (`--config PATH`, or `.reprotar.toml` in the
//!    current directory)
//! 3. Built-in defaults
//!
//! Only the current directory is searched for `.reprotar.toml`. Walking up to
//! parent directories would make the produced archive depend on where the
//! build tree happens to be checked out.
//!
//! ## Examples
//!
//! ```toml
//! default_mtime = "portable"
//! root_directory = "pkg"
//! mode = "0644"
//! owner = "0.0"
//! owner_name = "root.root"
//! keep_first_duplicate = true
//! ```
//!
use crate::core::error::{ArchiveError, Result};
use anyhow::Context;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Deterministic mtime that doesn't confuse tools rejecting pre-1980 dates.
/// 2000-01-01 00:00:00 UTC.
pub const PORTABLE_MTIME: u64 = 946_684_800;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".reprotar.toml";

/// The `default_mtime` setting before resolution to epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultMtime {
    /// No value given; resolves to 0.
    #[default]
    Unset,
    Epoch(u64),
    /// The literal `"portable"`; resolves to [`PORTABLE_MTIME`].
    Portable,
}

impl DefaultMtime {
    /// Resolves the setting to epoch seconds.
    pub fn resolve(self) -> u64 {
        match self {
            DefaultMtime::Unset => 0,
            DefaultMtime::Epoch(secs) => secs,
            DefaultMtime::Portable => PORTABLE_MTIME,
        }
    }
}

impl FromStr for DefaultMtime {
    type Err = ArchiveError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed == "portable" {
            return Ok(DefaultMtime::Portable);
        }
        trimmed
            .parse::<u64>()
            .map(DefaultMtime::Epoch)
            .map_err(|_| ArchiveError::InvalidMtime(value.to_string()))
    }
}

impl fmt::Display for DefaultMtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultMtime::Unset => write!(f, "0"),
            DefaultMtime::Epoch(secs) => write!(f, "{}", secs),
            DefaultMtime::Portable => write!(f, "portable"),
        }
    }
}

/// `default_mtime` as written in TOML: either a bare integer or a string.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum MtimeValue {
    Epoch(i64),
    Named(String),
}

impl TryFrom<&MtimeValue> for DefaultMtime {
    type Error = ArchiveError;

    fn try_from(value: &MtimeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            MtimeValue::Epoch(secs) => u64::try_from(*secs)
                .map(DefaultMtime::Epoch)
                .map_err(|_| ArchiveError::InvalidMtime(secs.to_string())),
            MtimeValue::Named(name) => name.parse(),
        }
    }
}

/// Contents of a `.reprotar.toml` file. Every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub default_mtime: Option<MtimeValue>,
    pub root_directory: Option<String>,
    /// Octal string, e.g. `"0644"`.
    pub mode: Option<String>,
    /// Numeric `UID.GID`.
    pub owner: Option<String>,
    /// Symbolic `USER.GROUP`.
    pub owner_name: Option<String>,
    pub keep_first_duplicate: Option<bool>,
}

/// Loads the configuration file.
///
/// An explicit path must exist. Without one, `.reprotar.toml` in the current
/// directory is used when present; otherwise defaults are returned.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_path()?,
    };
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            load_config_from_path(&path)
        }
        None => {
            debug!("No {} found, using built-in defaults", CONFIG_FILE_NAME);
            Ok(FileConfig::default())
        }
    }
}

fn find_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let candidate = current_dir.join(CONFIG_FILE_NAME);
    Ok(candidate.is_file().then_some(candidate))
}

fn load_config_from_path(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Parses an octal permission string such as `"0644"` or `"755"`.
pub fn parse_mode(value: &str) -> Result<u32> {
    let digits = value.trim();
    let digits = digits.strip_prefix("0o").unwrap_or(digits);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| ArchiveError::Config(format!("Invalid octal mode '{}'", value)))?;
    if mode > 0o7777 {
        anyhow::bail!(ArchiveError::Config(format!(
            "Mode '{}' is out of range",
            value
        )));
    }
    Ok(mode)
}

/// Parses a numeric owner spec `UID.GID`, e.g. `"0.0"`.
pub fn parse_owner_ids(value: &str) -> Result<(u64, u64)> {
    let (uid, gid) = split_pair(value, "owner")?;
    let parse = |part: &str| {
        part.parse::<u64>().map_err(|_| {
            ArchiveError::Config(format!("Invalid numeric owner '{}': expected UID.GID", value))
        })
    };
    Ok((parse(uid)?, parse(gid)?))
}

/// Parses a symbolic owner spec `USER.GROUP`, e.g. `"root.root"`.
pub fn parse_owner_names(value: &str) -> Result<(String, String)> {
    let (user, group) = split_pair(value, "owner name")?;
    Ok((user.to_string(), group.to_string()))
}

fn split_pair<'a>(value: &'a str, what: &str) -> Result<(&'a str, &'a str)> {
    value.split_once('.').ok_or_else(|| {
        ArchiveError::Config(format!("Invalid {} '{}': expected two parts separated by '.'", what, value))
            .into()
    })
}
