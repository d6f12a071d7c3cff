//! # reprotar Build Command
//!
//! File: cli/src/commands/build.rs
//!
//! ## Overview
//!
//! The `reprotar` command: create one archive from `--file SRC=DEST` and
//! `--link LINK=TARGET` mappings.
//!
//! ## Architecture
//!
//! 1. Load the optional configuration file (`core::config`).
//! 2. Merge it with the command-line flags (flags win) into [`BuildSettings`].
//! 3. Open an `ArchiveBuilder` on `--output`.
//! 4. Add every input in command-line order.
//! 5. Finish the builder and sync the file. When an input failed the builder
//!    is closed anyway, so the file handle is always released.
//!
//! ## Examples
//!
//! ```bash
//! # Package a binary and its docs below `pkg/`
//! reprotar --output layer.tar --directory pkg \
//!     --file target/release/tool=usr/bin/tool \
//!     --file docs=usr/share/doc/tool
//!
//! # Fixed ownership, forced mode and an explicit mtime
//! reprotar --output out.tar --owner 0.0 --owner_name root.root \
//!     --mode 0644 --mtime 0 --file data.bin=data.bin
//! ```
//!
use super::argfile::unquote_and_split;
use crate::common::archive::{ArchiveBuilder, ArchiveOptions, DuplicatePolicy, Ownership};
use crate::common::fs::io::is_executable;
use crate::common::path::clean_destination;
use crate::core::config::{self, DefaultMtime, FileConfig};
use crate::core::error::Result;
use anyhow::Context;
use clap::Args;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Command-line arguments of the build command.
///
/// Flag names follow the ones build rules already pass to tar helpers,
/// including the underscore in `--owner_name`.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// The output archive, mandatory.
    #[arg(long)]
    pub output: PathBuf,

    /// Input to add as SRC=DEST. Use `\=` for a literal '=' in SRC.
    /// A directory SRC is imported recursively.
    #[arg(long = "file", value_name = "SRC=DEST")]
    pub files: Vec<String>,

    /// Symbolic link to add as LINK=TARGET. The target is stored verbatim.
    #[arg(long = "link", value_name = "LINK=TARGET")]
    pub links: Vec<String>,

    /// Force the mode of added files (octal, e.g. 0644).
    #[arg(long)]
    pub mode: Option<String>,

    /// Directory in which to store the files inside the archive.
    #[arg(long)]
    pub directory: Option<String>,

    /// Numeric owner of all entries as UID.GID, e.g. 0.0.
    #[arg(long)]
    pub owner: Option<String>,

    /// Symbolic owner of all entries as USER.GROUP, e.g. root.root.
    #[arg(long = "owner_name", value_name = "USER.GROUP")]
    pub owner_name: Option<String>,

    /// Default modification time: epoch seconds or "portable".
    #[arg(long)]
    pub mtime: Option<String>,

    /// Configuration file (defaults to .reprotar.toml in the working directory).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write every file added under an already used name. By default only
    /// the first one is kept.
    #[arg(long)]
    pub allow_duplicates: bool,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub options: ArchiveOptions,
    /// Forced file mode; `None` derives it from the source's execute bits.
    pub mode: Option<u32>,
}

/// Merges command-line flags over the configuration file.
///
/// Without either, the mtime is `portable` (946684800), entries are owned
/// by `0.0` with empty names and only the first of duplicate files is kept.
pub fn merge_settings(args: &BuildArgs, file: &FileConfig) -> Result<BuildSettings> {
    let default_mtime = match (&args.mtime, &file.default_mtime) {
        (Some(flag), _) => flag.parse::<DefaultMtime>()?,
        (None, Some(value)) => DefaultMtime::try_from(value)?,
        (None, None) => DefaultMtime::Portable,
    };

    let mode = args
        .mode
        .as_deref()
        .or(file.mode.as_deref())
        .map(config::parse_mode)
        .transpose()?;

    let (uid, gid) = args
        .owner
        .as_deref()
        .or(file.owner.as_deref())
        .map(config::parse_owner_ids)
        .transpose()?
        .unwrap_or((0, 0));
    let (uname, gname) = args
        .owner_name
        .as_deref()
        .or(file.owner_name.as_deref())
        .map(config::parse_owner_names)
        .transpose()?
        .unwrap_or_default();

    let duplicates = if args.allow_duplicates || file.keep_first_duplicate == Some(false) {
        DuplicatePolicy::Allow
    } else {
        DuplicatePolicy::KeepFirst
    };

    Ok(BuildSettings {
        options: ArchiveOptions {
            default_mtime,
            root_directory: args.directory.clone().or_else(|| file.root_directory.clone()),
            ownership: Ownership {
                uid,
                gid,
                uname,
                gname,
            },
            duplicates,
        },
        mode,
    })
}

/// # Handle Build Command (`handle_build`)
///
/// Loads configuration, writes the archive and reports where it went.
pub fn handle_build(args: BuildArgs) -> Result<()> {
    info!("Handling build command with args: {:?}", args);
    let file_config = config::load_config(args.config.as_deref())?;
    let settings = merge_settings(&args, &file_config)?;
    debug!("Effective build settings: {:?}", settings);

    let mut builder = ArchiveBuilder::open(&args.output, settings.options.clone())
        .with_context(|| format!("Failed to create archive {}", args.output.display()))?;

    if let Err(err) = add_inputs(&mut builder, &args, settings.mode) {
        // Release the handle; the input error is the one reported.
        if let Err(close_err) = builder.close() {
            warn!("Failed to close archive after error: {:#}", close_err);
        }
        return Err(err);
    }
    let file = builder
        .finish()
        .with_context(|| format!("Failed to finalize archive {}", args.output.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync archive {}", args.output.display()))?;

    info!("Archive written to {}", args.output.display());
    Ok(())
}

/// Adds every `--file` and then every `--link` mapping, in command-line order.
fn add_inputs<W: Write>(
    builder: &mut ArchiveBuilder<W>,
    args: &BuildArgs,
    mode: Option<u32>,
) -> Result<()> {
    for spec in &args.files {
        let (source, dest) = unquote_and_split(spec, '=');
        add_input(builder, Path::new(&source), &clean_destination(&dest), mode)
            .with_context(|| format!("Failed to add '{}' to the archive", source))?;
    }
    for spec in &args.links {
        let (link, target) = unquote_and_split(spec, '=');
        builder
            .add_symlink(&clean_destination(&link), &target)
            .with_context(|| format!("Failed to add symlink '{}'", link))?;
    }
    Ok(())
}

/// Adds one source. Directories are imported recursively; a file without a
/// forced mode gets 0o755 when it is executable and 0o644 otherwise.
fn add_input<W: Write>(
    builder: &mut ArchiveBuilder<W>,
    source: &Path,
    dest: &str,
    mode: Option<u32>,
) -> Result<()> {
    if source.is_dir() {
        debug!("Adding directory {} as '{}'", source.display(), dest);
        return builder.add_dir(dest, source, mode);
    }
    let mode = match mode {
        Some(mode) => mode,
        None if is_executable(source)? => 0o755,
        None => 0o644,
    };
    debug!("Adding file {} as '{}' ({:o})", source.display(), dest, mode);
    builder.add_file_from_disk(dest, source, Some(mode))
}
