//! # reprotar Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The command-line front end. `reprotar` has a single command, which builds
//! one archive; its arguments and handler live in `build`. Argument-file
//! (`@file`) expansion, applied before `clap` sees the arguments, lives in
//! `argfile`.
//!

/// `@file` expansion and `SRC=DEST` splitting.
pub mod argfile;
/// Arguments, settings merge and handler of the build command.
pub mod build;
