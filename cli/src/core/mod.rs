//! # reprotar Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Foundational pieces shared by every other module:
//!
//! - `config`: default mtime resolution, config file loading, option parsers
//! - `error`: `ArchiveError` and the crate-wide `Result` alias
//!
//! ```rust
//! use crate::core::config::{self, DefaultMtime};
//! use crate::core::error::{ArchiveError, Result};
//! ```
//!
pub mod config;
pub mod error;
