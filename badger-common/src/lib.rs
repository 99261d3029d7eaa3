//! # Badger Common Library
//!
//! Shared code for the badger catalog tools including:
//! - Bootstrap configuration (TOML) and store registry entries
//! - Config file and root folder resolution
//! - Atomic file writes
//! - Common error types

pub mod config;
pub mod error;
pub mod file_utils;

pub use error::{Error, Result};
