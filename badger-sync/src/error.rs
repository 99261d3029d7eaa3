//! Per-catalog sync errors
//!
//! Every variant is caught at the batch boundary and turned into a report
//! entry; none of them abort a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Outcome severity of a single catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Both copies written (or, in a dry run, classified)
    Ok,
    /// Authoritative copy correct, mirror stale
    Warning,
    /// Catalog skipped or authoritative copy not written
    Error,
}

/// Which failure produced a non-Ok outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    NotFound,
    Corrupt,
    Unreadable,
    WriteFailure,
    PartialSync,
    Panicked,
}

/// Storage location of a catalog copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sink {
    Authoritative,
    Mirror,
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Authoritative => f.write_str("authoritative"),
            Sink::Mirror => f.write_str("mirror"),
        }
    }
}

/// Failure while syncing one catalog
#[derive(Debug, Error)]
pub enum SyncError {
    /// No document at the authoritative path
    #[error("catalog not found at {}", .path.display())]
    NotFound { path: PathBuf },

    /// Document exists but is not JSON with a `products` array
    #[error("catalog at {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Document exists but could not be read
    #[error("failed to read catalog at {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A sink write failed
    #[error("{sink} write to {} failed: {source}", .path.display())]
    WriteFailure {
        sink: Sink,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Authoritative copy written, mirror write failed
    #[error("authoritative copy updated but mirror {} is stale: {source}", .mirror.display())]
    PartialSync {
        mirror: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::NotFound { .. } => FailureKind::NotFound,
            SyncError::Corrupt { .. } => FailureKind::Corrupt,
            SyncError::Unreadable { .. } => FailureKind::Unreadable,
            SyncError::WriteFailure { .. } => FailureKind::WriteFailure,
            SyncError::PartialSync { .. } => FailureKind::PartialSync,
        }
    }

    /// Sink whose write failed, for write-side errors
    pub fn sink(&self) -> Option<Sink> {
        match self {
            SyncError::WriteFailure { sink, .. } => Some(*sink),
            SyncError::PartialSync { .. } => Some(Sink::Mirror),
            _ => None,
        }
    }

    /// Partial syncs are warnings; everything else is an error
    pub fn status(&self) -> Status {
        match self {
            SyncError::PartialSync { .. } => Status::Warning,
            _ => Status::Error,
        }
    }
}
