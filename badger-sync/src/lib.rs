//! # badger-sync
//!
//! Batch badge classification for store catalogs.
//!
//! Each catalog item gets exactly one merchandising badge derived from its
//! statistics (stock, orders, likes, views, discount). Every catalog in the
//! registry is then written back to its authoritative location and copied to
//! its mirror. One failing catalog never blocks the rest of the batch.
//!
//! **Flow:** [`batch::run_batch`] → [`catalog::sync_catalog`] →
//! [`stats::ItemStats`] → [`classifier::RuleSet::classify`]

pub mod batch;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod label;
pub mod registry;
pub mod report;
pub mod stats;

pub use batch::run_batch;
pub use catalog::{sync_catalog, CatalogDocument, SyncOptions};
pub use classifier::{classify, Profile, RuleSet, Thresholds};
pub use error::{FailureKind, Status, SyncError};
pub use label::{color_for, Label};
pub use registry::{CatalogRef, Registry};
pub use report::{BatchReport, CatalogOutcome, OutputEncoding, ReportWriter};
pub use stats::ItemStats;
