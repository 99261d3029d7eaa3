//! Batch orchestrator
//!
//! Processes every catalog in registry order, one at a time. Each catalog runs
//! inside its own failure boundary: errors and panics become report entries
//! and the run moves on to the next catalog.

use crate::catalog::{sync_catalog, SyncOptions};
use crate::classifier::RuleSet;
use crate::error::Status;
use crate::registry::Registry;
use crate::report::{BatchReport, CatalogOutcome};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, info, warn};

/// Sync every catalog in `registry` and collect the outcomes
pub fn run_batch(registry: &Registry, rules: &RuleSet, options: &SyncOptions) -> BatchReport {
    let mut report = BatchReport::new(rules.version(), registry.len(), options.dry_run);
    info!(
        run_id = %report.run.run_id,
        catalogs = registry.len(),
        rules = %report.run.rules_version,
        dry_run = options.dry_run,
        "Starting badge sync"
    );

    for catalog in registry.iter() {
        info!(catalog = %catalog.key, path = %catalog.authoritative.display(), "Syncing catalog");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| sync_catalog(catalog, rules, options)))
            .unwrap_or_else(|payload| CatalogOutcome::panicked(catalog, &panic_detail(payload.as_ref())));

        log_outcome(&outcome);
        report.record(outcome);
    }

    report.finish();
    info!(
        synced = report.success_count(),
        registered = report.registered,
        warnings = report.warning_count(),
        errors = report.error_count(),
        "Badge sync finished"
    );
    report
}

fn log_outcome(outcome: &CatalogOutcome) {
    match outcome.status {
        Status::Ok => info!(
            catalog = %outcome.catalog_key,
            items = outcome.item_count,
            updated = outcome.updated_count,
            "Catalog synced"
        ),
        Status::Warning => warn!(catalog = %outcome.catalog_key, "{}", outcome.message),
        Status::Error => error!(catalog = %outcome.catalog_key, "{}", outcome.message),
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
