//! Batch report: structured per-catalog outcomes plus CLI rendering
//!
//! The structured data ([`BatchReport`], [`CatalogOutcome`]) is what callers
//! and tests inspect. [`ReportFormatter`] turns it into text lines and
//! [`ReportWriter`] emits them with an explicit [`OutputEncoding`].

use crate::error::{FailureKind, Status, SyncError};
use crate::label::Label;
use crate::registry::CatalogRef;
use badger_common::file_utils::write_atomic_create_dirs;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Per-badge item counts
pub type BadgeTally = BTreeMap<Label, usize>;

/// Result of syncing one catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogOutcome {
    pub catalog_key: String,
    pub display_name: String,

    /// Items in the document (0 when it could not be loaded)
    pub item_count: usize,

    /// Items that carried the eligibility fields and were classified
    pub classified_count: usize,

    /// Classified items whose badge (or color, when assigned) changed
    pub updated_count: usize,

    pub status: Status,

    /// Set whenever `status` is not `Ok`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,

    pub message: String,

    /// Badges assigned during this pass
    #[serde(default)]
    pub badge_tally: BadgeTally,
}

impl CatalogOutcome {
    /// Outcome for a catalog that failed before anything was classified
    pub fn failed(catalog: &CatalogRef, error: &SyncError) -> Self {
        Self {
            catalog_key: catalog.key.clone(),
            display_name: catalog.display_name.clone(),
            item_count: 0,
            classified_count: 0,
            updated_count: 0,
            status: error.status(),
            failure: Some(error.kind()),
            message: error.to_string(),
            badge_tally: BadgeTally::new(),
        }
    }

    /// Outcome for a catalog whose sync panicked
    pub fn panicked(catalog: &CatalogRef, detail: &str) -> Self {
        Self {
            catalog_key: catalog.key.clone(),
            display_name: catalog.display_name.clone(),
            item_count: 0,
            classified_count: 0,
            updated_count: 0,
            status: Status::Error,
            failure: Some(FailureKind::Panicked),
            message: format!("sync aborted unexpectedly: {}", detail),
            badge_tally: BadgeTally::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn tally_of(&self, label: Label) -> usize {
        self.badge_tally.get(&label).copied().unwrap_or(0)
    }
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Unique run id (UUIDv4)
    pub run_id: String,

    /// Run start timestamp (ISO 8601)
    pub started_at: String,

    /// Run end timestamp (ISO 8601), set by [`BatchReport::finish`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,

    /// Rule table version and profile
    pub rules_version: String,

    /// Whether writes were suppressed
    pub dry_run: bool,
}

/// Complete batch run report
///
/// Built once per run. The core never persists it; the CLI may export it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub run: RunInfo,

    /// Catalogs selected for this run
    pub registered: usize,

    /// One entry per processed catalog, in registry order
    pub outcomes: Vec<CatalogOutcome>,
}

impl BatchReport {
    pub fn new(rules_version: impl Into<String>, registered: usize, dry_run: bool) -> Self {
        Self {
            run: RunInfo {
                run_id: uuid::Uuid::new_v4().to_string(),
                started_at: chrono::Utc::now().to_rfc3339(),
                finished_at: None,
                rules_version: rules_version.into(),
                dry_run,
            },
            registered,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: CatalogOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.run.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Catalogs fully synchronized (status `Ok`)
    pub fn success_count(&self) -> usize {
        self.count_status(Status::Ok)
    }

    pub fn warning_count(&self) -> usize {
        self.count_status(Status::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count_status(Status::Error)
    }

    fn count_status(&self, status: Status) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Fraction of registered catalogs fully synchronized (1.0 when none registered)
    pub fn success_ratio(&self) -> f64 {
        if self.registered == 0 {
            1.0
        } else {
            self.success_count() as f64 / self.registered as f64
        }
    }

    /// True when every registered catalog synced without warning or error
    pub fn all_succeeded(&self) -> bool {
        self.processed() == self.registered && self.success_count() == self.registered
    }

    pub fn total_items(&self) -> usize {
        self.outcomes.iter().map(|o| o.item_count).sum()
    }

    pub fn total_updated(&self) -> usize {
        self.outcomes.iter().map(|o| o.updated_count).sum()
    }

    /// Badge tally summed over all catalogs
    pub fn badge_totals(&self) -> BadgeTally {
        let mut totals = BadgeTally::new();
        for outcome in &self.outcomes {
            for (label, count) in &outcome.badge_tally {
                *totals.entry(*label).or_insert(0) += count;
            }
        }
        totals
    }

    pub fn outcome(&self, catalog_key: &str) -> Option<&CatalogOutcome> {
        self.outcomes.iter().find(|o| o.catalog_key == catalog_key)
    }

    /// Export report to JSON file
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic_create_dirs(path.as_ref(), json.as_bytes())
    }

    /// Import report from JSON file
    pub fn import_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let report: BatchReport = serde_json::from_reader(file)?;
        Ok(report)
    }
}

/// Text formatter for batch reports
pub struct ReportFormatter;

const RULE: &str = "============================================================";

impl ReportFormatter {
    fn status_tag(status: Status) -> &'static str {
        match status {
            Status::Ok => "[OK]   ",
            Status::Warning => "[WARN] ",
            Status::Error => "[ERROR]",
        }
    }

    /// Report header lines
    pub fn format_header(report: &BatchReport) -> Vec<String> {
        let mode = if report.run.dry_run { " (dry run)" } else { "" };
        vec![
            RULE.to_string(),
            format!("Badge sync{}: {} catalog(s), rules {}", mode, report.registered, report.run.rules_version),
            format!("Run {} started {}", report.run.run_id, report.run.started_at),
            RULE.to_string(),
        ]
    }

    /// One line per catalog
    ///
    /// Example: `[OK]    pretty (بريتي): updated 3 of 12 items`
    pub fn format_outcome(outcome: &CatalogOutcome) -> String {
        let tag = Self::status_tag(outcome.status);
        match outcome.status {
            Status::Ok => format!(
                "{} {} ({}): updated {} of {} items",
                tag, outcome.catalog_key, outcome.display_name, outcome.updated_count, outcome.item_count
            ),
            _ => format!(
                "{} {} ({}): {}",
                tag, outcome.catalog_key, outcome.display_name, outcome.message
            ),
        }
    }

    /// Badge distribution lines for one catalog
    ///
    /// Example: `    - BEST_SELLER أكثر مبيعاً: 3`
    pub fn format_tally(tally: &BadgeTally) -> Vec<String> {
        tally
            .iter()
            .map(|(label, count)| format!("    - {} {}: {}", label.code(), label.as_text(), count))
            .collect()
    }

    /// Final summary lines
    pub fn format_summary(report: &BatchReport) -> Vec<String> {
        vec![
            RULE.to_string(),
            format!(
                "Synchronized {} of {} catalog(s) ({} warning(s), {} error(s))",
                report.success_count(),
                report.registered,
                report.warning_count(),
                report.error_count()
            ),
            format!(
                "Items: {} total, {} updated",
                report.total_items(),
                report.total_updated()
            ),
            RULE.to_string(),
        ]
    }

    /// Full report, line by line
    pub fn format_report(report: &BatchReport) -> Vec<String> {
        let mut lines = Self::format_header(report);
        for outcome in &report.outcomes {
            lines.push(Self::format_outcome(outcome));
            lines.extend(Self::format_tally(&outcome.badge_tally));
        }
        lines.extend(Self::format_summary(report));
        lines
    }
}

/// Encoding used for report text
///
/// Badge labels and store names are Arabic. `Utf8` writes them as-is;
/// `AsciiEscaped` writes every non-ASCII character as `\u{XXXX}` for sinks that
/// cannot display UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    #[default]
    Utf8,
    AsciiEscaped,
}

impl OutputEncoding {
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            OutputEncoding::Utf8 => Cow::Borrowed(text),
            OutputEncoding::AsciiEscaped if text.is_ascii() => Cow::Borrowed(text),
            OutputEncoding::AsciiEscaped => {
                let mut escaped = String::with_capacity(text.len() * 2);
                for ch in text.chars() {
                    if ch.is_ascii() {
                        escaped.push(ch);
                    } else {
                        escaped.push_str(&format!("\\u{{{:04x}}}", ch as u32));
                    }
                }
                Cow::Owned(escaped)
            }
        }
    }
}

/// Writes formatted reports to any byte sink with a fixed encoding
pub struct ReportWriter<W: Write> {
    out: W,
    encoding: OutputEncoding,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W, encoding: OutputEncoding) -> Self {
        Self { out, encoding }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let text = self.encoding.encode(line);
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\n")
    }

    pub fn write_report(&mut self, report: &BatchReport) -> io::Result<()> {
        for line in ReportFormatter::format_report(report) {
            self.write_line(&line)?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn catalog(key: &str) -> CatalogRef {
        CatalogRef::new(key, "بريتي", format!("/a/{}.json", key), format!("/m/{}.json", key))
    }

    fn ok_outcome(key: &str, items: usize, updated: usize) -> CatalogOutcome {
        let mut tally = BadgeTally::new();
        tally.insert(Label::BestSeller, updated);
        tally.insert(Label::New, items - updated);
        CatalogOutcome {
            catalog_key: key.to_string(),
            display_name: "بريتي".to_string(),
            item_count: items,
            classified_count: items,
            updated_count: updated,
            status: Status::Ok,
            failure: None,
            message: String::new(),
            badge_tally: tally,
        }
    }

    fn sample_report() -> BatchReport {
        let mut report = BatchReport::new("badge-rules/1/standard", 3, false);
        report.record(ok_outcome("pretty", 4, 1));
        report.record(ok_outcome("nawaem", 6, 2));
        report.record(CatalogOutcome::failed(
            &catalog("sheirine"),
            &SyncError::NotFound { path: PathBuf::from("/a/sheirine.json") },
        ));
        report.finish();
        report
    }

    #[test]
    fn test_counts_and_ratio() {
        let report = sample_report();

        assert_eq!(report.processed(), 3);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 0);
        assert!(!report.all_succeeded());
        assert!((report.success_ratio() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.total_items(), 10);
        assert_eq!(report.total_updated(), 3);
        assert!(report.run.finished_at.is_some());
    }

    #[test]
    fn test_badge_totals_sum_catalogs() {
        let totals = sample_report().badge_totals();
        assert_eq!(totals.get(&Label::BestSeller), Some(&3));
        assert_eq!(totals.get(&Label::New), Some(&7));
    }

    #[test]
    fn test_failed_outcome_carries_kind() {
        let report = sample_report();
        let failed = report.outcome("sheirine").unwrap();

        assert_eq!(failed.status, Status::Error);
        assert_eq!(failed.failure, Some(FailureKind::NotFound));
        assert!(failed.message.contains("not found"));
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = BatchReport::new("badge-rules/1/standard", 0, true);
        assert!(report.all_succeeded());
        assert_eq!(report.success_ratio(), 1.0);
    }

    #[test]
    fn test_json_export_import() {
        let report = sample_report();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports").join("run.json");

        report.export_json(&path).unwrap();
        let imported = BatchReport::import_json(&path).unwrap();

        assert_eq!(imported, report);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"BEST_SELLER\""));
        assert!(raw.contains("بريتي"));
    }

    #[test]
    fn test_format_report_lines() {
        let lines = ReportFormatter::format_report(&sample_report());
        let text = lines.join("\n");

        assert!(text.contains("[OK]    pretty (بريتي): updated 1 of 4 items"));
        assert!(text.contains("    - BEST_SELLER أكثر مبيعاً: 1"));
        assert!(text.contains("[ERROR] sheirine"));
        assert!(text.contains("Synchronized 2 of 3 catalog(s) (0 warning(s), 1 error(s))"));
    }

    #[test]
    fn test_ascii_escaped_encoding() {
        let encoded = OutputEncoding::AsciiEscaped.encode("pretty (بر)");
        assert_eq!(encoded, "pretty (\\u{0628}\\u{0631})");
        assert!(matches!(OutputEncoding::AsciiEscaped.encode("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_writer_encodings() {
        let report = sample_report();

        let mut utf8 = ReportWriter::new(Vec::new(), OutputEncoding::Utf8);
        utf8.write_report(&report).unwrap();
        let utf8_text = String::from_utf8(utf8.into_inner()).unwrap();
        assert!(utf8_text.contains("بريتي"));

        let mut ascii = ReportWriter::new(Vec::new(), OutputEncoding::AsciiEscaped);
        ascii.write_report(&report).unwrap();
        let ascii_bytes = ascii.into_inner();
        assert!(ascii_bytes.is_ascii());
        assert!(String::from_utf8(ascii_bytes).unwrap().contains("\\u{0628}"));
    }
}
