//! Catalog documents: load, classify, write to both sinks
//!
//! A catalog is a JSON object with a `products` array. The document is kept
//! as a generic JSON map so fields this tool does not know about survive a
//! rewrite untouched and in their original order.
//!
//! **Write ordering:**
//! 1. Serialize once
//! 2. Write the authoritative copy (failure → `Error`, mirror untouched)
//! 3. Write the identical bytes to the mirror, creating its folders
//!    (failure → `Warning`, authoritative already correct)

use crate::classifier::RuleSet;
use crate::error::{Sink, Status, SyncError};
use crate::label::Label;
use crate::registry::CatalogRef;
use crate::report::{BadgeTally, CatalogOutcome};
use crate::stats::ItemStats;
use badger_common::file_utils::{write_atomic, write_atomic_create_dirs};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

pub const PRODUCTS: &str = "products";
pub const BADGE: &str = "badge";
pub const BADGE_COLOR: &str = "badgeColor";

/// Parsed catalog document
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    root: Map<String, Value>,
}

impl CatalogDocument {
    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SyncError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::InvalidData => SyncError::Corrupt {
                path: path.to_path_buf(),
                reason: "document is not valid UTF-8".to_string(),
            },
            _ => SyncError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Self::parse(&text).map_err(|reason| SyncError::Corrupt {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse document text, checking the top-level shape
    pub fn parse(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let Value::Object(root) = value else {
            return Err("top-level value is not an object".to_string());
        };
        match root.get(PRODUCTS) {
            Some(Value::Array(_)) => Ok(Self { root }),
            Some(_) => Err(format!("`{}` is not an array", PRODUCTS)),
            None => Err(format!("missing `{}` array", PRODUCTS)),
        }
    }

    pub fn products(&self) -> &[Value] {
        self.root
            .get(PRODUCTS)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn products_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.root.get_mut(PRODUCTS).and_then(Value::as_array_mut)
    }

    pub fn item_count(&self) -> usize {
        self.products().len()
    }

    /// Stable serialization: original key order, 2-space indent, raw UTF-8
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.root)
    }

    /// Classify every eligible item in place
    pub fn apply_badges(&mut self, rules: &RuleSet) -> ClassifyPass {
        let mut pass = ClassifyPass::default();
        let assign_color = rules.assigns_color();
        let Some(products) = self.products_mut() else {
            return pass;
        };

        pass.item_count = products.len();
        for product in products.iter_mut() {
            let Value::Object(item) = product else {
                continue;
            };
            if !rules.is_eligible(item) {
                continue;
            }

            let label = rules.classify(&ItemStats::from_item(item));
            pass.classified_count += 1;
            *pass.tally.entry(label).or_insert(0) += 1;
            if apply_label(item, label, assign_color) {
                pass.updated_count += 1;
            }
        }
        pass
    }
}

/// Write `label` (and optionally its style) onto the item; true if anything changed
fn apply_label(item: &mut Map<String, Value>, label: Label, assign_color: bool) -> bool {
    let mut changed = false;

    let text = label.as_text();
    if item.get(BADGE).and_then(Value::as_str) != Some(text) {
        item.insert(BADGE.to_string(), Value::String(text.to_string()));
        changed = true;
    }

    if assign_color {
        let style = label.style();
        if item.get(BADGE_COLOR).and_then(Value::as_str) != Some(style) {
            item.insert(BADGE_COLOR.to_string(), Value::String(style.to_string()));
            changed = true;
        }
    }

    changed
}

/// Counts from one classification pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifyPass {
    pub item_count: usize,
    pub classified_count: usize,
    pub updated_count: usize,
    pub tally: BadgeTally,
}

impl ClassifyPass {
    fn into_outcome(self, catalog: &CatalogRef, status: Status, error: Option<&SyncError>, message: String) -> CatalogOutcome {
        CatalogOutcome {
            catalog_key: catalog.key.clone(),
            display_name: catalog.display_name.clone(),
            item_count: self.item_count,
            classified_count: self.classified_count,
            updated_count: self.updated_count,
            status,
            failure: error.map(SyncError::kind),
            message,
            badge_tally: self.tally,
        }
    }
}

/// Per-run sync switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Classify and report, but write nothing
    pub dry_run: bool,
}

/// Write the document to the authoritative path, then the mirror
pub fn write_both(document: &CatalogDocument, catalog: &CatalogRef) -> Result<(), SyncError> {
    let authoritative_failure = |source: io::Error| SyncError::WriteFailure {
        sink: Sink::Authoritative,
        path: catalog.authoritative.clone(),
        source,
    };

    let body = document
        .to_json_string()
        .map_err(|e| authoritative_failure(e.into()))?;

    write_atomic(&catalog.authoritative, body.as_bytes()).map_err(authoritative_failure)?;
    debug!(catalog = %catalog.key, path = %catalog.authoritative.display(), "Authoritative copy written");

    write_atomic_create_dirs(&catalog.mirror, body.as_bytes()).map_err(|source| {
        SyncError::PartialSync {
            mirror: catalog.mirror.clone(),
            source,
        }
    })?;
    debug!(catalog = %catalog.key, path = %catalog.mirror.display(), "Mirror copy written");

    Ok(())
}

/// Load, classify, and persist one catalog
///
/// Never fails: every error becomes part of the returned outcome.
pub fn sync_catalog(catalog: &CatalogRef, rules: &RuleSet, options: &SyncOptions) -> CatalogOutcome {
    let mut document = match CatalogDocument::load(&catalog.authoritative) {
        Ok(document) => document,
        Err(e) => return CatalogOutcome::failed(catalog, &e),
    };

    let pass = document.apply_badges(rules);
    debug!(
        catalog = %catalog.key,
        items = pass.item_count,
        classified = pass.classified_count,
        updated = pass.updated_count,
        "Classification pass complete"
    );

    if options.dry_run {
        let message = format!(
            "dry run: {} of {} items would change",
            pass.updated_count, pass.item_count
        );
        return pass.into_outcome(catalog, Status::Ok, None, message);
    }

    match write_both(&document, catalog) {
        Ok(()) => {
            let message = format!("updated {} of {} items", pass.updated_count, pass.item_count);
            pass.into_outcome(catalog, Status::Ok, None, message)
        }
        Err(e) => {
            let message = e.to_string();
            pass.into_outcome(catalog, e.status(), Some(&e), message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: Value) -> CatalogDocument {
        CatalogDocument::parse(&value.to_string()).unwrap()
    }

    fn badges(document: &CatalogDocument) -> Vec<Option<String>> {
        document
            .products()
            .iter()
            .map(|p| p.get(BADGE).and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(CatalogDocument::parse("not json").is_err());
        assert!(CatalogDocument::parse("[]").is_err());
        assert!(CatalogDocument::parse(r#"{"name": "x"}"#).is_err());
        assert!(CatalogDocument::parse(r#"{"products": {}}"#).is_err());
        assert!(CatalogDocument::parse(r#"{"products": []}"#).is_ok());
    }

    #[test]
    fn test_apply_badges_end_to_end_example() {
        let mut document = doc(json!({ "products": [
            { "id": 1, "name": "أحمر شفاه", "quantity": 0, "orders": 5, "likes": 1, "views": 10, "price": 50, "originalPrice": 50 },
            { "id": 2, "name": "كريم", "quantity": 20, "orders": 120, "likes": 50, "views": 10, "price": 50, "originalPrice": 50 }
        ]}));

        let pass = document.apply_badges(&RuleSet::standard());

        assert_eq!(pass.item_count, 2);
        assert_eq!(pass.classified_count, 2);
        assert_eq!(pass.updated_count, 2);
        assert_eq!(
            badges(&document),
            vec![
                Some(Label::OutOfStock.as_text().to_string()),
                Some(Label::BestSeller.as_text().to_string())
            ]
        );
        assert_eq!(pass.tally.get(&Label::OutOfStock), Some(&1));
        assert_eq!(pass.tally.get(&Label::BestSeller), Some(&1));
    }

    #[test]
    fn test_ineligible_items_untouched() {
        let mut document = doc(json!({ "products": [
            { "name": "بدون طلبات", "quantity": 0 },
            "not an object",
            { "name": "مع طلبات", "orders": 0, "quantity": 5 }
        ]}));

        let pass = document.apply_badges(&RuleSet::standard());

        assert_eq!(pass.item_count, 3);
        assert_eq!(pass.classified_count, 1);
        assert_eq!(pass.updated_count, 1);
        assert!(document.products()[0].get(BADGE).is_none());
        assert_eq!(document.products()[1], json!("not an object"));
    }

    #[test]
    fn test_second_pass_updates_nothing() {
        let mut document = doc(json!({ "products": [
            { "orders": 150, "likes": 250, "quantity": 10 },
            { "orders": 1, "quantity": 10, "price": 85, "originalPrice": 100 }
        ]}));
        let rules = RuleSet::stock_aware();

        let first = document.apply_badges(&rules);
        let second = document.apply_badges(&rules);

        assert_eq!(first.updated_count, 2);
        assert_eq!(second.updated_count, 0);
        assert_eq!(first.tally, second.tally);
    }

    #[test]
    fn test_color_change_counts_as_update() {
        let mut document = doc(json!({ "products": [
            { "orders": 0, "quantity": 10, "badge": "جديد", "badgeColor": "bg-black" }
        ]}));

        let without_color = document.clone().apply_badges(&RuleSet::standard());
        assert_eq!(without_color.updated_count, 0);

        let with_color = document.apply_badges(&RuleSet::standard().with_color(true));
        assert_eq!(with_color.updated_count, 1);
        assert_eq!(document.products()[0][BADGE_COLOR], json!("bg-teal-600 text-white"));
    }

    #[test]
    fn test_serialization_preserves_key_order_and_arabic() {
        let text = r#"{"storeName":"نواعم","products":[{"name":"عطر","orders":1,"quantity":3,"zeta":true,"alpha":[1,2]}],"updatedAt":"2024-01-01"}"#;
        let mut document = CatalogDocument::parse(text).unwrap();
        document.apply_badges(&RuleSet::standard());

        let out = document.to_json_string().unwrap();

        assert!(out.contains("\"storeName\": \"نواعم\""));
        assert!(out.find("storeName").unwrap() < out.find("products").unwrap());
        assert!(out.find("products").unwrap() < out.find("updatedAt").unwrap());
        assert!(out.find("zeta").unwrap() < out.find("alpha").unwrap());
        assert!(out.find("alpha").unwrap() < out.find("\"badge\"").unwrap());
        assert!(out.contains("\n  \"products\": ["));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = CatalogDocument::load(&dir.path().join("store.json")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"{\"products\": [").unwrap();

        let err = CatalogDocument::load(&path).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Corrupt);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let authoritative = dir.path().join("public").join("store.json");
        let mirror = dir.path().join("dist").join("store.json");
        fs::create_dir_all(authoritative.parent().unwrap()).unwrap();
        let original = r#"{"products":[{"orders":120,"quantity":4}]}"#;
        fs::write(&authoritative, original).unwrap();
        let catalog = CatalogRef::new("pretty", "بريتي", &authoritative, &mirror);

        let outcome = sync_catalog(&catalog, &RuleSet::standard(), &SyncOptions { dry_run: true });

        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(outcome.updated_count, 1);
        assert_eq!(fs::read_to_string(&authoritative).unwrap(), original);
        assert!(!mirror.exists());
    }
}
