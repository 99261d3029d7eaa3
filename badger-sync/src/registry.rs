//! Store registry: the ordered list of catalogs a batch run processes

use badger_common::config::TomlConfig;
use badger_common::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One catalog and its two storage locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRef {
    pub key: String,
    pub display_name: String,
    pub authoritative: PathBuf,
    pub mirror: PathBuf,
}

impl CatalogRef {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        authoritative: impl Into<PathBuf>,
        mirror: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            authoritative: authoritative.into(),
            mirror: mirror.into(),
        }
    }
}

/// Ordered catalog registry
///
/// Order only affects report ordering; catalogs share no state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<CatalogRef>,
}

impl Registry {
    pub fn new(entries: Vec<CatalogRef>) -> Self {
        Self { entries }
    }

    /// Resolve every configured store against `root`
    pub fn from_config(config: &TomlConfig, root: &Path) -> Result<Self> {
        config.validate()?;
        let entries = config
            .stores
            .iter()
            .map(|store| {
                CatalogRef::new(
                    store.key.clone(),
                    store.display_name(),
                    store.authoritative_path(root),
                    store.mirror_path(root),
                )
            })
            .collect();
        Ok(Self { entries })
    }

    /// Keep only the named stores, in registry order
    ///
    /// An empty selection keeps everything. Unknown keys are rejected so a
    /// typo never silently processes nothing.
    pub fn select(&self, keys: &[String]) -> Result<Self> {
        if keys.is_empty() {
            return Ok(self.clone());
        }

        let unknown: Vec<&str> = keys
            .iter()
            .map(String::as_str)
            .filter(|key| !self.entries.iter().any(|e| e.key == *key))
            .collect();
        if !unknown.is_empty() {
            return Err(Error::InvalidInput(format!(
                "unknown store key(s): {}",
                unknown.join(", ")
            )));
        }

        let entries = self
            .entries
            .iter()
            .filter(|e| keys.iter().any(|k| *k == e.key))
            .cloned()
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogRef] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogRef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use badger_common::config::StoreConfig;

    fn config() -> TomlConfig {
        TomlConfig {
            stores: vec![
                StoreConfig::new("nawaem", "نواعم"),
                StoreConfig::new("pretty", "بريتي"),
                StoreConfig::new("sheirine", "شيرين"),
            ],
            ..TomlConfig::default()
        }
    }

    #[test]
    fn test_from_config_resolves_paths() {
        let registry = Registry::from_config(&config(), Path::new("/srv/shop")).unwrap();

        assert_eq!(registry.len(), 3);
        let first = &registry.entries()[0];
        assert_eq!(first.key, "nawaem");
        assert_eq!(first.display_name, "نواعم");
        assert_eq!(first.authoritative, PathBuf::from("/srv/shop/public/assets/nawaem/store.json"));
        assert_eq!(first.mirror, PathBuf::from("/srv/shop/dist/assets/nawaem/store.json"));
    }

    #[test]
    fn test_select_keeps_registry_order() {
        let registry = Registry::from_config(&config(), Path::new("/srv")).unwrap();
        let selected = registry
            .select(&["sheirine".to_string(), "nawaem".to_string()])
            .unwrap();

        let keys: Vec<_> = selected.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["nawaem", "sheirine"]);
    }

    #[test]
    fn test_select_empty_keeps_all() {
        let registry = Registry::from_config(&config(), Path::new("/srv")).unwrap();
        assert_eq!(registry.select(&[]).unwrap(), registry);
    }

    #[test]
    fn test_select_unknown_key_fails() {
        let registry = Registry::from_config(&config(), Path::new("/srv")).unwrap();
        let result = registry.select(&["pretty".to_string(), "prety".to_string()]);
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("prety")));
    }
}
