//! The rule document: keyword rules, IBAN rules, manual overrides, cluster
//! patterns and tunables, loaded and saved as one JSON file.
//!
//! The store is an explicit value. Callers load it once per processing pass,
//! pass it by reference into the pure core functions, and write it back with
//! [`RuleStore::save_to`] after a whole-document edit.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{FinboardError, Result};
use crate::models::{
    CombinedTransaction, CREDIT_CARD_CATEGORY, INVESTMENTS_CATEGORY, SALARY_CATEGORY,
    TRANSFERS_CATEGORY,
};

pub const DEFAULT_CC_SETTLEMENT_PATTERNS: &[&str] =
    &["kreditkartenabrechnung", "ausgleich kreditkarte"];

pub fn default_non_spending_categories() -> Vec<String> {
    vec![
        TRANSFERS_CATEGORY.to_string(),
        CREDIT_CARD_CATEGORY.to_string(),
        INVESTMENTS_CATEGORY.to_string(),
    ]
}

/// Section values that are `null` in the file behave like absent sections.
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tunables from the `config` section. Keys left unset fall back to the
/// defaults at read time and are not written back on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_spending_categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc_settlement_patterns: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleStore {
    #[serde(default, deserialize_with = "nullable")]
    pub config: StoreConfig,
    /// Category -> keywords, in declaration order. Order decides priority.
    #[serde(default, deserialize_with = "nullable")]
    pub rules: IndexMap<String, Vec<String>>,
    /// IBAN (uppercase) -> category.
    #[serde(default, deserialize_with = "nullable")]
    pub iban_rules: IndexMap<String, String>,
    /// Override key -> category.
    #[serde(default, deserialize_with = "nullable")]
    pub overrides: IndexMap<String, String>,
    /// Cluster label -> wildcard patterns, in declaration order.
    #[serde(default, deserialize_with = "nullable")]
    pub clusters: IndexMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Uppercase with all whitespace removed, the form IBAN rules are keyed by.
pub fn normalize_iban(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean_name(name: &str, what: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FinboardError::Validation(format!("{what} name must not be empty")));
    }
    Ok(name.to_string())
}

/// Rename `old` to `new` in place, keeping its position.
fn rename_key<V>(map: &mut IndexMap<String, V>, old: &str, new: String) -> bool {
    let Some(index) = map.get_index_of(old) else {
        return false;
    };
    if let Some((_, value)) = map.shift_remove_index(index) {
        let (last, _) = map.insert_full(new, value);
        map.move_index(last, index);
    }
    true
}

impl RuleStore {
    // -----------------------------------------------------------------------
    // Load / save
    // -----------------------------------------------------------------------

    /// Read the document at `path`. A missing file is the empty document.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No rule document at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} rule categories, {} IBAN rules, {} overrides, {} clusters from {}",
            store.rules.len(),
            store.iban_rules.len(),
            store.overrides.len(),
            store.clusters.len(),
            path.display()
        );
        Ok(store)
    }

    /// Like [`RuleStore::load_from`], but a malformed document degrades to the
    /// empty document instead of failing the processing pass.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Ignoring unreadable rule document {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Write the whole document. The new content replaces the old file in one
    /// rename, so readers never observe a partially written document.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, format!("{json}\n"))?;
        std::fs::rename(&tmp, path)?;
        tracing::info!("Saved rule document to {}", path.display());
        Ok(())
    }

    /// Hex SHA-256 of the serialized document, usable as a memoization key.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        hex::encode(Sha256::digest(json.as_bytes()))
    }

    // -----------------------------------------------------------------------
    // Tunables
    // -----------------------------------------------------------------------

    pub fn non_spending_categories(&self) -> Vec<String> {
        self.config
            .non_spending_categories
            .clone()
            .unwrap_or_else(default_non_spending_categories)
    }

    pub fn cc_settlement_patterns(&self) -> Vec<String> {
        self.config.cc_settlement_patterns.clone().unwrap_or_else(|| {
            DEFAULT_CC_SETTLEMENT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect()
        })
    }

    /// Labels offered when assigning a category by hand: the free-form
    /// transfer and salary labels first, then the rule categories sorted.
    pub fn categories_for_selection(&self) -> Vec<String> {
        let mut names: Vec<String> = vec![TRANSFERS_CATEGORY.into(), SALARY_CATEGORY.into()];
        let mut rule_names: Vec<&String> = self.rules.keys().collect();
        rule_names.sort();
        for name in rule_names {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let name = clean_name(name, "Category")?;
        if self.rules.contains_key(&name) {
            return Err(FinboardError::Validation(format!(
                "Category '{name}' already exists"
            )));
        }
        self.rules.insert(name, Vec::new());
        Ok(())
    }

    pub fn set_keywords(&mut self, category: &str, keywords: &[String]) -> Result<usize> {
        let entry = self
            .rules
            .get_mut(category)
            .ok_or_else(|| FinboardError::UnknownCategory(category.to_string()))?;
        *entry = clean_list(keywords);
        Ok(entry.len())
    }

    pub fn rename_category(&mut self, old: &str, new: &str) -> Result<()> {
        let new = clean_name(new, "Category")?;
        if new == old {
            return Ok(());
        }
        if self.rules.contains_key(&new) {
            return Err(FinboardError::Validation(format!(
                "Category '{new}' already exists"
            )));
        }
        if !rename_key(&mut self.rules, old, new) {
            return Err(FinboardError::UnknownCategory(old.to_string()));
        }
        Ok(())
    }

    pub fn delete_category(&mut self, name: &str) -> Result<()> {
        self.rules
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| FinboardError::UnknownCategory(name.to_string()))
    }

    // -----------------------------------------------------------------------
    // Clusters
    // -----------------------------------------------------------------------

    pub fn add_cluster(&mut self, label: &str, patterns: &[String]) -> Result<()> {
        let label = clean_name(label, "Cluster")?;
        let patterns = clean_list(patterns);
        if patterns.is_empty() {
            return Err(FinboardError::Validation(
                "Cluster needs at least one pattern".to_string(),
            ));
        }
        if self.clusters.contains_key(&label) {
            return Err(FinboardError::Validation(format!(
                "Cluster '{label}' already exists"
            )));
        }
        self.clusters.insert(label, patterns);
        Ok(())
    }

    pub fn set_cluster_patterns(&mut self, label: &str, patterns: &[String]) -> Result<usize> {
        let patterns = clean_list(patterns);
        if patterns.is_empty() {
            return Err(FinboardError::Validation(
                "Cluster needs at least one pattern".to_string(),
            ));
        }
        let entry = self
            .clusters
            .get_mut(label)
            .ok_or_else(|| FinboardError::UnknownCluster(label.to_string()))?;
        *entry = patterns;
        Ok(entry.len())
    }

    pub fn rename_cluster(&mut self, old: &str, new: &str) -> Result<()> {
        let new = clean_name(new, "Cluster")?;
        if new == old {
            return Ok(());
        }
        if self.clusters.contains_key(&new) {
            return Err(FinboardError::Validation(format!(
                "Cluster '{new}' already exists"
            )));
        }
        if !rename_key(&mut self.clusters, old, new) {
            return Err(FinboardError::UnknownCluster(old.to_string()));
        }
        Ok(())
    }

    pub fn delete_cluster(&mut self, label: &str) -> Result<()> {
        self.clusters
            .shift_remove(label)
            .map(|_| ())
            .ok_or_else(|| FinboardError::UnknownCluster(label.to_string()))
    }

    // -----------------------------------------------------------------------
    // IBAN rules
    // -----------------------------------------------------------------------

    /// Map `iban` to `category`, replacing any existing mapping. Returns the
    /// normalized IBAN the rule is stored under.
    pub fn set_iban_rule(&mut self, iban: &str, category: &str) -> Result<String> {
        let iban = normalize_iban(iban);
        if iban.is_empty() {
            return Err(FinboardError::Validation("IBAN must not be empty".to_string()));
        }
        let category = clean_name(category, "Category")?;
        self.iban_rules.insert(iban.clone(), category);
        Ok(iban)
    }

    pub fn delete_iban_rule(&mut self, iban: &str) -> Result<()> {
        let iban = normalize_iban(iban);
        self.iban_rules
            .shift_remove(&iban)
            .map(|_| ())
            .ok_or_else(|| FinboardError::Other(format!("No IBAN rule for {iban}")))
    }

    // -----------------------------------------------------------------------
    // Manual overrides
    // -----------------------------------------------------------------------

    /// Store a manual category under the transaction's current key.
    pub fn set_override(&mut self, txn: &CombinedTransaction, category: &str) -> Result<String> {
        let category = clean_name(category, "Category")?;
        let key = txn.override_key();
        self.overrides.insert(key.clone(), category);
        Ok(key)
    }

    pub fn has_override(&self, txn: &CombinedTransaction) -> bool {
        self.overrides.contains_key(&txn.override_key())
            || self.overrides.contains_key(&txn.legacy_override_key())
    }

    /// Remove every manual override. Returns how many were dropped.
    pub fn clear_overrides(&mut self) -> usize {
        let n = self.overrides.len();
        self.overrides.clear();
        n
    }
}
