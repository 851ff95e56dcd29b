//! Builds the combined, presentation-ready transaction view.

use serde::Serialize;

use crate::clusters::ClusterMatcher;
use crate::models::{CombinedTransaction, ParsedBatch, CREDIT_CARD_CATEGORY};
use crate::override_keys::resolve_override;
use crate::rule_store::RuleStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedView {
    /// Most recent first.
    pub transactions: Vec<CombinedTransaction>,
    /// Rows left out because their date could not be parsed.
    pub dropped: usize,
    /// Export files that could not be read at all.
    pub skipped_files: usize,
}

fn is_settlement(description: &str, patterns: &[String]) -> bool {
    let text = description.to_lowercase();
    patterns.iter().any(|p| text.contains(p.as_str()))
}

/// Merge categorized batches into one view.
///
/// The steps run in a fixed order: normalize and concatenate, stable sort by
/// date descending, apply manual overrides (current key, then legacy key),
/// force card-settlement payments to [`CREDIT_CARD_CATEGORY`], then attach
/// cluster labels. Settlement detection runs after overrides and wins over
/// them, so a card-bill payment is never counted as spend.
pub fn assemble_combined_view(batches: &[ParsedBatch], store: &RuleStore) -> CombinedView {
    let mut dropped = 0usize;
    let mut transactions = Vec::new();

    for batch in batches {
        dropped += batch.parse_failures;
        for row in &batch.rows {
            let Some(date) = row.date else {
                dropped += 1;
                continue;
            };
            transactions.push(CombinedTransaction::new(
                date,
                row.amount,
                row.description(batch.source),
                &batch.account,
                batch.source,
                row.category.clone(),
            ));
        }
    }

    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    if !store.overrides.is_empty() {
        for txn in &mut transactions {
            let current = txn.override_key();
            let legacy = txn.legacy_override_key();
            if let Some(category) = resolve_override(&store.overrides, &current, &legacy) {
                txn.category = category.to_string();
                txn.overridden = true;
            }
        }
    }

    let patterns: Vec<String> = store
        .cc_settlement_patterns()
        .iter()
        .map(|p| p.to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if !patterns.is_empty() {
        for txn in &mut transactions {
            if is_settlement(&txn.description, &patterns) {
                txn.category = CREDIT_CARD_CATEGORY.to_string();
            }
        }
    }

    let matcher = ClusterMatcher::compile(&store.clusters);
    if !matcher.is_empty() {
        for txn in &mut transactions {
            txn.cluster_label = matcher.label(Some(&txn.description));
        }
    }

    if dropped > 0 {
        tracing::warn!("{dropped} rows dropped because their date could not be parsed");
    }
    tracing::debug!("Combined view holds {} transactions", transactions.len());

    CombinedView {
        transactions,
        dropped,
        skipped_files: 0,
    }
}
