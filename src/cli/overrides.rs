use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::error::{FinboardError, Result};
use crate::models::CombinedTransaction;

use super::{build_view, Workspace};

/// Find a transaction by its position in the combined view or by its key.
fn find_target<'a>(
    transactions: &'a [CombinedTransaction],
    target: &str,
) -> Result<&'a CombinedTransaction> {
    if let Ok(index) = target.parse::<usize>() {
        return transactions.get(index).ok_or_else(|| {
            FinboardError::Other(format!(
                "No transaction #{index} ({} transactions loaded)",
                transactions.len()
            ))
        });
    }
    transactions
        .iter()
        .find(|t| t.override_key() == target)
        .ok_or_else(|| FinboardError::Other(format!("No transaction with key {target}")))
}

pub fn set(ws: &Workspace, target: &str, category: &str) -> Result<()> {
    let path = ws.rules_path();
    let mut store = ws.load_store()?;
    let view = build_view(&ws.data_dir(), &store)?;
    let txn = find_target(&view.transactions, target)?;

    let known = store.categories_for_selection();
    if !known.iter().any(|c| c == category.trim()) {
        eprintln!(
            "{} '{}' is not a rule category; storing it anyway.",
            "Note:".yellow(),
            category.trim()
        );
    }

    let key = store.set_override(txn, category)?;
    store.save_to(&path)?;
    println!(
        "{} \u{2192} {} ({key})",
        txn.description,
        category.trim().bold()
    );
    Ok(())
}

pub fn list(ws: &Workspace) -> Result<()> {
    let store = ws.load_store()?;
    if store.overrides.is_empty() {
        println!("No overrides stored.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Key", "Category"]);
    for (key, category) in &store.overrides {
        table.add_row(vec![Cell::new(key), Cell::new(category)]);
    }
    println!("Overrides\n{table}");
    Ok(())
}

pub fn clear(ws: &Workspace) -> Result<()> {
    let removed = ws.update_store(|store| Ok(store.clear_overrides()))?;
    println!("Removed {removed} overrides");
    Ok(())
}
