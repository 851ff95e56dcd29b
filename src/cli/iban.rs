use comfy_table::{Cell, Table};

use crate::error::Result;

use super::Workspace;

pub fn list(ws: &Workspace) -> Result<()> {
    let store = ws.load_store()?;
    if store.iban_rules.is_empty() {
        println!("No IBAN rules defined.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["IBAN", "Category"]);
    for (iban, category) in &store.iban_rules {
        table.add_row(vec![Cell::new(iban), Cell::new(category)]);
    }
    println!("IBAN rules (checking account only)\n{table}");
    Ok(())
}

pub fn add(ws: &Workspace, iban: &str, category: &str) -> Result<()> {
    let key = ws.update_store(|store| store.set_iban_rule(iban, category))?;
    println!("Added IBAN rule: {key} \u{2192} {}", category.trim());
    Ok(())
}

pub fn delete(ws: &Workspace, iban: &str) -> Result<()> {
    ws.update_store(|store| store.delete_iban_rule(iban))?;
    println!("Deleted IBAN rule: {iban}");
    Ok(())
}
