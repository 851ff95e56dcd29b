use comfy_table::{Cell, Table};

use crate::error::Result;

use super::Workspace;

pub fn list(ws: &Workspace) -> Result<()> {
    let store = ws.load_store()?;
    if store.rules.is_empty() {
        println!("No categories defined.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Keywords"]);
    for (i, (name, keywords)) in store.rules.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(name), Cell::new(keywords.join(", "))]);
    }
    println!("Categories (first match wins)\n{table}");
    Ok(())
}

pub fn add(ws: &Workspace, name: &str) -> Result<()> {
    ws.update_store(|store| store.add_category(name))?;
    println!("Added category: {}", name.trim());
    Ok(())
}

pub fn keywords(ws: &Workspace, name: &str, keywords: &[String]) -> Result<()> {
    let count = ws.update_store(|store| store.set_keywords(name, keywords))?;
    println!("Set {count} keywords for {name}");
    Ok(())
}

pub fn rename(ws: &Workspace, old: &str, new: &str) -> Result<()> {
    ws.update_store(|store| store.rename_category(old, new))?;
    println!("Renamed category: {old} \u{2192} {}", new.trim());
    Ok(())
}

pub fn delete(ws: &Workspace, name: &str) -> Result<()> {
    ws.update_store(|store| store.delete_category(name))?;
    println!("Deleted category: {name}");
    Ok(())
}
