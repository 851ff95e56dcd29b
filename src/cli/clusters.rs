use comfy_table::{Cell, Table};

use crate::error::Result;

use super::Workspace;

pub fn list(ws: &Workspace) -> Result<()> {
    let store = ws.load_store()?;
    if store.clusters.is_empty() {
        println!("No clusters defined.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Cluster", "Patterns"]);
    for (i, (label, patterns)) in store.clusters.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(label), Cell::new(patterns.join(", "))]);
    }
    println!("Clusters (first match wins)\n{table}");
    Ok(())
}

pub fn add(ws: &Workspace, label: &str, patterns: &[String]) -> Result<()> {
    ws.update_store(|store| store.add_cluster(label, patterns))?;
    println!("Added cluster: {}", label.trim());
    Ok(())
}

pub fn patterns(ws: &Workspace, label: &str, patterns: &[String]) -> Result<()> {
    let count = ws.update_store(|store| store.set_cluster_patterns(label, patterns))?;
    println!("Set {count} patterns for {label}");
    Ok(())
}

pub fn rename(ws: &Workspace, old: &str, new: &str) -> Result<()> {
    ws.update_store(|store| store.rename_cluster(old, new))?;
    println!("Renamed cluster: {old} \u{2192} {}", new.trim());
    Ok(())
}

pub fn delete(ws: &Workspace, label: &str) -> Result<()> {
    ws.update_store(|store| store.delete_cluster(label))?;
    println!("Deleted cluster: {label}");
    Ok(())
}
