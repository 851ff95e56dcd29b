use crate::error::Result;
use crate::importer::discover_exports;
use crate::rule_store::RuleStore;

use super::{build_view, Workspace};

pub fn run(ws: &Workspace) -> Result<()> {
    let data_dir = ws.data_dir();
    let rules_path = ws.rules_path();

    println!("Data dir:   {}", data_dir.display());
    println!("Rules:      {}", rules_path.display());

    if !data_dir.is_dir() {
        println!();
        println!("Data directory not found. Run `finboard init` to set up.");
        return Ok(());
    }

    let exports = discover_exports(&data_dir)?;
    let store = RuleStore::load_or_default(&rules_path);
    let view = build_view(&data_dir, &store)?;

    println!();
    println!("Exports:       {}", exports.len());
    for (path, source) in &exports {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("  {:<9} {name}", source.label());
    }
    println!("Transactions:  {}", view.transactions.len());
    println!("Skipped rows:  {}", view.dropped);
    println!("Skipped files: {}", view.skipped_files);
    println!("Categories:    {}", store.rules.len());
    println!("IBAN rules:    {}", store.iban_rules.len());
    println!("Clusters:      {}", store.clusters.len());
    println!("Overrides:     {}", store.overrides.len());
    println!("Fingerprint:   {}", &store.fingerprint()[..12]);
    Ok(())
}
