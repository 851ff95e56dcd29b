use colored::Colorize;

use crate::error::Result;
use crate::rule_store::{default_non_spending_categories, RuleStore, DEFAULT_CC_SETTLEMENT_PATTERNS};
use crate::settings::save_settings;

use super::Workspace;

pub fn run(ws: &Workspace) -> Result<()> {
    let data_dir = ws.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    save_settings(&ws.settings)?;

    let rules_path = ws.rules_path();
    if rules_path.exists() {
        println!("Rule document already exists: {}", rules_path.display());
    } else {
        let mut store = RuleStore::default();
        store.config.non_spending_categories = Some(default_non_spending_categories());
        store.config.cc_settlement_patterns = Some(
            DEFAULT_CC_SETTLEMENT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        );
        store.save_to(&rules_path)?;
        println!("Created rule document: {}", rules_path.display());
    }

    println!("{} Data directory: {}", "Ready.".green().bold(), data_dir.display());
    println!("Drop bank exports (Girokonto / Visa CSV files) into that directory.");
    Ok(())
}
