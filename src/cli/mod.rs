pub mod categories;
pub mod clusters;
pub mod iban;
pub mod init;
pub mod overrides;
pub mod report;
pub mod status;
pub mod transactions;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::assembler::{assemble_combined_view, CombinedView};
use crate::error::Result;
use crate::importer::load_all;
use crate::rule_store::RuleStore;
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "finboard", about = "Categorize and report on German bank exports.")]
pub struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Directory holding the bank CSV exports
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Rule document to use (default: <data-dir>/categories.json)
    #[arg(long, global = true)]
    pub rules: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Remember the data directory and create a starter rule document.
    Init,
    /// Show paths, discovered exports and rule counts.
    Status,
    /// List the combined, categorized transactions.
    Transactions {
        /// Only these years (repeatable)
        #[arg(long)]
        year: Vec<i32>,
        /// Only this account
        #[arg(long)]
        account: Option<String>,
        /// Only this category
        #[arg(long)]
        category: Option<String>,
        /// Show at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
        /// Only these years (repeatable)
        #[arg(long, global = true)]
        year: Vec<i32>,
    },
    /// Manage keyword categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage description clusters.
    Clusters {
        #[command(subcommand)]
        command: ClustersCommands,
    },
    /// Manage IBAN rules.
    Iban {
        #[command(subcommand)]
        command: IbanCommands,
    },
    /// Manage manual category overrides.
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expenses and net.
    Summary,
    /// Spend per category with monthly average.
    Categories,
    /// Income and expenses per month.
    Cashflow,
    /// Compare spend between two years.
    Compare { first: i32, second: i32 },
    /// Average month: income and expenses per category.
    Typical,
    /// Count, total and average per description cluster.
    Clusters {
        /// Only outflows of this category (e.g. top merchants, subscriptions)
        #[arg(long)]
        category: Option<String>,
        /// Show at most this many clusters
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Spending trend per category: recent vs previous three months.
    Trends {
        /// Use raw monthly values instead of a three-month rolling mean
        #[arg(long)]
        raw: bool,
        /// Only the categories with the largest spend
        #[arg(long)]
        top: Option<usize>,
        /// Also print the month-by-category spend table
        #[arg(long)]
        monthly: bool,
    },
    /// Monthly buys and sells of investments.
    Investments,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// List categories with their keywords.
    List,
    /// Add an empty category.
    Add { name: String },
    /// Replace the keywords of a category.
    Keywords {
        name: String,
        keywords: Vec<String>,
    },
    /// Rename a category, keeping its priority.
    Rename { old: String, new: String },
    /// Delete a category and its keywords.
    Delete { name: String },
}

#[derive(Subcommand)]
pub enum ClustersCommands {
    /// List clusters with their patterns.
    List,
    /// Add a cluster. Patterns use * as wildcard.
    Add {
        label: String,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Replace the patterns of a cluster.
    Patterns {
        label: String,
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Rename a cluster, keeping its priority.
    Rename { old: String, new: String },
    /// Delete a cluster.
    Delete { label: String },
}

#[derive(Subcommand)]
pub enum IbanCommands {
    /// List IBAN rules.
    List,
    /// Map a counterparty IBAN to a category.
    Add { iban: String, category: String },
    /// Remove an IBAN rule.
    Delete { iban: String },
}

#[derive(Subcommand)]
pub enum OverrideCommands {
    /// Pin a transaction (index from `transactions` or its key) to a category.
    Set { target: String, category: String },
    /// List stored overrides.
    List,
    /// Remove all overrides.
    Clear,
}

// ---------------------------------------------------------------------------
// Workspace: resolved paths shared by every command
// ---------------------------------------------------------------------------

pub struct Workspace {
    pub settings: Settings,
}

impl Workspace {
    pub fn resolve(data_dir: Option<&str>, rules: Option<&str>) -> Self {
        Self {
            settings: load_settings().with_overrides(data_dir, rules),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.settings.data_path()
    }

    pub fn rules_path(&self) -> PathBuf {
        self.settings.rules_path()
    }

    /// Strict load for commands that write the document back.
    pub fn load_store(&self) -> Result<RuleStore> {
        RuleStore::load_from(&self.rules_path())
    }

    /// Load, modify and save the rule document in one step.
    pub fn update_store<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut RuleStore) -> Result<T>,
    {
        let path = self.rules_path();
        let mut store = RuleStore::load_from(&path)?;
        let out = change(&mut store)?;
        store.save_to(&path)?;
        Ok(out)
    }

    /// Import every export and assemble the combined view.
    pub fn view(&self) -> Result<(RuleStore, CombinedView)> {
        let store = RuleStore::load_or_default(&self.rules_path());
        let view = build_view(&self.data_dir(), &store)?;
        Ok((store, view))
    }
}

pub fn build_view(data_dir: &Path, store: &RuleStore) -> Result<CombinedView> {
    let loaded = load_all(data_dir, store)?;
    let mut view = assemble_combined_view(&loaded.batches, store);
    view.skipped_files = loaded.skipped_files.len();
    Ok(view)
}
