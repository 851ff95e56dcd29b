pub mod assembler;
pub mod categorizer;
pub mod cli;
pub mod clusters;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod locale;
pub mod logging;
pub mod models;
pub mod override_keys;
pub mod reports;
pub mod rule_store;
pub mod settings;

pub use assembler::{assemble_combined_view, CombinedView};
pub use categorizer::categorize;
pub use clusters::cluster;
pub use error::{FinboardError, Result};
pub use override_keys::{legacy_override_key, override_key};
pub use rule_store::RuleStore;
