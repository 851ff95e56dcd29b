use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::override_keys::{legacy_override_key, override_key};

/// Label every transaction starts with before any rule matches.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Label forced onto credit-card bill payments in the combined view.
pub const CREDIT_CARD_CATEGORY: &str = "Credit Card";

pub const TRANSFERS_CATEGORY: &str = "Transfers";
pub const SALARY_CATEGORY: &str = "Salary";
pub const INVESTMENTS_CATEGORY: &str = "Investments";

/// Where a batch of transactions came from. The two sources carry different
/// native fields, which changes how match text and descriptions are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Checking,
    Card,
}

impl SourceKind {
    pub fn is_card(&self) -> bool {
        matches!(self, Self::Card)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Card => "card",
        }
    }
}

/// Intermediate representation of one export row after locale parsing.
///
/// Checking rows fill `payee`, `purpose` and usually `iban`; card rows fill
/// `merchant`. `date` is `None` when the upstream date could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub payee: Option<String>,
    pub purpose: Option<String>,
    pub merchant: Option<String>,
    pub iban: Option<String>,
    pub category: String,
}

impl Default for ParsedRow {
    fn default() -> Self {
        Self {
            date: None,
            amount: 0.0,
            payee: None,
            purpose: None,
            merchant: None,
            iban: None,
            category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl ParsedRow {
    pub fn checking(
        date: NaiveDate,
        amount: f64,
        payee: &str,
        purpose: &str,
        iban: Option<&str>,
    ) -> Self {
        Self {
            date: Some(date),
            amount,
            payee: Some(payee.to_string()),
            purpose: Some(purpose.to_string()),
            iban: iban.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn card(date: NaiveDate, amount: f64, merchant: &str) -> Self {
        Self {
            date: Some(date),
            amount,
            merchant: Some(merchant.to_string()),
            ..Self::default()
        }
    }

    /// Lower-cased text the keyword rules are matched against.
    pub fn match_text(&self, source: SourceKind) -> String {
        match source {
            SourceKind::Card => self.merchant.as_deref().unwrap_or("").to_lowercase(),
            SourceKind::Checking => format!(
                "{} {}",
                self.payee.as_deref().unwrap_or(""),
                self.purpose.as_deref().unwrap_or("")
            )
            .to_lowercase(),
        }
    }

    /// Human-readable description: payee plus " - purpose" for checking rows,
    /// the raw merchant string for card rows.
    pub fn description(&self, source: SourceKind) -> String {
        match source {
            SourceKind::Card => self.merchant.clone().unwrap_or_default(),
            SourceKind::Checking => {
                let payee = self.payee.as_deref().unwrap_or("").trim();
                let purpose = self.purpose.as_deref().unwrap_or("").trim();
                if purpose.is_empty() {
                    payee.to_string()
                } else {
                    format!("{payee} - {purpose}")
                }
            }
        }
    }
}

/// All rows read from one export file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    pub source: SourceKind,
    pub account: String,
    pub rows: Vec<ParsedRow>,
    /// Rows dropped upstream because their date did not parse.
    pub parse_failures: usize,
}

impl ParsedBatch {
    pub fn new(source: SourceKind, account: &str, rows: Vec<ParsedRow>) -> Self {
        Self {
            source,
            account: account.to_string(),
            rows,
            parse_failures: 0,
        }
    }
}

/// One row of the combined, presentation-ready view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedTransaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
    pub account: String,
    pub source: SourceKind,
    pub category: String,
    pub cluster_label: String,
    pub year: i32,
    pub month: u32,
    /// Whether a manual override (current or legacy key) set the category.
    pub overridden: bool,
}

impl CombinedTransaction {
    pub fn new(
        date: NaiveDate,
        amount: f64,
        description: String,
        account: &str,
        source: SourceKind,
        category: String,
    ) -> Self {
        Self {
            date,
            amount,
            cluster_label: description.clone(),
            description,
            account: account.to_string(),
            source,
            category,
            year: date.year(),
            month: date.month(),
            overridden: false,
        }
    }

    pub fn override_key(&self) -> String {
        override_key(Some(self.date), Some(&self.description), Some(self.amount))
    }

    pub fn legacy_override_key(&self) -> String {
        legacy_override_key(Some(self.date), Some(&self.description), Some(self.amount))
    }

    /// `YYYY-MM` bucket used by the monthly reports.
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}
