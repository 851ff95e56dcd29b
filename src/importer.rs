use std::path::{Path, PathBuf};

use regex::Regex;

use crate::categorizer::apply_categories;
use crate::error::{FinboardError, Result};
use crate::locale::{parse_amount, parse_date};
use crate::models::{ParsedBatch, ParsedRow, SourceKind};
use crate::rule_store::RuleStore;

pub const CARD_ACCOUNT_LABEL: &str = "Visa Credit Card";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn clean_header(field: &str) -> String {
    field
        .trim_start_matches('\u{feff}')
        .trim()
        .trim_matches('"')
        .to_string()
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    raw_field(record, idx).trim()
}

/// Cell text exactly as exported. Card merchants keep their padding since the
/// description feeds the override keys.
fn raw_field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn reader(file_path: &Path) -> Result<csv::Reader<std::io::BufReader<std::fs::File>>> {
    let file = std::fs::File::open(file_path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file)))
}

/// Column positions of one export layout, refined from its header line.
struct Layout {
    date_header: &'static str,
    date: usize,
    amount: usize,
    payee: usize,
    purpose: usize,
    iban: usize,
    merchant: usize,
}

impl Layout {
    fn for_source(source: SourceKind) -> Self {
        match source {
            SourceKind::Checking => Self {
                date_header: "Buchungsdatum",
                date: 0,
                payee: 4,
                purpose: 5,
                iban: 7,
                amount: 8,
                merchant: usize::MAX,
            },
            SourceKind::Card => Self {
                date_header: "Belegdatum",
                date: 0,
                merchant: 3,
                amount: 5,
                payee: usize::MAX,
                purpose: usize::MAX,
                iban: usize::MAX,
            },
        }
    }

    fn is_header(&self, record: &csv::StringRecord) -> bool {
        record
            .get(0)
            .map(|f| clean_header(f) == self.date_header)
            .unwrap_or(false)
    }

    fn refine(&mut self, record: &csv::StringRecord) {
        for (i, raw) in record.iter().enumerate() {
            match clean_header(raw).as_str() {
                "Zahlungsempfaenger" | "Zahlungsempfänger" | "Zahlungsempfänger*in" => self.payee = i,
                "Verwendungszweck" => self.purpose = i,
                "IBAN" => self.iban = i,
                "Beschreibung" => self.merchant = i,
                "Betrag" | "Betrag (€)" => self.amount = i,
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one bank export. Metadata lines before the header line are skipped;
/// rows whose date does not parse are dropped and counted in
/// `parse_failures`.
pub fn parse_export(file_path: &Path, source: SourceKind, account: &str) -> Result<ParsedBatch> {
    let mut rdr = reader(file_path)?;
    let mut layout = Layout::for_source(source);
    let mut found_header = false;
    let mut batch = ParsedBatch::new(source, account, Vec::new());

    for result in rdr.records() {
        let Ok(record) = result else {
            if found_header {
                batch.parse_failures += 1;
            }
            continue;
        };
        if !found_header {
            if layout.is_header(&record) {
                layout.refine(&record);
                found_header = true;
            }
            continue;
        }
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let Some(date) = parse_date(field(&record, layout.date)) else {
            batch.parse_failures += 1;
            continue;
        };
        let amount = parse_amount(field(&record, layout.amount));
        let row = match source {
            SourceKind::Checking => ParsedRow {
                date: Some(date),
                amount,
                payee: Some(field(&record, layout.payee).to_string()),
                purpose: Some(field(&record, layout.purpose).to_string()),
                iban: non_empty(field(&record, layout.iban)),
                ..ParsedRow::default()
            },
            SourceKind::Card => ParsedRow {
                date: Some(date),
                amount,
                merchant: Some(raw_field(&record, layout.merchant).to_string()),
                ..ParsedRow::default()
            },
        };
        batch.rows.push(row);
    }

    if !found_header {
        return Err(FinboardError::Other(format!(
            "No '{}' header line found in {}",
            layout.date_header,
            file_path.display()
        )));
    }

    tracing::info!(
        "Parsed {} rows from {} ({} unparseable)",
        batch.rows.len(),
        file_path.display(),
        batch.parse_failures
    );
    Ok(batch)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Source kind implied by an export's file name, if any.
pub fn detect_source(file_path: &Path) -> Option<SourceKind> {
    let name = file_path.file_name()?.to_str()?;
    let is_csv = file_path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return None;
    }
    if name.contains("Girokonto") {
        Some(SourceKind::Checking)
    } else if name.contains("Visa") {
        Some(SourceKind::Card)
    } else {
        None
    }
}

/// Account label for an export: the IBAN in a checking export's file name
/// (falling back to the file stem), or a fixed label for card exports.
pub fn account_label(file_path: &Path, source: SourceKind) -> String {
    match source {
        SourceKind::Card => CARD_ACCOUNT_LABEL.to_string(),
        SourceKind::Checking => {
            let name = file_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");
            let iban = Regex::new(r"DE\d+").ok().and_then(|re| re.find(name));
            match iban {
                Some(m) => m.as_str().to_string(),
                None => file_path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("")
                    .to_string(),
            }
        }
    }
}

/// Recognized exports in `data_dir`: checking exports first, then card
/// exports, each group sorted by path.
pub fn discover_exports(data_dir: &Path) -> Result<Vec<(PathBuf, SourceKind)>> {
    let mut found: Vec<(PathBuf, SourceKind)> = Vec::new();
    if !data_dir.is_dir() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(data_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(source) = detect_source(&path) {
            found.push((path, source));
        }
    }
    found.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    Ok(found)
}

pub struct LoadResult {
    pub batches: Vec<ParsedBatch>,
    pub parse_failures: usize,
    /// Exports that could not be read at all.
    pub skipped_files: Vec<PathBuf>,
}

/// Parse and categorize every export in `data_dir`. An export that cannot be
/// parsed is logged and skipped; the others still load.
pub fn load_all(data_dir: &Path, store: &RuleStore) -> Result<LoadResult> {
    let mut batches = Vec::new();
    let mut parse_failures = 0usize;
    let mut skipped_files = Vec::new();
    for (path, source) in discover_exports(data_dir)? {
        let account = account_label(&path, source);
        let mut batch = match parse_export(&path, source, &account) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Skipping export {}: {e}", path.display());
                skipped_files.push(path);
                continue;
            }
        };
        apply_categories(&mut batch.rows, source, store);
        parse_failures += batch.parse_failures;
        batches.push(batch);
    }
    tracing::info!(
        "Loaded {} export files from {}",
        batches.len(),
        data_dir.display()
    );
    Ok(LoadResult {
        batches,
        parse_failures,
        skipped_files,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const GIRO: &str = "\u{feff}\"Kontoauszug\";\"DE12345678901234567890\"
\"Kontostand\";\"10.234,56 EUR\"


Buchungsdatum;Wertstellung;Status;Zahlungspflichtiger;Zahlungsempfaenger;Verwendungszweck;Umsatztyp;IBAN;Betrag;Glaeubiger-ID;Mandatsreferenz;Kundenreferenz
16.01.24;16.01.24;Gebucht;;SHELL TANKSTELLE;Tanken;Lastschrift;DE222;-12,50;;;
15.01.24;15.01.24;Gebucht;;REWE SAGT DANKE;\"Einkauf; Filiale 12\";Lastschrift;DE111;-45,99;;;
kaputt;15.01.24;Gebucht;;BROKEN;;Lastschrift;;-1,00;;;
17.01.24;17.01.24;Gebucht;;ARBEITGEBER GMBH;Gehalt Januar;Gutschrift;DE89370400440532013000;2.500,00;;;
";

    const VISA: &str = "\"Kreditkarte\";\"1234********5678\"
\"Kreditrahmen\";\"5.000,00 EUR\"


Belegdatum;Wertstellung;Status;Beschreibung;Umsatztyp;Betrag;Fremdwährungsbetrag
15.01.24;17.01.24;Gebucht;SPOTIFY STOCKHOLM;Lastschrift;-9,99;
20.01.2024;22.01.24;Gebucht;NETFLIX.COM;Lastschrift;-15,99;
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_checking_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "1_Girokonto_DE123.csv", GIRO);
        let batch = parse_export(&path, SourceKind::Checking, "DE123").unwrap();
        assert_eq!(batch.rows.len(), 3);
        assert_eq!(batch.parse_failures, 1);
        let rewe = &batch.rows[1];
        assert_eq!(rewe.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(rewe.amount, -45.99);
        assert_eq!(rewe.payee.as_deref(), Some("REWE SAGT DANKE"));
        assert_eq!(rewe.purpose.as_deref(), Some("Einkauf; Filiale 12"));
        assert_eq!(rewe.iban.as_deref(), Some("DE111"));
        assert_eq!(batch.rows[2].amount, 2500.0);
    }

    #[test]
    fn test_parse_card_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "1_Visa_1234.csv", VISA);
        let batch = parse_export(&path, SourceKind::Card, CARD_ACCOUNT_LABEL).unwrap();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.parse_failures, 0);
        assert_eq!(batch.rows[0].merchant.as_deref(), Some("SPOTIFY STOCKHOLM"));
        assert_eq!(batch.rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 20));
        assert_eq!(batch.rows[1].iban, None);
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "x_Visa.csv", "a;b;c\n1;2;3\n");
        assert!(parse_export(&path, SourceKind::Card, "x").is_err());
    }

    #[test]
    fn test_detect_source_and_account() {
        let giro = Path::new("1234567890_Girokonto_DE12345678901234567890.csv");
        assert_eq!(detect_source(giro), Some(SourceKind::Checking));
        assert_eq!(account_label(giro, SourceKind::Checking), "DE12345678901234567890");
        let plain = Path::new("Girokonto_privat.csv");
        assert_eq!(account_label(plain, SourceKind::Checking), "Girokonto_privat");
        let visa = Path::new("1234567890_Visa_1234.CSV");
        assert_eq!(detect_source(visa), Some(SourceKind::Card));
        assert_eq!(account_label(visa, SourceKind::Card), CARD_ACCOUNT_LABEL);
        assert_eq!(detect_source(Path::new("notes.txt")), None);
        assert_eq!(detect_source(Path::new("Visa.xlsx")), None);
    }

    #[test]
    fn test_load_all_categorizes_batches() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_Visa_1234.csv", VISA);
        write(dir.path(), "1_Girokonto_DE123.csv", GIRO);
        write(dir.path(), "readme.md", "ignored");
        let store: RuleStore = serde_json::from_str(
            r#"{"rules": {"Groceries": ["rewe"], "Subscriptions": ["spotify"]},
                "iban_rules": {"DE89370400440532013000": "Salary"}}"#,
        )
        .unwrap();
        let result = load_all(dir.path(), &store).unwrap();
        assert_eq!(result.batches.len(), 2);
        assert_eq!(result.parse_failures, 1);
        assert_eq!(result.batches[0].source, SourceKind::Checking);
        assert_eq!(result.batches[0].account, "DE123");
        let cats: Vec<&str> = result.batches[0]
            .rows
            .iter()
            .map(|r| r.category.as_str())
            .collect();
        assert_eq!(cats, vec!["Other", "Groceries", "Salary"]);
        assert_eq!(result.batches[1].rows[0].category, "Subscriptions");
    }

    #[test]
    fn test_load_all_skips_unreadable_export() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1_Visa_1234.csv", VISA);
        let empty = write(dir.path(), "2_Visa_empty.csv", "");
        let result = load_all(dir.path(), &RuleStore::default()).unwrap();
        assert_eq!(result.batches.len(), 1);
        assert_eq!(result.batches[0].rows.len(), 2);
        assert_eq!(result.skipped_files, vec![empty]);
    }

    #[test]
    fn test_card_merchant_keeps_padding() {
        let dir = tempfile::tempdir().unwrap();
        let padded = VISA.replace("SPOTIFY STOCKHOLM", "  SPOTIFY  ");
        let path = write(dir.path(), "1_Visa_1234.csv", &padded);
        let batch = parse_export(&path, SourceKind::Card, CARD_ACCOUNT_LABEL).unwrap();
        let row = &batch.rows[0];
        assert_eq!(row.merchant.as_deref(), Some("  SPOTIFY  "));

        let description = row.description(SourceKind::Card);
        assert_eq!(description, "  SPOTIFY  ");
        assert_eq!(
            crate::override_keys::override_key(row.date, Some(&description), Some(row.amount)),
            format!("2024-01-15_{}_-9.99", &format!("{:x}", md5::compute("  SPOTIFY  "))[..12])
        );
        assert_eq!(
            crate::override_keys::legacy_override_key(row.date, Some(&description), Some(row.amount)),
            "2024-01-15_  SPOTIFY  _-9.99"
        );
    }

    #[test]
    fn test_load_all_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_all(&dir.path().join("missing"), &RuleStore::default()).unwrap();
        assert!(result.batches.is_empty());
        assert_eq!(result.parse_failures, 0);
    }
}
