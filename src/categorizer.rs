use crate::models::{ParsedRow, SourceKind, DEFAULT_CATEGORY};
use crate::rule_store::{normalize_iban, RuleStore};

fn lowered_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect()
}

/// Assign one category per row, aligned by position with `rows`.
///
/// Keyword rules run in declaration order and only fill rows still holding
/// [`DEFAULT_CATEGORY`], so the first declared matching category wins.
/// Keywords are plain case-insensitive substrings. IBAN rules run last, on
/// checking rows only, and overwrite whatever the keywords assigned.
pub fn categorize(rows: &[ParsedRow], source: SourceKind, store: &RuleStore) -> Vec<String> {
    let mut categories = vec![DEFAULT_CATEGORY.to_string(); rows.len()];
    if rows.is_empty() {
        return categories;
    }

    let texts: Vec<String> = rows.iter().map(|r| r.match_text(source)).collect();

    for (category, keywords) in &store.rules {
        let keywords = lowered_keywords(keywords);
        if keywords.is_empty() {
            continue;
        }
        for (assigned, text) in categories.iter_mut().zip(&texts) {
            if *assigned == DEFAULT_CATEGORY && keywords.iter().any(|k| text.contains(k.as_str())) {
                *assigned = category.clone();
            }
        }
    }

    if !source.is_card() && !store.iban_rules.is_empty() {
        let ibans: Vec<String> = rows
            .iter()
            .map(|r| normalize_iban(r.iban.as_deref().unwrap_or("")))
            .collect();
        for (iban, category) in &store.iban_rules {
            let iban = normalize_iban(iban);
            if iban.is_empty() {
                continue;
            }
            for (assigned, row_iban) in categories.iter_mut().zip(&ibans) {
                if *row_iban == iban {
                    *assigned = category.clone();
                }
            }
        }
    }

    categories
}

/// Categorize `rows` in place.
pub fn apply_categories(rows: &mut [ParsedRow], source: SourceKind, store: &RuleStore) {
    let categories = categorize(rows, source, store);
    for (row, category) in rows.iter_mut().zip(categories) {
        row.category = category;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn test_store() -> RuleStore {
        serde_json::from_str(
            r#"{
  "rules": {
    "Groceries": ["rewe", "edeka", "aldi", "lidl"],
    "Restaurants": ["restaurant", "cafe", "mcdonald"],
    "Subscriptions": ["spotify", "netflix", "chatgpt"],
    "Mobility": ["db vertrieb", "shell", "tankstelle"]
  },
  "iban_rules": {
    "DE89370400440532013000": "Salary",
    "DE91100000000123456789": "Transfers"
  }
}"#,
        )
        .unwrap()
    }

    fn checking(payee: &str, purpose: &str, iban: Option<&str>) -> ParsedRow {
        ParsedRow::checking(day(), -10.0, payee, purpose, iban)
    }

    fn card(merchant: &str) -> ParsedRow {
        ParsedRow::card(day(), -10.0, merchant)
    }

    #[test]
    fn test_keyword_match_on_checking_rows() {
        let rows = vec![
            checking("REWE SAGT DANKE", "Einkauf", Some("DE111")),
            checking("SHELL", "Tanken", Some("DE222")),
            checking("Unknown Shop", "", None),
        ];
        let cats = categorize(&rows, SourceKind::Checking, &test_store());
        assert_eq!(cats, vec!["Groceries", "Mobility", "Other"]);
    }

    #[test]
    fn test_purpose_field_is_matched() {
        let rows = vec![checking("PAYPAL", "Spotify Premium", None)];
        let cats = categorize(&rows, SourceKind::Checking, &test_store());
        assert_eq!(cats, vec!["Subscriptions"]);
    }

    #[test]
    fn test_card_rows_use_merchant() {
        let rows = vec![card("SPOTIFY STOCKHOLM"), card("NETFLIX.COM"), card("HOTEL")];
        let cats = categorize(&rows, SourceKind::Card, &test_store());
        assert_eq!(cats, vec!["Subscriptions", "Subscriptions", "Other"]);
    }

    #[test]
    fn test_first_declared_category_wins() {
        let store: RuleStore =
            serde_json::from_str(r#"{"rules": {"A": ["test"], "B": ["test keyword"]}}"#).unwrap();
        let rows = vec![card("test keyword here")];
        assert_eq!(categorize(&rows, SourceKind::Card, &store), vec!["A"]);

        let store: RuleStore =
            serde_json::from_str(r#"{"rules": {"B": ["test keyword"], "A": ["test"]}}"#).unwrap();
        assert_eq!(categorize(&rows, SourceKind::Card, &store), vec!["B"]);
    }

    #[test]
    fn test_iban_rule_overrides_keyword() {
        let rows = vec![checking("REWE", "Erstattung", Some("de89370400440532013000"))];
        let cats = categorize(&rows, SourceKind::Checking, &test_store());
        assert_eq!(cats, vec!["Salary"]);
    }

    #[test]
    fn test_iban_rules_ignored_for_card_rows() {
        let mut row = card("REWE");
        row.iban = Some("DE89370400440532013000".into());
        let cats = categorize(&[row], SourceKind::Card, &test_store());
        assert_eq!(cats, vec!["Groceries"]);
    }

    #[test]
    fn test_special_characters_are_literal() {
        let store: RuleStore = serde_json::from_str(
            r#"{"rules": {"Clothing": ["h&m"], "Books": ["c++ (primer)"], "Dots": ["a.b"]}}"#,
        )
        .unwrap();
        let rows = vec![
            card("H&M STORE"),
            card("BOOK C++ (PRIMER) 5TH"),
            card("axb"),
            card("HM STORE"),
        ];
        let cats = categorize(&rows, SourceKind::Card, &store);
        assert_eq!(cats, vec!["Clothing", "Books", "Other", "Other"]);
    }

    #[test]
    fn test_empty_keyword_lists_are_skipped() {
        let store: RuleStore =
            serde_json::from_str(r#"{"rules": {"Empty": [], "Blank": [""], "Food": ["rewe"]}}"#)
                .unwrap();
        let rows = vec![card("REWE"), card("anything")];
        let cats = categorize(&rows, SourceKind::Card, &store);
        assert_eq!(cats, vec!["Food", "Other"]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(categorize(&[], SourceKind::Checking, &test_store()).is_empty());
    }

    #[test]
    fn test_missing_fields_do_not_fail() {
        let rows = vec![ParsedRow::default()];
        assert_eq!(categorize(&rows, SourceKind::Checking, &test_store()), vec!["Other"]);
        assert_eq!(categorize(&rows, SourceKind::Card, &test_store()), vec!["Other"]);
    }

    #[test]
    fn test_apply_categories_in_place() {
        let mut rows = vec![card("LIDL"), card("?")];
        apply_categories(&mut rows, SourceKind::Card, &test_store());
        assert_eq!(rows[0].category, "Groceries");
        assert_eq!(rows[1].category, "Other");
    }
}
