//! Identity keys for manual category overrides.
//!
//! Two schemes coexist. New overrides are always written under
//! [`override_key`], which hashes the full description. Documents written
//! before that scheme existed use [`legacy_override_key`], built from a
//! 30-character description prefix, so lookups try the current key first and
//! then fall back to the legacy one.

use chrono::NaiveDate;
use indexmap::IndexMap;

const LEGACY_DESCRIPTION_CHARS: usize = 30;
const HASH_HEX_CHARS: usize = 12;

fn date_segment(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn amount_segment(amount: Option<f64>) -> String {
    format!("{:.2}", amount.unwrap_or(0.0))
}

/// `{date}_{first 12 hex chars of md5(description)}_{amount:.2}`.
pub fn override_key(date: Option<NaiveDate>, description: Option<&str>, amount: Option<f64>) -> String {
    let digest = format!("{:x}", md5::compute(description.unwrap_or("").as_bytes()));
    format!(
        "{}_{}_{}",
        date_segment(date),
        &digest[..HASH_HEX_CHARS],
        amount_segment(amount)
    )
}

/// `{date}_{first 30 chars of description, '/' -> '-'}_{amount:.2}`.
///
/// Descriptions sharing a 30-character prefix collide under this key. It is
/// only read, never written.
pub fn legacy_override_key(
    date: Option<NaiveDate>,
    description: Option<&str>,
    amount: Option<f64>,
) -> String {
    let prefix: String = description
        .unwrap_or("")
        .chars()
        .take(LEGACY_DESCRIPTION_CHARS)
        .collect::<String>()
        .replace('/', "-");
    format!("{}_{}_{}", date_segment(date), prefix, amount_segment(amount))
}

/// Find the manual category for a transaction: current key first, then the
/// legacy key. A miss in both is not an error.
pub fn resolve_override<'a>(
    overrides: &'a IndexMap<String, String>,
    current_key: &str,
    legacy_key: &str,
) -> Option<&'a str> {
    overrides
        .get(current_key)
        .or_else(|| overrides.get(legacy_key))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan15() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 15)
    }

    #[test]
    fn test_key_format() {
        let key = override_key(jan15(), Some("REWE SAGT DANKE"), Some(-45.99));
        assert!(key.starts_with("2024-01-15_"));
        assert!(key.ends_with("_-45.99"));
        let parts: Vec<&str> = key.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 12);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_uses_md5_prefix() {
        // md5("abc") = 900150983cd24fb0d6963f7d28e17f72
        assert_eq!(
            override_key(jan15(), Some("abc"), Some(100.0)),
            "2024-01-15_900150983cd2_100.00"
        );
    }

    #[test]
    fn test_key_is_deterministic() {
        let a = override_key(jan15(), Some("Test Description"), Some(100.0));
        let b = override_key(jan15(), Some("Test Description"), Some(100.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_values_fall_back() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(override_key(None, None, None), "unknown_d41d8cd98f00_0.00");
        assert_eq!(legacy_override_key(None, None, None), "unknown__0.00");
    }

    #[test]
    fn test_long_prefix_collides_only_in_legacy_form() {
        let shared = "A".repeat(30);
        let d1 = format!("{shared} first merchant");
        let d2 = format!("{shared} second merchant");
        assert_eq!(
            legacy_override_key(jan15(), Some(&d1), Some(-10.0)),
            legacy_override_key(jan15(), Some(&d2), Some(-10.0))
        );
        assert_ne!(
            override_key(jan15(), Some(&d1), Some(-10.0)),
            override_key(jan15(), Some(&d2), Some(-10.0))
        );
    }

    #[test]
    fn test_legacy_key_truncates_and_replaces_slashes() {
        let key = legacy_override_key(
            jan15(),
            Some("PAYPAL/EUROPE S.A.R.L. ET CIE S.C.A. 1234567890"),
            Some(-12.5),
        );
        assert_eq!(key, "2024-01-15_PAYPAL-EUROPE S.A.R.L. ET CIE _-12.50");
    }

    #[test]
    fn test_legacy_key_counts_characters_not_bytes() {
        let desc = "Ä".repeat(40);
        let key = legacy_override_key(jan15(), Some(&desc), Some(1.0));
        assert_eq!(key, format!("2024-01-15_{}_1.00", "Ä".repeat(30)));
    }

    #[test]
    fn test_amount_is_rounded_to_cents() {
        let key = override_key(jan15(), Some("x"), Some(-45.999));
        assert!(key.ends_with("_-46.00"));
    }

    #[test]
    fn test_resolve_prefers_current_key() {
        let mut overrides = IndexMap::new();
        overrides.insert("legacy".to_string(), "Old".to_string());
        overrides.insert("current".to_string(), "New".to_string());
        assert_eq!(resolve_override(&overrides, "current", "legacy"), Some("New"));
        assert_eq!(resolve_override(&overrides, "missing", "legacy"), Some("Old"));
        assert_eq!(resolve_override(&overrides, "missing", "gone"), None);
    }
}
