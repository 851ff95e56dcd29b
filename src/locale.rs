//! Converters for the German number and date formats used in bank exports.
//!
//! Both converters are total: a bad amount becomes `0.0`, a bad date becomes
//! `None`, and the caller decides what to do with the row.

use chrono::NaiveDate;

/// Parse a German-formatted amount (`-1.234,56 €` -> `-1234.56`).
pub fn parse_amount(raw: &str) -> f64 {
    let s: String = raw
        .replace('€', "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if s.is_empty() {
        return 0.0;
    }
    s.parse().unwrap_or(0.0)
}

/// Parse `DD.MM.YY` or `DD.MM.YYYY`.
///
/// Two-digit years 00-68 land in the 2000s and 69-99 in the 1900s.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    if !parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y: i32 = match parts[2].len() {
        2 => {
            let short: i32 = parts[2].parse().ok()?;
            if short < 69 {
                2000 + short
            } else {
                1900 + short
            }
        }
        4 => parts[2].parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(y, m, d)
}
