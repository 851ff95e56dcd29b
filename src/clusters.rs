//! Grouping of raw merchant descriptions under user-defined cluster labels.
//!
//! Patterns are literal text where `*` stands for any run of characters.
//! A pattern matches anywhere inside a description, case-insensitively.

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};

pub struct ClusterMatcher {
    rules: Vec<(String, Vec<Regex>)>,
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    match RegexBuilder::new(&escaped).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Skipping cluster pattern '{pattern}': {e}");
            None
        }
    }
}

impl ClusterMatcher {
    /// Compile cluster rules in declaration order. Blank labels and blank
    /// patterns are skipped; a cluster left without patterns is dropped.
    pub fn compile(clusters: &IndexMap<String, Vec<String>>) -> Self {
        let mut rules = Vec::new();
        for (label, patterns) in clusters {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            let compiled: Vec<Regex> = patterns
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .filter_map(compile_pattern)
                .collect();
            if !compiled.is_empty() {
                rules.push((label.to_string(), compiled));
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Label of the first cluster with a matching pattern, or the description
    /// itself when nothing matches.
    pub fn label(&self, description: Option<&str>) -> String {
        let text = description.unwrap_or("");
        self.rules
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
            .map(|(label, _)| label.clone())
            .unwrap_or_else(|| text.to_string())
    }
}

/// Cluster labels aligned by position with `descriptions`.
pub fn cluster<S: AsRef<str>>(
    descriptions: &[S],
    clusters: &IndexMap<String, Vec<String>>,
) -> Vec<String> {
    let matcher = ClusterMatcher::compile(clusters);
    descriptions
        .iter()
        .map(|d| matcher.label(Some(d.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(label, patterns)| {
                (
                    label.to_string(),
                    patterns.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_wildcard_matches_case_insensitively() {
        let r = rules(&[("Spotify", &["*spotify*"]), ("Netflix", &["Netflix*"])]);
        let labels = cluster(&["SPOTIFY STOCKHOLM", "SPOTIFY AB", "NETFLIX.COM"], &r);
        assert_eq!(labels, vec!["Spotify", "Spotify", "Netflix"]);
    }

    #[test]
    fn test_patterns_are_not_anchored() {
        let r = rules(&[("Netflix", &["Netflix*"])]);
        assert_eq!(cluster(&["MY NETFLIX FRIEND"], &r), vec!["Netflix"]);
    }

    #[test]
    fn test_inner_wildcard() {
        let r = rules(&[("ChatGPT", &["OPENAI *CHATGPT SUBSCR"])]);
        let labels = cluster(&["OPENAI *CHATGPT SUBSCR", "openai xyz chatgpt subscr 123", "OPENAI API"], &r);
        assert_eq!(labels, vec!["ChatGPT", "ChatGPT", "OPENAI API"]);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let r = rules(&[("Amazon", &["AMZN.DE (mktp)"])]);
        let labels = cluster(&["AMZN.DE (MKTP) 123", "AMZNXDE MKTP"], &r);
        assert_eq!(labels, vec!["Amazon", "AMZNXDE MKTP"]);
    }

    #[test]
    fn test_first_cluster_wins() {
        let r = rules(&[("First", &["shop"]), ("Second", &["shop*"])]);
        assert_eq!(cluster(&["SHOP 1"], &r), vec!["First"]);
    }

    #[test]
    fn test_no_match_returns_description() {
        let r = rules(&[("Spotify", &["spotify"])]);
        assert_eq!(cluster(&["REWE"], &r), vec!["REWE"]);
        assert_eq!(cluster(&["REWE"], &IndexMap::new()), vec!["REWE"]);
    }

    #[test]
    fn test_blank_labels_and_patterns_skipped() {
        let r = rules(&[("  ", &["rewe"]), ("Blank", &["", "   "]), (" Rewe ", &[" rewe "])]);
        let matcher = ClusterMatcher::compile(&r);
        assert_eq!(matcher.label(Some("REWE MARKT")), "Rewe");
        assert_eq!(matcher.label(None), "");
    }
}
