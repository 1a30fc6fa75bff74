//! Utility functions shared by the loaders and analyzers.
//!
//! This module provides parsing of serialized list fields, descriptive
//! statistics, and an insertion-ordered frequency counter.

use std::collections::HashMap;

use crate::error::{InsightsError, Result};

/// Parse a serialized list literal such as `['30-minutes-or-less', "mom's"]`.
///
/// Items may be single- or double-quoted; backslash escapes inside an item are
/// honoured. Anything else (unquoted items, missing brackets, unterminated
/// strings) is rejected.
pub fn parse_list_literal(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| InsightsError::MalformedList(truncate_for_log(raw)))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    let mut expect_item = true;

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            ',' if !expect_item => expect_item = true,
            '\'' | '"' if expect_item => {
                let quote = c;
                let mut item = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => item.push('\n'),
                            Some('t') => item.push('\t'),
                            Some(other) => item.push(other),
                            None => break,
                        },
                        ch if ch == quote => {
                            closed = true;
                            break;
                        }
                        ch => item.push(ch),
                    }
                }
                if !closed {
                    return Err(InsightsError::MalformedList(truncate_for_log(raw)));
                }
                items.push(item);
                expect_item = false;
            }
            _ => return Err(InsightsError::MalformedList(truncate_for_log(raw))),
        }
    }

    Ok(items)
}

fn truncate_for_log(raw: &str) -> String {
    raw.chars().take(80).collect()
}

/// Year encoded in the first four characters of a `YYYY-MM-DD` date
#[must_use]
pub fn year_prefix(date: &str) -> Option<i32> {
    date.get(..4).and_then(|y| y.parse().ok())
}

/// Quantile with linear interpolation between closest ranks.
///
/// NaN values are ignored; `None` when no values remain.
#[must_use]
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Median of the non-NaN values
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Arithmetic mean of the non-NaN values
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Counts occurrences and reports the most common items.
///
/// Ties are broken by first appearance, so results are deterministic for a
/// given input order.
#[derive(Debug, Default, Clone)]
pub struct FrequencyCounter {
    counts: HashMap<String, (u64, usize)>,
}

impl FrequencyCounter {
    /// Create an empty counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `item`
    pub fn add(&mut self, item: &str) {
        let next_index = self.counts.len();
        self.counts
            .entry(item.to_string())
            .or_insert((0, next_index))
            .0 += 1;
    }

    /// Count one occurrence of every item
    pub fn extend<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) {
        for item in items {
            self.add(item);
        }
    }

    /// Occurrences of `item`
    #[must_use]
    pub fn count(&self, item: &str) -> u64 {
        self.counts.get(item).map_or(0, |(count, _)| *count)
    }

    /// Number of distinct items
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True when nothing has been counted
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent items, highest count first
    #[must_use]
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(&String, &(u64, usize))> = self.counts.iter().collect();
        entries.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        entries
            .into_iter()
            .take(n)
            .map(|(item, (count, _))| (item.clone(), *count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_literal() {
        let tags = parse_list_literal("['30-minutes-or-less', 'main-dish']").expect("parses");
        assert_eq!(tags, vec!["30-minutes-or-less", "main-dish"]);

        let mixed = parse_list_literal(r#"["mom's pie", 'salt', 'a\'b']"#).expect("parses");
        assert_eq!(mixed, vec!["mom's pie", "salt", "a'b"]);

        assert!(parse_list_literal("[]").expect("parses").is_empty());
    }

    #[test]
    fn test_parse_list_literal_rejects_malformed() {
        assert!(parse_list_literal("not a list").is_err());
        assert!(parse_list_literal("['unterminated]").is_err());
        assert!(parse_list_literal("[1, 2]").is_err());
        assert!(parse_list_literal("['a' 'b']").is_err());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.75), Some(3.25));
        assert_eq!(median(&values), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[f64::NAN, 7.0]), Some(7.0));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_year_prefix() {
        assert_eq!(year_prefix("2005-03-14"), Some(2005));
        assert_eq!(year_prefix("05"), None);
        assert_eq!(year_prefix("abcd-01-01"), None);
    }

    #[test]
    fn test_frequency_counter_ties_keep_first_seen_order() {
        let mut counter = FrequencyCounter::new();
        counter.extend(["b", "a", "c", "a", "c"]);
        assert_eq!(counter.count("a"), 2);
        assert_eq!(
            counter.most_common(3),
            vec![("a".to_string(), 2), ("c".to_string(), 2), ("b".to_string(), 1)]
        );
        assert_eq!(counter.most_common(1).len(), 1);
    }
}
