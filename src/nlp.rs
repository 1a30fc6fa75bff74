//! Review text processing: cleaning, polarity scoring, word and phrase frequencies.

use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use stop_words::{get, LANGUAGE};
use tracing::{error, info};
use unicode_normalization::UnicodeNormalization;

use crate::error::{InsightsError, Result};
use crate::models::RecipeInteraction;
use crate::table::{Table, Value};
use crate::utils::{mean, FrequencyCounter};

/// Words that carry no signal in recipe reviews, on top of the English list
pub const CUSTOM_STOP_WORDS: [&str; 11] = [
    "recipe", "used", "thanks", "make", "just", "really", "didn", "bit", "great", "good", "added",
];

/// Contexts containing any of these are ignored by the phrase analysis
const EXCLUDED_CONTEXTS: [&str; 3] = ["ill", "im going", "think time"];

/// Turns text into a polarity in [-1, 1]
pub trait SentimentScorer {
    /// Polarity of `text`; 0.0 is neutral
    fn polarity(&self, text: &str) -> f64;
}

const POSITIVE_WORDS: &[(&str, f64)] = &[
    ("good", 1.0),
    ("great", 1.5),
    ("excellent", 2.0),
    ("amazing", 2.0),
    ("wonderful", 1.8),
    ("fantastic", 1.8),
    ("happy", 1.2),
    ("love", 2.0),
    ("loved", 2.0),
    ("loves", 1.8),
    ("like", 1.0),
    ("liked", 1.0),
    ("best", 1.5),
    ("better", 1.2),
    ("awesome", 1.8),
    ("perfect", 2.0),
    ("perfectly", 1.8),
    ("brilliant", 1.8),
    ("outstanding", 1.8),
    ("superb", 1.8),
    ("delightful", 1.5),
    ("pleased", 1.2),
    ("satisfied", 1.0),
    ("delicious", 2.0),
    ("yummy", 1.8),
    ("tasty", 1.5),
    ("flavorful", 1.5),
    ("moist", 1.0),
    ("tender", 1.0),
    ("enjoyed", 1.5),
    ("favorite", 1.8),
    ("nice", 1.0),
    ("easy", 0.8),
    ("fresh", 0.8),
    ("wow", 1.5),
];

const NEGATIVE_WORDS: &[(&str, f64)] = &[
    ("bad", -1.0),
    ("terrible", -2.0),
    ("awful", -2.0),
    ("horrible", -2.0),
    ("worst", -2.0),
    ("hate", -2.0),
    ("dislike", -1.0),
    ("poor", -1.2),
    ("disappointing", -1.5),
    ("disappointed", -1.5),
    ("sad", -1.2),
    ("upset", -1.2),
    ("frustrated", -1.5),
    ("disgusting", -1.8),
    ("inedible", -2.0),
    ("bland", -1.5),
    ("tasteless", -1.8),
    ("dry", -1.0),
    ("burnt", -1.5),
    ("burned", -1.5),
    ("soggy", -1.2),
    ("mushy", -1.0),
    ("greasy", -1.0),
    ("overcooked", -1.2),
    ("salty", -0.8),
    ("bitter", -1.0),
    ("weird", -1.0),
    ("useless", -1.5),
    ("wrong", -1.0),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.5),
    ("extremely", 2.0),
    ("incredibly", 2.0),
    ("absolutely", 2.0),
    ("completely", 1.8),
    ("totally", 1.8),
    ("really", 1.3),
    ("so", 1.2),
    ("quite", 1.2),
    ("rather", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.7),
    ("barely", 0.5),
    ("hardly", 0.5),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "nowhere", "neither", "nor", "didnt",
    "dont", "wasnt", "isnt",
];

/// Largest absolute word weight; scores are divided by it before clamping
const MAX_WEIGHT: f64 = 2.0;

/// Weighted word-list scorer with intensifiers and negation lookback
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconScorer;

impl LexiconScorer {
    fn weight(word: &str) -> Option<f64> {
        POSITIVE_WORDS
            .iter()
            .chain(NEGATIVE_WORDS)
            .find(|(w, _)| *w == word)
            .map(|(_, weight)| *weight)
    }
}

impl SentimentScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        let mut total = 0.0;
        let mut scored = 0_usize;

        for (i, word) in words.iter().enumerate() {
            let Some(mut sentiment) = Self::weight(word) else {
                continue;
            };

            if i > 0 {
                if let Some((_, intensity)) = INTENSIFIERS.iter().find(|(w, _)| *w == words[i - 1]) {
                    sentiment *= intensity;
                }
            }

            // negation within the two previous words flips and damps
            let negated = words[i.saturating_sub(2)..i]
                .iter()
                .any(|w| NEGATIONS.contains(&w.as_str()));
            if negated {
                sentiment = -sentiment * 0.8;
            }

            total += sentiment;
            scored += 1;
        }

        if scored == 0 {
            0.0
        } else {
            (total / scored as f64 / MAX_WEIGHT).clamp(-1.0, 1.0)
        }
    }
}

/// Processor for review text
pub struct CommentAnalyzer {
    special_chars_regex: Regex,
    extra_spaces_regex: Regex,
    token_regex: Regex,
    stopwords: HashSet<String>,
}

impl CommentAnalyzer {
    /// Compile the cleaning patterns and load the stopword list
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| InsightsError::Other(format!("Failed to compile regex {pattern}: {e}")))
        };

        let stopwords: HashSet<String> = get(LANGUAGE::English)
            .iter()
            .map(ToString::to_string)
            .chain(CUSTOM_STOP_WORDS.iter().map(ToString::to_string))
            .collect();

        Ok(Self {
            special_chars_regex: compile(r"[^\w\s]")?,
            extra_spaces_regex: compile(r"\s+")?,
            token_regex: compile(r"\b\w\w+\b")?,
            stopwords,
        })
    }

    /// Normalize, lowercase, strip punctuation and collapse whitespace
    #[must_use]
    pub fn clean_text(&self, text: &str) -> String {
        let normalized = text.nfc().collect::<String>().to_lowercase();
        let no_special = self.special_chars_regex.replace_all(&normalized, "");
        self.extra_spaces_regex
            .replace_all(&no_special, " ")
            .trim()
            .to_string()
    }

    /// Cleaned review of every row; absent reviews become empty strings
    #[must_use]
    pub fn clean_reviews(&self, rows: &[RecipeInteraction]) -> Vec<String> {
        let cleaned: Vec<String> = rows
            .iter()
            .map(|r| r.review.as_deref().map_or_else(String::new, |t| self.clean_text(t)))
            .collect();
        info!("Cleaned {} comments", cleaned.len());
        cleaned
    }

    /// Whether `word` is ignored by the frequency tables
    #[must_use]
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Tokens of two or more word characters, stopwords removed
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.token_regex
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|t| !self.is_stopword(t))
            .collect()
    }

    /// Most frequent non-stopword tokens across `cleaned` reviews.
    ///
    /// Columns `word`, `frequency`; ordered by frequency then word.
    #[must_use]
    pub fn word_frequencies(&self, cleaned: &[String], limit: usize) -> Table {
        let mut counter = FrequencyCounter::new();
        for text in cleaned {
            for token in self.tokenize(text) {
                counter.add(&token);
            }
        }

        let rows = top_alphabetical(&counter, limit)
            .into_iter()
            .map(|(word, count)| vec![Value::from(word), Value::from(count_value(count))])
            .collect();
        Table::from_rows(&["word", "frequency"], rows).unwrap_or_default()
    }

    /// Three- and four-word phrases found near the word "time".
    ///
    /// Columns `phrase`, `frequency`.
    #[must_use]
    pub fn word_frequencies_time(&self, cleaned: &[String], limit: usize) -> Table {
        let contexts: Vec<String> = cleaned
            .iter()
            .filter_map(|text| extract_context(text, "time", 4))
            .filter(|context| !EXCLUDED_CONTEXTS.iter().any(|ex| context.contains(ex)))
            .collect();
        info!("Found {} contexts around 'time'", contexts.len());

        let mut counter = FrequencyCounter::new();
        for context in &contexts {
            let tokens = self.tokenize(context);
            for n in 3..=4 {
                for gram in tokens.windows(n) {
                    counter.add(&gram.join(" "));
                }
            }
        }

        let rows = top_alphabetical(&counter, limit)
            .into_iter()
            .map(|(phrase, count)| vec![Value::from(phrase), Value::from(count_value(count))])
            .collect();
        Table::from_rows(&["phrase", "frequency"], rows).unwrap_or_default()
    }

    /// Mean review polarity per interaction year inside `[first, last]`.
    ///
    /// Columns `Year`, `Average Sentiment`. Empty when no row has a date.
    pub fn sentiment_by_year(
        &self,
        rows: &[RecipeInteraction],
        scorer: &dyn SentimentScorer,
        (first, last): (i32, i32),
    ) -> Table {
        let names = ["Year", "Average Sentiment"];
        if rows.iter().all(|r| r.date.is_none()) {
            error!("No interaction dates available for sentiment analysis");
            return Table::from_rows(&names, Vec::new()).unwrap_or_default();
        }

        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for row in rows {
            let Some(year) = row.interaction_year() else {
                continue;
            };
            if !(first..=last).contains(&year) {
                continue;
            }
            let cleaned = row.review.as_deref().map_or_else(String::new, |t| self.clean_text(t));
            by_year.entry(year).or_default().push(scorer.polarity(&cleaned));
        }

        let table_rows = by_year
            .into_iter()
            .filter_map(|(year, scores)| mean(&scores).map(|m| vec![Value::from(year), Value::from(m)]))
            .collect();
        info!("Sentiment analysis over time ({}-{}) completed", first, last);
        Table::from_rows(&names, table_rows).unwrap_or_default()
    }
}

/// `window` words either side of the first `target` token
#[must_use]
pub fn extract_context(text: &str, target: &str, window: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let index = words.iter().position(|w| *w == target)?;
    let start = index.saturating_sub(window);
    let end = (index + window + 1).min(words.len());
    Some(words[start..end].join(" "))
}

/// Top `limit` entries by count, ties in alphabetical order
fn top_alphabetical(counter: &FrequencyCounter, limit: usize) -> Vec<(String, u64)> {
    let mut entries = counter.most_common(counter.len());
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(limit);
    entries
}

fn count_value(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> CommentAnalyzer {
        CommentAnalyzer::new().expect("Failed to create comment analyzer")
    }

    #[test]
    fn test_clean_text() {
        let analyzer = analyzer();
        assert_eq!(analyzer.clean_text("  Too   many    spaces   "), "too many spaces");
        assert_eq!(analyzer.clean_text("Didn't LOVE it!!"), "didnt love it");
        assert_eq!(analyzer.clean_text("Crème brûlée, yes."), "crème brûlée yes");
        assert_eq!(analyzer.clean_text(""), "");
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_short_tokens() {
        let analyzer = analyzer();
        let tokens = analyzer.tokenize("this is a great recipe with x garlic");
        assert_eq!(tokens, vec!["garlic"]);
    }

    #[test]
    fn test_sentiment_scores() {
        let scorer = LexiconScorer;
        assert!(scorer.polarity("i loved this delicious soup") > 0.0);
        assert!(scorer.polarity("bland and dry") < 0.0);
        assert_eq!(scorer.polarity("the sky is blue"), 0.0);
        assert!(scorer.polarity("not good") < 0.0);

        let very = scorer.polarity("very tasty");
        let plain = scorer.polarity("tasty");
        assert!(very > plain);
        assert!((-1.0..=1.0).contains(&scorer.polarity("extremely perfect")));
    }

    #[test]
    fn test_word_frequencies_orders_by_count_then_word() {
        let analyzer = analyzer();
        let cleaned = vec![
            "garlic butter chicken".to_string(),
            "garlic butter".to_string(),
            "garlic onion".to_string(),
        ];
        let table = analyzer.word_frequencies(&cleaned, 3);
        assert_eq!(table.column_names(), vec!["word", "frequency"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get(0, "word"), Some(&Value::from("garlic")));
        assert_eq!(table.get(0, "frequency"), Some(&Value::Integer(3)));
        assert_eq!(table.get(1, "word"), Some(&Value::from("butter")));
        assert_eq!(table.get(2, "word"), Some(&Value::from("chicken")));
    }

    #[test]
    fn test_extract_context_window() {
        let text = "a b c d e time f g h i j";
        assert_eq!(extract_context(text, "time", 4).as_deref(), Some("b c d e time f g h i"));
        assert_eq!(extract_context("time only", "time", 4).as_deref(), Some("time only"));
        assert!(extract_context("no match here", "time", 4).is_none());
    }

    #[test]
    fn test_word_frequencies_time_skips_excluded_contexts() {
        let analyzer = analyzer();
        let cleaned = vec![
            "roast garlic butter chicken time".to_string(),
            "roast garlic butter chicken time".to_string(),
            "next time ill double onion".to_string(),
            "no target word here".to_string(),
        ];
        let table = analyzer.word_frequencies_time(&cleaned, 10);
        assert_eq!(table.column_names(), vec!["phrase", "frequency"]);
        assert_eq!(table.get(0, "frequency"), Some(&Value::Integer(2)));

        let phrases: Vec<String> = table
            .column("phrase")
            .map(|c| c.values.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        assert!(phrases.contains(&"roast garlic butter".to_string()));
        assert!(phrases.contains(&"roast garlic butter chicken".to_string()));
        assert!(phrases.iter().all(|p| !p.contains("onion")));
    }

    fn interaction(year: Option<i32>, review: Option<&str>) -> RecipeInteraction {
        RecipeInteraction {
            id: 1,
            name: None,
            minutes: 10,
            contributor_id: None,
            submitted: "2004-01-01".to_string(),
            tags: "[]".to_string(),
            n_steps: None,
            ingredients: "[]".to_string(),
            n_ingredients: None,
            user_id: Some(7),
            date: year.map(|y| format!("{y}-06-01")),
            rating: Some(4.0),
            review: review.map(str::to_string),
            year: 2004,
            cuisine: crate::models::Cuisine::Other,
            nutrition: crate::models::Nutrition {
                cal: 100.0,
                total_fat: 0.0,
                sugar: 0.0,
                sodium: 0.0,
                protein: 0.0,
                sat_fat: 0.0,
                carbs: 0.0,
            },
        }
    }

    #[test]
    fn test_sentiment_by_year_groups_by_interaction_date() {
        let analyzer = analyzer();
        let rows = vec![
            interaction(Some(2008), Some("Delicious!")),
            interaction(Some(2012), Some("awful")),
            interaction(Some(2008), None),
            interaction(None, Some("Delicious!")),
        ];
        let table = analyzer.sentiment_by_year(&rows, &LexiconScorer, (2002, 2010));

        assert_eq!(table.column_names(), vec!["Year", "Average Sentiment"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(0, "Year"), Some(&Value::Integer(2008)));
        let average = table.get(0, "Average Sentiment").and_then(Value::as_f64).unwrap_or_default();
        assert!((average - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_sentiment_by_year_without_dates_is_empty() {
        let analyzer = analyzer();
        let rows = vec![interaction(None, Some("Delicious!")), interaction(None, None)];
        let table = analyzer.sentiment_by_year(&rows, &LexiconScorer, (2002, 2010));

        assert_eq!(table.column_names(), vec!["Year", "Average Sentiment"]);
        assert_eq!(table.row_count(), 0);
    }
}
