//! General recipe and interaction aggregates.
//!
//! Every function takes the merged rows and returns a [`Table`] with fixed
//! column names. Year-ranged aggregates take the inclusive analysis window.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::models::RecipeInteraction;
use crate::schema::recipe_interaction as col;
use crate::table::{Table, Value};
use crate::utils::{mean, quantile, FrequencyCounter};

/// Oil ingredients tracked by the oil usage analysis
pub const OIL_TYPES: [&str; 10] = [
    "olive oil",
    "vegetable oil",
    "canola oil",
    "sesame oil",
    "peanut oil",
    "cooking oil",
    "salad oil",
    "oil",
    "corn oil",
    "extra virgin olive oil",
];

/// Columns trimmed for outliers, in trimming order
pub const OUTLIER_COLUMNS: [&str; 2] = [col::MINUTES, col::CAL];

/// Tags per set in the cached top-tags table
pub const TAGS_PER_SET: usize = 10;

fn in_window(year: i32, (first, last): (i32, i32)) -> bool {
    (first..=last).contains(&year)
}

/// Closed interval `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    /// Smallest kept value
    pub lower: f64,
    /// Largest kept value
    pub upper: f64,
}

impl OutlierBounds {
    /// Bounds for `values`; `None` when there is nothing to measure
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        let q1 = quantile(values, 0.25)?;
        let q3 = quantile(values, 0.75)?;
        let iqr = q3 - q1;
        Some(Self {
            lower: 1.5f64.mul_add(-iqr, q1),
            upper: 1.5f64.mul_add(iqr, q3),
        })
    }

    /// Whether `value` lies inside the bounds, ends included
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Keep the rows whose `column` lies inside the bounds
    #[must_use]
    pub fn apply(&self, rows: Vec<RecipeInteraction>, column: &str) -> Vec<RecipeInteraction> {
        rows.into_iter()
            .filter(|r| r.numeric(column).is_some_and(|v| self.contains(v)))
            .collect()
    }
}

/// Remove `minutes` outliers, then `cal` outliers from what remains
#[must_use]
pub fn clean_from_outliers(mut rows: Vec<RecipeInteraction>) -> Vec<RecipeInteraction> {
    let before = rows.len();
    for column in OUTLIER_COLUMNS {
        let values: Vec<f64> = rows.iter().filter_map(|r| r.numeric(column)).collect();
        let Some(bounds) = OutlierBounds::compute(&values) else {
            continue;
        };
        debug!(
            "Outlier bounds for {}: [{}, {}]",
            column, bounds.lower, bounds.upper
        );
        rows = bounds.apply(rows, column);
    }
    info!("Outlier trim kept {} of {} rows", rows.len(), before);
    rows
}

/// Unique recipes per submission year. Columns `year`, `recipes`.
#[must_use]
pub fn group_recipes_year(rows: &[RecipeInteraction]) -> Table {
    let mut per_year: BTreeMap<i32, HashSet<i64>> = BTreeMap::new();
    for row in rows {
        per_year.entry(row.year).or_default().insert(row.id);
    }
    let table_rows = per_year
        .into_iter()
        .map(|(year, ids)| vec![Value::from(year), Value::from(ids.len())])
        .collect();
    Table::from_rows(&["year", "recipes"], table_rows).unwrap_or_default()
}

/// Reviews per submission year. Columns `year`, `interactions`.
#[must_use]
pub fn group_interactions_year(rows: &[RecipeInteraction]) -> Table {
    let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for row in rows {
        let count = per_year.entry(row.year).or_default();
        if row.review.as_deref().is_some_and(|r| !r.trim().is_empty()) {
            *count += 1;
        }
    }
    let table_rows = per_year
        .into_iter()
        .map(|(year, count)| vec![Value::from(year), Value::from(count)])
        .collect();
    Table::from_rows(&["year", "interactions"], table_rows).unwrap_or_default()
}

/// Tag frequencies of `year`, each recipe and each tag of a recipe counted once
#[must_use]
pub fn get_tags(rows: &[RecipeInteraction], year: i32) -> FrequencyCounter {
    let mut counter = FrequencyCounter::new();
    let mut unreadable = 0;
    for recipe in RecipeInteraction::unique_by_id(rows)
        .into_iter()
        .filter(|r| r.year == year)
    {
        match recipe.tag_list() {
            Ok(tags) => {
                let mut seen = HashSet::new();
                counter.extend(tags.iter().map(String::as_str).filter(|t| seen.insert(*t)));
            }
            Err(_) => unreadable += 1,
        }
    }
    if unreadable > 0 {
        warn!("Skipped {} recipes with unreadable tags in {}", unreadable, year);
    }
    counter
}

/// The `n` most frequent tags of `year`
#[must_use]
pub fn get_top_tags(rows: &[RecipeInteraction], year: i32, n: usize) -> Vec<(String, u64)> {
    get_tags(rows, year).most_common(n)
}

/// Top `n` tags of every year in the window, sliced into sets of ten.
///
/// Columns `set_number`, `year`, `label`, `size`.
#[must_use]
pub fn top_tags_table(rows: &[RecipeInteraction], (first, last): (i32, i32), n: usize) -> Table {
    let per_year: Vec<(i32, Vec<(String, u64)>)> = (first..=last)
        .map(|year| (year, get_top_tags(rows, year, n)))
        .collect();

    let mut table_rows = Vec::new();
    for set_number in 0..n.div_ceil(TAGS_PER_SET) {
        for (year, tags) in &per_year {
            let start = set_number * TAGS_PER_SET;
            for (label, size) in tags.iter().skip(start).take(TAGS_PER_SET) {
                table_rows.push(vec![
                    Value::from(set_number),
                    Value::from(*year),
                    Value::from(label.as_str()),
                    Value::from(i64::try_from(*size).unwrap_or(i64::MAX)),
                ]);
            }
        }
    }
    info!("Built top tags table with {} rows", table_rows.len());
    Table::from_rows(&["set_number", "year", "label", "size"], table_rows).unwrap_or_default()
}

/// Rows of the top-tags table for one year and, optionally, one set
#[must_use]
pub fn select_top_tags(table: &Table, year: i32, set_number: Option<usize>) -> Table {
    let set = set_number.map(|s| i64::try_from(s).unwrap_or(i64::MAX));
    table.filter_rows(|i| {
        let year_matches = table.get(i, "year").and_then(Value::as_i64) == Some(i64::from(year));
        let set_matches = set.map_or(true, |s| table.get(i, "set_number").and_then(Value::as_i64) == Some(s));
        year_matches && set_matches
    })
}

/// Share of each oil among the oil mentions of every year.
///
/// Long format: `Year`, `Oil Type`, `Proportion`; 0 for years without oil.
#[must_use]
pub fn analyze_oils(rows: &[RecipeInteraction], (first, last): (i32, i32)) -> Table {
    let mut counts: BTreeMap<i32, [usize; OIL_TYPES.len()]> =
        (first..=last).map(|year| (year, [0; OIL_TYPES.len()])).collect();

    for recipe in RecipeInteraction::unique_by_id(rows) {
        let Some(year_counts) = counts.get_mut(&recipe.year) else {
            continue;
        };
        let Ok(ingredients) = recipe.ingredient_list() else {
            continue;
        };
        let ingredients: HashSet<&str> = ingredients.iter().map(String::as_str).collect();
        for (slot, oil) in year_counts.iter_mut().zip(OIL_TYPES) {
            if ingredients.contains(oil) {
                *slot += 1;
            }
        }
    }

    let mut table_rows = Vec::new();
    for (i, oil) in OIL_TYPES.iter().enumerate() {
        for (year, year_counts) in &counts {
            let total: usize = year_counts.iter().sum();
            let share = if total == 0 {
                0.0
            } else {
                year_counts[i] as f64 / total as f64
            };
            table_rows.push(vec![Value::from(*year), Value::from(*oil), Value::from(share)]);
        }
    }
    Table::from_rows(&["Year", "Oil Type", "Proportion"], table_rows).unwrap_or_default()
}

/// Per recipe: `id`, `avg_rating`, `num_ratings`, `mean_minutes`
#[must_use]
pub fn ratings_per_recipe(rows: &[RecipeInteraction]) -> Table {
    let mut groups: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let (ratings, minutes) = groups.entry(row.id).or_default();
        ratings.extend(row.rating);
        minutes.push(row.minutes as f64);
    }
    let table_rows = groups
        .into_iter()
        .map(|(id, (ratings, minutes))| {
            vec![
                Value::from(id),
                Value::from(mean(&ratings)),
                Value::from(ratings.len()),
                Value::from(mean(&minutes)),
            ]
        })
        .collect();
    Table::from_rows(&["id", "avg_rating", "num_ratings", "mean_minutes"], table_rows).unwrap_or_default()
}

/// Per submission year: `year`, `avg_steps`, `avg_rating`
#[must_use]
pub fn average_steps_rating(rows: &[RecipeInteraction]) -> Table {
    let mut groups: BTreeMap<i32, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let (steps, ratings) = groups.entry(row.year).or_default();
        steps.extend(row.numeric(col::N_STEPS));
        ratings.extend(row.rating);
    }
    let table_rows = groups
        .into_iter()
        .map(|(year, (steps, ratings))| {
            vec![Value::from(year), Value::from(mean(&steps)), Value::from(mean(&ratings))]
        })
        .collect();
    Table::from_rows(&["year", "avg_steps", "avg_rating"], table_rows).unwrap_or_default()
}

/// Interactions grouped by days between submission and review.
///
/// Only positive delays are kept. Columns `days_since_submission`,
/// `num_interactions`, `avg_rating`.
#[must_use]
pub fn user_interactions(rows: &[RecipeInteraction]) -> Table {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();

    let mut groups: BTreeMap<i64, (usize, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        let (Some(submitted), Some(date)) = (parse(&row.submitted), row.date.as_deref().and_then(parse)) else {
            continue;
        };
        let days = (date - submitted).num_days();
        if days <= 0 {
            continue;
        }
        let (count, ratings) = groups.entry(days).or_default();
        *count += 1;
        ratings.extend(row.rating);
    }

    let table_rows = groups
        .into_iter()
        .map(|(days, (count, ratings))| vec![Value::from(days), Value::from(count), Value::from(mean(&ratings))])
        .collect();
    Table::from_rows(
        &["days_since_submission", "num_interactions", "avg_rating"],
        table_rows,
    )
    .unwrap_or_default()
}

/// Mean rating per interaction year. Columns `year`, `average_rating`.
#[must_use]
pub fn rating_evolution(rows: &[RecipeInteraction], window: (i32, i32)) -> Table {
    let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let Some(year) = row.interaction_year().filter(|y| in_window(*y, window)) else {
            continue;
        };
        groups.entry(year).or_default().extend(row.rating);
    }
    let table_rows = groups
        .into_iter()
        .filter_map(|(year, ratings)| mean(&ratings).map(|m| vec![Value::from(year), Value::from(m)]))
        .collect();
    info!("Rating evolution calculation for {}-{} completed", window.0, window.1);
    Table::from_rows(&["year", "average_rating"], table_rows).unwrap_or_default()
}

/// Occurrences of `word` among the cleaned reviews, per submission year.
///
/// `cleaned` is parallel to `rows`. Columns `year`, `word_count`.
#[must_use]
pub fn word_count_over_time(
    rows: &[RecipeInteraction],
    cleaned: &[String],
    word: &str,
    window: (i32, i32),
) -> Table {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for (row, text) in rows.iter().zip(cleaned) {
        if !in_window(row.year, window) {
            continue;
        }
        *counts.entry(row.year).or_default() += text.split_whitespace().filter(|w| *w == word).count();
    }
    let table_rows = counts
        .into_iter()
        .map(|(year, count)| vec![Value::from(year), Value::from(count)])
        .collect();
    Table::from_rows(&["year", "word_count"], table_rows).unwrap_or_default()
}

/// Percentage of rows per year for which `matches` holds
fn co_occurrence_by_year<'a>(
    rows: impl Iterator<Item = (&'a RecipeInteraction, bool)>,
    window: (i32, i32),
) -> Table {
    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for (row, matched) in rows {
        if !in_window(row.year, window) {
            continue;
        }
        let (hits, total) = counts.entry(row.year).or_default();
        *total += 1;
        if matched {
            *hits += 1;
        }
    }
    let table_rows = counts
        .into_iter()
        .map(|(year, (hits, total))| {
            vec![Value::from(year), Value::from(hits as f64 / total as f64 * 100.0)]
        })
        .collect();
    Table::from_rows(&["year", "Co-occurrence Percentage"], table_rows).unwrap_or_default()
}

/// Share of cleaned reviews containing every one of `words`, per year
#[must_use]
pub fn word_co_occurrence_over_time(
    rows: &[RecipeInteraction],
    cleaned: &[String],
    words: &[String],
    window: (i32, i32),
) -> Table {
    let matches = rows
        .iter()
        .zip(cleaned)
        .map(|(row, text)| (row, words.iter().all(|w| text.contains(w.as_str()))));
    co_occurrence_by_year(matches, window)
}

/// Share of rows where each of `ingredients` appears inside some ingredient name, per year
#[must_use]
pub fn ingredient_co_occurrence_over_time(
    rows: &[RecipeInteraction],
    ingredients: &[String],
    window: (i32, i32),
) -> Table {
    let wanted: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();
    let matches = rows.iter().map(|row| {
        let found = row
            .ingredient_list()
            .is_ok_and(|list| {
                wanted
                    .iter()
                    .all(|w| list.iter().any(|entry| entry.contains(w.as_str())))
            });
        (row, found)
    });
    co_occurrence_by_year(matches, window)
}
