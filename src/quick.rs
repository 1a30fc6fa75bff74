//! Quick-recipe aggregates: recipes tagged 30 minutes or less.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::models::RecipeInteraction;
use crate::table::{Table, Value};
use crate::utils::parse_list_literal;

/// Tags that make a recipe quick
pub const QUICK_TAGS: [&str; 2] = ["30-minutes-or-less", "15-minutes-or-less"];

/// Time tags counted in the proportion's denominator
pub const TIME_TAGS: [&str; 4] = [
    "30-minutes-or-less",
    "15-minutes-or-less",
    "4-hours-or-less",
    "60-minutes-or-less",
];

/// Dish categories reported for quick recipes
pub const QUICK_CATEGORIES: [&str; 7] = [
    "main-dish",
    "desserts",
    "appetizers",
    "soups-stews",
    "salads",
    "side-dishes",
    "snacks",
];

/// Whether the serialized tag list contains any of `targets`.
///
/// Unparsable tag strings never match.
#[must_use]
pub fn contains_any_tag(tags: &str, targets: &[&str]) -> bool {
    parse_list_literal(tags).is_ok_and(|list| list.iter().any(|tag| targets.contains(&tag.as_str())))
}

fn in_window(year: i32, (first, last): (i32, i32)) -> bool {
    (first..=last).contains(&year)
}

/// Percentage of time-tagged recipes that are quick, per year.
///
/// Columns `Year`, `Proportion`. A year with no time-tagged recipe reports 0.
#[must_use]
pub fn quick_recipe_proportion(rows: &[RecipeInteraction], window: (i32, i32)) -> Table {
    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for recipe in RecipeInteraction::unique_by_id(rows)
        .into_iter()
        .filter(|r| in_window(r.year, window))
    {
        let (target, relevant) = counts.entry(recipe.year).or_default();
        if contains_any_tag(&recipe.tags, &QUICK_TAGS) {
            *target += 1;
        }
        if contains_any_tag(&recipe.tags, &TIME_TAGS) {
            *relevant += 1;
        }
    }

    let table_rows = counts
        .into_iter()
        .map(|(year, (target, relevant))| {
            let proportion = if relevant == 0 {
                0.0
            } else {
                target as f64 / relevant as f64 * 100.0
            };
            vec![Value::from(year), Value::from(proportion)]
        })
        .collect::<Vec<_>>();
    info!("Quick recipe proportions calculated for {} years", table_rows.len());
    Table::from_rows(&["Year", "Proportion"], table_rows).unwrap_or_default()
}

/// Share of all rows that land on quick recipes, per year.
///
/// Only years with at least one quick row are reported.
#[must_use]
pub fn quick_recipe_interaction_rate(rows: &[RecipeInteraction], window: (i32, i32)) -> Table {
    let mut counts: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|r| in_window(r.year, window)) {
        let (quick, total) = counts.entry(row.year).or_default();
        if contains_any_tag(&row.tags, &QUICK_TAGS) {
            *quick += 1;
        }
        *total += 1;
    }

    let table_rows = counts
        .into_iter()
        .filter(|(_, (quick, _))| *quick > 0)
        .map(|(year, (quick, total))| {
            vec![
                Value::from(year),
                Value::from(quick),
                Value::from(total),
                Value::from(quick as f64 / total as f64 * 100.0),
            ]
        })
        .collect();
    Table::from_rows(
        &["year", "Quick_Tag_Interactions", "Total_Interactions", "Proportion"],
        table_rows,
    )
    .unwrap_or_default()
}

/// How many unique quick recipes fall in each dish category.
///
/// Categories are matched as substrings of the raw tag string.
#[must_use]
pub fn categories_quick_recipe(rows: &[RecipeInteraction], window: (i32, i32)) -> Table {
    let quick: Vec<&RecipeInteraction> = RecipeInteraction::unique_by_id(rows)
        .into_iter()
        .filter(|r| in_window(r.year, window) && contains_any_tag(&r.tags, &QUICK_TAGS))
        .collect();
    debug!("Number of quick recipes identified: {}", quick.len());

    let table_rows = QUICK_CATEGORIES
        .iter()
        .map(|category| {
            let count = quick.iter().filter(|r| r.tags.contains(category)).count();
            vec![Value::from(*category), Value::from(count)]
        })
        .collect();
    Table::from_rows(&["Category", "Count"], table_rows).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cuisine, Nutrition};

    fn row(id: i64, year: i32, tags: &str) -> RecipeInteraction {
        RecipeInteraction {
            id,
            name: None,
            minutes: 10,
            contributor_id: None,
            submitted: format!("{year}-06-01"),
            tags: tags.to_string(),
            n_steps: None,
            ingredients: "[]".to_string(),
            n_ingredients: None,
            user_id: None,
            date: None,
            rating: None,
            review: None,
            year,
            cuisine: Cuisine::Other,
            nutrition: Nutrition {
                cal: 1.0,
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
    fn test_contains_any_tag() {
        assert!(contains_any_tag("['30-minutes-or-less', 'main-dish']", &QUICK_TAGS));
        assert!(!contains_any_tag("['4-hours-or-less']", &QUICK_TAGS));
        assert!(!contains_any_tag("30-minutes-or-less", &QUICK_TAGS));
    }

    #[test]
    fn test_proportion_zero_without_time_tags() {
        let rows = vec![row(1, 2004, "['main-dish']"), row(2, 2011, "['30-minutes-or-less']")];
        let table = quick_recipe_proportion(&rows, (2002, 2010));
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(0, "Year"), Some(&Value::Integer(2004)));
        assert_eq!(table.get(0, "Proportion"), Some(&Value::Real(0.0)));
    }

    #[test]
    fn test_interaction_rate_counts_every_row() {
        let rows = vec![
            row(1, 2006, "['15-minutes-or-less']"),
            row(1, 2006, "['15-minutes-or-less']"),
            row(2, 2006, "['main-dish']"),
            row(3, 2007, "['main-dish']"),
        ];
        let table = quick_recipe_interaction_rate(&rows, (2002, 2010));
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(0, "Quick_Tag_Interactions"), Some(&Value::Integer(2)));
        assert_eq!(table.get(0, "Total_Interactions"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_categories_count_unique_quick_recipes() {
        let rows = vec![
            row(1, 2006, "['30-minutes-or-less', 'main-dish']"),
            row(1, 2006, "['30-minutes-or-less', 'main-dish']"),
            row(2, 2006, "['15-minutes-or-less', 'desserts', 'snacks']"),
            row(3, 2006, "['main-dish']"),
        ];
        let table = categories_quick_recipe(&rows, (2002, 2010));
        assert_eq!(table.row_count(), QUICK_CATEGORIES.len());
        assert_eq!(table.get(0, "Count"), Some(&Value::Integer(1)));
        assert_eq!(table.get(1, "Count"), Some(&Value::Integer(1)));
        assert_eq!(table.get(6, "Count"), Some(&Value::Integer(1)));
        assert_eq!(table.get(2, "Count"), Some(&Value::Integer(0)));
    }
}
