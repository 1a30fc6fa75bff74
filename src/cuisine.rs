//! Cuisine labelling and the per-cuisine aggregates.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info};

use crate::models::{Cuisine, RecipeInteraction};
use crate::schema::recipe_interaction as col;
use crate::table::{Column, Table, Value};
use crate::utils::{median, FrequencyCounter};

/// Shares at or below this are grouped under "others"
const MINOR_CUISINE_SHARE: f64 = 0.008;

/// Number of ingredients listed per cuisine
const TOP_INGREDIENTS: usize = 5;

/// Nutrition columns summarised per cuisine, in output order
const NUTRITION_COLUMNS: [&str; 8] = [
    col::SUGAR,
    col::PROTEIN,
    col::CARBS,
    col::TOTAL_FAT,
    col::SAT_FAT,
    col::SODIUM,
    col::CAL,
    col::MINUTES,
];

/// First cuisine keyword found in the raw tag string, else `Other`
#[must_use]
pub fn determine_cuisine(tags: &str) -> Cuisine {
    Cuisine::PRIORITY
        .into_iter()
        .find(|cuisine| tags.contains(cuisine.as_str()))
        .unwrap_or(Cuisine::Other)
}

/// The relevant cuisines sorted by name
fn relevant_alphabetical() -> Vec<Cuisine> {
    let mut cuisines = Cuisine::RELEVANT.to_vec();
    cuisines.sort_by_key(Cuisine::as_str);
    cuisines
}

/// Share of unique recipes per cuisine, minor cuisines grouped.
///
/// Columns `Cuisine`, `Proportion`; cuisines in order of first appearance.
#[must_use]
pub fn analyze_cuisines(rows: &[RecipeInteraction]) -> Table {
    let unique = RecipeInteraction::unique_by_id(rows);
    if unique.is_empty() {
        return Table::from_rows(&["Cuisine", "Proportion"], Vec::new()).unwrap_or_default();
    }
    let total = unique.len() as f64;

    let mut order: Vec<Cuisine> = Vec::new();
    let mut counts: HashMap<Cuisine, usize> = HashMap::new();
    for recipe in &unique {
        let count = counts.entry(recipe.cuisine).or_insert(0);
        if *count == 0 {
            order.push(recipe.cuisine);
        }
        *count += 1;
    }

    let mut shares: Vec<(String, f64)> = Vec::new();
    let mut others: Option<usize> = None;
    for cuisine in order.into_iter().filter(|c| *c != Cuisine::Other) {
        let share = counts[&cuisine] as f64 / total;
        if share <= MINOR_CUISINE_SHARE {
            let index = *others.get_or_insert_with(|| {
                shares.push(("others".to_string(), 0.0));
                shares.len() - 1
            });
            shares[index].1 += share;
        } else {
            shares.push((cuisine.as_str().to_string(), share));
        }
    }

    let rows = shares
        .into_iter()
        .map(|(label, share)| vec![Value::from(label), Value::from(share)])
        .collect();
    Table::from_rows(&["Cuisine", "Proportion"], rows).unwrap_or_default()
}

/// Percentage of each year's relevant-cuisine recipes per cuisine.
///
/// One row per year of the window, one column per relevant cuisine.
#[must_use]
pub fn cuisine_evolution(rows: &[RecipeInteraction], (first, last): (i32, i32)) -> Table {
    let mut per_year: BTreeMap<i32, HashSet<i64>> = BTreeMap::new();
    let mut per_cuisine: HashMap<(i32, Cuisine), HashSet<i64>> = HashMap::new();
    for row in rows.iter().filter(|r| r.cuisine.is_relevant()) {
        per_year.entry(row.year).or_default().insert(row.id);
        per_cuisine.entry((row.year, row.cuisine)).or_default().insert(row.id);
    }

    let cuisines = relevant_alphabetical();
    let years: Vec<i32> = (first..=last).collect();
    let mut columns = vec![Column::new("Year", years.clone())];
    for cuisine in cuisines {
        let values = years.iter().map(|year| {
            let total = per_year.get(year).map_or(0, HashSet::len);
            let count = per_cuisine.get(&(*year, cuisine)).map_or(0, HashSet::len);
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        });
        columns.push(Column::new(cuisine.as_str(), values));
    }

    Table::from_columns(columns).unwrap_or_default()
}

/// Five most common ingredients of each relevant cuisine.
///
/// Columns `cuisine`, `Top ingredient 1` .. `Top ingredient 5`.
#[must_use]
pub fn top_ingredients(rows: &[RecipeInteraction]) -> Table {
    let mut counters: BTreeMap<&'static str, FrequencyCounter> = BTreeMap::new();
    let mut unreadable = 0;
    for row in rows.iter().filter(|r| r.cuisine.is_relevant()) {
        match row.ingredient_list() {
            Ok(ingredients) => counters
                .entry(row.cuisine.as_str())
                .or_default()
                .extend(ingredients.iter().map(String::as_str)),
            Err(_) => unreadable += 1,
        }
    }
    if unreadable > 0 {
        debug!("Skipped {} rows with unreadable ingredient lists", unreadable);
    }

    let mut names = vec!["cuisine".to_string()];
    names.extend((1..=TOP_INGREDIENTS).map(|i| format!("Top ingredient {i}")));
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let table_rows = counters
        .into_iter()
        .map(|(cuisine, counter)| {
            let top = counter.most_common(TOP_INGREDIENTS);
            let mut row = vec![Value::from(cuisine)];
            row.extend((0..TOP_INGREDIENTS).map(|i| Value::from(top.get(i).map(|(name, _)| name.clone()))));
            row
        })
        .collect();
    Table::from_rows(&names, table_rows).unwrap_or_default()
}

/// Median nutrition values and preparation time per relevant cuisine
#[must_use]
pub fn cuisine_nutritions(rows: &[RecipeInteraction]) -> Table {
    let mut groups: BTreeMap<&'static str, Vec<&RecipeInteraction>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.cuisine.is_relevant()) {
        groups.entry(row.cuisine.as_str()).or_default().push(row);
    }

    let mut names = vec!["cuisine"];
    names.extend(NUTRITION_COLUMNS);

    let table_rows = groups
        .into_iter()
        .map(|(cuisine, members)| {
            let mut row = vec![Value::from(cuisine)];
            row.extend(NUTRITION_COLUMNS.iter().map(|column| {
                let values: Vec<f64> = members.iter().filter_map(|r| r.numeric(column)).collect();
                Value::from(median(&values))
            }));
            row
        })
        .collect::<Vec<_>>();
    info!("Computed nutrition medians for {} cuisines", table_rows.len());
    Table::from_rows(&names, table_rows).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrition;

    fn row(id: i64, year: i32, cuisine: Cuisine, ingredients: &str, cal: f64) -> RecipeInteraction {
        RecipeInteraction {
            id,
            name: None,
            minutes: 20,
            contributor_id: None,
            submitted: format!("{year}-01-01"),
            tags: format!("['{}']", cuisine.as_str()),
            n_steps: Some(5),
            ingredients: ingredients.to_string(),
            n_ingredients: None,
            user_id: None,
            date: None,
            rating: None,
            review: None,
            year,
            cuisine,
            nutrition: Nutrition {
                cal,
                total_fat: 1.0,
                sugar: 2.0,
                sodium: 3.0,
                protein: 4.0,
                sat_fat: 5.0,
                carbs: 6.0,
            },
        }
    }

    #[test]
    fn test_determine_cuisine_priority() {
        assert_eq!(determine_cuisine("['italian', 'asian']"), Cuisine::Asian);
        assert_eq!(determine_cuisine("['north-american', 'mexican']"), Cuisine::Mexican);
        assert_eq!(determine_cuisine("['greek']"), Cuisine::Greek);
        assert_eq!(determine_cuisine("['main-dish']"), Cuisine::Other);
        assert_eq!(determine_cuisine(""), Cuisine::Other);
    }

    #[test]
    fn test_analyze_cuisines_groups_minor_shares() {
        let mut rows: Vec<RecipeInteraction> = (0..200)
            .map(|id| row(id, 2005, Cuisine::Italian, "[]", 100.0))
            .collect();
        rows.push(row(500, 2005, Cuisine::Greek, "[]", 100.0));
        rows.push(row(501, 2005, Cuisine::Other, "[]", 100.0));

        let table = analyze_cuisines(&rows);
        assert_eq!(table.column_names(), vec!["Cuisine", "Proportion"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "Cuisine"), Some(&Value::from("italian")));
        assert_eq!(table.get(1, "Cuisine"), Some(&Value::from("others")));
    }

    #[test]
    fn test_cuisine_evolution_fills_missing_years() {
        let rows = vec![
            row(1, 2003, Cuisine::Asian, "[]", 1.0),
            row(2, 2003, Cuisine::Italian, "[]", 1.0),
            row(3, 2003, Cuisine::Italian, "[]", 1.0),
            row(4, 2003, Cuisine::Other, "[]", 1.0),
        ];
        let table = cuisine_evolution(&rows, (2002, 2004));
        assert_eq!(
            table.column_names(),
            vec!["Year", "african", "american", "asian", "greek", "italian", "mexican"]
        );
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get(0, "italian"), Some(&Value::Real(0.0)));
        let italian = table.get(1, "italian").and_then(Value::as_f64).unwrap_or_default();
        assert!((italian - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_ingredients_pads_with_nulls() {
        let rows = vec![
            row(1, 2005, Cuisine::Mexican, "['salsa', 'beans']", 1.0),
            row(2, 2005, Cuisine::Mexican, "['beans']", 1.0),
            row(3, 2005, Cuisine::Other, "['ham']", 1.0),
        ];
        let table = top_ingredients(&rows);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get(0, "Top ingredient 1"), Some(&Value::from("beans")));
        assert_eq!(table.get(0, "Top ingredient 2"), Some(&Value::from("salsa")));
        assert_eq!(table.get(0, "Top ingredient 3"), Some(&Value::Null));
    }

    #[test]
    fn test_cuisine_nutritions_medians() {
        let rows = vec![
            row(1, 2005, Cuisine::Greek, "[]", 100.0),
            row(2, 2005, Cuisine::Greek, "[]", 300.0),
            row(3, 2005, Cuisine::Asian, "[]", 50.0),
            row(4, 2005, Cuisine::French, "[]", 999.0),
        ];
        let table = cuisine_nutritions(&rows);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(0, "cuisine"), Some(&Value::from("asian")));
        assert_eq!(table.get(1, col::CAL), Some(&Value::Real(200.0)));
        assert_eq!(table.get(1, col::MINUTES), Some(&Value::Real(20.0)));
    }
}
