//! Data models for recipes, interactions and the merged analysis rows
//!
//! This module contains the records read from the raw CSV files, the
//! enriched row produced by the merge, and the conversions between merged
//! rows and the persisted [`Table`] form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InsightsError, Result};
use crate::schema::recipe_interaction as col;
use crate::table::{Column, Table, Value};
use crate::utils::parse_list_literal;

/// A recipe as read from `RAW_recipes.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe name
    pub name: Option<String>,
    /// Unique recipe identifier
    pub id: i64,
    /// Preparation time in minutes
    pub minutes: i64,
    /// Recipe author
    pub contributor_id: Option<i64>,
    /// Submission date (YYYY-MM-DD)
    pub submitted: String,
    /// Serialized tag list
    pub tags: Option<String>,
    /// Serialized nutrition vector
    pub nutrition: Option<String>,
    /// Number of steps
    pub n_steps: Option<i64>,
    /// Serialized ingredient list
    pub ingredients: Option<String>,
    /// Number of ingredients
    pub n_ingredients: Option<i64>,
}

/// A user interaction as read from `RAW_interactions.csv`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    /// Reviewer identifier
    pub user_id: i64,
    /// Reviewed recipe; the file calls it `recipe_id`
    #[serde(rename = "recipe_id", alias = "id")]
    pub id: i64,
    /// Interaction date (YYYY-MM-DD)
    pub date: String,
    /// Rating, nominally 0-5
    pub rating: Option<f64>,
    /// Free-text review
    pub review: Option<String>,
}

/// Nutrition vector. Calories are absolute, everything else is PDV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    /// Calories
    pub cal: f64,
    /// Total fat
    pub total_fat: f64,
    /// Sugar
    pub sugar: f64,
    /// Sodium
    pub sodium: f64,
    /// Protein
    pub protein: f64,
    /// Saturated fat
    pub sat_fat: f64,
    /// Carbohydrates
    pub carbs: f64,
}

impl Nutrition {
    /// Parse the serialized `[cal, fat, sugar, sodium, protein, sat_fat, carbs]` vector
    pub fn parse(raw: &str) -> Result<Self> {
        let values: Vec<f64> = serde_json::from_str(raw.trim())?;
        match values.as_slice() {
            &[cal, total_fat, sugar, sodium, protein, sat_fat, carbs] => Ok(Self {
                cal,
                total_fat,
                sugar,
                sodium,
                protein,
                sat_fat,
                carbs,
            }),
            other => Err(InsightsError::Other(format!(
                "nutrition vector has {} values, expected 7",
                other.len()
            ))),
        }
    }
}

/// Cuisine label derived from recipe tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cuisine {
    /// Asian
    Asian,
    /// Mexican
    Mexican,
    /// Italian
    Italian,
    /// African
    African,
    /// American
    American,
    /// French
    French,
    /// Greek
    Greek,
    /// Indian
    Indian,
    /// No keyword matched
    Other,
}

impl Cuisine {
    /// Keywords in match priority order
    pub const PRIORITY: [Self; 8] = [
        Self::Asian,
        Self::Mexican,
        Self::Italian,
        Self::African,
        Self::American,
        Self::French,
        Self::Greek,
        Self::Indian,
    ];

    /// Cuisines shown in the per-cuisine analyses
    pub const RELEVANT: [Self; 6] = [
        Self::Asian,
        Self::Mexican,
        Self::Italian,
        Self::African,
        Self::Greek,
        Self::American,
    ];

    /// Lowercase label, also the tag keyword
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asian => "asian",
            Self::Mexican => "mexican",
            Self::Italian => "italian",
            Self::African => "african",
            Self::American => "american",
            Self::French => "french",
            Self::Greek => "greek",
            Self::Indian => "indian",
            Self::Other => "other",
        }
    }

    /// Whether the cuisine takes part in the per-cuisine analyses
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        Self::RELEVANT.contains(self)
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cuisine {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::PRIORITY
            .iter()
            .chain(std::iter::once(&Self::Other))
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| InsightsError::Other(format!("unknown cuisine: {s}")))
    }
}

/// One row of the merged recipe/interaction table.
///
/// Interaction fields are `None` for recipes nobody reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeInteraction {
    /// Recipe identifier
    pub id: i64,
    /// Recipe name
    pub name: Option<String>,
    /// Preparation time in minutes
    pub minutes: i64,
    /// Recipe author
    pub contributor_id: Option<i64>,
    /// Submission date (YYYY-MM-DD)
    pub submitted: String,
    /// Serialized tag list
    pub tags: String,
    /// Number of steps
    pub n_steps: Option<i64>,
    /// Serialized ingredient list
    pub ingredients: String,
    /// Number of ingredients
    pub n_ingredients: Option<i64>,
    /// Reviewer identifier
    pub user_id: Option<i64>,
    /// Interaction date (YYYY-MM-DD)
    pub date: Option<String>,
    /// Rating
    pub rating: Option<f64>,
    /// Review text
    pub review: Option<String>,
    /// Submission year
    pub year: i32,
    /// Derived cuisine
    pub cuisine: Cuisine,
    /// Nutrition vector
    pub nutrition: Nutrition,
}

impl RecipeInteraction {
    /// Parsed tag list
    pub fn tag_list(&self) -> Result<Vec<String>> {
        parse_list_literal(&self.tags)
    }

    /// Parsed ingredient list
    pub fn ingredient_list(&self) -> Result<Vec<String>> {
        parse_list_literal(&self.ingredients)
    }

    /// Year of the interaction date, if any
    #[must_use]
    pub fn interaction_year(&self) -> Option<i32> {
        self.date.as_deref().and_then(crate::utils::year_prefix)
    }

    /// First row of every recipe id, in input order
    #[must_use]
    pub fn unique_by_id(rows: &[Self]) -> Vec<&Self> {
        let mut seen = std::collections::HashSet::new();
        rows.iter().filter(|r| seen.insert(r.id)).collect()
    }

    /// Numeric column value by persisted column name
    #[must_use]
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let n = &self.nutrition;
        match column {
            col::MINUTES => Some(self.minutes as f64),
            col::CAL => Some(n.cal),
            col::TOTAL_FAT => Some(n.total_fat),
            col::SUGAR => Some(n.sugar),
            col::SODIUM => Some(n.sodium),
            col::PROTEIN => Some(n.protein),
            col::SAT_FAT => Some(n.sat_fat),
            col::CARBS => Some(n.carbs),
            col::RATING => self.rating,
            col::N_STEPS => self.n_steps.map(|s| s as f64),
            _ => None,
        }
    }

    /// Convert merged rows to the persisted table layout
    #[must_use]
    pub fn to_table(rows: &[Self]) -> Table {
        let text = |f: fn(&Self) -> Option<String>| rows.iter().map(f).collect::<Vec<_>>();
        let int = |f: fn(&Self) -> Option<i64>| rows.iter().map(f).collect::<Vec<_>>();
        let real = |f: fn(&Self) -> Option<f64>| rows.iter().map(f).collect::<Vec<_>>();

        let columns = vec![
            Column::new(col::ID, int(|r| Some(r.id))),
            Column::new(col::NAME, text(|r| r.name.clone())),
            Column::new(col::MINUTES, int(|r| Some(r.minutes))),
            Column::new(col::CONTRIBUTOR_ID, int(|r| r.contributor_id)),
            Column::new(col::SUBMITTED, text(|r| Some(r.submitted.clone()))),
            Column::new(col::TAGS, text(|r| Some(r.tags.clone()))),
            Column::new(col::N_STEPS, int(|r| r.n_steps)),
            Column::new(col::INGREDIENTS, text(|r| Some(r.ingredients.clone()))),
            Column::new(col::N_INGREDIENTS, int(|r| r.n_ingredients)),
            Column::new(col::USER_ID, int(|r| r.user_id)),
            Column::new(col::DATE, text(|r| r.date.clone())),
            Column::new(col::RATING, real(|r| r.rating)),
            Column::new(col::REVIEW, text(|r| r.review.clone())),
            Column::new(col::YEAR, int(|r| Some(i64::from(r.year)))),
            Column::new(col::CUISINE, text(|r| Some(r.cuisine.as_str().to_string()))),
            Column::new(col::CAL, real(|r| Some(r.nutrition.cal))),
            Column::new(col::TOTAL_FAT, real(|r| Some(r.nutrition.total_fat))),
            Column::new(col::SUGAR, real(|r| Some(r.nutrition.sugar))),
            Column::new(col::SODIUM, real(|r| Some(r.nutrition.sodium))),
            Column::new(col::PROTEIN, real(|r| Some(r.nutrition.protein))),
            Column::new(col::SAT_FAT, real(|r| Some(r.nutrition.sat_fat))),
            Column::new(col::CARBS, real(|r| Some(r.nutrition.carbs))),
        ];

        // every column is built from the same slice
        Table::from_columns(columns).unwrap_or_default()
    }

    /// Rebuild merged rows from a persisted table.
    ///
    /// Recipe columns are required; interaction columns may be absent.
    pub fn from_table(table: &Table) -> Result<Vec<Self>> {
        let required = [
            col::ID,
            col::MINUTES,
            col::SUBMITTED,
            col::TAGS,
            col::INGREDIENTS,
            col::YEAR,
            col::CUISINE,
            col::CAL,
            col::TOTAL_FAT,
            col::SUGAR,
            col::SODIUM,
            col::PROTEIN,
            col::SAT_FAT,
            col::CARBS,
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|name| table.column(name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(InsightsError::MissingColumns {
                file: crate::schema::tables::RECIPE_INTERACTION.to_string(),
                columns: missing,
            });
        }

        let cell = |row: usize, name: &str| table.get(row, name).cloned().unwrap_or(Value::Null);
        let int = |row: usize, name: &str| cell(row, name).as_i64();
        let real = |row: usize, name: &str| cell(row, name).as_f64();
        let text = |row: usize, name: &str| match cell(row, name) {
            Value::Text(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        };
        let bad_row = |row: usize, name: &str| {
            InsightsError::InvalidTable(format!("row {row}: column '{name}' is missing or mistyped"))
        };

        (0..table.row_count())
            .map(|row| {
                let nutrient = |name: &str| real(row, name).ok_or_else(|| bad_row(row, name));
                let year = int(row, col::YEAR).ok_or_else(|| bad_row(row, col::YEAR))?;
                Ok(Self {
                    id: int(row, col::ID).ok_or_else(|| bad_row(row, col::ID))?,
                    name: text(row, col::NAME),
                    minutes: int(row, col::MINUTES).ok_or_else(|| bad_row(row, col::MINUTES))?,
                    contributor_id: int(row, col::CONTRIBUTOR_ID),
                    submitted: text(row, col::SUBMITTED).ok_or_else(|| bad_row(row, col::SUBMITTED))?,
                    tags: text(row, col::TAGS).unwrap_or_default(),
                    n_steps: int(row, col::N_STEPS),
                    ingredients: text(row, col::INGREDIENTS).unwrap_or_default(),
                    n_ingredients: int(row, col::N_INGREDIENTS),
                    user_id: int(row, col::USER_ID),
                    date: text(row, col::DATE),
                    rating: real(row, col::RATING),
                    review: text(row, col::REVIEW),
                    year: i32::try_from(year).map_err(|_| bad_row(row, col::YEAR))?,
                    cuisine: text(row, col::CUISINE)
                        .and_then(|c| c.parse().ok())
                        .unwrap_or(Cuisine::Other),
                    nutrition: Nutrition {
                        cal: nutrient(col::CAL)?,
                        total_fat: nutrient(col::TOTAL_FAT)?,
                        sugar: nutrient(col::SUGAR)?,
                        sodium: nutrient(col::SODIUM)?,
                        protein: nutrient(col::PROTEIN)?,
                        sat_fat: nutrient(col::SAT_FAT)?,
                        carbs: nutrient(col::CARBS)?,
                    },
                })
            })
            .collect()
    }
}

/// Output format for exported tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Aligned plain text format
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(InsightsError::InvalidConfig(format!("unknown output format: {other}"))),
        }
    }
}
