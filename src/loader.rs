//! CSV loading, merge and enrichment of the raw datasets.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::cuisine::determine_cuisine;
use crate::error::{InsightsError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{Interaction, Nutrition, Recipe, RecipeInteraction};
use crate::utils::year_prefix;

/// Columns the recipes file must provide
pub const RECIPE_COLUMNS: &[&str] = &[
    "name",
    "id",
    "minutes",
    "contributor_id",
    "submitted",
    "tags",
    "nutrition",
    "n_steps",
    "ingredients",
    "n_ingredients",
];

/// Columns the interactions file must provide; `recipe_id|id` accepts either name
pub const INTERACTION_COLUMNS: &[&str] = &["user_id", "recipe_id|id", "date", "rating", "review"];

/// Reads one CSV file of the dataset
#[derive(Debug, Clone)]
pub struct DataLoader {
    directory: PathBuf,
    filename: String,
}

impl DataLoader {
    /// Loader for `filename` inside `directory`
    pub fn new(directory: impl Into<PathBuf>, filename: &str) -> Self {
        let loader = Self {
            directory: directory.into(),
            filename: filename.to_string(),
        };
        info!("Initialized loader for file: {}", loader.path().display());
        loader
    }

    /// Full path of the file
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    /// Read every row of the file as `T`.
    ///
    /// The header must contain all of `required`. Rows that fail to
    /// deserialize are skipped and counted.
    pub fn read<T: DeserializeOwned>(&self, required: &[&str]) -> Result<(Vec<T>, usize)> {
        let path = self.path();
        info!("Attempting to read file: {}", path.display());

        let file = File::open(&path).map_err(|e| {
            error!("File not found: {}", path.display());
            e
        })?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers = reader.headers()?.clone();
        let missing = missing_columns(headers.iter(), required);
        if !missing.is_empty() {
            error!("{} is missing columns: {:?}", self.filename, missing);
            return Err(InsightsError::MissingColumns {
                file: self.filename.clone(),
                columns: missing,
            });
        }

        let mut rows = Vec::new();
        let mut skipped = 0;
        for (line, record) in reader.deserialize::<T>().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => {
                    if skipped == 0 {
                        warn!("Skipping unreadable row {} of {}: {}", line + 2, self.filename, e);
                    }
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            warn!("Skipped {} unreadable rows in {}", skipped, self.filename);
        }

        info!("Read {} rows from {}", rows.len(), self.filename);
        Ok((rows, skipped))
    }

    /// Read the file as recipes
    pub fn load_recipes(&self) -> Result<(Vec<Recipe>, usize)> {
        self.read(RECIPE_COLUMNS)
    }

    /// Read the file as interactions
    pub fn load_interactions(&self) -> Result<(Vec<Interaction>, usize)> {
        self.read(INTERACTION_COLUMNS)
    }

    /// Load both files, merge them and add the derived columns
    pub fn processed_recipe_interaction(
        &self,
        interactions: &Self,
        metrics: &MetricsCollector,
    ) -> Result<Vec<RecipeInteraction>> {
        info!("Processing recipe and interaction data");
        let (recipes, skipped_recipes) = self.load_recipes()?;
        let (reviews, skipped_reviews) = interactions.load_interactions()?;
        metrics.record_rows_loaded(&self.filename, recipes.len(), skipped_recipes);
        metrics.record_rows_loaded(&interactions.filename, reviews.len(), skipped_reviews);

        let (merged, dropped) = merge_recipe_interaction(recipes, reviews);
        metrics.record_rows_loaded("recipe_interaction", merged.len(), dropped);
        Ok(merged)
    }
}

fn missing_columns<'a>(headers: impl Iterator<Item = &'a str>, required: &[&str]) -> Vec<String> {
    let present: Vec<&str> = headers.map(str::trim).collect();
    required
        .iter()
        .filter(|spec| !spec.split('|').any(|name| present.contains(&name)))
        .map(|spec| spec.split('|').next().unwrap_or(spec).to_string())
        .collect()
}

/// Left-join interactions onto recipes by id and enrich every row.
///
/// Recipes nobody reviewed yield one row with empty interaction fields.
/// Recipes whose year or nutrition cannot be read are dropped; the number of
/// dropped recipes is returned alongside the rows.
pub fn merge_recipe_interaction(
    recipes: Vec<Recipe>,
    interactions: Vec<Interaction>,
) -> (Vec<RecipeInteraction>, usize) {
    info!("Merging {} recipes with {} interactions", recipes.len(), interactions.len());

    let mut by_recipe: HashMap<i64, Vec<Interaction>> = HashMap::new();
    for interaction in interactions {
        by_recipe.entry(interaction.id).or_default().push(interaction);
    }

    let mut merged = Vec::with_capacity(recipes.len());
    let mut dropped = 0;

    for recipe in recipes {
        let Some(year) = year_prefix(&recipe.submitted) else {
            dropped += 1;
            continue;
        };
        let nutrition = match recipe.nutrition.as_deref().map(Nutrition::parse) {
            Some(Ok(n)) => n,
            _ => {
                dropped += 1;
                continue;
            }
        };

        let tags = recipe.tags.unwrap_or_default();
        let base = RecipeInteraction {
            id: recipe.id,
            name: recipe.name,
            minutes: recipe.minutes,
            contributor_id: recipe.contributor_id,
            submitted: recipe.submitted,
            cuisine: determine_cuisine(&tags),
            tags,
            n_steps: recipe.n_steps,
            ingredients: recipe.ingredients.unwrap_or_default(),
            n_ingredients: recipe.n_ingredients,
            user_id: None,
            date: None,
            rating: None,
            review: None,
            year,
            nutrition,
        };

        match by_recipe.remove(&base.id) {
            Some(reviews) => merged.extend(reviews.into_iter().map(|r| RecipeInteraction {
                user_id: Some(r.user_id),
                date: Some(r.date),
                rating: r.rating,
                review: r.review,
                ..base.clone()
            })),
            None => merged.push(base),
        }
    }

    if dropped > 0 {
        warn!("Dropped {} recipes with unreadable year or nutrition", dropped);
    }
    info!("Merged table has {} rows", merged.len());
    (merged, dropped)
}

/// Whether both input files exist
pub fn inputs_present(recipes: &Path, interactions: &Path) -> bool {
    recipes.is_file() && interactions.is_file()
}
