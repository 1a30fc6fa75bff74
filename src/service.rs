use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::analyzer;
use crate::cache::AggregateCache;
use crate::config::AppConfig;
use crate::cuisine;
use crate::db::{SaveMode, TableStore};
use crate::error::{InsightsError, Result};
use crate::file_writer;
use crate::loader::DataLoader;
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{OutputFormat, RecipeInteraction};
use crate::nlp::{CommentAnalyzer, LexiconScorer, SentimentScorer};
use crate::quick;
use crate::schema::tables;
use crate::table::Table;

/// Every aggregate the service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    /// Oil type shares per year
    Oils,
    /// Cuisine distribution
    CuisineData,
    /// Cuisine shares per year
    CuisineEvolution,
    /// Top ingredients per cuisine
    CuisineTopIngredients,
    /// Median nutrition per cuisine
    CuisinesNutritions,
    /// Quick recipe share per year
    QuickRecipeProportion,
    /// Interactions landing on quick recipes per year
    QuickRecipeInteractionRate,
    /// Dish categories among quick recipes
    CategoriesQuickRecipe,
    /// Top tags per year in sets of ten
    TopTags,
    /// Mean rating per interaction year
    RatingEvolution,
    /// Review word frequencies
    WordFrequencies,
    /// Phrases around "time"
    WordFrequenciesTime,
    /// Mean review polarity per year
    SentimentByYear,
    /// Unique recipes per year
    RecipesPerYear,
    /// Reviews per year
    InteractionsPerYear,
    /// Rating summary per recipe
    RatingsPerRecipe,
    /// Mean steps and rating per year
    AverageStepsRating,
    /// Interactions by days since submission
    UserInteractions,
}

impl Aggregate {
    /// All aggregates, cached ones first
    pub const ALL: [Self; 18] = [
        Self::Oils,
        Self::CuisineData,
        Self::CuisineEvolution,
        Self::CuisineTopIngredients,
        Self::CuisinesNutritions,
        Self::QuickRecipeProportion,
        Self::QuickRecipeInteractionRate,
        Self::CategoriesQuickRecipe,
        Self::TopTags,
        Self::RatingEvolution,
        Self::WordFrequencies,
        Self::WordFrequenciesTime,
        Self::SentimentByYear,
        Self::RecipesPerYear,
        Self::InteractionsPerYear,
        Self::RatingsPerRecipe,
        Self::AverageStepsRating,
        Self::UserInteractions,
    ];

    /// Cache table backing this aggregate; `None` for ones computed on demand
    #[must_use]
    pub const fn table_name(&self) -> Option<&'static str> {
        match self {
            Self::Oils => Some(tables::OILS),
            Self::CuisineData => Some(tables::CUISINE_DATA),
            Self::CuisineEvolution => Some(tables::CUISINE_EVOLUTION),
            Self::CuisineTopIngredients => Some(tables::CUISINE_TOP_INGREDIENTS),
            Self::CuisinesNutritions => Some(tables::CUISINES_NUTRITIONS),
            Self::QuickRecipeProportion => Some(tables::QUICK_RECIPE_PROPORTION),
            Self::QuickRecipeInteractionRate => Some(tables::QUICK_RECIPE_INTERACTION_RATE),
            Self::CategoriesQuickRecipe => Some(tables::CATEGORIES_QUICK_RECIPE),
            Self::TopTags => Some(tables::TOP_TAGS),
            Self::RatingEvolution => Some(tables::RATING_EVOLUTION),
            Self::WordFrequencies => Some(tables::WORD_FREQUENCIES),
            Self::WordFrequenciesTime => Some(tables::WORD_FREQUENCIES_TIME),
            Self::SentimentByYear => Some(tables::SENTIMENT_BY_YEAR),
            Self::RecipesPerYear
            | Self::InteractionsPerYear
            | Self::RatingsPerRecipe
            | Self::AverageStepsRating
            | Self::UserInteractions => None,
        }
    }

    /// Name used on the command line
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RecipesPerYear => "recipes_per_year",
            Self::InteractionsPerYear => "interactions_per_year",
            Self::RatingsPerRecipe => "ratings_per_recipe",
            Self::AverageStepsRating => "average_steps_rating",
            Self::UserInteractions => "user_interactions",
            Self::Oils => "oils",
            Self::CuisineData => "cuisine_data",
            Self::CuisineEvolution => "cuisine_evolution",
            Self::CuisineTopIngredients => "cuisine_top_ingredients",
            Self::CuisinesNutritions => "cuisines_nutritions",
            Self::QuickRecipeProportion => "quick_recipe_proportion",
            Self::QuickRecipeInteractionRate => "quick_recipe_interaction_rate",
            Self::CategoriesQuickRecipe => "categories_quick_recipe",
            Self::TopTags => "top_tags",
            Self::RatingEvolution => "rating_evolution",
            Self::WordFrequencies => "word_frequencies",
            Self::WordFrequenciesTime => "word_frequencies_time",
            Self::SentimentByYear => "sentiment_by_year",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregate {
    type Err = InsightsError;

    /// Accepts the command-line name or the cache table name
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted || a.table_name() == Some(wanted.as_str()))
            .ok_or_else(|| InsightsError::InvalidConfig(format!("unknown aggregate: {s}")))
    }
}

/// Loads the merged data on demand and serves memoized aggregates
pub struct InsightsService<S: TableStore> {
    config: AppConfig,
    cache: AggregateCache<S>,
    comments: CommentAnalyzer,
    scorer: Box<dyn SentimentScorer + Send + Sync>,
    rows: OnceLock<Vec<RecipeInteraction>>,
    cleaned: OnceLock<Vec<String>>,
}

impl<S: TableStore> InsightsService<S> {
    /// Service over `store` with its own metrics collector
    pub fn new(store: S, config: AppConfig) -> Result<Self> {
        Self::with_metrics(store, config, Arc::new(MetricsCollector::default()))
    }

    /// Service over `store` reporting into `metrics`
    pub fn with_metrics(store: S, config: AppConfig, metrics: Arc<MetricsCollector>) -> Result<Self> {
        Ok(Self {
            config,
            cache: AggregateCache::with_metrics(store, metrics),
            comments: CommentAnalyzer::new()?,
            scorer: Box::new(LexiconScorer),
            rows: OnceLock::new(),
            cleaned: OnceLock::new(),
        })
    }

    /// Replace the polarity scorer used by the sentiment aggregate
    #[must_use]
    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer + Send + Sync>) -> Self {
        self.scorer = scorer;
        self
    }

    /// The cache store
    pub fn store(&self) -> &S {
        self.cache.store()
    }

    /// Metrics recorded by this service
    pub fn metrics(&self) -> &MetricsCollector {
        self.cache.metrics()
    }

    /// Configuration in use
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The cleaned merged rows, loaded once per service
    pub fn rows(&self) -> Result<&[RecipeInteraction]> {
        if let Some(rows) = self.rows.get() {
            return Ok(rows);
        }
        let loaded = self.load_rows()?;
        Ok(self.rows.get_or_init(|| loaded))
    }

    /// Rows from the cache store, or from the CSV files on a miss.
    ///
    /// Fresh rows are trimmed for outliers before they are stored.
    fn load_rows(&self) -> Result<Vec<RecipeInteraction>> {
        let store = self.cache.store();
        if let Some(table) = store.load(tables::RECIPE_INTERACTION).filter(|t| !t.is_empty()) {
            match RecipeInteraction::from_table(&table) {
                Ok(rows) => {
                    info!("Loaded {} merged rows from the cache store", rows.len());
                    self.metrics().record_cache_lookup(tables::RECIPE_INTERACTION, true);
                    return Ok(rows);
                }
                Err(e) => warn!("Cached {} is unusable, reloading files: {}", tables::RECIPE_INTERACTION, e),
            }
        }
        self.metrics().record_cache_lookup(tables::RECIPE_INTERACTION, false);

        let timer = OperationTimer::new("load_recipe_interaction");
        let data = &self.config.data;
        let recipes = DataLoader::new(&data.data_dir, &data.recipes_file);
        let interactions = DataLoader::new(&data.data_dir, &data.interactions_file);
        let merged = recipes.processed_recipe_interaction(&interactions, self.metrics())?;
        let rows = analyzer::clean_from_outliers(merged);
        timer.finish();

        let saved = store.save(
            tables::RECIPE_INTERACTION,
            &RecipeInteraction::to_table(&rows),
            SaveMode::Replace,
        );
        if let Err(e) = &saved {
            warn!("Failed to cache {}: {}", tables::RECIPE_INTERACTION, e);
        }
        self.metrics().record_cache_write(tables::RECIPE_INTERACTION, saved.is_ok());
        Ok(rows)
    }

    /// Cleaned review text, parallel to [`rows`](Self::rows)
    pub fn cleaned_reviews(&self) -> Result<&[String]> {
        if let Some(cleaned) = self.cleaned.get() {
            return Ok(cleaned);
        }
        let cleaned = self.comments.clean_reviews(self.rows()?);
        Ok(self.cleaned.get_or_init(|| cleaned))
    }

    /// Produce `aggregate`, from the cache when it has one
    pub fn aggregate(&self, aggregate: Aggregate) -> Result<Table> {
        let Some(name) = aggregate.table_name() else {
            return self.compute(aggregate);
        };
        self.cache.try_get_or_compute(name, || self.compute(aggregate))
    }

    fn compute(&self, aggregate: Aggregate) -> Result<Table> {
        let window = self.config.year_window();
        let analysis = &self.config.analysis;
        let rows = self.rows()?;

        let table = match aggregate {
            Aggregate::Oils => analyzer::analyze_oils(rows, window),
            Aggregate::CuisineData => cuisine::analyze_cuisines(rows),
            Aggregate::CuisineEvolution => cuisine::cuisine_evolution(rows, window),
            Aggregate::CuisineTopIngredients => cuisine::top_ingredients(rows),
            Aggregate::CuisinesNutritions => cuisine::cuisine_nutritions(rows),
            Aggregate::QuickRecipeProportion => quick::quick_recipe_proportion(rows, window),
            Aggregate::QuickRecipeInteractionRate => quick::quick_recipe_interaction_rate(rows, window),
            Aggregate::CategoriesQuickRecipe => quick::categories_quick_recipe(rows, window),
            Aggregate::TopTags => analyzer::top_tags_table(rows, window, analysis.top_tags),
            Aggregate::RatingEvolution => analyzer::rating_evolution(rows, window),
            Aggregate::WordFrequencies => self
                .comments
                .word_frequencies(self.cleaned_reviews()?, analysis.word_frequency_limit),
            Aggregate::WordFrequenciesTime => self
                .comments
                .word_frequencies_time(self.cleaned_reviews()?, analysis.phrase_frequency_limit),
            Aggregate::SentimentByYear => self.comments.sentiment_by_year(rows, self.scorer.as_ref(), window),
            Aggregate::RecipesPerYear => analyzer::group_recipes_year(rows),
            Aggregate::InteractionsPerYear => analyzer::group_interactions_year(rows),
            Aggregate::RatingsPerRecipe => analyzer::ratings_per_recipe(rows),
            Aggregate::AverageStepsRating => analyzer::average_steps_rating(rows),
            Aggregate::UserInteractions => analyzer::user_interactions(rows),
        };
        Ok(table)
    }

    /// Compute every cached aggregate that is not already stored.
    ///
    /// Returns each cache table name with its row count.
    pub fn build_all(&self) -> Result<Vec<(&'static str, usize)>> {
        let timer = OperationTimer::new("build_all");
        let mut built = Vec::new();
        for aggregate in Aggregate::ALL {
            if let Some(name) = aggregate.table_name() {
                let table = self.aggregate(aggregate)?;
                built.push((name, table.row_count()));
            }
        }
        timer.finish();
        Ok(built)
    }

    /// Top tags of `year`, optionally a single set of ten
    pub fn top_tags(&self, year: i32, set_number: Option<usize>) -> Result<Table> {
        let table = self.aggregate(Aggregate::TopTags)?;
        Ok(analyzer::select_top_tags(&table, year, set_number))
    }

    /// Occurrences of `word` in reviews per year.
    ///
    /// Reviews are counted token by token, so `word` must clean down to a
    /// single token; phrases go through [`review_co_occurrence`](Self::review_co_occurrence).
    pub fn word_count(&self, word: &str) -> Result<Table> {
        let word = self.comments.clean_text(word);
        if word.is_empty() || word.contains(char::is_whitespace) {
            return Err(InsightsError::InvalidConfig(format!(
                "word count takes a single word, got {word:?}; use co-occurrence for several words"
            )));
        }
        Ok(analyzer::word_count_over_time(
            self.rows()?,
            self.cleaned_reviews()?,
            &word,
            self.config.year_window(),
        ))
    }

    /// Share of reviews mentioning all `words` per year
    pub fn review_co_occurrence(&self, words: &[String]) -> Result<Table> {
        let words: Vec<String> = words.iter().map(|w| self.comments.clean_text(w)).collect();
        Ok(analyzer::word_co_occurrence_over_time(
            self.rows()?,
            self.cleaned_reviews()?,
            &words,
            self.config.year_window(),
        ))
    }

    /// Write `aggregate` into the configured export directory as `<name>.<ext>`
    pub fn export(&self, aggregate: Aggregate, format: OutputFormat) -> Result<PathBuf> {
        let table = self.aggregate(aggregate)?;
        let dir = Path::new(&self.config.export.output_directory);
        let path = file_writer::write_table_to_dir(&table, aggregate.name(), format, dir)?;
        info!("Exported {} ({} rows) to {}", aggregate, table.row_count(), path.display());
        Ok(path)
    }

    /// Share of recipes using all `ingredients` per year
    pub fn ingredient_co_occurrence(&self, ingredients: &[String]) -> Result<Table> {
        Ok(analyzer::ingredient_co_occurrence_over_time(
            self.rows()?,
            ingredients,
            self.config.year_window(),
        ))
    }
}
