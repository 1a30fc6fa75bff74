//! Cache store schema definitions
//!
//! This module provides constants for the cache table names and the columns
//! of the persisted merged table used with rusqlite.

/// Names of the tables persisted in the cache store
pub mod tables {
    /// Cleaned recipe/interaction merge
    pub const RECIPE_INTERACTION: &str = "recipe_interaction";
    /// Oil type proportions per year
    pub const OILS: &str = "oils_dataframe";
    /// Cuisine distribution
    pub const CUISINE_DATA: &str = "cuisine_data";
    /// Cuisine share per year
    pub const CUISINE_EVOLUTION: &str = "cuisine_evolution_dataframe";
    /// Most common ingredients per cuisine
    pub const CUISINE_TOP_INGREDIENTS: &str = "cuisine_top_ingredients";
    /// Median nutrition per cuisine
    pub const CUISINES_NUTRITIONS: &str = "cuisines_nutritions";
    /// Share of quick recipes per year
    pub const QUICK_RECIPE_PROPORTION: &str = "quick_recipe_proportion_table";
    /// Share of interactions landing on quick recipes per year
    pub const QUICK_RECIPE_INTERACTION_RATE: &str = "rate_interactions_for_quick_recipe";
    /// Dish categories among quick recipes
    pub const CATEGORIES_QUICK_RECIPE: &str = "categories_quick_recipe";
    /// Top tags per year, in sets of ten
    pub const TOP_TAGS: &str = "top_tags";
    /// Mean rating per interaction year
    pub const RATING_EVOLUTION: &str = "rating_evolution";
    /// Review word frequencies
    pub const WORD_FREQUENCIES: &str = "word_frequencies";
    /// Phrases around the word "time"
    pub const WORD_FREQUENCIES_TIME: &str = "word_frequencies_time";
    /// Mean review polarity per interaction year
    pub const SENTIMENT_BY_YEAR: &str = "sentiment_by_year";
}

/// Columns of the persisted `recipe_interaction` table
pub mod recipe_interaction {
    /// Recipe identifier
    pub const ID: &str = "id";
    /// Recipe name
    pub const NAME: &str = "name";
    /// Preparation time in minutes
    pub const MINUTES: &str = "minutes";
    /// Recipe author
    pub const CONTRIBUTOR_ID: &str = "contributor_id";
    /// Submission date (YYYY-MM-DD)
    pub const SUBMITTED: &str = "submitted";
    /// Serialized tag list
    pub const TAGS: &str = "tags";
    /// Number of steps
    pub const N_STEPS: &str = "n_steps";
    /// Serialized ingredient list
    pub const INGREDIENTS: &str = "ingredients";
    /// Number of ingredients
    pub const N_INGREDIENTS: &str = "n_ingredients";
    /// Reviewer
    pub const USER_ID: &str = "user_id";
    /// Interaction date (YYYY-MM-DD)
    pub const DATE: &str = "date";
    /// Rating given by the reviewer
    pub const RATING: &str = "rating";
    /// Review text
    pub const REVIEW: &str = "review";
    /// Submission year
    pub const YEAR: &str = "year";
    /// Derived cuisine label
    pub const CUISINE: &str = "cuisine";
    /// Calories
    pub const CAL: &str = "cal";
    /// Total fat (PDV)
    pub const TOTAL_FAT: &str = "totalFat";
    /// Sugar (PDV)
    pub const SUGAR: &str = "sugar";
    /// Sodium (PDV)
    pub const SODIUM: &str = "sodium";
    /// Protein (PDV)
    pub const PROTEIN: &str = "protein";
    /// Saturated fat (PDV)
    pub const SAT_FAT: &str = "satFat";
    /// Carbohydrates (PDV)
    pub const CARBS: &str = "carbs";
}
