use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input files and download sources
    pub data: DataConfig,
    /// Cache store
    pub database: DatabaseConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Aggregate parameters
    pub analysis: AnalysisConfig,
    /// Table export
    pub export: ExportConfig,
}

/// Input dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV files
    pub data_dir: String,
    /// Recipes file name
    pub recipes_file: String,
    /// Interactions file name
    pub interactions_file: String,
    /// Where to fetch the recipes file from
    pub recipes_url: Option<String>,
    /// Where to fetch the interactions file from
    pub interactions_url: Option<String>,
    /// HTTP timeout for downloads
    pub download_timeout_secs: u64,
}

/// Cache store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: String,
    /// Pool size
    pub max_connections: u32,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level
    pub level: String,
    /// Optional rolling log file
    pub file_path: Option<String>,
    /// "json" or "text"
    pub format: String,
}

/// Aggregate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// First year of the analysis window
    pub first_year: i32,
    /// Last year of the analysis window
    pub last_year: i32,
    /// Tags kept per year
    pub top_tags: usize,
    /// Words kept by the frequency table
    pub word_frequency_limit: usize,
    /// Phrases kept around "time"
    pub phrase_frequency_limit: usize,
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// txt, csv or json
    pub default_format: String,
    /// Directory for `show --save`
    pub output_directory: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                data_dir: "Data".to_string(),
                recipes_file: "RAW_recipes.csv".to_string(),
                interactions_file: "RAW_interactions.csv".to_string(),
                recipes_url: None,
                interactions_url: None,
                download_timeout_secs: 300,
            },
            database: DatabaseConfig {
                path: "database/streamlit.db".to_string(),
                max_connections: 4,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            analysis: AnalysisConfig {
                first_year: 2002,
                last_year: 2010,
                top_tags: 100,
                word_frequency_limit: 100,
                phrase_frequency_limit: 10,
            },
            export: ExportConfig {
                default_format: "txt".to_string(),
                output_directory: "./output".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("RECIPE_INSIGHTS").separator("__"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate data config
        if self.data.recipes_file.trim().is_empty() || self.data.interactions_file.trim().is_empty() {
            return Err(anyhow::anyhow!("recipes_file and interactions_file must be set"));
        }
        if self.data.download_timeout_secs == 0 {
            return Err(anyhow::anyhow!("download_timeout_secs must be greater than 0"));
        }

        // Validate database config
        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("database path must be set"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate analysis config
        if self.analysis.first_year > self.analysis.last_year {
            return Err(anyhow::anyhow!(
                "first_year ({}) must not be after last_year ({})",
                self.analysis.first_year,
                self.analysis.last_year
            ));
        }
        if self.analysis.top_tags == 0 {
            return Err(anyhow::anyhow!("top_tags must be greater than 0"));
        }
        if self.analysis.word_frequency_limit == 0 || self.analysis.phrase_frequency_limit == 0 {
            return Err(anyhow::anyhow!("frequency limits must be greater than 0"));
        }

        // Validate export config
        let valid_formats = ["txt", "csv", "json"];
        if !valid_formats.contains(&self.export.default_format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid export format: {}. Must be one of: {:?}",
                self.export.default_format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Full path of the recipes CSV
    #[must_use]
    pub fn recipes_path(&self) -> PathBuf {
        PathBuf::from(&self.data.data_dir).join(&self.data.recipes_file)
    }

    /// Full path of the interactions CSV
    #[must_use]
    pub fn interactions_path(&self) -> PathBuf {
        PathBuf::from(&self.data.data_dir).join(&self.data.interactions_file)
    }

    /// Get cache database path from environment or config
    #[must_use]
    pub fn get_database_path(&self) -> String {
        std::env::var("RECIPE_INSIGHTS_DB").unwrap_or_else(|_| self.database.path.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Inclusive analysis window
    #[must_use]
    pub const fn year_window(&self) -> (i32, i32) {
        (self.analysis.first_year, self.analysis.last_year)
    }
}
