//! Unit tests for config.rs module

use recipe_insights::config::AppConfig;

#[test]
fn test_default_data_config() {
    let config = AppConfig::default();

    assert_eq!(config.data.data_dir, "Data");
    assert_eq!(config.data.recipes_file, "RAW_recipes.csv");
    assert_eq!(config.data.interactions_file, "RAW_interactions.csv");
    assert!(config.data.recipes_url.is_none());
    assert_eq!(config.data.download_timeout_secs, 300);
}

#[test]
fn test_default_database_config() {
    let config = AppConfig::default();

    assert_eq!(config.database.path, "database/streamlit.db");
    assert_eq!(config.database.max_connections, 4);
}

#[test]
fn test_default_analysis_config() {
    let config = AppConfig::default();

    assert_eq!(config.year_window(), (2002, 2010));
    assert_eq!(config.analysis.top_tags, 100);
    assert_eq!(config.analysis.word_frequency_limit, 100);
    assert_eq!(config.analysis.phrase_frequency_limit, 10);
}

#[test]
fn test_input_paths() {
    let config = AppConfig::default();

    assert!(config.recipes_path().ends_with("Data/RAW_recipes.csv"));
    assert!(config.interactions_path().ends_with("Data/RAW_interactions.csv"));
}

#[test]
fn test_validate_default_config() {
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_validate_rejects_inverted_window() {
    let mut config = AppConfig::default();
    config.analysis.first_year = 2011;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_invalid_export_format() {
    let mut config = AppConfig::default();
    config.export.default_format = "xlsx".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_limits() {
    let mut config = AppConfig::default();
    config.analysis.top_tags = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.analysis.word_frequency_limit = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_file_names() {
    let mut config = AppConfig::default();
    config.data.recipes_file = " ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization_round_trip() {
    let config = AppConfig::default();
    let json = serde_json::to_string(&config).expect("serialize");
    let parsed: AppConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed.database.path, config.database.path);
    assert_eq!(parsed.year_window(), config.year_window());
}
