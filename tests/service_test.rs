//! End-to-end tests: CSV files on disk through the service and the cache store

use std::fs;
use std::path::Path;

use recipe_insights::config::AppConfig;
use recipe_insights::db::{Database, TableStore};
use recipe_insights::models::OutputFormat;
use recipe_insights::nlp::SentimentScorer;
use recipe_insights::schema::tables;
use recipe_insights::service::{Aggregate, InsightsService};
use recipe_insights::table::Value;
use tempfile::{tempdir, TempDir};

const RECIPES_CSV: &str = "\
name,id,minutes,contributor_id,submitted,tags,nutrition,n_steps,steps,description,ingredients,n_ingredients
garlic pasta,1,30,10,2005-03-01,\"['30-minutes-or-less', 'main-dish', 'italian']\",\"[100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]\",4,\"['boil']\",tasty,\"['olive oil', 'garlic']\",2
bean stew,2,30,11,2005-07-10,\"['4-hours-or-less', 'soups-stews', 'mexican']\",\"[100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]\",6,\"['simmer']\",warm,\"['beans', 'salsa']\",2
butter cake,3,30,12,2006-01-05,\"['15-minutes-or-less', 'desserts', 'american']\",\"[100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]\",8,\"['bake']\",sweet,\"['butter', 'sugar']\",2
broken,4,30,13,not-a-date,\"['main-dish']\",\"[100.0]\",1,\"['x']\",bad,\"['salt']\",1
";

const INTERACTIONS_CSV: &str = "\
user_id,recipe_id,date,rating,review
100,1,2006-01-01,5,\"Loved the garlic, saved me so much time tonight!\"
101,1,2007-02-02,4,The garlic butter chicken was lovely
102,3,2008-03-03,3,Too sweet for me
";

struct Fixture {
    _dir: TempDir,
    config: AppConfig,
    db_path: String,
}

fn fixture() -> Fixture {
    let dir = tempdir().expect("Failed to create temp directory");
    let data_dir = dir.path().join("Data");
    fs::create_dir_all(&data_dir).expect("data dir");
    fs::write(data_dir.join("RAW_recipes.csv"), RECIPES_CSV).expect("recipes");
    fs::write(data_dir.join("RAW_interactions.csv"), INTERACTIONS_CSV).expect("interactions");

    let mut config = AppConfig::default();
    config.data.data_dir = data_dir.to_string_lossy().into_owned();
    let db_path = dir.path().join("database").join("streamlit.db").to_string_lossy().into_owned();
    Fixture {
        _dir: dir,
        config,
        db_path,
    }
}

fn service(fixture: &Fixture) -> InsightsService<Database> {
    let db = Database::new(&fixture.db_path).expect("store");
    InsightsService::new(db, fixture.config.clone()).expect("service")
}

#[test]
fn test_rows_merge_and_drop_unreadable_recipes() {
    let fixture = fixture();
    let service = service(&fixture);

    let rows = service.rows().expect("rows");
    // recipe 1 twice, recipe 2 unreviewed, recipe 3 once; recipe 4 dropped
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.id != 4));
    assert!(service.store().exists_and_nonempty(tables::RECIPE_INTERACTION));
}

#[test]
fn test_quick_recipe_proportion_from_files() {
    let fixture = fixture();
    let table = service(&fixture)
        .aggregate(Aggregate::QuickRecipeProportion)
        .expect("aggregate");

    assert_eq!(table.get(0, "Year"), Some(&Value::Integer(2005)));
    assert_eq!(table.get(0, "Proportion"), Some(&Value::Real(50.0)));
    assert_eq!(table.get(1, "Year"), Some(&Value::Integer(2006)));
    assert_eq!(table.get(1, "Proportion"), Some(&Value::Real(100.0)));
}

#[test]
fn test_build_all_fills_every_cache_table() {
    let fixture = fixture();
    let service = service(&fixture);
    let built = service.build_all().expect("build");
    assert_eq!(built.len(), 13);

    let db = Database::new(&fixture.db_path).expect("store");
    let stored = db.list_tables().expect("list");
    for aggregate in Aggregate::ALL {
        if let Some(name) = aggregate.table_name() {
            let (_, rows) = built.iter().find(|(n, _)| *n == name).expect("built");
            if *rows > 0 {
                assert!(stored.iter().any(|s| s == name), "{name} not stored");
            }
        }
    }
    assert!(stored.iter().any(|s| s == tables::RECIPE_INTERACTION));
}

#[test]
fn test_second_run_is_served_from_store() {
    let fixture = fixture();
    let first = service(&fixture).aggregate(Aggregate::CuisineData).expect("first run");

    // with the input files gone only the store can answer
    fs::remove_dir_all(Path::new(&fixture.config.data.data_dir)).expect("remove inputs");
    let second_service = service(&fixture);
    let second = second_service.aggregate(Aggregate::CuisineData).expect("second run");

    assert_eq!(first, second);
    assert_eq!(second_service.metrics().cache_hits(), 1);
    assert!(second_service.rows().is_ok());
}

#[test]
fn test_missing_inputs_report_an_error_and_store_nothing() {
    let fixture = fixture();
    fs::remove_dir_all(Path::new(&fixture.config.data.data_dir)).expect("remove inputs");

    let service = service(&fixture);
    assert!(service.aggregate(Aggregate::Oils).is_err());
    assert!(!service.store().exists_and_nonempty(tables::OILS));
}

#[test]
fn test_top_tags_selection() {
    let fixture = fixture();
    let service = service(&fixture);

    let tags = service.top_tags(2005, Some(0)).expect("top tags");
    assert_eq!(tags.row_count(), 6);
    assert!((0..tags.row_count()).all(|i| tags.get(i, "year") == Some(&Value::Integer(2005))));
    assert!(service.top_tags(2005, Some(1)).expect("top tags").is_empty());
}

#[test]
fn test_word_count_and_co_occurrence() {
    let fixture = fixture();
    let service = service(&fixture);

    let counts = service.word_count("Garlic").expect("word count");
    assert_eq!(counts.get(0, "year"), Some(&Value::Integer(2005)));
    assert_eq!(counts.get(0, "word_count"), Some(&Value::Integer(2)));

    let reviews = service
        .review_co_occurrence(&["garlic".to_string(), "butter".to_string()])
        .expect("co-occurrence");
    let share = reviews.get(0, "Co-occurrence Percentage").and_then(Value::as_f64).unwrap_or_default();
    assert!((share - 100.0 / 3.0).abs() < 1e-9);

    let ingredients = service
        .ingredient_co_occurrence(&["Olive Oil".to_string(), "garlic".to_string()])
        .expect("co-occurrence");
    let share = ingredients.get(0, "Co-occurrence Percentage").and_then(Value::as_f64).unwrap_or_default();
    assert!((share - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_uncached_aggregates_are_not_stored() {
    let fixture = fixture();
    let service = service(&fixture);

    let per_year = service.aggregate(Aggregate::RecipesPerYear).expect("aggregate");
    assert_eq!(per_year.get(0, "recipes"), Some(&Value::Integer(2)));
    assert!(!service.store().exists_and_nonempty("recipes_per_year"));
}

struct FixedScorer(f64);

impl SentimentScorer for FixedScorer {
    fn polarity(&self, _text: &str) -> f64 {
        self.0
    }
}

#[test]
fn test_sentiment_uses_the_configured_scorer() {
    let fixture = fixture();
    let db = Database::new(&fixture.db_path).expect("store");
    let service = InsightsService::new(db, fixture.config.clone())
        .expect("service")
        .with_scorer(Box::new(FixedScorer(0.25)));

    let table = service.aggregate(Aggregate::SentimentByYear).expect("aggregate");
    // one review each in 2006, 2007 and 2008; the unreviewed recipe has no date
    assert_eq!(table.row_count(), 3);
    for (i, year) in [2006, 2007, 2008].into_iter().enumerate() {
        assert_eq!(table.get(i, "Year"), Some(&Value::Integer(year)));
        assert_eq!(table.get(i, "Average Sentiment"), Some(&Value::Real(0.25)));
    }
}

#[test]
fn test_word_count_rejects_phrases() {
    let fixture = fixture();
    let service = service(&fixture);

    assert!(service.word_count("garlic butter").is_err());
    assert!(service.word_count("!!!").is_err());
    assert!(service.word_count("Garlic!").is_ok());
}

#[test]
fn test_export_writes_into_output_directory() {
    let mut fixture = fixture();
    let out = fixture._dir.path().join("exports");
    fixture.config.export.output_directory = out.to_string_lossy().into_owned();
    let service = service(&fixture);

    let path = service
        .export(Aggregate::QuickRecipeProportion, OutputFormat::Csv)
        .expect("export");
    assert_eq!(path, out.join("quick_recipe_proportion.csv"));

    let content = fs::read_to_string(&path).expect("read back");
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("Year,Proportion"));
    assert_eq!(lines.count(), 2);
}
