//! Command line front end over the recipe insights service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use recipe_insights::analyzer::TAGS_PER_SET;
use recipe_insights::config::AppConfig;
use recipe_insights::db::{Database, TableStore};
use recipe_insights::downloader::{download_if_missing, HttpSource};
use recipe_insights::file_writer::{write_table, write_table_to_file};
use recipe_insights::loader::inputs_present;
use recipe_insights::logging::{init_logging, OperationTimer};
use recipe_insights::metrics::MetricsCollector;
use recipe_insights::models::OutputFormat;
use recipe_insights::service::{Aggregate, InsightsService};
use recipe_insights::table::{Table, Value};
use recipe_insights::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the raw dataset files that are missing
    Download,
    /// Load the data and compute every cached aggregate
    Build,
    /// Print or export one aggregate
    Show {
        /// Aggregate name, e.g. quick_recipe_proportion or oils
        aggregate: String,

        /// Output format (txt, csv or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write to this file instead of stdout
        #[arg(short, long, conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Write `<aggregate>.<format>` into the configured output directory
        #[arg(long)]
        save: bool,
    },
    /// Show the most used tags of a year
    TopTags {
        /// Submission year
        #[arg(short, long)]
        year: i32,

        /// Set of ten tags, starting at 0
        #[arg(short, long)]
        set: Option<usize>,
    },
    /// Count a word in reviews per year
    WordCount {
        /// Word to count
        #[arg(short, long)]
        word: String,
    },
    /// Share of reviews (or recipes) mentioning all the given words per year
    CoOccurrence {
        /// Comma separated words
        #[arg(short, long, value_delimiter = ',', required = true)]
        words: Vec<String>,

        /// Match ingredient lists instead of review text
        #[arg(long)]
        ingredients: bool,
    },
    /// List the cache tables and their sizes
    Tables,
    /// Drop every cache table
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard flushes the file layer on exit
    let _guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    if let Err(e) = MetricsCollector::init() {
        warn!("Metrics recorder unavailable: {}", e);
    }
    let metrics = Arc::new(MetricsCollector::default());

    info!("Starting recipe-insights");

    let db = Database::with_pool_size(&config.get_database_path(), config.database.max_connections)
        .context("Failed to open cache store")?;

    match cli.command {
        Commands::Download => download_inputs(&config, &metrics).await?,
        Commands::Build => build(&config, &db, &metrics).await?,
        Commands::Show {
            aggregate,
            format,
            output,
            save,
        } => {
            let service = InsightsService::with_metrics(db.clone(), config.clone(), metrics.clone())?;
            show(&service, &aggregate, format.as_deref(), output.as_deref(), save)?;
        }
        Commands::TopTags { year, set } => {
            InputValidator::validate_year(year, config.year_window())?;
            if let Some(set) = set {
                InputValidator::validate_set_number(set, config.analysis.top_tags, TAGS_PER_SET)?;
            }
            let service = InsightsService::with_metrics(db.clone(), config.clone(), metrics.clone())?;
            let table = service.top_tags(year, set).context("No data to display")?;
            print_table(&table, OutputFormat::Txt)?;
        }
        Commands::WordCount { word } => {
            InputValidator::validate_word(&word)?;
            let service = InsightsService::with_metrics(db.clone(), config.clone(), metrics.clone())?;
            let table = service.word_count(&word).context("No data to display")?;
            print_table(&table, OutputFormat::Txt)?;
        }
        Commands::CoOccurrence { words, ingredients } => {
            let words: Vec<String> = words.iter().map(|w| InputValidator::sanitize_text(w)).collect();
            InputValidator::validate_words(&words)?;
            let service = InsightsService::with_metrics(db.clone(), config.clone(), metrics.clone())?;
            let table = if ingredients {
                service.ingredient_co_occurrence(&words)
            } else {
                service.review_co_occurrence(&words)
            }
            .context("No data to display")?;
            print_table(&table, OutputFormat::Txt)?;
        }
        Commands::Tables => list_tables(&db)?,
        Commands::ClearCache => {
            let dropped = db.clear().context("Failed to clear cache store")?;
            info!("Dropped {} cache tables", dropped);
        }
    }

    debug!(
        cache_hits = metrics.cache_hits(),
        cache_misses = metrics.cache_misses(),
        errors = metrics.errors_total(),
        "Run finished"
    );
    Ok(())
}

/// Fetch whichever input files are missing from the data directory
async fn download_inputs(config: &AppConfig, metrics: &MetricsCollector) -> Result<()> {
    let data = &config.data;
    for url in [&data.recipes_url, &data.interactions_url].into_iter().flatten() {
        InputValidator::validate_url(url)?;
    }

    let source = HttpSource::new(Duration::from_secs(data.download_timeout_secs))?;
    let data_dir = Path::new(&data.data_dir);
    for (file_name, url) in [
        (&data.recipes_file, data.recipes_url.as_deref()),
        (&data.interactions_file, data.interactions_url.as_deref()),
    ] {
        let path = download_if_missing(&source, file_name, url, data_dir, metrics)
            .await
            .with_context(|| format!("Failed to obtain {file_name}"))?;
        debug!("Input ready at {}", path.display());
    }
    Ok(())
}

/// Compute and cache every aggregate, downloading inputs first when needed
async fn build(config: &AppConfig, db: &Database, metrics: &Arc<MetricsCollector>) -> Result<()> {
    let timer = OperationTimer::new("build");
    if !db.exists_and_nonempty(recipe_insights::schema::tables::RECIPE_INTERACTION)
        && !inputs_present(&config.recipes_path(), &config.interactions_path())
    {
        download_inputs(config, metrics).await?;
    }

    let service = InsightsService::with_metrics(db.clone(), config.clone(), metrics.clone())?;
    let built = service.build_all().context("No data to display")?;
    for (name, rows) in &built {
        info!("{}: {} rows", name, rows);
    }
    timer.finish();
    info!("Cached {} aggregates", built.len());
    Ok(())
}

fn show(
    service: &InsightsService<Database>,
    name: &str,
    format: Option<&str>,
    output: Option<&Path>,
    save: bool,
) -> Result<()> {
    let aggregate: Aggregate = name.parse()?;
    let format: OutputFormat = format
        .unwrap_or(service.config().export.default_format.as_str())
        .parse()?;

    if save {
        InputValidator::validate_file_path(Path::new(&service.config().export.output_directory))?;
        let path = service.export(aggregate, format).context("No data to display")?;
        info!("Saved {} to {}", aggregate, path.display());
        return Ok(());
    }

    let table = service.aggregate(aggregate).context("No data to display")?;
    if table.is_empty() {
        warn!("No data to display for {}", aggregate);
    }

    match output {
        Some(path) => {
            InputValidator::validate_file_path(path)?;
            write_table_to_file(&table, format, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} rows to {}", table.row_count(), path.display());
        }
        None => print_table(&table, format)?,
    }
    Ok(())
}

fn list_tables(db: &Database) -> Result<()> {
    let names = db.list_tables().context("Failed to list cache tables")?;
    if names.is_empty() {
        warn!("The cache store is empty");
    }
    let rows = names
        .into_iter()
        .map(|name| {
            let size = db.load(&name).map(|t| t.row_count());
            vec![Value::from(name), Value::from(size)]
        })
        .collect();
    print_table(&Table::from_rows(&["table", "rows"], rows)?, OutputFormat::Txt)
}

fn print_table(table: &Table, format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = write_table(table, format, &mut handle) {
        error!("Failed to print table: {}", e);
        return Err(e.into());
    }
    handle.flush()?;
    Ok(())
}
