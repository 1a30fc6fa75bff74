//! Recipe Insights - Recipe and Review Analytics
//!
//! A Rust library that loads the Food.com recipe and interaction datasets,
//! cleans and merges them, and serves derived aggregates for a dashboard.
//!
//! # Features
//!
//! - Download the raw CSV files when they are missing
//! - Merge recipes with their reviews and trim outliers
//! - Cuisine, quick-recipe, tag, oil and rating aggregates per year
//! - Review word frequencies and sentiment
//! - Read-through SQLite cache of every derived table
//! - Export to multiple formats (TXT, CSV, JSON)

/// Year, tag, oil, rating and co-occurrence aggregates
pub mod analyzer;
/// Read-through aggregate cache
pub mod cache;
/// Configuration management
pub mod config;
/// Cuisine labelling and per-cuisine aggregates
pub mod cuisine;
/// Cache store and connection pooling
pub mod db;
/// Dataset download
pub mod downloader;
/// Error types
pub mod error;
/// Table export
pub mod file_writer;
/// CSV loading and merging
pub mod loader;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Review text processing
pub mod nlp;
/// Quick-recipe aggregates
pub mod quick;
/// Cache store schema definitions
pub mod schema;
/// Aggregate service
pub mod service;
/// Column-oriented result tables
pub mod table;
/// Parsing and statistics helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use cache::AggregateCache;
pub use db::{Database, SaveMode, TableStore};
pub use error::{InsightsError, Result};
pub use models::{Cuisine, OutputFormat, RecipeInteraction};
pub use nlp::{CommentAnalyzer, LexiconScorer, SentimentScorer};
pub use service::{Aggregate, InsightsService};
pub use table::{Column, Table, Value};
