use anyhow::Result;
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const CACHE_HITS_TOTAL: &str = "recipe_insights_cache_hits_total";
const CACHE_MISSES_TOTAL: &str = "recipe_insights_cache_misses_total";
const CACHE_WRITES_TOTAL: &str = "recipe_insights_cache_writes_total";
const AGGREGATES_COMPUTED_TOTAL: &str = "recipe_insights_aggregates_computed_total";
const AGGREGATE_DURATION: &str = "recipe_insights_aggregate_duration_seconds";
const AGGREGATE_ROWS: &str = "recipe_insights_aggregate_rows";
const ROWS_LOADED_TOTAL: &str = "recipe_insights_rows_loaded_total";
const ROWS_DROPPED_TOTAL: &str = "recipe_insights_rows_dropped_total";
const DOWNLOADS_TOTAL: &str = "recipe_insights_downloads_total";
const ERRORS_TOTAL: &str = "recipe_insights_errors_total";

/// Metrics collection and management.
///
/// Every event is forwarded to the global `metrics` recorder and also
/// tallied locally so callers can report totals at the end of a run.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_writes: AtomicU64,
    aggregates_computed: AtomicU64,
    rows_loaded: AtomicU64,
    rows_dropped: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    /// Initialize metrics collection
    pub fn init() -> Result<()> {
        // Initialize the metrics recorder
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {}", e))?;

        Ok(())
    }

    /// Record a cache lookup for `table`
    pub fn record_cache_lookup(&self, table: &str, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            counter!(CACHE_HITS_TOTAL, "table" => table.to_string()).increment(1);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
            counter!(CACHE_MISSES_TOTAL, "table" => table.to_string()).increment(1);
        }
    }

    /// Record a cache table write
    pub fn record_cache_write(&self, table: &str, success: bool) {
        self.cache_writes.fetch_add(1, Ordering::Relaxed);
        counter!(
            CACHE_WRITES_TOTAL,
            "table" => table.to_string(),
            "status" => if success { "success" } else { "error" }
        )
        .increment(1);

        if !success {
            self.record_error("cache_write", table);
        }
    }

    /// Record a fresh aggregate computation
    pub fn record_aggregate(&self, table: &str, rows: usize, duration: Duration) {
        self.aggregates_computed.fetch_add(1, Ordering::Relaxed);
        counter!(AGGREGATES_COMPUTED_TOTAL, "table" => table.to_string()).increment(1);
        histogram!(AGGREGATE_DURATION, "table" => table.to_string()).record(duration.as_secs_f64());
        gauge!(AGGREGATE_ROWS, "table" => table.to_string()).set(rows as f64);
    }

    /// Record rows read from an input file and rows rejected during enrichment
    pub fn record_rows_loaded(&self, source: &str, loaded: usize, dropped: usize) {
        self.rows_loaded.fetch_add(loaded as u64, Ordering::Relaxed);
        self.rows_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
        counter!(ROWS_LOADED_TOTAL, "source" => source.to_string()).increment(loaded as u64);
        counter!(ROWS_DROPPED_TOTAL, "source" => source.to_string()).increment(dropped as u64);
    }

    /// Record a dataset download attempt
    pub fn record_download(&self, file: &str, success: bool) {
        counter!(
            DOWNLOADS_TOTAL,
            "file" => file.to_string(),
            "status" => if success { "success" } else { "error" }
        )
        .increment(1);

        if !success {
            self.record_error("download", file);
        }
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &str, operation: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!(
            ERRORS_TOTAL,
            "type" => error_type.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    /// Cache lookups answered from the store
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Cache lookups that required a computation
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Cache tables written
    pub fn cache_writes(&self) -> u64 {
        self.cache_writes.load(Ordering::Relaxed)
    }

    /// Aggregates computed from scratch
    pub fn aggregates_computed(&self) -> u64 {
        self.aggregates_computed.load(Ordering::Relaxed)
    }

    /// Input rows accepted
    pub fn rows_loaded(&self) -> u64 {
        self.rows_loaded.load(Ordering::Relaxed)
    }

    /// Input rows rejected
    pub fn rows_dropped(&self) -> u64 {
        self.rows_dropped.load(Ordering::Relaxed)
    }

    /// Errors recorded
    pub fn errors_total(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Performance timing wrapper for aggregate metrics
pub struct MetricsTimer<'a> {
    collector: &'a MetricsCollector,
    table: String,
    start: std::time::Instant,
}

impl<'a> MetricsTimer<'a> {
    /// Start timing the computation of `table`
    pub fn new(collector: &'a MetricsCollector, table: &str) -> Self {
        Self {
            collector,
            table: table.to_string(),
            start: std::time::Instant::now(),
        }
    }

    /// Record the duration and row count
    pub fn finish(self, rows: usize) {
        let duration = self.start.elapsed();
        self.collector.record_aggregate(&self.table, rows, duration);
    }
}
