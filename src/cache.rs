use std::sync::Arc;

use tracing::{debug, error, info};

use crate::db::{SaveMode, TableStore};
use crate::error::Result;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::table::Table;

/// Read-through cache of derived aggregate tables.
///
/// A table found in the store with at least one row is returned as is.
/// Anything else (missing, unreadable, empty) is recomputed and written back.
pub struct AggregateCache<S: TableStore> {
    store: S,
    metrics: Arc<MetricsCollector>,
}

impl<S: TableStore> AggregateCache<S> {
    /// Cache over `store` with its own metrics collector
    pub fn new(store: S) -> Self {
        Self::with_metrics(store, Arc::new(MetricsCollector::default()))
    }

    /// Cache over `store` reporting into `metrics`
    pub fn with_metrics(store: S, metrics: Arc<MetricsCollector>) -> Self {
        Self { store, metrics }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Metrics recorded by this cache
    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Return the cached table `name`, computing and storing it on a miss.
    ///
    /// A failed write is logged and the fresh result is returned anyway.
    pub fn get_or_compute<F>(&self, name: &str, compute: F) -> Table
    where
        F: FnOnce() -> Table,
    {
        match self.try_get_or_compute(name, || Ok(compute())) {
            Ok(table) => table,
            Err(e) => {
                error!("Computation of {} failed: {}", name, e);
                Table::new()
            }
        }
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for computations that
    /// can fail. Nothing is stored when `compute` returns an error.
    pub fn try_get_or_compute<F>(&self, name: &str, compute: F) -> Result<Table>
    where
        F: FnOnce() -> Result<Table>,
    {
        if let Some(cached) = self.store.load(name) {
            if !cached.is_empty() {
                debug!("Cache hit for {}", name);
                self.metrics.record_cache_lookup(name, true);
                return Ok(cached);
            }
            debug!("Cached table {} is empty, recomputing", name);
        }
        self.metrics.record_cache_lookup(name, false);

        let timer = MetricsTimer::new(&self.metrics, name);
        let derived = compute()?;
        timer.finish(derived.row_count());

        match self.store.save(name, &derived, SaveMode::Replace) {
            Ok(()) => {
                info!("Computed and cached {} ({} rows)", name, derived.row_count());
                self.metrics.record_cache_write(name, true);
            }
            Err(e) => {
                error!("Failed to cache {}: {}", name, e);
                self.metrics.record_cache_write(name, false);
            }
        }

        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::InsightsError;
    use crate::table::{Column, Table};
    use std::cell::Cell;

    fn proportions() -> Table {
        Table::from_columns(vec![
            Column::new("Year", vec![2005_i64]),
            Column::new("Proportion", vec![50.0]),
        ])
        .expect("valid")
    }

    #[test]
    fn test_second_call_is_served_from_store() {
        let cache = AggregateCache::new(Database::in_memory().expect("store"));
        let calls = Cell::new(0);

        let first = cache.get_or_compute("quick_recipe_proportion_table", || {
            calls.set(calls.get() + 1);
            proportions()
        });
        let second = cache.get_or_compute("quick_recipe_proportion_table", || {
            calls.set(calls.get() + 1);
            proportions()
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(first, second);
        assert_eq!(cache.metrics().cache_hits(), 1);
        assert_eq!(cache.metrics().cache_misses(), 1);
    }

    #[test]
    fn test_empty_result_is_recomputed() {
        let cache = AggregateCache::new(Database::in_memory().expect("store"));
        let calls = Cell::new(0);

        for _ in 0..2 {
            let table = cache.get_or_compute("word_frequencies", || {
                calls.set(calls.get() + 1);
                Table::from_rows(&["word", "frequency"], Vec::new()).expect("valid")
            });
            assert!(table.is_empty());
        }
        assert_eq!(calls.get(), 2);
    }

    struct ReadOnlyStore;

    impl TableStore for ReadOnlyStore {
        fn exists_and_nonempty(&self, _name: &str) -> bool {
            false
        }

        fn load(&self, _name: &str) -> Option<Table> {
            None
        }

        fn save(&self, name: &str, _table: &Table, _mode: SaveMode) -> Result<()> {
            Err(InsightsError::Other(format!("store is read-only: {name}")))
        }
    }

    #[test]
    fn test_failed_write_still_returns_result() {
        let cache = AggregateCache::new(ReadOnlyStore);
        let table = cache.get_or_compute("cuisine_data", proportions);
        assert_eq!(table, proportions());
        assert_eq!(cache.metrics().errors_total(), 1);
    }

    #[test]
    fn test_failed_computation_stores_nothing() {
        let db = Database::in_memory().expect("store");
        let cache = AggregateCache::new(db.clone());
        let result = cache.try_get_or_compute("rating_evolution", || {
            Err(InsightsError::Other("no data".to_string()))
        });
        assert!(result.is_err());
        assert!(db.load("rating_evolution").is_none());
    }
}
