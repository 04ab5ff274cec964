//! Per-column cardinality profiling.

use mf_core::config::ProfilerConfig;
use mf_core::ColumnProfile;
use mf_db::{DbResult, Engine, TableMetadata};

/// Classifies columns as low- or high-cardinality
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
}

impl ColumnProfiler {
    pub fn new(config: ProfilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profile one column.
    ///
    /// A sample longer than `max_sample_length` characters short-circuits to
    /// high cardinality without querying statistics. Engine errors are
    /// returned unchanged; the caller decides whether they are fatal.
    pub async fn profile(
        &self,
        engine: &dyn Engine,
        table: &TableMetadata,
        column: &str,
    ) -> DbResult<ColumnProfile> {
        let sample = engine.sample_value(table, column).await?;
        if let Some(sample) = &sample {
            if sample.chars().count() > self.config.max_sample_length {
                log::debug!(
                    "{}.{}: sample exceeds {} chars, treating as high cardinality",
                    table.name,
                    column,
                    self.config.max_sample_length
                );
                return Ok(ColumnProfile::high());
            }
        }

        let stats = engine.column_statistics(table, column).await?;
        let low = stats.distinct_estimate.is_some_and(|n| {
            n >= 0 && (self.config.min_distinct..=self.config.max_distinct).contains(&(n as u64))
        });
        if low {
            Ok(ColumnProfile::low(stats.most_common_values))
        } else {
            Ok(ColumnProfile::high())
        }
    }
}

#[cfg(test)]
#[path = "profiler_test.rs"]
mod tests;
