//! Run and binary configuration.

use serde::{Deserialize, Serialize};
use strategy::{DEFAULT_RETRY_LIMIT, Strategy};

use crate::error::{HarnessError, Result};

/// Parameters for one harness run.
///
/// Validated before any worker starts; a rejected config never touches
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of concurrent workers.
    pub thread_count: usize,
    /// Total submission attempts distributed over the workers.
    pub total_submissions: usize,
    pub strategy: Strategy,
    /// Units of stock each attempt tries to claim.
    pub quantity_per_order: u32,
    /// Optimistic retry budget; ignored by the other strategies.
    pub retry_limit: u32,
}

impl RunConfig {
    pub fn new(thread_count: usize, total_submissions: usize, strategy: Strategy) -> Self {
        Self {
            thread_count,
            total_submissions,
            strategy,
            quantity_per_order: 1,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }

    pub fn with_quantity(mut self, quantity_per_order: u32) -> Self {
        self.quantity_per_order = quantity_per_order;
        self
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Rejects parameter combinations the harness cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(HarnessError::InvalidParameter(
                "thread_count must be at least 1".to_string(),
            ));
        }
        if self.total_submissions == 0 {
            return Err(HarnessError::InvalidParameter(
                "total_submissions must be at least 1".to_string(),
            ));
        }
        if self.thread_count > self.total_submissions {
            return Err(HarnessError::InvalidParameter(format!(
                "thread_count {} exceeds total_submissions {}",
                self.thread_count, self.total_submissions
            )));
        }
        if self.quantity_per_order == 0 {
            return Err(HarnessError::InvalidParameter(
                "quantity_per_order must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Benchmark matrix parameters with sensible defaults.
///
/// Reads from environment variables:
/// - `BENCH_THREADS` — concurrent workers per run (default: `8`)
/// - `BENCH_SUBMISSIONS` — attempts per run (default: `321`)
/// - `BENCH_QUANTITY` — units per attempt (default: `1`)
/// - `BENCH_INITIAL_STOCK` — seeded stock per run (default: `321`)
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub threads: usize,
    pub submissions: usize,
    pub quantity: u32,
    pub initial_stock: u32,
}

impl BenchConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            threads: env_or("BENCH_THREADS", 8),
            submissions: env_or("BENCH_SUBMISSIONS", 321),
            quantity: env_or("BENCH_QUANTITY", 1),
            initial_stock: env_or("BENCH_INITIAL_STOCK", 321),
        }
    }

    pub fn run_config(&self, strategy: Strategy) -> RunConfig {
        RunConfig::new(self.threads, self.submissions, strategy).with_quantity(self.quantity)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            submissions: 321,
            quantity: 1,
            initial_stock: 321,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = BenchConfig::default();
        assert_eq!(config.threads, 8);
        assert_eq!(config.submissions, 321);
        assert_eq!(config.quantity, 1);
        assert_eq!(config.initial_stock, 321);
    }

    #[test]
    fn run_config_carries_matrix_parameters() {
        let bench = BenchConfig::default();
        let run = bench.run_config(Strategy::Optimistic);
        assert_eq!(run.thread_count, 8);
        assert_eq!(run.total_submissions, 321);
        assert_eq!(run.quantity_per_order, 1);
        assert_eq!(run.strategy, Strategy::Optimistic);
        run.validate().unwrap();
    }

    #[test]
    fn zero_threads_rejected() {
        let config = RunConfig::new(0, 10, Strategy::Pessimistic);
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidParameter(_))
        ));
    }

    #[test]
    fn more_threads_than_submissions_rejected() {
        let config = RunConfig::new(9, 8, Strategy::Pessimistic);
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidParameter(_))
        ));
    }

    #[test]
    fn zero_quantity_rejected() {
        let config = RunConfig::new(1, 1, Strategy::Optimistic).with_quantity(0);
        assert!(matches!(
            config.validate(),
            Err(HarnessError::InvalidParameter(_))
        ));
    }

    #[test]
    fn single_worker_single_submission_is_valid() {
        RunConfig::new(1, 1, Strategy::Unguarded).validate().unwrap();
    }
}
