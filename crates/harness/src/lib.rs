pub mod aggregator;
pub mod assignment;
pub mod config;
pub mod error;
pub mod run;
pub mod validator;

pub use aggregator::{BenchmarkSample, MetricsAggregator};
pub use assignment::WorkAssignment;
pub use config::{BenchConfig, RunConfig};
pub use error::{HarnessError, Result, ValidationError};
pub use run::{RunReport, SubmissionOutcome, run};
pub use validator::{ValidationReport, validate_run};
