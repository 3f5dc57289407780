//! The barrier-synchronized submission harness.

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::Identifier;
use inventory_store::{InventoryStore, OrderId};
use strategy::{OrderSubmitter, PurchaseRequest, SubmitError};
use tokio::sync::{Barrier, mpsc};

use crate::assignment::WorkAssignment;
use crate::config::RunConfig;
use crate::error::{HarnessError, Result};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Record of a single submission attempt. Written once by the worker
/// that made the attempt and never mutated afterwards.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub worker: usize,
    pub order_id: Option<OrderId>,
    pub error: Option<SubmitError>,
    pub latency: Duration,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate result of one harness run.
#[derive(Debug)]
pub struct RunReport {
    /// Wall-clock window from gate release to the last outcome.
    pub duration: Duration,
    /// `duration / total_submissions`.
    pub avg_latency_nanos: u64,
    /// Derived as one second over the average latency.
    pub throughput_per_sec: u64,
    pub success_count: usize,
    pub failure_count: usize,
    pub outcomes: Vec<SubmissionOutcome>,
}

/// Runs `config.total_submissions` attempts against `store` with a fixed
/// pool of worker tasks.
///
/// All workers block on a start barrier until the orchestrator releases
/// them together, so the measured window covers only contended work. Each
/// worker performs its assigned attempts sequentially, recording failures
/// as outcomes without aborting its loop. The run completes when every
/// attempt has reported exactly one outcome.
pub async fn run<K, S>(
    config: &RunConfig,
    store: Arc<S>,
    request: PurchaseRequest<K>,
) -> Result<RunReport>
where
    K: Identifier,
    S: InventoryStore<K> + 'static,
{
    config.validate()?;

    let assignment = WorkAssignment::new(config.total_submissions, config.thread_count);
    let submitter = Arc::new(
        OrderSubmitter::new(store, config.strategy).with_retry_limit(config.retry_limit),
    );
    let barrier = Arc::new(Barrier::new(config.thread_count + 1));
    let (outcome_tx, mut outcome_rx) = mpsc::channel(config.total_submissions);

    let mut workers = Vec::with_capacity(config.thread_count);
    for worker in 0..config.thread_count {
        let submitter = Arc::clone(&submitter);
        let barrier = Arc::clone(&barrier);
        let outcome_tx = outcome_tx.clone();
        let request = request.clone();
        let attempts = assignment.count_for(worker);

        workers.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..attempts {
                let started = Instant::now();
                let result = submitter.submit_order(&request).await;
                let latency = started.elapsed();
                let outcome = match result {
                    Ok(order_id) => SubmissionOutcome {
                        worker,
                        order_id: Some(order_id),
                        error: None,
                        latency,
                    },
                    Err(error) => SubmissionOutcome {
                        worker,
                        order_id: None,
                        error: Some(error),
                        latency,
                    },
                };
                // The receiver outlives the run; a send failure means the
                // orchestrator is gone and there is nothing left to record.
                if outcome_tx.send(outcome).await.is_err() {
                    return;
                }
            }
        }));
    }
    drop(outcome_tx);

    let strategy_label = config.strategy.as_str();
    let started = Instant::now();
    barrier.wait().await;

    let mut outcomes = Vec::with_capacity(config.total_submissions);
    let mut success_count = 0;
    while let Some(outcome) = outcome_rx.recv().await {
        let result_label = match &outcome.error {
            None => "success",
            Some(error) => error.kind(),
        };
        metrics::counter!(
            "oversell_bench_submissions_total",
            "strategy" => strategy_label,
            "result" => result_label
        )
        .increment(1);
        metrics::histogram!(
            "oversell_bench_submission_latency_nanos",
            "strategy" => strategy_label
        )
        .record(outcome.latency.as_nanos() as f64);

        if outcome.is_success() {
            success_count += 1;
        }
        outcomes.push(outcome);
    }
    let duration = started.elapsed();

    for (worker, handle) in workers.into_iter().enumerate() {
        handle
            .await
            .map_err(|_| HarnessError::WorkerPanic { worker })?;
    }
    if outcomes.len() != config.total_submissions {
        // Every worker joined cleanly, so a shortfall can only mean a
        // worker bailed out on a closed channel.
        return Err(HarnessError::WorkerPanic {
            worker: config.thread_count,
        });
    }

    let avg_latency_nanos = (duration.as_nanos() / config.total_submissions as u128) as u64;
    let throughput_per_sec = NANOS_PER_SECOND / avg_latency_nanos.max(1);
    let failure_count = outcomes.len() - success_count;

    tracing::info!(
        strategy = strategy_label,
        thread_count = config.thread_count,
        total_submissions = config.total_submissions,
        avg_latency_nanos,
        throughput_per_sec,
        success_count,
        failure_count,
        "run complete"
    );

    Ok(RunReport {
        duration,
        avg_latency_nanos,
        throughput_per_sec,
        success_count,
        failure_count,
        outcomes,
    })
}
