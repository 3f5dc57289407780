//! Benchmark entry point: runs the strategy × identifier-kind matrix
//! against the in-memory store and logs throughput and validation
//! verdicts.

use std::sync::Arc;

use common::{Id32, Id64, Identifier, OpaqueId};
use harness::{BenchConfig, BenchmarkSample, MetricsAggregator, ValidationError, run, validate_run};
use inventory_store::{Address, GoodsRow, InMemoryInventoryStore};
use strategy::{PurchaseRequest, Strategy};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn bench_cell<K: Identifier>(
    bench: &BenchConfig,
    strategy: Strategy,
    user_id: K,
    goods_id: K,
    aggregator: &mut MetricsAggregator,
) {
    let store = Arc::new(InMemoryInventoryStore::new());
    store
        .seed_goods(goods_id.clone(), bench.initial_stock, 0)
        .await;
    let initial = GoodsRow::new(bench.initial_stock, 0);

    let config = bench.run_config(strategy);
    let request = PurchaseRequest {
        user_id,
        goods_id: goods_id.clone(),
        quantity: bench.quantity,
        address: Address::new("18800000000", "bench", "1 benchmark way"),
    };

    let report = match run(&config, Arc::clone(&store), request).await {
        Ok(report) => report,
        Err(error) => {
            tracing::error!(%strategy, identifier = %K::KIND, %error, "run failed");
            return;
        }
    };

    let sample = BenchmarkSample::from_report(strategy, K::KIND, &report);
    tracing::info!(
        strategy = %sample.strategy,
        identifier = %sample.identifier,
        avg_latency_nanos = sample.avg_latency_nanos,
        throughput_per_sec = sample.throughput_per_sec,
        success = report.success_count,
        failure = report.failure_count,
        "sample recorded"
    );
    aggregator.record(sample);

    match validate_run(store.as_ref(), &goods_id, initial, &config).await {
        Ok(validation) => {
            tracing::info!(
                %strategy,
                identifier = %K::KIND,
                final_stock = validation.final_row.stock,
                final_sales = validation.final_row.sales,
                orders = validation.orders,
                "end state validated"
            );
        }
        // The defect is timing-dependent; a clean unguarded run is worth
        // noting but not worth crashing over.
        Err(ValidationError::LostUpdateNotReproduced { expected_stock }) => {
            tracing::warn!(
                %strategy,
                identifier = %K::KIND,
                expected_stock,
                "unguarded run came out exact; lost update not reproduced"
            );
        }
        Err(error) => {
            tracing::error!(%strategy, identifier = %K::KIND, %error, "validation failed");
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let bench = BenchConfig::from_env();
    if let Err(error) = bench.run_config(Strategy::Optimistic).validate() {
        tracing::error!(%error, "refusing to start");
        std::process::exit(1);
    }
    tracing::info!(
        threads = bench.threads,
        submissions = bench.submissions,
        quantity = bench.quantity,
        initial_stock = bench.initial_stock,
        "starting benchmark matrix"
    );

    let mut aggregator = MetricsAggregator::new();
    for strategy in Strategy::ALL {
        bench_cell(&bench, strategy, Id32::new(9), Id32::new(1), &mut aggregator).await;
        bench_cell(&bench, strategy, Id64::new(9), Id64::new(1), &mut aggregator).await;
        bench_cell(
            &bench,
            strategy,
            OpaqueId::random(),
            OpaqueId::random(),
            &mut aggregator,
        )
        .await;
    }

    tracing::info!(samples = aggregator.len(), "benchmark matrix complete");
}
