use std::sync::Arc;

use common::{Id32, Id64, Identifier, OpaqueId};
use criterion::{Criterion, criterion_group, criterion_main};
use inventory_store::{Address, InMemoryInventoryStore};
use strategy::{OrderSubmitter, PurchaseRequest, Strategy};

fn request<K: Identifier>(user_id: K, goods_id: K) -> PurchaseRequest<K> {
    PurchaseRequest {
        user_id,
        goods_id,
        quantity: 1,
        address: Address::new("18800000000", "bench", "1 benchmark way"),
    }
}

fn bench_submit_uncontended(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let goods = Id64::new(1);

    for strategy in Strategy::ALL {
        c.bench_function(&format!("submit/{strategy}/uncontended"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let store = Arc::new(InMemoryInventoryStore::new());
                    store.seed_goods(goods, 1, 0).await;
                    let submitter = OrderSubmitter::new(store, strategy);
                    submitter
                        .submit_order(&request(Id64::new(9), goods))
                        .await
                        .unwrap();
                });
            });
        });
    }
}

fn bench_submit_contended_8(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(8)
        .build()
        .unwrap();
    let goods = Id64::new(1);

    for strategy in [Strategy::Pessimistic, Strategy::Optimistic] {
        c.bench_function(&format!("submit/{strategy}/contended_8"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let store = Arc::new(InMemoryInventoryStore::new());
                    store.seed_goods(goods, 8, 0).await;
                    let submitter = Arc::new(
                        OrderSubmitter::new(Arc::clone(&store), strategy).with_retry_limit(10_000),
                    );

                    let mut handles = Vec::with_capacity(8);
                    for i in 0..8 {
                        let submitter = Arc::clone(&submitter);
                        handles.push(tokio::spawn(async move {
                            submitter
                                .submit_order(&request(Id64::new(i), goods))
                                .await
                                .unwrap();
                        }));
                    }
                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            });
        });
    }
}

fn bench_key_representations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("submit/optimistic/key_int32", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Arc::new(InMemoryInventoryStore::new());
                let goods = Id32::new(1);
                store.seed_goods(goods, 1, 0).await;
                let submitter = OrderSubmitter::new(store, Strategy::Optimistic);
                submitter
                    .submit_order(&request(Id32::new(9), goods))
                    .await
                    .unwrap();
            });
        });
    });

    c.bench_function("submit/optimistic/key_opaque_string", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = Arc::new(InMemoryInventoryStore::new());
                let goods = OpaqueId::random();
                store.seed_goods(goods.clone(), 1, 0).await;
                let submitter = OrderSubmitter::new(store, Strategy::Optimistic);
                submitter
                    .submit_order(&request(OpaqueId::random(), goods.clone()))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_submit_uncontended,
    bench_submit_contended_8,
    bench_key_representations,
);
criterion_main!(benches);
