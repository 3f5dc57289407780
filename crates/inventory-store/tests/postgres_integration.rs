//! PostgreSQL backend integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p inventory-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{Id32, Id64, OpaqueId};
use inventory_store::{
    Address, GoodsRow, InventoryStore, LockDecision, LockOutcome, NewOrder, PgIdentifier,
    PostgresInventoryStore, StoreError,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: Option<ContainerAsync<Postgres>>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            // TEST_PG_URL points at an externally managed PostgreSQL for
            // environments without Docker; otherwise start a container.
            if let Ok(connection_string) = std::env::var("TEST_PG_URL") {
                return Arc::new(ContainerInfo {
                    container: None,
                    connection_string,
                });
            }

            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            Arc::new(ContainerInfo {
                container: Some(container),
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and empty tables
async fn get_test_store<K: PgIdentifier>() -> PostgresInventoryStore<K> {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(16)
        .connect(&info.connection_string)
        .await
        .unwrap();

    let store = PostgresInventoryStore::<K>::new(pool);
    store.create_schema().await.unwrap();
    store.truncate().await.unwrap();
    store
}

fn address() -> Address {
    Address::new("18800000000", "tester", "nowhere in particular")
}

#[tokio::test]
async fn seed_and_read_i32_keys() {
    let store = get_test_store::<Id32>().await;
    let goods = Id32::new(1);
    store.seed_goods(&goods, 321, 0).await.unwrap();
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(321, 0));
}

#[tokio::test]
async fn seed_and_read_i64_keys() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 321, 5).await.unwrap();
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(321, 5));
}

#[tokio::test]
async fn seed_and_read_opaque_keys() {
    let store = get_test_store::<OpaqueId>().await;
    let goods = OpaqueId::new("00000000-0000-0000-0000-000000000001");
    store.seed_goods(&goods, 7, 0).await.unwrap();
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(7, 0));
}

#[tokio::test]
async fn missing_row_is_reported() {
    let store = get_test_store::<Id64>().await;
    let err = store.read_row(&Id64::new(404)).await.unwrap_err();
    assert!(matches!(err, StoreError::RowNotFound(_)));
}

#[tokio::test]
async fn write_row_overwrites_unconditionally() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 10, 0).await.unwrap();

    store.write_row(&goods, GoodsRow::new(3, 7)).await.unwrap();
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(3, 7));
}

#[tokio::test]
async fn conditional_update_wins_and_loses() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 10, 0).await.unwrap();

    let order = NewOrder::new(Id64::new(9), goods, 2, address());
    let affected = store.conditional_update(&goods, 10, order).await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(8, 2));
    assert_eq!(store.count_orders(&goods).await.unwrap(), 1);

    // Stale expectation: stock is 8 now, not 10.
    let order = NewOrder::new(Id64::new(9), goods, 2, address());
    let affected = store.conditional_update(&goods, 10, order).await.unwrap();
    assert_eq!(affected, 0);
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(8, 2));
    assert_eq!(store.count_orders(&goods).await.unwrap(), 1);
}

#[tokio::test]
async fn conditional_update_never_drives_stock_negative() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 1, 0).await.unwrap();

    let order = NewOrder::new(Id64::new(9), goods, 2, address());
    let affected = store.conditional_update(&goods, 1, order).await.unwrap();
    assert_eq!(affected, 0);
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(1, 0));
}

#[tokio::test]
async fn row_lock_commit_persists_row_and_order_together() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 5, 0).await.unwrap();

    let order = NewOrder::new(Id64::new(9), goods, 1, address());
    let expected_id = order.order_id;
    let outcome = store
        .with_row_lock(
            &goods,
            Box::new(move |row| LockDecision::Commit {
                row: row.filled(1),
                order,
            }),
        )
        .await
        .unwrap();

    assert_eq!(outcome, LockOutcome::Committed(expected_id));
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(4, 1));
    assert_eq!(store.count_orders(&goods).await.unwrap(), 1);
}

#[tokio::test]
async fn row_lock_abort_rolls_back() {
    let store = get_test_store::<Id64>().await;
    let goods = Id64::new(1);
    store.seed_goods(&goods, 0, 5).await.unwrap();

    let outcome = store
        .with_row_lock(&goods, Box::new(|_| LockDecision::Abort))
        .await
        .unwrap();

    assert_eq!(outcome, LockOutcome::Aborted { stock: 0 });
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(0, 5));
    assert_eq!(store.count_orders(&goods).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_conditional_updates_drain_exactly() {
    let store = Arc::new(get_test_store::<Id64>().await);
    let goods = Id64::new(1);
    store.seed_goods(&goods, 50, 0).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            // Retry-on-conflict decrement of a single unit.
            loop {
                let row = store.read_row(&goods).await.unwrap();
                if !row.can_fill(1) {
                    return false;
                }
                let order = NewOrder::new(Id64::new(9), goods, 1, address());
                if store
                    .conditional_update(&goods, row.stock, order)
                    .await
                    .unwrap()
                    == 1
                {
                    return true;
                }
            }
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            granted += 1;
        }
    }

    assert_eq!(granted, 20);
    assert_eq!(store.read_row(&goods).await.unwrap(), GoodsRow::new(30, 20));
    assert_eq!(store.count_orders(&goods).await.unwrap(), 20);
}
