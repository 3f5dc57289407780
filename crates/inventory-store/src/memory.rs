use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::Identifier;
use tokio::sync::{Mutex, RwLock};

use crate::{
    GoodsRow, NewOrder, OrderId, OrderRecord, Result, StoreError,
    store::{InventoryStore, LockDecision, LockOutcome, RowLockBody},
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// In-memory inventory store.
///
/// Each goods row sits behind its own mutex, which doubles as the row lock.
/// `read_row` and `write_row` hold that mutex only for the single operation,
/// so a read-compute-write sequence issued through them has a genuine
/// unguarded window.
#[derive(Clone)]
pub struct InMemoryInventoryStore<K: Identifier> {
    rows: Arc<RwLock<HashMap<K, Arc<Mutex<GoodsRow>>>>>,
    orders: Arc<RwLock<Vec<OrderRecord<K>>>>,
    lock_timeout: Duration,
}

impl<K: Identifier> Default for InMemoryInventoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Identifier> InMemoryInventoryStore<K> {
    /// Creates an empty store with the default 5s lock timeout.
    pub fn new() -> Self {
        Self {
            rows: Arc::default(),
            orders: Arc::default(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Overrides the bound on row-lock acquisition.
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Creates or resets a goods row.
    pub async fn seed_goods(&self, goods_id: K, stock: u32, sales: u32) {
        self.rows
            .write()
            .await
            .insert(goods_id, Arc::new(Mutex::new(GoodsRow::new(stock, sales))));
    }

    /// Total number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all rows and orders.
    pub async fn clear(&self) {
        self.rows.write().await.clear();
        self.orders.write().await.clear();
    }

    async fn row_handle(&self, goods_id: &K) -> Result<Arc<Mutex<GoodsRow>>> {
        self.rows
            .read()
            .await
            .get(goods_id)
            .cloned()
            .ok_or_else(|| StoreError::RowNotFound(goods_id.to_string()))
    }
}

#[async_trait]
impl<K: Identifier> InventoryStore<K> for InMemoryInventoryStore<K> {
    async fn read_row(&self, goods_id: &K) -> Result<GoodsRow> {
        let handle = self.row_handle(goods_id).await?;
        let row = *handle.lock().await;
        Ok(row)
    }

    async fn write_row(&self, goods_id: &K, row: GoodsRow) -> Result<()> {
        let handle = self.row_handle(goods_id).await?;
        *handle.lock().await = row;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder<K>) -> Result<OrderId> {
        let order_id = order.order_id;
        self.orders.write().await.push(OrderRecord::from_new(order));
        Ok(order_id)
    }

    async fn conditional_update(
        &self,
        goods_id: &K,
        expected_stock: u32,
        order: NewOrder<K>,
    ) -> Result<u64> {
        let handle = self.row_handle(goods_id).await?;
        let mut row = handle.lock().await;
        if row.stock != expected_stock || !row.can_fill(order.quantity) {
            return Ok(0);
        }
        *row = row.filled(order.quantity);
        // The row mutex is still held, so the order insert commits together
        // with the decrement as far as any other row access can observe.
        self.orders.write().await.push(OrderRecord::from_new(order));
        Ok(1)
    }

    async fn with_row_lock(&self, goods_id: &K, body: RowLockBody<'_, K>) -> Result<LockOutcome> {
        let handle = self.row_handle(goods_id).await?;
        let mut row = tokio::time::timeout(self.lock_timeout, handle.lock())
            .await
            .map_err(|_| {
                tracing::warn!(goods_id = %goods_id, timeout = ?self.lock_timeout, "row lock wait timed out");
                StoreError::LockTimeout {
                    goods_id: goods_id.to_string(),
                }
            })?;

        match body(&row) {
            LockDecision::Commit { row: new_row, order } => {
                let order_id = order.order_id;
                *row = new_row;
                self.orders.write().await.push(OrderRecord::from_new(order));
                Ok(LockOutcome::Committed(order_id))
            }
            LockDecision::Abort => Ok(LockOutcome::Aborted { stock: row.stock }),
        }
    }

    async fn count_orders(&self, goods_id: &K) -> Result<u64> {
        let orders = self.orders.read().await;
        Ok(orders.iter().filter(|o| &o.goods_id == goods_id).count() as u64)
    }
}
