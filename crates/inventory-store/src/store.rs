use async_trait::async_trait;
use common::Identifier;

use crate::{GoodsRow, NewOrder, OrderId, Result};

/// Decision returned by a row-lock body.
pub enum LockDecision<K: Identifier> {
    /// Overwrite the row and insert the order, atomically with the lock
    /// release.
    Commit { row: GoodsRow, order: NewOrder<K> },
    /// Leave the row untouched.
    Abort,
}

/// Outcome of a [`InventoryStore::with_row_lock`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// The body committed; the order was persisted with this ID.
    Committed(OrderId),
    /// The body aborted; `stock` is the value observed under the lock.
    Aborted { stock: u32 },
}

/// Decision closure run while the exclusive row lock is held.
pub type RowLockBody<'a, K> = Box<dyn FnOnce(&GoodsRow) -> LockDecision<K> + Send + 'a>;

/// Core trait for inventory store backends.
///
/// The store is the single consistent authority over the goods row and the
/// order log. Strategies choose which primitives to compose; the store only
/// guarantees the atomicity each primitive documents. All implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore<K: Identifier>: Send + Sync {
    /// Reads the current goods row.
    async fn read_row(&self, goods_id: &K) -> Result<GoodsRow>;

    /// Overwrites the goods row unconditionally.
    ///
    /// No precondition is checked. This is the primitive the unguarded
    /// baseline writes through; correct strategies never call it directly.
    async fn write_row(&self, goods_id: &K, row: GoodsRow) -> Result<()>;

    /// Inserts an order with no coupling to any row mutation.
    async fn insert_order(&self, order: NewOrder<K>) -> Result<OrderId>;

    /// Atomically decrements stock and increments sales by the order
    /// quantity, and inserts the order, iff the current stock equals
    /// `expected_stock` and covers the quantity.
    ///
    /// Returns the number of rows affected: 1 when the update applied,
    /// 0 when the precondition failed (another submission won the race or
    /// stock is short). The order is persisted only in the 1 case.
    async fn conditional_update(
        &self,
        goods_id: &K,
        expected_stock: u32,
        order: NewOrder<K>,
    ) -> Result<u64>;

    /// Runs `body` while holding an exclusive lock on the goods row.
    ///
    /// The lock is released on every exit path. A
    /// [`LockDecision::Commit`] applies the row overwrite and the order
    /// insert atomically before release; [`LockDecision::Abort`] leaves
    /// the store untouched.
    async fn with_row_lock(&self, goods_id: &K, body: RowLockBody<'_, K>) -> Result<LockOutcome>;

    /// Number of persisted orders for the goods row.
    async fn count_orders(&self, goods_id: &K) -> Result<u64>;
}
