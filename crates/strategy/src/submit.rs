//! The three submission disciplines behind one service interface.

use std::marker::PhantomData;
use std::sync::Arc;

use common::Identifier;
use inventory_store::{
    Address, GoodsRow, InventoryStore, LockDecision, LockOutcome, NewOrder, OrderId,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SubmitError};

/// Concurrency-control discipline applied to the shared inventory row.
///
/// Selected once at run-configuration time; all variants share the
/// [`OrderSubmitter::submit_order`] contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Read-compute-write with no guard. Deliberately incorrect baseline
    /// that exhibits lost updates under concurrency.
    Unguarded,
    /// Exclusive row lock around check-and-decrement.
    Pessimistic,
    /// Conditional update keyed on the observed stock, retried on conflict.
    Optimistic,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Unguarded,
        Strategy::Pessimistic,
        Strategy::Optimistic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Unguarded => "unguarded",
            Strategy::Pessimistic => "pessimistic",
            Strategy::Optimistic => "optimistic",
        }
    }

    /// True for the disciplines that guarantee the end-state invariant.
    pub fn is_correct(&self) -> bool {
        !matches!(self, Strategy::Unguarded)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchase attempt against a goods row.
#[derive(Debug, Clone)]
pub struct PurchaseRequest<K: Identifier> {
    pub user_id: K,
    pub goods_id: K,
    pub quantity: u32,
    pub address: Address,
}

/// Default bound on optimistic retries after the initial attempt.
pub const DEFAULT_RETRY_LIMIT: u32 = 16;

/// Order submission service.
///
/// Generic over the store so the same decision logic runs against any
/// backend; the strategy decides which store primitives are composed and
/// with what discipline.
pub struct OrderSubmitter<K: Identifier, S: InventoryStore<K>> {
    store: Arc<S>,
    strategy: Strategy,
    retry_limit: u32,
    _marker: PhantomData<fn() -> K>,
}

impl<K: Identifier, S: InventoryStore<K>> OrderSubmitter<K, S> {
    /// Creates a submitter with the default retry budget.
    pub fn new(store: Arc<S>, strategy: Strategy) -> Self {
        Self {
            store,
            strategy,
            retry_limit: DEFAULT_RETRY_LIMIT,
            _marker: PhantomData,
        }
    }

    /// Overrides the optimistic retry budget.
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Attempts to verify and decrement stock, creating an order on success.
    ///
    /// On success the stock decrement, sales increment, and order creation
    /// committed together (except under [`Strategy::Unguarded`], whose whole
    /// point is that they did not).
    #[tracing::instrument(
        skip(self, request),
        fields(strategy = %self.strategy, goods_id = %request.goods_id)
    )]
    pub async fn submit_order(&self, request: &PurchaseRequest<K>) -> Result<OrderId> {
        match self.strategy {
            Strategy::Unguarded => self.submit_unguarded(request).await,
            Strategy::Pessimistic => self.submit_pessimistic(request).await,
            Strategy::Optimistic => self.submit_optimistic(request).await,
        }
    }

    fn new_order(&self, request: &PurchaseRequest<K>) -> NewOrder<K> {
        NewOrder::new(
            request.user_id.clone(),
            request.goods_id.clone(),
            request.quantity,
            request.address.clone(),
        )
    }

    fn insufficient(request: &PurchaseRequest<K>, remaining: u32) -> SubmitError {
        SubmitError::InsufficientStock {
            goods_id: request.goods_id.to_string(),
            requested: request.quantity,
            remaining,
        }
    }

    /// Reads, decides locally, writes back with no guard. The gap between
    /// the read and the write is the lost-update window.
    async fn submit_unguarded(&self, request: &PurchaseRequest<K>) -> Result<OrderId> {
        let row = self.store.read_row(&request.goods_id).await?;
        if !row.can_fill(request.quantity) {
            return Err(Self::insufficient(request, row.stock));
        }
        let order_id = self.store.insert_order(self.new_order(request)).await?;
        self.store
            .write_row(&request.goods_id, row.filled(request.quantity))
            .await?;
        Ok(order_id)
    }

    /// Check-and-decrement under the store's exclusive row lock.
    async fn submit_pessimistic(&self, request: &PurchaseRequest<K>) -> Result<OrderId> {
        let order = self.new_order(request);
        let quantity = request.quantity;
        let outcome = self
            .store
            .with_row_lock(
                &request.goods_id,
                Box::new(move |row: &GoodsRow| {
                    if row.can_fill(quantity) {
                        LockDecision::Commit {
                            row: row.filled(quantity),
                            order,
                        }
                    } else {
                        LockDecision::Abort
                    }
                }),
            )
            .await?;

        match outcome {
            LockOutcome::Committed(order_id) => Ok(order_id),
            LockOutcome::Aborted { stock } => Err(Self::insufficient(request, stock)),
        }
    }

    /// Conditional update keyed on the stock value just observed; re-reads
    /// and retries on conflict until the budget runs out.
    async fn submit_optimistic(&self, request: &PurchaseRequest<K>) -> Result<OrderId> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let row = self.store.read_row(&request.goods_id).await?;
            if !row.can_fill(request.quantity) {
                return Err(Self::insufficient(request, row.stock));
            }

            let order = self.new_order(request);
            let order_id = order.order_id;
            let affected = self
                .store
                .conditional_update(&request.goods_id, row.stock, order)
                .await?;
            if affected == 1 {
                return Ok(order_id);
            }

            if attempts > self.retry_limit {
                tracing::debug!(
                    goods_id = %request.goods_id,
                    attempts,
                    "optimistic retry budget exhausted"
                );
                return Err(SubmitError::Conflict {
                    goods_id: request.goods_id.to_string(),
                    attempts,
                });
            }
        }
    }
}
