//! Row and order types shared by every store backend.

use chrono::{DateTime, Utc};
use common::Identifier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The shared inventory row.
///
/// Every committed submission moves quantity from `stock` to `sales`, so
/// `stock + sales` is constant across the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsRow {
    pub stock: u32,
    pub sales: u32,
}

impl GoodsRow {
    pub fn new(stock: u32, sales: u32) -> Self {
        Self { stock, sales }
    }

    /// Sum of stock and sales, the quantity that must not drift.
    pub fn total(&self) -> u64 {
        u64::from(self.stock) + u64::from(self.sales)
    }

    /// True when the remaining stock covers `quantity`.
    pub fn can_fill(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }

    /// Row state after granting `quantity` units. Callers check
    /// [`can_fill`](Self::can_fill) first.
    pub fn filled(&self, quantity: u32) -> GoodsRow {
        debug_assert!(self.can_fill(quantity));
        GoodsRow {
            stock: self.stock - quantity,
            sales: self.sales + quantity,
        }
    }
}

/// Unique identifier for a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shipping address captured on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub mobile: String,
    pub name: String,
    pub detail: String,
}

impl Address {
    pub fn new(
        mobile: impl Into<String>,
        name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            mobile: mobile.into(),
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// An order about to be committed alongside a stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder<K: Identifier> {
    pub order_id: OrderId,
    pub user_id: K,
    pub goods_id: K,
    pub quantity: u32,
    pub address: Address,
}

impl<K: Identifier> NewOrder<K> {
    /// Builds an order with a freshly generated ID.
    pub fn new(user_id: K, goods_id: K, quantity: u32, address: Address) -> Self {
        Self {
            order_id: OrderId::new(),
            user_id,
            goods_id,
            quantity,
            address,
        }
    }
}

/// A persisted order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord<K: Identifier> {
    pub order_id: OrderId,
    pub user_id: K,
    pub goods_id: K,
    pub quantity: u32,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl<K: Identifier> OrderRecord<K> {
    pub fn from_new(order: NewOrder<K>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            goods_id: order.goods_id,
            quantity: order.quantity,
            address: order.address,
            created_at: Utc::now(),
        }
    }
}
