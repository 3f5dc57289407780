pub mod error;
pub mod memory;
pub mod postgres;
pub mod row;
pub mod store;

pub use common::{Id32, Id64, Identifier, IdentifierKind, OpaqueId};
pub use error::{Result, StoreError};
pub use memory::InMemoryInventoryStore;
pub use postgres::{PgIdentifier, PostgresInventoryStore};
pub use row::{Address, GoodsRow, NewOrder, OrderId, OrderRecord};
pub use store::{InventoryStore, LockDecision, LockOutcome, RowLockBody};
