pub mod types;

pub use types::{Id32, Id64, Identifier, IdentifierKind, OpaqueId};
