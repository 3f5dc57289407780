pub mod error;
pub mod submit;

pub use error::{Result, SubmitError};
pub use submit::{DEFAULT_RETRY_LIMIT, OrderSubmitter, PurchaseRequest, Strategy};
