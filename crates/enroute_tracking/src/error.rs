use thiserror::Error;

use crate::{order::OrderId, store::StoreError};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Caller is not the driver assigned to order {0}")]
    Forbidden(OrderId),

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    #[error("Dependency failure: {0}")]
    Dependency(#[from] StoreError),
}
