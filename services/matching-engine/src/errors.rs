//! Error types for the order book

use thiserror::Error;
use types::prelude::{OrderId, Quantity};

/// Order book operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("unknown order: {uid}")]
    UnknownOrder { uid: OrderId },

    #[error("cannot reduce order {uid} by {requested}: only {available} open")]
    InsufficientQuantity {
        uid: OrderId,
        requested: Quantity,
        available: Quantity,
    },
}
