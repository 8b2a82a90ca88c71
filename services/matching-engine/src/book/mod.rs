//! Order book infrastructure module
//!
//! Contains the order storage, price levels, the per-side price ladder,
//! and the matching book itself.

pub mod ladder;
pub mod order;
pub mod order_book;
pub mod price_level;
pub mod side;

pub use ladder::Ladder;
pub use order::{Order, OrderMap, NIL};
pub use order_book::{LimitOrderBook, LimitResult};
pub use price_level::PriceLevel;
pub use side::{BookSide, MARKET_PRICE};
