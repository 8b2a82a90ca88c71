//! Matching engine for a single-instrument continuous double auction
//!
//! Maintains a price-time-priority limit order book, executes crossing
//! and trade generation, and keeps per-account positions. Matching is
//! decoupled from transport: every match surfaces as a `Fill` record the
//! caller fans out to order-entry sessions and the depth feed.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced; trades execute at the
//!   maker's price
//! - The uid map exclusively owns every order; levels and account sets
//!   hold uid handles only
//! - Shares and capital are conserved: every fill credits and debits two
//!   counterparties symmetrically

pub mod accounts;
pub mod book;
pub mod errors;
pub mod events;

pub use accounts::{Account, AccountId, AccountRegistry};
pub use book::{LimitOrderBook, LimitResult, Order};
pub use errors::BookError;
pub use events::Fill;
