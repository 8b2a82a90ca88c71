//! Scalar type aliases for prices, quantities, and identifiers
//!
//! Prices are integer ticks (u64) and quantities are share counts (u32),
//! matching the wire protocols exactly. Position balances are signed so
//! accounts can run short or on margin.

/// A limit or execution price in integer ticks
pub type Price = u64;

/// An order quantity in shares
pub type Quantity = u32;

/// Aggregated open volume (sum of quantities) at a level or side
pub type Volume = u64;

/// A count of resting orders at a level or side
pub type Count = u32;

/// A day-unique order identifier, monotonic per engine lifetime.
/// The value 0 is reserved as the market-order / rejected sentinel.
pub type OrderId = u64;

/// A per-channel message sequence number
pub type SequenceNumber = u32;

/// A signed share balance
pub type Shares = i64;

/// A signed capital balance
pub type Capital = i64;
