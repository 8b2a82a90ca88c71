//! Order records and the uid map that owns them
//!
//! The book owns every `Order` exclusively through the uid map. All other
//! references (the level FIFO links and the account order sets) are plain
//! uid handles whose lifetime is dominated by the map entry. FIFO links
//! use uid 0 as the null sentinel, which is safe because uids start at 1.

use crate::accounts::AccountId;
use std::collections::HashMap;
use types::prelude::{OrderId, Price, Quantity, Side};

/// Null link sentinel for the intrusive FIFO (uids start at 1)
pub const NIL: OrderId = 0;

/// A single order resting in (or matching against) the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// the day-unique id for this order
    pub uid: OrderId,
    /// buy or sell
    pub side: Side,
    /// remaining open quantity
    pub quantity: Quantity,
    /// the limit price (0 for a market order)
    pub price: Price,
    /// the account this order belongs to
    pub account: AccountId,
    /// previous order in the price level's FIFO
    pub(crate) prev: OrderId,
    /// next order in the price level's FIFO
    pub(crate) next: OrderId,
}

impl Order {
    /// Create a new unlinked order
    pub fn new(
        uid: OrderId,
        side: Side,
        quantity: Quantity,
        price: Price,
        account: AccountId,
    ) -> Self {
        Self {
            uid,
            side,
            quantity,
            price,
            account,
            prev: NIL,
            next: NIL,
        }
    }
}

/// Exclusive owner of all order storage, keyed by uid
pub type OrderMap = HashMap<OrderId, Order>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountRegistry;

    #[test]
    fn test_new_order_is_unlinked() {
        let mut registry = AccountRegistry::new();
        let account = registry.create();
        let order = Order::new(1, Side::Buy, 100, 250, account);
        assert_eq!(order.prev, NIL);
        assert_eq!(order.next, NIL);
        assert_eq!(order.quantity, 100);
    }
}
