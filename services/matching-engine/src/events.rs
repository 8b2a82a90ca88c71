//! Fill events emitted by the matching loop
//!
//! Matching is decoupled from transport: the book emits one `Fill` per
//! maker/taker match and the caller translates it into trade reports for
//! the owning sessions and a trade message on the depth feed.

use crate::accounts::AccountId;
use types::prelude::{OrderId, Price, Quantity, Side};

/// One match between a resting maker order and an incoming taker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    /// id of the resting order that provided liquidity
    pub maker: OrderId,
    /// account that owns the maker order
    pub maker_account: AccountId,
    /// quantity left on the maker order after this fill (0 = consumed)
    pub maker_leaves: Quantity,
    /// id of the incoming order, `None` for a pure market order
    pub taker: Option<OrderId>,
    /// account that owns the taker order
    pub taker_account: AccountId,
    /// quantity left on the taker after this fill (0 = done)
    pub taker_leaves: Quantity,
    /// side of the incoming (liquidity-removing) order
    pub taker_side: Side,
    /// execution price, always the maker's limit price
    pub price: Price,
    /// number of shares exchanged
    pub quantity: Quantity,
}

impl Fill {
    /// Side of the resting order
    pub fn maker_side(&self) -> Side {
        self.taker_side.opposite()
    }

    /// True when this fill consumed the maker order entirely
    pub fn maker_consumed(&self) -> bool {
        self.maker_leaves == 0
    }

    /// True when this fill completed the taker
    pub fn taker_done(&self) -> bool {
        self.taker_leaves == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountRegistry;

    #[test]
    fn test_fill_helpers() {
        let mut registry = AccountRegistry::new();
        let maker_account = registry.create();
        let taker_account = registry.create();
        let fill = Fill {
            maker: 1,
            maker_account,
            maker_leaves: 0,
            taker: Some(2),
            taker_account,
            taker_leaves: 40,
            taker_side: Side::Sell,
            price: 100,
            quantity: 60,
        };
        assert_eq!(fill.maker_side(), Side::Buy);
        assert!(fill.maker_consumed());
        assert!(!fill.taker_done());
    }
}
