//! One side of the book: resting liquidity plus the matching loop
//!
//! `BookSide` wraps the price ladder with the three operations the book
//! routes to it: rest a limit order, cancel a resting order, and consume
//! liquidity with an incoming taker. Matching walks the best level's FIFO
//! head-first and always executes at the resting (maker) order's price.

use super::ladder::Ladder;
use super::order::{Order, OrderMap};
use crate::accounts::AccountRegistry;
use crate::events::Fill;
use types::prelude::{Count, OrderId, Price, Quantity, Side, Volume};

/// Sentinel price marking a market order (no limit bound)
pub const MARKET_PRICE: Price = 0;

/// One side of the limit order book
#[derive(Debug)]
pub struct BookSide {
    ladder: Ladder,
}

impl BookSide {
    /// Create an empty side
    pub fn new(side: Side) -> Self {
        Self {
            ladder: Ladder::new(side),
        }
    }

    /// The side this book half holds
    pub fn side(&self) -> Side {
        self.ladder.side()
    }

    /// Read access to the price ladder
    pub fn ladder(&self) -> &Ladder {
        &self.ladder
    }

    /// Best resting price, `None` when this side is empty
    pub fn best(&self) -> Option<Price> {
        self.ladder.best()
    }

    /// Total open volume on this side
    pub fn volume(&self) -> Volume {
        self.ladder.volume()
    }

    /// Total resting order count on this side
    pub fn count(&self) -> Count {
        self.ladder.count()
    }

    /// True when an incoming opposite-side limit at `price` would match
    /// against this side's best level.
    pub fn crossed_by(&self, price: Price) -> bool {
        match self.best() {
            Some(best) => match self.side() {
                // resting sells match a buy bidding at or above the best ask
                Side::Sell => price >= best,
                // resting buys match a sell offering at or below the best bid
                Side::Buy => price <= best,
            },
            None => false,
        }
    }

    /// Rest a limit order on this side.
    ///
    /// The caller has already determined that no crossing with the
    /// opposite side is possible and inserted the order into the map.
    pub fn limit(&mut self, orders: &mut OrderMap, uid: OrderId) {
        self.ladder.insert(orders, uid);
    }

    /// Splice a resting order out of its level, erasing the level if it
    /// empties. Returns the canceled quantity. Storage stays in the map.
    pub fn cancel(&mut self, orders: &mut OrderMap, uid: OrderId) -> Quantity {
        self.ladder.remove(orders, uid)
    }

    /// Shave volume off a resting order's level without unlinking it
    pub fn reduce(&mut self, price: Price, delta: Quantity) {
        self.ladder.reduce_level(price, delta);
    }

    /// Drop all resting orders on this side
    pub fn clear(&mut self) {
        self.ladder.clear();
    }

    /// Consume liquidity from this side with an incoming taker.
    ///
    /// Runs until the taker is satisfied, this side empties, or (for a
    /// taker carrying a limit price) the best resting price becomes worse
    /// than the taker's bound. Each iteration matches the head of the
    /// best level at the maker's price, applies both position updates,
    /// and records a `Fill`. Fully consumed makers are erased from the
    /// map; the taker is never in the map while matching runs.
    pub fn market(
        &mut self,
        orders: &mut OrderMap,
        accounts: &mut AccountRegistry,
        taker: &mut Order,
        taker_uid: Option<OrderId>,
        fills: &mut Vec<Fill>,
    ) {
        while taker.quantity > 0 {
            if self.best().is_none() {
                break;
            }
            if taker.price != MARKET_PRICE && !self.crossed_by(taker.price) {
                break;
            }
            let head = match self.best().and_then(|b| self.ladder.level_at(b)) {
                Some(level) => level.head,
                None => break,
            };
            let (maker_uid, maker_quantity, maker_price, maker_side, maker_account) =
                match orders.get(&head) {
                    Some(m) => (m.uid, m.quantity, m.price, m.side, m.account),
                    None => break,
                };

            if maker_quantity <= taker.quantity {
                // the resting order is consumed entirely
                taker.quantity -= maker_quantity;
                accounts
                    .get_mut(maker_account)
                    .fill(maker_side, maker_quantity, maker_price);
                accounts.get_mut(maker_account).orders.remove(&maker_uid);
                accounts
                    .get_mut(taker.account)
                    .fill(taker.side, maker_quantity, maker_price);
                fills.push(Fill {
                    maker: maker_uid,
                    maker_account,
                    maker_leaves: 0,
                    taker: taker_uid,
                    taker_account: taker.account,
                    taker_leaves: taker.quantity,
                    taker_side: taker.side,
                    price: maker_price,
                    quantity: maker_quantity,
                });
                self.ladder.remove(orders, maker_uid);
                orders.remove(&maker_uid);
            } else {
                // the resting order has more than the taker wants
                let traded = taker.quantity;
                taker.quantity = 0;
                let maker_leaves = match orders.get_mut(&maker_uid) {
                    Some(m) => {
                        m.quantity -= traded;
                        m.quantity
                    }
                    None => break,
                };
                self.ladder.reduce_level(maker_price, traded);
                accounts
                    .get_mut(maker_account)
                    .fill(maker_side, traded, maker_price);
                accounts
                    .get_mut(taker.account)
                    .fill(taker.side, traded, maker_price);
                fills.push(Fill {
                    maker: maker_uid,
                    maker_account,
                    maker_leaves,
                    taker: taker_uid,
                    taker_account: taker.account,
                    taker_leaves: 0,
                    taker_side: taker.side,
                    price: maker_price,
                    quantity: traded,
                });
            }
        }
    }
}
