//! The limit order book: a continuous double auction for one instrument
//!
//! Owns both book sides, the uid map holding every order's storage, the
//! monotonic uid allocator, and the account registry. All order-entry
//! operations route through here; matching emits `Fill` records that the
//! caller fans out to sessions and the depth feed.

use super::order::{Order, OrderMap};
use super::side::{BookSide, MARKET_PRICE};
use crate::accounts::{AccountId, AccountRegistry};
use crate::errors::BookError;
use crate::events::Fill;
use tracing::debug;
use types::prelude::{Count, OrderId, Price, Quantity, Side, Volume};

/// Outcome of submitting a limit order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitResult {
    /// the uid assigned to the order, 0 when it was fully consumed on
    /// entry and never rested
    pub uid: OrderId,
    /// fills generated while crossing the opposite side
    pub fills: Vec<Fill>,
}

impl LimitResult {
    /// True when the order rested on the book
    pub fn rested(&self) -> bool {
        self.uid != 0
    }
}

/// An order book for managing limit and market orders in a continuous
/// double auction
#[derive(Debug)]
pub struct LimitOrderBook {
    /// the resting sell orders
    sells: BookSide,
    /// the resting buy orders
    buys: BookSide,
    /// exclusive owner of all order storage, keyed by uid
    orders: OrderMap,
    /// the counter for assigning unique order ids
    sequence: OrderId,
    /// per-account positions
    accounts: AccountRegistry,
}

impl Default for LimitOrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl LimitOrderBook {
    /// Create an empty book; uids start at 1
    pub fn new() -> Self {
        Self {
            sells: BookSide::new(Side::Sell),
            buys: BookSide::new(Side::Buy),
            orders: OrderMap::new(),
            sequence: 1,
            accounts: AccountRegistry::new(),
        }
    }

    /// The uid the next resting order will receive
    pub fn sequence(&self) -> OrderId {
        self.sequence
    }

    /// The account registry
    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    /// Mutable access to the account registry
    pub fn accounts_mut(&mut self) -> &mut AccountRegistry {
        &mut self.accounts
    }

    /// The buy side of the book
    pub fn buys(&self) -> &BookSide {
        &self.buys
    }

    /// The sell side of the book
    pub fn sells(&self) -> &BookSide {
        &self.sells
    }

    /// The uid map holding every resting order
    pub fn orders(&self) -> &OrderMap {
        &self.orders
    }

    /// Submit a limit order.
    ///
    /// A uid is reserved up front and the counter is never rewound: when
    /// the order is fully consumed crossing the opposite side, the result
    /// carries uid 0 and the reserved value is simply skipped, so
    /// observable uid sequences may contain gaps.
    pub fn limit(
        &mut self,
        account: AccountId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> LimitResult {
        let uid = self.sequence;
        self.sequence += 1;
        let (rested, fills) = self.place(account, uid, side, quantity, price);
        LimitResult {
            uid: if rested { uid } else { 0 },
            fills,
        }
    }

    /// Insert a limit order under a caller-assigned uid.
    ///
    /// This is the depth-feed replay path: the wire uid is authoritative
    /// and the allocator is not consulted. Returns whether the order
    /// rested along with any fills.
    pub fn limit_with_id(
        &mut self,
        account: AccountId,
        uid: OrderId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> (bool, Vec<Fill>) {
        self.place(account, uid, side, quantity, price)
    }

    fn place(
        &mut self,
        account: AccountId,
        uid: OrderId,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> (bool, Vec<Fill>) {
        let mut taker = Order::new(uid, side, quantity, price, account);
        let mut fills = Vec::new();
        let opposite = match side {
            Side::Buy => &mut self.sells,
            Side::Sell => &mut self.buys,
        };
        if opposite.crossed_by(price) {
            opposite.market(
                &mut self.orders,
                &mut self.accounts,
                &mut taker,
                Some(uid),
                &mut fills,
            );
        }
        if taker.quantity == 0 {
            return (false, fills);
        }
        self.accounts.get_mut(account).orders.insert(uid);
        self.orders.insert(uid, taker);
        let own = match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };
        own.limit(&mut self.orders, uid);
        (true, fills)
    }

    /// Execute a market order against the opposite side.
    ///
    /// The taker is an ephemeral record that never enters the uid map;
    /// an empty opposite side produces no fills and no side effects.
    pub fn market(&mut self, account: AccountId, side: Side, quantity: Quantity) -> Vec<Fill> {
        let mut taker = Order::new(self.sequence, side, quantity, MARKET_PRICE, account);
        let mut fills = Vec::new();
        let opposite = match side {
            Side::Buy => &mut self.sells,
            Side::Sell => &mut self.buys,
        };
        opposite.market(
            &mut self.orders,
            &mut self.accounts,
            &mut taker,
            None,
            &mut fills,
        );
        fills
    }

    /// True if the book holds an order with the given uid
    pub fn has(&self, uid: OrderId) -> bool {
        self.orders.contains_key(&uid)
    }

    /// Look up a resting order
    pub fn get(&self, uid: OrderId) -> Option<&Order> {
        self.orders.get(&uid)
    }

    /// Cancel a resting order, releasing its storage and removing it from
    /// its owner's active set. Returns the removed order.
    pub fn cancel(&mut self, uid: OrderId) -> Result<Order, BookError> {
        let side = match self.orders.get(&uid) {
            Some(order) => order.side,
            None => return Err(BookError::UnknownOrder { uid }),
        };
        match side {
            Side::Sell => self.sells.cancel(&mut self.orders, uid),
            Side::Buy => self.buys.cancel(&mut self.orders, uid),
        };
        let Some(order) = self.orders.remove(&uid) else {
            return Err(BookError::UnknownOrder { uid });
        };
        self.accounts.get_mut(order.account).orders.remove(&uid);
        Ok(order)
    }

    /// Reduce a resting order's open quantity in place.
    ///
    /// Reducing by the full remaining quantity behaves as a cancel;
    /// reducing by more fails without touching the book.
    pub fn reduce(&mut self, uid: OrderId, quantity: Quantity) -> Result<(), BookError> {
        let (side, available, price) = match self.orders.get(&uid) {
            Some(order) => (order.side, order.quantity, order.price),
            None => return Err(BookError::UnknownOrder { uid }),
        };
        if quantity > available {
            return Err(BookError::InsufficientQuantity {
                uid,
                requested: quantity,
                available,
            });
        }
        if quantity == available {
            self.cancel(uid)?;
            return Ok(());
        }
        if let Some(order) = self.orders.get_mut(&uid) {
            order.quantity -= quantity;
        }
        match side {
            Side::Sell => self.sells.reduce(price, quantity),
            Side::Buy => self.buys.reduce(price, quantity),
        }
        Ok(())
    }

    /// Erase every order and level and reset the uid counter to 1.
    /// Account positions survive; their active-order sets are emptied.
    pub fn clear(&mut self) {
        debug!(orders = self.orders.len(), "clearing the book");
        self.sells.clear();
        self.buys.clear();
        self.orders.clear();
        self.sequence = 1;
        self.accounts.clear_orders();
    }

    /// Best sell (ask) price, 0 when no sells rest
    pub fn best_sell(&self) -> Price {
        self.sells.best().unwrap_or(0)
    }

    /// Best buy (bid) price, 0 when no buys rest
    pub fn best_buy(&self) -> Price {
        self.buys.best().unwrap_or(0)
    }

    /// Best price on the given side
    pub fn best(&self, side: Side) -> Price {
        match side {
            Side::Sell => self.best_sell(),
            Side::Buy => self.best_buy(),
        }
    }

    /// The most recent non-null best sell price
    pub fn last_best_sell(&self) -> Price {
        self.sells.ladder().last_best_price()
    }

    /// The most recent non-null best buy price
    pub fn last_best_buy(&self) -> Price {
        self.buys.ladder().last_best_price()
    }

    /// The most recent non-null best price on the given side
    pub fn last_best(&self, side: Side) -> Price {
        match side {
            Side::Sell => self.last_best_sell(),
            Side::Buy => self.last_best_buy(),
        }
    }

    /// Current quote: the midpoint of the bests, the populated side when
    /// the book is one-sided, or 0 when empty
    pub fn price(&self) -> Price {
        match (self.buys.best(), self.sells.best()) {
            (None, None) => 0,
            (Some(buy), None) => buy,
            (None, Some(sell)) => sell,
            (Some(buy), Some(sell)) => (buy + sell) / 2,
        }
    }

    /// Quote continuity price: midpoint of the last non-null bests
    pub fn last_price(&self) -> Price {
        (self.last_best_sell() + self.last_best_buy()) / 2
    }

    /// Total open sell volume
    pub fn volume_sell(&self) -> Volume {
        self.sells.volume()
    }

    /// Open sell volume at the given price
    pub fn volume_sell_at(&self, price: Price) -> Volume {
        self.sells.ladder().volume_at(price)
    }

    /// Open volume at the best sell price
    pub fn volume_sell_best(&self) -> Volume {
        self.sells.ladder().volume_at_best()
    }

    /// Total open buy volume
    pub fn volume_buy(&self) -> Volume {
        self.buys.volume()
    }

    /// Open buy volume at the given price
    pub fn volume_buy_at(&self, price: Price) -> Volume {
        self.buys.ladder().volume_at(price)
    }

    /// Open volume at the best buy price
    pub fn volume_buy_best(&self) -> Volume {
        self.buys.ladder().volume_at_best()
    }

    /// Open volume at the given price across both sides
    pub fn volume_at(&self, price: Price) -> Volume {
        self.volume_buy_at(price) + self.volume_sell_at(price)
    }

    /// Total open volume in the book
    pub fn volume(&self) -> Volume {
        self.volume_buy() + self.volume_sell()
    }

    /// Resting order count at the given price across both sides
    pub fn count_at(&self, price: Price) -> Count {
        self.buys.ladder().count_at(price) + self.sells.ladder().count_at(price)
    }

    /// Resting sell order count
    pub fn count_sell(&self) -> Count {
        self.sells.count()
    }

    /// Resting buy order count
    pub fn count_buy(&self) -> Count {
        self.buys.count()
    }

    /// Total resting order count
    pub fn count(&self) -> Count {
        self.count_buy() + self.count_sell()
    }

    /// True when this book's best sell plus `spread` undercuts the other
    /// book's best buy. Overflow of the sum means no cross.
    pub fn does_cross(&self, other: &LimitOrderBook, spread: Quantity) -> bool {
        let best_sell = self.best_sell();
        if best_sell == 0 {
            return false;
        }
        match best_sell.checked_add(spread as Price) {
            Some(sum) => sum < other.best_buy(),
            None => false,
        }
    }
}
