//! Aggregated depth views over a book
//!
//! Downstream consumers of the feed usually want per-price aggregates
//! rather than individual orders. A `DepthSnapshot` captures the top
//! levels of each side: bids in descending price order and asks in
//! ascending order, best first.

use matching_engine::book::LimitOrderBook;
use types::prelude::{Count, Price, Volume};

/// One aggregated price level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLevel {
    /// the level's price
    pub price: Price,
    /// total open quantity at this price
    pub volume: Volume,
    /// number of resting orders at this price
    pub count: Count,
}

/// A point-in-time view of the top of both sides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthSnapshot {
    /// bid levels, best (highest) first
    pub bids: Vec<DepthLevel>,
    /// ask levels, best (lowest) first
    pub asks: Vec<DepthLevel>,
}

impl DepthSnapshot {
    /// Aggregate the top `levels` price levels of each side
    pub fn capture(book: &LimitOrderBook, levels: usize) -> Self {
        let bids = book
            .buys()
            .ladder()
            .iter()
            .rev()
            .take(levels)
            .map(|level| DepthLevel {
                price: level.price,
                volume: level.volume,
                count: level.count,
            })
            .collect();
        let asks = book
            .sells()
            .ladder()
            .iter()
            .take(levels)
            .map(|level| DepthLevel {
                price: level.price,
                volume: level.volume,
                count: level.count,
            })
            .collect();
        Self { bids, asks }
    }

    /// The best bid level, if any
    pub fn best_bid(&self) -> Option<&DepthLevel> {
        self.bids.first()
    }

    /// The best ask level, if any
    pub fn best_ask(&self) -> Option<&DepthLevel> {
        self.asks.first()
    }

    /// Spread between the best ask and best bid
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::prelude::Side;

    fn populated_book() -> LimitOrderBook {
        let mut book = LimitOrderBook::new();
        let account = book.accounts_mut().create();
        for (price, quantity) in [(99, 10), (98, 20), (97, 30)] {
            book.limit(account, Side::Buy, quantity, price);
        }
        for (price, quantity) in [(101, 5), (102, 15), (103, 25), (104, 35)] {
            book.limit(account, Side::Sell, quantity, price);
        }
        book
    }

    #[test]
    fn test_capture_orders_best_first() {
        let book = populated_book();
        let snapshot = DepthSnapshot::capture(&book, 10);

        let bid_prices: Vec<Price> = snapshot.bids.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![99, 98, 97]);
        let ask_prices: Vec<Price> = snapshot.asks.iter().map(|l| l.price).collect();
        assert_eq!(ask_prices, vec![101, 102, 103, 104]);
    }

    #[test]
    fn test_capture_truncates_to_requested_depth() {
        let book = populated_book();
        let snapshot = DepthSnapshot::capture(&book, 2);
        assert_eq!(snapshot.bids.len(), 2);
        assert_eq!(snapshot.asks.len(), 2);
        assert_eq!(snapshot.bids[1].price, 98);
        assert_eq!(snapshot.asks[1].price, 102);
    }

    #[test]
    fn test_levels_aggregate_volume_and_count() {
        let mut book = LimitOrderBook::new();
        let account = book.accounts_mut().create();
        book.limit(account, Side::Buy, 10, 100);
        book.limit(account, Side::Buy, 15, 100);

        let snapshot = DepthSnapshot::capture(&book, 1);
        assert_eq!(
            snapshot.best_bid(),
            Some(&DepthLevel {
                price: 100,
                volume: 25,
                count: 2
            })
        );
    }

    #[test]
    fn test_spread() {
        let book = populated_book();
        let snapshot = DepthSnapshot::capture(&book, 1);
        assert_eq!(snapshot.spread(), Some(2));

        let empty = DepthSnapshot::capture(&LimitOrderBook::new(), 1);
        assert_eq!(empty.spread(), None);
        assert!(empty.best_bid().is_none());
    }
}
