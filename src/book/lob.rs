//! The order book: two threaded price trees, an order registry, per-side
//! price indexes, a level free-list, and running per-side volume totals.
//!
//! All public operations are synchronous and contain no suspension point;
//! the caller provides mutual exclusion (single matching thread per
//! instrument). Lookups by order id or by price are O(1) through the hash
//! indexes; inserting or draining a price level costs one O(log n) tree
//! update; depth reads ride the tree's O(1) neighbor links.
//!
//! Absent-target `cancel`/`modify`/`delete_*_limit` are silent no-ops:
//! duplicate cancels and late fills are routine in a racing market. The
//! `clear_*_limit` pair panics on a missing price instead, since only
//! administrative paths with authoritative knowledge of the book call it.

use super::level::OrderNode;
use super::pool::LevelPool;
use super::tree::PriceTree;
use super::{DepthItem, DepthRank, Error};
use crate::config::BookConfig;
use crate::order::{Id, Order, Price, Side, Volume};
use slab::Slab;
use std::collections::HashMap;

/// Two-sided limit order book for a single instrument.
#[derive(Debug)]
pub struct OrderBook {
    bids: PriceTree,
    asks: PriceTree,
    /// Arena of resting orders; FIFO links are slab keys into it.
    orders: Slab<OrderNode>,
    /// Order id to slab key.
    order_index: HashMap<Id, usize>,
    /// Price to level-pool index, one map per side. Mirrors the tree.
    bid_levels: HashMap<Price, usize>,
    ask_levels: HashMap<Price, usize>,
    pool: LevelPool,
    total_buy_volume: Volume,
    total_sell_volume: Volume,
}

impl Default for OrderBook {
    fn default() -> Self {
        OrderBook::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook::with_config(&BookConfig::default())
    }

    /// Build a book with every arena and index pre-sized from the config,
    /// so steady-state operation does not allocate.
    pub fn with_config(cfg: &BookConfig) -> Self {
        OrderBook {
            bids: PriceTree::with_capacity(cfg.max_levels_per_side),
            asks: PriceTree::with_capacity(cfg.max_levels_per_side),
            orders: Slab::with_capacity(cfg.max_open_orders),
            order_index: HashMap::with_capacity(cfg.max_open_orders),
            bid_levels: HashMap::with_capacity(cfg.max_levels_per_side),
            ask_levels: HashMap::with_capacity(cfg.max_levels_per_side),
            // One pool serves both sides.
            pool: LevelPool::with_capacity(2 * cfg.max_levels_per_side),
            total_buy_volume: 0,
            total_sell_volume: 0,
        }
    }

    /// Rest `order` at `price` on the side given by `order.side`.
    ///
    /// Returns [`Error::OrderIdExists`] if an order with the same id is
    /// already resting; the book never silently replaces a resting order.
    pub fn add(&mut self, price: Price, order: Order) -> Result<(), Error> {
        if self.order_index.contains_key(&order.id) {
            return Err(Error::OrderIdExists(order.id));
        }
        self.insert_resting(price, order);
        Ok(())
    }

    /// Remove the resting order with `id`. Returns the removed order, or
    /// `None` (a no-op) if no such order is resting.
    pub fn cancel(&mut self, id: Id) -> Option<Order> {
        let idx = self.order_index.get(&id).copied()?;
        let order = self.orders[idx].order;
        let level_id = self.orders[idx].level.unwrap();

        let level = &mut self.pool[level_id];
        level.delete(&mut self.orders, idx);
        let price = level.price();
        let emptied = level.is_empty();

        if emptied {
            match order.side {
                Side::Bid => {
                    self.bids.delete(price);
                    self.bid_levels.remove(&price);
                }
                Side::Ask => {
                    self.asks.delete(price);
                    self.ask_levels.remove(&price);
                }
            }
            self.pool.release(level_id);
        }

        match order.side {
            Side::Bid => self.total_buy_volume -= order.volume,
            Side::Ask => self.total_sell_volume -= order.volume,
        }
        self.orders.remove(idx);
        self.order_index.remove(&id);
        Some(order)
    }

    /// Cancel-replace: remove the resting order with `order.id` and rest
    /// `order` at `price`. The replacement joins the tail of its level, so
    /// it loses time priority. Returns the previously resting order, or
    /// `None` (a no-op) if the id is unknown.
    pub fn modify(&mut self, price: Price, order: Order) -> Option<Order> {
        let previous = self.cancel(order.id)?;
        self.insert_resting(price, order);
        Some(previous)
    }

    /// Record an execution of `quantity` between two resting orders. Each
    /// side that is still registered is canceled; when its resting volume
    /// exceeded `quantity`, the residual is re-enqueued at `price` under
    /// the same id, at the tail of its level. Unknown ids are ignored:
    /// they may already have been fully consumed.
    pub fn execute(&mut self, price: Price, buy_id: Id, sell_id: Id, quantity: Volume) {
        for id in [buy_id, sell_id] {
            if let Some(resting) = self.cancel(id) {
                if resting.volume > quantity {
                    let residual = Order {
                        volume: resting.volume - quantity,
                        ..resting
                    };
                    self.insert_resting(price, residual);
                }
            }
        }
    }

    pub fn total_buy_volume(&self) -> Volume {
        self.total_buy_volume
    }

    pub fn total_sell_volume(&self) -> Volume {
        self.total_sell_volume
    }

    pub fn bid_levels_count(&self) -> usize {
        self.bid_levels.len()
    }

    pub fn ask_levels_count(&self) -> usize {
        self.ask_levels.len()
    }

    /// Resting volume at the bid level `price`, or 0 if no such level.
    pub fn volume_at_bid(&self, price: Price) -> Volume {
        self.bid_levels
            .get(&price)
            .map_or(0, |&id| self.pool[id].total_volume())
    }

    /// Resting volume at the ask level `price`, or 0 if no such level.
    pub fn volume_at_ask(&self, price: Price) -> Volume {
        self.ask_levels
            .get(&price)
            .map_or(0, |&id| self.pool[id].total_volume())
    }

    /// Number of emptied levels currently waiting in the free-list.
    pub fn recycled_levels(&self) -> usize {
        self.pool.available()
    }

    /// Drop every order at the bid level `price`, keeping the (now empty)
    /// level in place.
    ///
    /// # Panics
    ///
    /// Panics if no bid level exists at `price`.
    pub fn clear_bid_limit(&mut self, price: Price) {
        let level_id = match self.bid_levels.get(&price) {
            Some(&id) => id,
            None => panic!("no bid price limit at {}", price),
        };
        self.wipe_level(Side::Bid, level_id);
    }

    /// Drop every order at the ask level `price`, keeping the (now empty)
    /// level in place.
    ///
    /// # Panics
    ///
    /// Panics if no ask level exists at `price`.
    pub fn clear_ask_limit(&mut self, price: Price) {
        let level_id = match self.ask_levels.get(&price) {
            Some(&id) => id,
            None => panic!("no ask price limit at {}", price),
        };
        self.wipe_level(Side::Ask, level_id);
    }

    /// Remove the bid level at `price` entirely, dropping its orders and
    /// recycling the level. No-op if absent.
    pub fn delete_bid_limit(&mut self, price: Price) {
        let Some(&level_id) = self.bid_levels.get(&price) else {
            return;
        };
        self.wipe_level(Side::Bid, level_id);
        self.bids.delete(price);
        self.bid_levels.remove(&price);
        self.pool.release(level_id);
    }

    /// Remove the ask level at `price` entirely, dropping its orders and
    /// recycling the level. No-op if absent.
    pub fn delete_ask_limit(&mut self, price: Price) {
        let Some(&level_id) = self.ask_levels.get(&price) else {
            return;
        };
        self.wipe_level(Side::Ask, level_id);
        self.asks.delete(price);
        self.ask_levels.remove(&price);
        self.pool.release(level_id);
    }

    /// Best `n` levels of `side`, best to worst. Always returns exactly
    /// `n` entries; when the side has fewer levels, the tail is padded
    /// with zeroed [`DepthItem`]s.
    pub fn n_best(&self, side: Side, n: usize) -> Vec<DepthItem> {
        let mut depth = vec![DepthItem::default(); n];
        let tree = self.tree(side);
        let mut cur = match side {
            Side::Bid => tree.max_pointer(),
            Side::Ask => tree.min_pointer(),
        };
        for slot in depth.iter_mut() {
            let Some(node) = cur else { break };
            let level = &self.pool[tree.level_at(node)];
            *slot = DepthItem {
                price: level.price(),
                volume: level.total_volume(),
                order_count: level.size(),
            };
            cur = match side {
                Side::Bid => tree.prev(node),
                Side::Ask => tree.next(node),
            };
        }
        depth
    }

    /// Where `price` would sit within `side`: resting volume and level
    /// count at least as favorable as `price`, plus the side's totals.
    /// `price` itself does not have to be present in the book.
    pub fn depth_rank(&self, side: Side, price: Price) -> DepthRank {
        let tree = self.tree(side);
        let mut cur = match side {
            Side::Bid => tree.max_pointer(),
            Side::Ask => tree.min_pointer(),
        };
        let mut rank = DepthRank::default();
        while let Some(node) = cur {
            let level = &self.pool[tree.level_at(node)];
            rank.total_volume += level.total_volume();
            rank.total_depth += 1;
            let favorable = match side {
                Side::Bid => level.price() >= price,
                Side::Ask => level.price() <= price,
            };
            if favorable {
                rank.volume_ahead += level.total_volume();
                rank.depth_level += 1;
            }
            cur = match side {
                Side::Bid => tree.prev(node),
                Side::Ask => tree.next(node),
            };
        }
        rank
    }

    fn tree(&self, side: Side) -> &PriceTree {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    // Rest an order whose id is known to be free.
    fn insert_resting(&mut self, price: Price, order: Order) {
        debug_assert!(order.volume > 0, "resting volume must be positive");
        let side = order.side;

        let existing = match side {
            Side::Bid => self.bid_levels.get(&price).copied(),
            Side::Ask => self.ask_levels.get(&price).copied(),
        };
        let level_id = match existing {
            Some(id) => id,
            None => {
                let id = self.pool.acquire(price);
                match side {
                    Side::Bid => {
                        self.bids.put(price, id);
                        self.bid_levels.insert(price, id);
                    }
                    Side::Ask => {
                        self.asks.put(price, id);
                        self.ask_levels.insert(price, id);
                    }
                }
                id
            }
        };

        let idx = self.orders.insert(OrderNode::new(order));
        self.order_index.insert(order.id, idx);
        self.pool[level_id].enqueue(&mut self.orders, idx, level_id);
        match side {
            Side::Bid => self.total_buy_volume += order.volume,
            Side::Ask => self.total_sell_volume += order.volume,
        }
    }

    // Drain a level front to back, unregistering every order and keeping
    // the side's running total consistent. The level itself stays put.
    fn wipe_level(&mut self, side: Side, level_id: usize) {
        let mut removed = 0;
        while let Some(idx) = self.pool[level_id].front() {
            let order = self.orders[idx].order;
            self.pool[level_id].delete(&mut self.orders, idx);
            self.orders.remove(idx);
            self.order_index.remove(&order.id);
            removed += order.volume;
        }
        match side {
            Side::Bid => self.total_buy_volume -= removed,
            Side::Ask => self.total_sell_volume -= removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderBook;
    use crate::book::{DepthItem, DepthRank, Error};
    use crate::order::{Order, Side};

    fn o(id: u64, side: Side, vol: u64) -> Order {
        Order::new(id, side, vol)
    }

    fn item(price: u64, volume: u64, order_count: usize) -> DepthItem {
        DepthItem {
            price,
            volume,
            order_count,
        }
    }

    /// Assert every structural invariant of the book: registry/FIFO
    /// membership, tree/index mirroring, per-level aggregates, per-side
    /// totals, and strict ordering of the threaded walks.
    fn check_invariants(book: &OrderBook) {
        for (side, tree, levels) in [
            (Side::Bid, &book.bids, &book.bid_levels),
            (Side::Ask, &book.asks, &book.ask_levels),
        ] {
            assert_eq!(
                tree.len(),
                levels.len(),
                "{:?} tree and price index disagree on level count",
                side
            );

            let mut side_volume = 0;
            for (&price, &level_id) in levels {
                assert_eq!(
                    tree.get(price),
                    Some(level_id),
                    "{:?} index price {} missing from tree",
                    side,
                    price
                );
                let level = &book.pool[level_id];
                assert_eq!(level.price(), price);

                let mut fifo_len = 0;
                let mut fifo_volume = 0;
                let mut cur = level.front();
                while let Some(idx) = cur {
                    let node = &book.orders[idx];
                    assert_eq!(node.level, Some(level_id));
                    assert_eq!(node.order.side, side);
                    assert_eq!(
                        book.order_index.get(&node.order.id).copied(),
                        Some(idx),
                        "order {} in FIFO but not registered",
                        node.order.id
                    );
                    fifo_len += 1;
                    fifo_volume += node.order.volume;
                    cur = node.next;
                }
                assert_eq!(level.size(), fifo_len, "level size drifted at {}", price);
                assert_eq!(
                    level.total_volume(),
                    fifo_volume,
                    "level volume drifted at {}",
                    price
                );
                side_volume += fifo_volume;
            }

            let expected = match side {
                Side::Bid => book.total_buy_volume,
                Side::Ask => book.total_sell_volume,
            };
            assert_eq!(
                expected, side_volume,
                "{:?} running total drifted from level sums",
                side
            );

            // Tree walk: strictly increasing, and every node mirrored in
            // the price index.
            let mut count = 0;
            let mut prev_price = None;
            let mut cur = tree.min_pointer();
            while let Some(node) = cur {
                let price = tree.price_at(node);
                if let Some(pp) = prev_price {
                    assert!(pp < price, "in-order walk not increasing");
                }
                prev_price = Some(price);
                assert_eq!(levels.get(&price).copied(), Some(tree.level_at(node)));
                count += 1;
                cur = tree.next(node);
            }
            assert_eq!(count, levels.len());
        }

        // Every registered order rests in a level on its own side.
        for (&id, &idx) in &book.order_index {
            let node = &book.orders[idx];
            assert_eq!(node.order.id, id);
            let level_id = node.level.expect("registered order must rest in a level");
            let level = &book.pool[level_id];
            let levels = match node.order.side {
                Side::Bid => &book.bid_levels,
                Side::Ask => &book.ask_levels,
            };
            assert_eq!(levels.get(&level.price()).copied(), Some(level_id));
        }
        assert_eq!(book.orders.len(), book.order_index.len());
    }

    #[test]
    fn add_accumulates_volume_and_order_count_at_one_level() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();

        assert_eq!(book.n_best(Side::Bid, 1), vec![item(100, 8, 2)]);
        assert_eq!(book.total_buy_volume(), 8);
        check_invariants(&book);
    }

    #[test]
    fn cancel_peels_orders_off_a_level() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();

        let canceled = book.cancel(1).expect("order 1 should be resting");
        assert_eq!(canceled.volume, 5);
        assert_eq!(book.n_best(Side::Bid, 1), vec![item(100, 3, 1)]);
        assert_eq!(book.total_buy_volume(), 3);
        check_invariants(&book);
    }

    #[test]
    fn canceling_the_last_order_recycles_the_level() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();
        let recycled_before = book.recycled_levels();

        book.cancel(1).unwrap();
        book.cancel(2).unwrap();

        assert_eq!(book.bid_levels_count(), 0);
        assert_eq!(book.n_best(Side::Bid, 1), vec![item(0, 0, 0)]);
        assert_eq!(book.total_buy_volume(), 0);
        assert_eq!(
            book.recycled_levels(),
            recycled_before + 1,
            "emptied level should land in the free-list"
        );
        check_invariants(&book);
    }

    #[test]
    fn n_best_emits_levels_best_to_worst() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(101, o(2, Side::Bid, 7)).unwrap();
        book.add(99, o(3, Side::Bid, 2)).unwrap();

        assert_eq!(
            book.n_best(Side::Bid, 3),
            vec![item(101, 7, 1), item(100, 5, 1), item(99, 2, 1)]
        );
        check_invariants(&book);
    }

    #[test]
    fn n_best_orders_asks_ascending() {
        let mut book = OrderBook::new();
        book.add(105, o(1, Side::Ask, 4)).unwrap();
        book.add(103, o(2, Side::Ask, 6)).unwrap();
        book.add(104, o(3, Side::Ask, 1)).unwrap();

        assert_eq!(
            book.n_best(Side::Ask, 4),
            vec![item(103, 6, 1), item(104, 1, 1), item(105, 4, 1), item(0, 0, 0)]
        );
        check_invariants(&book);
    }

    #[test]
    fn depth_rank_counts_levels_at_least_as_favorable() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 10)).unwrap();
        book.add(101, o(2, Side::Bid, 4)).unwrap();

        assert_eq!(
            book.depth_rank(Side::Bid, 100),
            DepthRank {
                volume_ahead: 14,
                total_volume: 14,
                depth_level: 2,
                total_depth: 2,
            }
        );

        // A price better than the whole side has nothing ahead of it.
        assert_eq!(
            book.depth_rank(Side::Bid, 102),
            DepthRank {
                volume_ahead: 0,
                total_volume: 14,
                depth_level: 0,
                total_depth: 2,
            }
        );

        // Absent in-between prices still rank correctly.
        let mid = book.depth_rank(Side::Bid, 101);
        assert_eq!(mid.volume_ahead, 4);
        assert_eq!(mid.depth_level, 1);
        check_invariants(&book);
    }

    #[test]
    fn depth_rank_on_asks_favors_lower_prices() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Ask, 3)).unwrap();
        book.add(102, o(2, Side::Ask, 5)).unwrap();
        book.add(104, o(3, Side::Ask, 7)).unwrap();

        let rank = book.depth_rank(Side::Ask, 102);
        assert_eq!(
            rank,
            DepthRank {
                volume_ahead: 8,
                total_volume: 15,
                depth_level: 2,
                total_depth: 3,
            }
        );
        check_invariants(&book);
    }

    #[test]
    fn execute_requeues_the_residual_at_the_tail() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 10)).unwrap();

        // Counterparty id 99 is unknown and must be ignored.
        book.execute(100, 1, 99, 3);

        assert_eq!(book.total_buy_volume(), 7);
        assert_eq!(book.total_sell_volume(), 0);
        assert_eq!(book.n_best(Side::Bid, 1), vec![item(100, 7, 1)]);
        check_invariants(&book);
    }

    #[test]
    fn execute_residual_loses_time_priority() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 10)).unwrap();
        book.add(100, o(2, Side::Bid, 1)).unwrap();

        book.execute(100, 1, 99, 3);

        // The residual of order 1 must now sit behind order 2.
        let level_id = book.bid_levels[&100];
        let head = book.pool[level_id].front().unwrap();
        assert_eq!(book.orders[head].order.id, 2);
        let tail = book.orders[head].next.unwrap();
        assert_eq!(book.orders[tail].order.id, 1);
        assert_eq!(book.orders[tail].order.volume, 7);
        check_invariants(&book);
    }

    #[test]
    fn execute_consumes_both_sides_fully_when_quantities_match() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Ask, 5)).unwrap();

        book.execute(100, 1, 2, 5);

        assert_eq!(book.total_buy_volume(), 0);
        assert_eq!(book.total_sell_volume(), 0);
        assert_eq!(book.bid_levels_count(), 0);
        assert_eq!(book.ask_levels_count(), 0);
        check_invariants(&book);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut book = OrderBook::new();
        book.add(100, o(10, Side::Bid, 5)).unwrap();
        let err = book.add(101, o(10, Side::Ask, 1)).unwrap_err();
        assert!(matches!(err, Error::OrderIdExists(10)));

        // The failed add must not have disturbed anything.
        assert_eq!(book.total_buy_volume(), 5);
        assert_eq!(book.total_sell_volume(), 0);
        check_invariants(&book);
    }

    #[test]
    fn cancel_and_modify_of_unknown_ids_are_noops() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();

        assert!(book.cancel(999).is_none());
        assert!(book.modify(101, o(999, Side::Bid, 3)).is_none());
        assert_eq!(book.total_buy_volume(), 5);
        assert_eq!(book.bid_levels_count(), 1);
        check_invariants(&book);
    }

    #[test]
    fn modify_moves_the_order_and_drops_priority() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();

        // Reprice order 1 to a new level.
        let previous = book.modify(101, o(1, Side::Bid, 4)).unwrap();
        assert_eq!(previous.volume, 5);
        assert_eq!(
            book.n_best(Side::Bid, 2),
            vec![item(101, 4, 1), item(100, 3, 1)]
        );
        assert_eq!(book.total_buy_volume(), 7);

        // Same-price modify re-enqueues at the tail.
        book.modify(100, o(1, Side::Bid, 4));
        let level_id = book.bid_levels[&100];
        let head = book.pool[level_id].front().unwrap();
        assert_eq!(book.orders[head].order.id, 2);
        check_invariants(&book);
    }

    #[test]
    fn volume_at_level_reads() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 2)).unwrap();
        book.add(105, o(3, Side::Ask, 9)).unwrap();

        assert_eq!(book.volume_at_bid(100), 7);
        assert_eq!(book.volume_at_bid(101), 0);
        assert_eq!(book.volume_at_ask(105), 9);
        assert_eq!(book.volume_at_ask(100), 0);
    }

    #[test]
    fn clear_limit_empties_but_keeps_the_level() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();
        book.add(101, o(3, Side::Bid, 2)).unwrap();

        book.clear_bid_limit(100);

        assert_eq!(book.total_buy_volume(), 2);
        assert_eq!(book.bid_levels_count(), 2, "cleared level must remain");
        assert_eq!(book.volume_at_bid(100), 0);
        assert!(book.cancel(1).is_none(), "wiped orders must be unregistered");
        assert_eq!(
            book.n_best(Side::Bid, 2),
            vec![item(101, 2, 1), item(100, 0, 0)]
        );
        check_invariants(&book);
    }

    #[test]
    #[should_panic(expected = "no bid price limit")]
    fn clear_limit_on_absent_price_panics() {
        let mut book = OrderBook::new();
        book.clear_bid_limit(500);
    }

    #[test]
    #[should_panic(expected = "no ask price limit")]
    fn clear_ask_limit_on_absent_price_panics() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.clear_ask_limit(100);
    }

    #[test]
    fn delete_limit_removes_and_recycles_the_level() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(100, o(2, Side::Bid, 3)).unwrap();
        book.add(105, o(3, Side::Ask, 9)).unwrap();
        let recycled_before = book.recycled_levels();

        book.delete_bid_limit(100);
        assert_eq!(book.total_buy_volume(), 0);
        assert_eq!(book.bid_levels_count(), 0);
        assert_eq!(book.recycled_levels(), recycled_before + 1);

        // Absent prices are silent no-ops, unlike clear_*_limit.
        book.delete_bid_limit(100);
        book.delete_ask_limit(999);
        assert_eq!(book.total_sell_volume(), 9);
        check_invariants(&book);
    }

    #[test]
    fn add_cancel_round_trip_restores_observable_state() {
        let mut book = OrderBook::new();
        book.add(100, o(1, Side::Bid, 5)).unwrap();
        book.add(102, o(2, Side::Ask, 4)).unwrap();

        let bids_before = book.n_best(Side::Bid, 8);
        let asks_before = book.n_best(Side::Ask, 8);
        let buy_before = book.total_buy_volume();
        let sell_before = book.total_sell_volume();

        book.add(101, o(3, Side::Bid, 6)).unwrap();
        book.cancel(3).unwrap();

        assert_eq!(book.n_best(Side::Bid, 8), bids_before);
        assert_eq!(book.n_best(Side::Ask, 8), asks_before);
        assert_eq!(book.total_buy_volume(), buy_before);
        assert_eq!(book.total_sell_volume(), sell_before);
        check_invariants(&book);
    }

    #[test]
    fn interleaved_operations_hold_every_invariant() {
        let mut book = OrderBook::new();
        for i in 0..40u64 {
            let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
            let price = if side == Side::Bid { 100 - i % 7 } else { 101 + i % 7 };
            book.add(price, o(i, side, 1 + i % 5)).unwrap();
        }
        check_invariants(&book);

        for id in (0..40u64).step_by(3) {
            book.cancel(id);
        }
        check_invariants(&book);

        book.execute(100, 4, 5, 1);
        book.execute(101, 8, 7, 2);
        check_invariants(&book);

        book.modify(99, o(2, Side::Bid, 9));
        book.modify(103, o(11, Side::Ask, 2));
        check_invariants(&book);

        book.delete_bid_limit(100);
        book.delete_ask_limit(101);
        check_invariants(&book);
    }
}
