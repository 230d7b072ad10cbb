//! Price level: the FIFO queue of orders resting at one price.
//!
//! Orders live in a shared `Slab` arena owned by the book; a level links
//! them into a doubly-linked list by slab key. Appends go to the tail and
//! removals unlink in place, so both are constant time, and the level keeps
//! its order count and total volume up to date on every link/unlink.

use crate::order::{Order, Price, Volume};
use slab::Slab;

/// Node representing an individual order stored in the shared arena and
/// linked within a price level's FIFO queue.
#[derive(Debug, Clone)]
pub(crate) struct OrderNode {
    pub order: Order,
    /// Next (newer) order at the same price, by slab key.
    pub next: Option<usize>,
    /// Previous (older) order at the same price, by slab key.
    pub prev: Option<usize>,
    /// Back-reference to the level currently holding this order, as an
    /// index into the level pool. `None` while not resting.
    pub level: Option<usize>,
}

impl OrderNode {
    pub(crate) fn new(order: Order) -> Self {
        OrderNode {
            order,
            next: None,
            prev: None,
            level: None,
        }
    }
}

/// Aggregated state for a single price level.
///
/// Keeps the head/tail of the FIFO (by slab key) along with cumulative
/// volume and order count for O(1) depth queries. Invariant between public
/// book operations: `size == 0` exactly when `head`/`tail` are `None` and
/// `total_volume == 0`.
#[derive(Debug, Default)]
pub struct PriceLevel {
    price: Price,
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
    total_volume: Volume,
}

impl PriceLevel {
    /// Price this level represents. Only meaningful while the level is
    /// checked out of the pool.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Number of orders in the FIFO.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sum of the remaining volumes of the orders in the FIFO.
    pub fn total_volume(&self) -> Volume {
        self.total_volume
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Oldest order in the FIFO (front of the time-priority queue).
    pub(crate) fn front(&self) -> Option<usize> {
        self.head
    }

    /// Re-key an empty level for reuse at a new price.
    pub(crate) fn reset(&mut self, price: Price) {
        debug_assert!(self.is_empty());
        self.price = price;
    }

    /// Append the order at `idx` to the back of the FIFO and record this
    /// level (by its pool index `level_id`) as the order's home.
    pub(crate) fn enqueue(&mut self, orders: &mut Slab<OrderNode>, idx: usize, level_id: usize) {
        match self.tail {
            Some(tail) => {
                orders[tail].next = Some(idx);
                orders[idx].prev = Some(tail);
                self.tail = Some(idx);
            }
            None => {
                self.head = Some(idx);
                self.tail = Some(idx);
                orders[idx].prev = None;
            }
        }
        orders[idx].next = None;
        orders[idx].level = Some(level_id);

        self.size += 1;
        self.total_volume += orders[idx].order.volume;
    }

    /// Unlink the order at `idx` from the FIFO and clear its level
    /// back-reference. The node must currently be linked in this level.
    pub(crate) fn delete(&mut self, orders: &mut Slab<OrderNode>, idx: usize) {
        let prev = orders[idx].prev;
        let next = orders[idx].next;

        if let Some(p) = prev {
            orders[p].next = next;
        } else {
            self.head = next;
        }
        if let Some(n) = next {
            orders[n].prev = prev;
        } else {
            self.tail = prev;
        }

        self.size -= 1;
        self.total_volume -= orders[idx].order.volume;
        orders[idx].prev = None;
        orders[idx].next = None;
        orders[idx].level = None;
    }
}
