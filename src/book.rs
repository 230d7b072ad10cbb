//! Order book components and shared types.
//!
//! The book is assembled from four pieces, each in its own submodule:
//! [`level`] holds the FIFO of orders at one price, [`pool`] recycles
//! emptied levels, [`tree`] keeps the active prices of one side in a
//! threaded red-black tree, and [`lob`] composes them into the public
//! [`lob::OrderBook`].

pub mod level;
pub mod lob;
pub mod pool;
pub mod tree;

use crate::order::{Id, Price, Volume};
use thiserror::Error;

/// Aggregated depth at a single price level, as emitted by
/// [`lob::OrderBook::n_best`]. The default value (all zeroes) pads the
/// tail of a depth reply when a side has fewer levels than requested.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DepthItem {
    /// Price level.
    pub price: Price,
    /// Total resting volume at this price level.
    pub volume: Volume,
    /// Number of resting orders at this price level.
    pub order_count: usize,
}

/// Where a price sits within one side of the book, as reported by
/// [`lob::OrderBook::depth_rank`]. The queried price does not have to be
/// present in the book.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DepthRank {
    /// Resting volume on levels at least as favorable as the queried price.
    pub volume_ahead: Volume,
    /// Total resting volume on the side.
    pub total_volume: Volume,
    /// Number of levels at least as favorable as the queried price.
    pub depth_level: usize,
    /// Total number of active levels on the side.
    pub total_depth: usize,
}

/// Order-book errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("another order with the same id #{0} already exists")]
    /// Tried to add an order with an ID that is already resting.
    OrderIdExists(Id),
}
