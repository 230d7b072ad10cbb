//! Ordered price index: a threaded left-leaning red-black tree.
//!
//! Maps the active prices of one side to their level-pool indexes. Nodes
//! live in a slab arena and are addressed by `usize` keys, so the tree can
//! hand out node handles without sharing references. On top of the usual
//! BST links, every node carries `prev`/`next` pointers forming the
//! in-order doubly-linked list of all nodes, and the tree caches the list
//! endpoints. Depth walks therefore start at the best price and hop
//! neighbors in O(1) instead of re-descending.
//!
//! Rotations and color flips reorder parent/child links only; they never
//! change the in-order sequence, so the threading is repaired exclusively
//! where a node physically enters or leaves the tree.

use crate::order::Price;
use slab::Slab;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug)]
struct Node {
    price: Price,
    /// Index of this price's level in the book's level pool.
    level: usize,
    left: Option<usize>,
    right: Option<usize>,
    color: Color,
    /// In-order predecessor (next worse bid / next better ask).
    prev: Option<usize>,
    /// In-order successor.
    next: Option<usize>,
}

/// Balanced ordered map from price to level index with O(1) in-order
/// neighbor traversal from any node handle.
#[derive(Debug, Default)]
pub struct PriceTree {
    nodes: Slab<Node>,
    root: Option<usize>,
    /// Leftmost node (lowest price).
    first: Option<usize>,
    /// Rightmost node (highest price).
    last: Option<usize>,
    len: usize,
}

impl PriceTree {
    pub fn with_capacity(cap: usize) -> Self {
        PriceTree {
            nodes: Slab::with_capacity(cap),
            ..PriceTree::default()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Level index stored under `price`, if present.
    pub fn get(&self, price: Price) -> Option<usize> {
        let mut cur = self.root;
        while let Some(c) = cur {
            match price.cmp(&self.nodes[c].price) {
                Ordering::Less => cur = self.nodes[c].left,
                Ordering::Greater => cur = self.nodes[c].right,
                Ordering::Equal => return Some(self.nodes[c].level),
            }
        }
        None
    }

    /// Handle of the lowest-price node, or `None` if the tree is empty.
    pub fn min_pointer(&self) -> Option<usize> {
        self.first
    }

    /// Handle of the highest-price node, or `None` if the tree is empty.
    pub fn max_pointer(&self) -> Option<usize> {
        self.last
    }

    /// In-order successor of `node`.
    pub fn next(&self, node: usize) -> Option<usize> {
        self.nodes[node].next
    }

    /// In-order predecessor of `node`.
    pub fn prev(&self, node: usize) -> Option<usize> {
        self.nodes[node].prev
    }

    pub fn price_at(&self, node: usize) -> Price {
        self.nodes[node].price
    }

    pub fn level_at(&self, node: usize) -> usize {
        self.nodes[node].level
    }

    /// Insert `price → level`. On a duplicate price the stored level index
    /// is replaced; the book never inserts a duplicate in normal flow.
    pub fn put(&mut self, price: Price, level: usize) {
        let (pred, succ) = self.neighbors_of(price);
        let mut created = None;
        let root = self.put_at(self.root, price, level, &mut created);
        self.root = Some(root);
        self.nodes[root].color = Color::Black;
        if let Some(id) = created {
            self.link_between(id, pred, succ);
            self.len += 1;
        }
    }

    /// Remove the node at `price`. No-op if absent.
    pub fn delete(&mut self, price: Price) {
        if self.get(price).is_none() {
            return;
        }
        let root = self.root.unwrap();
        if !self.is_red(self.left(root)) && !self.is_red(self.right(root)) {
            self.nodes[root].color = Color::Red;
        }
        self.root = self.delete_at(root, price);
        if let Some(r) = self.root {
            self.nodes[r].color = Color::Black;
        }
    }

    // In-order predecessor and successor an insert at `price` would have.
    // Meaningless when `price` is already present (the caller ignores it).
    fn neighbors_of(&self, price: Price) -> (Option<usize>, Option<usize>) {
        let (mut pred, mut succ) = (None, None);
        let mut cur = self.root;
        while let Some(c) = cur {
            match price.cmp(&self.nodes[c].price) {
                Ordering::Less => {
                    succ = Some(c);
                    cur = self.nodes[c].left;
                }
                Ordering::Greater => {
                    pred = Some(c);
                    cur = self.nodes[c].right;
                }
                Ordering::Equal => break,
            }
        }
        (pred, succ)
    }

    fn link_between(&mut self, id: usize, pred: Option<usize>, succ: Option<usize>) {
        self.nodes[id].prev = pred;
        self.nodes[id].next = succ;
        match pred {
            Some(p) => self.nodes[p].next = Some(id),
            None => self.first = Some(id),
        }
        match succ {
            Some(s) => self.nodes[s].prev = Some(id),
            None => self.last = Some(id),
        }
    }

    fn unlink(&mut self, id: usize) {
        let prev = self.nodes[id].prev;
        let next = self.nodes[id].next;
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.last = prev,
        }
    }

    // Physically remove `id`: repair the threading, then free the slot.
    fn splice(&mut self, id: usize) {
        self.unlink(id);
        self.nodes.remove(id);
        self.len -= 1;
    }

    fn left(&self, h: usize) -> Option<usize> {
        self.nodes[h].left
    }

    fn right(&self, h: usize) -> Option<usize> {
        self.nodes[h].right
    }

    fn is_red(&self, h: Option<usize>) -> bool {
        h.is_some_and(|h| self.nodes[h].color == Color::Red)
    }

    fn rotate_left(&mut self, h: usize) -> usize {
        let x = self.nodes[h].right.unwrap();
        let x_left = self.nodes[x].left;
        let h_color = self.nodes[h].color;
        self.nodes[h].right = x_left;
        self.nodes[x].left = Some(h);
        self.nodes[x].color = h_color;
        self.nodes[h].color = Color::Red;
        x
    }

    fn rotate_right(&mut self, h: usize) -> usize {
        let x = self.nodes[h].left.unwrap();
        let x_right = self.nodes[x].right;
        let h_color = self.nodes[h].color;
        self.nodes[h].left = x_right;
        self.nodes[x].right = Some(h);
        self.nodes[x].color = h_color;
        self.nodes[h].color = Color::Red;
        x
    }

    fn flip_color(&mut self, h: usize) {
        self.nodes[h].color = match self.nodes[h].color {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        };
    }

    fn flip_colors(&mut self, h: usize) {
        self.flip_color(h);
        let l = self.left(h).unwrap();
        let r = self.right(h).unwrap();
        self.flip_color(l);
        self.flip_color(r);
    }

    fn move_red_left(&mut self, mut h: usize) -> usize {
        self.flip_colors(h);
        let r = self.right(h).unwrap();
        if self.is_red(self.left(r)) {
            let r = self.rotate_right(r);
            self.nodes[h].right = Some(r);
            h = self.rotate_left(h);
            self.flip_colors(h);
        }
        h
    }

    fn move_red_right(&mut self, mut h: usize) -> usize {
        self.flip_colors(h);
        let l = self.left(h).unwrap();
        if self.is_red(self.left(l)) {
            h = self.rotate_right(h);
            self.flip_colors(h);
        }
        h
    }

    fn balance(&mut self, mut h: usize) -> usize {
        if self.is_red(self.right(h)) && !self.is_red(self.left(h)) {
            h = self.rotate_left(h);
        }
        let left_left = self.left(h).and_then(|l| self.left(l));
        if self.is_red(self.left(h)) && self.is_red(left_left) {
            h = self.rotate_right(h);
        }
        if self.is_red(self.left(h)) && self.is_red(self.right(h)) {
            self.flip_colors(h);
        }
        h
    }

    fn min_node(&self, mut h: usize) -> usize {
        while let Some(l) = self.left(h) {
            h = l;
        }
        h
    }

    fn put_at(
        &mut self,
        h: Option<usize>,
        price: Price,
        level: usize,
        created: &mut Option<usize>,
    ) -> usize {
        let Some(mut h) = h else {
            let id = self.nodes.insert(Node {
                price,
                level,
                left: None,
                right: None,
                color: Color::Red,
                prev: None,
                next: None,
            });
            *created = Some(id);
            return id;
        };

        match price.cmp(&self.nodes[h].price) {
            Ordering::Less => {
                let l = self.put_at(self.left(h), price, level, created);
                self.nodes[h].left = Some(l);
            }
            Ordering::Greater => {
                let r = self.put_at(self.right(h), price, level, created);
                self.nodes[h].right = Some(r);
            }
            Ordering::Equal => self.nodes[h].level = level,
        }

        if self.is_red(self.right(h)) && !self.is_red(self.left(h)) {
            h = self.rotate_left(h);
        }
        let left_left = self.left(h).and_then(|l| self.left(l));
        if self.is_red(self.left(h)) && self.is_red(left_left) {
            h = self.rotate_right(h);
        }
        if self.is_red(self.left(h)) && self.is_red(self.right(h)) {
            self.flip_colors(h);
        }
        h
    }

    fn delete_min_at(&mut self, mut h: usize) -> Option<usize> {
        if self.left(h).is_none() {
            self.splice(h);
            return None;
        }
        let left_left = self.left(h).and_then(|l| self.left(l));
        if !self.is_red(self.left(h)) && !self.is_red(left_left) {
            h = self.move_red_left(h);
        }
        let l = self.delete_min_at(self.left(h).unwrap());
        self.nodes[h].left = l;
        Some(self.balance(h))
    }

    fn delete_at(&mut self, mut h: usize, price: Price) -> Option<usize> {
        if price < self.nodes[h].price {
            let left_left = self.left(h).and_then(|l| self.left(l));
            if !self.is_red(self.left(h)) && !self.is_red(left_left) {
                h = self.move_red_left(h);
            }
            let l = self.delete_at(self.left(h).unwrap(), price);
            self.nodes[h].left = l;
        } else {
            if self.is_red(self.left(h)) {
                h = self.rotate_right(h);
            }
            if price == self.nodes[h].price && self.right(h).is_none() {
                self.splice(h);
                return None;
            }
            let right_left = self.right(h).and_then(|r| self.left(r));
            if !self.is_red(self.right(h)) && !self.is_red(right_left) {
                h = self.move_red_right(h);
            }
            if price == self.nodes[h].price {
                // Two-children case: adopt the in-order successor's payload,
                // then splice the successor out of the right subtree. The
                // successor's thread unlink bridges this node to the rest of
                // the list, so the threading stays consistent without
                // touching this node's own prev/next.
                let m = self.min_node(self.right(h).unwrap());
                let (m_price, m_level) = (self.nodes[m].price, self.nodes[m].level);
                self.nodes[h].price = m_price;
                self.nodes[h].level = m_level;
                let r = self.delete_min_at(self.right(h).unwrap());
                self.nodes[h].right = r;
            } else {
                let r = self.delete_at(self.right(h).unwrap(), price);
                self.nodes[h].right = r;
            }
        }
        Some(self.balance(h))
    }
}
