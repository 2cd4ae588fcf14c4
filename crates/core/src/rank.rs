// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rank shift planning
//!
//! Moving an item from rank `current` to rank `target` shifts exactly the
//! block of ranks between the two by one position:
//!
//! - `target < current`: ranks in `[target, current)` move down the list (+1)
//! - `target > current`: ranks in `(current, target]` move up the list (-1)
//! - `target == current`: nothing moves
//!
//! After the shift the target takes `target`, so a dense ordering `1..=N`
//! stays dense. Every rank store applies the same plan, whether it walks
//! rows in memory or issues a ranged `UPDATE`.

/// The block shift implied by moving one item between two ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPlan {
    current: i64,
    target: i64,
}

impl ShiftPlan {
    pub fn new(current: i64, target: i64) -> Self {
        Self { current, target }
    }

    pub fn current(&self) -> i64 {
        self.current
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    /// True when the item stays where it is
    pub fn is_noop(&self) -> bool {
        self.current == self.target
    }

    /// Inclusive bounds of the ranks that move, if any
    pub fn range(&self) -> Option<(i64, i64)> {
        if self.target < self.current {
            Some((self.target, self.current - 1))
        } else if self.target > self.current {
            Some((self.current + 1, self.target))
        } else {
            None
        }
    }

    /// Amount added to every rank inside the range
    pub fn step(&self) -> i64 {
        (self.current - self.target).signum()
    }

    /// Whether another item holding `rank` is moved by this plan
    pub fn shifts(&self, rank: i64) -> bool {
        self.range()
            .is_some_and(|(low, high)| (low..=high).contains(&rank))
    }

    /// New rank of another item currently holding `rank`
    pub fn shifted(&self, rank: i64) -> i64 {
        if self.shifts(rank) {
            rank + self.step()
        } else {
            rank
        }
    }
}

#[cfg(test)]
#[path = "rank_tests.rs"]
mod tests;
