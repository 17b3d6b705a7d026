//! Sorted set: a member-to-score map paired with a skip list
//!
//! The two sides mirror each other exactly: every member in the map appears
//! once in the skip list with the mapped score, and nothing else does. All
//! mutations go through [`SortedSet::add`], which keeps the pair in step
//! under every insert/update ordering.
//!
//! # Example
//!
//! ```
//! use minnow_store::sorted_set::SortedSet;
//!
//! let mut zset = SortedSet::new();
//! zset.add(1.0, "a");
//! zset.add(2.0, "b");
//! assert_eq!(zset.rank("b", false), Some(1));
//! assert_eq!(zset.score("a"), Some(1.0));
//! ```

use crate::skip_list::SkipList;
use minnow_core::Score;
use std::collections::HashMap;

/// Score/member pairs ordered by (score, member)
pub struct SortedSet {
    list: SkipList,
    scores: HashMap<String, Score>,
}

impl SortedSet {
    /// Creates an empty sorted set
    pub fn new() -> Self {
        Self {
            list: SkipList::new(),
            scores: HashMap::new(),
        }
    }

    /// Inserts `member` at `score`, or moves it there if already present
    ///
    /// Returns false only for an empty member name, which is rejected.
    /// Re-adding a member at its current score is a successful no-op.
    pub fn add(&mut self, score: Score, member: &str) -> bool {
        if member.is_empty() {
            return false;
        }

        match self.scores.get(member).copied() {
            Some(current) => {
                if current != score {
                    if let Some(node) = self.list.update_score(current, member, score) {
                        self.scores
                            .insert(member.to_string(), self.list.node_score(node));
                    }
                }
                true
            }
            None => {
                let node = self.list.insert(score, member);
                self.scores
                    .insert(member.to_string(), self.list.node_score(node));
                true
            }
        }
    }

    /// 0-based rank of `member`, counted from the lowest score; with
    /// `reverse`, counted from the highest
    pub fn rank(&self, member: &str, reverse: bool) -> Option<u64> {
        let score = self.scores.get(member).copied()?;
        let rank = u64::from(self.list.rank(score, member));
        if reverse {
            Some(u64::from(self.list.len()) - rank)
        } else {
            Some(rank - 1)
        }
    }

    /// The member's score, if present
    pub fn score(&self, member: &str) -> Option<Score> {
        self.scores.get(member).copied()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true when the set has no members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members in rank order with their scores, lowest first
    pub fn iter(&self) -> impl Iterator<Item = (&str, Score)> {
        self.list.iter()
    }
}

impl Default for SortedSet {
    fn default() -> Self {
        Self::new()
    }
}
