//! Probabilistic ordered index of (score, member) pairs
//!
//! This module implements the skip list backing the sorted set. It keeps
//! pairs in (score ascending, member ascending) order and maintains a span on
//! every forward link, which is what makes rank queries O(log n).
//!
//! ```text
//! Level 2:  HEAD ──────────────────► (3,c) ─► NIL
//! Level 1:  HEAD ──────► (2,b) ────► (3,c) ─► NIL
//! Level 0:  HEAD ─► (1,a) ─► (2,b) ─► (3,c) ─► NIL
//! ```
//!
//! Nodes are arena-allocated: they live in a `Vec`, every link is a stable
//! index into it, and freed slots are recycled through a free list. The head
//! sentinel occupies slot 0 with a minus-infinity score and an empty member;
//! it is never reported as a member.

use minnow_core::Score;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maximum height of the skip list
pub const MAX_LEVEL: usize = 32;

/// Arena slot of the head sentinel
const HEAD: usize = 0;

/// A forward link at one level of a node
///
/// `span` counts the bottom-level positions advanced by following the link,
/// including the destination. A link with no destination keeps span 0; such
/// spans are never read.
#[derive(Debug, Clone, Copy)]
struct Link {
    forward: Option<usize>,
    span: u32,
}

struct Node {
    member: String,
    score: Score,
    /// Bottom-level predecessor; `None` at the first node (the head sentinel
    /// is not part of the backward chain)
    backward: Option<usize>,
    links: Vec<Link>,
}

impl Node {
    fn new(member: String, score: Score, level: usize) -> Self {
        Self {
            member,
            score,
            backward: None,
            links: vec![
                Link {
                    forward: None,
                    span: 0,
                };
                level
            ],
        }
    }
}

/// An ordered index of (score, member) pairs with O(log n) expected
/// insert, delete, update and rank
///
/// Members are compared lexicographically when scores tie. Callers are
/// responsible for member uniqueness; the sorted set enforces it through its
/// member-to-score map.
pub struct SkipList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    tail: Option<usize>,
    length: u32,
    level: usize,
    rng: StdRng,
}

impl SkipList {
    /// Creates an empty skip list
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(String::new(), f64::NEG_INFINITY, MAX_LEVEL)],
            free: Vec::new(),
            tail: None,
            length: 0,
            level: 1,
            rng: StdRng::from_entropy(),
        }
    }

    /// Number of (score, member) pairs in the list
    pub fn len(&self) -> u32 {
        self.length
    }

    /// Returns true if the list holds no pairs
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Score stored at an arena slot returned by [`insert`](Self::insert) or
    /// [`update_score`](Self::update_score)
    pub fn node_score(&self, node: usize) -> Score {
        self.nodes[node].score
    }

    /// Draws the level for a new node: one fair coin flip per extra level,
    /// capped at [`MAX_LEVEL`]
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < MAX_LEVEL && self.rng.gen_bool(0.5) {
            level += 1;
        }
        level
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) {
        self.nodes[slot] = Node::new(String::new(), 0.0, 0);
        self.free.push(slot);
    }

    /// Inserts a new (score, member) pair and returns its arena slot
    ///
    /// The caller must ensure the member is not already present.
    pub fn insert(&mut self, score: Score, member: &str) -> usize {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0u32; MAX_LEVEL];

        // Descend from the top level, recording at each level the last node
        // before the insert position and the bottom-level distance walked.
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[x].links[i].forward {
                let node = &self.nodes[next];
                if node.score < score || (node.score == score && node.member.as_str() <= member) {
                    rank[i] += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let level = self.random_level();
        if level > self.level {
            // Fresh levels start at the head sentinel with nothing walked.
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
            }
            self.level = level;
        }

        let x = self.alloc(Node::new(member.to_string(), score, level));
        for i in 0..level {
            let prev = update[i];
            let next = self.nodes[prev].links[i].forward;
            let walked = rank[0] - rank[i];

            self.nodes[x].links[i].forward = next;
            self.nodes[x].links[i].span = match next {
                Some(_) => self.nodes[prev].links[i].span - walked,
                None => 0,
            };
            self.nodes[prev].links[i].forward = Some(x);
            self.nodes[prev].links[i].span = walked + 1;
        }

        // Untouched higher levels now skip over one more node.
        for i in level..self.level {
            let prev = update[i];
            if self.nodes[prev].links[i].forward.is_some() {
                self.nodes[prev].links[i].span += 1;
            }
        }

        self.nodes[x].backward = if update[0] == HEAD {
            None
        } else {
            Some(update[0])
        };
        match self.nodes[x].links[0].forward {
            Some(next) => self.nodes[next].backward = Some(x),
            None => self.tail = Some(x),
        }

        self.length += 1;
        x
    }

    /// Removes the pair matching both score and member exactly
    ///
    /// Returns false when no such pair exists.
    pub fn delete(&mut self, score: Score, member: &str) -> bool {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let node = &self.nodes[next];
                if node.score < score || (node.score == score && node.member.as_str() < member) {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        match self.nodes[x].links[0].forward {
            Some(target)
                if self.nodes[target].score == score && self.nodes[target].member == member =>
            {
                self.unlink(target, &update);
                self.release(target);
                true
            }
            _ => false,
        }
    }

    /// Moves an existing pair to a new score and returns its live arena slot
    ///
    /// When the new score still fits between the bottom-level neighbors the
    /// node is mutated in place; otherwise it is unlinked and reinserted.
    /// Returns `None` when no pair matches `current_score` and `member`.
    pub fn update_score(
        &mut self,
        current_score: Score,
        member: &str,
        new_score: Score,
    ) -> Option<usize> {
        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let node = &self.nodes[next];
                if node.score < current_score
                    || (node.score == current_score && node.member.as_str() < member)
                {
                    x = next;
                } else {
                    break;
                }
            }
            update[i] = x;
        }

        let x = self.nodes[update[0]].links[0].forward?;
        if self.nodes[x].score != current_score || self.nodes[x].member != member {
            return None;
        }

        // In-place when the order is undisturbed: backward < new < forward.
        let backward_ok = match self.nodes[x].backward {
            Some(prev) => self.nodes[prev].score < new_score,
            None => true,
        };
        let forward_ok = match self.nodes[x].links[0].forward {
            Some(next) => self.nodes[next].score > new_score,
            None => true,
        };
        if backward_ok && forward_ok {
            self.nodes[x].score = new_score;
            return Some(x);
        }

        self.unlink(x, &update);
        self.release(x);
        Some(self.insert(new_score, member))
    }

    /// 1-based rank of the pair matching both score and member, counted from
    /// the lowest-ordered pair; 0 when absent
    pub fn rank(&self, score: Score, member: &str) -> u32 {
        let mut rank = 0u32;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[x].links[i].forward {
                let node = &self.nodes[next];
                if node.score < score || (node.score == score && node.member.as_str() <= member) {
                    rank += self.nodes[x].links[i].span;
                    x = next;
                } else {
                    break;
                }
            }
            if x != HEAD && self.nodes[x].score == score && self.nodes[x].member == member {
                return rank;
            }
        }
        0
    }

    /// Visits every pair in order, lowest first
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            next: self.nodes[HEAD].links[0].forward,
        }
    }

    /// Detaches `x` from every chain it participates in, then fixes the
    /// backward chain, tail, height and length
    fn unlink(&mut self, x: usize, update: &[usize; MAX_LEVEL]) {
        for i in 0..self.level {
            let prev = update[i];
            if self.nodes[prev].links[i].forward == Some(x) {
                let Link { forward, span } = self.nodes[x].links[i];
                match forward {
                    Some(_) => {
                        self.nodes[prev].links[i].span += span - 1;
                        self.nodes[prev].links[i].forward = forward;
                    }
                    None => {
                        self.nodes[prev].links[i] = Link {
                            forward: None,
                            span: 0,
                        };
                    }
                }
            } else if self.nodes[prev].links[i].forward.is_some() {
                self.nodes[prev].links[i].span -= 1;
            }
        }

        match self.nodes[x].links[0].forward {
            Some(next) => self.nodes[next].backward = self.nodes[x].backward,
            None => self.tail = self.nodes[x].backward,
        }

        while self.level > 1 && self.nodes[HEAD].links[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;
    }

    /// Checks that every stored span matches the bottom-level distance it
    /// claims to cover
    #[cfg(test)]
    fn assert_spans_consistent(&self) {
        use std::collections::HashMap;

        let mut positions = HashMap::new();
        positions.insert(HEAD, 0u32);
        let mut position = 0;
        let mut x = HEAD;
        while let Some(next) = self.nodes[x].links[0].forward {
            position += 1;
            positions.insert(next, position);
            x = next;
        }
        assert_eq!(position, self.length, "bottom-level chain length mismatch");
        assert_eq!(self.tail, (x != HEAD).then_some(x), "tail mismatch");

        for (&slot, &position) in &positions {
            for (level, link) in self.nodes[slot].links.iter().enumerate() {
                if let Some(forward) = link.forward {
                    let destination = positions
                        .get(&forward)
                        .unwrap_or_else(|| panic!("level {level} links to an unlinked node"));
                    assert_eq!(
                        link.span,
                        destination - position,
                        "span mismatch at level {level}"
                    );
                }
            }
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over (member, score) pairs along the bottom-level chain
pub struct Iter<'a> {
    list: &'a SkipList,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, Score);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next?;
        let node = &self.list.nodes[slot];
        self.next = node.links[0].forward;
        Some((node.member.as_str(), node.score))
    }
}
