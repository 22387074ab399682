//! Bounded top-K selection over streamed scores.
//!
//! [`BoundedTop`] keeps at most `capacity` elements: either the highest
//! scoring ones (evicting the minimum) or the lowest (evicting the maximum).
//! [`Ranker`] keeps one of each for a stream of scored phrases.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

/// Anything that carries a score.
pub trait Scored {
    fn score(&self) -> f64;
}

/// Which end of the score range a [`BoundedTop`] retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    Highest,
    Lowest,
}

/// Heap slot ordered so the element to evict next sits on top.
#[derive(Debug)]
struct Slot<T> {
    /// Score oriented so that larger means "evict first".
    key: f64,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // on equal keys the newer slot is evicted first
        self.key
            .total_cmp(&other.key)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Fixed-capacity selection of the highest or lowest scored elements.
///
/// # Example
/// ```
/// use anomalia_core::ranking::{BoundedTop, Keep, Scored};
///
/// struct S(f64);
/// impl Scored for S {
///     fn score(&self) -> f64 { self.0 }
/// }
///
/// let mut top = BoundedTop::new(2, Keep::Highest);
/// for s in [0.3, 0.9, 0.1, 0.5] {
///     top.insert(S(s));
/// }
/// let kept: Vec<f64> = top.into_sorted_vec().iter().map(|s| s.0).collect();
/// assert_eq!(kept, vec![0.9, 0.5]);
/// ```
#[derive(Debug)]
pub struct BoundedTop<T: Scored> {
    heap: BinaryHeap<Slot<T>>,
    capacity: usize,
    keep: Keep,
    seq: u64,
}

impl<T: Scored> BoundedTop<T> {
    pub fn new(capacity: usize, keep: Keep) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
            keep,
            seq: 0,
        }
    }

    fn orient(&self, score: f64) -> f64 {
        match self.keep {
            Keep::Highest => -score,
            Keep::Lowest => score,
        }
    }

    /// Offer `item`. Returns whether it is retained after the call.
    ///
    /// NaN scores are never retained.
    pub fn insert(&mut self, item: T) -> bool {
        let score = item.score();
        if score.is_nan() || self.capacity == 0 {
            return false;
        }
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(Slot {
            key: self.orient(score),
            seq,
            item,
        });
        if self.heap.len() > self.capacity {
            if let Some(evicted) = self.heap.pop() {
                return evicted.seq != seq;
            }
        }
        true
    }

    /// Score an element must beat to enter a full set.
    pub fn threshold(&self) -> Option<f64> {
        if self.heap.len() < self.capacity {
            return None;
        }
        self.heap.peek().map(|s| s.item.score())
    }

    /// Smallest retained score.
    pub fn min(&self) -> Option<f64> {
        self.heap.iter().map(|s| s.item.score()).min_by(f64::total_cmp)
    }

    /// Largest retained score.
    pub fn max(&self) -> Option<f64> {
        self.heap.iter().map(|s| s.item.score()).max_by(f64::total_cmp)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn keep(&self) -> Keep {
        self.keep
    }

    /// Retained elements, best first: descending for [`Keep::Highest`],
    /// ascending for [`Keep::Lowest`]. Ties keep insertion order.
    pub fn into_sorted_vec(self) -> Vec<T> {
        // ascending oriented key == best first
        self.heap.into_sorted_vec().into_iter().map(|s| s.item).collect()
    }
}

/// A phrase with its tags and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPhrase {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
    pub score: f64,
}

impl Scored for ScoredPhrase {
    fn score(&self) -> f64 {
        self.score
    }
}

/// Most and least expected phrases of a stream.
#[derive(Debug)]
pub struct Ranker {
    highest: BoundedTop<ScoredPhrase>,
    lowest: BoundedTop<ScoredPhrase>,
    discarded: usize,
}

impl Ranker {
    pub fn new(capacity: usize) -> Self {
        Self {
            highest: BoundedTop::new(capacity, Keep::Highest),
            lowest: BoundedTop::new(capacity, Keep::Lowest),
            discarded: 0,
        }
    }

    /// Offer a phrase to both ends. Empty and zero-score phrases are
    /// discarded; returns false for those.
    pub fn offer(&mut self, phrase: ScoredPhrase) -> bool {
        if phrase.tokens.is_empty() || phrase.score == 0.0 || phrase.score.is_nan() {
            self.discarded += 1;
            return false;
        }
        self.highest.insert(phrase.clone());
        self.lowest.insert(phrase);
        true
    }

    /// Phrases discarded by [`Ranker::offer`].
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn highest(&self) -> &BoundedTop<ScoredPhrase> {
        &self.highest
    }

    pub fn lowest(&self) -> &BoundedTop<ScoredPhrase> {
        &self.lowest
    }

    /// `(highest descending, lowest ascending)`.
    pub fn finish(self) -> (Vec<ScoredPhrase>, Vec<ScoredPhrase>) {
        (self.highest.into_sorted_vec(), self.lowest.into_sorted_vec())
    }
}
