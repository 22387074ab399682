//! N-gram chain graph over a Prefix Index.
//!
//! Every distinct token owns a root [`ChainNode`] whose `freq` counts its
//! occurrences. Successor edges hang off the roots, keyed by the successor's
//! ordinal, so the node reached by walking `a -> b -> c` holds the number of
//! times that exact chain occurred. Chains never grow past [`ORDER`].
use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use crate::trie::PrefixIndex;

/// Model order. Fixed at trigrams.
pub const ORDER: usize = 3;

/// Sentinel opening every framed sequence.
pub const START: &str = "START";

/// Sentinel closing every framed sequence.
pub const STOP: &str = "STOP";

/// Wrap a sequence with the `START` / `STOP` sentinels.
pub fn frame<S: AsRef<str>>(seq: &[S]) -> Vec<&str> {
    let mut framed = Vec::with_capacity(seq.len() + 2);
    framed.push(START);
    framed.extend(seq.iter().map(|s| s.as_ref()));
    framed.push(STOP);
    framed
}

pub fn is_sentinel(token: &str) -> bool {
    token == START || token == STOP
}

/// A node of the chain graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainNode {
    /// How many times the chain ending at this node occurred.
    pub freq: u32,
    /// Ordinal of the token this node stands for.
    pub ordinal: u32,
    /// Successor edges keyed by ordinal.
    pub neighbors: BTreeMap<u32, ChainNode>,
}

impl ChainNode {
    pub fn new(ordinal: u32) -> Self {
        Self {
            freq: 0,
            ordinal,
            neighbors: BTreeMap::new(),
        }
    }

    /// Bump the edge towards `ordinal`, creating it if needed.
    pub fn bump(&mut self, ordinal: u32, by: u32) -> &mut ChainNode {
        let next = self
            .neighbors
            .entry(ordinal)
            .or_insert_with(|| ChainNode::new(ordinal));
        next.freq = next.freq.saturating_add(by);
        next
    }

    /// Successor reached through `ordinal`.
    pub fn next(&self, ordinal: u32) -> Option<&ChainNode> {
        self.neighbors.get(&ordinal)
    }
}

/// A stored chain: ordinals from the root outwards and the chain's frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub ordinals: Vec<u32>,
    pub freq: u32,
}

/// A trigram as seen by the smoothing estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigram {
    pub first: u32,
    pub prev: u32,
    pub node: u32,
    /// freq(first -> prev)
    pub pair_freq: u32,
    /// freq(first -> prev -> node)
    pub freq: u32,
}

/// Frequency index of order-1..3 chains.
#[derive(Debug, Clone, Default)]
pub struct ChainGraph {
    tokens: PrefixIndex<ChainNode>,
    total: u64,
    /// real sequence length (sentinels excluded) -> number of sequences
    lengths: BTreeMap<usize, u32>,
    sequences: u32,
}

impl ChainGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every chain of a (framed) sequence.
    ///
    /// Each position bumps its token's root and then walks the window of
    /// width [`ORDER`] starting there, trimmed at the right edge. The whole
    /// sequence is validated before anything is counted.
    pub fn add_sequence<S: AsRef<str>>(&mut self, seq: &[S]) -> Result<()> {
        if seq.is_empty() {
            return Err(ModelError::PhraseTooShort { len: 0, min: 1 });
        }
        if seq.iter().any(|s| s.as_ref().is_empty()) {
            return Err(ModelError::EmptyToken);
        }

        let mut ordinals = Vec::with_capacity(seq.len());
        for s in seq {
            let (ordinal, root) = self
                .tokens
                .get_or_insert_with(s.as_ref(), ChainNode::new)?;
            root.freq = root.freq.saturating_add(1);
            ordinals.push(ordinal);
        }
        self.total += seq.len() as u64;

        for start in 0..ordinals.len() {
            let end = (start + ORDER).min(ordinals.len());
            let Some(mut node) = self.tokens.record_mut(ordinals[start]) else {
                continue;
            };
            for &next in &ordinals[start + 1..end] {
                node = node.bump(next, 1);
            }
        }

        *self.lengths.entry(seq.len().saturating_sub(2)).or_insert(0) += 1;
        self.sequences += 1;
        Ok(())
    }

    /// Root frequency of `token`, 0 when unseen.
    pub fn count(&self, token: &str) -> u32 {
        self.tokens.get(token).map(|n| n.freq).unwrap_or(0)
    }

    /// Frequency of an order-1..3 chain, 0 when it was never recorded.
    pub fn chain_count<S: AsRef<str>>(&self, chain: &[S]) -> u32 {
        self.node(chain).map(|n| n.freq).unwrap_or(0)
    }

    /// Node reached by walking `chain` from its first token.
    pub fn node<S: AsRef<str>>(&self, chain: &[S]) -> Option<&ChainNode> {
        let (first, rest) = chain.split_first()?;
        let mut node = self.tokens.get(first.as_ref())?;
        for s in rest {
            node = node.next(self.tokens.ordinal(s.as_ref())?)?;
        }
        Some(node)
    }

    /// Node reached by walking a path of ordinals.
    pub fn node_at(&self, path: &[u32]) -> Option<&ChainNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.tokens.record(*first)?;
        for &o in rest {
            node = node.next(o)?;
        }
        Some(node)
    }

    pub fn root(&self, ordinal: u32) -> Option<&ChainNode> {
        self.tokens.record(ordinal)
    }

    pub fn ordinal(&self, token: &str) -> Option<u32> {
        self.tokens.ordinal(token)
    }

    pub fn token(&self, ordinal: u32) -> Option<&str> {
        self.tokens.key(ordinal)
    }

    /// Every distinct token in ordinal order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.keys()
    }

    /// `(ordinal, token, root)` triples in ordinal order.
    pub fn roots(&self) -> impl Iterator<Item = (u32, &str, &ChainNode)> + '_ {
        self.tokens.iter()
    }

    pub fn distinct_tokens(&self) -> usize {
        self.tokens.size()
    }

    /// Token occurrences, sentinels included.
    pub fn total_tokens(&self) -> u64 {
        self.total
    }

    /// Number of sequences added.
    pub fn sequences(&self) -> u32 {
        self.sequences
    }

    /// Every stored chain, shortest prefix first within each root.
    ///
    /// Walks the graph with an explicit stack; depth never exceeds [`ORDER`].
    pub fn chains(&self) -> Vec<Chain> {
        let mut out = Vec::new();
        let mut stack: Vec<(Vec<u32>, &ChainNode)> =
            self.tokens.iter().map(|(o, _, n)| (vec![o], n)).collect();
        stack.reverse();

        while let Some((path, node)) = stack.pop() {
            if path.len() < ORDER {
                for (&o, next) in node.neighbors.iter().rev() {
                    let mut longer = path.clone();
                    longer.push(o);
                    stack.push((longer, next));
                }
            }
            out.push(Chain {
                ordinals: path,
                freq: node.freq,
            });
        }
        out
    }

    /// Chains rooted at `token` only.
    pub fn chains_from(&self, token: &str) -> Vec<Chain> {
        let Some(root) = self.tokens.ordinal(token) else {
            return Vec::new();
        };
        self.chains()
            .into_iter()
            .filter(|c| c.ordinals[0] == root)
            .collect()
    }

    /// Every order-3 chain together with the frequency of its leading pair.
    pub fn trigrams(&self) -> Vec<Trigram> {
        let mut out = Vec::new();
        for (first, _, root) in self.tokens.iter() {
            for (&prev, pair) in &root.neighbors {
                for (&node, tail) in &pair.neighbors {
                    out.push(Trigram {
                        first,
                        prev,
                        node,
                        pair_freq: pair.freq,
                        freq: tail.freq,
                    });
                }
            }
        }
        out
    }

    /// Population variance of root frequencies.
    pub fn frequency_variance(&self) -> f64 {
        let n = self.tokens.size();
        if n == 0 {
            return 0.0;
        }
        let mean = self.total as f64 / n as f64;
        self.tokens
            .iter()
            .map(|(_, _, node)| {
                let d = node.freq as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64
    }

    /// Sequences whose real length (sentinels excluded) was `len`.
    pub fn phrase_length_count(&self, len: usize) -> u32 {
        self.lengths.get(&len).copied().unwrap_or(0)
    }

    /// Share of sequences with real length `len`.
    ///
    /// Unseen lengths get `1 / sequences` rather than 0.
    pub fn phrase_length_probability(&self, len: usize) -> f64 {
        if self.sequences == 0 {
            return 0.0;
        }
        let count = self.phrase_length_count(len).max(1);
        count as f64 / self.sequences as f64
    }

    /// `(length, count)` pairs in ascending length.
    pub fn phrase_lengths(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.lengths.iter().map(|(&l, &c)| (l, c))
    }
}
