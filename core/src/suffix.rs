//! Suffix back-off index.
//!
//! Rare tokens are generalized by their endings. Every suffix of a rare token
//! (longest first, at most `max_len` characters, down to one character) takes
//! over the token's unigram count and the counts of every chain that ends in
//! the token.
//!
//! Chains are stored right-to-left: the root is the ending, its neighbors are
//! the preceding token and their neighbors the token before that. Context
//! tokens are referenced by their ordinal in the main [`ChainGraph`], so an
//! ending and a context token can never collide.
use tracing::debug;

use crate::error::Result;
use crate::ngram::{is_sentinel, ChainGraph, ChainNode, ORDER};
use crate::trie::PrefixIndex;

/// Suffix threshold used when none is configured.
pub const DEFAULT_THRESHOLD: u32 = 10;

/// Longest suffix considered, in characters.
pub const DEFAULT_MAX_LEN: usize = 4;

/// Endings of `token`, longest first, each one character shorter than the
/// previous.
///
/// ```
/// use anomalia_core::suffix::endings;
///
/// let e: Vec<&str> = endings("andavo", 4).collect();
/// assert_eq!(e, vec!["davo", "avo", "vo", "o"]);
/// assert_eq!(endings("è", 4).collect::<Vec<_>>(), vec!["è"]);
/// ```
pub fn endings(token: &str, max_len: usize) -> impl Iterator<Item = &str> + '_ {
    let starts: Vec<usize> = token.char_indices().map(|(i, _)| i).collect();
    let n = starts.len();
    let take = n.min(max_len);
    (n - take..n).map(move |k| &token[starts[k]..])
}

/// Second chain graph keyed by word endings.
#[derive(Debug, Clone, Default)]
pub struct SuffixIndex {
    endings: PrefixIndex<ChainNode>,
    threshold: u32,
    max_len: usize,
}

impl SuffixIndex {
    /// Replay the chains of `graph` that end in a rare token.
    ///
    /// A token is rare when its root frequency is below `threshold`. The
    /// `START` / `STOP` sentinels are never rare.
    pub fn build(graph: &ChainGraph, threshold: u32, max_len: usize) -> Result<Self> {
        let mut index = Self {
            endings: PrefixIndex::new(),
            threshold,
            max_len,
        };

        let rare: Vec<bool> = graph
            .roots()
            .map(|(_, token, n)| n.freq < threshold && !is_sentinel(token))
            .collect();
        let is_rare = |o: u32| rare.get(o as usize).copied().unwrap_or(false);

        for chain in graph.chains() {
            let Some(&last) = chain.ordinals.last() else {
                continue;
            };
            if !is_rare(last) {
                continue;
            }
            let Some(token) = graph.token(last) else {
                continue;
            };
            // context, nearest token first
            let context: Vec<u32> = chain.ordinals[..chain.ordinals.len() - 1]
                .iter()
                .rev()
                .copied()
                .collect();
            for ending in endings(token, max_len) {
                index.add(ending, &context, chain.freq)?;
            }
        }

        debug!(
            endings = index.endings.size(),
            threshold,
            max_len,
            "built suffix index"
        );
        Ok(index)
    }

    /// Add `freq` observations of `ending` preceded by `context`
    /// (nearest token first).
    fn add(&mut self, ending: &str, context: &[u32], freq: u32) -> Result<()> {
        let (_, root) = self.endings.get_or_insert_with(ending, ChainNode::new)?;
        let Some((&last, walk)) = context.split_last() else {
            root.freq = root.freq.saturating_add(freq);
            return Ok(());
        };
        let mut node = root;
        for &o in walk {
            node = node
                .neighbors
                .entry(o)
                .or_insert_with(|| ChainNode::new(o));
        }
        node.bump(last, freq);
        Ok(())
    }

    /// Longest ending of `token` present in the index.
    pub fn longest_match<'a>(&self, token: &'a str) -> Option<(&'a str, &ChainNode)> {
        endings(token, self.max_len).find_map(|e| self.endings.get(e).map(|n| (e, n)))
    }

    /// Node for an exact ending.
    pub fn get(&self, ending: &str) -> Option<&ChainNode> {
        self.endings.get(ending)
    }

    /// Frequency of `ending` preceded by `context` (nearest token first,
    /// main-graph ordinals).
    pub fn context_count(&self, ending: &ChainNode, context: &[u32]) -> u32 {
        debug_assert!(context.len() < ORDER);
        let mut node = ending;
        for &o in context {
            match node.next(o) {
                Some(next) => node = next,
                None => return 0,
            }
        }
        node.freq
    }

    pub fn contains(&self, ending: &str) -> bool {
        self.endings.contains(ending)
    }

    /// Number of distinct endings.
    pub fn len(&self) -> usize {
        self.endings.size()
    }

    pub fn is_empty(&self) -> bool {
        self.endings.is_empty()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}
