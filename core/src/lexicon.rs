//! Token/tag co-occurrence dictionary.
//!
//! Counts how often each token was seen with each tag and turns those counts
//! into emission probabilities `P(token | tag)`. Tokens never seen in
//! training are estimated from the tag distribution of their endings, built
//! from the rare tokens the same way the chain suffix index is.
//!
//! Public API:
//! - `EmissionNode` - occurrences of one token (or ending) and its tag counts
//! - `TagLexicon` - insertion, lookup and the smoothed suffix table
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ModelError, Result};
use crate::suffix::endings;
use crate::trie::PrefixIndex;

/// Occurrences of a token together with its per-tag counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionNode {
    pub freq: u32,
    /// Fractional once smoothed.
    pub tags: BTreeMap<String, f64>,
}

impl EmissionNode {
    pub fn tag(&self, tag: &str) -> f64 {
        self.tags.get(tag).copied().unwrap_or(0.0)
    }
}

/// Emission counts with suffix back-off for unseen tokens.
#[derive(Debug, Clone, Default)]
pub struct TagLexicon {
    tokens: PrefixIndex<EmissionNode>,
    tag_totals: BTreeMap<String, u32>,
    suffixes: PrefixIndex<EmissionNode>,
    max_suffix_len: usize,
}

impl TagLexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `token` with `tag`.
    pub fn add(&mut self, token: &str, tag: &str) -> Result<()> {
        if token.is_empty() {
            return Err(ModelError::EmptyToken);
        }
        if tag.is_empty() {
            return Err(ModelError::EmptyTag);
        }
        let (_, node) = self.tokens.get_or_insert_with(token, |_| EmissionNode::default())?;
        node.freq = node.freq.saturating_add(1);
        *node.tags.entry(tag.to_string()).or_insert(0.0) += 1.0;
        *self.tag_totals.entry(tag.to_string()).or_insert(0) += 1;
        Ok(())
    }

    /// Record a whole tagged sentence. Nothing is counted unless every pair
    /// is valid.
    pub fn add_sentence<S: AsRef<str>, T: AsRef<str>>(&mut self, tokens: &[S], tags: &[T]) -> Result<()> {
        if tokens.len() != tags.len() {
            return Err(ModelError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        if tokens.iter().any(|t| t.as_ref().is_empty()) {
            return Err(ModelError::EmptyToken);
        }
        if tags.iter().any(|t| t.as_ref().is_empty()) {
            return Err(ModelError::EmptyTag);
        }
        for (token, tag) in tokens.iter().zip(tags) {
            self.add(token.as_ref(), tag.as_ref())?;
        }
        Ok(())
    }

    /// Build the smoothed suffix table from tokens seen fewer than
    /// `threshold` times.
    ///
    /// Endings are smoothed from the shortest up: each one blends its own
    /// raw counts with the smoothed counts of the ending one character
    /// shorter, weighted by `theta`.
    pub fn build_suffix_index(&mut self, threshold: u32, max_len: usize, theta: f64) -> Result<()> {
        let mut raw: BTreeMap<&str, EmissionNode> = BTreeMap::new();
        for (_, token, node) in self.tokens.iter() {
            if node.freq >= threshold {
                continue;
            }
            for ending in endings(token, max_len) {
                let e = raw.entry(ending).or_default();
                e.freq = e.freq.saturating_add(node.freq);
                for (tag, &c) in &node.tags {
                    *e.tags.entry(tag.clone()).or_insert(0.0) += c;
                }
            }
        }

        let mut order: Vec<&str> = raw.keys().copied().collect();
        order.sort_by_key(|s| s.chars().count());

        let mut smoothed: PrefixIndex<EmissionNode> = PrefixIndex::new();
        for ending in order {
            let Some(own) = raw.get(ending) else {
                continue;
            };
            let shorter = ending
                .char_indices()
                .nth(1)
                .and_then(|(i, _)| smoothed.get(&ending[i..]))
                .cloned();
            let node = match shorter {
                None => own.clone(),
                Some(base) => {
                    let mut tags = BTreeMap::new();
                    for tag in own.tags.keys().chain(base.tags.keys()) {
                        if tags.contains_key(tag) {
                            continue;
                        }
                        let v = (own.tag(tag) + theta * base.tag(tag)) / (1.0 + theta);
                        tags.insert(tag.clone(), v);
                    }
                    EmissionNode {
                        freq: own.freq,
                        tags,
                    }
                }
            };
            smoothed.put(ending, node)?;
        }

        debug!(
            endings = smoothed.size(),
            threshold,
            max_len,
            theta,
            "built lexicon suffix table"
        );
        self.suffixes = smoothed;
        self.max_suffix_len = max_len;
        Ok(())
    }

    /// Longest ending of `token` in the suffix table.
    pub fn suffix_node(&self, token: &str) -> Option<&EmissionNode> {
        endings(token, self.max_suffix_len).find_map(|e| self.suffixes.get(e))
    }

    /// Smoothed count of `tag` for the longest known ending of `token`.
    pub fn suffix_count(&self, token: &str, tag: &str) -> f64 {
        self.suffix_node(token).map(|n| n.tag(tag)).unwrap_or(0.0)
    }

    /// Times `token` was seen with `tag`; unseen tokens use their ending.
    pub fn count(&self, token: &str, tag: &str) -> f64 {
        match self.tokens.get(token) {
            Some(node) => node.tag(tag),
            None => self.suffix_count(token, tag),
        }
    }

    /// Total occurrences of `tag`.
    pub fn tag_count(&self, tag: &str) -> u32 {
        self.tag_totals.get(tag).copied().unwrap_or(0)
    }

    /// `count(token, tag) / tag_count(tag)`, 0 for an unknown tag.
    pub fn emission(&self, token: &str, tag: &str) -> f64 {
        let total = self.tag_count(tag);
        if total == 0 {
            return 0.0;
        }
        self.count(token, tag) / total as f64
    }

    pub fn get(&self, token: &str) -> Option<&EmissionNode> {
        self.tokens.get(token)
    }

    /// Distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Known tags with their totals, in tag order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.tag_totals.iter().map(|(t, &c)| (t.as_str(), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TagLexicon {
        let mut lex = TagLexicon::new();
        lex.add_sentence(&["il", "gatto", "corre"], &["DET", "NOUN", "VERB"])
            .unwrap();
        lex.add_sentence(&["il", "cane", "corre"], &["DET", "NOUN", "VERB"])
            .unwrap();
        lex
    }

    #[test]
    fn counts_and_emissions() {
        let lex = sample();
        assert_eq!(lex.count("il", "DET"), 2.0);
        assert_eq!(lex.count("il", "NOUN"), 0.0);
        assert_eq!(lex.tag_count("NOUN"), 2);
        assert!((lex.emission("gatto", "NOUN") - 0.5).abs() < 1e-12);
        assert_eq!(lex.emission("gatto", "ADJ"), 0.0);
        assert_eq!(lex.len(), 4);
    }

    #[test]
    fn mismatched_sentence_is_rejected_whole() {
        let mut lex = sample();
        assert_eq!(
            lex.add_sentence(&["la", "casa"], &["DET"]),
            Err(ModelError::LengthMismatch { tokens: 2, tags: 1 })
        );
        assert_eq!(
            lex.add_sentence(&["la", "casa"], &["DET", ""]),
            Err(ModelError::EmptyTag)
        );
        assert!(lex.get("la").is_none());
        assert_eq!(lex.tag_count("DET"), 2);
    }

    #[test]
    fn unseen_tokens_use_suffix_counts() {
        let mut lex = sample();
        lex.build_suffix_index(10, 4, 0.0).unwrap();
        // "ratto" ends like "gatto"
        assert_eq!(lex.count("ratto", "NOUN"), 1.0);
        assert!((lex.emission("ratto", "NOUN") - 0.5).abs() < 1e-12);
        assert_eq!(lex.count("xyz", "NOUN"), 0.0);
    }

    #[test]
    fn smoothing_blends_shorter_endings() {
        let mut lex = TagLexicon::new();
        lex.add("bello", "ADJ").unwrap();
        lex.add("cielo", "NOUN").unwrap();
        lex.build_suffix_index(10, 4, 1.0).unwrap();

        // "o" is its own base: ADJ 1, NOUN 1
        let o = lex.suffix_node("o").unwrap();
        assert_eq!(o.tag("ADJ"), 1.0);
        // "lo" raw: ADJ 1, NOUN 1; blended with "o" at theta 1
        let lo = lex.suffix_node("lo").unwrap();
        assert_eq!(lo.tag("NOUN"), 1.0);
        // "llo" raw: ADJ 1; base "lo"
        let llo = lex.suffix_node("llo").unwrap();
        assert!((llo.tag("ADJ") - 1.0).abs() < 1e-12);
        assert!((llo.tag("NOUN") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn frequent_tokens_stay_out_of_suffix_table() {
        let mut lex = TagLexicon::new();
        for _ in 0..3 {
            lex.add("gatto", "NOUN").unwrap();
        }
        lex.add("rosso", "ADJ").unwrap();
        lex.build_suffix_index(3, 4, 0.5).unwrap();
        assert!(lex.suffix_node("atto").is_some_and(|n| n.tag("NOUN") == 0.0));
        assert_eq!(lex.suffix_count("matto", "NOUN"), 0.0);
        assert_eq!(lex.suffix_count("grosso", "ADJ"), 1.0);
    }

    #[test]
    fn rebuilding_replaces_the_suffix_table() {
        let mut lex = sample();
        assert_eq!(lex.build_suffix_index(10, 4, 0.5), Ok(()));
        assert!(lex.suffix_node("atto").is_some());
        // nothing is rarer than one occurrence
        assert_eq!(lex.build_suffix_index(1, 4, 0.5), Ok(()));
        assert!(lex.suffix_node("atto").is_none());
        assert_eq!(lex.count("ratto", "NOUN"), 0.0);
    }
}
