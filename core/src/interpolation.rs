//! Deleted-estimation smoothing and interpolated trigram probabilities.
//!
//! [`estimate_lambdas`] derives the three interpolation weights from a frozen
//! [`ChainGraph`]. [`ChainModel`] bundles the graph, its suffix back-off index
//! and the weights, and answers smoothed probability queries.
use serde::Serialize;
use tracing::debug;

use crate::config::BigramDenominator;
use crate::error::{ModelError, Result};
use crate::ngram::{is_sentinel, ChainGraph, ORDER};
use crate::suffix::SuffixIndex;

/// Interpolation weights for the unigram, bigram and trigram terms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Lambdas(pub [f64; 3]);

impl Lambdas {
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// True when deleted estimation found no evidence at all.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0.0)
    }

    /// Weighted sum of the three relative frequencies.
    ///
    /// With all-zero weights the trigram term is returned unweighted.
    pub fn blend(&self, uni: f64, bi: f64, tri: f64) -> f64 {
        if self.is_zero() {
            return tri;
        }
        self.0[0] * uni + self.0[1] * bi + self.0[2] * tri
    }
}

/// `(num - 1) / (den - 1)`, or 0 when the denominator is not positive.
fn held_out(num: u32, den: u32) -> f64 {
    let den = den as f64 - 1.0;
    if den <= 0.0 {
        return 0.0;
    }
    (num as f64 - 1.0) / den
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Deleted estimation over every trigram of `graph`, with the bigram ratio
/// taken over the leading pair `first -> prev`.
///
/// For each trigram the order whose leave-one-out ratio is strictly the
/// largest receives the trigram's frequency. A shared maximum awards
/// nothing. The accumulators are normalized to sum to one unless no
/// trigram awarded anything, in which case all weights stay 0.
///
/// # Example
/// ```
/// use anomalia_core::interpolation::estimate_lambdas;
/// use anomalia_core::ngram::{frame, ChainGraph};
///
/// let mut g = ChainGraph::new();
/// g.add_sequence(&frame(&["il", "gatto", "corre"])).unwrap();
/// g.add_sequence(&frame(&["il", "cane", "corre"])).unwrap();
/// let l = estimate_lambdas(&g);
/// assert_eq!(l.0, [1.0, 0.0, 0.0]);
/// ```
pub fn estimate_lambdas(graph: &ChainGraph) -> Lambdas {
    estimate_lambdas_with(graph, BigramDenominator::PairFrequency)
}

/// Deleted estimation with an explicit bigram denominator.
///
/// [`BigramDenominator::PairFrequency`] divides by `f(first -> prev) - 1`,
/// the same denominator as the trigram ratio, so the trigram weight can
/// never strictly win. [`BigramDenominator::RootFrequency`] divides by
/// `f(prev) - 1` instead.
///
/// ```
/// use anomalia_core::config::BigramDenominator;
/// use anomalia_core::interpolation::estimate_lambdas_with;
/// use anomalia_core::ngram::{frame, ChainGraph};
///
/// let mut g = ChainGraph::new();
/// g.add_sequence(&frame(&["il", "gatto", "corre"])).unwrap();
/// g.add_sequence(&frame(&["il", "cane", "corre"])).unwrap();
/// let l = estimate_lambdas_with(&g, BigramDenominator::RootFrequency);
/// assert_eq!(l.0, [0.5, 0.5, 0.0]);
/// ```
pub fn estimate_lambdas_with(graph: &ChainGraph, denominator: BigramDenominator) -> Lambdas {
    let distinct = graph.distinct_tokens() as u32;
    let mut acc = [0f64; 3];
    let mut ties = 0usize;

    for t in graph.trigrams() {
        let node_freq = graph.root(t.node).map(|n| n.freq).unwrap_or(0);
        let pair_freq = graph
            .node_at(&[t.prev, t.node])
            .map(|n| n.freq)
            .unwrap_or(0);
        let bi_den = match denominator {
            BigramDenominator::PairFrequency => t.pair_freq,
            BigramDenominator::RootFrequency => graph.root(t.prev).map(|n| n.freq).unwrap_or(0),
        };

        let uni = held_out(node_freq, distinct);
        let bi = held_out(pair_freq, bi_den);
        let tri = held_out(t.freq, t.pair_freq);

        if uni > bi && uni > tri {
            acc[0] += t.freq as f64;
        } else if bi > uni && bi > tri {
            acc[1] += t.freq as f64;
        } else if tri > uni && tri > bi {
            acc[2] += t.freq as f64;
        } else {
            ties += 1;
        }
    }

    let sum: f64 = acc.iter().sum();
    if sum > 0.0 {
        for a in acc.iter_mut() {
            *a /= sum;
        }
    }
    debug!(lambdas = ?acc, ties, ?denominator, "deleted estimation");
    Lambdas(acc)
}

/// A frozen chain graph ready for probability queries.
#[derive(Debug, Clone)]
pub struct ChainModel {
    graph: ChainGraph,
    suffixes: SuffixIndex,
    lambdas: Lambdas,
}

impl ChainModel {
    /// Freeze `graph`: build its suffix index and estimate the weights.
    pub fn new(
        graph: ChainGraph,
        threshold: u32,
        max_suffix_len: usize,
        denominator: BigramDenominator,
    ) -> Result<Self> {
        let suffixes = SuffixIndex::build(&graph, threshold, max_suffix_len)?;
        let lambdas = estimate_lambdas_with(&graph, denominator);
        Ok(Self {
            graph,
            suffixes,
            lambdas,
        })
    }

    pub fn graph(&self) -> &ChainGraph {
        &self.graph
    }

    pub fn suffixes(&self) -> &SuffixIndex {
        &self.suffixes
    }

    pub fn lambdas(&self) -> Lambdas {
        self.lambdas
    }

    /// Smoothed probability of `node` following `first prev`.
    ///
    /// When the exact trigram was never recorded the node is replaced by its
    /// longest known ending and the suffix counts are interpolated instead.
    /// Without any matching ending the result is 0. Sentinels have no
    /// endings: an unseen trigram ending in one falls back to the sentinel's
    /// own unigram and bigram counts, or to 0 when `prev` was never seen.
    pub fn probability(&self, first: &str, prev: &str, node: &str) -> f64 {
        let g = &self.graph;
        let total = g.total_tokens().min(u32::MAX as u64) as u32;
        let prev_freq = g.count(prev);
        let pair_freq = g.chain_count(&[first, prev]);

        let tri_freq = g.chain_count(&[first, prev, node]);
        if tri_freq > 0 {
            let uni = ratio(g.count(node), total);
            let bi = ratio(g.chain_count(&[prev, node]), prev_freq);
            let tri = ratio(tri_freq, pair_freq);
            return self.lambdas.blend(uni, bi, tri);
        }

        if is_sentinel(node) {
            if prev_freq == 0 {
                return 0.0;
            }
            let uni = ratio(g.count(node), total);
            let bi = ratio(g.chain_count(&[prev, node]), prev_freq);
            return self.lambdas.blend(uni, bi, 0.0);
        }

        let Some((_, ending)) = self.suffixes.longest_match(node) else {
            return 0.0;
        };
        let uni = ratio(ending.freq, total);
        let (bi, tri) = match g.ordinal(prev) {
            Some(p) => {
                let bi = ratio(self.suffixes.context_count(ending, &[p]), prev_freq);
                let tri = match g.ordinal(first) {
                    Some(f) => ratio(self.suffixes.context_count(ending, &[p, f]), pair_freq),
                    None => 0.0,
                };
                (bi, tri)
            }
            None => (0.0, 0.0),
        };
        self.lambdas.blend(uni, bi, tri)
    }

    /// Smoothed probability of a window of exactly [`ORDER`] elements.
    pub fn score_gram<S: AsRef<str>>(&self, window: &[S]) -> Result<f64> {
        match window {
            [first, prev, node] => Ok(self.probability(first.as_ref(), prev.as_ref(), node.as_ref())),
            _ => Err(ModelError::WindowLength {
                expected: ORDER,
                got: window.len(),
            }),
        }
    }

    /// Per-position probabilities of a framed sequence.
    ///
    /// Position `k` covers the window `seq[k-1..=k+1]`; the sentinels at
    /// either end are never positions themselves.
    pub fn position_scores<S: AsRef<str>>(&self, seq: &[S]) -> Result<Vec<f64>> {
        if seq.len() < ORDER - 1 {
            return Err(ModelError::PhraseTooShort {
                len: seq.len(),
                min: ORDER - 1,
            });
        }
        Ok(seq
            .windows(ORDER)
            .map(|w| self.probability(w[0].as_ref(), w[1].as_ref(), w[2].as_ref()))
            .collect())
    }

    /// Mean smoothed probability over a framed sequence.
    pub fn score_chain<S: AsRef<str>>(&self, seq: &[S]) -> Result<f64> {
        let scores = self.position_scores(seq)?;
        if scores.is_empty() {
            return Ok(0.0);
        }
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram::frame;
    use crate::suffix::{DEFAULT_MAX_LEN, DEFAULT_THRESHOLD};

    fn graph_of(sentences: &[&str]) -> ChainGraph {
        let mut g = ChainGraph::new();
        for s in sentences {
            let words: Vec<&str> = s.split_whitespace().collect();
            g.add_sequence(&frame(&words)).unwrap();
        }
        g
    }

    fn model_with(sentences: &[&str], denominator: BigramDenominator) -> ChainModel {
        ChainModel::new(graph_of(sentences), DEFAULT_THRESHOLD, DEFAULT_MAX_LEN, denominator).unwrap()
    }

    fn model_of(sentences: &[&str]) -> ChainModel {
        model_with(sentences, BigramDenominator::PairFrequency)
    }

    #[test]
    fn lambdas_sum_to_one_or_zero() {
        for corpus in [
            vec!["il gatto corre", "il cane corre"],
            vec!["a b c", "a b c", "a b d", "e b c"],
            vec!["solo"],
        ] {
            for denominator in [BigramDenominator::PairFrequency, BigramDenominator::RootFrequency] {
                let l = estimate_lambdas_with(&graph_of(&corpus), denominator);
                let s = l.sum();
                assert!(s == 0.0 || (s - 1.0).abs() < 1e-12, "sum {}", s);
                assert!(l.0.iter().all(|&x| x >= 0.0));
            }
        }
    }

    #[test]
    fn shared_maximum_awards_nothing() {
        // every trigram has bi == tri, so nothing is awarded
        let m = model_of(&["la casa bella", "la casa bella"]);
        assert!(m.lambdas().is_zero());
    }

    #[test]
    fn pair_denominator_never_awards_the_trigram() {
        // bi and tri share a denominator and f(prev, node) >= f(first, prev, node)
        let g = graph_of(&["a b c", "a b c", "a b c", "x b d"]);
        let l = estimate_lambdas_with(&g, BigramDenominator::PairFrequency);
        assert_eq!(l.0[2], 0.0);
    }

    #[test]
    fn root_denominator_lets_the_trigram_win() {
        // (a, b, c): uni 2/6, bi (3-1)/(4-1), tri (3-1)/(3-1)
        let g = graph_of(&["a b c", "a b c", "a b c", "x b d"]);
        let l = estimate_lambdas_with(&g, BigramDenominator::RootFrequency);
        assert!(l.0[2] > 0.0);
        assert!((l.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn denominators_on_the_two_sentence_corpus() {
        let g = graph_of(&["il gatto corre", "il cane corre"]);
        // every awarded trigram goes to the unigram term
        assert_eq!(estimate_lambdas(&g).0, [1.0, 0.0, 0.0]);
        // (gatto, corre, STOP) and (cane, corre, STOP) switch to the bigram
        assert_eq!(
            estimate_lambdas_with(&g, BigramDenominator::RootFrequency).0,
            [0.5, 0.5, 0.0]
        );
    }

    #[test]
    fn zero_lambdas_fall_back_to_trigram_ratio() {
        let l = Lambdas::default();
        assert_eq!(l.blend(0.1, 0.2, 0.7), 0.7);
        let l = Lambdas([0.5, 0.5, 0.0]);
        assert!((l.blend(0.2, 0.4, 0.9) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn seen_trigram_uses_main_counts() {
        let corpus = ["il gatto corre", "il cane corre"];
        // lambdas [1, 0, 0]: unigram share of "corre", 2 of 10
        let p = model_of(&corpus).probability("il", "gatto", "corre");
        assert!((p - 0.2).abs() < 1e-12);
        // lambdas [0.5, 0.5, 0]: 0.5 * 2/10 + 0.5 * f(gatto corre)/f(gatto)
        let p = model_with(&corpus, BigramDenominator::RootFrequency).probability("il", "gatto", "corre");
        assert!((p - 0.6).abs() < 1e-12);
    }

    #[test]
    fn unseen_trigram_backs_off_to_suffix() {
        let corpus = ["il gatto corre", "il cane corre"];
        // "ratto" shares "atto" with "gatto": f(atto) = 1 of 10
        let m = model_of(&corpus);
        let p = m.probability("START", "il", "ratto");
        assert!((p - 0.1).abs() < 1e-12);
        assert_eq!(m.probability("START", "il", "xyz"), 0.0);

        // 0.5 * 1/10 + 0.5 * f(il atto)/f(il)
        let p = model_with(&corpus, BigramDenominator::RootFrequency).probability("START", "il", "ratto");
        assert!((p - 0.3).abs() < 1e-12);
    }

    #[test]
    fn sentinels_never_back_off_to_endings() {
        let m = model_of(&["il gatto corre", "il cane corre"]);
        // "RT" would match the ending of START
        assert_eq!(m.probability("START", "il", "RT"), 0.0);
        assert_eq!(m.probability("zzz", "qqq", "STOP"), 0.0);
        assert_eq!(m.score_chain(&frame(&["xyz", "zzz", "qqq"])), Ok(0.0));
        // a known predecessor keeps the sentinel's own unigram share
        let p = m.probability("il", "corre", "STOP");
        assert!((p - 0.2).abs() < 1e-12);
    }

    #[test]
    fn score_gram_checks_window_length() {
        let m = model_of(&["il gatto corre"]);
        assert!(m.score_gram(&["il", "gatto", "corre"]).is_ok());
        assert_eq!(
            m.score_gram(&["il", "gatto"]),
            Err(ModelError::WindowLength { expected: 3, got: 2 })
        );
    }

    #[test]
    fn short_sequences_are_rejected() {
        let m = model_of(&["il gatto corre"]);
        assert_eq!(
            m.score_chain(&["il"]),
            Err(ModelError::PhraseTooShort { len: 1, min: 2 })
        );
        assert_eq!(m.score_chain(&frame::<&str>(&[])), Ok(0.0));
    }

    #[test]
    fn scoring_is_deterministic() {
        let m = model_of(&["il gatto corre", "il cane corre", "la gatta dorme"]);
        let seq = frame(&["il", "gatta", "corre"]);
        assert_eq!(m.score_chain(&seq), m.score_chain(&seq));
    }
}
