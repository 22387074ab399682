//! anomalia-core
//!
//! N-gram models of token and part-of-speech tag sequences, used to rank
//! phrases of a tagged corpus from most to least expected.
//!
//! Training folds tagged sentences into two trigram chain graphs (tokens and
//! tags) and a token/tag co-occurrence lexicon. Freezing derives the suffix
//! back-off indexes and the interpolation weights; the frozen [`Model`]
//! scores phrases and streams them into a bounded top/bottom [`Ranker`].
//!
//! Public API:
//! - `Trainer` - mutable training pass over a corpus
//! - `Model` - frozen models, phrase scoring and ranking
//! - `ChainGraph` / `ChainModel` - trigram counts and smoothed probabilities
//! - `TagLexicon` - emission probabilities with suffix back-off
//! - `Ranker` / `BoundedTop` - streaming top-K selection
//! - `SentenceReader` - tagged corpus input
//! - `MorphDictionary` / `UnknownForms` - dictionary lookups and lexicon diff
//! - `Config` - thresholds and scoring options
use std::io::BufRead;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info};

pub mod error;
pub use error::{ModelError, Result};

pub mod trie;
pub use trie::PrefixIndex;

pub mod ngram;
pub use ngram::{frame, is_sentinel, Chain, ChainGraph, ChainNode, ORDER, START, STOP};

pub mod suffix;
pub use suffix::SuffixIndex;

pub mod interpolation;
pub use interpolation::{estimate_lambdas, estimate_lambdas_with, ChainModel, Lambdas};

pub mod lexicon;
pub use lexicon::{EmissionNode, TagLexicon};

pub mod scorer;
pub use scorer::{PhraseScorer, Position};

pub mod ranking;
pub use ranking::{BoundedTop, Keep, Ranker, Scored, ScoredPhrase};

pub mod corpus;
pub use corpus::{Sentence, SentenceReader};

pub mod morph;
pub use morph::{MorphDictionary, MorphEntry};

pub mod unknown;
pub use unknown::{FormCount, UnknownForms};

pub mod report;
pub use report::{ModelWeights, RankReport, RankedPhrase};

pub mod config;
pub use config::{BigramDenominator, Composition, Config, ScoringConfig};

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}

/// Training pass: chain graphs and lexicon, still mutable.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    tokens: ChainGraph,
    tags: ChainGraph,
    lexicon: TagLexicon,
    sentences: usize,
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tagged sentence (without sentinels) into the model.
    ///
    /// The sentence is validated up front; a rejected sentence changes
    /// nothing.
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
        self.tokens.add_sequence(&frame(tokens))?;
        self.tags.add_sequence(&frame(tags))?;
        self.lexicon.add_sentence(tokens, tags)?;
        self.sentences += 1;
        Ok(())
    }

    /// Train on every sentence of a corpus. Returns the sentences added.
    pub fn train<R: BufRead>(&mut self, mut reader: SentenceReader<R>) -> anyhow::Result<usize> {
        let before = self.sentences;
        for sentence in reader.by_ref() {
            let sentence = sentence.context("reading training corpus")?;
            self.add_sentence(&sentence.tokens, &sentence.tags)?;
        }
        let added = self.sentences - before;
        info!(
            sentences = added,
            skipped_lines = reader.skipped(),
            distinct_tokens = self.tokens.distinct_tokens(),
            distinct_tags = self.tags.distinct_tokens(),
            "training pass done"
        );
        Ok(added)
    }

    pub fn sentences(&self) -> usize {
        self.sentences
    }

    pub fn tokens(&self) -> &ChainGraph {
        &self.tokens
    }

    pub fn tags(&self) -> &ChainGraph {
        &self.tags
    }

    pub fn lexicon(&self) -> &TagLexicon {
        &self.lexicon
    }

    /// Derive the suffix indexes and interpolation weights and freeze.
    pub fn freeze(self, config: &Config) -> Result<Model> {
        let threshold = config.suffix_threshold;
        let max_len = config.max_suffix_length;
        let theta = config
            .suffix_theta
            .unwrap_or_else(|| self.tags.frequency_variance());

        let mut lexicon = self.lexicon;
        lexicon.build_suffix_index(threshold, max_len, theta)?;
        let denominator = config.bigram_denominator;
        let tokens = ChainModel::new(self.tokens, threshold, max_len, denominator)?;
        let tags = ChainModel::new(self.tags, threshold, max_len, denominator)?;
        debug!(
            token_lambdas = ?tokens.lambdas().0,
            tag_lambdas = ?tags.lambdas().0,
            theta,
            "model frozen"
        );

        Ok(Model {
            tokens,
            tags,
            lexicon,
            scoring: config.scoring.clone(),
        })
    }
}

/// Counters of a ranking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankStats {
    /// Sentences read from the corpus.
    pub sentences: usize,
    /// Sentences handed to the ranker.
    pub scored: usize,
    /// Sentences the ranker refused (empty or zero score).
    pub discarded: usize,
}

/// Frozen token and tag models with their lexicon.
#[derive(Debug, Clone)]
pub struct Model {
    tokens: ChainModel,
    tags: ChainModel,
    lexicon: TagLexicon,
    scoring: ScoringConfig,
}

impl Model {
    pub fn tokens(&self) -> &ChainModel {
        &self.tokens
    }

    pub fn tags(&self) -> &ChainModel {
        &self.tags
    }

    pub fn lexicon(&self) -> &TagLexicon {
        &self.lexicon
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn scorer(&self) -> PhraseScorer<'_> {
        PhraseScorer::new(&self.tokens, &self.tags, &self.lexicon, &self.scoring)
    }

    /// Score a tagged phrase (without sentinels). An empty phrase is
    /// rejected.
    ///
    /// # Example
    /// ```
    /// use anomalia_core::{Config, Trainer};
    ///
    /// let mut trainer = Trainer::new();
    /// trainer.add_sentence(&["il", "gatto", "corre"], &["DET", "NOUN", "VERB"]).unwrap();
    /// trainer.add_sentence(&["il", "cane", "corre"], &["DET", "NOUN", "VERB"]).unwrap();
    /// let model = trainer.freeze(&Config::default()).unwrap();
    ///
    /// let tags = ["DET", "NOUN", "VERB"];
    /// let good = model.score_phrase(&["il", "gatto", "corre"], &tags).unwrap();
    /// let bad = model.score_phrase(&["xyz", "zzz", "qqq"], &tags).unwrap();
    /// assert!(good > bad);
    /// ```
    pub fn score_phrase<S: AsRef<str>, T: AsRef<str>>(&self, tokens: &[S], tags: &[T]) -> Result<f64> {
        self.scorer().score_tagged(tokens, tags)
    }

    /// Score a corpus sentence.
    pub fn score(&self, sentence: &Sentence) -> Result<ScoredPhrase> {
        let score = self.score_phrase(&sentence.tokens, &sentence.tags)?;
        Ok(ScoredPhrase {
            tokens: sentence.tokens.clone(),
            tags: sentence.tags.clone(),
            score,
        })
    }

    /// Score every sentence of a corpus into `ranker`.
    pub fn rank<R: BufRead>(
        &self,
        mut reader: SentenceReader<R>,
        ranker: &mut Ranker,
    ) -> anyhow::Result<RankStats> {
        let mut stats = RankStats::default();
        for sentence in reader.by_ref() {
            let sentence = sentence.context("reading corpus to rank")?;
            stats.sentences += 1;
            let phrase = self.score(&sentence)?;
            if ranker.offer(phrase) {
                stats.scored += 1;
            } else {
                stats.discarded += 1;
            }
        }
        info!(
            sentences = stats.sentences,
            scored = stats.scored,
            discarded = stats.discarded,
            skipped_lines = reader.skipped(),
            "ranking pass done"
        );
        Ok(stats)
    }
}
