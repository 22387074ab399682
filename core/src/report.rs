//! Ranking report output, as plain text or JSON.
use std::io::{self, Write};

use serde::Serialize;

use crate::interpolation::Lambdas;
use crate::ranking::ScoredPhrase;
use crate::RankStats;

/// A retained phrase with its position in the ranking (1-based).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPhrase {
    pub rank: usize,
    pub score: f64,
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

/// Interpolation weights of the token and tag models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelWeights {
    pub tokens: Lambdas,
    pub tags: Lambdas,
}

/// Both ends of a ranking plus the counters of the scoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankReport {
    pub stats: RankStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<ModelWeights>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub highest: Vec<RankedPhrase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lowest: Vec<RankedPhrase>,
}

fn ranked(phrases: Vec<ScoredPhrase>) -> Vec<RankedPhrase> {
    phrases
        .into_iter()
        .enumerate()
        .map(|(i, p)| RankedPhrase {
            rank: i + 1,
            score: p.score,
            tokens: p.tokens,
            tags: p.tags,
        })
        .collect()
}

impl RankReport {
    pub fn new(stats: RankStats, highest: Vec<ScoredPhrase>, lowest: Vec<ScoredPhrase>) -> Self {
        Self {
            stats,
            weights: None,
            highest: ranked(highest),
            lowest: ranked(lowest),
        }
    }

    /// Attach the weights the phrases were scored with.
    pub fn with_weights(mut self, tokens: Lambdas, tags: Lambdas) -> Self {
        self.weights = Some(ModelWeights { tokens, tags });
        self
    }

    /// Plain text: a header per non-empty section, then rank, score,
    /// tokens and tags of each phrase followed by a blank line.
    pub fn write_text<W: Write>(&self, mut w: W) -> io::Result<()> {
        for (title, list) in [("highest", &self.highest), ("lowest", &self.lowest)] {
            if list.is_empty() {
                continue;
            }
            writeln!(w, "# {} ({})", title, list.len())?;
            writeln!(w)?;
            for p in list {
                write_phrase(&mut w, p)?;
            }
        }
        Ok(())
    }

    /// Pretty-printed JSON.
    pub fn write_json<W: Write>(&self, w: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(w, self)
    }
}

/// One phrase block of the text report.
pub fn write_phrase<W: Write>(w: &mut W, p: &RankedPhrase) -> io::Result<()> {
    writeln!(w, "{}", p.rank)?;
    writeln!(w, "score: {}", p.score)?;
    writeln!(w, "{}", p.tokens.join(" "))?;
    writeln!(w, "{}", p.tags.join(" "))?;
    writeln!(w)
}
