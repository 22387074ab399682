//! Phrase scorer.
//!
//! A phrase is framed with the sentinels and every real token becomes one
//! position. Each position carries up to three components: the smoothed
//! probability of the token window centered on it, the same for the tag
//! window, and the emission probability of the token given its tag. The
//! configured [`Composition`] folds all of them into a single score.
use crate::config::{Composition, ScoringConfig};
use crate::error::{ModelError, Result};
use crate::interpolation::ChainModel;
use crate::lexicon::TagLexicon;
use crate::ngram::frame;

/// Components computed for one token of a phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub token_chain: Option<f64>,
    pub tag_chain: Option<f64>,
    pub emission: Option<f64>,
}

impl Position {
    /// Enabled components, in a fixed order.
    pub fn components(&self) -> impl Iterator<Item = f64> {
        [self.token_chain, self.tag_chain, self.emission]
            .into_iter()
            .flatten()
    }
}

/// Fold per-position components into a phrase score.
///
/// Phrases without positions or without any enabled component score 0.
pub fn compose(positions: &[Position], composition: Composition) -> f64 {
    if positions.is_empty() || positions.iter().all(|p| p.components().next().is_none()) {
        return 0.0;
    }
    let n = positions.len() as f64;
    match composition {
        Composition::Additive => {
            positions.iter().flat_map(Position::components).sum::<f64>() / n
        }
        Composition::Multiplicative => {
            let product: f64 = positions.iter().flat_map(Position::components).product();
            product.powf(1.0 / n)
        }
    }
}

/// Scores phrases against frozen token and tag models.
#[derive(Debug, Clone, Copy)]
pub struct PhraseScorer<'m> {
    tokens: &'m ChainModel,
    tags: &'m ChainModel,
    lexicon: &'m TagLexicon,
    scoring: &'m ScoringConfig,
}

impl<'m> PhraseScorer<'m> {
    pub fn new(
        tokens: &'m ChainModel,
        tags: &'m ChainModel,
        lexicon: &'m TagLexicon,
        scoring: &'m ScoringConfig,
    ) -> Self {
        Self {
            tokens,
            tags,
            lexicon,
            scoring,
        }
    }

    /// Components of every position of an untagged phrase. Only the token
    /// chain can be computed. Empty phrases and empty tokens are rejected.
    pub fn token_positions<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Position>> {
        check_tokens(tokens)?;
        let mut positions = vec![Position::default(); tokens.len()];
        if self.scoring.token_chain {
            let probs = self.tokens.position_scores(&frame(tokens))?;
            for (p, v) in positions.iter_mut().zip(probs) {
                p.token_chain = Some(v);
            }
        }
        Ok(positions)
    }

    /// Components of every position of a tagged phrase.
    pub fn tagged_positions<S: AsRef<str>, T: AsRef<str>>(
        &self,
        tokens: &[S],
        tags: &[T],
    ) -> Result<Vec<Position>> {
        if tokens.len() != tags.len() {
            return Err(ModelError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        if tags.iter().any(|t| t.as_ref().is_empty()) {
            return Err(ModelError::EmptyTag);
        }
        let mut positions = self.token_positions(tokens)?;
        if self.scoring.tag_chain {
            let probs = self.tags.position_scores(&frame(tags))?;
            for (p, v) in positions.iter_mut().zip(probs) {
                p.tag_chain = Some(v);
            }
        }
        if self.scoring.emission {
            for ((p, token), tag) in positions.iter_mut().zip(tokens).zip(tags) {
                p.emission = Some(self.lexicon.emission(token.as_ref(), tag.as_ref()));
            }
        }
        Ok(positions)
    }

    /// Score of an untagged phrase.
    pub fn score_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Result<f64> {
        let positions = self.token_positions(tokens)?;
        Ok(compose(&positions, self.scoring.composition))
    }

    /// Score of a tagged phrase.
    pub fn score_tagged<S: AsRef<str>, T: AsRef<str>>(&self, tokens: &[S], tags: &[T]) -> Result<f64> {
        let positions = self.tagged_positions(tokens, tags)?;
        Ok(compose(&positions, self.scoring.composition))
    }
}

fn check_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<()> {
    if tokens.is_empty() {
        return Err(ModelError::PhraseTooShort { len: 0, min: 1 });
    }
    if tokens.iter().any(|t| t.as_ref().is_empty()) {
        return Err(ModelError::EmptyToken);
    }
    Ok(())
}
