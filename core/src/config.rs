//! Training and scoring configuration.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::suffix::{DEFAULT_MAX_LEN, DEFAULT_THRESHOLD};

/// How per-position components are folded into one phrase score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Mean of the summed components.
    #[default]
    Additive,
    /// Geometric mean of the multiplied components.
    Multiplicative,
}

/// Denominator of the bigram leave-one-out ratio in deleted estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BigramDenominator {
    /// `f(first -> prev) - 1`, shared with the trigram ratio.
    #[default]
    PairFrequency,
    /// `f(prev) - 1`, the root frequency of the predecessor.
    RootFrequency,
}

/// Which components the phrase scorer uses and how it combines them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub composition: Composition,
    /// Smoothed trigram probability of the token window.
    pub token_chain: bool,
    /// Smoothed trigram probability of the tag window.
    pub tag_chain: bool,
    /// Emission probability of the token given its tag.
    pub emission: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            composition: Composition::Additive,
            token_chain: true,
            tag_chain: true,
            emission: true,
        }
    }
}

/// Model configuration. Every field has a default so partial TOML files
/// are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Tokens seen fewer times than this feed the suffix indexes.
    pub suffix_threshold: u32,
    /// Longest ending considered, in characters.
    pub max_suffix_length: usize,
    /// Suffix smoothing weight for the lexicon. Derived from the tag
    /// frequency variance when unset.
    pub suffix_theta: Option<f64>,
    pub bigram_denominator: BigramDenominator,
    /// Lowercase corpus tokens on read.
    pub lowercase: bool,
    /// Phrases kept at each end of the ranking.
    pub top_n: usize,
    pub scoring: ScoringConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suffix_threshold: DEFAULT_THRESHOLD,
            max_suffix_length: DEFAULT_MAX_LEN,
            suffix_theta: None,
            bigram_denominator: BigramDenominator::PairFrequency,
            lowercase: false,
            top_n: 500,
            scoring: ScoringConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            top_n = 50

            [scoring]
            composition = "multiplicative"
            emission = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.top_n, 50);
        assert_eq!(cfg.suffix_threshold, 10);
        assert_eq!(cfg.max_suffix_length, 4);
        assert_eq!(cfg.suffix_theta, None);
        assert_eq!(cfg.bigram_denominator, BigramDenominator::PairFrequency);
        assert_eq!(cfg.scoring.composition, Composition::Multiplicative);
        assert!(cfg.scoring.token_chain);
        assert!(!cfg.scoring.emission);
    }

    #[test]
    fn toml_roundtrip_through_file() {
        let mut cfg = Config::default();
        cfg.suffix_theta = Some(0.25);
        cfg.lowercase = true;
        cfg.bigram_denominator = BigramDenominator::RootFrequency;

        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("anomalia_test_config_{}.toml", stamp));

        cfg.save_toml(&path).unwrap();
        let loaded = Config::load_toml(&path).unwrap();
        assert_eq!(loaded, cfg);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn bigram_denominator_names() {
        let cfg = Config::from_toml_str("bigram_denominator = \"root_frequency\"").unwrap();
        assert_eq!(cfg.bigram_denominator, BigramDenominator::RootFrequency);
        assert!(Config::from_toml_str("bigram_denominator = \"prev\"").is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load_toml("/nonexistent/anomalia.toml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/anomalia.toml"));
    }
}
