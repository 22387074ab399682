//! Static morphological dictionary.
//!
//! Loaded once from a flat `form<TAB>lemma<TAB>tag` file. Forms are indexed
//! with an `fst::Map` pointing at a per-form entry list; lemmas and tags are
//! interned so each distinct string is stored once.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use fst::Map;
use tracing::{info, warn};

use crate::trie::PrefixIndex;
use crate::utils::normalize;

/// One analysis of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphEntry<'a> {
    pub lemma: &'a str,
    pub tag: &'a str,
}

/// Immutable form -> analyses lookup.
pub struct MorphDictionary {
    forms: Map<Vec<u8>>,
    /// fst value -> (lemma ordinal, tag ordinal) pairs
    entries: Vec<Vec<(u32, u32)>>,
    lemmas: PrefixIndex<()>,
    tags: PrefixIndex<()>,
}

impl MorphDictionary {
    /// Load a dictionary file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let dict = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("reading {}", path.display()))?;
        info!(forms = dict.len(), tags = dict.tags.size(), path = %path.display(), "loaded morphological dictionary");
        Ok(dict)
    }

    /// Build a dictionary from `form<TAB>lemma<TAB>tag` lines.
    ///
    /// Lines without exactly three non-empty fields are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lemmas = PrefixIndex::new();
        let mut tags = PrefixIndex::new();
        let mut by_form: BTreeMap<String, Vec<(u32, u32)>> = BTreeMap::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<String> = line.split('\t').map(normalize).collect();
            let [form, lemma, tag] = fields.as_slice() else {
                warn!(line = i + 1, "skipping malformed dictionary line");
                continue;
            };
            if form.is_empty() || lemma.is_empty() || tag.is_empty() {
                warn!(line = i + 1, "skipping malformed dictionary line");
                continue;
            }
            let lemma = lemmas.put(lemma, ())?;
            let tag = tags.put(tag, ())?;
            let list = by_form.entry(form.clone()).or_default();
            if !list.contains(&(lemma, tag)) {
                list.push((lemma, tag));
            }
        }

        // BTreeMap iteration is already in the byte order fst requires
        let mut builder = fst::MapBuilder::new(Vec::new())?;
        let mut entries = Vec::with_capacity(by_form.len());
        for (i, (form, list)) in by_form.into_iter().enumerate() {
            builder.insert(&form, i as u64)?;
            entries.push(list);
        }
        let forms = Map::new(builder.into_inner()?)?;

        Ok(Self {
            forms,
            entries,
            lemmas,
            tags,
        })
    }

    pub fn contains(&self, form: &str) -> bool {
        self.forms.contains_key(form)
    }

    /// Every analysis of `form`, in file order. Empty when unknown.
    pub fn get(&self, form: &str) -> Vec<MorphEntry<'_>> {
        let Some(idx) = self.forms.get(form) else {
            return Vec::new();
        };
        let Some(list) = self.entries.get(idx as usize) else {
            return Vec::new();
        };
        list.iter()
            .filter_map(|&(l, t)| {
                Some(MorphEntry {
                    lemma: self.lemmas.key(l)?,
                    tag: self.tags.key(t)?,
                })
            })
            .collect()
    }

    /// Number of distinct forms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct tags in first-seen order.
    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.tags.keys()
    }
}
