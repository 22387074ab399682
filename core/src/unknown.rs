//! Corpus forms missing from the morphological dictionary.
use serde::Serialize;

use crate::morph::MorphDictionary;
use crate::ranking::{BoundedTop, Keep, Scored};
use crate::trie::PrefixIndex;

/// Characters removed before a form is looked up.
const STRIP: &[char] = &['‘', '’', '\'', '~', '&', ';', ',', '.', '"'];

/// Prefixes of URLs, mentions, hashtags and shortened links.
const NOISE_PREFIXES: &[&str] = &["http", "@", "#", "tco"];

/// Clean a corpus form for dictionary lookup.
///
/// Returns `None` for forms that are not worth reporting: links, mentions,
/// hashtags, anything with non-word characters left after cleanup, and
/// forms of two characters or fewer.
///
/// ```
/// use anomalia_core::unknown::clean_form;
///
/// assert_eq!(clean_form("Ciaooo!!").as_deref(), None);
/// assert_eq!(clean_form("L'Amico2,").as_deref(), Some("lamico"));
/// assert_eq!(clean_form("#hashtag"), None);
/// assert_eq!(clean_form("ok"), None);
/// ```
pub fn clean_form(form: &str) -> Option<String> {
    let lower = form.to_lowercase();
    if NOISE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    let cleaned: String = lower
        .chars()
        .filter(|c| !STRIP.contains(c) && !c.is_ascii_digit())
        .collect();
    if cleaned.chars().count() <= 2 {
        return None;
    }
    if !cleaned.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(cleaned)
}

/// A form with its number of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormCount {
    pub form: String,
    pub count: u32,
}

impl Scored for FormCount {
    fn score(&self) -> f64 {
        self.count as f64
    }
}

/// Counts of cleaned corpus forms the dictionary does not know.
pub struct UnknownForms<'d> {
    dict: &'d MorphDictionary,
    counts: PrefixIndex<u32>,
    observed: u64,
}

impl<'d> UnknownForms<'d> {
    pub fn new(dict: &'d MorphDictionary) -> Self {
        Self {
            dict,
            counts: PrefixIndex::new(),
            observed: 0,
        }
    }

    /// Look at one corpus form. Returns true when it was counted as unknown.
    pub fn observe(&mut self, form: &str) -> bool {
        self.observed += 1;
        let Some(cleaned) = clean_form(form) else {
            return false;
        };
        if self.dict.contains(&cleaned) {
            return false;
        }
        match self.counts.get_or_insert_with(&cleaned, |_| 0) {
            Ok((_, count)) => {
                *count += 1;
                true
            }
            Err(_) => false,
        }
    }

    pub fn count(&self, form: &str) -> u32 {
        self.counts.get(form).copied().unwrap_or(0)
    }

    /// Forms looked at so far.
    pub fn observed(&self) -> u64 {
        self.observed
    }

    /// Distinct unknown forms.
    pub fn len(&self) -> usize {
        self.counts.size()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `n` most frequent unknown forms, most frequent first.
    pub fn top(&self, n: usize) -> Vec<FormCount> {
        let mut top = BoundedTop::new(n, Keep::Highest);
        for (_, form, &count) in self.counts.iter() {
            top.insert(FormCount {
                form: form.to_string(),
                count,
            });
        }
        top.into_sorted_vec()
    }
}
