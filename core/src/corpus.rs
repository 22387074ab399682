//! Tagged corpus reader.
//!
//! The corpus holds one `token<TAB>tag` pair per line and a blank line after
//! each sentence. [`SentenceReader`] turns any `BufRead` into a stream of
//! [`Sentence`]s, skipping lines it cannot split or decode as UTF-8.
use std::io::{self, BufRead};

use tracing::warn;

use crate::utils::normalize;

/// One tagged sentence, without sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split a corpus line into a normalized `(token, tag)` pair.
///
/// Returns `None` unless the line has exactly two non-empty tab-separated
/// fields.
pub fn parse_line(line: &str, lowercase: bool) -> Option<(String, String)> {
    let mut fields = line.split('\t');
    let token = fields.next()?;
    let tag = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    let mut token = normalize(token);
    let tag = normalize(tag);
    if token.is_empty() || tag.is_empty() {
        return None;
    }
    if lowercase {
        token = token.to_lowercase();
    }
    Some((token, tag))
}

/// Streaming sentence iterator over a tagged corpus.
///
/// # Example
/// ```
/// use anomalia_core::corpus::SentenceReader;
///
/// let text = "il\tDET\ngatto\tNOUN\n\nciao\tINTJ\n";
/// let sentences: Vec<_> = SentenceReader::new(text.as_bytes())
///     .collect::<std::io::Result<_>>()
///     .unwrap();
/// assert_eq!(sentences.len(), 2);
/// assert_eq!(sentences[0].tokens, vec!["il", "gatto"]);
/// ```
pub struct SentenceReader<R> {
    reader: R,
    lowercase: bool,
    buf: Vec<u8>,
    line_no: usize,
    skipped: usize,
    done: bool,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            lowercase: false,
            buf: Vec::new(),
            line_no: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Lowercase every token.
    pub fn lowercase(mut self, yes: bool) -> Self {
        self.lowercase = yes;
        self
    }

    /// Lines skipped so far because they did not parse or decode.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Lines read so far.
    pub fn lines(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = io::Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut sentence = Sentence::default();
        loop {
            self.buf.clear();
            let n = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            if n == 0 {
                self.done = true;
                return (!sentence.is_empty()).then_some(Ok(sentence));
            }
            self.line_no += 1;

            let Ok(line) = std::str::from_utf8(&self.buf) else {
                self.skipped += 1;
                warn!(line = self.line_no, "skipping corpus line that is not valid UTF-8");
                continue;
            };
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                if sentence.is_empty() {
                    continue;
                }
                return Some(Ok(sentence));
            }
            match parse_line(line, self.lowercase) {
                Some((token, tag)) => {
                    sentence.tokens.push(token);
                    sentence.tags.push(tag);
                }
                None => {
                    self.skipped += 1;
                    warn!(line = self.line_no, "skipping malformed corpus line");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Vec<Sentence> {
        SentenceReader::new(text.as_bytes())
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn blank_lines_split_sentences() {
        let s = read("il\tDET\ngatto\tNOUN\ncorre\tVERB\n\nil\tDET\ncane\tNOUN\n\n");
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].tags, vec!["DET", "NOUN", "VERB"]);
        assert_eq!(s[1].tokens, vec!["il", "cane"]);
    }

    #[test]
    fn trailing_sentence_is_emitted() {
        let s = read("ciao\tINTJ\r\n");
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].tokens, vec!["ciao"]);
        assert_eq!(s[0].tags, vec!["INTJ"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let text = "il\tDET\nrotto\nanche\tquesto\tno\n\tNOUN\ngatto\tNOUN\n";
        let mut reader = SentenceReader::new(text.as_bytes());
        let s = reader.next().unwrap().unwrap();
        assert_eq!(s.tokens, vec!["il", "gatto"]);
        assert!(reader.next().is_none());
        assert_eq!(reader.skipped(), 3);
        assert_eq!(reader.lines(), 5);
    }

    #[test]
    fn undecodable_lines_are_skipped() {
        let data: &[u8] = b"il\tDET\n\xff\xfe\tNOUN\ngatto\tNOUN\n\nciao\tINTJ\n";
        let mut reader = SentenceReader::new(data);
        let s = reader.next().unwrap().unwrap();
        assert_eq!(s.tokens, vec!["il", "gatto"]);
        let s = reader.next().unwrap().unwrap();
        assert_eq!(s.tokens, vec!["ciao"]);
        assert!(reader.next().is_none());
        assert_eq!(reader.skipped(), 1);
        assert_eq!(reader.lines(), 5);
    }

    #[test]
    fn repeated_blank_lines_yield_no_empty_sentences() {
        let s = read("\n\nil\tDET\n\n\n\ngatto\tNOUN\n");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn tokens_are_normalized() {
        // "e" + combining grave composes to "è"
        let s = SentenceReader::new("  E\u{300}\tVERB\n".as_bytes())
            .lowercase(true)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(s.tokens, vec!["è"]);
        assert_eq!(parse_line("Gatto\tNOUN", false), Some(("Gatto".into(), "NOUN".into())));
        assert_eq!(parse_line("x\t", false), None);
    }
}
