//! Reference lexer and word segmenter for plain corpora: `$...$` and
//! `$$...$$` spans become math slices (delimiters included in the span),
//! everything between them becomes plain-text runs.

use mathdex_core::traits::{Lexer, Segmenter};
use mathdex_core::types::{Slice, Span, WordToken};

pub struct DollarMathLexer;

impl Lexer for DollarMathLexer {
    fn slices<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = Slice> + 'a> {
        Box::new(SliceIter { text, at: 0 })
    }
}

struct SliceIter<'a> {
    text: &'a str,
    at: usize,
}

impl Iterator for SliceIter<'_> {
    type Item = Slice;

    fn next(&mut self) -> Option<Slice> {
        let rest = &self.text[self.at..];
        if rest.is_empty() {
            return None;
        }

        if let Some(body) = rest.strip_prefix("$$") {
            return match body.find("$$") {
                Some(end) => Some(self.take_math(end + 4)),
                // unterminated display math reads as text
                None => Some(self.take_text(rest.len())),
            };
        }
        if let Some(body) = rest.strip_prefix('$') {
            return match body.find('$') {
                Some(end) => Some(self.take_math(end + 2)),
                None => Some(self.take_text(rest.len())),
            };
        }

        // text run up to the next candidate math tag
        let run = rest.find('$').unwrap_or(rest.len());
        Some(self.take_text(run))
    }
}

impl SliceIter<'_> {
    fn take_math(&mut self, n_bytes: usize) -> Slice {
        let span = Span::new(self.at as u32, n_bytes as u32);
        let slice = Slice::Math {
            text: self.text[self.at..self.at + n_bytes].to_string(),
            span,
        };
        self.at += n_bytes;
        slice
    }

    fn take_text(&mut self, n_bytes: usize) -> Slice {
        let span = Span::new(self.at as u32, n_bytes as u32);
        let slice = Slice::PlainText {
            text: self.text[self.at..self.at + n_bytes].to_string(),
            span,
        };
        self.at += n_bytes;
        slice
    }
}

/// Splits a run on non-alphanumeric bytes. Word spans are byte-accurate and
/// relative to the start of the run; only ASCII is treated as word-forming.
pub struct AsciiWordSegmenter;

impl Segmenter for AsciiWordSegmenter {
    fn segment(&self, text: &str) -> Vec<WordToken> {
        let bytes = text.as_bytes();
        let mut words = Vec::new();
        let mut start: Option<usize> = None;
        for (i, b) in bytes.iter().enumerate() {
            if b.is_ascii_alphanumeric() {
                if start.is_none() {
                    start = Some(i);
                }
            } else if let Some(s) = start.take() {
                words.push(word_at(text, s, i));
            }
        }
        if let Some(s) = start {
            words.push(word_at(text, s, bytes.len()));
        }
        words
    }
}

fn word_at(text: &str, start: usize, end: usize) -> WordToken {
    WordToken {
        text: text[start..end].to_string(),
        span: Span::new(start as u32, (end - start) as u32),
    }
}
