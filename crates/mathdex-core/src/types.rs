//! Domain types shared by the ingestion pipeline and its backing stores.

use serde::{Deserialize, Serialize};

/// Sequential document identifier, assigned by the term index at commit
/// time. The Nth committed document gets id N; 0 is never a valid id.
pub type DocId = u32;

/// Per-document token ordinal, starting at 0. Text terms and math
/// expressions share one position sequence.
pub type Position = u32;

/// Structural path of a parsed math expression (e.g. `frac/num/var_a`),
/// used for partial structural matching.
pub type Subpath = String;

/// Placeholder term registered in the term index for every math slice, so
/// term positions and math positions stay in lockstep.
pub const MATH_SENTINEL: &str = "math_exp";

/// A byte span inside the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub offset: u32,
    pub n_bytes: u32,
}

impl Span {
    pub fn new(offset: u32, n_bytes: u32) -> Self {
        Self { offset, n_bytes }
    }
}

/// A typed span of raw document text produced by the lexer.
///
/// - `Math`: a tagged math expression, markup included in the span
/// - `PlainText`: an unsegmented text run, to be split into words
/// - `EnglishText`: a run the lexer already segmented into one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slice {
    Math { text: String, span: Span },
    PlainText { text: String, span: Span },
    EnglishText { text: String, span: Span },
}

impl Slice {
    pub fn span(&self) -> Span {
        match self {
            Slice::Math { span, .. }
            | Slice::PlainText { span, .. }
            | Slice::EnglishText { span, .. } => *span,
        }
    }
}

/// One word produced by segmenting a `PlainText` slice. `span` is relative
/// to the start of the slice, not the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub text: String,
    pub span: Span,
}
