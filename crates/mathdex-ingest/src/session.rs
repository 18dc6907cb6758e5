use anyhow::Result;
use tracing::{debug, warn};

use mathdex_core::error::Error;
use mathdex_core::traits::{BlobStore, MathIndex, OffsetStore, Segmenter, TermIndex, TexParser};
use mathdex_core::types::{DocId, Position, Slice, Span, MATH_SENTINEL};

/// Handles to the backing structures, assigned once at pipeline setup.
pub struct Indices {
    pub term: Box<dyn TermIndex>,
    pub math: Box<dyn MathIndex>,
    pub offsets: Box<dyn OffsetStore>,
    pub url_blobs: Box<dyn BlobStore>,
    pub text_blobs: Box<dyn BlobStore>,
}

/// One open document. Constructing the session is the Idle -> Open
/// transition; `end` consumes it, so routing into a closed document does
/// not compile.
pub struct DocumentSession<'a> {
    indices: &'a mut Indices,
    tex: &'a dyn TexParser,
    segmenter: &'a dyn Segmenter,
    last_doc_id: &'a mut DocId,
    doc_id: DocId,
    position: Position,
}

impl<'a> DocumentSession<'a> {
    pub(crate) fn begin(
        indices: &'a mut Indices,
        tex: &'a dyn TexParser,
        segmenter: &'a dyn Segmenter,
        last_doc_id: &'a mut DocId,
    ) -> Self {
        indices.term.begin_document();
        let doc_id = *last_doc_id + 1;
        Self { indices, tex, segmenter, last_doc_id, doc_id, position: 0 }
    }

    /// The predicted id this document will commit under. Valid for keying
    /// writes until `end` confirms it.
    pub fn doc_id(&self) -> DocId {
        self.doc_id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Dispatch one lexer slice. Every indexed token advances the position
    /// counter by exactly one, whatever its modality.
    pub fn route(&mut self, slice: Slice) -> Result<()> {
        match slice {
            Slice::Math { text, span } => self.index_math(&text, span),
            Slice::PlainText { text, span } => self.index_text_run(&text, span),
            Slice::EnglishText { text, span } => {
                // Already one token; the lexer segmented it.
                let term = text.to_ascii_lowercase();
                self.index_term(&term, span)
            }
        }
    }

    fn index_math(&mut self, text: &str, span: Span) -> Result<()> {
        debug!(%text, offset = span.offset, "math slice");

        // The sentinel keeps position numbers synchronous between the term
        // index and the math index, parse or no parse.
        self.indices.term.add_token(MATH_SENTINEL)?;

        let tex = strip_math_markup(text);
        match self.tex.parse(tex) {
            Ok(subpaths) => {
                self.indices
                    .math
                    .add_expression(self.doc_id, self.position, subpaths)?;
            }
            Err(e) => warn!("parsing TeX (`{tex}`) error: {e}"),
        }

        // Offset covers the whole tagged span, saved before the position
        // advances.
        self.save_offset(span);
        self.position += 1;
        Ok(())
    }

    fn index_text_run(&mut self, text: &str, span: Span) -> Result<()> {
        // ASCII case folding only, so the segmenter's byte spans stay valid.
        let lowered = text.to_ascii_lowercase();
        for word in self.segmenter.segment(&lowered) {
            // adjust the word span from slice-relative to document-relative
            let adjusted = Span::new(span.offset + word.span.offset, word.span.n_bytes);
            self.index_term(&word.text, adjusted)?;
        }
        Ok(())
    }

    fn index_term(&mut self, term: &str, span: Span) -> Result<()> {
        debug!(%term, offset = span.offset, n_bytes = span.n_bytes, "term");
        self.indices.term.add_token(term)?;
        self.save_offset(span);
        self.position += 1;
        Ok(())
    }

    // A failed put is a durability gap, reported but not fatal to the
    // record.
    fn save_offset(&mut self, span: Span) {
        if let Err(e) = self.indices.offsets.put(self.doc_id, self.position, span) {
            warn!(
                doc_id = self.doc_id,
                position = self.position,
                "offset put error: {e}"
            );
        }
    }

    /// Store the full source text, compressed, under the predicted id.
    /// Runs while the session is still open: the id is confirmed only at
    /// `end`.
    pub fn write_text_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.indices.text_blobs.write(self.doc_id, bytes)
    }

    /// Commit the document. The id the term index hands back must equal the
    /// prediction every blob and offset write was keyed to; anything else
    /// means those writes reference a document that does not exist.
    pub fn end(self) -> Result<DocId> {
        let committed = self.indices.term.end_document()?;
        if committed != self.doc_id {
            return Err(Error::DocIdDesync {
                expected: self.doc_id,
                committed,
            }
            .into());
        }
        *self.last_doc_id = committed;
        Ok(committed)
    }
}

/// Drop the `$`/`$$` wrapping from a math slice, leaving the TeX source.
pub(crate) fn strip_math_markup(text: &str) -> &str {
    let t = text.trim();
    if let Some(inner) = t.strip_prefix("$$").and_then(|s| s.strip_suffix("$$")) {
        return inner.trim();
    }
    if let Some(inner) = t.strip_prefix('$').and_then(|s| s.strip_suffix('$')) {
        return inner.trim();
    }
    t
}
