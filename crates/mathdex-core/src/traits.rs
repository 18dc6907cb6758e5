use crate::types::{DocId, Position, Slice, Span, Subpath, WordToken};

/// Inverted term index. Documents are indexed one at a time: `begin_document`
/// opens the next document, `end_document` commits it and returns the id the
/// engine assigned. Ids are sequential starting at 1.
pub trait TermIndex: Send + Sync {
    fn begin_document(&mut self);
    fn add_token(&mut self, term: &str) -> anyhow::Result<()>;
    fn end_document(&mut self) -> anyhow::Result<DocId>;
    /// True if the engine ran internal maintenance (merge/optimize) as a
    /// side effect of the most recent commit. Consumes the signal.
    fn poll_maintenance(&mut self) -> bool;
}

/// Structural math-expression index.
pub trait MathIndex: Send + Sync {
    fn add_expression(
        &mut self,
        doc_id: DocId,
        position: Position,
        subpaths: Vec<Subpath>,
    ) -> anyhow::Result<()>;
}

/// TeX to structural-subpath parser. A parse failure is an expected outcome
/// for real-world corpora, not a pipeline error.
pub trait TexParser: Send + Sync {
    fn parse(&self, tex: &str) -> anyhow::Result<Vec<Subpath>>;
}

/// Durable map from (document, position) to the token's byte span in the
/// source text.
pub trait OffsetStore: Send + Sync {
    fn put(&mut self, doc_id: DocId, position: Position, span: Span) -> anyhow::Result<()>;
    fn flush(&mut self) -> anyhow::Result<()>;
}

/// Byte-blob storage keyed by document id.
pub trait BlobStore: Send + Sync {
    fn write(&mut self, doc_id: DocId, bytes: &[u8]) -> anyhow::Result<()>;
}

/// Compression codec for text blobs.
pub trait Codec: Send + Sync {
    fn compress(&self, bytes: &[u8]) -> anyhow::Result<Vec<u8>>;
}

/// Splits a lowercased text run into word tokens with byte spans relative
/// to the start of the run.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<WordToken>;
}

/// Splits raw document text into typed slices, lazily and in document
/// order.
pub trait Lexer: Send + Sync {
    fn slices<'a>(&self, text: &'a str) -> Box<dyn Iterator<Item = Slice> + 'a>;
}
