//! mathdex-ingest
//!
//! Orchestration core of the indexer: opens one document at a time against
//! the term index, routes lexer slices to the term/math indexes while
//! keeping a single shared position counter, records a byte span for every
//! token, and drives blob writes and index maintenance around each record.

pub mod lex;
pub mod maintenance;
pub mod record;
pub mod session;

pub use lex::{AsciiWordSegmenter, DollarMathLexer};
pub use record::{IngestOutcome, Ingestor, SkipReason};
pub use session::{DocumentSession, Indices};
