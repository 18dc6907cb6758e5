use thiserror::Error;

use crate::types::DocId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The term index committed a document under an id other than the one
    /// every blob and offset write for this record was keyed to. The
    /// pipeline must stop; continuing would cross-reference corrupt data.
    #[error("Document id desynchronized: predicted {expected}, committed {committed}")]
    DocIdDesync { expected: DocId, committed: DocId },

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
