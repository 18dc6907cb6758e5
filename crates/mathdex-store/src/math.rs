use anyhow::Result;
use std::collections::BTreeMap;

use mathdex_core::traits::MathIndex;
use mathdex_core::types::{DocId, Position, Subpath};

/// In-memory structural math index keyed by (document, position).
#[derive(Default)]
pub struct MemMathIndex {
    entries: BTreeMap<(DocId, Position), Vec<Subpath>>,
}

impl MemMathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subpaths_at(&self, doc_id: DocId, position: Position) -> Option<&[Subpath]> {
        self.entries.get(&(doc_id, position)).map(Vec::as_slice)
    }
}

impl MathIndex for MemMathIndex {
    fn add_expression(
        &mut self,
        doc_id: DocId,
        position: Position,
        subpaths: Vec<Subpath>,
    ) -> Result<()> {
        self.entries.insert((doc_id, position), subpaths);
        Ok(())
    }
}
