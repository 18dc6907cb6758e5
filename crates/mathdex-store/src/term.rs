use anyhow::{bail, Result};
use std::collections::HashMap;

use mathdex_core::traits::TermIndex;
use mathdex_core::types::DocId;

const DEFAULT_MERGE_EVERY: u32 = 8;

/// In-memory inverted term index. Ids are assigned at commit time,
/// sequentially from 1. Every `merge_every` commits the posting lists are
/// compacted, which raises the maintenance flag `poll_maintenance`
/// consumes.
pub struct MemTermIndex {
    postings: HashMap<String, Vec<DocId>>,
    doc_terms: Vec<String>,
    in_doc: bool,
    last_doc_id: DocId,
    merge_every: u32,
    maintained: bool,
}

impl MemTermIndex {
    pub fn new() -> Self {
        Self::with_merge_every(DEFAULT_MERGE_EVERY)
    }

    pub fn with_merge_every(merge_every: u32) -> Self {
        Self {
            postings: HashMap::new(),
            doc_terms: Vec::new(),
            in_doc: false,
            last_doc_id: 0,
            merge_every,
            maintained: false,
        }
    }

    pub fn doc_count(&self) -> u32 {
        self.last_doc_id
    }

    /// Documents containing `term`, in commit order.
    pub fn postings(&self, term: &str) -> &[DocId] {
        self.postings.get(term).map_or(&[], Vec::as_slice)
    }

    fn merge(&mut self) {
        for list in self.postings.values_mut() {
            list.sort_unstable();
            list.dedup();
        }
    }
}

impl Default for MemTermIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TermIndex for MemTermIndex {
    fn begin_document(&mut self) {
        self.in_doc = true;
        self.doc_terms.clear();
    }

    fn add_token(&mut self, term: &str) -> Result<()> {
        if !self.in_doc {
            bail!("add_token outside a document");
        }
        self.doc_terms.push(term.to_string());
        Ok(())
    }

    fn end_document(&mut self) -> Result<DocId> {
        if !self.in_doc {
            bail!("end_document without begin_document");
        }
        self.in_doc = false;
        self.last_doc_id += 1;
        let id = self.last_doc_id;
        // one posting per document however often the term occurred
        self.doc_terms.sort_unstable();
        self.doc_terms.dedup();
        for term in self.doc_terms.drain(..) {
            self.postings.entry(term).or_default().push(id);
        }
        if self.merge_every > 0 && id % self.merge_every == 0 {
            self.merge();
            self.maintained = true;
        }
        Ok(id)
    }

    fn poll_maintenance(&mut self) -> bool {
        std::mem::take(&mut self.maintained)
    }
}
