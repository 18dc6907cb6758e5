use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use mathdex_core::traits::OffsetStore;
use mathdex_core::types::{DocId, Position, Span};

#[derive(Serialize, Deserialize)]
struct OffsetLine {
    doc_id: DocId,
    position: Position,
    offset: u32,
    n_bytes: u32,
}

/// Offset map held in memory and made durable as JSON Lines on `flush`.
pub struct OffsetLog {
    path: PathBuf,
    entries: BTreeMap<(DocId, Position), Span>,
}

impl OffsetLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: BTreeMap::new(),
        }
    }

    /// Reload a previously flushed log.
    pub fn load(path: PathBuf) -> Result<Self> {
        let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
        let mut entries = BTreeMap::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let rec: OffsetLine = serde_json::from_str(&line)?;
            entries.insert(
                (rec.doc_id, rec.position),
                Span::new(rec.offset, rec.n_bytes),
            );
        }
        Ok(Self { path, entries })
    }

    pub fn get(&self, doc_id: DocId, position: Position) -> Option<Span> {
        self.entries.get(&(doc_id, position)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OffsetStore for OffsetLog {
    fn put(&mut self, doc_id: DocId, position: Position, span: Span) -> Result<()> {
        self.entries.insert((doc_id, position), span);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file =
            File::create(&self.path).with_context(|| format!("create {}", self.path.display()))?;
        let mut out = BufWriter::new(file);
        for (&(doc_id, position), span) in &self.entries {
            let rec = OffsetLine {
                doc_id,
                position,
                offset: span.offset,
                n_bytes: span.n_bytes,
            };
            serde_json::to_writer(&mut out, &rec)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }
}
