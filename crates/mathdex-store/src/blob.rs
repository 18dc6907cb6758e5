use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use mathdex_core::traits::BlobStore;
use mathdex_core::types::DocId;

/// Append-only blob file. Record layout:
/// - u32 doc id (little endian)
/// - u32 payload length
/// - raw payload bytes
pub struct BlobFile {
    file: File,
    pointers: BTreeMap<DocId, (u64, u32)>,
}

impl BlobFile {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        Ok(Self {
            file,
            pointers: BTreeMap::new(),
        })
    }

    pub fn read(&mut self, doc_id: DocId) -> Result<Vec<u8>> {
        let (offset, len) = *self
            .pointers
            .get(&doc_id)
            .ok_or_else(|| anyhow!("no blob for document {doc_id}"))?;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut payload = vec![0u8; len as usize];
        self.file.read_exact(&mut payload)?;
        Ok(payload)
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}

impl BlobStore for BlobFile {
    fn write(&mut self, doc_id: DocId, bytes: &[u8]) -> Result<()> {
        let start = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&doc_id.to_le_bytes())?;
        self.file.write_all(&(bytes.len() as u32).to_le_bytes())?;
        self.file.write_all(bytes)?;
        self.pointers.insert(doc_id, (start + 8, bytes.len() as u32));
        Ok(())
    }
}
