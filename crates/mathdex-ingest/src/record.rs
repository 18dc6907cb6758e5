use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use mathdex_core::config::IngestSettings;
use mathdex_core::traits::{Codec, Lexer, Segmenter, TexParser};
use mathdex_core::types::DocId;

use crate::maintenance;
use crate::session::{DocumentSession, Indices};

/// Why a record was skipped without touching any backing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Record filled the configured buffer bound; treated as truncated.
    Oversize,
    InvalidJson,
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Indexed(DocId),
    Skipped(SkipReason),
}

/// The single-writer ingestion pipeline: owns the collaborator handles and
/// the last-committed-id bookkeeping that every predicted-id write depends
/// on.
pub struct Ingestor {
    indices: Indices,
    tex: Box<dyn TexParser>,
    segmenter: Box<dyn Segmenter>,
    codec: Box<dyn Codec>,
    settings: IngestSettings,
    last_doc_id: DocId,
}

impl Ingestor {
    pub fn new(
        indices: Indices,
        tex: Box<dyn TexParser>,
        segmenter: Box<dyn Segmenter>,
        codec: Box<dyn Codec>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            indices,
            tex,
            segmenter,
            codec,
            settings,
            last_doc_id: 0,
        }
    }

    pub fn last_doc_id(&self) -> DocId {
        self.last_doc_id
    }

    /// Open a session for the next document. Any URL blob for the record
    /// must already be written; it keys on the same predicted id the
    /// session will verify at `end`.
    pub fn begin_document(&mut self) -> DocumentSession<'_> {
        let Self {
            indices,
            tex,
            segmenter,
            last_doc_id,
            ..
        } = self;
        DocumentSession::begin(indices, tex.as_ref(), segmenter.as_ref(), last_doc_id)
    }

    /// Ingest one JSON corpus record end to end: size gate, field
    /// extraction, URL blob, slice routing, compressed text blob, commit,
    /// maintenance poll.
    pub fn ingest_record(&mut self, raw: &[u8], lexer: &dyn Lexer) -> Result<IngestOutcome> {
        if raw.len() >= self.settings.max_record_bytes {
            warn!("corpus record too large ({} bytes), skipping", raw.len());
            return Ok(IngestOutcome::Skipped(SkipReason::Oversize));
        }

        let (url, text) = match extract_fields(raw) {
            Ok(fields) => fields,
            Err(reason) => return Ok(IngestOutcome::Skipped(reason)),
        };
        debug!(%url, "ingesting record");

        let Self {
            indices,
            tex,
            segmenter,
            codec,
            last_doc_id,
            ..
        } = self;

        // URL blob goes in before the session opens: the predicted id is
        // only good until end() confirms it.
        indices.url_blobs.write(*last_doc_id + 1, url.as_bytes())?;

        let mut session =
            DocumentSession::begin(indices, tex.as_ref(), segmenter.as_ref(), last_doc_id);
        for slice in lexer.slices(&text) {
            session.route(slice)?;
        }

        // Full text blob, compressed, still keyed to the predicted id and
        // written before the session closes.
        let compressed = codec.compress(text.as_bytes())?;
        session.write_text_blob(&compressed)?;

        let doc_id = session.end()?;

        self.maintain()?;
        Ok(IngestOutcome::Indexed(doc_id))
    }

    /// Force the offset records to durable storage, typically at the end of
    /// an ingestion run.
    pub fn finish(&mut self) -> Result<()> {
        self.indices.offsets.flush()
    }

    fn maintain(&mut self) -> Result<()> {
        maintenance::maintain(
            self.indices.term.as_mut(),
            self.indices.offsets.as_mut(),
            Duration::from_millis(self.settings.maintenance_pause_ms),
        )?;
        Ok(())
    }
}

// Both fields must extract before anything is written, so a bad record
// leaves no partial state behind.
fn extract_fields(raw: &[u8]) -> std::result::Result<(String, String), SkipReason> {
    let parsed: Value = match serde_json::from_slice(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("record parse error: {e}");
            return Err(SkipReason::InvalidJson);
        }
    };
    let Some(url) = parsed.get("url").and_then(Value::as_str) else {
        warn!("record has no string `url` field");
        return Err(SkipReason::MissingField("url"));
    };
    let Some(text) = parsed.get("text").and_then(Value::as_str) else {
        warn!("record has no string `text` field");
        return Err(SkipReason::MissingField("text"));
    };
    Ok((url.to_string(), text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{extract_fields, SkipReason};

    #[test]
    fn extracts_url_and_text() {
        let raw = br#"{"url":"http://example.com","text":"A ball."}"#;
        let (url, text) = extract_fields(raw).expect("fields");
        assert_eq!(url, "http://example.com");
        assert_eq!(text, "A ball.");
    }

    #[test]
    fn rejects_non_string_and_missing_fields() {
        assert_eq!(
            extract_fields(br#"{"url":42,"text":"t"}"#),
            Err(SkipReason::MissingField("url"))
        );
        assert_eq!(
            extract_fields(br#"{"url":"u"}"#),
            Err(SkipReason::MissingField("text"))
        );
        assert_eq!(extract_fields(b"not json"), Err(SkipReason::InvalidJson));
    }
}
