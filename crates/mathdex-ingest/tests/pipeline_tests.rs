use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::TempDir;

use mathdex_core::config::IngestSettings;
use mathdex_core::traits::{BlobStore, Lexer, MathIndex, OffsetStore, TermIndex};
use mathdex_core::types::{DocId, Position, Slice, Span};
use mathdex_ingest::{AsciiWordSegmenter, DollarMathLexer, IngestOutcome, Indices, Ingestor, SkipReason};
use mathdex_store::{BlobFile, GzCodec, MemMathIndex, MemTermIndex, OffsetLog, SubpathParser};

/// Cloneable handle so the test keeps a view into a collaborator after the
/// ingestor takes ownership of its box.
#[derive(Clone)]
struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().expect("collaborator lock")
    }
}

impl TermIndex for Shared<MemTermIndex> {
    fn begin_document(&mut self) {
        self.lock().begin_document();
    }
    fn add_token(&mut self, term: &str) -> Result<()> {
        self.lock().add_token(term)
    }
    fn end_document(&mut self) -> Result<DocId> {
        self.lock().end_document()
    }
    fn poll_maintenance(&mut self) -> bool {
        self.lock().poll_maintenance()
    }
}

impl MathIndex for Shared<MemMathIndex> {
    fn add_expression(
        &mut self,
        doc_id: DocId,
        position: Position,
        subpaths: Vec<String>,
    ) -> Result<()> {
        self.lock().add_expression(doc_id, position, subpaths)
    }
}

impl OffsetStore for Shared<OffsetLog> {
    fn put(&mut self, doc_id: DocId, position: Position, span: Span) -> Result<()> {
        self.lock().put(doc_id, position, span)
    }
    fn flush(&mut self) -> Result<()> {
        self.lock().flush()
    }
}

impl BlobStore for Shared<BlobFile> {
    fn write(&mut self, doc_id: DocId, bytes: &[u8]) -> Result<()> {
        self.lock().write(doc_id, bytes)
    }
}

struct TestPipeline {
    term: Shared<MemTermIndex>,
    math: Shared<MemMathIndex>,
    offsets: Shared<OffsetLog>,
    url_blobs: Shared<BlobFile>,
    text_blobs: Shared<BlobFile>,
    offsets_path: PathBuf,
    ingestor: Ingestor,
    _tmp: TempDir,
}

fn pipeline() -> TestPipeline {
    pipeline_with(MemTermIndex::new(), test_settings())
}

fn pipeline_with(term_index: MemTermIndex, settings: IngestSettings) -> TestPipeline {
    let tmp = TempDir::new().expect("tempdir");
    let offsets_path = tmp.path().join("offsets.jsonl");
    let term = Shared::new(term_index);
    let math = Shared::new(MemMathIndex::new());
    let offsets = Shared::new(OffsetLog::new(offsets_path.clone()));
    let url_blobs = Shared::new(BlobFile::create(&tmp.path().join("url.blob")).expect("blob"));
    let text_blobs = Shared::new(BlobFile::create(&tmp.path().join("text.blob")).expect("blob"));
    let indices = Indices {
        term: Box::new(term.clone()),
        math: Box::new(math.clone()),
        offsets: Box::new(offsets.clone()),
        url_blobs: Box::new(url_blobs.clone()),
        text_blobs: Box::new(text_blobs.clone()),
    };
    let ingestor = Ingestor::new(
        indices,
        Box::new(SubpathParser),
        Box::new(AsciiWordSegmenter),
        Box::new(GzCodec),
        settings,
    );
    TestPipeline {
        term,
        math,
        offsets,
        url_blobs,
        text_blobs,
        offsets_path,
        ingestor,
        _tmp: tmp,
    }
}

fn test_settings() -> IngestSettings {
    IngestSettings {
        max_record_bytes: 1024 * 1024,
        maintenance_pause_ms: 0,
    }
}

fn record(url: &str, text: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "url": url, "text": text })).expect("record json")
}

#[test]
fn committed_ids_are_dense_and_sequential() {
    let mut p = pipeline();
    let lexer = DollarMathLexer;
    for n in 1..=5u32 {
        let raw = record(&format!("http://example.com/{n}"), "A ball.");
        let outcome = p.ingestor.ingest_record(&raw, &lexer).expect("ingest");
        assert_eq!(outcome, IngestOutcome::Indexed(n));
    }
    assert_eq!(p.ingestor.last_doc_id(), 5);

    // same corpus again: no deduplication, ids keep counting
    for n in 6..=10u32 {
        let raw = record(&format!("http://example.com/{}", n - 5), "A ball.");
        let outcome = p.ingestor.ingest_record(&raw, &lexer).expect("ingest");
        assert_eq!(outcome, IngestOutcome::Indexed(n));
    }
}

#[test]
fn every_token_gets_an_offset_record_even_when_tex_fails() {
    let mut p = pipeline();
    let raw = record("http://example.com", "Alpha beta $x^2$ gamma $\\foo$");
    let outcome = p.ingestor.ingest_record(&raw, &DollarMathLexer).expect("ingest");
    assert_eq!(outcome, IngestOutcome::Indexed(1));

    // alpha beta <math> gamma <failed math> = 5 tokens, positions 0..=4
    let offsets = p.offsets.lock();
    assert_eq!(offsets.len(), 5);
    for position in 0..=4u32 {
        assert!(offsets.get(1, position).is_some(), "position {position}");
    }
    assert!(offsets.get(1, 5).is_none(), "positions are dense, no extras");

    // only the parsable expression reached the math index
    let math = p.math.lock();
    assert_eq!(math.len(), 1);
    assert!(math.subpaths_at(1, 2).is_some());

    // both math slices registered the sentinel term
    assert_eq!(p.term.lock().postings("math_exp"), &[1]);
}

#[test]
fn unparsable_math_degrades_to_offset_only() {
    let mut p = pipeline();
    let raw = record("http://example.com", "$\\foo$");
    p.ingestor.ingest_record(&raw, &DollarMathLexer).expect("ingest");

    assert!(p.math.lock().is_empty());
    let offsets = p.offsets.lock();
    assert_eq!(offsets.len(), 1);
    assert_eq!(offsets.get(1, 0), Some(Span::new(0, 6)));
    assert_eq!(p.term.lock().postings("math_exp"), &[1]);
}

#[test]
fn example_record_end_to_end() {
    let mut p = pipeline();
    let text = "A ball. $x^2$";
    let raw = record("http://example.com", text);
    let outcome = p.ingestor.ingest_record(&raw, &DollarMathLexer).expect("ingest");
    assert_eq!(outcome, IngestOutcome::Indexed(1));

    // URL stored raw, text stored compressed, both under the committed id
    assert_eq!(p.url_blobs.lock().read(1).expect("url"), b"http://example.com");
    let stored = p.text_blobs.lock().read(1).expect("text");
    assert_ne!(stored.as_slice(), text.as_bytes());
    assert_eq!(GzCodec.decompress(&stored).expect("gunzip"), text.as_bytes());

    // "a" and "ball" at positions 0 and 1, the math expression at 2
    let offsets = p.offsets.lock();
    assert_eq!(offsets.get(1, 0), Some(Span::new(0, 1)));
    assert_eq!(offsets.get(1, 1), Some(Span::new(2, 4)));
    assert_eq!(offsets.get(1, 2), Some(Span::new(8, 5)));

    let term = p.term.lock();
    assert_eq!(term.postings("a"), &[1]);
    assert_eq!(term.postings("ball"), &[1]);
    assert_eq!(term.postings("math_exp"), &[1]);

    let math = p.math.lock();
    assert_eq!(
        math.subpaths_at(1, 2).expect("expression"),
        &["sup/base/var_x".to_string(), "sup/script/num_2".to_string()]
    );
}

#[test]
fn rejected_records_leave_no_state_behind() {
    let mut p = pipeline_with(
        MemTermIndex::new(),
        IngestSettings {
            max_record_bytes: 64,
            maintenance_pause_ms: 0,
        },
    );
    let lexer = DollarMathLexer;

    let oversize = record("http://example.com", &"x".repeat(200));
    assert_eq!(
        p.ingestor.ingest_record(&oversize, &lexer).expect("ingest"),
        IngestOutcome::Skipped(SkipReason::Oversize)
    );
    assert_eq!(
        p.ingestor.ingest_record(br#"{"url":"u"}"#, &lexer).expect("ingest"),
        IngestOutcome::Skipped(SkipReason::MissingField("text"))
    );
    assert_eq!(
        p.ingestor.ingest_record(b"{broken", &lexer).expect("ingest"),
        IngestOutcome::Skipped(SkipReason::InvalidJson)
    );

    assert_eq!(p.ingestor.last_doc_id(), 0);
    assert_eq!(p.term.lock().doc_count(), 0);
    assert!(p.math.lock().is_empty());
    assert!(p.offsets.lock().is_empty());
    assert!(p.url_blobs.lock().is_empty());
    assert!(p.text_blobs.lock().is_empty());
}

#[test]
fn maintenance_flushes_offsets_to_disk() {
    let mut p = pipeline_with(MemTermIndex::with_merge_every(1), test_settings());
    let raw = record("http://example.com", "A ball.");
    p.ingestor.ingest_record(&raw, &DollarMathLexer).expect("ingest");

    let flushed = OffsetLog::load(p.offsets_path.clone()).expect("flushed log");
    assert_eq!(flushed.len(), 2);
    assert_eq!(flushed.get(1, 1), Some(Span::new(2, 4)));
}

#[test]
fn english_slices_index_as_single_pre_segmented_tokens() {
    let mut p = pipeline();
    let mut session = p.ingestor.begin_document();
    session
        .route(Slice::EnglishText {
            text: "Ball".to_string(),
            span: Span::new(0, 4),
        })
        .expect("route");
    session
        .route(Slice::Math {
            text: "$x^2$".to_string(),
            span: Span::new(5, 5),
        })
        .expect("route");
    let doc_id = session.end().expect("commit");
    assert_eq!(doc_id, 1);
    assert_eq!(p.ingestor.last_doc_id(), 1);

    // case-folded whole-slice token at position 0, math at position 1
    assert_eq!(p.term.lock().postings("ball"), &[1]);
    assert_eq!(p.offsets.lock().get(1, 0), Some(Span::new(0, 4)));
    assert_eq!(p.offsets.lock().get(1, 1), Some(Span::new(5, 5)));
    assert!(p.math.lock().subpaths_at(1, 1).is_some());
}

#[test]
fn offset_store_failure_is_reported_not_fatal() {
    struct FailingOffsets;
    impl OffsetStore for FailingOffsets {
        fn put(&mut self, _doc_id: DocId, _position: Position, _span: Span) -> Result<()> {
            bail!("disk full")
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    let tmp = TempDir::new().expect("tempdir");
    let term = Shared::new(MemTermIndex::new());
    let indices = Indices {
        term: Box::new(term.clone()),
        math: Box::new(MemMathIndex::new()),
        offsets: Box::new(FailingOffsets),
        url_blobs: Box::new(BlobFile::create(&tmp.path().join("url.blob")).expect("blob")),
        text_blobs: Box::new(BlobFile::create(&tmp.path().join("text.blob")).expect("blob")),
    };
    let mut ingestor = Ingestor::new(
        indices,
        Box::new(SubpathParser),
        Box::new(AsciiWordSegmenter),
        Box::new(GzCodec),
        test_settings(),
    );

    let raw = record("http://example.com", "A ball.");
    let outcome = ingestor.ingest_record(&raw, &DollarMathLexer).expect("ingest");
    assert_eq!(outcome, IngestOutcome::Indexed(1));
    assert_eq!(term.lock().postings("ball"), &[1]);
}

#[test]
fn scripted_lexer_drives_routing_in_supplied_order() {
    struct ScriptedLexer(Vec<Slice>);
    impl Lexer for ScriptedLexer {
        fn slices<'a>(&self, _text: &'a str) -> Box<dyn Iterator<Item = Slice> + 'a> {
            Box::new(self.0.clone().into_iter())
        }
    }

    let mut p = pipeline();
    let lexer = ScriptedLexer(vec![
        Slice::EnglishText {
            text: "Riemann".to_string(),
            span: Span::new(0, 7),
        },
        Slice::PlainText {
            text: " zeta function ".to_string(),
            span: Span::new(7, 15),
        },
    ]);
    let raw = record("http://example.com", "ignored by the scripted lexer");
    p.ingestor.ingest_record(&raw, &lexer).expect("ingest");

    let offsets = p.offsets.lock();
    assert_eq!(offsets.get(1, 0), Some(Span::new(0, 7)));
    assert_eq!(offsets.get(1, 1), Some(Span::new(8, 4)));
    assert_eq!(offsets.get(1, 2), Some(Span::new(13, 8)));
    let term = p.term.lock();
    assert_eq!(term.postings("riemann"), &[1]);
    assert_eq!(term.postings("zeta"), &[1]);
    assert_eq!(term.postings("function"), &[1]);
}
