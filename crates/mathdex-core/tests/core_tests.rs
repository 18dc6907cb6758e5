use mathdex_core::config::{expand_path, resolve_with_base, IngestSettings};
use mathdex_core::error::Error;
use mathdex_core::types::{Slice, Span};
use std::path::Path;

#[test]
fn ingest_settings_defaults() {
    let settings = IngestSettings::default();
    assert_eq!(settings.max_record_bytes, 1024 * 1024);
    assert_eq!(settings.maintenance_pause_ms, 2000);
}

#[test]
fn slice_span_is_shared_across_variants() {
    let span = Span::new(8, 5);
    let math = Slice::Math { text: "$x^2$".to_string(), span };
    let plain = Slice::PlainText { text: "a ball".to_string(), span };
    assert_eq!(math.span(), span);
    assert_eq!(plain.span(), math.span());
}

#[test]
fn desync_error_names_both_ids() {
    let err = Error::DocIdDesync { expected: 4, committed: 7 };
    let msg = err.to_string();
    assert!(msg.contains('4') && msg.contains('7'), "got: {msg}");
}

#[test]
fn resolve_with_base_keeps_absolute_paths() {
    let base = Path::new("/srv/corpus");
    assert_eq!(resolve_with_base(base, "/abs/idx"), Path::new("/abs/idx"));
    assert_eq!(resolve_with_base(base, "idx"), Path::new("/srv/corpus/idx"));
}

#[test]
fn expand_path_passes_plain_strings_through() {
    assert_eq!(expand_path("plain/dir"), Path::new("plain/dir"));
}
