use std::{env, fs, path::Path, path::PathBuf};

use indicatif::ProgressBar;
use mathdex_core::config::{Config, IngestSettings};
use mathdex_ingest::{AsciiWordSegmenter, DollarMathLexer, IngestOutcome, Indices, Ingestor};
use mathdex_store::{BlobFile, GzCodec, MemMathIndex, MemTermIndex, OffsetLog, SubpathParser};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut corpus_dir = None; let mut max_records = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--max-records" | "-n" => { if i + 1 < args.len() { if let Ok(n) = args[i + 1].parse::<usize>() { max_records = Some(n); i += 1; } else { eprintln!("Error: --max-records requires a number"); std::process::exit(1); } } else { eprintln!("Error: --max-records requires a number"); std::process::exit(1); } }
        _ if !args[i].starts_with('-') => corpus_dir = Some(PathBuf::from(&args[i])), _ => {} } i += 1; }
    let corpus_dir = corpus_dir.unwrap_or_else(|| { let dir: String = config.get("corpus.json_dir").unwrap_or_else(|_| "../dev_data/json".to_string()); PathBuf::from(dir) });
    let index_dir = PathBuf::from(config.get::<String>("index.dir").unwrap_or_else(|_| "../dev_data/indexes/mathdex".to_string()));
    let settings: IngestSettings = config.get("ingest").unwrap_or_default();

    println!("Mathdex Indexer\n===============");
    println!("Corpus directory: {}", corpus_dir.display());
    println!("Index directory: {}", index_dir.display());

    if index_dir.exists() { fs::remove_dir_all(&index_dir)?; }
    fs::create_dir_all(&index_dir)?;

    let indices = Indices {
        term: Box::new(MemTermIndex::new()),
        math: Box::new(MemMathIndex::new()),
        offsets: Box::new(OffsetLog::new(index_dir.join("offsets.jsonl"))),
        url_blobs: Box::new(BlobFile::create(&index_dir.join("url.blob"))?),
        text_blobs: Box::new(BlobFile::create(&index_dir.join("text.blob"))?),
    };
    let mut ingestor = Ingestor::new(indices, Box::new(SubpathParser), Box::new(AsciiWordSegmenter), Box::new(GzCodec), settings);

    let mut files = list_json_files(&corpus_dir);
    if files.is_empty() { println!("No .json records found under {}.", corpus_dir.display()); return Ok(()); }
    if let Some(limit) = max_records { if files.len() > limit { files.truncate(limit); println!("🔢 Limited to first {} records", limit); } }

    let bar = ProgressBar::new(files.len() as u64);
    let lexer = DollarMathLexer;
    let mut indexed = 0usize; let mut skipped = 0usize;
    for file in &files {
        let raw = fs::read(file)?;
        match ingestor.ingest_record(&raw, &lexer)? {
            IngestOutcome::Indexed(_) => indexed += 1,
            IngestOutcome::Skipped(reason) => { skipped += 1; bar.println(format!("⚠️  Skipped {}: {:?}", file.display(), reason)); }
        }
        bar.inc(1);
    }
    bar.finish();
    ingestor.finish()?;

    println!("\n✅ Indexing completed successfully!");
    println!("📊 Indexed {} of {} records ({} skipped)", indexed, files.len(), skipped);
    println!("📊 Last document id: {}", ingestor.last_doc_id());
    Ok(())
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut json_files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
        let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("json") { json_files.push(path.to_path_buf()); }
    }
    json_files.sort(); json_files
}
