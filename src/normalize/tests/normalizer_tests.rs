use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::normalize::document::{DocElement, DocumentParser, FileParser};
use crate::normalize::Normalizer;

/// Counts partition invocations so cache behaviour is observable.
struct CountingParser {
    inner: FileParser,
    calls: AtomicUsize,
}

impl CountingParser {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: FileParser,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentParser for CountingParser {
    fn partition(&self, path: &Path) -> Result<Vec<DocElement>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.partition(path)
    }
}

fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_text_file_flattens_to_paragraphs() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "notes.txt", "First paragraph\nstill first\n\nSecond paragraph\n");

    let normalizer = Normalizer::new(Arc::new(FileParser), &FetchConfig::default());
    let text = normalizer.file_to_text(&path).await.unwrap();

    assert!(text.contains("First paragraph still first"));
    assert!(text.contains("Second paragraph"));
}

#[tokio::test]
async fn test_html_file_keeps_table_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "report.html",
        "<html><body><h1>Report</h1><table><tr><td>cell-a</td><td>cell-b</td></tr></table></body></html>",
    );

    let normalizer = Normalizer::new(Arc::new(FileParser), &FetchConfig::default());
    let text = normalizer.file_to_text(&path).await.unwrap();

    assert!(text.contains("Report"));
    assert!(text.contains("cell-a"));
    assert!(text.contains("cell-b"));
}

#[tokio::test]
async fn test_parse_cache_serves_repeat_requests() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "cached.txt", "Some cached content\n");

    let parser = CountingParser::new();
    let normalizer = Normalizer::new(Arc::clone(&parser) as Arc<dyn DocumentParser>, &FetchConfig::default());

    let first = normalizer.file_to_text(&path).await.unwrap();
    let second = normalizer.file_to_text(&path).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(parser.calls(), 1);
}

#[tokio::test]
async fn test_cache_is_per_normalizer_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "chunky.txt", "p1\n\np2\n\np3\n\np4\n");

    let parser = CountingParser::new();

    let unchunked = Normalizer::new(
        Arc::clone(&parser) as Arc<dyn DocumentParser>,
        &FetchConfig::default(),
    );
    let chunked = Normalizer::new(
        Arc::clone(&parser) as Arc<dyn DocumentParser>,
        &FetchConfig {
            parse_chunk_size: Some(2),
            ..FetchConfig::default()
        },
    );

    let plain = unchunked.file_to_text(&path).await.unwrap();
    let in_chunks = chunked.file_to_text(&path).await.unwrap();

    assert_eq!(parser.calls(), 2);
    for needle in ["p1", "p2", "p3", "p4"] {
        assert!(plain.contains(needle));
        assert!(in_chunks.contains(needle));
    }
}

#[tokio::test]
async fn test_unsupported_format_is_typed_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "movie.mp4", "not really a movie");

    let normalizer = Normalizer::new(Arc::new(FileParser), &FetchConfig::default());
    let result = normalizer.file_to_text(&path).await;

    assert!(matches!(result, Err(FetchError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_parser_error_does_not_poison_cache() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-there.txt");

    let parser = CountingParser::new();
    let normalizer = Normalizer::new(Arc::clone(&parser) as Arc<dyn DocumentParser>, &FetchConfig::default());

    assert!(normalizer.file_to_text(&missing).await.is_err());

    let path = write_temp(&dir, "not-there.txt", "late arrival\n");
    let text = normalizer.file_to_text(&path).await.unwrap();
    assert!(text.contains("late arrival"));
    assert_eq!(parser.calls(), 2);
}
