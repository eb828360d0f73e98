//! Content normalization: rendered markup and downloaded files both
//! converge on one markdown-free-of-markup text representation.

pub mod document;
pub mod html;

#[cfg(test)]
mod tests;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use document::{DocElement, DocumentParser};

/// Below this element count, parallel formatting is not worth a thread.
const PARALLEL_THRESHOLD: usize = 64;

type CacheKey = (PathBuf, Option<usize>);

/// Produces normalized text from raw page markup or a downloaded file.
///
/// Holds an explicit bounded cache for document parses, keyed on
/// `(path, chunk_size)`: partitioning is expensive and idempotent for
/// immutable input files.
pub struct Normalizer {
    parser: Arc<dyn DocumentParser>,
    cache: Mutex<LruCache<CacheKey, String>>,
    workers: usize,
    chunk_size: Option<usize>,
}

impl Normalizer {
    pub fn new(parser: Arc<dyn DocumentParser>, config: &FetchConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.parse_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            parser,
            cache: Mutex::new(LruCache::new(capacity)),
            workers: config.parse_workers.max(1),
            chunk_size: config.parse_chunk_size,
        }
    }

    /// HTML branch: normalize rendered page markup.
    pub fn html_to_text(&self, markup: &str) -> Result<String> {
        html::to_text(markup)
    }

    /// Document branch: partition a downloaded file and flatten the
    /// elements to the same representation the HTML branch produces.
    pub async fn file_to_text(&self, path: &Path) -> Result<String> {
        let key = (path.to_path_buf(), self.chunk_size);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            log::debug!("parse cache hit: {}", path.display());
            return Ok(hit.clone());
        }

        let parser = Arc::clone(&self.parser);
        let path_buf = path.to_path_buf();
        let workers = self.workers;
        let chunk_size = self.chunk_size;

        let text = tokio::task::spawn_blocking(move || -> Result<String> {
            let elements = parser.partition(&path_buf)?;

            let fragments = match chunk_size {
                Some(size) if size > 0 && elements.len() > size => elements
                    .chunks(size)
                    .map(|slice| html::to_text(&flatten_elements(slice, workers)))
                    .collect::<Result<Vec<_>>>()?,
                _ => vec![html::to_text(&flatten_elements(&elements, workers))?],
            };

            Ok(fragments
                .into_iter()
                .filter(|f| !f.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"))
        })
        .await
        .map_err(|e| FetchError::Extraction(format!("document parse task failed: {e}")))??;

        self.cache.lock().await.put(key, text.clone());
        Ok(text)
    }
}

/// Flatten elements to one HTML fragment, formatting in parallel with a
/// fixed worker count for large documents.
fn flatten_elements(elements: &[DocElement], workers: usize) -> String {
    if workers <= 1 || elements.len() < PARALLEL_THRESHOLD {
        return join_formatted(elements.iter().filter_map(format_element).collect());
    }

    let chunk = elements.len().div_ceil(workers);
    let mut parts: Vec<Vec<String>> = Vec::with_capacity(workers);
    std::thread::scope(|scope| {
        let handles: Vec<_> = elements
            .chunks(chunk)
            .map(|slice| {
                scope.spawn(move || slice.iter().filter_map(format_element).collect::<Vec<_>>())
            })
            .collect();
        for handle in handles {
            parts.push(handle.join().unwrap_or_default());
        }
    });

    join_formatted(parts.into_iter().flatten().collect())
}

fn join_formatted(fragments: Vec<String>) -> String {
    fragments.join("\n")
}

/// An element contributes its structural HTML when present, otherwise
/// its text wrapped as a block. Empty elements contribute nothing.
fn format_element(element: &DocElement) -> Option<String> {
    if let Some(html) = &element.html {
        if !html.trim().is_empty() {
            return Some(html.clone());
        }
    }
    let text = element.text.trim();
    if text.is_empty() {
        None
    } else {
        Some(format!("<div>{text}</div>"))
    }
}
