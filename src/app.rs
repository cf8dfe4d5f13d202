//! Command execution for docdown
//!
//! Wires parsed settings to the document cache and renderer, and produces the
//! degraded fragment shown in place of a document that could not be fetched.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::{error, warn};

use crate::cache::{Clock, DiskStore, DocumentCache, SystemClock};
use crate::cli::{DiskCache, FetchSettings};
use crate::data::{DocId, DocumentSource, FetchError, HttpSource};
use crate::render::render;

/// Outcome of fetching a batch of documents
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Rendered fragments (or degraded fragments) in request order
    pub html: String,
    /// Errors for documents that could not be fetched
    pub failures: Vec<FetchError>,
}

impl FetchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Main application struct holding the document cache
pub struct App<S, C = SystemClock> {
    cache: DocumentCache<S, C>,
}

impl App<HttpSource> {
    /// Builds the HTTP-backed application from `fetch` settings
    pub fn from_settings(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let source = HttpSource::with_timeout(settings.base_url.clone(), settings.cache.fetch_timeout)?;
        let cache = DocumentCache::new(source, settings.cache.clone());

        let store = match &settings.disk_cache {
            DiskCache::Disabled => None,
            DiskCache::PlatformDefault => {
                let store = DiskStore::new();
                if store.is_none() {
                    warn!("No cache directory available; caching in memory only");
                }
                store
            }
            DiskCache::Dir(dir) => Some(DiskStore::with_dir(dir.clone())),
        };

        Ok(match store {
            Some(store) => Self::new(cache.with_store(store)),
            None => Self::new(cache),
        })
    }
}

impl<S: DocumentSource, C: Clock> App<S, C> {
    pub fn new(cache: DocumentCache<S, C>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DocumentCache<S, C> {
        &self.cache
    }

    /// Fetches and renders `ids` one after another
    ///
    /// A document that fails is replaced by a degraded fragment linking to its
    /// external location; the remaining documents are still processed.
    pub async fn fetch_documents(&self, ids: &[DocId]) -> FetchReport {
        let mut fragments = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();

        for id in ids {
            match self.cache.fetch_and_render(id.as_str()).await {
                Ok(html) => fragments.push(html),
                Err(e) => {
                    error!("{}", e);
                    fragments.push(degraded_fragment(id, &self.cache.location(id)));
                    failures.push(e);
                }
            }
        }

        FetchReport {
            html: fragments.join("\n"),
            failures,
        }
    }
}

/// HTML shown instead of a document that could not be loaded
pub fn degraded_fragment(id: &DocId, location: &str) -> String {
    format!(
        r#"<div class="doc-unavailable"><p>This document could not be loaded.</p><p><a href="{}" target="_blank" rel="noopener noreferrer">View {} externally</a></p></div>"#,
        encode_double_quoted_attribute(location),
        encode_text(id.as_str()),
    )
}

/// Reads Markdown from `path`, or from stdin when `path` is `-`
pub fn read_input(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

/// Writes `html` to `path`, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, html: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, format!("{html}\n")),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{html}")?;
            stdout.flush()
        }
    }
}

/// Renders the Markdown file at `path` (or stdin)
pub fn render_file(path: &Path) -> io::Result<String> {
    read_input(path).map(|text| render(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ManualClock};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Source that serves a fixed set of documents and 404s everything else
    struct MapSource(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl DocumentSource for MapSource {
        async fn fetch_text(&self, id: &DocId) -> Result<String, FetchError> {
            self.0
                .get(id.as_str())
                .map(|text| text.to_string())
                .ok_or_else(|| FetchError::Status {
                    id: id.to_string(),
                    status: 404,
                })
        }

        fn location(&self, id: &DocId) -> String {
            format!("https://example.org/docs/{}", id.resource_path())
        }
    }

    fn test_app() -> App<MapSource, ManualClock> {
        let source = MapSource(HashMap::from([("install", "# Install"), ("faq", "Ask *away*")]));
        App::new(DocumentCache::with_clock(source, ManualClock::default(), CacheConfig::default()))
    }

    fn ids(raw: &[&str]) -> Vec<DocId> {
        raw.iter().map(|r| DocId::parse(r).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_fetch_documents_joins_fragments_in_order() {
        let app = test_app();

        let report = app.fetch_documents(&ids(&["faq", "install"])).await;

        assert!(report.is_success());
        assert_eq!(report.html, "<p>Ask <em>away</em></p>\n<h1>Install</h1>");
    }

    #[tokio::test]
    async fn test_missing_document_gets_degraded_fragment() {
        let app = test_app();

        let report = app.fetch_documents(&ids(&["install", "missing"])).await;

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id(), "missing");
        assert!(report.html.starts_with("<h1>Install</h1>\n"));
        assert!(report
            .html
            .contains(r#"href="https://example.org/docs/missing.md""#));
        assert!(app.cache().get("missing").await.is_none());
    }

    #[test]
    fn test_degraded_fragment_escapes_location() {
        let id = DocId::parse("faq").unwrap();
        let html = degraded_fragment(&id, r#"https://e.org/"x""#);
        assert!(html.contains("&quot;x&quot;"));
        assert!(html.contains("View faq externally"));
    }

    #[test]
    fn test_render_file_and_write_output() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input = temp_dir.path().join("page.md");
        let output = temp_dir.path().join("page.html");
        fs::write(&input, "## Hello\n\n- a\n- b\n").unwrap();

        let html = render_file(&input).unwrap();
        write_output(Some(&output), &html).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "<h2>Hello</h2>\n<ul><li>a</li><li>b</li></ul>\n"
        );
    }

    #[test]
    fn test_render_file_missing_path_is_an_error() {
        assert!(render_file(Path::new("/definitely/not/here.md")).is_err());
    }
}
