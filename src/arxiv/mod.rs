//! arXiv API client: paper search and artifact downloads.
//!
//! Talks to the arXiv Atom query endpoint. Searches are stateless
//! reads; downloads are idempotent (an existing file on disk is never
//! re-fetched) and a missing remote artifact degrades to `None` rather
//! than failing the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the paper source. The ingestion workflow catches these
/// per paper and continues with the rest of the batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Configuration for the arXiv client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivConfig {
    /// Atom query endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://export.arxiv.org/api/query".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Metadata for one paper from a search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Bare entry id with version suffix, e.g. `2401.00001v1`.
    pub entry_id: String,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub published: DateTime<Utc>,
    /// Abstract page URL.
    pub abs_url: String,
    /// PDF location, when the feed offered one.
    pub pdf_url: Option<String>,
}

/// arXiv API client.
pub struct ArxivClient {
    config: ArxivConfig,
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new(config: ArxivConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("paperdesk/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self { config, client }
    }

    /// Search by query string, newest submissions first.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<PaperRecord>, SourceError> {
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.config.base_url,
            urlencoded(query),
            max_results
        );
        debug!("arXiv search: {}", url);
        let body = self.get_feed(&url).await?;
        parse_atom_feed(&body)
    }

    /// Resolve explicit entry ids (batch import).
    pub async fn search_by_ids(&self, ids: &[String]) -> Result<Vec<PaperRecord>, SourceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}?id_list={}", self.config.base_url, ids.join(","));
        debug!("arXiv id lookup: {}", url);
        let body = self.get_feed(&url).await?;
        parse_atom_feed(&body)
    }

    /// Download a paper's PDF into `dir`, skipping when already present.
    ///
    /// Returns `None` when the record carries no PDF URL.
    pub async fn fetch_pdf(
        &self,
        record: &PaperRecord,
        dir: &Path,
    ) -> Result<Option<PathBuf>, SourceError> {
        let Some(pdf_url) = record.pdf_url.as_deref() else {
            info!("no PDF offered for {}", record.entry_id);
            return Ok(None);
        };

        let target = dir.join(format!("{}.pdf", record.entry_id.replace('/', "_")));
        if target.exists() {
            debug!("PDF already downloaded: {}", target.display());
            return Ok(Some(target));
        }

        self.download_to(pdf_url, &target).await?;
        info!("downloaded PDF for {}", record.entry_id);
        Ok(Some(target))
    }

    /// Download the e-print source bundle into `dir`, skipping when
    /// already present. Not every paper has one; a 4xx answer maps to
    /// `None` so callers can treat it as "no artifact".
    pub async fn fetch_source_archive(
        &self,
        record: &PaperRecord,
        dir: &Path,
    ) -> Result<Option<PathBuf>, SourceError> {
        let source_url = record.abs_url.replace("/abs/", "/src/");
        if source_url == record.abs_url {
            return Ok(None);
        }

        let target = dir.join(format!("{}.src", record.entry_id.replace('/', "_")));
        if target.exists() {
            debug!("source bundle already downloaded: {}", target.display());
            return Ok(Some(target));
        }

        let resp = self.client.get(&source_url).send().await?;
        if resp.status().is_client_error() {
            info!("no source bundle for {}", record.entry_id);
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("HTTP {}", resp.status())));
        }

        let bytes = resp.bytes().await?;
        std::fs::write(&target, &bytes)
            .map_err(|e| SourceError::Api(format!("write {}: {}", target.display(), e)))?;
        Ok(Some(target))
    }

    async fn get_feed(&self, url: &str) -> Result<String, SourceError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("HTTP {}", resp.status())));
        }
        Ok(resp.text().await?)
    }

    async fn download_to(&self, url: &str, target: &Path) -> Result<(), SourceError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("HTTP {}", resp.status())));
        }
        let bytes = resp.bytes().await?;
        std::fs::write(target, &bytes)
            .map_err(|e| SourceError::Api(format!("write {}: {}", target.display(), e)))?;
        Ok(())
    }
}

fn urlencoded(s: &str) -> String {
    s.replace(' ', "+")
        .replace('"', "%22")
        .replace(':', "%3A")
        .replace('/', "%2F")
}

/// Pull PDF/abs links out of an Atom `<link>` element.
fn extract_link(
    e: &quick_xml::events::BytesStart<'_>,
    link_pdf: &mut String,
    link_abs: &mut String,
) {
    let mut href = String::new();
    let mut title_attr = String::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let val = String::from_utf8_lossy(&attr.value).to_string();
        if key == "href" {
            href = val;
        } else if key == "title" {
            title_attr = val;
        }
    }
    if title_attr == "pdf" {
        *link_pdf = href;
    } else if link_abs.is_empty() && href.contains("abs") {
        *link_abs = href;
    }
}

/// Parse an arXiv Atom feed into paper records.
fn parse_atom_feed(xml: &str) -> Result<Vec<PaperRecord>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut papers = Vec::new();
    let mut in_entry = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut summary = String::new();
    let mut id_url = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut published = String::new();
    let mut link_pdf = String::new();
    let mut link_abs = String::new();
    let mut author_name = String::new();
    let mut in_author = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                    id_url.clear();
                    authors.clear();
                    published.clear();
                    link_pdf.clear();
                    link_abs.clear();
                } else if in_entry {
                    current_tag = tag.clone();
                    if tag == "author" {
                        in_author = true;
                        author_name.clear();
                    }
                    if tag == "link" {
                        extract_link(&e, &mut link_pdf, &mut link_abs);
                    }
                }
            }
            Ok(Event::Empty(e)) if in_entry => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "link" {
                    extract_link(&e, &mut link_pdf, &mut link_abs);
                }
            }
            Ok(Event::Text(e)) if in_entry => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current_tag.as_str() {
                    "title" => title.push_str(&text),
                    "summary" => summary.push_str(&text),
                    "id" if id_url.is_empty() => id_url = text,
                    "published" => published.push_str(&text),
                    "name" if in_author => author_name.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "entry" && in_entry {
                    in_entry = false;
                    // The Atom <id> is a URL; the entry id is its last segment
                    let entry_id = id_url
                        .rsplit('/')
                        .next()
                        .unwrap_or(&id_url)
                        .to_string();
                    if !entry_id.is_empty() && !title.trim().is_empty() {
                        let published_at = DateTime::parse_from_rfc3339(published.trim())
                            .map(|dt| dt.with_timezone(&Utc))
                            .unwrap_or_else(|_| Utc::now());
                        papers.push(PaperRecord {
                            entry_id,
                            title: title.trim().replace('\n', " "),
                            abstract_text: summary.trim().replace('\n', " "),
                            authors: authors.clone(),
                            published: published_at,
                            abs_url: if link_abs.is_empty() {
                                id_url.clone()
                            } else {
                                link_abs.clone()
                            },
                            pdf_url: if link_pdf.is_empty() {
                                None
                            } else {
                                Some(link_pdf.clone())
                            },
                        });
                    }
                } else if tag == "author" && in_author {
                    in_author = false;
                    if !author_name.trim().is_empty() {
                        authors.push(author_name.trim().to_string());
                    }
                }
                if tag == current_tag {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(papers)
}
