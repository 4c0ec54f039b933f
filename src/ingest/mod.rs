//! Ingestion workflow: keyword search, artifact download, persistence,
//! and AI analysis.
//!
//! Per-paper failures are logged with the paper's id/title and never
//! abort the rest of a batch; the storage layer's entry-id uniqueness
//! is the safety net against duplicate inserts when a scheduled tick
//! and a user-triggered fetch overlap.

use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::arxiv::{ArxivClient, PaperRecord, SourceError};
use crate::llm::AnalysisClient;
use crate::models::{AnalysisKind, Article, User};
use crate::repository::{DbContext, NewArticleData};
use crate::storage::{article_dir_name, is_image_file};

/// Outcome counters for one fetch or import run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FetchReport {
    /// Papers returned by the source.
    pub discovered: usize,
    /// Newly persisted articles.
    pub imported: usize,
    /// Papers already in the library.
    pub skipped_duplicates: usize,
    /// Papers that failed to download or persist.
    pub failed: usize,
}

/// One ad-hoc search result, annotated for UI preview.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub record: PaperRecord,
    pub already_imported: bool,
}

/// The fetch/analyze/persist workflow.
pub struct IngestService {
    arxiv: ArxivClient,
    llm: AnalysisClient,
    ctx: DbContext,
    max_results: u32,
}

impl IngestService {
    pub fn new(arxiv: ArxivClient, llm: AnalysisClient, ctx: DbContext, max_results: u32) -> Self {
        Self {
            arxiv,
            llm,
            ctx,
            max_results,
        }
    }

    /// Scheduled job body: run the fetch pipeline for every account.
    ///
    /// Always completes; per-user and per-paper failures are logged and
    /// folded into the report.
    pub async fn run_scheduled_fetch(&self) -> anyhow::Result<FetchReport> {
        let users = self.ctx.users().get_all().await?;
        let mut total = FetchReport::default();

        for user in &users {
            match self.fetch_for_user(user).await {
                Ok(report) => {
                    total.discovered += report.discovered;
                    total.imported += report.imported;
                    total.skipped_duplicates += report.skipped_duplicates;
                    total.failed += report.failed;
                }
                Err(e) => {
                    error!("fetch for user {} failed: {:#}", user.username, e);
                }
            }
        }

        info!(
            "scheduled fetch finished: {} discovered, {} imported, {} duplicates, {} failed",
            total.discovered, total.imported, total.skipped_duplicates, total.failed
        );
        Ok(total)
    }

    /// Fetch new papers matching one user's keywords.
    pub async fn fetch_for_user(&self, user: &User) -> anyhow::Result<FetchReport> {
        let keywords = self.ctx.keywords().list_for_user(user.id).await?;
        if keywords.is_empty() {
            info!("no keywords configured for {}; skipping fetch", user.username);
            return Ok(FetchReport::default());
        }

        let query = build_query(&keywords.iter().map(|k| k.keyword.clone()).collect::<Vec<_>>());
        let records = self.arxiv.search(&query, self.max_results).await?;

        Ok(self.ingest_records(user, &records).await)
    }

    /// Read-only search, annotated with what is already imported.
    pub async fn search_only(&self, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        let records = self.arxiv.search(query, self.max_results).await?;

        let ids: Vec<String> = records.iter().map(|r| r.entry_id.clone()).collect();
        let known = self
            .ctx
            .articles()
            .known_entry_ids(&ids)
            .await
            .map_err(|e| SourceError::Api(format!("lookup failed: {}", e)))?;

        Ok(records
            .into_iter()
            .map(|record| {
                let already_imported = known.contains(&record.entry_id);
                SearchHit {
                    record,
                    already_imported,
                }
            })
            .collect())
    }

    /// Import an explicit list of entry ids or abstract-page URLs.
    pub async fn batch_import(
        &self,
        user: &User,
        entries: &[String],
    ) -> anyhow::Result<FetchReport> {
        let ids: Vec<String> = entries.iter().map(|e| normalize_entry_id(e)).collect();
        let records = self.arxiv.search_by_ids(&ids).await?;

        Ok(self.ingest_records(user, &records).await)
    }

    /// Re-run only the analysis phase for an existing article.
    ///
    /// Existing analyses are removed first, so afterwards the article
    /// holds exactly the fresh ones that succeeded.
    pub async fn regenerate(&self, article: &Article, api_key: Option<&str>) -> anyhow::Result<()> {
        let removed = self.ctx.articles().delete_analyses(article.id).await?;
        info!(
            "regenerating analyses for {} ({} removed)",
            article.entry_id, removed
        );

        self.analyze_article(article.id, &article.original_abstract, api_key)
            .await;
        Ok(())
    }

    /// Run the per-paper pipeline over a batch of search results.
    async fn ingest_records(&self, user: &User, records: &[PaperRecord]) -> FetchReport {
        let mut report = FetchReport {
            discovered: records.len(),
            ..FetchReport::default()
        };

        for record in records {
            match self.process_paper(user, record).await {
                Ok(true) => report.imported += 1,
                Ok(false) => report.skipped_duplicates += 1,
                Err(e) => {
                    warn!(
                        "skipping paper {} ({}): {:#}",
                        record.entry_id, record.title, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Fetch, persist, and analyze one paper.
    ///
    /// Returns false when the paper was already stored. The article row
    /// is committed before the analysis phase, so an analysis failure
    /// leaves a persisted article with missing analyses - a recoverable
    /// state, not an error.
    async fn process_paper(&self, user: &User, record: &PaperRecord) -> anyhow::Result<bool> {
        if self.ctx.articles().exists_by_entry_id(&record.entry_id).await? {
            info!("already imported: {}", record.entry_id);
            return Ok(false);
        }

        info!("processing paper {} ({})", record.entry_id, record.title);

        let dir_name = article_dir_name(record.published.date_naive(), &record.title);
        let article_dir = self.ctx.storage_dir().join(&dir_name);
        std::fs::create_dir_all(&article_dir)?;

        self.arxiv.fetch_pdf(record, &article_dir).await?;

        // Best-effort: pull figures out of the source bundle. Any
        // failure here yields an empty image list.
        let image_paths = match self.arxiv.fetch_source_archive(record, &article_dir).await {
            Ok(Some(archive)) => extract_images(&archive, &article_dir, &dir_name),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("source bundle fetch failed for {}: {}", record.entry_id, e);
                Vec::new()
            }
        };

        let data = NewArticleData {
            entry_id: record.entry_id.clone(),
            user_id: user.id,
            title: record.title.clone(),
            published: record.published,
            pdf_url: record.pdf_url.clone(),
            original_abstract: record.abstract_text.clone(),
            local_path: Some(dir_name.clone()),
            image_paths,
        };

        let Some(article) = self.ctx.articles().insert_new(&data, &record.authors).await? else {
            // A concurrent fetch won the insert race; the unique
            // constraint on entry_id resolved it to a skip.
            info!("already imported (concurrent): {}", record.entry_id);
            return Ok(false);
        };

        self.analyze_article(article.id, &record.abstract_text, user.api_key.as_deref())
            .await;

        if let Err(e) = self.write_sidecar(&article_dir, &article, record).await {
            warn!("sidecar write failed for {}: {}", record.entry_id, e);
        }

        Ok(true)
    }

    /// Request both analysis kinds sequentially, persisting whichever
    /// succeed.
    async fn analyze_article(&self, article_id: i32, abstract_text: &str, api_key: Option<&str>) {
        for kind in [AnalysisKind::Summary, AnalysisKind::Detailed] {
            match self.llm.structured_analyze(kind, abstract_text, api_key).await {
                Some(content) => {
                    if let Err(e) = self
                        .ctx
                        .articles()
                        .save_analysis(article_id, kind, &content)
                        .await
                    {
                        error!("failed to persist {} analysis: {}", kind.as_str(), e);
                    }
                }
                None => {
                    warn!("{} analysis unavailable for article {}", kind.as_str(), article_id);
                }
            }
        }
    }

    /// Write the JSON metadata sidecar next to the artifacts.
    async fn write_sidecar(
        &self,
        article_dir: &Path,
        article: &Article,
        record: &PaperRecord,
    ) -> anyhow::Result<()> {
        let articles = self.ctx.articles();
        let summary = articles
            .analysis_for(article.id, AnalysisKind::Summary)
            .await?
            .map(|a| a.content);
        let detailed = articles
            .analysis_for(article.id, AnalysisKind::Detailed)
            .await?
            .map(|a| a.content);

        let metadata = serde_json::json!({
            "entry_id": article.entry_id,
            "title": article.title,
            "authors": record.authors,
            "published": article.published_date().to_string(),
            "pdf_url": article.pdf_url,
            "original_abstract": article.original_abstract,
            "summary_analysis": summary,
            "detailed_analysis": detailed,
            "image_paths": article.image_paths,
        });

        let path = article_dir.join("metadata.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&metadata)?)?;
        Ok(())
    }
}

/// Build the disjunctive "any keyword present" query.
fn build_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|kw| format!("all:\"{}\"", kw))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Normalize a batch-import entry to a bare entry id.
///
/// Abstract-page URLs have the id extracted from the trailing path
/// segment; anything that doesn't parse as a URL (including old-style
/// ids like `hep-th/9901001`) passes through unchanged.
pub fn normalize_entry_id(entry: &str) -> String {
    let trimmed = entry.trim();
    if let Ok(parsed) = url::Url::parse(trimmed) {
        if parsed.path().contains("/abs/") {
            if let Some(segment) = parsed
                .path_segments()
                .and_then(|s| s.filter(|p| !p.is_empty()).last())
            {
                return segment.to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Copy image entries out of a source bundle into `images/`.
///
/// Returns storage-relative paths. Never fails: an unreadable or
/// unsupported archive yields an empty list.
fn extract_images(archive_path: &Path, article_dir: &Path, dir_name: &str) -> Vec<String> {
    match try_extract_images(archive_path, article_dir, dir_name) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("image extraction failed for {}: {}", archive_path.display(), e);
            Vec::new()
        }
    }
}

fn try_extract_images(
    archive_path: &Path,
    article_dir: &Path,
    dir_name: &str,
) -> anyhow::Result<Vec<String>> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let images_dir = article_dir.join("images");
    let mut paths = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if !entry.is_file() || !is_image_file(entry.name()) {
            continue;
        }

        // Flatten the entry path; figures in subdirectories keep only
        // their file name.
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
        else {
            continue;
        };

        std::fs::create_dir_all(&images_dir)?;
        let target = images_dir.join(&file_name);
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        std::fs::write(&target, &contents)?;

        paths.push(format!("{}/images/{}", dir_name, file_name));
    }

    Ok(paths)
}
