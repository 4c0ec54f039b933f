//! Articles, their AI analyses, and Q&A history.
//!
//! Articles are created only by the ingestion workflow and are deduped
//! by the source repository's entry id. Analyses and Q&A rows belong to
//! exactly one article and are removed with it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of AI annotation an [`Analysis`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Short structured summary (simplified text, keywords, rating).
    Summary,
    /// Long-form structured analysis (background, methodology, ...).
    Detailed,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Detailed => "detailed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "summary" => Some(Self::Summary),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// One fetched paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Database row ID (surrogate key for all relations).
    pub id: i32,
    /// Source repository id, e.g. `2401.00001v1`. Globally unique;
    /// the dedup key for the ingestion workflow.
    pub entry_id: String,
    /// Owning user.
    pub user_id: i32,
    pub title: String,
    /// Publication date reported by the source.
    pub published: DateTime<Utc>,
    /// Remote PDF location, if the source offered one.
    pub pdf_url: Option<String>,
    /// The paper's original abstract.
    pub original_abstract: String,
    /// Artifact folder under the storage root.
    pub local_path: Option<String>,
    /// Storage-relative paths of images extracted from the source bundle.
    pub image_paths: Vec<String>,
    pub is_favorited: bool,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Publication date formatted for folder names and API responses.
    pub fn published_date(&self) -> NaiveDate {
        self.published.date_naive()
    }

    /// Citation key: the trailing segment of the entry id.
    pub fn citation_key(&self) -> &str {
        self.entry_id.rsplit('/').next().unwrap_or(&self.entry_id)
    }
}

/// List-view projection of an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
    pub authors: Vec<String>,
    pub is_favorited: bool,
}

/// One AI-generated annotation of an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i32,
    pub article_id: i32,
    pub kind: AnalysisKind,
    /// Whatever JSON object the model returned; not schema-validated.
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// One question/answer exchange about an article. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QnaEntry {
    pub id: i32,
    pub article_id: i32,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_kind_roundtrip() {
        assert_eq!(AnalysisKind::from_str("summary"), Some(AnalysisKind::Summary));
        assert_eq!(AnalysisKind::from_str("detailed"), Some(AnalysisKind::Detailed));
        assert_eq!(AnalysisKind::from_str("other"), None);
        assert_eq!(AnalysisKind::Summary.as_str(), "summary");
        assert_eq!(AnalysisKind::Detailed.as_str(), "detailed");
    }

    #[test]
    fn test_citation_key_from_bare_id() {
        let article = sample_article("2401.00001v1");
        assert_eq!(article.citation_key(), "2401.00001v1");
    }

    #[test]
    fn test_citation_key_from_url_form() {
        let article = sample_article("http://arxiv.org/abs/2401.00001v1");
        assert_eq!(article.citation_key(), "2401.00001v1");
    }

    fn sample_article(entry_id: &str) -> Article {
        Article {
            id: 1,
            entry_id: entry_id.to_string(),
            user_id: 1,
            title: "Test".to_string(),
            published: Utc::now(),
            pdf_url: None,
            original_abstract: String::new(),
            local_path: None,
            image_paths: Vec::new(),
            is_favorited: false,
            created_at: Utc::now(),
        }
    }
}
