//! Article repository: papers, their authors, analyses, and Q&A history.
//!
//! The `entry_id` unique constraint makes the insert the authoritative
//! dedup point; callers treat a conflicting insert as "already stored",
//! not as an error.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{AnalysisRecord, ArticleRecord, NewArticle, QnaRecord};
use super::parse_datetime;
use crate::models::{Analysis, AnalysisKind, Article, ArticleSummary, QnaEntry};
use crate::schema::{analyses, article_authors, articles, authors, qna_history};

/// Everything the ingestion workflow knows about a paper at insert time.
#[derive(Debug, Clone)]
pub struct NewArticleData {
    pub entry_id: String,
    pub user_id: i32,
    pub title: String,
    pub published: chrono::DateTime<Utc>,
    pub pdf_url: Option<String>,
    pub original_abstract: String,
    pub local_path: Option<String>,
    pub image_paths: Vec<String>,
}

#[derive(Clone)]
pub struct ArticleRepository {
    pool: AsyncSqlitePool,
}

#[derive(diesel::QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    rowid: i64,
}

impl ArticleRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new article with its authors.
    ///
    /// Returns `None` when an article with the same entry id already
    /// exists (including one inserted by a concurrent fetch between our
    /// pre-check and this call). Author rows are reused by exact name.
    pub async fn insert_new(
        &self,
        data: &NewArticleData,
        author_names: &[String],
    ) -> Result<Option<Article>, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339();
        let published = data.published.to_rfc3339();
        let image_paths =
            serde_json::to_string(&data.image_paths).unwrap_or_else(|_| "[]".to_string());

        conn.transaction(|conn| {
            Box::pin(async move {
                let rows = diesel::insert_into(articles::table)
                    .values(NewArticle {
                        entry_id: &data.entry_id,
                        user_id: data.user_id,
                        title: &data.title,
                        published: &published,
                        pdf_url: data.pdf_url.as_deref(),
                        original_abstract: &data.original_abstract,
                        local_path: data.local_path.as_deref(),
                        image_paths: &image_paths,
                        is_favorited: 0,
                        created_at: &created_at,
                    })
                    .on_conflict(articles::entry_id)
                    .do_nothing()
                    .execute(conn)
                    .await?;

                if rows == 0 {
                    return Ok(None);
                }

                let article_id = diesel::sql_query("SELECT last_insert_rowid() AS rowid")
                    .get_result::<LastInsertRowId>(conn)
                    .await?
                    .rowid as i32;

                for name in author_names {
                    diesel::insert_into(authors::table)
                        .values(authors::name.eq(name))
                        .on_conflict(authors::name)
                        .do_nothing()
                        .execute(conn)
                        .await?;

                    let author_id: i32 = authors::table
                        .filter(authors::name.eq(name))
                        .select(authors::id)
                        .first(conn)
                        .await?;

                    diesel::insert_into(article_authors::table)
                        .values((
                            article_authors::article_id.eq(article_id),
                            article_authors::author_id.eq(author_id),
                        ))
                        .on_conflict((
                            article_authors::article_id,
                            article_authors::author_id,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                }

                let record: ArticleRecord =
                    articles::table.find(article_id).first(conn).await?;
                Ok(Some(Self::record_to_article(record)))
            })
        })
        .await
    }

    /// Check whether a paper is already stored.
    pub async fn exists_by_entry_id(&self, entry_id: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        let count: i64 = articles::table
            .filter(articles::entry_id.eq(entry_id))
            .select(count_star())
            .first(&mut conn)
            .await?;

        Ok(count > 0)
    }

    /// Which of the given entry ids are already stored.
    pub async fn known_entry_ids(&self, entry_ids: &[String]) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        articles::table
            .filter(articles::entry_id.eq_any(entry_ids))
            .select(articles::entry_id)
            .load(&mut conn)
            .await
    }

    /// One user's articles, newest publication first.
    pub async fn latest_for_user(&self, user_id: i32) -> Result<Vec<ArticleSummary>, DieselError> {
        self.list_for_user(user_id, false).await
    }

    /// One user's favorited articles, newest publication first.
    pub async fn favorites_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ArticleSummary>, DieselError> {
        self.list_for_user(user_id, true).await
    }

    async fn list_for_user(
        &self,
        user_id: i32,
        favorites_only: bool,
    ) -> Result<Vec<ArticleSummary>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = articles::table
            .filter(articles::user_id.eq(user_id))
            .order(articles::published.desc())
            .into_boxed();
        if favorites_only {
            query = query.filter(articles::is_favorited.eq(1));
        }

        let records: Vec<ArticleRecord> = query.load(&mut conn).await?;

        let mut summaries = Vec::with_capacity(records.len());
        for record in records {
            let authors = self.authors_for(record.id).await?;
            summaries.push(ArticleSummary {
                id: record.id,
                title: record.title,
                authors,
                is_favorited: record.is_favorited != 0,
            });
        }
        Ok(summaries)
    }

    /// Get an article by id, scoped to its owner.
    pub async fn get_for_user(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<Option<Article>, DieselError> {
        let mut conn = self.pool.get().await?;

        articles::table
            .find(id)
            .filter(articles::user_id.eq(user_id))
            .first::<ArticleRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Self::record_to_article))
    }

    /// Author names for an article, via the association table.
    pub async fn authors_for(&self, article_id: i32) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;

        article_authors::table
            .inner_join(authors::table)
            .filter(article_authors::article_id.eq(article_id))
            .order(authors::id.asc())
            .select(authors::name)
            .load(&mut conn)
            .await
    }

    /// Flip the favorite flag. Returns the new value, or `None` when the
    /// article isn't visible to this user.
    pub async fn toggle_favorite(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<Option<bool>, DieselError> {
        let mut conn = self.pool.get().await?;

        let current: Option<i32> = articles::table
            .find(id)
            .filter(articles::user_id.eq(user_id))
            .select(articles::is_favorited)
            .first(&mut conn)
            .await
            .optional()?;

        let Some(current) = current else {
            return Ok(None);
        };
        let next = if current == 0 { 1 } else { 0 };

        diesel::update(articles::table.find(id))
            .set(articles::is_favorited.eq(next))
            .execute(&mut conn)
            .await?;

        Ok(Some(next != 0))
    }

    /// Delete an article and its analyses, Q&A rows, and author links.
    /// Shared author rows stay.
    pub async fn delete_for_user(&self, id: i32, user_id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                let owned: i64 = articles::table
                    .find(id)
                    .filter(articles::user_id.eq(user_id))
                    .count()
                    .first(conn)
                    .await?;
                if owned == 0 {
                    return Ok(false);
                }

                diesel::delete(analyses::table.filter(analyses::article_id.eq(id)))
                    .execute(conn)
                    .await?;
                diesel::delete(qna_history::table.filter(qna_history::article_id.eq(id)))
                    .execute(conn)
                    .await?;
                diesel::delete(
                    article_authors::table.filter(article_authors::article_id.eq(id)),
                )
                .execute(conn)
                .await?;

                let rows = diesel::delete(articles::table.find(id)).execute(conn).await?;
                Ok(rows > 0)
            })
        })
        .await
    }

    // ========================================================================
    // Analyses
    // ========================================================================

    /// Persist one AI annotation.
    pub async fn save_analysis(
        &self,
        article_id: i32,
        kind: AnalysisKind,
        content: &serde_json::Value,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let content =
            serde_json::to_string(content).unwrap_or_else(|_| "{}".to_string());
        let created_at = Utc::now().to_rfc3339();

        diesel::insert_into(analyses::table)
            .values((
                analyses::article_id.eq(article_id),
                analyses::kind.eq(kind.as_str()),
                analyses::content.eq(&content),
                analyses::created_at.eq(&created_at),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// The current analysis of one kind for an article, if any.
    pub async fn analysis_for(
        &self,
        article_id: i32,
        kind: AnalysisKind,
    ) -> Result<Option<Analysis>, DieselError> {
        let mut conn = self.pool.get().await?;

        analyses::table
            .filter(analyses::article_id.eq(article_id))
            .filter(analyses::kind.eq(kind.as_str()))
            .order(analyses::id.desc())
            .first::<AnalysisRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Self::record_to_analysis))
    }

    /// Remove every analysis for an article (the regenerate path).
    pub async fn delete_analyses(&self, article_id: i32) -> Result<usize, DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::delete(analyses::table.filter(analyses::article_id.eq(article_id)))
            .execute(&mut conn)
            .await
    }

    // ========================================================================
    // Q&A history
    // ========================================================================

    /// Append one question/answer exchange.
    pub async fn append_qna(
        &self,
        article_id: i32,
        question: &str,
        answer: &str,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339();
        diesel::insert_into(qna_history::table)
            .values((
                qna_history::article_id.eq(article_id),
                qna_history::question.eq(question),
                qna_history::answer.eq(answer),
                qna_history::created_at.eq(&created_at),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Q&A exchanges for an article, oldest first.
    pub async fn qna_for(&self, article_id: i32) -> Result<Vec<QnaEntry>, DieselError> {
        let mut conn = self.pool.get().await?;

        qna_history::table
            .filter(qna_history::article_id.eq(article_id))
            .order(qna_history::id.asc())
            .load::<QnaRecord>(&mut conn)
            .await
            .map(|rs| {
                rs.into_iter()
                    .map(|r| QnaEntry {
                        id: r.id,
                        article_id: r.article_id,
                        question: r.question,
                        answer: r.answer,
                        created_at: parse_datetime(&r.created_at),
                    })
                    .collect()
            })
    }

    fn record_to_article(r: ArticleRecord) -> Article {
        Article {
            id: r.id,
            entry_id: r.entry_id,
            user_id: r.user_id,
            title: r.title,
            published: parse_datetime(&r.published),
            pdf_url: r.pdf_url,
            original_abstract: r.original_abstract,
            local_path: r.local_path,
            image_paths: serde_json::from_str(&r.image_paths).unwrap_or_default(),
            is_favorited: r.is_favorited != 0,
            created_at: parse_datetime(&r.created_at),
        }
    }

    fn record_to_analysis(r: AnalysisRecord) -> Analysis {
        Analysis {
            id: r.id,
            article_id: r.article_id,
            kind: AnalysisKind::from_str(&r.kind).unwrap_or(AnalysisKind::Summary),
            content: serde_json::from_str(&r.content)
                .unwrap_or(serde_json::Value::Null),
            created_at: parse_datetime(&r.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup() -> (DbContext, i32, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"), dir.path());
        ctx.init_schema().await.unwrap();
        let user = ctx.users().create("alice", "hash").await.unwrap().unwrap();
        (ctx, user.id, dir)
    }

    fn paper(user_id: i32, entry_id: &str) -> NewArticleData {
        NewArticleData {
            entry_id: entry_id.to_string(),
            user_id,
            title: "Spin Glasses and QUBO".to_string(),
            published: Utc::now(),
            pdf_url: Some("http://arxiv.org/pdf/2401.00001v1".to_string()),
            original_abstract: "We study spin glasses.".to_string(),
            local_path: None,
            image_paths: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_dedupes_on_entry_id() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let first = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &["A. Author".to_string()])
            .await
            .unwrap();
        assert!(first.is_some());

        // Second insert of the same paper resolves to a skip
        let second = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &["A. Author".to_string()])
            .await
            .unwrap();
        assert!(second.is_none());

        let listed = repo.latest_for_user(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_authors_are_shared_by_name() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let a = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &["Jane Doe".to_string()])
            .await
            .unwrap()
            .unwrap();
        let b = repo
            .insert_new(&paper(user_id, "2401.00002v1"), &["Jane Doe".to_string()])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(repo.authors_for(a.id).await.unwrap(), vec!["Jane Doe"]);
        assert_eq!(repo.authors_for(b.id).await.unwrap(), vec!["Jane Doe"]);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_flag() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let article = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &[])
            .await
            .unwrap()
            .unwrap();
        assert!(!article.is_favorited);

        assert_eq!(
            repo.toggle_favorite(article.id, user_id).await.unwrap(),
            Some(true)
        );
        assert_eq!(
            repo.toggle_favorite(article.id, user_id).await.unwrap(),
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_toggle_favorite_is_owner_scoped() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();
        let other = ctx.users().create("bob", "hash").await.unwrap().unwrap();

        let article = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &[])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            repo.toggle_favorite(article.id, other.id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_to_children() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let article = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &["X".to_string()])
            .await
            .unwrap()
            .unwrap();
        repo.save_analysis(article.id, AnalysisKind::Summary, &serde_json::json!({"k": 1}))
            .await
            .unwrap();
        repo.append_qna(article.id, "Q?", "A.").await.unwrap();

        assert!(repo.delete_for_user(article.id, user_id).await.unwrap());
        assert!(repo
            .analysis_for(article.id, AnalysisKind::Summary)
            .await
            .unwrap()
            .is_none());
        assert!(repo.qna_for(article.id).await.unwrap().is_empty());
        assert!(repo.latest_for_user(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analysis_delete_then_recreate() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let article = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &[])
            .await
            .unwrap()
            .unwrap();
        repo.save_analysis(article.id, AnalysisKind::Summary, &serde_json::json!({"v": 1}))
            .await
            .unwrap();
        repo.save_analysis(article.id, AnalysisKind::Detailed, &serde_json::json!({"v": 1}))
            .await
            .unwrap();

        assert_eq!(repo.delete_analyses(article.id).await.unwrap(), 2);

        repo.save_analysis(article.id, AnalysisKind::Summary, &serde_json::json!({"v": 2}))
            .await
            .unwrap();

        let summary = repo
            .analysis_for(article.id, AnalysisKind::Summary)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.content["v"], 2);
        assert!(repo
            .analysis_for(article.id, AnalysisKind::Detailed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_qna_is_ordered_by_insertion() {
        let (ctx, user_id, _dir) = setup().await;
        let repo = ctx.articles();

        let article = repo
            .insert_new(&paper(user_id, "2401.00001v1"), &[])
            .await
            .unwrap()
            .unwrap();
        repo.append_qna(article.id, "first?", "1").await.unwrap();
        repo.append_qna(article.id, "second?", "2").await.unwrap();

        let qna = repo.qna_for(article.id).await.unwrap();
        assert_eq!(qna.len(), 2);
        assert_eq!(qna[0].question, "first?");
        assert_eq!(qna[1].question, "second?");
    }
}
