//! Database context: owns the connection factory and hands out repositories.

use std::path::{Path, PathBuf};

use diesel_async::SimpleAsyncConnection;

use super::articles::ArticleRepository;
use super::keywords::KeywordRepository;
use super::pool::{AsyncSqlitePool, DieselError};
use super::users::UserRepository;

/// Unified entry point for database operations.
///
/// Create one context per command or service, then use it to access
/// the per-entity repositories.
#[derive(Clone)]
pub struct DbContext {
    pool: AsyncSqlitePool,
    storage_dir: PathBuf,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path, storage_dir: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
            storage_dir: storage_dir.to_path_buf(),
        }
    }

    /// Artifact storage root.
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get a user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Get a keyword repository.
    pub fn keywords(&self) -> KeywordRepository {
        KeywordRepository::new(self.pool.clone())
    }

    /// Get an article repository.
    pub fn articles(&self) -> ArticleRepository {
        ArticleRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// Creates the necessary tables and uniqueness constraints if they
    /// don't exist. The unique index on `articles.entry_id` is the
    /// safety net against duplicate-insert races between the scheduler
    /// and user-triggered fetches.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        conn.batch_execute(
            r#"
            -- Accounts
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                api_key TEXT,
                created_at TEXT NOT NULL
            );

            -- Search keywords, unique per owner
            CREATE TABLE IF NOT EXISTS keywords (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                keyword TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(user_id, keyword),
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Authors, globally deduplicated by exact name
            CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            -- Fetched papers; entry_id is the global dedup key
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entry_id TEXT NOT NULL UNIQUE,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                published TEXT NOT NULL,
                pdf_url TEXT,
                original_abstract TEXT NOT NULL DEFAULT '',
                local_path TEXT,
                image_paths TEXT NOT NULL DEFAULT '[]',
                is_favorited INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Article/author many-to-many
            CREATE TABLE IF NOT EXISTS article_authors (
                article_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                PRIMARY KEY (article_id, author_id),
                FOREIGN KEY (article_id) REFERENCES articles(id),
                FOREIGN KEY (author_id) REFERENCES authors(id)
            );

            -- AI annotations, at most one per kind by workflow convention
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles(id)
            );

            -- Question/answer exchanges, append-only
            CREATE TABLE IF NOT EXISTS qna_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (article_id) REFERENCES articles(id)
            );

            CREATE INDEX IF NOT EXISTS idx_articles_user ON articles(user_id);
            CREATE INDEX IF NOT EXISTS idx_analyses_article ON analyses(article_id);
            CREATE INDEX IF NOT EXISTS idx_qna_article ON qna_history(article_id);
            "#,
        )
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"), dir.path());
        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();
    }
}
