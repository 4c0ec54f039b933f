//! User account repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{NewUser, UserRecord};
use super::parse_datetime;
use crate::models::User;
use crate::schema::{article_authors, articles, analyses, keywords, qna_history, users};

#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncSqlitePool,
}

impl UserRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account. Returns `None` when the username is taken.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339();
        let rows = diesel::insert_into(users::table)
            .values(NewUser {
                username,
                password_hash,
                api_key: None,
                created_at: &created_at,
            })
            .on_conflict(users::username)
            .do_nothing()
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Ok(None);
        }

        users::table
            .filter(users::username.eq(username))
            .first::<UserRecord>(&mut conn)
            .await
            .map(|r| Some(Self::record_to_user(r)))
    }

    /// Look up an account by login name.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(username))
            .first::<UserRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Self::record_to_user))
    }

    /// Get an account by id.
    pub async fn get(&self, id: i32) -> Result<Option<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(id)
            .first::<UserRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Self::record_to_user))
    }

    /// All accounts, used by the scheduled fetch.
    pub async fn get_all(&self) -> Result<Vec<User>, DieselError> {
        let mut conn = self.pool.get().await?;

        users::table
            .order(users::id.asc())
            .load::<UserRecord>(&mut conn)
            .await
            .map(|rs| rs.into_iter().map(Self::record_to_user).collect())
    }

    /// Store (or clear) the per-user AI service key.
    pub async fn set_api_key(&self, id: i32, api_key: Option<&str>) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(users::table.find(id))
            .set(users::api_key.eq(api_key))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Delete an account and everything it owns.
    pub async fn delete(&self, id: i32) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                let article_ids: Vec<i32> = articles::table
                    .filter(articles::user_id.eq(id))
                    .select(articles::id)
                    .load(conn)
                    .await?;

                diesel::delete(
                    analyses::table.filter(analyses::article_id.eq_any(&article_ids)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    qna_history::table.filter(qna_history::article_id.eq_any(&article_ids)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    article_authors::table
                        .filter(article_authors::article_id.eq_any(&article_ids)),
                )
                .execute(conn)
                .await?;
                diesel::delete(articles::table.filter(articles::user_id.eq(id)))
                    .execute(conn)
                    .await?;
                diesel::delete(keywords::table.filter(keywords::user_id.eq(id)))
                    .execute(conn)
                    .await?;

                let rows = diesel::delete(users::table.find(id)).execute(conn).await?;
                Ok(rows > 0)
            })
        })
        .await
    }

    fn record_to_user(r: UserRecord) -> User {
        User {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            api_key: r.api_key,
            created_at: parse_datetime(&r.created_at),
        }
    }
}
