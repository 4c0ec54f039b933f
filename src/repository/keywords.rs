//! Keyword repository, owner scoped.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::pool::{AsyncSqlitePool, DieselError};
use super::records::{KeywordRecord, NewKeyword};
use super::parse_datetime;
use crate::models::Keyword;
use crate::schema::keywords;

#[derive(Clone)]
pub struct KeywordRepository {
    pool: AsyncSqlitePool,
}

impl KeywordRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// All keywords for one user, oldest first.
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<Keyword>, DieselError> {
        let mut conn = self.pool.get().await?;

        keywords::table
            .filter(keywords::user_id.eq(user_id))
            .order(keywords::id.asc())
            .load::<KeywordRecord>(&mut conn)
            .await
            .map(|rs| {
                rs.into_iter()
                    .map(|r| Keyword {
                        id: r.id,
                        user_id: r.user_id,
                        keyword: r.keyword,
                        created_at: parse_datetime(&r.created_at),
                    })
                    .collect()
            })
    }

    /// Add a keyword. Returns false when the user already has it.
    pub async fn add(&self, user_id: i32, keyword: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = Utc::now().to_rfc3339();
        let rows = diesel::insert_into(keywords::table)
            .values(NewKeyword {
                user_id,
                keyword,
                created_at: &created_at,
            })
            .on_conflict((keywords::user_id, keywords::keyword))
            .do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Remove a keyword by text. Returns false when it wasn't present.
    pub async fn remove(&self, user_id: i32, keyword: &str) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(
            keywords::table
                .filter(keywords::user_id.eq(user_id))
                .filter(keywords::keyword.eq(keyword)),
        )
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }
}
