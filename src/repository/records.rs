//! Diesel row types for database tables.

use diesel::prelude::*;

use crate::schema;

/// User record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub api_key: Option<String>,
    pub created_at: String,
}

/// New user for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub api_key: Option<&'a str>,
    pub created_at: &'a str,
}

/// Keyword record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::keywords)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct KeywordRecord {
    pub id: i32,
    pub user_id: i32,
    pub keyword: String,
    pub created_at: String,
}

/// New keyword for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::keywords)]
pub struct NewKeyword<'a> {
    pub user_id: i32,
    pub keyword: &'a str,
    pub created_at: &'a str,
}

/// Author record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::authors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthorRecord {
    pub id: i32,
    pub name: String,
}

/// Article record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArticleRecord {
    pub id: i32,
    pub entry_id: String,
    pub user_id: i32,
    pub title: String,
    pub published: String,
    pub pdf_url: Option<String>,
    pub original_abstract: String,
    pub local_path: Option<String>,
    pub image_paths: String,
    pub is_favorited: i32,
    pub created_at: String,
}

/// New article for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::articles)]
pub struct NewArticle<'a> {
    pub entry_id: &'a str,
    pub user_id: i32,
    pub title: &'a str,
    pub published: &'a str,
    pub pdf_url: Option<&'a str>,
    pub original_abstract: &'a str,
    pub local_path: Option<&'a str>,
    pub image_paths: &'a str,
    pub is_favorited: i32,
    pub created_at: &'a str,
}

/// Analysis record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::analyses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalysisRecord {
    pub id: i32,
    pub article_id: i32,
    pub kind: String,
    pub content: String,
    pub created_at: String,
}

/// Q&A record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::qna_history)]
pub struct QnaRecord {
    pub id: i32,
    pub article_id: i32,
    pub question: String,
    pub answer: String,
    pub created_at: String,
}
