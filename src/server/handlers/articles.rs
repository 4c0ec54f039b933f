//! Article endpoints: listing, detail, favorites, Q&A, citation export,
//! and the workflow triggers (fetch, search, batch import, regenerate).

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::session::CurrentUser;
use super::super::AppState;
use crate::models::{AnalysisKind, Article, ArticleSummary, User};

/// GET /api/articles/latest
pub async fn list_latest(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let articles = state.ctx.articles().latest_for_user(user.id).await?;
    Ok(Json(articles))
}

/// GET /api/articles/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let articles = state.ctx.articles().favorites_for_user(user.id).await?;
    Ok(Json(articles))
}

/// GET /api/articles/:id
pub async fn detail(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let repo = state.ctx.articles();
    let article = load_owned(&state, article_id, user.id).await?;

    let authors = repo.authors_for(article.id).await?;
    let summary = repo
        .analysis_for(article.id, AnalysisKind::Summary)
        .await?
        .map(|a| a.content);
    let detailed = repo
        .analysis_for(article.id, AnalysisKind::Detailed)
        .await?
        .map(|a| a.content);
    let qna = repo.qna_for(article.id).await?;

    Ok(Json(json!({
        "id": article.id,
        "title": article.title,
        "published": article.published_date().to_string(),
        "authors": authors,
        "pdf_url": article.pdf_url,
        "original_abstract": article.original_abstract,
        "summary_analysis": summary,
        "detailed_analysis": detailed,
        "qna_history": qna
            .iter()
            .map(|q| json!({ "question": q.question, "answer": q.answer }))
            .collect::<Vec<_>>(),
        "is_favorited": article.is_favorited,
        "image_paths": article.image_paths,
    })))
}

/// POST /api/articles/:id/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let flag = state
        .ctx
        .articles()
        .toggle_favorite(article_id, user.id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(json!({ "status": "success", "is_favorited": flag })))
}

/// DELETE /api/articles/:id
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = state
        .ctx
        .articles()
        .delete_for_user(article_id, user.id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({ "status": "success", "message": "Article deleted." })))
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    question: String,
}

/// POST /api/articles/:id/ask
pub async fn ask(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
    Json(req): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question is required".to_string()));
    }

    let repo = state.ctx.articles();
    let article = load_owned(&state, article_id, user.id).await?;
    let account = load_account(&state, user.id).await?;

    // Context is the abstract, enriched with the stored summary when
    // one exists.
    let mut context = article.original_abstract.clone();
    if let Some(summary) = repo.analysis_for(article.id, AnalysisKind::Summary).await? {
        context.push_str("\n\nAI summary:\n");
        context.push_str(&summary.content.to_string());
    }

    let answer = state
        .llm
        .answer_with_context(question, &context, account.api_key.as_deref())
        .await;

    repo.append_qna(article.id, question, &answer).await?;

    Ok(Json(json!({ "answer": answer })))
}

/// GET /api/articles/:id/export/bibtex
pub async fn export_bibtex(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
) -> Result<Response, ApiError> {
    let article = load_owned(&state, article_id, user.id).await?;
    let authors = state.ctx.articles().authors_for(article.id).await?;

    let key = article.citation_key();
    let entry = format!(
        "@article{{{key},\n  author  = {{{authors}}},\n  title   = {{{title}}},\n  journal = {{arXiv preprint arXiv:{key}}},\n  year    = {{{year}}}\n}}\n",
        key = key,
        authors = authors.join(" and "),
        title = article.title,
        year = article.published_date().format("%Y"),
    );

    let response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/x-bibtex".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}.bib", key),
            ),
        ],
        entry,
    );
    Ok(response.into_response())
}

/// POST /api/articles/fetch
pub async fn trigger_fetch(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = load_account(&state, user.id).await?;
    let report = state
        .ingest
        .fetch_for_user(&account)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({ "status": "success", "report": report })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
}

/// GET /api/articles/search
pub async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest(
            "Query parameter is required".to_string(),
        ));
    }

    let hits = state.ingest.search_only(query).await?;
    Ok(Json(json!({ "results": hits })))
}

#[derive(Debug, Deserialize)]
pub struct BatchImportRequest {
    #[serde(default)]
    entry_ids: Vec<String>,
}

/// POST /api/articles/batch-import
pub async fn batch_import(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<BatchImportRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.entry_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "entry_ids list is required".to_string(),
        ));
    }

    let account = load_account(&state, user.id).await?;
    let report = state
        .ingest
        .batch_import(&account, &req.entry_ids)
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({ "status": "success", "report": report })))
}

/// POST /api/articles/:id/regenerate
pub async fn regenerate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(article_id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let article = load_owned(&state, article_id, user.id).await?;
    let account = load_account(&state, user.id).await?;

    state
        .ingest
        .regenerate(&article, account.api_key.as_deref())
        .await
        .map_err(ApiError::Internal)?;

    Ok(Json(json!({ "status": "success" })))
}

/// Fetch an article scoped to its owner, or 404.
async fn load_owned(state: &AppState, article_id: i32, user_id: i32) -> Result<Article, ApiError> {
    state
        .ctx
        .articles()
        .get_for_user(article_id, user_id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Fetch the caller's full account row.
async fn load_account(state: &AppState, user_id: i32) -> Result<User, ApiError> {
    state
        .ctx
        .users()
        .get(user_id)
        .await?
        .ok_or(ApiError::Unauthorized)
}
