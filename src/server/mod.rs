//! JSON web API over the paper library.
//!
//! Session-authenticated endpoints for articles, keywords, settings,
//! and the workflow triggers, plus static serving of downloaded
//! artifacts under /media.

mod error;
mod handlers;
mod routes;
pub mod session;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::ingest::IngestService;
use crate::llm::AnalysisClient;
use crate::repository::DbContext;
use session::SessionStore;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub ctx: DbContext,
    pub ingest: Arc<IngestService>,
    pub llm: Arc<AnalysisClient>,
    pub sessions: SessionStore,
}

/// Start the web server (and nothing else; the caller owns the
/// scheduler).
pub async fn serve(
    settings: &Settings,
    ingest: Arc<IngestService>,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let state = AppState {
        ctx: settings.create_db_context(),
        ingest,
        llm: Arc::new(AnalysisClient::new(settings.llm.clone())),
        sessions: SessionStore::new(),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::arxiv::{ArxivClient, ArxivConfig};
    use crate::llm::LlmConfig;
    use crate::models::AnalysisKind;
    use crate::repository::NewArticleData;

    fn test_state(ctx: DbContext) -> AppState {
        // Unroutable endpoints; tests never perform network calls.
        let arxiv = ArxivClient::new(ArxivConfig {
            base_url: "http://invalid.invalid/api/query".to_string(),
            ..ArxivConfig::default()
        });
        let llm_config = LlmConfig {
            endpoint: "http://invalid.invalid/v1".to_string(),
            ..LlmConfig::default()
        };
        let ingest = Arc::new(IngestService::new(
            arxiv,
            AnalysisClient::new(llm_config.clone()),
            ctx.clone(),
            5,
        ));

        AppState {
            ctx,
            ingest,
            llm: Arc::new(AnalysisClient::new(llm_config)),
            sessions: SessionStore::new(),
        }
    }

    async fn setup_test_app() -> (axum::Router, AppState, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"), dir.path());
        ctx.init_schema().await.unwrap();

        let state = test_state(ctx);
        let app = create_router(state.clone());
        (app, state, dir)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request_with_cookie(
        method: &str,
        uri: &str,
        cookie: &str,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, cookie);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        builder.body(body).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Register and log in a user; returns the session cookie.
    async fn login(app: &axum::Router, username: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({ "username": username, "password": "hunter2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({ "username": username, "password": "hunter2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    /// Insert an article directly through the repository.
    async fn seed_article(state: &AppState, username: &str, entry_id: &str) -> i32 {
        let user = state
            .ctx
            .users()
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap();
        let article = state
            .ctx
            .articles()
            .insert_new(
                &NewArticleData {
                    entry_id: entry_id.to_string(),
                    user_id: user.id,
                    title: "Ising Machines".to_string(),
                    published: chrono::Utc::now(),
                    pdf_url: None,
                    original_abstract: "We survey Ising machines.".to_string(),
                    local_path: None,
                    image_paths: Vec::new(),
                },
                &["Jane Smith".to_string()],
            )
            .await
            .unwrap()
            .unwrap();
        article.id
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_empty() {
        let (app, _state, _dir) = setup_test_app().await;

        let ok = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({ "username": "alice", "password": "pw" }),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::CREATED);

        let dup = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({ "username": "alice", "password": "pw" }),
            ))
            .await
            .unwrap();
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);

        let empty = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                json!({ "username": "", "password": "pw" }),
            ))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password() {
        let (app, _state, _dir) = setup_test_app().await;
        login(&app, "alice").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                json!({ "username": "alice", "password": "wrong" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status_reflects_session() {
        let (app, _state, _dir) = setup_test_app().await;

        let anon = app
            .clone()
            .oneshot(Request::get("/api/auth/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(anon).await, json!({ "isLoggedIn": false }));

        let cookie = login(&app, "alice").await;
        let authed = app
            .clone()
            .oneshot(json_request_with_cookie("GET", "/api/auth/status", &cookie, None))
            .await
            .unwrap();
        assert_eq!(
            body_json(authed).await,
            json!({ "isLoggedIn": true, "username": "alice" })
        );
    }

    #[tokio::test]
    async fn test_articles_require_session() {
        let (app, _state, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/articles/latest")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_keyword_add_list_delete() {
        let (app, _state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;

        let added = app
            .clone()
            .oneshot(json_request_with_cookie(
                "POST",
                "/api/keywords",
                &cookie,
                Some(json!({ "keyword": "quantum annealing" })),
            ))
            .await
            .unwrap();
        assert_eq!(added.status(), StatusCode::OK);
        assert_eq!(body_json(added).await, json!(["quantum annealing"]));

        let empty = app
            .clone()
            .oneshot(json_request_with_cookie(
                "POST",
                "/api/keywords",
                &cookie,
                Some(json!({ "keyword": "  " })),
            ))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let deleted = app
            .clone()
            .oneshot(json_request_with_cookie(
                "DELETE",
                "/api/keywords/quantum%20annealing",
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let listed = app
            .clone()
            .oneshot(json_request_with_cookie("GET", "/api/keywords", &cookie, None))
            .await
            .unwrap();
        assert_eq!(body_json(listed).await, json!([]));
    }

    #[tokio::test]
    async fn test_detail_reports_missing_analyses_as_null() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;
        let article_id = seed_article(&state, "alice", "2401.00001v1").await;

        // Only a detailed analysis is stored; the summary slot is null.
        state
            .ctx
            .articles()
            .save_analysis(
                article_id,
                AnalysisKind::Detailed,
                &json!({ "background": "spin glasses" }),
            )
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                &format!("/api/articles/{}", article_id),
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["summary_analysis"], Value::Null);
        assert_eq!(body["detailed_analysis"]["background"], "spin glasses");
        assert_eq!(body["authors"], json!(["Jane Smith"]));
        assert_eq!(body["is_favorited"], false);
    }

    #[tokio::test]
    async fn test_detail_is_owner_scoped() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie_alice = login(&app, "alice").await;
        let cookie_bob = login(&app, "bob").await;
        let article_id = seed_article(&state, "alice", "2401.00001v1").await;

        let own = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                &format!("/api/articles/{}", article_id),
                &cookie_alice,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(own.status(), StatusCode::OK);

        let foreign = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                &format!("/api/articles/{}", article_id),
                &cookie_bob,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_favorite_toggle_twice_restores_value() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;
        let article_id = seed_article(&state, "alice", "2401.00001v1").await;
        let uri = format!("/api/articles/{}/favorite", article_id);

        let first = app
            .clone()
            .oneshot(json_request_with_cookie("POST", &uri, &cookie, None))
            .await
            .unwrap();
        assert_eq!(body_json(first).await["is_favorited"], true);

        let favorites = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                "/api/articles/favorites",
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(body_json(favorites).await.as_array().unwrap().len(), 1);

        let second = app
            .clone()
            .oneshot(json_request_with_cookie("POST", &uri, &cookie, None))
            .await
            .unwrap();
        assert_eq!(body_json(second).await["is_favorited"], false);
    }

    #[tokio::test]
    async fn test_bibtex_export_uses_trailing_id_segment() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;
        let article_id =
            seed_article(&state, "alice", "http://arxiv.org/abs/2401.00001").await;

        let response = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                &format!("/api/articles/{}/export/bibtex", article_id),
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap(),
            "attachment; filename=2401.00001.bib"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entry = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(entry.starts_with("@article{2401.00001,"));
        assert!(entry.contains("Jane Smith"));
    }

    #[tokio::test]
    async fn test_delete_article_then_detail_is_404() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;
        let article_id = seed_article(&state, "alice", "2401.00001v1").await;

        let deleted = app
            .clone()
            .oneshot(json_request_with_cookie(
                "DELETE",
                &format!("/api/articles/{}", article_id),
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let detail = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                &format!("/api/articles/{}", article_id),
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (app, state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;
        let article_id = seed_article(&state, "alice", "2401.00001v1").await;

        let no_query = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                "/api/articles/search",
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(no_query.status(), StatusCode::BAD_REQUEST);

        let no_ids = app
            .clone()
            .oneshot(json_request_with_cookie(
                "POST",
                "/api/articles/batch-import",
                &cookie,
                Some(json!({ "entry_ids": [] })),
            ))
            .await
            .unwrap();
        assert_eq!(no_ids.status(), StatusCode::BAD_REQUEST);

        let no_question = app
            .clone()
            .oneshot(json_request_with_cookie(
                "POST",
                &format!("/api/articles/{}/ask", article_id),
                &cookie,
                Some(json!({ "question": "" })),
            ))
            .await
            .unwrap();
        assert_eq!(no_question.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let (app, _state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;

        let initial = app
            .clone()
            .oneshot(json_request_with_cookie("GET", "/api/user/settings", &cookie, None))
            .await
            .unwrap();
        assert_eq!(body_json(initial).await, json!({ "api_key": "" }));

        let update = app
            .clone()
            .oneshot(json_request_with_cookie(
                "POST",
                "/api/user/settings",
                &cookie,
                Some(json!({ "api_key": "sk-test" })),
            ))
            .await
            .unwrap();
        assert_eq!(update.status(), StatusCode::OK);

        let updated = app
            .clone()
            .oneshot(json_request_with_cookie("GET", "/api/user/settings", &cookie, None))
            .await
            .unwrap();
        assert_eq!(body_json(updated).await, json!({ "api_key": "sk-test" }));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (app, _state, _dir) = setup_test_app().await;
        let cookie = login(&app, "alice").await;

        let logout = app
            .clone()
            .oneshot(json_request_with_cookie("POST", "/api/auth/logout", &cookie, None))
            .await
            .unwrap();
        assert_eq!(logout.status(), StatusCode::OK);

        let after = app
            .clone()
            .oneshot(json_request_with_cookie(
                "GET",
                "/api/articles/latest",
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
    }
}
