//! Router configuration for the web server.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(state.ctx.storage_dir());

    Router::new()
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/status", get(handlers::auth::status))
        // Per-user settings
        .route(
            "/api/user/settings",
            get(handlers::settings::get).post(handlers::settings::update),
        )
        // Articles
        .route("/api/articles/latest", get(handlers::articles::list_latest))
        .route(
            "/api/articles/favorites",
            get(handlers::articles::list_favorites),
        )
        .route("/api/articles/search", get(handlers::articles::search))
        .route("/api/articles/fetch", post(handlers::articles::trigger_fetch))
        .route(
            "/api/articles/batch-import",
            post(handlers::articles::batch_import),
        )
        .route(
            "/api/articles/:id",
            get(handlers::articles::detail).delete(handlers::articles::delete),
        )
        .route(
            "/api/articles/:id/favorite",
            post(handlers::articles::toggle_favorite),
        )
        .route("/api/articles/:id/ask", post(handlers::articles::ask))
        .route(
            "/api/articles/:id/regenerate",
            post(handlers::articles::regenerate),
        )
        .route(
            "/api/articles/:id/export/bibtex",
            get(handlers::articles::export_bibtex),
        )
        // Keywords
        .route(
            "/api/keywords",
            get(handlers::keywords::list).post(handlers::keywords::add),
        )
        .route("/api/keywords/:keyword", delete(handlers::keywords::remove))
        // Artifact files
        .nest_service("/media", media)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
