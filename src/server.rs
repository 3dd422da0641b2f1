//! The HTTP surface. Handlers only read the repository's published catalog
//! and hand it to [`Views`]; they never trigger builds.

use crate::locator::POSTS_PREFIX;
use crate::render::{self, Views};
use crate::repository::Repository;
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Everything the handlers need, shared across requests.
pub struct Site {
    pub repository: Repository,
    pub views: Views,
    pub static_directory: PathBuf,
}

pub fn router(site: Arc<Site>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/cv", get(cv))
        .route("/posts/{*path}", get(post))
        .route("/static/{*path}", get(static_file))
        .fallback(not_found)
        .with_state(site)
}

async fn home(State(site): State<Arc<Site>>) -> Response {
    page(site.views.home(&site.repository.all()))
}

async fn about(State(site): State<Arc<Site>>) -> Response {
    page(site.views.about())
}

async fn cv(State(site): State<Arc<Site>>) -> Response {
    page(site.views.cv())
}

/// Serves a post page. Every lookup for the request runs against one catalog
/// snapshot, so the post and its neighbors always come from the same build.
/// Lenient spellings of a post URL redirect to the canonical one.
async fn post(State(site): State<Arc<Site>>, UrlPath(path): UrlPath<String>) -> Response {
    let catalog = site.repository.snapshot();
    let extension = &site.repository.settings().format.extension;
    match catalog.find(&path, extension) {
        Some(post) if post.url != format!("{}{}", POSTS_PREFIX, path) => {
            Redirect::permanent(&post.url).into_response()
        }
        Some(post) => page(site.views.post(&catalog, post)),
        None => {
            tracing::debug!(path = %path, "no such post");
            not_found().await
        }
    }
}

async fn static_file(
    State(site): State<Arc<Site>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    let relative = match safe_relative_path(&path) {
        Some(relative) => relative,
        None => return not_found().await,
    };
    let full_path = site.static_directory.join(&relative);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&relative))], bytes).into_response(),
        Err(err) => {
            tracing::debug!(path = %full_path.display(), %err, "static file unavailable");
            not_found().await
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("<h1>404 Not Found</h1>")).into_response()
}

fn page(result: render::Result<Vec<u8>>) -> Response {
    match result {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(%err, "rendering page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Converts a request path into a path relative to the static directory,
/// rejecting anything that could escape it.
fn safe_relative_path(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            _ => return None,
        }
    }
    match relative.as_os_str().is_empty() {
        true => None,
        false => Some(relative),
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
