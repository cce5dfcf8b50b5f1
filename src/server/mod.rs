//! Preview server with on-demand generation
//!
//! Serves the public directory. Post routes that were never generated are
//! produced on first request: the requester gets the fallback placeholder
//! (which reloads itself) while generation runs in the background. Stale
//! routes are served as they are and regenerated behind the response.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::ContentError;
use crate::cache::{unix_now, RevalidationCache};
use crate::detail::DetailState;
use crate::generator::{
    is_path_safe, post_route, GenerateError, Generator, RenderedRoute, INDEX_ROUTE,
};
use crate::Site;

/// Server state
pub struct ServerState {
    generator: Generator,
    base_dir: PathBuf,
    cache: Mutex<RevalidationCache>,
    /// Routes with a generation in flight
    in_flight: Mutex<HashSet<String>>,
}

impl ServerState {
    pub fn new(site: &Site, generator: Generator) -> Self {
        Self {
            generator,
            base_dir: site.base_dir.clone(),
            cache: Mutex::new(RevalidationCache::load(&site.base_dir)),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Claim a route for generation; false if someone else already has it
    async fn claim(&self, route: &str) -> bool {
        self.in_flight.lock().await.insert(route.to_string())
    }

    async fn release(&self, route: &str) {
        self.in_flight.lock().await.remove(route);
    }

    fn not_found(&self) -> Response {
        match self.generator.render_detail(&DetailState::NotFound) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }

    fn fallback(&self) -> Response {
        match self.generator.render_detail(&DetailState::Fallback) {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(&e),
        }
    }
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .route("/api/posts", get(first_page_handler))
        .route("/api/posts/:file", get(listing_page_handler))
        .fallback(static_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(
    site: &Site,
    generator: Generator,
    ip: &str,
    port: u16,
    open: bool,
) -> Result<()> {
    let state = Arc::new(ServerState::new(site, generator));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    let now = unix_now();
    let (exists, stale) = {
        let cache = state.cache.lock().await;
        (
            state.generator.route_exists(INDEX_ROUTE),
            cache.is_stale(INDEX_ROUTE, now, state.generator.revalidate()),
        )
    };

    if !exists {
        // The first requester waits for the home page; concurrent ones get the placeholder
        if !state.claim(INDEX_ROUTE).await {
            return state.fallback();
        }
        if let Err(e) = regenerate_index(state.clone()).await {
            return (status_for(&e), "Failed to generate the home page").into_response();
        }
    } else if stale && state.claim(INDEX_ROUTE).await {
        tokio::spawn(regenerate_index(state.clone()));
    }

    serve_route(&state, INDEX_ROUTE).await
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    if !is_path_safe(&uid) {
        return state.not_found();
    }

    let route = post_route(&uid);
    let now = unix_now();
    let revalidate = state.generator.revalidate();
    let (known_missing, stale) = {
        let cache = state.cache.lock().await;
        (
            cache.is_known_missing(&route, now, revalidate),
            cache.is_stale(&route, now, revalidate),
        )
    };

    if known_missing {
        return state.not_found();
    }

    if !state.generator.route_exists(&route) {
        if state.claim(&route).await {
            tracing::info!("Generating {} on demand", route);
            tokio::spawn(regenerate_post(state.clone(), uid));
        }
        return state.fallback();
    }

    if stale && state.claim(&route).await {
        tracing::debug!("Revalidating {}", route);
        tokio::spawn(regenerate_post(state.clone(), uid));
    }

    serve_route(&state, &route).await
}

#[derive(Debug, Deserialize)]
struct ListingQuery {
    after: Option<String>,
}

async fn first_page_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListingQuery>,
) -> Response {
    listing_page(&state, query.after.as_deref()).await
}

async fn listing_page_handler(
    State(state): State<Arc<ServerState>>,
    Path(file): Path<String>,
) -> Response {
    let cursor = file.strip_suffix(".json").unwrap_or(&file);
    listing_page(&state, Some(cursor)).await
}

/// A "load more" page, fetched live
async fn listing_page(state: &ServerState, after: Option<&str>) -> Response {
    match state.generator.listing_page_json(after).await {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            tracing::warn!("Load more failed: {}", e);
            (status_for(&e), Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn regenerate_index(state: Arc<ServerState>) -> Result<(), GenerateError> {
    let result = state.generator.generate_index().await;
    match &result {
        Ok(routes) => {
            publish_all(&state, routes).await;
            let mut cache = state.cache.lock().await;
            match state.generator.prune_listing_pages(routes, &mut cache) {
                Ok(0) => {}
                Ok(_) => save_cache(&state, &cache),
                Err(e) => tracing::warn!("Failed to prune listing pages: {}", e),
            }
        }
        Err(e) => tracing::error!("Regenerating home page failed: {}", e),
    }
    state.release(INDEX_ROUTE).await;
    result.map(|_| ())
}

async fn regenerate_post(state: Arc<ServerState>, uid: String) {
    let route = post_route(&uid);
    match state.generator.generate_post(&uid).await {
        Ok(rendered) => publish_all(&state, std::slice::from_ref(&rendered)).await,
        Err(GenerateError::NotFound(_)) => {
            let mut cache = state.cache.lock().await;
            if let Err(e) = state.generator.remove_route(&route) {
                tracing::warn!("Failed to remove {}: {}", route, e);
            }
            cache.record_missing(&route, unix_now());
            save_cache(&state, &cache);
        }
        Err(e) => tracing::error!("Generating {} failed: {}", route, e),
    }
    state.release(&route).await;
}

async fn publish_all(state: &ServerState, routes: &[RenderedRoute]) {
    let now = unix_now();
    let mut cache = state.cache.lock().await;
    for rendered in routes {
        if let Err(e) = state.generator.publish(rendered, &mut cache, now) {
            tracing::error!("Failed to write {}: {}", rendered.route, e);
        }
    }
    save_cache(state, &cache);
}

fn save_cache(state: &ServerState, cache: &RevalidationCache) {
    if let Err(e) = cache.save(&state.base_dir) {
        tracing::warn!("Failed to save revalidation record: {}", e);
    }
}

/// Serve a generated route from disk
async fn serve_route(state: &ServerState, route: &str) -> Response {
    match tokio::fs::read_to_string(state.generator.route_path(route)).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => state.not_found(),
    }
}

/// Serve everything else from the public directory
async fn static_handler(State(state): State<Arc<ServerState>>, request: Request<Body>) -> Response {
    let mut service =
        ServeDir::new(state.generator.public_dir()).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => state.not_found(),
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Status for a generation failure: the CMS being down is not a missing page
fn status_for(error: &GenerateError) -> StatusCode {
    match error {
        GenerateError::NotFound(_) => StatusCode::NOT_FOUND,
        GenerateError::Content(ContentError::InvalidCursor(_)) => StatusCode::BAD_REQUEST,
        GenerateError::Content(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &GenerateError) -> Response {
    tracing::error!("{}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
