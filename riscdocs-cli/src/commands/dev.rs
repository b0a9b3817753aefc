//! Dev server command implementation.

use super::build::{build_site_with_index, load_site, write_site, Site};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Router,
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};
use tower_http::trace::TraceLayer;

/// Command-line overrides for the `server` config section
#[derive(Debug, Clone, Copy, Default)]
pub struct DevOptions {
    pub port: Option<u16>,
    pub open: Option<bool>,
}

#[derive(Clone)]
struct AppState {
    site: Arc<RwLock<Site>>,
    /// Bumped on every detected change; only the newest rebuild is installed
    generation: Arc<AtomicU64>,
    /// Serializes writes to the output directory
    writes: Arc<Mutex<()>>,
}

impl AppState {
    fn new(site: Site) -> Self {
        Self {
            site: Arc::new(RwLock::new(site)),
            generation: Arc::new(AtomicU64::new(0)),
            writes: Arc::new(Mutex::new(())),
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Start development server with file watching
pub async fn dev_server(config_path: &Path, opts: DevOptions) -> Result<()> {
    // Initial build
    let site = build_site_with_index(config_path).context("Failed to build site")?;
    let port = opts.port.unwrap_or(site.config.server.port);
    let open_browser = opts.open.unwrap_or(site.config.server.open);
    let sources = WatchedSources::new(&site, config_path);
    let state = AppState::new(site);

    // Set up file watching for live rebuilds
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut _watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;
    sources.watch(&mut _watcher)?;

    tokio::spawn({
        let state = state.clone();
        let config_path = config_path.to_path_buf();
        async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(ev) => {
                        if !sources.affected_by(&ev) {
                            continue;
                        }
                        // Debounce a bit by draining pending events
                        while rx.try_recv().is_ok() {}
                        let generation = state.next_generation();
                        tracing::info!("Change detected, starting rebuild #{}", generation);
                        tokio::spawn(rebuild(state.clone(), config_path.clone(), generation));
                    }
                    Err(err) => tracing::warn!("Watcher error: {}", err),
                }
            }
        }
    });

    let app = router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let url = format!("http://localhost:{}", port);
    tracing::info!("Starting dev server on {}", url);
    println!("\n🚀 Serving at {}", url);
    println!("   Press Ctrl+C to stop\n");

    if open_browser {
        if let Err(err) = open::that(&url) {
            tracing::warn!("Failed to open browser: {}", err);
        }
    }

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .fallback(serve)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rebuild(state: AppState, config_path: PathBuf, generation: u64) {
    let result = tokio::task::spawn_blocking(move || load_site(&config_path)).await;

    match result {
        Ok(Ok(site)) => {
            if install(&state, generation, site).await {
                tracing::info!("Rebuild #{} complete", generation);
            }
        }
        Ok(Err(e)) => tracing::error!("Rebuild #{} failed: {:?}", generation, e),
        Err(e) => tracing::error!("Rebuild task panicked: {}", e),
    }
}

/// Write and swap in a rebuilt site unless a newer change superseded it
///
/// Requests keep reading the previous site while the output is written; the
/// site lock is only taken for the swap.
async fn install(state: &AppState, generation: u64, site: Site) -> bool {
    let _writing = state.writes.lock().await;
    if !write_output(state, generation, &site).await {
        return false;
    }

    let mut current = state.site.write().await;
    if !state.is_current(generation) {
        tracing::debug!("Discarding stale rebuild #{} after write", generation);
        return false;
    }
    *current = site;
    true
}

async fn write_output(state: &AppState, generation: u64, site: &Site) -> bool {
    if !state.is_current(generation) {
        tracing::debug!("Discarding stale rebuild #{}", generation);
        return false;
    }

    let snapshot = site.clone();
    match tokio::task::spawn_blocking(move || write_site(&snapshot)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Failed to write rebuilt site: {:?}", e),
        Err(e) => tracing::error!("Write task panicked: {}", e),
    }
    true
}

/// Serve routed pages from the in-memory site, other files from the output dir
async fn serve(State(state): State<AppState>, uri: Uri) -> Response {
    let site = state.site.read().await;
    let base_url = site.config.normalized_base_url();

    let Some(path) = strip_base(uri.path(), &base_url) else {
        return not_found(&site, uri.path());
    };

    if let Some(page) = site.index.find_by_route(path) {
        return match site.render_page(page) {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                tracing::error!("{:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        };
    }

    // Unrouted html files are stale output
    if !path.ends_with(".html") {
        if let Some(file_path) = output_file(&site.config.output_dir(), path) {
            if let Ok(content) = tokio::fs::read(&file_path).await {
                return ([(header::CONTENT_TYPE, content_type_for_path(path))], content)
                    .into_response();
            }
        }
    }

    not_found(&site, uri.path())
}

fn not_found(site: &Site, requested: &str) -> Response {
    match site.render_not_found(Some(requested)) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(err) => {
            tracing::error!("{:?}", err);
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
    }
}

/// Request path relative to the site base, keeping its leading slash
fn strip_base<'a>(path: &'a str, base_url: &str) -> Option<&'a str> {
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(base) {
        Some("") => Some("/"),
        Some(rest) if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Join a request path onto the output dir, refusing to leave it
fn output_file(output_dir: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path.trim_start_matches('/'));
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(output_dir.join(relative))
}

fn content_type_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        _ => "application/octet-stream",
    }
}

/// Content dir, navigation file and config file, as the watcher reports them
struct WatchedSources {
    content_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl WatchedSources {
    fn new(site: &Site, config_path: &Path) -> Self {
        Self {
            content_dir: canonical(&site.config.content_dir()),
            files: vec![
                canonical(&site.config.navigation_path()),
                canonical(config_path),
            ],
        }
    }

    fn watch(&self, watcher: &mut RecommendedWatcher) -> Result<()> {
        watcher
            .watch(&self.content_dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {:?}", self.content_dir))?;

        // Watch parent dirs so editors that replace files on save are still seen
        let mut parents: Vec<&Path> = self.files.iter().filter_map(|f| f.parent()).collect();
        parents.sort();
        parents.dedup();
        for dir in parents {
            if let Err(err) = watcher.watch(dir, RecursiveMode::NonRecursive) {
                tracing::warn!("Failed to watch {:?}: {}", dir, err);
            }
        }
        Ok(())
    }

    fn affected_by(&self, event: &notify::Event) -> bool {
        event
            .paths
            .iter()
            .any(|p| p.starts_with(&self.content_dir) || self.files.iter().any(|f| f == p))
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
