//! Route paths and the route table.
//!
//! A route is the URL path a page answers to (`/`, `/user-guide/root`).
//! Paths are compared after normalization so `/a/b`, `/a/b/`,
//! `/a/b/index.html` and `/a/b.html` all name the same route.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Normalize a request or configured path to its canonical route form
///
/// ```
/// use riscdocs_core::routes::normalize_route_path;
///
/// assert_eq!(normalize_route_path("/user-guide/root/"), "/user-guide/root");
/// assert_eq!(normalize_route_path("dev-guide/todo-list.html?x=1"), "/dev-guide/todo-list");
/// assert_eq!(normalize_route_path("/index.html"), "/");
/// assert_eq!(normalize_route_path(""), "/");
/// ```
pub fn normalize_route_path(raw: &str) -> String {
    let without_query = raw.split(['?', '#']).next().unwrap_or("");
    let mut segments: Vec<&str> = without_query
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if let Some(last) = segments.last().copied() {
        if last == "index.html" {
            segments.pop();
        } else if let Some(stem) = last.strip_suffix(".html") {
            segments.pop();
            segments.push(stem);
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Route for a content file given its path relative to the content root
///
/// `home.md` and `index.md` name their directory.
pub fn route_for_content_path(rel: &Path) -> String {
    let mut segments: Vec<String> = Vec::new();
    for component in rel.with_extension("").components() {
        if let Component::Normal(part) = component {
            segments.push(part.to_string_lossy().to_string());
        }
    }

    if matches!(segments.last().map(String::as_str), Some("home" | "index")) {
        segments.pop();
    }

    normalize_route_path(&segments.join("/"))
}

/// Output file (relative to the output dir) for a route
pub fn output_rel_path(route: &str) -> PathBuf {
    let normalized = normalize_route_path(route);
    let mut path = PathBuf::new();
    for segment in normalized.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push("index.html");
    path
}

/// Entry in the route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub path: String,
    pub title: String,
    pub output: PathBuf,
}

/// Mapping from normalized route path to the page rendered there
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteTable {
    entries: BTreeMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a route, returning the previous entry on collision
    pub fn insert(&mut self, path: &str, title: &str) -> Option<RouteEntry> {
        let normalized = normalize_route_path(path);
        let entry = RouteEntry {
            path: normalized.clone(),
            title: title.to_string(),
            output: output_rel_path(&normalized),
        };
        self.entries.insert(normalized, entry)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_route_path(path))
    }

    /// Look up the page served for a request path
    pub fn resolve(&self, request_path: &str) -> Option<&RouteEntry> {
        self.entries.get(&normalize_route_path(request_path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
