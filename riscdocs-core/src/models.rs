//! Content model structs for pages and the site index.

use crate::routes::{output_rel_path, RouteTable};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Frontmatter metadata from markdown files
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Explicit route path, overriding the one derived from the file location
    #[serde(default)]
    pub route: Option<String>,

    #[serde(default)]
    pub draft: bool,
}

/// A single content page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Normalized route path (e.g., "/user-guide/root")
    pub route: String,

    /// Display title
    pub title: String,

    /// Rendered HTML content
    pub content_html: String,

    /// Original frontmatter
    pub frontmatter: Frontmatter,

    /// Source path relative to the content directory
    pub source_path: Option<String>,

    /// Number of widgets rendered on the page
    pub widget_count: usize,

    /// Widgets that rendered an error panel
    #[serde(default)]
    pub widget_failures: Vec<WidgetIssue>,
}

/// A widget that failed to render on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetIssue {
    /// Fence tag (`wavedrom`, `info`, ...)
    pub widget: String,
    /// Position of the widget on its page
    pub index: usize,
    pub message: String,
}

impl Page {
    pub fn is_draft(&self) -> bool {
        self.frontmatter.draft
    }

    /// Relative output path for this page (no leading slash)
    pub fn output_rel_path(&self) -> PathBuf {
        output_rel_path(&self.route)
    }

    pub fn description(&self) -> &str {
        self.frontmatter
            .description
            .as_deref()
            .unwrap_or(self.title.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Error,
}

/// Non-fatal problem found while building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub route: Option<String>,
    pub source_path: Option<String>,
}

/// Everything produced by a build: pages, routes and diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteIndex {
    pub pages: Vec<Page>,
    pub routes: RouteTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the page answering to a request path
    pub fn find_by_route(&self, path: &str) -> Option<&Page> {
        let entry = self.routes.resolve(path)?;
        self.published().find(|p| p.route == entry.path)
    }

    pub fn published(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| !p.is_draft())
    }
}
