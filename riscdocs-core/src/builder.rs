//! Site building logic - discovers documents, renders them and assembles the route table.

use crate::{
    config::Config,
    frontmatter::parse_frontmatter,
    markdown::MarkdownProcessor,
    models::*,
    navigation::NavigationConfig,
    routes::{normalize_route_path, route_for_content_path},
};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] crate::frontmatter::FrontmatterError),

    #[error("Duplicate route {route}: {first} and {second}")]
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },

    #[error("Content directory not found: {0}")]
    MissingContentDir(PathBuf),
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    processor: MarkdownProcessor,
    navigation: Option<NavigationConfig>,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            processor: MarkdownProcessor::new(),
            navigation: None,
        }
    }

    /// Check navigation entries against the built routes
    pub fn with_navigation(mut self, navigation: NavigationConfig) -> Self {
        self.navigation = Some(navigation);
        self
    }

    /// Build the entire site
    pub fn build(&self) -> Result<SiteIndex, BuildError> {
        let content_dir = self.config.content_dir();
        if !content_dir.is_dir() {
            return Err(BuildError::MissingContentDir(content_dir));
        }

        let markdown_files = self.discover_markdown_files()?;
        tracing::info!("Found {} markdown files", markdown_files.len());

        let mut index = SiteIndex::new();
        let mut sources: HashMap<String, String> = HashMap::new();

        for file_path in &markdown_files {
            let page = match self.build_page(file_path) {
                Ok(page) => page,
                Err(BuildError::Frontmatter(e)) => {
                    tracing::error!("Failed to parse {:?}: {}", file_path, e);
                    index.diagnostics.push(Diagnostic {
                        code: "frontmatter.parse".to_string(),
                        message: e.to_string(),
                        severity: DiagnosticSeverity::Error,
                        route: None,
                        source_path: self.relative_source(file_path),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            for failure in self.widget_failures(&page, file_path) {
                index.diagnostics.push(failure);
            }

            if page.is_draft() {
                tracing::debug!("Skipping draft {}", page.route);
                index.pages.push(page);
                continue;
            }

            let source = page.source_path.clone().unwrap_or_default();
            if let Some(first) = sources.get(&page.route) {
                tracing::warn!("Duplicate route: {}", page.route);
                return Err(BuildError::DuplicateRoute {
                    route: page.route.clone(),
                    first: first.clone(),
                    second: source,
                });
            }
            sources.insert(page.route.clone(), source);
            index.routes.insert(&page.route, &page.title);
            index.pages.push(page);
        }

        if let Some(navigation) = &self.navigation {
            for section in navigation.sections() {
                if !index.routes.contains(&section.path) {
                    index.diagnostics.push(Diagnostic {
                        code: "nav.missing-page".to_string(),
                        message: format!(
                            "Navigation entry '{}' points to {} which has no page",
                            section.title, section.path
                        ),
                        severity: DiagnosticSeverity::Warning,
                        route: Some(normalize_route_path(&section.path)),
                        source_path: None,
                    });
                }
            }
        }

        tracing::info!(
            "Built site index with {} routes ({} pages)",
            index.routes.len(),
            index.pages.len()
        );

        Ok(index)
    }

    /// Parse and render a single markdown file
    pub fn build_page(&self, path: &Path) -> Result<Page, BuildError> {
        let content = fs::read_to_string(path)?;
        let (frontmatter, body) = parse_frontmatter(&content)?;

        let source_path = self.relative_source(path);
        let route = match frontmatter.route.as_deref() {
            Some(route) if !route.trim().is_empty() => normalize_route_path(route),
            _ => {
                let rel = path
                    .strip_prefix(self.config.content_dir())
                    .unwrap_or(path);
                route_for_content_path(rel)
            }
        };

        let rendered = self.processor.convert(&body);

        // Fall back to the first heading, then the filename
        let title = frontmatter
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| rendered.title())
            .map(str::to_string)
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Untitled")
                    .to_string()
            });

        Ok(Page {
            route,
            title,
            content_html: rendered.html,
            frontmatter,
            source_path,
            widget_count: rendered.widget_count,
            widget_failures: rendered
                .widget_failures
                .into_iter()
                .map(|f| WidgetIssue {
                    widget: f.kind.tag().to_string(),
                    index: f.index,
                    message: f.message,
                })
                .collect(),
        })
    }

    /// Discover all markdown files under the content directory
    fn discover_markdown_files(&self) -> Result<Vec<PathBuf>, BuildError> {
        let content_dir = self.config.content_dir();
        let mut files = Vec::new();
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);

        for entry in WalkDir::new(&content_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if entry.path().extension().is_some_and(|ext| ext == "md") {
                let rel = entry
                    .path()
                    .strip_prefix(&content_dir)
                    .unwrap_or(entry.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                if should_ignore(&rel, &ignore_patterns) {
                    tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                    continue;
                }

                files.push(entry.path().to_path_buf());
            }
        }

        Ok(files)
    }

    fn relative_source(&self, path: &Path) -> Option<String> {
        path.strip_prefix(self.config.content_dir())
            .ok()
            .and_then(|p| p.to_str())
            .map(|s| s.replace('\\', "/"))
    }

    fn widget_failures(&self, page: &Page, path: &Path) -> Vec<Diagnostic> {
        page.widget_failures
            .iter()
            .map(|issue| {
                tracing::warn!(
                    "{}: {} widget #{} failed: {}",
                    path.display(),
                    issue.widget,
                    issue.index,
                    issue.message
                );
                Diagnostic {
                    code: "widget.render".to_string(),
                    message: format!("{} widget #{}: {}", issue.widget, issue.index, issue.message),
                    severity: DiagnosticSeverity::Warning,
                    route: Some(page.route.clone()),
                    source_path: page.source_path.clone(),
                }
            })
            .collect()
    }
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)], extra_config: &str) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        for (rel, body) in files {
            let path = content.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        fs::create_dir_all(&content).unwrap();
        let config_path = dir.path().join("riscdocs.yml");
        fs::write(
            &config_path,
            format!("site:\n  title: Test Docs\n{}", extra_config),
        )
        .unwrap();
        let config = Config::from_file(&config_path).unwrap();
        (dir, config)
    }

    #[test]
    fn routes_follow_content_layout() {
        let (_dir, config) = site(
            &[
                ("home.md", "# Welcome\n"),
                ("user-guide/root.md", "# User Guide\n"),
                ("dev-guide/todo-list.md", "---\ntitle: TODO\n---\n- [ ] caches\n"),
                ("dev-guide/index.md", "Overview without heading\n"),
            ],
            "",
        );
        let index = SiteBuilder::new(config).build().unwrap();

        let paths: Vec<&str> = index.routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/", "/dev-guide", "/dev-guide/todo-list", "/user-guide/root"]
        );
        assert_eq!(index.find_by_route("/").unwrap().title, "Welcome");
        assert_eq!(index.find_by_route("/dev-guide/todo-list/").unwrap().title, "TODO");
        assert_eq!(index.find_by_route("/dev-guide").unwrap().title, "index");
    }

    #[test]
    fn frontmatter_route_overrides_location() {
        let (_dir, config) = site(
            &[("misc/waves.md", "---\nroute: /dev-guide/how-to-draw-waveforms/\n---\n# Waves\n")],
            "",
        );
        let index = SiteBuilder::new(config).build().unwrap();
        assert!(index.routes.contains("/dev-guide/how-to-draw-waveforms"));
        assert!(!index.routes.contains("/misc/waves"));
    }

    #[test]
    fn drafts_are_not_routed() {
        let (_dir, config) = site(
            &[
                ("a.md", "# A\n"),
                ("b.md", "---\ndraft: true\n---\n# B\n"),
            ],
            "",
        );
        let index = SiteBuilder::new(config).build().unwrap();
        assert_eq!(index.routes.len(), 1);
        assert_eq!(index.pages.len(), 2);
        assert_eq!(index.published().count(), 1);
    }

    #[test]
    fn draft_does_not_shadow_published_page() {
        let (_dir, config) = site(
            &[
                ("a.md", "---
draft: true
route: /b
---
# Draft
"),
                ("b.md", "# Published
"),
            ],
            "",
        );
        let index = SiteBuilder::new(config).build().unwrap();
        let page = index.find_by_route("/b").unwrap();
        assert_eq!(page.title, "Published");
        assert!(!page.is_draft());
    }

    #[test]
    fn duplicate_routes_abort() {
        let (_dir, config) = site(
            &[
                ("guide.md", "# One\n"),
                ("other.md", "---\nroute: /guide\n---\n# Two\n"),
            ],
            "",
        );
        match SiteBuilder::new(config).build() {
            Err(BuildError::DuplicateRoute { route, .. }) => assert_eq!(route, "/guide"),
            other => panic!("expected duplicate route error, got {other:?}"),
        }
    }

    #[test]
    fn bad_frontmatter_is_skipped_with_diagnostic() {
        let (_dir, config) = site(
            &[("ok.md", "# Ok\n"), ("bad.md", "---\ntitle: [unclosed\n---\nbody\n")],
            "",
        );
        let index = SiteBuilder::new(config).build().unwrap();
        assert_eq!(index.routes.len(), 1);
        assert!(index
            .diagnostics
            .iter()
            .any(|d| d.code == "frontmatter.parse" && d.source_path.as_deref() == Some("bad.md")));
    }

    #[test]
    fn widget_failures_become_diagnostics() {
        let (_dir, config) = site(&[("waves.md", "# Waves\n\n```wavedrom\n{ nope\n```\n")], "");
        let index = SiteBuilder::new(config).build().unwrap();
        let diag = index
            .diagnostics
            .iter()
            .find(|d| d.code == "widget.render")
            .expect("widget diagnostic");
        assert_eq!(diag.route.as_deref(), Some("/waves"));
        assert!(diag.message.starts_with("wavedrom widget #0"));
        assert!(index.find_by_route("/waves").unwrap().content_html.contains("Rendering Error"));
    }

    #[test]
    fn ignore_patterns_skip_files() {
        let (_dir, config) = site(
            &[("a.md", "# A\n"), ("drafts/b.md", "# B\n")],
            "ignore_patterns:\n  - \"^drafts/\"\n",
        );
        let index = SiteBuilder::new(config).build().unwrap();
        assert_eq!(index.routes.len(), 1);
        assert!(index.routes.contains("/a"));
    }

    #[test]
    fn navigation_entries_without_pages_are_reported() {
        let (_dir, config) = site(&[("user-guide/root.md", "# Root\n")], "");
        let navigation = NavigationConfig::from_json(
            r#"{ "userGuide": { "title": "User Guide", "path": "/user-guide/root",
                 "sections": [ { "title": "Root", "path": "/user-guide/root" },
                               { "title": "Missing", "path": "/user-guide/missing" } ] } }"#,
        )
        .unwrap();
        let index = SiteBuilder::new(config)
            .with_navigation(navigation)
            .build()
            .unwrap();
        let missing: Vec<_> = index
            .diagnostics
            .iter()
            .filter(|d| d.code == "nav.missing-page")
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].route.as_deref(), Some("/user-guide/missing"));
    }

    #[test]
    fn missing_content_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("riscdocs.yml");
        fs::write(&config_path, "site:\n  title: Empty\n").unwrap();
        let config = Config::from_file(&config_path).unwrap();
        assert!(matches!(
            SiteBuilder::new(config).build(),
            Err(BuildError::MissingContentDir(_))
        ));
    }
}
