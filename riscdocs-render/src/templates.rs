//! Askama template definitions.

use crate::icons::{icon, icon_or_empty};
use askama::Template;
use riscdocs_core::routes::normalize_route_path;
use riscdocs_core::{Config, NavigationConfig, Page, SidebarState, ThemeState};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Failed to serialize page state: {0}")]
    State(#[from] serde_json::Error),
}

/// A header navigation link
#[derive(Debug, Clone)]
pub struct HeaderLinkView {
    pub label: String,
    pub href: String,
    pub icon_svg: String,
    pub active: bool,
}

/// A sidebar section link
#[derive(Debug, Clone)]
pub struct SectionView {
    pub title: String,
    pub description: String,
    pub href: String,
    /// Tooltip for the initial (expanded) sidebar
    pub tooltip: String,
    /// Empty for unknown icon keys
    pub icon_svg: String,
    pub active: bool,
}

/// A sidebar group (user guide, developer guide)
#[derive(Debug, Clone)]
pub struct GroupView {
    pub title: String,
    pub href: String,
    pub sections: Vec<SectionView>,
}

/// Everything the layout chrome needs: header, sidebar and theme state
#[derive(Debug, Clone)]
pub struct LayoutContext {
    pub site_title: String,
    pub site_description: String,
    pub base_url: String,
    pub home_href: String,
    pub css_path: String,
    pub js_path: String,

    // Theme
    pub theme: String,
    pub theme_class: String,
    pub theme_toggle_label: String,

    // Sidebar
    pub sidebar_class: String,
    pub sidebar_toggle_label: String,

    // Header
    pub header_links: Vec<HeaderLinkView>,
    pub repository: String,
    pub has_repository: bool,

    // Navigation
    pub groups: Vec<GroupView>,

    // Icons
    pub logo_icon: String,
    pub sun_icon: String,
    pub moon_icon: String,
    pub github_icon: String,
    pub collapse_icon: String,
    pub expand_icon: String,

    pub year: i32,
}

/// Join a route path onto the site base ("/" or "/docs/")
pub fn route_href(base_url: &str, path: &str) -> String {
    let route = normalize_route_path(path);
    let base = base_url.trim_end_matches('/');
    if route == "/" {
        format!("{}/", base)
    } else {
        format!("{}{}", base, route)
    }
}

impl LayoutContext {
    /// Layout for the page at `current_path`; `None` renders no active entry
    pub fn new(
        config: &Config,
        navigation: &NavigationConfig,
        current_path: Option<&str>,
        year: i32,
    ) -> Self {
        let base_url = config.normalized_base_url();
        let current = current_path.map(normalize_route_path);
        let is_current =
            |path: &str| current.as_deref() == Some(normalize_route_path(path).as_str());

        let theme = ThemeState::new(config.theme.default);
        let sidebar = SidebarState::default();

        let header_links = config
            .header
            .links
            .iter()
            .map(|link| HeaderLinkView {
                label: link.label.clone(),
                href: route_href(&base_url, &link.path),
                icon_svg: link
                    .icon
                    .as_deref()
                    .map(|name| icon_or_empty(name, 20))
                    .unwrap_or_default(),
                active: is_current(&link.path),
            })
            .collect();

        let groups = navigation
            .groups()
            .into_iter()
            .map(|group| GroupView {
                title: group.title.clone(),
                href: route_href(&base_url, &group.path),
                sections: group
                    .sections
                    .iter()
                    .map(|section| SectionView {
                        title: section.title.clone(),
                        description: section.description.clone().unwrap_or_default(),
                        href: route_href(&base_url, &section.path),
                        tooltip: sidebar
                            .link_title(&section.title, section.description.as_deref())
                            .to_string(),
                        icon_svg: icon_or_empty(section.icon_key(), 14),
                        active: current.as_deref().is_some_and(|c| section.matches(c)),
                    })
                    .collect(),
            })
            .collect();

        let repository = config.site.repository.clone().unwrap_or_default();

        Self {
            site_title: config.site.title.clone(),
            site_description: config.site.description.clone(),
            home_href: route_href(&base_url, "/"),
            css_path: format!("{}css/site.css", base_url),
            js_path: format!("{}js/app.js", base_url),
            base_url,
            theme: theme.theme().as_str().to_string(),
            theme_class: theme.theme().root_class().to_string(),
            theme_toggle_label: theme.theme().toggle_label(),
            sidebar_class: sidebar.class().to_string(),
            sidebar_toggle_label: sidebar.toggle_label().to_string(),
            header_links,
            has_repository: !repository.is_empty(),
            repository,
            groups,
            logo_icon: icon_or_empty("cpu", 28),
            sun_icon: icon_or_empty("sun", 18),
            moon_icon: icon_or_empty("moon", 18),
            github_icon: icon("github", 18).unwrap_or_default(),
            collapse_icon: icon_or_empty("chevron-left", 14),
            expand_icon: icon_or_empty("chevron-right", 14),
            year,
        }
    }

    /// Title of the active sidebar entry, if any
    pub fn active_section(&self) -> Option<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.sections.iter())
            .find(|s| s.active)
            .map(|s| s.title.as_str())
    }
}

/// State handed to `app.js` as JSON
#[derive(Debug, Clone, Serialize)]
pub struct PageState<'a> {
    pub route: &'a str,
    pub base_url: &'a str,
    pub default_theme: &'a str,
}

/// Content page template
#[derive(Template)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub layout: LayoutContext,
    pub title: String,
    pub description: String,
    pub route: String,
    pub content: String,
    pub source_path: String,
    pub has_source_path: bool,
    pub state_json: String,
}

impl PageTemplate {
    pub fn new(page: &Page, layout: LayoutContext) -> Result<Self, RenderError> {
        let state_json = serde_json::to_string(&PageState {
            route: &page.route,
            base_url: &layout.base_url,
            default_theme: &layout.theme,
        })?;
        let source_path = page.source_path.clone().unwrap_or_default();
        Ok(Self {
            title: page.title.clone(),
            description: page.description().to_string(),
            route: page.route.clone(),
            content: page.content_html.clone(),
            has_source_path: !source_path.is_empty(),
            source_path,
            state_json: escape_script_json(&state_json),
            layout,
        })
    }
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub layout: LayoutContext,
    pub title: String,
    pub requested: String,
    pub state_json: String,
}

impl NotFoundTemplate {
    pub fn new(requested: Option<&str>, layout: LayoutContext) -> Result<Self, RenderError> {
        let requested = requested.unwrap_or_default().to_string();
        let state_json = serde_json::to_string(&PageState {
            route: &requested,
            base_url: &layout.base_url,
            default_theme: &layout.theme,
        })?;
        Ok(Self {
            title: "Page not found".to_string(),
            requested,
            state_json: escape_script_json(&state_json),
            layout,
        })
    }
}

/// Keep serialized JSON from closing its `<script>` element
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Render a content page with its layout
pub fn render_page(page: &Page, layout: LayoutContext) -> Result<String, RenderError> {
    Ok(PageTemplate::new(page, layout)?.render()?)
}

/// Render the 404 page; `requested` is shown when known
pub fn render_not_found(
    requested: Option<&str>,
    layout: LayoutContext,
) -> Result<String, RenderError> {
    Ok(NotFoundTemplate::new(requested, layout)?.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use riscdocs_core::Frontmatter;

    const NAV: &str = r#"{
      "userGuide": { "title": "User Guide", "path": "/user-guide/root", "sections": [
        { "title": "Getting Started", "path": "/user-guide/getting-started", "icon": "cpu", "description": "Install the toolchain" },
        { "title": "Mystery", "path": "/user-guide/mystery", "icon": "rocket" }
      ]},
      "devGuide": { "title": "Developer Guide", "path": "/dev-guide/root", "sections": [
        { "title": "Todo List", "path": "/dev-guide/todo-list", "icon": "code" }
      ]}
    }"#;

    fn config(extra: &str) -> Config {
        Config::from_yaml(&format!(
            "site:\n  title: RISC Framework Docs\n  repository: https://github.com/dashygo097/risc.git\n{}",
            extra
        ))
        .unwrap()
    }

    fn nav() -> NavigationConfig {
        NavigationConfig::from_json(NAV).unwrap()
    }

    fn page(route: &str, title: &str, html: &str) -> Page {
        Page {
            route: route.to_string(),
            title: title.to_string(),
            content_html: html.to_string(),
            frontmatter: Frontmatter::default(),
            source_path: None,
            widget_count: 0,
            widget_failures: Vec::new(),
        }
    }

    #[test]
    fn hrefs_respect_base_url() {
        assert_eq!(route_href("/", "/"), "/");
        assert_eq!(route_href("/", "/a/b/"), "/a/b");
        assert_eq!(route_href("/docs/", "/"), "/docs/");
        insta::assert_snapshot!(route_href("/docs/", "a/b/index.html"), @"/docs/a/b");
    }

    #[test]
    fn configured_route_marks_its_entry_active() {
        let layout = LayoutContext::new(&config(""), &nav(), Some("/dev-guide/todo-list/"), 2025);
        assert_eq!(layout.active_section(), Some("Todo List"));
        assert!(layout.header_links.iter().any(|l| l.label == "Dev" && l.active));
        assert!(!layout.header_links.iter().any(|l| l.label == "Main" && l.active));
    }

    #[test]
    fn unconfigured_route_has_no_active_entry() {
        let layout = LayoutContext::new(&config(""), &nav(), Some("/nowhere"), 2025);
        assert_eq!(layout.active_section(), None);
        assert!(layout.header_links.iter().all(|l| !l.active));

        let layout = LayoutContext::new(&config(""), &nav(), None, 2025);
        assert_eq!(layout.active_section(), None);
    }

    #[test]
    fn section_icons_and_tooltips() {
        let layout = LayoutContext::new(&config(""), &nav(), None, 2025);
        let sections = &layout.groups[0].sections;
        assert!(sections[0].icon_svg.contains("icon-cpu"));
        assert_eq!(sections[0].tooltip, "Install the toolchain");
        assert_eq!(sections[1].icon_svg, "");
        assert_eq!(sections[1].tooltip, "Mystery");
    }

    #[test]
    fn dark_default_theme_sets_root_class() {
        let layout = LayoutContext::new(&config("theme:\n  default: dark\n"), &nav(), None, 2025);
        assert_eq!(layout.theme_class, "app-theme-dark");
        assert_eq!(layout.theme_toggle_label, "Switch to light theme");

        let html = render_not_found(None, layout).unwrap();
        assert!(html.contains(r#"<html lang="en" class="app-theme-dark""#));
    }

    #[test]
    fn page_renders_inside_layout() {
        let layout = LayoutContext::new(&config(""), &nav(), Some("/user-guide/getting-started"), 2025);
        let html = render_page(
            &page("/user-guide/getting-started", "Getting <Started>", "<p>Body</p>"),
            layout,
        )
        .unwrap();

        assert!(html.contains(" | RISC Framework Docs</title>"));
        assert!(!html.contains("Getting <Started>"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains("app-sidebar--expanded"));
        assert!(html.contains(r#"aria-label="Switch to dark theme""#));
        assert!(html.contains(r#"aria-label="Collapse sidebar""#));
        assert!(html.contains("https://github.com/dashygo097/risc.git"));
        assert!(html.contains(r#"class="app-sidebar__section-link active""#));
        assert!(html.contains(r#""route":"/user-guide/getting-started""#));
    }

    #[test]
    fn not_found_page_has_no_active_link() {
        let layout = LayoutContext::new(&config(""), &nav(), None, 2025);
        let html = render_not_found(Some("/missing"), layout).unwrap();
        assert!(html.contains("Page not found"));
        assert!(html.contains("/missing"));
        assert!(!html.contains("app-sidebar__section-link active"));
        assert!(!html.contains("app-header__nav-link active"));
    }
}
