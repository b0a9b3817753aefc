//! # riscdocs-core
//!
//! Core library for the RISC framework documentation site.
//!
//! This crate loads the site configuration and navigation tree, renders
//! markdown pages (with the callout and timing-diagram widgets) and builds
//! the route table the renderer and the dev server work from.

pub mod builder;
pub mod config;
pub mod escape;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod slug;
pub mod theme;
pub mod wavedrom;
pub mod widgets;

pub use builder::{BuildError, SiteBuilder};
pub use config::Config;
pub use markdown::{MarkdownProcessor, RenderedMarkdown};
pub use models::{Diagnostic, DiagnosticSeverity, Frontmatter, Page, SiteIndex, WidgetIssue};
pub use navigation::{NavGroup, NavigationConfig, Section};
pub use routes::{RouteEntry, RouteTable};
pub use slug::slugify;
pub use theme::{SidebarState, Theme, ThemeState};
pub use widgets::{render_widget, Widget, WidgetContext, WidgetKind, WidgetNode, WidgetRegistry};
