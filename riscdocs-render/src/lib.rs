//! # riscdocs-render
//!
//! Layout chrome and page templates for the riscdocs site.
//!
//! This crate handles HTML template rendering using Askama.

pub mod icons;
pub mod templates;

pub use templates::{
    render_not_found, render_page, route_href, GroupView, HeaderLinkView, LayoutContext,
    NotFoundTemplate, PageTemplate, RenderError, SectionView,
};
