//! Build command implementation.

use anyhow::{Context, Result};
use chrono::Datelike;
use include_dir::{include_dir, Dir};
use riscdocs_core::{Config, DiagnosticSeverity, NavigationConfig, Page, SiteBuilder, SiteIndex};
use riscdocs_render::{render_not_found, render_page, LayoutContext};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// Embed static assets (CSS, JS) at compile time
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../static");

/// A loaded site: configuration, navigation tree and page index
#[derive(Debug, Clone)]
pub struct Site {
    pub config: Config,
    pub navigation: NavigationConfig,
    pub index: SiteIndex,
}

impl Site {
    /// Layout for a request path; `None` renders no active entry
    pub fn layout(&self, current_path: Option<&str>) -> LayoutContext {
        LayoutContext::new(
            &self.config,
            &self.navigation,
            current_path,
            chrono::Utc::now().year(),
        )
    }

    /// Render a page with its nav entry active
    pub fn render_page(&self, page: &Page) -> Result<String> {
        render_page(page, self.layout(Some(&page.route)))
            .with_context(|| format!("Failed to render {}", page.route))
    }

    /// Render the 404 page
    pub fn render_not_found(&self, requested: Option<&str>) -> Result<String> {
        render_not_found(requested, self.layout(None)).context("Failed to render 404 page")
    }
}

/// Build the site and print a summary
pub fn build_site(config_path: &Path) -> Result<()> {
    let site = build_site_with_index(config_path)?;
    let output_dir = site.config.output_dir();

    report_diagnostics(&site.index);

    println!(
        "✓ Built {} pages into {}",
        site.index.routes.len(),
        output_dir.display()
    );
    Ok(())
}

/// Load, build and write the site, returning it for further use
pub fn build_site_with_index(config_path: &Path) -> Result<Site> {
    let site = load_site(config_path)?;
    write_site(&site)?;
    Ok(site)
}

/// Load config and navigation and build the page index without writing output
pub fn load_site(config_path: &Path) -> Result<Site> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let nav_path = config.navigation_path();
    let navigation = NavigationConfig::load_or_default(&nav_path)
        .with_context(|| format!("Failed to load navigation from {:?}", nav_path))?;

    let index = SiteBuilder::new(config.clone())
        .with_navigation(navigation.clone())
        .build()
        .context("Failed to build site")?;

    Ok(Site {
        config,
        navigation,
        index,
    })
}

/// Write pages, the 404 page, `routes.json` and static assets
pub fn write_site(site: &Site) -> Result<()> {
    let output_dir = site.config.output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    for page in site.index.published() {
        let html = site.render_page(page)?;
        let output_path = output_dir.join(page.output_rel_path());
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Wrote {} -> {:?}", page.route, output_path);
    }

    let not_found_path = output_dir.join("404.html");
    fs::write(&not_found_path, site.render_not_found(None)?)
        .with_context(|| format!("Failed to write {:?}", not_found_path))?;

    let routes: Vec<_> = site.index.routes.iter().collect();
    let routes_path = output_dir.join("routes.json");
    fs::write(&routes_path, serde_json::to_string_pretty(&routes)?)
        .with_context(|| format!("Failed to write {:?}", routes_path))?;

    copy_assets(&site.config)?;

    tracing::info!("Wrote {} pages to {:?}", site.index.routes.len(), output_dir);
    Ok(())
}

fn report_diagnostics(index: &SiteIndex) {
    let widget_failures: Vec<_> = index
        .diagnostics
        .iter()
        .filter(|d| d.code == "widget.render")
        .collect();

    if !widget_failures.is_empty() {
        println!("⚠ {} widget(s) failed to render:", widget_failures.len());
        for diag in &widget_failures {
            println!(
                "  {} ({})",
                diag.message,
                diag.source_path
                    .as_deref()
                    .or(diag.route.as_deref())
                    .unwrap_or("?")
            );
        }
    }

    for diag in index.diagnostics.iter().filter(|d| d.code != "widget.render") {
        println!("{} [{}] {}", marker(diag.severity), diag.code, diag.message);
    }
}

fn marker(severity: DiagnosticSeverity) -> &'static str {
    match severity {
        DiagnosticSeverity::Error => "✗",
        DiagnosticSeverity::Warning => "⚠",
    }
}

fn copy_assets(config: &Config) -> Result<()> {
    let output_dir = config.output_dir();
    extract_embedded_static(&output_dir)?;

    if let Some(assets_dir) = config.assets_dir() {
        if assets_dir.exists() {
            copy_dir(&assets_dir, &output_dir)?;
            tracing::info!("Copied assets from {:?}", assets_dir);
        } else {
            tracing::warn!("Configured assets path {:?} does not exist", assets_dir);
        }
    }

    Ok(())
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)
            .with_context(|| format!("Failed to copy {:?} to {:?}", entry.path(), target))?;
    }
    Ok(())
}

fn extract_embedded_static(dest: &Path) -> Result<()> {
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, dest)?;
    }
    Ok(())
}

fn extract_entry(entry: &include_dir::DirEntry, dest: &Path) -> Result<()> {
    match entry {
        include_dir::DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        include_dir::DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, file.contents())
                .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
        }
    }
    Ok(())
}
