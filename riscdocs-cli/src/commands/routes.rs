//! Routes command implementation.

use super::build::{load_site, Site};
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One line of the route listing
#[derive(Debug, Serialize)]
struct RouteRow<'a> {
    path: &'a str,
    title: &'a str,
    output: &'a PathBuf,
    /// Sidebar entry shown as active on this route
    nav: Option<&'a str>,
}

/// Print the route table
pub fn print_routes(config_path: &Path, json: bool) -> Result<()> {
    let site = load_site(config_path)?;
    let rows = route_rows(&site);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = rows.iter().map(|r| r.path.len()).max().unwrap_or(0);
    for row in &rows {
        match row.nav {
            Some(nav) => println!("{:width$}  {}  [{}]", row.path, row.title, nav),
            None => println!("{:width$}  {}", row.path, row.title),
        }
    }
    println!("\n{} routes", rows.len());
    Ok(())
}

fn route_rows(site: &Site) -> Vec<RouteRow<'_>> {
    site.index
        .routes
        .iter()
        .map(|entry| RouteRow {
            path: &entry.path,
            title: &entry.title,
            output: &entry.output,
            nav: site
                .navigation
                .active_section(&entry.path)
                .map(|s| s.title.as_str()),
        })
        .collect()
}
