//! Frontmatter parsing from markdown files.

use crate::models::Frontmatter;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?$")
            .expect("valid frontmatter regex")
    })
}

/// Parse frontmatter from markdown content
///
/// Returns a tuple of (frontmatter, markdown_body).
/// If no frontmatter is present, returns default frontmatter with the full content as body.
/// Every field is optional: documents are allowed to be plain markdown.
///
/// # Example
///
/// ```
/// use riscdocs_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: Quick Start\nroute: /user-guide/getting-started\n---\n# Hello\n";
///
/// let (fm, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(fm.title.as_deref(), Some("Quick Start"));
/// assert_eq!(fm.route.as_deref(), Some("/user-guide/getting-started"));
/// assert!(body.trim().starts_with("# Hello"));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok((frontmatter, body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Todo List
description: Open work items
route: /dev-guide/todo-list
---

# TODO

- [ ] AXI burst support"#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Todo List"));
        assert_eq!(fm.description.as_deref(), Some("Open work items"));
        assert_eq!(fm.route.as_deref(), Some("/dev-guide/todo-list"));
        assert!(!fm.draft);
        assert!(body.contains("# TODO"));
        assert!(body.contains("AXI burst support"));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_frontmatter_at_end_of_file() {
        let (fm, body) = parse_frontmatter("---\ntitle: Empty\n---").unwrap();
        assert_eq!(fm.title.as_deref(), Some("Empty"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_parse_frontmatter_with_draft() {
        let content = "---\ntitle: Draft Page\ndraft: true\n---\n\nContent.";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert!(fm.draft);
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        assert!(parse_frontmatter(content).is_err());
    }
}
