//! Inline panel shown in place of a widget that failed to render.

use crate::escape::escape_html;

/// Red error panel naming the failing component, with the message and,
/// when available, the original source in a collapsible block
pub fn render_error_panel(message: &str, source: Option<&str>, component: &str) -> String {
    let mut html = String::from(
        r#"<div class="widget-error" role="alert" style="color: #dc2626; padding: 1rem; background: #fee2e2; border-radius: 0.375rem; border-left: 4px solid #dc2626; font-family: system-ui, -apple-system, sans-serif;">"#,
    );
    html.push_str(&format!(
        r#"<div style="font-weight: 600; margin-bottom: 0.5rem;">❌ {} Rendering Error</div>"#,
        escape_html(component)
    ));
    html.push_str(&format!(
        r#"<pre style="margin: 0; font-size: 0.875rem; white-space: pre-wrap; word-wrap: break-word; font-family: 'Courier New', monospace; color: #991b1b;">{}</pre>"#,
        escape_html(message)
    ));

    if let Some(source) = source.filter(|s| !s.is_empty()) {
        html.push_str(r#"<details style="margin-top: 0.75rem; font-size: 0.875rem;">"#);
        html.push_str(
            r#"<summary style="cursor: pointer; user-select: none; font-weight: 500;">View Source</summary>"#,
        );
        html.push_str(&format!(
            r#"<pre style="margin: 0.5rem 0 0 0; padding: 0.75rem; background: white; color: #1f2937; border-radius: 0.25rem; overflow-x: auto; font-size: 0.8125rem; border: 1px solid #fecaca;">{}</pre>"#,
            escape_html(source)
        ));
        html.push_str("</details>");
    }

    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_escapes_everything() {
        let html = render_error_panel("expected `}` <here>", Some("{ \"a\": <b> }"), "Wave<Drom>");
        assert!(html.contains("❌ Wave&lt;Drom&gt; Rendering Error"));
        assert!(html.contains("expected `}` &lt;here&gt;"));
        assert!(html.contains("View Source"));
        assert!(html.contains("{ &quot;a&quot;: &lt;b&gt; }"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn source_block_is_optional() {
        assert!(!render_error_panel("oops", None, "Tip").contains("<details"));
        assert!(!render_error_panel("oops", Some(""), "Tip").contains("<details"));
    }
}
