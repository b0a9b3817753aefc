//! Callout boxes: info, tip and success.

use super::icons::CalloutIcon;
use super::{Widget, WidgetContext, WidgetError};
use crate::escape::escape_html;

const ICON_SIZE: u32 = 24;

/// A titled box with an icon and a coloured left border
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomBox {
    pub name: &'static str,
    pub title: &'static str,
    pub icon: CalloutIcon,
    pub accent_color: &'static str,
    /// Defaults to the accent colour
    pub border_color: Option<&'static str>,
    /// Defaults to white
    pub background: Option<&'static str>,
}

impl CustomBox {
    pub fn info() -> Self {
        Self {
            name: "InfoBox",
            title: "Info",
            icon: CalloutIcon::Info,
            accent_color: "#0e7490",
            border_color: None,
            background: None,
        }
    }

    pub fn tip() -> Self {
        Self {
            name: "TipBox",
            title: "Tip",
            icon: CalloutIcon::Tip,
            accent_color: "#a21caf",
            border_color: None,
            background: Some("#faf5ff"),
        }
    }

    pub fn success() -> Self {
        Self {
            name: "SuccessBox",
            title: "Success",
            icon: CalloutIcon::Success,
            accent_color: "#059669",
            border_color: None,
            background: Some("#f0fdf4"),
        }
    }

    pub fn border_color(&self) -> &'static str {
        self.border_color.unwrap_or(self.accent_color)
    }

    pub fn background(&self) -> &'static str {
        self.background.unwrap_or("white")
    }
}

impl Widget for CustomBox {
    fn name(&self) -> &'static str {
        self.name
    }

    fn render(&self, ctx: &WidgetContext, source: &str) -> Result<String, WidgetError> {
        let mut html = format!(
            r#"<div class="callout callout-{kind}" style="padding: 1rem; border-left: 4px solid {border}; border-radius: 0.5rem; font-family: system-ui, -apple-system, sans-serif; background: {background}; box-shadow: 0 1px 2px rgba(0,0,0,0.05);">"#,
            kind = self.title.to_lowercase(),
            border = self.border_color(),
            background = self.background(),
        );
        html.push_str(r#"<div style="display: flex; align-items: flex-start; gap: 0.75rem;">"#);
        html.push_str(&self.icon.svg(ICON_SIZE, ctx.index));
        html.push_str(r#"<div style="flex: 1;">"#);
        html.push_str(&format!(
            r#"<div class="callout-title" style="font-weight: 700; margin-bottom: 0.5rem; color: {}; font-size: 0.9375rem;">{}</div>"#,
            self.accent_color,
            escape_html(self.title)
        ));
        html.push_str(&format!(
            r#"<div class="callout-body" style="font-size: 0.875rem; color: #444; white-space: pre-wrap; word-wrap: break-word; line-height: 1.6;">{}</div>"#,
            escape_html(source.trim())
        ));
        html.push_str("</div></div></div>");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_match_each_box() {
        let info = CustomBox::info();
        assert_eq!(info.border_color(), "#0e7490");
        assert_eq!(info.background(), "white");

        let tip = CustomBox::tip();
        assert_eq!(tip.accent_color, "#a21caf");
        assert_eq!(tip.background(), "#faf5ff");

        let success = CustomBox::success();
        assert_eq!(success.border_color(), "#059669");
        assert_eq!(success.background(), "#f0fdf4");
    }

    #[test]
    fn body_is_trimmed_and_escaped() {
        let html = CustomBox::tip()
            .render(&WidgetContext { index: 3 }, "\n  Use <b>care</b> & patience  \n")
            .unwrap();
        assert!(html.contains(">Use &lt;b&gt;care&lt;/b&gt; &amp; patience</div>"));
        assert!(html.contains(">Tip</div>"));
        assert!(html.contains("border-left: 4px solid #a21caf"));
        assert!(html.contains("background: #faf5ff"));
        assert!(html.contains("tip-gradient-3"));
    }

    #[test]
    fn multiline_text_is_preserved() {
        let html = CustomBox::info()
            .render(&WidgetContext::default(), "line one\nline two")
            .unwrap();
        assert!(html.contains("line one\nline two"));
        assert!(html.contains("white-space: pre-wrap"));
    }
}
