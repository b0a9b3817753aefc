//! Gradient circle icons used by the callout boxes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutIcon {
    Info,
    Tip,
    Success,
}

impl CalloutIcon {
    /// Inline SVG; gradient ids are suffixed with `id` so several boxes can
    /// share a page
    pub fn svg(self, size: u32, id: usize) -> String {
        let (name, from, to, glyph) = match self {
            CalloutIcon::Info => (
                "info",
                "#06b6d4",
                "#0891b2",
                r#"<circle cx="12" cy="8" r="1.5" fill="white"/><rect x="10.5" y="11" width="3" height="7" rx="1.5" fill="white"/>"#,
            ),
            CalloutIcon::Tip => (
                "tip",
                "#c084fc",
                "#f472b6",
                r#"<path d="M12 8a4 4 0 0 1 4 4c0 2-2 2.5-2 4h-4c0-1.5-2-2-2-4a4 4 0 0 1 4-4zm0 9.5a1.5 1.5 0 0 0 1.5-1.5h-3A1.5 1.5 0 0 0 12 17.5z" fill="white"/>"#,
            ),
            CalloutIcon::Success => (
                "success",
                "#4ade80",
                "#22d3ee",
                r#"<polyline points="8 13 11 16 16 10" stroke="white" stroke-width="2" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#,
            ),
        };
        let gradient = format!("{}-gradient-{}", name, id);
        format!(
            concat!(
                r#"<svg class="callout-icon" width="{size}" height="{size}" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg" style="display: inline-block; vertical-align: middle; flex-shrink: 0;" aria-hidden="true">"#,
                r#"<defs><linearGradient id="{g}" x1="0%" y1="0%" x2="100%" y2="100%"><stop offset="0%" stop-color="{from}"/><stop offset="100%" stop-color="{to}"/></linearGradient></defs>"#,
                r#"<circle cx="12" cy="12" r="11" fill="url(#{g})" opacity="0.2"/>"#,
                r#"<circle cx="12" cy="12" r="10" fill="url(#{g})"/>"#,
                "{glyph}</svg>"
            ),
            size = size,
            g = gradient,
            from = from,
            to = to,
            glyph = glyph,
        )
    }
}
