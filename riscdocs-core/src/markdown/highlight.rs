//! Code syntax highlighting using syntect.

use crate::escape::escape_html;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME: OnceLock<Theme> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        theme_set
            .themes
            .get("InspiredGitHub")
            .or_else(|| theme_set.themes.get("base16-ocean.light"))
            .cloned()
            .unwrap_or_default()
    })
}

/// A fenced block being collected
struct PendingBlock {
    lang: Option<String>,
    code: String,
}

/// Colours tagged fenced code blocks left over after widget expansion
pub struct HighlightTransformer;

impl HighlightTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Replace each tagged fence with highlighted HTML; untagged fences pass through as plain code
    pub fn transform(&self, events: Vec<Event<'_>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut pending: Option<PendingBlock> = None;

        for event in events {
            match (event, pending.as_mut()) {
                (Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))), None) => {
                    // "rust ignore" highlights as rust
                    pending = Some(PendingBlock {
                        lang: info.split_whitespace().next().map(str::to_string),
                        code: String::new(),
                    });
                }
                (Event::Text(text), Some(block)) => block.code.push_str(&text),
                (Event::End(TagEnd::CodeBlock), Some(_)) => {
                    if let Some(block) = pending.take() {
                        emit_block(block, &mut result);
                    }
                }
                (event, _) => result.push(event.into_static()),
            }
        }

        result
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_block(block: PendingBlock, out: &mut Vec<Event<'static>>) {
    match block.lang {
        Some(lang) => {
            let html = highlight_block(&block.code, &lang);
            out.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
        }
        None => {
            out.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)));
            out.push(Event::Text(CowStr::Boxed(block.code.into_boxed_str())));
            out.push(Event::End(TagEnd::CodeBlock));
        }
    }
}

fn highlight_block(code: &str, lang: &str) -> String {
    let ss = syntax_set();
    let syntax = ss
        .find_syntax_by_token(lang)
        .or_else(|| ss.find_syntax_by_extension(lang))
        .unwrap_or_else(|| ss.find_syntax_plain_text());

    match highlighted_html_for_string(code, ss, syntax, theme()) {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("Highlighting {} block failed: {}", lang, e);
            plain_block(code)
        }
    }
}

fn plain_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>", escape_html(code))
}
