//! Fenced-block widget substitution.
//!
//! A fenced block whose language tag is `info`, `tip`, `success` or
//! `wavedrom` is replaced by a single [`WidgetNode`] holding the block's raw
//! text. Every other event passes through untouched.

use crate::widgets::{WidgetContext, WidgetKind, WidgetNode, WidgetRegistry};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

/// Output of the substitution pass
#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownNode<'a> {
    Event(Event<'a>),
    Widget(WidgetNode),
}

/// A widget that rendered its error panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFailure {
    pub index: usize,
    pub kind: WidgetKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct WidgetBlockTransformer;

impl WidgetBlockTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Replace reserved fenced blocks with widget nodes
    pub fn transform<'a>(&self, events: Vec<Event<'a>>) -> Vec<MarkdownNode<'a>> {
        let mut out = Vec::with_capacity(events.len());
        let mut pending: Option<WidgetNode> = None;

        for event in events {
            if let Some(node) = pending.as_mut() {
                match event {
                    Event::Text(text) => node.content.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(node) = pending.take() {
                            out.push(MarkdownNode::Widget(node));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &event {
                if let Some((kind, class)) = parse_info_string(info) {
                    pending = Some(WidgetNode {
                        kind,
                        content: String::new(),
                        class,
                    });
                    continue;
                }
            }

            out.push(MarkdownNode::Event(event));
        }

        // An unterminated fence runs to the end of the document
        if let Some(node) = pending {
            out.push(MarkdownNode::Widget(node));
        }

        out
    }

    /// Render widget nodes to HTML events, numbering them in document order
    pub fn render<'a>(
        &self,
        nodes: Vec<MarkdownNode<'a>>,
        registry: &WidgetRegistry,
    ) -> (Vec<Event<'a>>, usize, Vec<WidgetFailure>) {
        let mut events = Vec::with_capacity(nodes.len());
        let mut failures = Vec::new();
        let mut index = 0;

        for node in nodes {
            match node {
                MarkdownNode::Event(event) => events.push(event),
                MarkdownNode::Widget(widget) => {
                    let ctx = WidgetContext { index };
                    let output = registry.render(&ctx, &widget);
                    if let Some(message) = output.error {
                        failures.push(WidgetFailure {
                            index,
                            kind: widget.kind,
                            message,
                        });
                    }
                    let mut html = output.html;
                    html.push('\n');
                    events.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                    index += 1;
                }
            }
        }

        (events, index, failures)
    }
}

/// Split a fence info string into a widget kind and an optional class.
///
/// The tag is the first whitespace-separated token. A class may follow as
/// `class=<name>` or `{.name}`.
pub fn parse_info_string(info: &str) -> Option<(WidgetKind, Option<String>)> {
    let mut tokens = info.split_whitespace();
    let kind = WidgetKind::from_tag(tokens.next()?)?;
    let rest: Vec<&str> = tokens.collect();
    let class = class_regex()
        .captures(&rest.join(" "))
        .and_then(|caps| caps.name("a").or_else(|| caps.name("b")))
        .map(|m| m.as_str().to_string());
    Some((kind, class))
}

fn class_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|\s)(?:class=["']?(?P<a>[A-Za-z_][\w-]*)["']?|\{\.(?P<b>[A-Za-z_][\w-]*)\})(?:\s|$)"#)
            .expect("valid class regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{Options, Parser};

    fn nodes(markdown: &str) -> Vec<MarkdownNode<'_>> {
        let events: Vec<Event> = Parser::new_ext(markdown, Options::empty()).collect();
        WidgetBlockTransformer::new().transform(events)
    }

    fn widgets(markdown: &str) -> Vec<WidgetNode> {
        nodes(markdown)
            .into_iter()
            .filter_map(|n| match n {
                MarkdownNode::Widget(w) => Some(w),
                MarkdownNode::Event(_) => None,
            })
            .collect()
    }

    #[test]
    fn reserved_tags_become_single_widget_nodes() {
        for tag in ["info", "tip", "success", "wavedrom"] {
            let md = format!("```{tag}\nfirst line\n  second <line>\n```\n");
            let found = widgets(&md);
            assert_eq!(found.len(), 1, "{tag}");
            assert_eq!(found[0].kind.tag(), tag);
            assert_eq!(found[0].content, "first line\n  second <line>\n");
            assert_eq!(found[0].class, None);
        }
    }

    #[test]
    fn substitution_consumes_the_whole_block() {
        let out = nodes("```tip\nhello\n```\n");
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], MarkdownNode::Widget(_)));
    }

    #[test]
    fn other_blocks_are_untouched() {
        let md = "```rust\nfn main() {}\n```\n\n```\nplain\n```\n\n    indented\n\n```Info\nx\n```\n";
        let events: Vec<Event> = Parser::new_ext(md, Options::empty()).collect();
        let expected: Vec<MarkdownNode> = events.iter().cloned().map(MarkdownNode::Event).collect();
        assert_eq!(WidgetBlockTransformer::new().transform(events), expected);
    }

    #[test]
    fn blocks_are_independent() {
        let found = widgets("```info\na\n```\n\ntext\n\n```success\nb\n```\n");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].content, "a\n");
        assert_eq!(found[1].content, "b\n");
    }

    #[test]
    fn class_comes_from_info_string() {
        assert_eq!(
            parse_info_string("tip class=wide"),
            Some((WidgetKind::Tip, Some("wide".into())))
        );
        assert_eq!(
            parse_info_string("wavedrom {.timing-large}"),
            Some((WidgetKind::WaveDrom, Some("timing-large".into())))
        );
        assert_eq!(
            parse_info_string("info class=\"bad\"><script>"),
            Some((WidgetKind::Info, None))
        );
        assert_eq!(parse_info_string("rust class=x"), None);
        assert_eq!(parse_info_string(""), None);
    }

    #[test]
    fn render_numbers_widgets_and_collects_failures() {
        let md = "```wavedrom\n{ \"signal\": [{ \"wave\": \"01\" }] }\n```\n\n```wavedrom\nnot json\n```\n\n```tip\nok\n```\n";
        let transformer = WidgetBlockTransformer::new();
        let events: Vec<Event> = Parser::new_ext(md, Options::empty()).collect();
        let (events, count, failures) =
            transformer.render(transformer.transform(events), &WidgetRegistry::builtin());

        assert_eq!(count, 3);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].kind, WidgetKind::WaveDrom);

        let html: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                Event::Html(h) => Some(h.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(html.len(), 3);
        assert!(html[0].contains("wd-hatch-0"));
        assert!(html[1].contains("Rendering Error"));
        assert!(html[2].contains("tip-gradient-2"));
    }
}
