//! Markdown processing pipeline with widget substitution.

pub mod highlight;
pub mod widget_blocks;

use crate::escape::escape_html;
use crate::slug::SlugAllocator;
use crate::widgets::WidgetRegistry;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

pub use highlight::HighlightTransformer;
pub use widget_blocks::{parse_info_string, MarkdownNode, WidgetBlockTransformer, WidgetFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u32,
    pub title: String,
    pub id: String,
}

/// Result of converting one document
#[derive(Debug, Clone, Default)]
pub struct RenderedMarkdown {
    pub html: String,
    pub headings: Vec<Heading>,
    pub widget_count: usize,
    pub widget_failures: Vec<WidgetFailure>,
}

impl RenderedMarkdown {
    /// Text of the first level-one heading
    pub fn title(&self) -> Option<&str> {
        self.headings
            .iter()
            .find(|h| h.level == 1)
            .map(|h| h.title.as_str())
    }
}

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
    widgets: WidgetRegistry,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self::with_widgets(WidgetRegistry::builtin())
    }

    pub fn with_widgets(widgets: WidgetRegistry) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options, widgets }
    }

    /// Convert markdown to HTML, rendering widgets and highlighting code
    pub fn convert(&self, markdown: &str) -> RenderedMarkdown {
        let events: Vec<Event> = Parser::new_ext(markdown, self.options).collect();
        let headings = collect_headings(&events);

        let widget_blocks = WidgetBlockTransformer::new();
        let nodes = widget_blocks.transform(events);
        let (events, widget_count, widget_failures) = widget_blocks.render(nodes, &self.widgets);

        let events = HighlightTransformer::new().transform(events);

        let events = attach_heading_ids(events, &headings);
        let events = add_heading_anchors(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedMarkdown {
            html: html_output,
            headings,
            widget_count,
            widget_failures,
        }
    }

    /// Convert markdown to HTML, discarding metadata
    pub fn convert_simple(&self, markdown: &str) -> String {
        self.convert(markdown).html
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_headings(events: &[Event]) -> Vec<Heading> {
    let mut slugs = SlugAllocator::new();
    for event in events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            slugs.reserve(id);
        }
    }

    let mut headings = Vec::new();
    let mut current: Option<(u32, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level as u32, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, title)) = current.take() {
                    let id = explicit.unwrap_or_else(|| slugs.allocate(&title));
                    headings.push(Heading {
                        level,
                        title: title.trim().to_string(),
                        id,
                    });
                }
            }
            _ => {}
        }
    }

    headings
}

fn attach_heading_ids(events: Vec<Event<'static>>, headings: &[Heading]) -> Vec<Event<'static>> {
    let mut heading_iter = headings.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                mut id,
                classes,
                attrs,
            }) => {
                let next = heading_iter.next();
                if id.is_none() {
                    if let Some(next) = next {
                        id = Some(CowStr::Boxed(next.id.clone().into_boxed_str()));
                    }
                }
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            _ => result.push(event),
        }
    }

    result
}

fn add_heading_anchors(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut result = Vec::with_capacity(events.len());
    let mut current_id: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                current_id = id.as_ref().map(|s| s.to_string());
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            Event::End(TagEnd::Heading(level)) => {
                if let Some(id) = current_id.take() {
                    let anchor = format!(
                        "<a class=\"heading-anchor\" href=\"#{}\" aria-label=\"Link to heading\">#</a>",
                        escape_html(&id)
                    );
                    result.push(Event::Html(CowStr::Boxed(anchor.into_boxed_str())));
                }
                result.push(Event::End(TagEnd::Heading(level)));
            }
            other => result.push(other),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert_simple("# Hello World\n\nThis is a **test**.");
        assert!(html.contains(r#"<h1 id="hello-world">"#));
        assert!(html.contains(r##"href="#hello-world""##));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_tables_and_tasklists() {
        let processor = MarkdownProcessor::new();
        let md = "| Unit | Status |\n|------|--------|\n| ALU  | done   |\n\n- [x] decode\n- [ ] caches\n";
        let html = processor.convert_simple(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Unit</th>"));
        assert!(html.contains(r#"type="checkbox""#));
    }

    #[test]
    fn test_code_blocks_are_highlighted() {
        let processor = MarkdownProcessor::new();
        let html = processor.convert_simple("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre"));
        assert!(html.contains("main"));
        assert!(!html.contains("widget"));
    }

    #[test]
    fn duplicate_headings_get_unique_ids() {
        let rendered = MarkdownProcessor::new().convert("## Ports\n\n## Ports\n\n## Timing {#custom}\n");
        let ids: Vec<&str> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["ports", "ports-1", "custom"]);
        assert!(rendered.html.contains(r#"id="ports-1""#));
        assert!(rendered.html.contains(r#"id="custom""#));
    }

    #[test]
    fn numbered_heading_text_does_not_collide_with_duplicates() {
        let rendered = MarkdownProcessor::new()
            .convert("## Ports\n\n## Ports 1\n\n## Ports\n\n## Setup\n\n## Timing {#setup-1}\n\n## Setup\n");
        let ids: Vec<&str> = rendered.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["ports", "ports-1", "ports-2", "setup", "setup-1", "setup-2"]);
    }

    #[test]
    fn title_is_first_h1() {
        let rendered = MarkdownProcessor::new().convert("## Intro\n\n# The `ALU`\n\n# Later\n");
        assert_eq!(rendered.title(), Some("The ALU"));
        assert_eq!(MarkdownProcessor::new().convert("text").title(), None);
    }

    #[test]
    fn widgets_render_in_place() {
        let md = "# Waves\n\n```info\nRead this <first>\n```\n\n```wavedrom\n{ \"signal\": [{ \"name\": \"clk\", \"wave\": \"p...\" }] }\n```\n";
        let rendered = MarkdownProcessor::new().convert(md);
        assert_eq!(rendered.widget_count, 2);
        assert!(rendered.widget_failures.is_empty());
        assert!(rendered.html.contains(r#"class="widget widget-info""#));
        assert!(rendered.html.contains("Read this &lt;first&gt;"));
        assert!(rendered.html.contains(r#"class="widget widget-wavedrom""#));
        assert!(rendered.html.contains("<svg"));
    }

    #[test]
    fn widget_failure_does_not_abort_page() {
        let md = "Before\n\n```wavedrom\n{ broken\n```\n\nAfter\n";
        let rendered = MarkdownProcessor::new().convert(md);
        assert_eq!(rendered.widget_failures.len(), 1);
        assert!(rendered.html.contains("<p>Before</p>"));
        assert!(rendered.html.contains("<p>After</p>"));
        assert!(rendered.html.contains("❌ WaveDrom Rendering Error"));
        assert!(rendered.html.contains("{ broken"));
    }
}
