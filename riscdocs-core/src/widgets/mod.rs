//! Content widgets substituted for reserved fenced blocks.
//!
//! A fenced block tagged `info`, `tip`, `success` or `wavedrom` becomes a
//! [`WidgetNode`]. The markdown pipeline renders each node through
//! [`render_widget`], which never fails: widget errors and panics turn into
//! an inline error panel.

pub mod boxes;
pub mod error_panel;
mod icons;
pub mod waveform;

use crate::escape::escape_html;
use crate::wavedrom::WaveDromError;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

pub use boxes::CustomBox;
pub use error_panel::render_error_panel;
pub use icons::CalloutIcon;
pub use waveform::WaveDromChart;

/// Reserved fenced-block tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Info,
    Tip,
    Success,
    WaveDrom,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::Info,
        WidgetKind::Tip,
        WidgetKind::Success,
        WidgetKind::WaveDrom,
    ];

    /// Exact, case-sensitive match on a fenced block's language tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "info" => Some(WidgetKind::Info),
            "tip" => Some(WidgetKind::Tip),
            "success" => Some(WidgetKind::Success),
            "wavedrom" => Some(WidgetKind::WaveDrom),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            WidgetKind::Info => "info",
            WidgetKind::Tip => "tip",
            WidgetKind::Success => "success",
            WidgetKind::WaveDrom => "wavedrom",
        }
    }
}

/// A fenced block after substitution: its kind, its raw text and an
/// optional styling class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetNode {
    pub kind: WidgetKind,
    pub content: String,
    pub class: Option<String>,
}

/// Per-render information handed to widgets
#[derive(Debug, Clone, Copy, Default)]
pub struct WidgetContext {
    /// Position of the widget on its page, starting at 0
    pub index: usize,
}

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error(transparent)]
    WaveDrom(#[from] WaveDromError),

    #[error("{0}")]
    Render(String),
}

pub trait Widget: Send + Sync {
    /// Component name shown in error panels
    fn name(&self) -> &'static str;

    /// Render the widget body from the block's raw text
    fn render(&self, ctx: &WidgetContext, source: &str) -> Result<String, WidgetError>;
}

/// Widgets by kind
pub struct WidgetRegistry {
    widgets: HashMap<WidgetKind, Box<dyn Widget>>,
}

impl WidgetRegistry {
    pub fn empty() -> Self {
        Self {
            widgets: HashMap::new(),
        }
    }

    /// The callout boxes and the waveform chart
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(WidgetKind::Info, CustomBox::info());
        registry.register(WidgetKind::Tip, CustomBox::tip());
        registry.register(WidgetKind::Success, CustomBox::success());
        registry.register(WidgetKind::WaveDrom, WaveDromChart);
        registry
    }

    pub fn register<W: Widget + 'static>(&mut self, kind: WidgetKind, widget: W) {
        self.widgets.insert(kind, Box::new(widget));
    }

    pub fn get(&self, kind: WidgetKind) -> Option<&dyn Widget> {
        self.widgets.get(&kind).map(|w| w.as_ref())
    }

    /// Render a node with its registered widget
    pub fn render(&self, ctx: &WidgetContext, node: &WidgetNode) -> WidgetOutput {
        match self.get(node.kind) {
            Some(widget) => render_widget(widget, ctx, node),
            None => {
                let message = format!("no widget registered for `{}`", node.kind.tag());
                tracing::warn!(widget = node.kind.tag(), "{}", message);
                WidgetOutput {
                    html: container(
                        node,
                        &render_error_panel(&message, Some(&node.content), node.kind.tag()),
                    ),
                    error: Some(message),
                }
            }
        }
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Markup for one widget, plus the failure message when the error panel
/// was rendered instead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOutput {
    pub html: String,
    pub error: Option<String>,
}

/// Render a widget inside its container, catching errors and panics
pub fn render_widget(widget: &dyn Widget, ctx: &WidgetContext, node: &WidgetNode) -> WidgetOutput {
    let result = catch_unwind(AssertUnwindSafe(|| widget.render(ctx, &node.content)));

    let failure = match result {
        Ok(Ok(body)) => {
            return WidgetOutput {
                html: container(node, &body),
                error: None,
            }
        }
        Ok(Err(err)) => err.to_string(),
        Err(payload) => format!("widget panicked: {}", panic_message(payload.as_ref())),
    };

    tracing::warn!(
        widget = widget.name(),
        index = ctx.index,
        "{} rendering failed: {}",
        widget.name(),
        failure
    );

    WidgetOutput {
        html: container(
            node,
            &render_error_panel(&failure, Some(&node.content), widget.name()),
        ),
        error: Some(failure),
    }
}

fn container(node: &WidgetNode, body: &str) -> String {
    let mut class = format!("widget widget-{}", node.kind.tag());
    if let Some(extra) = node.class.as_deref().filter(|c| !c.is_empty()) {
        class.push(' ');
        class.push_str(extra);
    }
    format!(
        r#"<div class="{}" style="margin: 1rem 0; min-height: 50px;">{}</div>"#,
        escape_html(&class),
        body
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
