//! Timing diagram widget backed by the native WaveJSON renderer.

use super::{Widget, WidgetContext, WidgetError};
use crate::wavedrom;

#[derive(Debug, Clone, Copy, Default)]
pub struct WaveDromChart;

impl Widget for WaveDromChart {
    fn name(&self) -> &'static str {
        "WaveDrom"
    }

    fn render(&self, ctx: &WidgetContext, source: &str) -> Result<String, WidgetError> {
        let svg = wavedrom::render(source.trim(), ctx.index)?;
        Ok(format!(
            r#"<div class="wavedrom-chart" style="display: flex; justify-content: center;">{}</div>"#,
            svg
        ))
    }
}
