//! SVG layout for parsed WaveJSON diagrams.

use super::model::{Caption, Edge, EdgeShape, Lane, Signal, WaveDiagram, WAVE_CHARS};
use super::WaveDromError;
use crate::escape::escape_html;
use std::collections::HashMap;

/// Width of one tick at hscale 1
const TICK_WIDTH: f64 = 40.0;
const LANE_HEIGHT: f64 = 20.0;
const LANE_PITCH: f64 = 30.0;
const SLOPE: f64 = 3.0;
const CHAR_WIDTH: f64 = 7.0;
const GROUP_WIDTH: f64 = 16.0;
const CAPTION_HEIGHT: f64 = 24.0;
const TICK_ROW: f64 = 16.0;
const MARGIN: f64 = 10.0;

fn data_fill(ch: char) -> &'static str {
    match ch {
        '3' => "#ffffb4",
        '4' => "#ffe0b9",
        '5' => "#b9e0ff",
        '6' => "#ccfdfe",
        '7' => "#cdfdc5",
        '8' => "#f0c1fb",
        '9' => "#f5c2c0",
        _ => "#fff",
    }
}

/// Round to two decimals for compact markup
fn px(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{}", r)
    }
}

enum RowKind<'a> {
    Signal(&'a Signal),
    Spacer(&'a str),
}

struct Row<'a> {
    kind: RowKind<'a>,
}

struct GroupSpan<'a> {
    label: &'a str,
    depth: usize,
    first: usize,
    last: usize,
}

fn flatten<'a>(
    lanes: &'a [Lane],
    depth: usize,
    rows: &mut Vec<Row<'a>>,
    groups: &mut Vec<GroupSpan<'a>>,
    max_depth: &mut usize,
) {
    for lane in lanes {
        match lane {
            Lane::Signal(signal) => rows.push(Row {
                kind: RowKind::Signal(signal),
            }),
            Lane::Spacer { name } => rows.push(Row {
                kind: RowKind::Spacer(name),
            }),
            Lane::Group { label, lanes } => {
                let first = rows.len();
                flatten(lanes, depth + 1, rows, groups, max_depth);
                if rows.len() > first {
                    *max_depth = (*max_depth).max(depth + 1);
                    groups.push(GroupSpan {
                        label,
                        depth,
                        first,
                        last: rows.len() - 1,
                    });
                }
            }
        }
    }
}

struct Layout {
    id: usize,
    tick_width: f64,
    wave_left: f64,
    top: f64,
}

impl Layout {
    fn x(&self, tick: f64) -> f64 {
        self.wave_left + tick * self.tick_width
    }

    fn lane_top(&self, row: usize) -> f64 {
        self.top + row as f64 * LANE_PITCH
    }
}

/// Render a diagram as a standalone `<svg>` element
///
/// Every SVG id is suffixed with `id`, so callers rendering several diagrams
/// into one document must pass distinct values.
pub fn render_svg(diagram: &WaveDiagram, id: usize) -> Result<String, WaveDromError> {
    let mut rows = Vec::new();
    let mut groups = Vec::new();
    let mut max_depth = 0;
    flatten(&diagram.lanes, 0, &mut rows, &mut groups, &mut max_depth);

    let name_chars = rows
        .iter()
        .map(|row| match row.kind {
            RowKind::Signal(s) => s.name.chars().count(),
            RowKind::Spacer(name) => name.chars().count(),
        })
        .max()
        .unwrap_or(0);

    let ticks = diagram.ticks().max(1) as f64;
    let tick_width = TICK_WIDTH * diagram.hscale as f64;
    let group_width = max_depth as f64 * GROUP_WIDTH;
    let wave_left = MARGIN + group_width + name_chars as f64 * CHAR_WIDTH + MARGIN;

    let mut top = MARGIN;
    if has_text(&diagram.head) {
        top += CAPTION_HEIGHT;
    }
    if has_tick(&diagram.head) {
        top += TICK_ROW;
    }

    let layout = Layout {
        id,
        tick_width,
        wave_left,
        top,
    };

    let lanes_bottom = layout.lane_top(rows.len()) - (LANE_PITCH - LANE_HEIGHT);
    let mut height = lanes_bottom;
    if has_tick(&diagram.foot) {
        height += TICK_ROW;
    }
    if has_text(&diagram.foot) {
        height += CAPTION_HEIGHT;
    }
    height += MARGIN;
    let width = layout.x(ticks) + MARGIN;

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="wavedrom" id="wavedrom-{id}" width="{w}" height="{h}" viewBox="0 0 {w} {h}" style="max-width: 100%; height: auto;" font-family="ui-monospace, SFMono-Regular, Menlo, monospace" font-size="11" role="img">"#,
        id = id,
        w = px(width),
        h = px(height),
    ));
    push_defs(&mut svg, &layout, width, height);

    // Grid
    svg.push_str(r#"<g class="wd-grid" stroke="currentColor" stroke-opacity="0.15" stroke-dasharray="2,3">"#);
    for t in 0..=ticks as u32 {
        let x = layout.x(t as f64);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="{y1}" x2="{x}" y2="{y2}"/>"#,
            x = px(x),
            y1 = px(top - 4.0),
            y2 = px(lanes_bottom + 4.0),
        ));
    }
    svg.push_str("</g>");

    // Head and foot
    let center = layout.x(ticks / 2.0);
    let mut y = MARGIN;
    if let Some(head) = diagram.head.as_ref() {
        if has_text(&diagram.head) {
            svg.push_str(&caption_text(&head.text, center, y + 16.0));
            y += CAPTION_HEIGHT;
        }
        if let Some(start) = head.tick {
            push_tick_labels(&mut svg, &layout, start, ticks as u32, y + 11.0);
        }
    }
    let mut y = lanes_bottom;
    if let Some(foot) = diagram.foot.as_ref() {
        if let Some(start) = foot.tick {
            push_tick_labels(&mut svg, &layout, start, ticks as u32, y + 13.0);
            y += TICK_ROW;
        }
        if has_text(&diagram.foot) {
            svg.push_str(&caption_text(&foot.text, center, y + 17.0));
        }
    }

    // Groups
    for group in &groups {
        let x = MARGIN + group.depth as f64 * GROUP_WIDTH;
        let y0 = layout.lane_top(group.first);
        let y1 = layout.lane_top(group.last) + LANE_HEIGHT;
        svg.push_str(&format!(
            r#"<path class="wd-group" d="M{x2},{y0} L{x1},{y0} L{x1},{y1} L{x2},{y1}" fill="none" stroke="currentColor" stroke-width="1"/>"#,
            x1 = px(x + GROUP_WIDTH - 6.0),
            x2 = px(x + GROUP_WIDTH - 2.0),
            y0 = px(y0),
            y1 = px(y1),
        ));
        if !group.label.is_empty() {
            let lx = x + 8.0;
            let ly = (y0 + y1) / 2.0;
            svg.push_str(&format!(
                r#"<text class="wd-group-label" x="{x}" y="{y}" transform="rotate(-90 {x} {y})" text-anchor="middle" font-weight="bold" fill="currentColor">{label}</text>"#,
                x = px(lx),
                y = px(ly),
                label = escape_html(group.label),
            ));
        }
    }

    // Lanes
    let mut nodes: HashMap<char, (f64, f64)> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        let lane_top = layout.lane_top(index);
        let name = match row.kind {
            RowKind::Signal(s) => s.name.as_str(),
            RowKind::Spacer(name) => name,
        };
        if !name.is_empty() {
            svg.push_str(&format!(
                r#"<text class="wd-name" x="{x}" y="{y}" text-anchor="end" fill="currentColor">{name}</text>"#,
                x = px(wave_left - MARGIN),
                y = px(lane_top + 14.0),
                name = escape_html(name),
            ));
        }
        if let RowKind::Signal(signal) = row.kind {
            push_signal(&mut svg, &layout, signal, lane_top, &mut nodes);
        }
    }

    // Edges
    for edge in &diagram.edges {
        push_edge(&mut svg, &layout, edge, &nodes)?;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

fn has_text(caption: &Option<Caption>) -> bool {
    caption.as_ref().is_some_and(|c| !c.text.is_empty())
}

fn has_tick(caption: &Option<Caption>) -> bool {
    caption.as_ref().is_some_and(|c| c.tick.is_some())
}

fn push_defs(svg: &mut String, layout: &Layout, width: f64, height: f64) {
    let id = layout.id;
    svg.push_str("<defs>");
    svg.push_str(&format!(
        r#"<pattern id="wd-hatch-{id}" width="4" height="4" patternUnits="userSpaceOnUse" patternTransform="rotate(45)"><line x1="0" y1="0" x2="0" y2="4" stroke="currentColor" stroke-width="1" stroke-opacity="0.5"/></pattern>"#
    ));
    svg.push_str(&format!(
        r#"<marker id="wd-arrow-{id}" viewBox="0 0 10 10" refX="9" refY="5" markerWidth="6" markerHeight="6" orient="auto-start-reverse"><path d="M0,0 L10,5 L0,10 z" fill="currentColor"/></marker>"#
    ));
    svg.push_str(&format!(
        r#"<clipPath id="wd-clip-{id}"><rect x="{x}" y="0" width="{w}" height="{h}"/></clipPath>"#,
        x = px(layout.wave_left),
        w = px((width - layout.wave_left - MARGIN).max(0.0)),
        h = px(height),
    ));
    svg.push_str("</defs>");
}

fn caption_text(text: &str, x: f64, y: f64) -> String {
    format!(
        r#"<text class="wd-caption" x="{x}" y="{y}" text-anchor="middle" font-size="14" font-weight="bold" fill="currentColor">{text}</text>"#,
        x = px(x),
        y = px(y),
        text = escape_html(text),
    )
}

fn push_tick_labels(svg: &mut String, layout: &Layout, start: i64, ticks: u32, y: f64) {
    for t in 0..=ticks {
        svg.push_str(&format!(
            r#"<text class="wd-tick" x="{x}" y="{y}" text-anchor="middle" fill="currentColor">{label}</text>"#,
            x = px(layout.x(t as f64)),
            y = px(y),
            label = start.saturating_add(i64::from(t)),
        ));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    High,
    Low,
    Mid,
}

#[derive(Debug, Clone, PartialEq)]
enum RunKind {
    /// `p`/`P` start high, `n`/`N` start low
    Clock { rising: bool, arrow: bool },
    Level {
        level: Level,
        arrow: bool,
        dashed: bool,
    },
    /// Data bus; `None` means unknown (hatched)
    Bus { fill: Option<&'static str> },
}

#[derive(Debug, Clone, PartialEq)]
struct Run {
    kind: RunKind,
    start: f64,
    len: f64,
    label: Option<String>,
}

fn run_kind(ch: char) -> RunKind {
    match ch {
        'p' => RunKind::Clock {
            rising: true,
            arrow: false,
        },
        'P' => RunKind::Clock {
            rising: true,
            arrow: true,
        },
        'n' => RunKind::Clock {
            rising: false,
            arrow: false,
        },
        'N' => RunKind::Clock {
            rising: false,
            arrow: true,
        },
        'h' | '1' => RunKind::Level {
            level: Level::High,
            arrow: false,
            dashed: false,
        },
        'H' => RunKind::Level {
            level: Level::High,
            arrow: true,
            dashed: false,
        },
        'l' | '0' => RunKind::Level {
            level: Level::Low,
            arrow: false,
            dashed: false,
        },
        'L' => RunKind::Level {
            level: Level::Low,
            arrow: true,
            dashed: false,
        },
        'z' => RunKind::Level {
            level: Level::Mid,
            arrow: false,
            dashed: false,
        },
        'u' => RunKind::Level {
            level: Level::High,
            arrow: false,
            dashed: true,
        },
        'd' => RunKind::Level {
            level: Level::Low,
            arrow: false,
            dashed: true,
        },
        'x' => RunKind::Bus { fill: None },
        other => RunKind::Bus {
            fill: Some(data_fill(other)),
        },
    }
}

/// Split a wave string into runs; `.`, `|` and characters without a drawing
/// extend the previous run. Returns the runs and the tick positions of gap marks.
fn runs_for(signal: &Signal) -> (Vec<Run>, Vec<f64>) {
    let period = signal.period;
    let mut data = signal.data.iter();
    let mut runs: Vec<Run> = Vec::new();
    let mut gaps = Vec::new();

    for (i, ch) in signal.bricks().enumerate() {
        let start = i as f64 * period;
        if ch == '.' || ch == '|' || !WAVE_CHARS.contains(ch) {
            if ch == '|' {
                gaps.push(start + period / 2.0);
            }
            match runs.last_mut() {
                Some(run) => run.len += period,
                None => runs.push(Run {
                    kind: RunKind::Bus { fill: None },
                    start,
                    len: period,
                    label: None,
                }),
            }
            continue;
        }

        let label = if matches!(ch, '=' | '2'..='9') {
            data.next().cloned()
        } else {
            None
        };
        runs.push(Run {
            kind: run_kind(ch),
            start,
            len: period,
            label,
        });
    }
    (runs, gaps)
}

fn push_signal(
    svg: &mut String,
    layout: &Layout,
    signal: &Signal,
    lane_top: f64,
    nodes: &mut HashMap<char, (f64, f64)>,
) {
    let high = lane_top;
    let low = lane_top + LANE_HEIGHT;
    let mid = lane_top + LANE_HEIGHT / 2.0;
    let y_of = |level: Level| match level {
        Level::High => high,
        Level::Low => low,
        Level::Mid => mid,
    };
    let shift = -signal.phase * layout.tick_width;

    svg.push_str(&format!(
        r#"<g class="wd-signal" clip-path="url(#wd-clip-{id})"><g transform="translate({dx},0)" fill="none" stroke="currentColor" stroke-width="1">"#,
        id = layout.id,
        dx = px(shift),
    ));

    let (runs, gaps) = runs_for(signal);
    let mut prev_y: Option<f64> = None;
    let cycle = signal.period * layout.tick_width;

    for run in &runs {
        let x0 = layout.x(run.start);
        let x1 = layout.x(run.start + run.len);
        match &run.kind {
            RunKind::Level {
                level,
                arrow,
                dashed,
            } => {
                let y = y_of(*level);
                let from = prev_y.unwrap_or(y);
                let dash = if *dashed {
                    r#" stroke-dasharray="3,2""#
                } else {
                    ""
                };
                let d = if from != y {
                    format!(
                        "M{},{} L{},{} L{},{}",
                        px(x0),
                        px(from),
                        px(x0 + SLOPE),
                        px(y),
                        px(x1),
                        px(y)
                    )
                } else {
                    format!("M{},{} L{},{}", px(x0), px(y), px(x1), px(y))
                };
                svg.push_str(&format!(r#"<path d="{}"{}/>"#, d, dash));
                if *arrow && from != y {
                    push_edge_arrow(svg, x0 + SLOPE / 2.0, mid, y < from);
                }
                prev_y = Some(y);
            }
            RunKind::Clock { rising, arrow } => {
                let half = cycle / 2.0;
                let (first, second) = if *rising { (high, low) } else { (low, high) };
                let mut d = format!("M{},{}", px(x0), px(prev_y.unwrap_or(second)));
                let mut cx = x0;
                let mut last = second;
                while cx < x1 - 0.01 {
                    d.push_str(&format!(" L{},{}", px(cx), px(first)));
                    if *arrow && *rising {
                        push_edge_arrow(svg, cx, mid, true);
                    }
                    let edge2 = (cx + half).min(x1);
                    d.push_str(&format!(" L{},{}", px(edge2), px(first)));
                    last = first;
                    if cx + half < x1 - 0.01 {
                        d.push_str(&format!(" L{},{}", px(edge2), px(second)));
                        if *arrow && !*rising {
                            push_edge_arrow(svg, edge2, mid, false);
                        }
                        let end = (cx + cycle).min(x1);
                        d.push_str(&format!(" L{},{}", px(end), px(second)));
                        last = second;
                    }
                    cx += cycle;
                }
                svg.push_str(&format!(r#"<path d="{}"/>"#, d));
                prev_y = Some(last);
            }
            RunKind::Bus { fill } => {
                let fill_attr = match fill {
                    Some(color) => color.to_string(),
                    None => format!("url(#wd-hatch-{})", layout.id),
                };
                let end = (x1 - SLOPE).max(x0 + SLOPE);
                svg.push_str(&format!(
                    r#"<path d="M{x0},{mid} L{a},{high} L{b},{high} L{x1},{mid} L{b},{low} L{a},{low} Z" fill="{fill}"/>"#,
                    x0 = px(x0),
                    a = px(x0 + SLOPE),
                    b = px(end),
                    x1 = px(x1),
                    mid = px(mid),
                    high = px(high),
                    low = px(low),
                    fill = fill_attr,
                ));
                if let Some(label) = &run.label {
                    svg.push_str(&format!(
                        r#"<text class="wd-data" x="{x}" y="{y}" text-anchor="middle" fill="currentColor" stroke="none">{label}</text>"#,
                        x = px((x0 + x1) / 2.0),
                        y = px(mid + 4.0),
                        label = escape_html(label),
                    ));
                }
                prev_y = Some(mid);
            }
        }
    }

    for gap in gaps {
        let gx = layout.x(gap);
        svg.push_str(&format!(
            r#"<path class="wd-gap" d="M{a},{low} L{b},{high} L{c},{high} L{d},{low} Z" fill="var(--wd-bg, #fff)" stroke="none"/><path d="M{a},{low} L{b},{high} M{d},{low} L{c},{high}"/>"#,
            a = px(gx - 5.0),
            b = px(gx - 1.0),
            c = px(gx + 3.0),
            d = px(gx - 1.0),
            low = px(low + 3.0),
            high = px(high - 3.0),
        ));
    }

    svg.push_str("</g></g>");

    let period = signal.period;
    for (i, ch) in signal.node.chars().enumerate() {
        if ch == '.' {
            continue;
        }
        let x = layout.x(i as f64 * period) + shift + SLOPE / 2.0;
        nodes.insert(ch, (x, mid));
    }
}

fn push_edge_arrow(svg: &mut String, x: f64, y: f64, up: bool) {
    let tip = if up { y - 4.0 } else { y + 4.0 };
    let base = if up { y + 1.0 } else { y - 1.0 };
    svg.push_str(&format!(
        r#"<path class="wd-arrow" d="M{l},{base} L{x},{tip} L{r},{base} Z" fill="currentColor" stroke="none"/>"#,
        l = px(x - 3.0),
        r = px(x + 3.0),
        x = px(x),
        base = px(base),
        tip = px(tip),
    ));
}

fn push_edge(
    svg: &mut String,
    layout: &Layout,
    edge: &Edge,
    nodes: &HashMap<char, (f64, f64)>,
) -> Result<(), WaveDromError> {
    let &(x1, y1) = nodes
        .get(&edge.from)
        .ok_or(WaveDromError::UnknownNode(edge.from))?;
    let &(x2, y2) = nodes
        .get(&edge.to)
        .ok_or(WaveDromError::UnknownNode(edge.to))?;

    let d = match edge.shape {
        EdgeShape::Sharp => format!("M{},{} L{},{}", px(x1), px(y1), px(x2), px(y2)),
        EdgeShape::Curved => {
            let cx = (x1 + x2) / 2.0;
            format!(
                "M{},{} C{},{} {},{} {},{}",
                px(x1),
                px(y1),
                px(cx),
                px(y1),
                px(cx),
                px(y2),
                px(x2),
                px(y2)
            )
        }
    };
    let marker = format!("url(#wd-arrow-{})", layout.id);
    let mut attrs = String::new();
    if edge.arrow_start {
        attrs.push_str(&format!(r#" marker-start="{}""#, marker));
    }
    if edge.arrow_end {
        attrs.push_str(&format!(r#" marker-end="{}""#, marker));
    }
    svg.push_str(&format!(
        r#"<path class="wd-edge" d="{}" fill="none" stroke="currentColor" stroke-width="1"{}/>"#,
        d, attrs
    ));

    if let Some(label) = &edge.label {
        svg.push_str(&format!(
            r#"<text class="wd-edge-label" x="{x}" y="{y}" text-anchor="middle" fill="currentColor" paint-order="stroke" stroke="var(--wd-bg, #fff)" stroke-width="3">{label}</text>"#,
            x = px((x1 + x2) / 2.0),
            y = px((y1 + y2) / 2.0 - 3.0),
            label = escape_html(label),
        ));
    }
    Ok(())
}
