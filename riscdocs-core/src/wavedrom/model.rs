//! WaveJSON document model and parser.

use super::WaveDromError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Characters with a drawing of their own; any other character extends the previous state
pub const WAVE_CHARS: &str = "pPnNhHlL01xz=23456789ud.|";

/// Sub-cycle group markers, which take no width
pub const SUBCYCLE_MARKS: [char; 2] = ['<', '>'];

const MAX_PERIOD: f64 = 64.0;

#[derive(Debug, Clone, PartialEq)]
pub struct WaveDiagram {
    pub lanes: Vec<Lane>,
    pub head: Option<Caption>,
    pub foot: Option<Caption>,
    pub edges: Vec<Edge>,
    pub hscale: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lane {
    Signal(Signal),
    /// `{}` or an object without a wave
    Spacer { name: String },
    /// `["label", lane, ...]`
    Group { label: String, lanes: Vec<Lane> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: String,
    pub wave: String,
    pub data: Vec<String>,
    pub period: f64,
    pub phase: f64,
    pub node: String,
}

impl Signal {
    /// Wave characters that occupy a cycle
    pub fn bricks(&self) -> impl Iterator<Item = char> + '_ {
        self.wave.chars().filter(|c| !SUBCYCLE_MARKS.contains(c))
    }

    /// Length of the signal in ticks
    pub fn ticks(&self) -> f64 {
        self.bricks().count() as f64 * self.period
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub tick: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeShape {
    Sharp,
    Curved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: char,
    pub to: char,
    pub shape: EdgeShape,
    pub arrow_start: bool,
    pub arrow_end: bool,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSignal {
    #[serde(default)]
    name: Option<Value>,
    wave: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    period: Option<f64>,
    #[serde(default)]
    phase: Option<f64>,
    #[serde(default)]
    node: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCaption {
    #[serde(default)]
    text: Option<Value>,
    #[serde(default)]
    tick: Option<i64>,
}

impl WaveDiagram {
    /// Parse a WaveJSON description (strict JSON)
    pub fn parse(source: &str) -> Result<Self, WaveDromError> {
        let value: Value = serde_json::from_str(source.trim())?;
        let Value::Object(root) = value else {
            return Err(WaveDromError::NotAnObject);
        };

        if root.contains_key("reg") {
            return Err(WaveDromError::Unsupported("reg"));
        }
        if root.contains_key("assign") {
            return Err(WaveDromError::Unsupported("assign"));
        }

        let signal = root.get("signal").ok_or(WaveDromError::MissingSignal)?;
        let Value::Array(items) = signal else {
            return Err(WaveDromError::SignalNotArray);
        };

        let mut counter = 0;
        let lanes = parse_lanes(items, &mut counter)?;
        if !lanes.iter().any(has_signal) {
            return Err(WaveDromError::EmptyDiagram);
        }

        let head = parse_caption(&root, "head")?;
        let foot = parse_caption(&root, "foot")?;
        let hscale = parse_hscale(&root)?;
        let edges = match root.get("edge") {
            None => Vec::new(),
            Some(Value::Array(specs)) => specs
                .iter()
                .map(|spec| match spec {
                    Value::String(s) => parse_edge(s),
                    other => Err(WaveDromError::InvalidEdge(other.to_string())),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => return Err(WaveDromError::InvalidEdge(other.to_string())),
        };

        Ok(Self {
            lanes,
            head,
            foot,
            edges,
            hscale,
        })
    }

    /// Signals in drawing order, groups flattened
    pub fn signals(&self) -> Vec<&Signal> {
        fn walk<'a>(lanes: &'a [Lane], out: &mut Vec<&'a Signal>) {
            for lane in lanes {
                match lane {
                    Lane::Signal(s) => out.push(s),
                    Lane::Spacer { .. } => {}
                    Lane::Group { lanes, .. } => walk(lanes, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.lanes, &mut out);
        out
    }

    /// Widest signal in ticks, rounded up to a whole tick
    pub fn ticks(&self) -> u32 {
        self.signals()
            .iter()
            .map(|s| s.ticks())
            .fold(0.0, f64::max)
            .ceil() as u32
    }
}

fn has_signal(lane: &Lane) -> bool {
    match lane {
        Lane::Signal(_) => true,
        Lane::Spacer { .. } => false,
        Lane::Group { lanes, .. } => lanes.iter().any(has_signal),
    }
}

fn parse_lanes(items: &[Value], counter: &mut usize) -> Result<Vec<Lane>, WaveDromError> {
    let mut lanes = Vec::with_capacity(items.len());
    for item in items {
        let index = *counter;
        match item {
            Value::Object(obj) if !obj.contains_key("wave") => {
                *counter += 1;
                lanes.push(Lane::Spacer {
                    name: obj.get("name").map(text_of).unwrap_or_default(),
                });
            }
            Value::Object(_) => {
                *counter += 1;
                let raw: RawSignal =
                    serde_json::from_value(item.clone()).map_err(|e| WaveDromError::InvalidLane {
                        index,
                        reason: e.to_string(),
                    })?;
                lanes.push(Lane::Signal(build_signal(raw, index)?));
            }
            Value::Array(group) => {
                let (label, rest) = match group.split_first() {
                    Some((Value::String(label), rest)) => (label.clone(), rest),
                    _ => (String::new(), group.as_slice()),
                };
                let lanes_in_group = parse_lanes(rest, counter)?;
                lanes.push(Lane::Group {
                    label,
                    lanes: lanes_in_group,
                });
            }
            other => {
                return Err(WaveDromError::InvalidLane {
                    index,
                    reason: format!("expected an object or a group array, found {}", other),
                })
            }
        }
    }
    Ok(lanes)
}

fn build_signal(raw: RawSignal, index: usize) -> Result<Signal, WaveDromError> {
    let name = raw.name.as_ref().map(text_of).unwrap_or_default();

    if let Some(ch) = raw
        .wave
        .chars()
        .find(|c| !WAVE_CHARS.contains(*c) && !SUBCYCLE_MARKS.contains(c))
    {
        tracing::debug!("Lane {}: '{}' in wave extends the previous state", index, ch);
    }

    let period = match raw.period {
        None => 1.0,
        Some(p) if p > 0.0 && p <= MAX_PERIOD => p,
        Some(p) => {
            return Err(WaveDromError::InvalidLane {
                index,
                reason: format!(
                    "period must be greater than 0 and at most {}, found {}",
                    MAX_PERIOD, p
                ),
            })
        }
    };

    let data = match raw.data {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => s.split_whitespace().map(str::to_string).collect(),
        Some(Value::Array(items)) => items.iter().map(text_of).collect(),
        Some(other) => {
            return Err(WaveDromError::InvalidLane {
                index,
                reason: format!("data must be an array or a string, found {}", other),
            })
        }
    };

    Ok(Signal {
        name,
        wave: raw.wave,
        data,
        period,
        phase: raw.phase.unwrap_or(0.0),
        node: raw.node.unwrap_or_default(),
    })
}

fn parse_caption(root: &Map<String, Value>, key: &str) -> Result<Option<Caption>, WaveDromError> {
    let Some(value) = root.get(key) else {
        return Ok(None);
    };
    let raw: RawCaption =
        serde_json::from_value(value.clone()).map_err(|e| WaveDromError::InvalidCaption {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some(Caption {
        text: raw.text.as_ref().map(text_of).unwrap_or_default(),
        tick: raw.tick,
    }))
}

fn parse_hscale(root: &Map<String, Value>) -> Result<u32, WaveDromError> {
    let Some(config) = root.get("config") else {
        return Ok(1);
    };
    match config.get("hscale") {
        None => Ok(1),
        Some(v) => match v.as_u64() {
            Some(h) if (1..=64).contains(&h) => Ok(h as u32),
            _ => Err(WaveDromError::InvalidHscale(v.to_string())),
        },
    }
}

/// Parse an edge spec such as `a~>b label` or `c<->d`
pub fn parse_edge(spec: &str) -> Result<Edge, WaveDromError> {
    let invalid = || WaveDromError::InvalidEdge(spec.to_string());
    let mut chars = spec.trim_start().char_indices().peekable();

    let (_, from) = chars.next().ok_or_else(invalid)?;
    let mut connector = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if "-~<>|".contains(c) {
            connector.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if connector.is_empty() {
        return Err(invalid());
    }

    let (to_idx, to) = chars.next().ok_or_else(invalid)?;
    if to.is_whitespace() {
        return Err(invalid());
    }

    let trimmed = spec.trim_start();
    let label = trimmed[to_idx + to.len_utf8()..].trim();

    Ok(Edge {
        from,
        to,
        shape: if connector.contains('~') {
            EdgeShape::Curved
        } else {
            EdgeShape::Sharp
        },
        arrow_start: connector.starts_with('<'),
        arrow_end: connector.ends_with('>'),
        label: (!label.is_empty()).then(|| label.to_string()),
    })
}

/// Plain text of a JSON value; JsonML arrays are flattened to their strings
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => {
            // ["tspan", {attrs}, "text", ...]: skip the tag name and attribute objects
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::String(_) if i == 0 => {}
                    Value::Object(_) => {}
                    other => out.push_str(&text_of(other)),
                }
            }
            out
        }
        Value::Null | Value::Object(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signals_spacers_and_groups() {
        let diagram = WaveDiagram::parse(
            r#"{ "signal": [
                { "name": "clk", "wave": "p....." },
                {},
                ["AXI", { "name": "valid", "wave": "01.0" }, { "name": "data", "wave": "x=.x", "data": "A" }]
            ]}"#,
        )
        .unwrap();

        assert_eq!(diagram.lanes.len(), 3);
        assert!(matches!(diagram.lanes[1], Lane::Spacer { .. }));
        match &diagram.lanes[2] {
            Lane::Group { label, lanes } => {
                assert_eq!(label, "AXI");
                assert_eq!(lanes.len(), 2);
            }
            other => panic!("expected group, got {other:?}"),
        }
        let signals = diagram.signals();
        assert_eq!(signals.len(), 3);
        assert_eq!(signals[2].data, vec!["A".to_string()]);
        assert_eq!(diagram.ticks(), 6);
        assert_eq!(diagram.hscale, 1);
    }

    #[test]
    fn period_stretches_ticks() {
        let diagram =
            WaveDiagram::parse(r#"{ "signal": [{ "name": "slow", "wave": "p..", "period": 2 }] }"#)
                .unwrap();
        assert_eq!(diagram.ticks(), 6);
    }

    #[test]
    fn data_accepts_numbers_and_strings() {
        let diagram = WaveDiagram::parse(
            r#"{ "signal": [{ "wave": "=.=", "data": [1, "two"] }], "config": { "hscale": 2 } }"#,
        )
        .unwrap();
        assert_eq!(diagram.signals()[0].data, vec!["1", "two"]);
        assert_eq!(diagram.hscale, 2);
    }

    #[test]
    fn head_text_flattens_jsonml() {
        let diagram = WaveDiagram::parse(
            r#"{ "signal": [{ "wave": "01" }],
                 "head": { "text": ["tspan", {"class": "h3"}, "Read ", ["tspan", "burst"]], "tick": 0 } }"#,
        )
        .unwrap();
        let head = diagram.head.unwrap();
        assert_eq!(head.text, "Read burst");
        assert_eq!(head.tick, Some(0));
    }

    #[test]
    fn malformed_json_reports_position() {
        let err = WaveDiagram::parse(r#"{ "signal": [ { "wave": "01" ] }"#).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, WaveDromError::Json(_)));
        assert!(message.contains("line 1"), "{message}");
    }

    #[test]
    fn rejects_structural_errors() {
        assert!(matches!(
            WaveDiagram::parse("[]"),
            Err(WaveDromError::NotAnObject)
        ));
        assert!(matches!(
            WaveDiagram::parse("{}"),
            Err(WaveDromError::MissingSignal)
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": "p..." }"#),
            Err(WaveDromError::SignalNotArray)
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [] }"#),
            Err(WaveDromError::EmptyDiagram)
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [42] }"#),
            Err(WaveDromError::InvalidLane { index: 0, .. })
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "reg": [{ "bits": 8 }] }"#),
            Err(WaveDromError::Unsupported("reg"))
        ));
    }

    #[test]
    fn unknown_characters_and_subcycle_marks_are_accepted() {
        let diagram = WaveDiagram::parse(
            r#"{ "signal": [{ "name": "clk", "wave": "p.q." }, { "name": "sub", "wave": "0<1010>1" }] }"#,
        )
        .unwrap();
        let signals = diagram.signals();
        assert_eq!(signals[0].ticks(), 4.0);
        assert_eq!(signals[1].bricks().collect::<String>(), "010101");
        assert_eq!(diagram.ticks(), 6);
    }

    #[test]
    fn fractional_period_is_accepted() {
        let diagram =
            WaveDiagram::parse(r#"{ "signal": [{ "name": "fast", "wave": "p....", "period": 0.5 }] }"#)
                .unwrap();
        assert_eq!(diagram.signals()[0].period, 0.5);
        assert_eq!(diagram.ticks(), 3);
    }

    #[test]
    fn rejects_bad_period_and_hscale() {
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [{ "wave": "p.", "period": 0 }] }"#),
            Err(WaveDromError::InvalidLane { .. })
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [{ "wave": "p.", "period": -1.5 }] }"#),
            Err(WaveDromError::InvalidLane { .. })
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [{ "wave": "p.", "period": 65 }] }"#),
            Err(WaveDromError::InvalidLane { .. })
        ));
        assert!(matches!(
            WaveDiagram::parse(r#"{ "signal": [{ "wave": "p." }], "config": { "hscale": 0 } }"#),
            Err(WaveDromError::InvalidHscale(_))
        ));
    }

    #[test]
    fn parses_edges() {
        let edge = parse_edge("a~>b setup").unwrap();
        assert_eq!((edge.from, edge.to), ('a', 'b'));
        assert_eq!(edge.shape, EdgeShape::Curved);
        assert!(edge.arrow_end && !edge.arrow_start);
        assert_eq!(edge.label.as_deref(), Some("setup"));

        let edge = parse_edge("c<->d").unwrap();
        assert_eq!(edge.shape, EdgeShape::Sharp);
        assert!(edge.arrow_start && edge.arrow_end);
        assert!(edge.label.is_none());

        assert!(parse_edge("ab").is_err());
        assert!(parse_edge("a->").is_err());
    }
}
