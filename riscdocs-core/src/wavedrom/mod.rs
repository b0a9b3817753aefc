//! Digital timing diagrams from WaveJSON.
//!
//! `render(source, id)` parses a WaveJSON description and lays it out as an
//! inline SVG. `id` is a per-page counter; it suffixes every SVG `id` so
//! several diagrams can share a page.

pub mod model;
mod render;

pub use model::{Caption, Edge, EdgeShape, Lane, Signal, WaveDiagram};
pub use render::render_svg;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WaveDromError {
    #[error("invalid WaveJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WaveJSON root must be an object")]
    NotAnObject,

    #[error("missing \"signal\" array")]
    MissingSignal,

    #[error("\"signal\" must be an array")]
    SignalNotArray,

    #[error("diagram has no signals")]
    EmptyDiagram,

    #[error("lane {index}: {reason}")]
    InvalidLane { index: usize, reason: String },

    #[error("invalid {key}: {reason}")]
    InvalidCaption { key: String, reason: String },

    #[error("config.hscale must be an integer between 1 and 64, found {0}")]
    InvalidHscale(String),

    #[error("invalid edge {0}")]
    InvalidEdge(String),

    #[error("edge refers to unknown node '{0}'")]
    UnknownNode(char),

    #[error("\"{0}\" diagrams are not supported")]
    Unsupported(&'static str),
}

/// Parse and render a WaveJSON description to SVG markup
pub fn render(source: &str, id: usize) -> Result<String, WaveDromError> {
    let diagram = WaveDiagram::parse(source)?;
    render_svg(&diagram, id)
}
