#![forbid(unsafe_code)]

//! Text and style metrics supplied by the host.
//!
//! The core never measures text itself; it only needs a few scalar metrics
//! to size synthetic hit rectangles and to place the synthetic pointer next
//! to a freshly focused item.

use crate::geometry::Vec2;

/// Read-only metrics from the host's text/style provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Height of one line of text, in logical pixels.
    pub line_height: f32,
    /// Current font size, in logical pixels.
    pub font_size: f32,
    /// Padding between a frame edge and its content.
    pub frame_padding: Vec2,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            line_height: 17.0,
            font_size: 13.0,
            frame_padding: Vec2::new(4.0, 3.0),
        }
    }
}
