//! Drawing modes.

use serde::{Deserialize, Serialize};

/// What a click on the canvas does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Click vertices of a filled polygon
    #[default]
    Polygon,
    /// Click control points of an interpolated curve
    Curve,
    /// Press-drag-release a hand bounding box
    BoundingBox,
}

impl DrawMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            DrawMode::Polygon => "Polygon",
            DrawMode::Curve => "Curve",
            DrawMode::BoundingBox => "Bounding Box",
        }
    }
}
