//! Global constants for the segmentation engine

/// Pixel value of a covered mask pixel
pub const MASK_ON: u8 = 255;

/// Default curve tension
pub const DEFAULT_TENSION: f32 = 0.5;

/// Default samples per curve segment
pub const DEFAULT_STEPS: usize = 30;

/// Fewest samples per curve segment
pub const MIN_STEPS: usize = 5;

/// Default stroke width for open curves, in pixels
pub const DEFAULT_STROKE_WIDTH: u32 = 5;

/// Minimum number of vertices for a polygon
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of control points for a curve
pub const MIN_CURVE_POINTS: usize = 2;

/// Clicking within this distance of the first vertex closes the polygon
pub const POLYGON_CLOSE_THRESHOLD: f32 = 10.0;

/// Traced contours longer than this are subsampled
pub const MAX_CONTOUR_POINTS: usize = 100;

/// Alpha of category colors in overlay previews
pub const OVERLAY_ALPHA: u8 = 128;
