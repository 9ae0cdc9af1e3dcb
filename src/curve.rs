//! Control-point curve interpolation.
//!
//! A [`Curve`] keeps its control points, tension and sample density, and a
//! cached polyline that is recomputed in full after every change. Segments
//! are cubic Hermite splines whose tangents come from the neighboring control
//! points (Catmull-Rom style), scaled by the tension. Missing neighbors at the
//! ends are synthesized by reflection.

use crate::config::CurveConfig;
use crate::constants::{DEFAULT_STEPS, DEFAULT_TENSION, MASK_ON, MIN_STEPS};
use crate::error::EditError;
use crate::model::{CanvasSize, PixelPoint, Point};
use crate::raster::{self, Mask};

/// An editable interpolating curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    control_points: Vec<Point>,
    tension: f32,
    steps: usize,
    polyline: Vec<PixelPoint>,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new()
    }
}

impl Curve {
    /// Create an empty curve with default tension and density.
    pub fn new() -> Self {
        Self::with_params(DEFAULT_TENSION, DEFAULT_STEPS)
    }

    /// Create an empty curve; values are clamped like the setters do.
    pub fn with_params(tension: f32, steps: usize) -> Self {
        let mut curve = Self {
            control_points: Vec::new(),
            tension: DEFAULT_TENSION,
            steps: DEFAULT_STEPS,
            polyline: Vec::new(),
        };
        curve.set_tension(tension);
        curve.set_steps(steps);
        curve
    }

    /// Create an empty curve with the configured tension and density.
    pub fn from_config(config: &CurveConfig) -> Self {
        Self::with_params(config.tension, config.steps)
    }

    /// Replace all control points.
    pub fn set_control_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = Point>,
    {
        self.control_points = points.into_iter().collect();
        self.recompute();
    }

    /// Control points in order.
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.control_points.len()
    }

    /// Whether the curve has no control points.
    pub fn is_empty(&self) -> bool {
        self.control_points.is_empty()
    }

    /// Append a control point and return its index.
    pub fn add_control_point(&mut self, point: Point) -> usize {
        self.control_points.push(point);
        self.recompute();
        self.control_points.len() - 1
    }

    /// Insert a control point before `index` (`index == len` appends).
    pub fn insert_control_point(&mut self, index: usize, point: Point) -> Result<(), EditError> {
        if index > self.control_points.len() {
            return Err(EditError::index_out_of_range(index, self.control_points.len()));
        }
        self.control_points.insert(index, point);
        self.recompute();
        Ok(())
    }

    /// Move an existing control point.
    pub fn update_control_point(&mut self, index: usize, point: Point) -> Result<(), EditError> {
        let len = self.control_points.len();
        let slot = self
            .control_points
            .get_mut(index)
            .ok_or_else(|| EditError::index_out_of_range(index, len))?;
        *slot = point;
        self.recompute();
        Ok(())
    }

    /// Remove a control point, returning it.
    pub fn remove_control_point(&mut self, index: usize) -> Result<Point, EditError> {
        if index >= self.control_points.len() {
            return Err(EditError::index_out_of_range(index, self.control_points.len()));
        }
        let removed = self.control_points.remove(index);
        self.recompute();
        Ok(removed)
    }

    /// Drop every control point.
    pub fn clear(&mut self) {
        self.control_points.clear();
        self.polyline.clear();
    }

    /// Current tension in `[0, 1]`.
    pub fn tension(&self) -> f32 {
        self.tension
    }

    /// Set the tension, clamped to `[0, 1]`. NaN is ignored.
    pub fn set_tension(&mut self, tension: f32) {
        if tension.is_nan() {
            log::warn!("Ignoring NaN curve tension");
            return;
        }
        self.tension = tension.clamp(0.0, 1.0);
        self.recompute();
    }

    /// Samples per segment.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Set the samples per segment, at least [`MIN_STEPS`].
    pub fn set_steps(&mut self, steps: usize) {
        self.steps = steps.max(MIN_STEPS);
        self.recompute();
    }

    /// The sampled curve in pixel coordinates.
    pub fn polyline(&self) -> &[PixelPoint] {
        &self.polyline
    }

    /// Stroke the polyline as an open curve.
    pub fn create_mask(&self, canvas: CanvasSize, width: u32) -> Mask {
        raster::rasterize_polyline(canvas, &self.polyline, width)
    }

    /// Fill the polyline as a closed region.
    pub fn create_closed_mask(&self, canvas: CanvasSize) -> Mask {
        raster::rasterize_closed(canvas, &self.polyline, MASK_ON)
    }

    fn recompute(&mut self) {
        self.polyline = interpolate(&self.control_points, self.tension, self.steps);
    }
}

/// Sample the Hermite spline through `points`.
///
/// Produces `(len - 1) * (steps + 1)` samples for two or more points; with
/// fewer, the points are returned as-is. Coordinates are truncated toward
/// zero.
pub fn interpolate(points: &[Point], tension: f32, steps: usize) -> Vec<PixelPoint> {
    if points.len() < 2 {
        return points.iter().map(|p| p.to_pixel()).collect();
    }

    let steps = steps.max(MIN_STEPS);
    let tension = f64::from(tension);
    let last = points.len() - 1;
    let mut samples = Vec::with_capacity(last * (steps + 1));

    for i in 0..last {
        let p0 = points[i];
        let p1 = points[i + 1];
        let prev = if i > 0 {
            points[i - 1]
        } else {
            Point::new(p0.x - (p1.x - p0.x), p0.y - (p1.y - p0.y))
        };
        let next = if i + 2 <= last {
            points[i + 2]
        } else {
            Point::new(p1.x + (p1.x - p0.x), p1.y + (p1.y - p0.y))
        };

        let m0 = (
            (f64::from(p1.x) - f64::from(prev.x)) * tension,
            (f64::from(p1.y) - f64::from(prev.y)) * tension,
        );
        let m1 = (
            (f64::from(next.x) - f64::from(p0.x)) * tension,
            (f64::from(next.y) - f64::from(p0.y)) * tension,
        );

        for k in 0..=steps {
            let t = k as f64 / steps as f64;
            let t2 = t * t;
            let t3 = t2 * t;
            let h1 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h2 = -2.0 * t3 + 3.0 * t2;
            let h3 = t3 - 2.0 * t2 + t;
            let h4 = t3 - t2;

            let x = h1 * f64::from(p0.x) + h2 * f64::from(p1.x) + h3 * m0.0 + h4 * m1.0;
            let y = h1 * f64::from(p0.y) + h2 * f64::from(p1.y) + h3 * m0.1 + h4 * m1.1;
            samples.push(PixelPoint::new(x as i32, y as i32));
        }
    }

    samples
}
