//! Undo system for annotation edits.
//!
//! Every committed edit is recorded as an [`AnnotationAction`] in an
//! append-only [`ActionHistory`]. Additive actions keep the data needed to
//! re-rasterize them, so undoing one rebuilds the affected layer by replaying
//! what is left of the log. Destructive actions keep a snapshot of what they
//! destroyed and are undone by restoring it.

use crate::bbox::BoundingBoxStore;
use crate::constants::MAX_CONTOUR_POINTS;
use crate::curve::Curve;
use crate::error::EditError;
use crate::layers::{LayerSnapshot, MaskLayer, MaskLayerStore};
use crate::model::{BoundingBox, CanvasSize, EntityKey, HandSide, PersonId, Point};
use crate::raster::{self, Mask};

// ============================================================================
// Action Types
// ============================================================================

/// Everything needed to redraw a committed curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveStroke {
    pub control_points: Vec<Point>,
    pub tension: f32,
    pub steps: usize,
    /// Filled region when true, stroked line otherwise
    pub closed: bool,
    /// Stroke width of open curves
    pub width: u32,
}

impl CurveStroke {
    /// Capture a curve as it is now.
    pub fn from_curve(curve: &Curve, closed: bool, width: u32) -> Self {
        Self {
            control_points: curve.control_points().to_vec(),
            tension: curve.tension(),
            steps: curve.steps(),
            closed,
            width: width.max(1),
        }
    }

    /// Rebuild the curve.
    pub fn to_curve(&self) -> Curve {
        let mut curve = Curve::with_params(self.tension, self.steps);
        curve.set_control_points(self.control_points.iter().copied());
        curve
    }

    /// Rasterize the stroke and derive its outlines.
    ///
    /// Closed curves use their own polyline as outline; open strokes are
    /// traced from the rasterized mask.
    pub fn render(&self, canvas: CanvasSize) -> (Mask, Vec<Vec<f32>>) {
        let curve = self.to_curve();
        if self.closed {
            let mask = curve.create_closed_mask(canvas);
            let outline =
                raster::closed_outline(curve.polyline().iter().map(|p| (p.x as f32, p.y as f32)));
            (mask, vec![outline])
        } else {
            let mask = curve.create_mask(canvas, self.width);
            let outlines = raster::trace_outlines(&mask, MAX_CONTOUR_POINTS);
            (mask, outlines)
        }
    }
}

/// A committed edit.
/// Each action stores enough information to replay or reverse its effect.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationAction {
    /// Filled polygon added to a layer
    Polygon {
        key: EntityKey,
        /// Vertices in image coordinates
        points: Vec<Point>,
    },
    /// Curve added to a layer
    Curve { key: EntityKey, stroke: CurveStroke },
    /// One layer cleared
    ClearOne {
        key: EntityKey,
        /// The layer as it was before the clear
        snapshot: MaskLayer,
    },
    /// Every layer cleared
    ClearAll {
        /// All layers as they were before the clear
        snapshot: LayerSnapshot,
    },
    /// Hand bounding box set
    BboxSet {
        person: PersonId,
        hand: HandSide,
        bbox: BoundingBox,
    },
}

impl AnnotationAction {
    /// Get a human-readable description of this action
    pub fn description(&self) -> String {
        match self {
            AnnotationAction::Polygon { key, .. } => format!("Add polygon to {}", key),
            AnnotationAction::Curve { key, stroke } => {
                let kind = if stroke.closed { "closed curve" } else { "curve" };
                format!("Add {} to {}", kind, key)
            }
            AnnotationAction::ClearOne { key, .. } => format!("Clear {}", key),
            AnnotationAction::ClearAll { snapshot } => {
                format!("Clear {} layers", snapshot.len())
            }
            AnnotationAction::BboxSet { person, hand, .. } => {
                format!("Set {} hand box of person {}", hand, person)
            }
        }
    }

    /// The layer this action targets, if it targets exactly one.
    pub fn key(&self) -> Option<EntityKey> {
        match self {
            AnnotationAction::Polygon { key, .. }
            | AnnotationAction::Curve { key, .. }
            | AnnotationAction::ClearOne { key, .. } => Some(*key),
            AnnotationAction::ClearAll { .. } | AnnotationAction::BboxSet { .. } => None,
        }
    }

    /// Whether this action resets `key`.
    pub fn clears(&self, key: EntityKey) -> bool {
        match self {
            AnnotationAction::ClearOne { key: cleared, .. } => *cleared == key,
            AnnotationAction::ClearAll { .. } => true,
            _ => false,
        }
    }

    /// Whether applying or reverting this action needs a canvas.
    pub fn touches_masks(&self) -> bool {
        !matches!(self, AnnotationAction::BboxSet { .. })
    }

    /// Rasterize an additive action. Returns `None` for every other kind.
    pub fn render(&self, canvas: CanvasSize) -> Option<(Mask, Vec<Vec<f32>>)> {
        match self {
            AnnotationAction::Polygon { points, .. } => {
                let mask = raster::rasterize_polygon(canvas, points);
                let outline = raster::closed_outline(points.iter().map(|p| (p.x, p.y)));
                Some((mask, vec![outline]))
            }
            AnnotationAction::Curve { stroke, .. } => Some(stroke.render(canvas)),
            _ => None,
        }
    }

    /// Apply this action's forward effect.
    pub fn apply(
        &self,
        layers: &mut MaskLayerStore,
        boxes: &mut BoundingBoxStore,
    ) -> Result<(), EditError> {
        match self {
            AnnotationAction::Polygon { key, .. } | AnnotationAction::Curve { key, .. } => {
                let canvas = layers.require_canvas()?;
                if let Some((region, outlines)) = self.render(canvas) {
                    layers.add_region(*key, &region, outlines)?;
                }
                Ok(())
            }
            AnnotationAction::ClearOne { key, .. } => layers.reset(*key),
            AnnotationAction::ClearAll { .. } => layers.reset_all(),
            AnnotationAction::BboxSet { person, hand, bbox } => {
                boxes.set(*person, *hand, *bbox);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Action History
// ============================================================================

/// Linear, append-only history of committed actions. There is no redo.
///
/// The history is unbounded: dropping old entries would leave later
/// additive actions without the log they replay against.
#[derive(Debug, Clone, Default)]
pub struct ActionHistory {
    actions: Vec<AnnotationAction>,
}

impl ActionHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action whose effect has already been applied.
    pub fn push(&mut self, action: AnnotationAction) {
        log::debug!("📝 Undo: pushed '{}'", action.description());
        self.actions.push(action);
    }

    /// The most recent action.
    pub fn last(&self) -> Option<&AnnotationAction> {
        self.actions.last()
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions in the order they were committed.
    pub fn iter(&self) -> impl Iterator<Item = &AnnotationAction> {
        self.actions.iter()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.actions.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    /// Revert the most recent action and return its description.
    ///
    /// On error the history and both stores are left unchanged.
    pub fn undo(
        &mut self,
        layers: &mut MaskLayerStore,
        boxes: &mut BoundingBoxStore,
    ) -> Result<String, EditError> {
        let Some(action) = self.actions.pop() else {
            return Err(EditError::NothingToUndo);
        };

        match self.revert(&action, layers, boxes) {
            Ok(()) => {
                let description = action.description();
                log::debug!("⏪ Undo: '{}'", description);
                Ok(description)
            }
            Err(e) => {
                self.actions.push(action);
                Err(e)
            }
        }
    }

    /// Rebuild one layer from the log.
    ///
    /// Replay starts after the most recent action that cleared `key`, since
    /// a clear always leaves the layer blank.
    pub fn rebuild_layer(
        &self,
        key: EntityKey,
        layers: &mut MaskLayerStore,
    ) -> Result<(), EditError> {
        let canvas = layers.require_canvas()?;
        let start = self
            .actions
            .iter()
            .rposition(|a| a.clears(key))
            .map_or(0, |i| i + 1);

        let mut layer = MaskLayer::new(canvas);
        let mut replayed = 0;
        for action in &self.actions[start..] {
            if action.key() != Some(key) {
                continue;
            }
            if let Some((region, outlines)) = action.render(canvas) {
                layer.compose(&region, outlines)?;
                replayed += 1;
            }
        }

        log::debug!("🔁 Rebuilt {} from {} actions", key, replayed);
        layers.restore(key, layer)
    }

    fn revert(
        &self,
        action: &AnnotationAction,
        layers: &mut MaskLayerStore,
        boxes: &mut BoundingBoxStore,
    ) -> Result<(), EditError> {
        if action.touches_masks() {
            layers.require_canvas()?;
        }

        match action {
            AnnotationAction::Polygon { key, .. } | AnnotationAction::Curve { key, .. } => {
                self.rebuild_layer(*key, layers)
            }
            AnnotationAction::ClearOne { key, snapshot } => {
                layers.restore(*key, snapshot.clone())?;
                log::debug!("⏪ Restored {}", key);
                Ok(())
            }
            AnnotationAction::ClearAll { snapshot } => {
                layers.restore_all(snapshot.clone())?;
                log::debug!("⏪ Restored {} layers", snapshot.len());
                Ok(())
            }
            AnnotationAction::BboxSet { person, hand, .. } => {
                boxes.clear(*person, *hand);
                Ok(())
            }
        }
    }
}

/// Derive the layer state a log describes, starting from a blank canvas.
pub fn fold<'a, I>(actions: I, canvas: CanvasSize) -> Result<MaskLayerStore, EditError>
where
    I: IntoIterator<Item = &'a AnnotationAction>,
{
    let mut layers = MaskLayerStore::with_canvas(canvas);
    let mut boxes = BoundingBoxStore::new();
    for action in actions {
        action.apply(&mut layers, &mut boxes)?;
    }
    Ok(layers)
}
