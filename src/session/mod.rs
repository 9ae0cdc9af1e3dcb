//! Editing session.
//!
//! A [`Session`] ties the stores together the way an interactive front end
//! drives them: a current person, hand, category and drawing mode; pointer
//! input that builds up a polygon, curve or box; and commit, clear and undo
//! operations that keep the layers, boxes and history consistent.

#[cfg(test)]
mod tests;

use std::path::Path;

use crate::bbox::{BoundingBoxStore, BoxDrag};
use crate::config::ToolConfig;
use crate::constants::{MIN_CURVE_POINTS, MIN_POLYGON_VERTICES};
use crate::curve::Curve;
use crate::error::EditError;
use crate::format::{
    AnnotationExporter, CocoFormat, ExportOptions, ExportRecord, ExportResult, FormatError,
    ImageInfo,
};
use crate::layers::MaskLayerStore;
use crate::model::{
    BoundingBox, CanvasSize, Category, DrawMode, EntityKey, HandSide, PersonId, Point,
};
use crate::undo::{ActionHistory, AnnotationAction, CurveStroke};

/// Editing state for one image.
#[derive(Debug, Clone)]
pub struct Session {
    persons: Vec<PersonId>,
    person: PersonId,
    hand: HandSide,
    category: Category,
    mode: DrawMode,

    closed_curve: bool,
    stroke_width: u32,
    close_threshold: f32,

    layers: MaskLayerStore,
    boxes: BoundingBoxStore,
    history: ActionHistory,

    pending_polygon: Vec<Point>,
    curve: Curve,
    box_drag: Option<BoxDrag>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&ToolConfig::default())
    }
}

impl Session {
    /// Create a session with one person and no canvas.
    pub fn new(config: &ToolConfig) -> Self {
        let config = config.normalized();
        Self {
            persons: vec![PersonId::FIRST],
            person: PersonId::FIRST,
            hand: HandSide::default(),
            category: Category::default(),
            mode: DrawMode::default(),
            closed_curve: config.curve.closed,
            stroke_width: config.curve.stroke_width,
            close_threshold: config.polygon_close_threshold,
            layers: MaskLayerStore::new(),
            boxes: BoundingBoxStore::new(),
            history: ActionHistory::new(),
            pending_polygon: Vec::new(),
            curve: Curve::from_config(&config.curve),
            box_drag: None,
        }
    }

    // ------------------------------------------------------------------
    // Image and selection
    // ------------------------------------------------------------------

    /// Start annotating an image of the given native size.
    ///
    /// Drops every layer, box, history entry and in-progress shape.
    pub fn load_canvas(&mut self, canvas: CanvasSize) {
        self.layers.set_canvas(canvas);
        self.boxes.clear_all();
        self.history.clear();
        self.discard_in_progress();
        log::info!("🖼️ Canvas loaded: {}", canvas);
    }

    /// Native size of the loaded image.
    pub fn canvas(&self) -> Option<CanvasSize> {
        self.layers.canvas()
    }

    /// Known persons, in creation order.
    pub fn persons(&self) -> &[PersonId] {
        &self.persons
    }

    /// Add a person with the next free id and select it.
    pub fn add_person(&mut self) -> PersonId {
        let id = self
            .persons
            .iter()
            .max()
            .map_or(PersonId::FIRST, |last| last.next());
        self.persons.push(id);
        self.person = id;
        log::info!("Added person {}", id);
        id
    }

    /// Select an existing person.
    pub fn select_person(&mut self, person: PersonId) -> Result<(), EditError> {
        if !self.persons.contains(&person) {
            log::warn!("Cannot select unknown person {}", person);
            return Err(EditError::UnknownPerson(person));
        }
        self.person = person;
        Ok(())
    }

    /// The selected person.
    pub fn person(&self) -> PersonId {
        self.person
    }

    /// Select the hand to annotate.
    pub fn set_hand(&mut self, hand: HandSide) {
        self.hand = hand;
    }

    /// The selected hand.
    pub fn hand(&self) -> HandSide {
        self.hand
    }

    /// Select the category to paint. Hand categories only label boxes.
    pub fn set_category(&mut self, category: Category) -> Result<(), EditError> {
        if category.is_hand() {
            return Err(EditError::NotPaintable(category));
        }
        self.category = category;
        Ok(())
    }

    /// The selected category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Switch drawing mode, discarding any shape in progress.
    pub fn set_mode(&mut self, mode: DrawMode) {
        if mode != self.mode {
            self.discard_in_progress();
            log::debug!("Drawing mode: {}", mode.name());
        }
        self.mode = mode;
    }

    /// The current drawing mode.
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// The layer the next polygon or curve lands in.
    pub fn current_key(&self) -> EntityKey {
        EntityKey::new(self.person, self.hand, self.category)
    }

    // ------------------------------------------------------------------
    // Curve settings
    // ------------------------------------------------------------------

    /// Set the tension of the curve being edited.
    pub fn set_tension(&mut self, tension: f32) {
        self.curve.set_tension(tension);
    }

    /// Set the sample density of the curve being edited.
    pub fn set_steps(&mut self, steps: usize) {
        self.curve.set_steps(steps);
    }

    /// Fill new curves as closed regions, or stroke them.
    pub fn set_closed_curve(&mut self, closed: bool) {
        self.closed_curve = closed;
    }

    /// Whether new curves are filled.
    pub fn closed_curve(&self) -> bool {
        self.closed_curve
    }

    /// Set the stroke width of open curves, at least 1.
    pub fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width.max(1);
    }

    /// Stroke width of open curves.
    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    /// Handle a press at `at`, in image coordinates.
    ///
    /// In polygon mode a press near the first vertex of a polygon with at
    /// least three vertices completes it instead of adding a vertex.
    pub fn press(&mut self, at: Point) -> Result<(), EditError> {
        self.layers.require_canvas()?;

        match self.mode {
            DrawMode::Polygon => {
                if self.closes_polygon(at) {
                    return self.complete_polygon();
                }
                self.pending_polygon.push(at);
            }
            DrawMode::Curve => {
                self.curve.add_control_point(at);
            }
            DrawMode::BoundingBox => {
                if self.box_drag.is_some() {
                    log::debug!("Discarding unfinished box drag");
                }
                self.box_drag = Some(BoxDrag::start(at));
            }
        }
        Ok(())
    }

    /// Handle pointer motion with the button held.
    pub fn drag(&mut self, to: Point) {
        if let Some(drag) = self.box_drag.as_mut() {
            drag.update(to);
        }
    }

    /// Handle a release. Finishes a box drag, if one is active.
    pub fn release(&mut self, at: Point) -> Result<Option<BoundingBox>, EditError> {
        let Some(drag) = self.box_drag.take() else {
            return Ok(None);
        };
        let bbox = drag.finish(at);
        self.commit_box(self.person, self.hand, bbox)?;
        Ok(Some(bbox))
    }

    /// Finish the shape in progress for the current mode.
    pub fn complete(&mut self) -> Result<(), EditError> {
        match self.mode {
            DrawMode::Polygon => self.complete_polygon(),
            DrawMode::Curve => self.complete_curve(),
            DrawMode::BoundingBox => Ok(()),
        }
    }

    /// Abandon the shape in progress for the current mode.
    pub fn cancel(&mut self) {
        match self.mode {
            DrawMode::Polygon => self.pending_polygon.clear(),
            DrawMode::Curve => self.curve.clear(),
            DrawMode::BoundingBox => self.box_drag = None,
        }
    }

    /// Commit the pending polygon to the current layer.
    ///
    /// On error the pending vertices are kept.
    pub fn complete_polygon(&mut self) -> Result<(), EditError> {
        self.commit_polygon(self.current_key(), self.pending_polygon.clone())?;
        self.pending_polygon.clear();
        Ok(())
    }

    /// Commit the curve being edited to the current layer.
    ///
    /// On error the control points are kept.
    pub fn complete_curve(&mut self) -> Result<(), EditError> {
        let stroke = CurveStroke::from_curve(&self.curve, self.closed_curve, self.stroke_width);
        self.commit_curve(self.current_key(), stroke)?;
        self.curve.clear();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Commits
    // ------------------------------------------------------------------

    /// Fill a polygon into `key`'s layer and record it.
    pub fn commit_polygon(&mut self, key: EntityKey, points: Vec<Point>) -> Result<(), EditError> {
        self.check_paintable(key)?;
        if points.len() < MIN_POLYGON_VERTICES {
            return Err(rejected(EditError::insufficient_points(
                "polygon",
                "points",
                MIN_POLYGON_VERTICES,
                points.len(),
            )));
        }
        let distinct = distinct_pixels(&points);
        if distinct < MIN_POLYGON_VERTICES {
            return Err(rejected(EditError::insufficient_points(
                "polygon",
                "distinct points",
                MIN_POLYGON_VERTICES,
                distinct,
            )));
        }

        self.commit(AnnotationAction::Polygon { key, points })
    }

    /// Draw a curve into `key`'s layer and record it.
    pub fn commit_curve(&mut self, key: EntityKey, stroke: CurveStroke) -> Result<(), EditError> {
        self.check_paintable(key)?;
        if stroke.control_points.len() < MIN_CURVE_POINTS {
            return Err(rejected(EditError::insufficient_points(
                "curve",
                "control points",
                MIN_CURVE_POINTS,
                stroke.control_points.len(),
            )));
        }

        self.commit(AnnotationAction::Curve { key, stroke })
    }

    /// Set a hand box and record it.
    pub fn commit_box(
        &mut self,
        person: PersonId,
        hand: HandSide,
        bbox: BoundingBox,
    ) -> Result<(), EditError> {
        self.check_person(person)?;
        self.commit(AnnotationAction::BboxSet { person, hand, bbox })
    }

    /// Clear the current layer.
    pub fn clear_current(&mut self) -> Result<(), EditError> {
        self.clear(self.current_key())
    }

    /// Clear one layer. Undo restores it.
    ///
    /// A layer that was never drawn into is left alone and nothing is
    /// recorded.
    pub fn clear(&mut self, key: EntityKey) -> Result<(), EditError> {
        self.check_paintable(key)?;
        if self.layers.get(&key).is_none() {
            log::debug!("Nothing to clear in {}", key);
            return Ok(());
        }
        let snapshot = self.layers.snapshot(&key)?;
        self.commit(AnnotationAction::ClearOne { key, snapshot })
    }

    /// Clear every layer. Boxes are kept. Undo restores all layers.
    pub fn clear_all(&mut self) -> Result<(), EditError> {
        self.layers.require_canvas()?;
        let snapshot = self.layers.snapshot_all();
        self.commit(AnnotationAction::ClearAll { snapshot })
    }

    /// Revert the most recent commit and return its description.
    pub fn undo(&mut self) -> Result<String, EditError> {
        match self.history.undo(&mut self.layers, &mut self.boxes) {
            Ok(description) => {
                log::info!("Undid '{}'", description);
                Ok(description)
            }
            Err(e) => Err(rejected(e)),
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// The mask layers.
    pub fn layers(&self) -> &MaskLayerStore {
        &self.layers
    }

    /// The hand boxes.
    pub fn boxes(&self) -> &BoundingBoxStore {
        &self.boxes
    }

    /// The committed actions.
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    /// Vertices of the polygon being drawn.
    pub fn pending_polygon(&self) -> &[Point] {
        &self.pending_polygon
    }

    /// The curve being edited. Control points can be moved in place.
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Mutable access to the curve being edited.
    pub fn curve_mut(&mut self) -> &mut Curve {
        &mut self.curve
    }

    /// The box being dragged out, if any.
    pub fn box_preview(&self) -> Option<BoundingBox> {
        self.box_drag.map(|drag| drag.preview())
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Export view over the current state.
    pub fn exporter(&self) -> AnnotationExporter<'_> {
        AnnotationExporter::new(&self.layers, &self.boxes)
    }

    /// Flatten the current state into export records.
    pub fn export_records(&self) -> Vec<ExportRecord> {
        self.exporter().records()
    }

    /// Write the current state as a COCO document.
    pub fn write_coco(
        &self,
        path: &Path,
        image_file_name: &str,
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        let canvas = self.layers.require_canvas()?;
        let image = ImageInfo::new(image_file_name, canvas);
        CocoFormat.export(&self.exporter(), &image, path, options)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn commit(&mut self, action: AnnotationAction) -> Result<(), EditError> {
        action.apply(&mut self.layers, &mut self.boxes)?;
        self.history.push(action);
        Ok(())
    }

    fn check_paintable(&self, key: EntityKey) -> Result<(), EditError> {
        self.layers.require_canvas()?;
        if key.category.is_hand() {
            return Err(rejected(EditError::NotPaintable(key.category)));
        }
        self.check_person(key.person)
    }

    fn check_person(&self, person: PersonId) -> Result<(), EditError> {
        if self.persons.contains(&person) {
            Ok(())
        } else {
            Err(rejected(EditError::UnknownPerson(person)))
        }
    }

    fn closes_polygon(&self, at: Point) -> bool {
        let Some(first) = self.pending_polygon.first() else {
            return false;
        };
        self.pending_polygon.len() >= MIN_POLYGON_VERTICES
            && (at.x - first.x).abs() < self.close_threshold
            && (at.y - first.y).abs() < self.close_threshold
    }

    fn discard_in_progress(&mut self) {
        self.pending_polygon.clear();
        self.curve.clear();
        self.box_drag = None;
    }
}

fn rejected(error: EditError) -> EditError {
    log::warn!("⚠️ {}", error);
    error
}

/// Number of distinct pixels among the polygon's vertices.
fn distinct_pixels(points: &[Point]) -> usize {
    let mut pixels: Vec<(i32, i32)> = points
        .iter()
        .map(|p| {
            let px = p.to_pixel();
            (px.x, px.y)
        })
        .collect();
    pixels.sort_unstable();
    pixels.dedup();
    pixels.len()
}
