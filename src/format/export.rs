//! Flattening layers and boxes into export records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBoxStore;
use crate::constants::MAX_CONTOUR_POINTS;
use crate::format::options::FormatWarning;
use crate::layers::{MaskLayer, MaskLayerStore};
use crate::model::{BoundingBox, Category, EntityKey, HandSide, PersonId};
use crate::raster;

/// One outline of a mask layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub category_id: u32,
    /// Flat `[x0, y0, x1, y1, ...]`
    pub polygon: Vec<f32>,
    /// `[x_min, y_min, width, height]`
    pub bbox: [f32; 4],
    pub area: f32,
    pub person_id: PersonId,
    pub hand: HandSide,
}

/// A hand bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxRecord {
    /// Id of the hand category
    pub category_id: u32,
    /// `[x1, y1, width, height]`
    pub bbox: [f32; 4],
    pub area: f32,
    pub person_id: PersonId,
    pub hand: HandSide,
}

/// A flat, serializable annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportRecord {
    Region(RegionRecord),
    BoundingBox(BoxRecord),
}

impl ExportRecord {
    /// Category id of the record.
    pub fn category_id(&self) -> u32 {
        match self {
            ExportRecord::Region(r) => r.category_id,
            ExportRecord::BoundingBox(b) => b.category_id,
        }
    }

    /// `[x, y, width, height]` of the record.
    pub fn bbox(&self) -> [f32; 4] {
        match self {
            ExportRecord::Region(r) => r.bbox,
            ExportRecord::BoundingBox(b) => b.bbox,
        }
    }

    /// Area written to the export.
    pub fn area(&self) -> f32 {
        match self {
            ExportRecord::Region(r) => r.area,
            ExportRecord::BoundingBox(b) => b.area,
        }
    }

    /// Person the record belongs to.
    pub fn person_id(&self) -> PersonId {
        match self {
            ExportRecord::Region(r) => r.person_id,
            ExportRecord::BoundingBox(b) => b.person_id,
        }
    }

    /// Hand the record belongs to.
    pub fn hand(&self) -> HandSide {
        match self {
            ExportRecord::Region(r) => r.hand,
            ExportRecord::BoundingBox(b) => b.hand,
        }
    }

    /// Polygon list in COCO layout; boxes have none.
    pub fn segmentation(&self) -> Vec<Vec<f32>> {
        match self {
            ExportRecord::Region(r) => vec![r.polygon.clone()],
            ExportRecord::BoundingBox(_) => Vec::new(),
        }
    }

    /// Whether this is a mask region rather than a box.
    pub fn is_region(&self) -> bool {
        matches!(self, ExportRecord::Region(_))
    }
}

/// Records produced by an export pass.
#[derive(Debug, Clone, Default)]
pub struct ExportBatch {
    pub records: Vec<ExportRecord>,
    pub warnings: Vec<FormatWarning>,
}

/// Read-only view over the editing state that produces export records.
///
/// Order is persons ascending; per person, every mask layer in (hand,
/// category) order, then that person's boxes, left hand first.
pub struct AnnotationExporter<'a> {
    layers: &'a MaskLayerStore,
    boxes: &'a BoundingBoxStore,
}

impl<'a> AnnotationExporter<'a> {
    /// Export view over the given stores.
    pub fn new(layers: &'a MaskLayerStore, boxes: &'a BoundingBoxStore) -> Self {
        Self { layers, boxes }
    }

    /// All records, in export order.
    pub fn records(&self) -> Vec<ExportRecord> {
        self.collect().records
    }

    /// All records plus warnings about layers whose outlines had to be
    /// traced from the mask.
    pub fn collect(&self) -> ExportBatch {
        let layers = self.layers.iter_sorted();
        let mut persons: BTreeSet<PersonId> = layers.iter().map(|(key, _)| key.person).collect();
        persons.extend(self.boxes.iter().map(|(person, _, _)| person));

        let mut batch = ExportBatch::default();
        for person in persons {
            for (key, layer) in layers.iter().filter(|(key, _)| key.person == person) {
                let outlines = match layer_outlines(*key, layer) {
                    Outlines::Recorded(outlines) => outlines.to_vec(),
                    Outlines::Traced(outlines) => {
                        batch.warnings.push(FormatWarning::warning(format!(
                            "{} has no recorded outlines; traced {} from its mask",
                            key,
                            outlines.len()
                        )));
                        outlines
                    }
                };
                batch.records.extend(
                    outlines
                        .into_iter()
                        .filter_map(|polygon| region_record(*key, polygon))
                        .map(ExportRecord::Region),
                );
            }

            for (hand, bbox) in self.boxes.for_person(person) {
                batch
                    .records
                    .push(ExportRecord::BoundingBox(box_record(person, hand, bbox)));
            }
        }
        batch
    }
}

enum Outlines<'l> {
    Recorded(&'l [Vec<f32>]),
    Traced(Vec<Vec<f32>>),
}

fn layer_outlines(key: EntityKey, layer: &MaskLayer) -> Outlines<'_> {
    if !layer.outlines().is_empty() || layer.is_blank() {
        return Outlines::Recorded(layer.outlines());
    }
    log::warn!("⚠️ {} has pixels but no outlines, tracing contours", key);
    Outlines::Traced(raster::trace_outlines(layer.mask(), MAX_CONTOUR_POINTS))
}

fn region_record(key: EntityKey, polygon: Vec<f32>) -> Option<RegionRecord> {
    let bbox = polygon_bbox(&polygon)?;
    Some(RegionRecord {
        category_id: key.category.id(),
        polygon,
        bbox,
        area: bbox[2] * bbox[3],
        person_id: key.person,
        hand: key.hand,
    })
}

fn box_record(person: PersonId, hand: HandSide, bbox: BoundingBox) -> BoxRecord {
    BoxRecord {
        category_id: Category::for_hand(hand).id(),
        bbox: bbox.to_xywh(),
        area: bbox.area(),
        person_id: person,
        hand,
    }
}

/// Bounding box `[x, y, w, h]` of a flat polygon.
fn polygon_bbox(flat: &[f32]) -> Option<[f32; 4]> {
    if flat.len() < 2 {
        return None;
    }

    let xs = flat.iter().step_by(2);
    let ys = flat.iter().skip(1).step_by(2);
    let min_x = xs.clone().copied().fold(f32::MAX, f32::min);
    let max_x = xs.copied().fold(f32::MIN, f32::max);
    let min_y = ys.clone().copied().fold(f32::MAX, f32::min);
    let max_y = ys.copied().fold(f32::MIN, f32::max);

    Some([min_x, min_y, max_x - min_x, max_y - min_y])
}
