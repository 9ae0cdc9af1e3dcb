//! Layered raster mask storage.
//!
//! One [`MaskLayer`] per [`EntityKey`], held in a single flat map. Layers are
//! created lazily once a canvas size is known, and every buffer has exactly
//! the canvas dimensions.

use std::collections::{BTreeMap, HashMap};

use crate::error::EditError;
use crate::model::{CanvasSize, EntityKey};
use crate::raster::{self, Mask};

/// Mask and region outlines for one entity key.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskLayer {
    mask: Mask,
    /// Flat `[x0, y0, x1, y1, ...]` outline of every composed region
    outlines: Vec<Vec<f32>>,
}

impl MaskLayer {
    /// An all-zero layer covering the canvas.
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            mask: raster::empty_mask(canvas),
            outlines: Vec::new(),
        }
    }

    /// The binary mask.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Outlines of every composed region.
    pub fn outlines(&self) -> &[Vec<f32>] {
        &self.outlines
    }

    /// Mask dimensions.
    pub fn size(&self) -> CanvasSize {
        raster::mask_size(&self.mask)
    }

    /// Whether no pixel is set.
    pub fn is_blank(&self) -> bool {
        raster::is_blank(&self.mask)
    }

    /// Number of covered pixels.
    pub fn coverage(&self) -> usize {
        raster::coverage(&self.mask)
    }

    /// Union a region into the mask and remember its outlines.
    ///
    /// The region must have the layer's dimensions.
    pub fn compose(&mut self, region: &Mask, outlines: Vec<Vec<f32>>) -> Result<(), EditError> {
        self.union(region)?;
        self.outlines
            .extend(outlines.into_iter().filter(|outline| !outline.is_empty()));
        Ok(())
    }

    /// Pixel-wise OR of `region` into the mask.
    pub fn union(&mut self, region: &Mask) -> Result<(), EditError> {
        let found = raster::mask_size(region);
        if found != self.size() {
            return Err(EditError::DimensionMismatch {
                expected: self.size(),
                found,
            });
        }
        raster::union_in_place(&mut self.mask, region);
        Ok(())
    }
}

/// A copy of every layer, ordered by key.
pub type LayerSnapshot = BTreeMap<EntityKey, MaskLayer>;

/// Owner of all mask layers.
#[derive(Debug, Clone, Default)]
pub struct MaskLayerStore {
    canvas: Option<CanvasSize>,
    layers: HashMap<EntityKey, MaskLayer>,
}

impl MaskLayerStore {
    /// Create a store with no canvas. Every buffer operation fails with
    /// [`EditError::NoImage`] until [`set_canvas`](Self::set_canvas) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store for a known canvas.
    pub fn with_canvas(canvas: CanvasSize) -> Self {
        Self {
            canvas: Some(canvas),
            layers: HashMap::new(),
        }
    }

    /// Switch to a new canvas, dropping every layer.
    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        log::debug!(
            "Mask store reset for {} canvas ({} layers dropped)",
            canvas,
            self.layers.len()
        );
        self.canvas = Some(canvas);
        self.layers.clear();
    }

    /// The canvas size, if one is set.
    pub fn canvas(&self) -> Option<CanvasSize> {
        self.canvas
    }

    /// The canvas size, or [`EditError::NoImage`].
    pub fn require_canvas(&self) -> Result<CanvasSize, EditError> {
        self.canvas.ok_or(EditError::NoImage)
    }

    /// Get a layer, creating an all-zero one on first access.
    pub fn get_or_create(&mut self, key: EntityKey) -> Result<&mut MaskLayer, EditError> {
        let canvas = self.require_canvas()?;
        Ok(self
            .layers
            .entry(key)
            .or_insert_with(|| MaskLayer::new(canvas)))
    }

    /// A layer, if it was ever created.
    pub fn get(&self, key: &EntityKey) -> Option<&MaskLayer> {
        self.layers.get(key)
    }

    /// Union a region into a layer.
    pub fn union_into(&mut self, key: EntityKey, region: &Mask) -> Result<(), EditError> {
        self.get_or_create(key)?.union(region)
    }

    /// Union a region into a layer and record its outlines.
    pub fn add_region(
        &mut self,
        key: EntityKey,
        region: &Mask,
        outlines: Vec<Vec<f32>>,
    ) -> Result<(), EditError> {
        self.get_or_create(key)?.compose(region, outlines)
    }

    /// Replace a layer with a fresh all-zero buffer.
    pub fn reset(&mut self, key: EntityKey) -> Result<(), EditError> {
        let canvas = self.require_canvas()?;
        self.layers.insert(key, MaskLayer::new(canvas));
        Ok(())
    }

    /// Reset every existing layer.
    pub fn reset_all(&mut self) -> Result<(), EditError> {
        let canvas = self.require_canvas()?;
        for layer in self.layers.values_mut() {
            *layer = MaskLayer::new(canvas);
        }
        Ok(())
    }

    /// Copy of a layer; a layer never touched snapshots as all-zero.
    pub fn snapshot(&self, key: &EntityKey) -> Result<MaskLayer, EditError> {
        let canvas = self.require_canvas()?;
        Ok(self
            .layers
            .get(key)
            .cloned()
            .unwrap_or_else(|| MaskLayer::new(canvas)))
    }

    /// Put a layer back, replacing the current one.
    pub fn restore(&mut self, key: EntityKey, layer: MaskLayer) -> Result<(), EditError> {
        let canvas = self.require_canvas()?;
        if layer.size() != canvas {
            return Err(EditError::DimensionMismatch {
                expected: canvas,
                found: layer.size(),
            });
        }
        self.layers.insert(key, layer);
        Ok(())
    }

    /// Copy of every layer.
    pub fn snapshot_all(&self) -> LayerSnapshot {
        self.layers
            .iter()
            .map(|(key, layer)| (*key, layer.clone()))
            .collect()
    }

    /// Replace the whole layer set with a snapshot.
    pub fn restore_all(&mut self, snapshot: LayerSnapshot) -> Result<(), EditError> {
        let canvas = self.require_canvas()?;
        if let Some(layer) = snapshot.values().find(|layer| layer.size() != canvas) {
            return Err(EditError::DimensionMismatch {
                expected: canvas,
                found: layer.size(),
            });
        }
        self.layers = snapshot.into_iter().collect();
        Ok(())
    }

    /// Layers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &MaskLayer)> + '_ {
        self.layers.iter().map(|(key, layer)| (*key, layer))
    }

    /// Layers in key order.
    pub fn iter_sorted(&self) -> Vec<(EntityKey, &MaskLayer)> {
        let mut entries: Vec<(EntityKey, &MaskLayer)> = self.iter().collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Number of layers created so far.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer exists.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, HandSide, PersonId, PixelPoint};
    use crate::raster::rasterize_closed;

    const CANVAS: CanvasSize = CanvasSize {
        width: 64,
        height: 48,
    };

    fn key(category: Category) -> EntityKey {
        EntityKey::new(PersonId(1), HandSide::Left, category)
    }

    fn square(x0: i32, y0: i32, x1: i32, y1: i32) -> Mask {
        let ring = [
            PixelPoint::new(x0, y0),
            PixelPoint::new(x1, y0),
            PixelPoint::new(x1, y1),
            PixelPoint::new(x0, y1),
        ];
        rasterize_closed(CANVAS, &ring, 255)
    }

    #[test]
    fn test_no_canvas_reports_no_image() {
        let mut store = MaskLayerStore::new();
        assert_eq!(store.get_or_create(key(Category::Thumb)).err(), Some(EditError::NoImage));
        assert_eq!(store.reset(key(Category::Thumb)), Err(EditError::NoImage));
        assert!(store.is_empty());
    }

    #[test]
    fn test_lazy_creation() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        assert!(store.get(&key(Category::Index)).is_none());

        let layer = store.get_or_create(key(Category::Index)).unwrap();
        assert_eq!(layer.size(), CANVAS);
        assert!(layer.is_blank());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_union_is_idempotent() {
        let region = square(5, 5, 20, 20);
        let mut once = MaskLayerStore::with_canvas(CANVAS);
        once.union_into(key(Category::Thumb), &region).unwrap();

        let mut twice = MaskLayerStore::with_canvas(CANVAS);
        twice.union_into(key(Category::Thumb), &region).unwrap();
        twice.union_into(key(Category::Thumb), &region).unwrap();

        assert_eq!(
            once.get(&key(Category::Thumb)).unwrap().mask(),
            twice.get(&key(Category::Thumb)).unwrap().mask()
        );
    }

    #[test]
    fn test_union_is_commutative() {
        let a = square(5, 5, 30, 30);
        let b = square(20, 10, 60, 40);

        let mut ab = MaskLayerStore::with_canvas(CANVAS);
        ab.union_into(key(Category::Ring), &a).unwrap();
        ab.union_into(key(Category::Ring), &b).unwrap();

        let mut ba = MaskLayerStore::with_canvas(CANVAS);
        ba.union_into(key(Category::Ring), &b).unwrap();
        ba.union_into(key(Category::Ring), &a).unwrap();

        let ab = ab.get(&key(Category::Ring)).unwrap();
        let ba = ba.get(&key(Category::Ring)).unwrap();
        assert_eq!(ab.mask(), ba.mask());
        assert!(ab.coverage() > 0);
    }

    #[test]
    fn test_layers_are_isolated() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        store.union_into(key(Category::Thumb), &square(1, 1, 10, 10)).unwrap();
        store.get_or_create(key(Category::Palm)).unwrap();

        assert!(!store.get(&key(Category::Thumb)).unwrap().is_blank());
        assert!(store.get(&key(Category::Palm)).unwrap().is_blank());

        let other_hand = EntityKey::new(PersonId(1), HandSide::Right, Category::Thumb);
        assert!(store.get(&other_hand).is_none());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        let wrong = raster::empty_mask(CanvasSize::new(10, 10));
        assert_eq!(
            store.union_into(key(Category::Thumb), &wrong),
            Err(EditError::DimensionMismatch {
                expected: CANVAS,
                found: CanvasSize::new(10, 10),
            })
        );
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        store
            .add_region(
                key(Category::Middle),
                &square(2, 2, 12, 12),
                vec![vec![2.0, 2.0, 12.0, 2.0, 12.0, 12.0]],
            )
            .unwrap();

        let saved = store.snapshot(&key(Category::Middle)).unwrap();
        store.reset(key(Category::Middle)).unwrap();
        assert!(store.get(&key(Category::Middle)).unwrap().is_blank());
        assert!(store.get(&key(Category::Middle)).unwrap().outlines().is_empty());

        store.restore(key(Category::Middle), saved.clone()).unwrap();
        assert_eq!(store.get(&key(Category::Middle)).unwrap(), &saved);
        assert_eq!(saved.outlines().len(), 1);
    }

    #[test]
    fn test_snapshot_of_untouched_key_is_blank() {
        let store = MaskLayerStore::with_canvas(CANVAS);
        let snap = store.snapshot(&key(Category::Pinky)).unwrap();
        assert!(snap.is_blank());
        assert_eq!(snap.size(), CANVAS);
    }

    #[test]
    fn test_reset_all_and_restore_all() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        store.union_into(key(Category::Thumb), &square(1, 1, 10, 10)).unwrap();
        store.union_into(key(Category::Index), &square(20, 20, 30, 30)).unwrap();

        let snapshot = store.snapshot_all();
        store.reset_all().unwrap();
        assert!(store.iter_sorted().iter().all(|(_, layer)| layer.is_blank()));
        assert_eq!(store.len(), 2);

        store.restore_all(snapshot.clone()).unwrap();
        assert_eq!(store.snapshot_all(), snapshot);
    }

    #[test]
    fn test_set_canvas_drops_layers() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        store.get_or_create(key(Category::Thumb)).unwrap();
        store.set_canvas(CanvasSize::new(8, 8));
        assert!(store.is_empty());
        assert_eq!(store.canvas(), Some(CanvasSize::new(8, 8)));
    }

    #[test]
    fn test_iter_sorted_orders_by_key() {
        let mut store = MaskLayerStore::with_canvas(CANVAS);
        let late = EntityKey::new(PersonId(2), HandSide::Left, Category::Thumb);
        store.get_or_create(late).unwrap();
        store.get_or_create(key(Category::Palm)).unwrap();
        store.get_or_create(key(Category::Thumb)).unwrap();

        let keys: Vec<EntityKey> = store.iter_sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![key(Category::Thumb), key(Category::Palm), late]);
        assert_eq!(store.iter().count(), 3);
    }
}
