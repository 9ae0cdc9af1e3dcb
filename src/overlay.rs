//! Color previews of the annotation state.
//!
//! Every non-empty layer is blended over the image in its category color,
//! then hand boxes are outlined in their hand color.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::bbox::BoundingBoxStore;
use crate::constants::OVERLAY_ALPHA;
use crate::error::EditError;
use crate::layers::MaskLayerStore;
use crate::model::{BoundingBox, CanvasSize, Category};
use crate::raster;

/// Outline thickness of hand boxes, in pixels.
const BOX_THICKNESS: i32 = 2;

/// Composite layers and boxes over `base`.
///
/// `base` must have the canvas dimensions.
pub fn render_overlay(
    base: &RgbImage,
    layers: &MaskLayerStore,
    boxes: &BoundingBoxStore,
) -> Result<RgbImage, EditError> {
    let canvas = layers.require_canvas()?;
    let found = CanvasSize::new(base.width(), base.height());
    if found != canvas {
        return Err(EditError::DimensionMismatch {
            expected: canvas,
            found,
        });
    }

    let mut out = base.clone();
    for (key, layer) in layers.iter_sorted() {
        if layer.is_blank() {
            continue;
        }
        let color = key.category.color();
        for (dst, src) in out.pixels_mut().zip(layer.mask().pixels()) {
            if src[0] != 0 {
                *dst = blend(*dst, color, OVERLAY_ALPHA);
            }
        }
    }

    for (_, hand, bbox) in boxes.iter() {
        outline_box(&mut out, bbox, Rgb(Category::for_hand(hand).color()));
    }

    Ok(out)
}

/// Composite over a black canvas, for when the image itself is unavailable.
pub fn render_on_blank(
    layers: &MaskLayerStore,
    boxes: &BoundingBoxStore,
) -> Result<RgbImage, EditError> {
    let canvas = layers.require_canvas()?;
    render_overlay(&RgbImage::new(canvas.width, canvas.height), layers, boxes)
}

fn blend(base: Rgb<u8>, color: [u8; 3], alpha: u8) -> Rgb<u8> {
    let a = u16::from(alpha);
    let mix = |b: u8, c: u8| ((u16::from(b) * (255 - a) + u16::from(c) * a + 127) / 255) as u8;
    Rgb([
        mix(base[0], color[0]),
        mix(base[1], color[1]),
        mix(base[2], color[2]),
    ])
}

fn outline_box(image: &mut RgbImage, bbox: BoundingBox, color: Rgb<u8>) {
    for inset in 0..BOX_THICKNESS {
        let x = bbox.x1 as i32 + inset;
        let y = bbox.y1 as i32 + inset;
        let width = (bbox.width() as i32 - 2 * inset).max(1) as u32;
        let height = (bbox.height() as i32 - 2 * inset).max(1) as u32;
        draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), color);
    }
}

/// Fraction of the canvas covered by any layer.
pub fn coverage_ratio(layers: &MaskLayerStore) -> f32 {
    let Some(canvas) = layers.canvas() else {
        return 0.0;
    };
    let total = canvas.width as usize * canvas.height as usize;
    if total == 0 {
        return 0.0;
    }

    let mut covered = raster::empty_mask(canvas);
    for (_, layer) in layers.iter() {
        raster::union_in_place(&mut covered, layer.mask());
    }
    raster::coverage(&covered) as f32 / total as f32
}
