//! Region rasterization.
//!
//! Turns polylines and closed polygons into binary masks (0 or 255) of the
//! caller-supplied canvas size. Geometry outside the canvas is clipped.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as RasterPoint;

use crate::constants::MASK_ON;
use crate::model::{CanvasSize, PixelPoint, Point};

/// Single-channel binary mask.
pub type Mask = GrayImage;

/// An all-zero mask covering the canvas.
pub fn empty_mask(canvas: CanvasSize) -> Mask {
    GrayImage::new(canvas.width, canvas.height)
}

/// Size of an existing mask.
pub fn mask_size(mask: &Mask) -> CanvasSize {
    CanvasSize::new(mask.width(), mask.height())
}

/// Whether no pixel of the mask is set.
pub fn is_blank(mask: &Mask) -> bool {
    mask.as_raw().iter().all(|&v| v == 0)
}

/// Number of covered pixels.
pub fn coverage(mask: &Mask) -> usize {
    mask.as_raw().iter().filter(|&&v| v != 0).count()
}

/// Pixel-wise max of `src` into `dst`. Both masks must have the same size.
pub fn union_in_place(dst: &mut Mask, src: &Mask) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        d[0] = d[0].max(s[0]);
    }
}

/// Draw connected line segments with the given stroke width.
///
/// Segments are drawn as quads with round joins. Fewer than two points
/// produce an empty mask.
pub fn rasterize_polyline(canvas: CanvasSize, points: &[PixelPoint], width: u32) -> Mask {
    let mut mask = empty_mask(canvas);
    if points.len() < 2 {
        return mask;
    }

    let width = width.max(1);
    for pair in points.windows(2) {
        stroke_segment(&mut mask, pair[0], pair[1], width);
    }
    mask
}

/// Fill the polygon described by `points`, closing it if needed.
///
/// Fewer than three points produce an empty mask.
pub fn rasterize_closed(canvas: CanvasSize, points: &[PixelPoint], fill: u8) -> Mask {
    let mut mask = empty_mask(canvas);
    if points.len() < 3 {
        return mask;
    }

    let ring: Vec<RasterPoint<i32>> = points.iter().map(|&p| p.into()).collect();
    fill_ring(&mut mask, &ring, Luma([fill]));
    mask
}

/// Fill a user-drawn polygon.
pub fn rasterize_polygon(canvas: CanvasSize, points: &[Point]) -> Mask {
    let pixels: Vec<PixelPoint> = points.iter().map(|p| p.to_pixel()).collect();
    rasterize_closed(canvas, &pixels, MASK_ON)
}

/// Trace the outer boundaries of a mask into flat `[x0, y0, x1, y1, ...]`
/// polygons.
///
/// Contours longer than `max_points` are subsampled with a uniform stride.
/// Boundaries with fewer than three points (single pixels) are dropped.
pub fn trace_outlines(mask: &Mask, max_points: usize) -> Vec<Vec<f32>> {
    let max_points = max_points.max(1);

    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .filter(|contour| contour.points.len() >= 3)
        .map(|contour| {
            let stride = if contour.points.len() > max_points {
                contour.points.len() / max_points + 1
            } else {
                1
            };
            contour
                .points
                .iter()
                .step_by(stride)
                .flat_map(|p| [p.x as f32, p.y as f32])
                .collect()
        })
        .collect()
}

/// Flatten a ring of points into `[x0, y0, ...]`, repeating the first point
/// at the end if the ring is open.
pub fn closed_outline<I>(points: I) -> Vec<f32>
where
    I: IntoIterator<Item = (f32, f32)>,
{
    let ring: Vec<(f32, f32)> = points.into_iter().collect();
    let mut flat: Vec<f32> = ring.iter().flat_map(|&(x, y)| [x, y]).collect();
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first != last => {
            flat.extend([first.0, first.1]);
        }
        _ => {}
    }
    flat
}

fn stroke_segment(mask: &mut Mask, a: PixelPoint, b: PixelPoint, width: u32) {
    let color = Luma([MASK_ON]);

    if width == 1 {
        draw_line_segment_mut(
            mask,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        );
        return;
    }

    let half = width as f32 / 2.0;
    let dx = b.x as f32 - a.x as f32;
    let dy = b.y as f32 - a.y as f32;
    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 {
        let nx = -dy / len * half;
        let ny = dx / len * half;
        let quad = [
            offset(a, nx, ny),
            offset(b, nx, ny),
            offset(b, -nx, -ny),
            offset(a, -nx, -ny),
        ];
        fill_ring(mask, &quad, color);
    }

    let radius = (width / 2) as i32;
    draw_filled_circle_mut(mask, (a.x, a.y), radius, color);
    draw_filled_circle_mut(mask, (b.x, b.y), radius, color);
}

fn offset(p: PixelPoint, dx: f32, dy: f32) -> RasterPoint<i32> {
    RasterPoint::new(
        (p.x as f32 + dx).round() as i32,
        (p.y as f32 + dy).round() as i32,
    )
}

/// Fill a ring, tolerating repeated vertices and an explicit closing point.
fn fill_ring(mask: &mut Mask, ring: &[RasterPoint<i32>], color: Luma<u8>) {
    let mut vertices: Vec<RasterPoint<i32>> = Vec::with_capacity(ring.len());
    for &p in ring {
        if vertices.last() != Some(&p) {
            vertices.push(p);
        }
    }
    // draw_polygon_mut rejects rings whose first and last points coincide
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    match vertices.as_slice() {
        [] => {}
        [p] => {
            if mask_size(mask).contains(PixelPoint::new(p.x, p.y)) {
                mask.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        [a, b] => {
            draw_line_segment_mut(mask, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), color);
        }
        _ => draw_polygon_mut(mask, &vertices, color),
    }
}
