//! Data models for the segmentation engine.

mod category;
mod geometry;
mod key;
mod tool;

pub use category::Category;
pub use geometry::{BoundingBox, CanvasSize, PixelPoint, Point};
pub use key::{EntityKey, HandSide, PersonId};
pub use tool::DrawMode;
