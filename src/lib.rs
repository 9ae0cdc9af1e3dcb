//! handseg - Hand Segmentation Annotation Engine
//!
//! Per-entity binary masks for hands and fingers, built from polygons and
//! Catmull-Rom curves, with hand bounding boxes, a replayable undo history
//! and COCO export.
//!
//! Every mask layer is keyed by person, hand side and category. The
//! [`Session`] ties the pieces together the way an interactive front end
//! drives them: select an entity, draw, commit, undo, export.

pub mod bbox;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod format;
pub mod layers;
pub mod model;
pub mod overlay;
pub mod raster;
pub mod script;
pub mod session;
pub mod undo;

pub use bbox::{BoundingBoxStore, BoxDrag};
pub use config::{ConfigError, ToolConfig};
pub use curve::Curve;
pub use error::EditError;
pub use layers::{MaskLayer, MaskLayerStore};
pub use session::Session;
pub use undo::{ActionHistory, AnnotationAction};
