//! Annotation export.
//!
//! Mask layers and hand boxes are first flattened into [`ExportRecord`]s by
//! an [`AnnotationExporter`], then written out by a format.
//!
//! ## Supported Formats
//!
//! - **COCO JSON**: one image, polygon regions plus hand boxes, each tagged
//!   with `person_id` and `hand`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use handseg::format::{AnnotationExporter, CocoFormat, ExportOptions, ImageInfo};
//!
//! let exporter = AnnotationExporter::new(&layers, &boxes);
//! let image = ImageInfo::new("hands.jpg", canvas);
//! let result = CocoFormat.export(&exporter, &image, path, &ExportOptions::default())?;
//! ```

mod coco;
mod error;
mod export;
mod options;

pub use coco::{CocoFormat, ImageInfo};
pub use error::FormatError;
pub use export::{AnnotationExporter, BoxRecord, ExportBatch, ExportRecord, RegionRecord};
pub use options::{ExportOptions, ExportResult, FormatWarning, WarningSeverity};
