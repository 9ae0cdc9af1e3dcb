//! COCO JSON writer.
//!
//! Wraps the export records of one image in a COCO dataset. Besides the
//! standard annotation fields every entry carries `person_id` and `hand`.

use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::format::error::FormatError;
use crate::format::export::{AnnotationExporter, ExportRecord};
use crate::format::options::{ExportOptions, ExportResult, FormatWarning};
use crate::model::{CanvasSize, Category, HandSide, PersonId};

const DESCRIPTION: &str = "Hand segmentation dataset";
const DATASET_VERSION: &str = "1.0";
const SUPERCATEGORY: &str = "hand";
const LICENSE_ID: u32 = 1;
const LICENSE_NAME: &str = "Attribution-NonCommercial";
const LICENSE_URL: &str = "http://creativecommons.org/licenses/by-nc/2.0/";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The annotated image, described at native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    /// Describe an image by file name and native size.
    pub fn new(file_name: impl Into<String>, size: CanvasSize) -> Self {
        Self {
            file_name: file_name.into(),
            width: size.width,
            height: size.height,
        }
    }
}

/// COCO JSON format.
///
/// Supports:
/// - Polygon regions (one annotation per outline)
/// - Hand bounding boxes (empty segmentation)
/// - Finger and hand categories under the "hand" supercategory
pub struct CocoFormat;

impl CocoFormat {
    /// Format identifier used in error messages.
    pub fn id(&self) -> &'static str {
        "coco"
    }

    /// Export to a file.
    pub fn export(
        &self,
        exporter: &AnnotationExporter<'_>,
        image: &ImageInfo,
        path: &Path,
        options: &ExportOptions,
    ) -> Result<ExportResult, FormatError> {
        log::info!("Exporting COCO annotations to {:?}", path);

        let (bytes, mut result) = self.export_to_bytes(exporter, image, options)?;
        std::fs::write(path, &bytes)?;
        result.files_created = vec![path.to_path_buf()];

        log::info!(
            "Exported {} annotations to {:?} ({} warnings)",
            result.annotations_exported(),
            path,
            result.warnings.len()
        );

        Ok(result)
    }

    /// Export to pretty-printed JSON bytes.
    pub fn export_to_bytes(
        &self,
        exporter: &AnnotationExporter<'_>,
        image: &ImageInfo,
        options: &ExportOptions,
    ) -> Result<(Vec<u8>, ExportResult), FormatError> {
        if image.width == 0 || image.height == 0 {
            return Err(FormatError::missing_dimensions(self.id(), &image.file_name));
        }

        let batch = exporter.collect();
        let mut result = ExportResult::new();
        for warning in batch.warnings {
            result.add_warning(warning);
        }
        if batch.records.is_empty() {
            result.add_warning(FormatWarning::info(format!(
                "No annotations for image '{}'",
                image.file_name
            )));
        }

        let coco = CocoDataset::build(&batch.records, image, options);
        result.regions_exported = batch.records.iter().filter(|r| r.is_region()).count();
        result.boxes_exported = batch.records.len() - result.regions_exported;

        let json = serde_json::to_string_pretty(&coco)?;
        Ok((json.into_bytes(), result))
    }
}

// COCO format structures

#[derive(Debug, Serialize, Deserialize)]
struct CocoDataset {
    info: CocoInfo,
    licenses: Vec<CocoLicense>,
    categories: Vec<CocoCategory>,
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
}

impl CocoDataset {
    fn build(records: &[ExportRecord], image: &ImageInfo, options: &ExportOptions) -> Self {
        let now = options.resolved_timestamp();
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();

        let categories = Category::all()
            .iter()
            .map(|c| CocoCategory {
                id: c.id(),
                name: c.name().to_string(),
                supercategory: SUPERCATEGORY.to_string(),
            })
            .collect();

        let annotations = records
            .iter()
            .zip(1u64..)
            .map(|(record, id)| CocoAnnotation {
                id,
                image_id: 1,
                category_id: record.category_id(),
                segmentation: record.segmentation(),
                area: record.area(),
                bbox: record.bbox(),
                iscrowd: 0,
                person_id: record.person_id(),
                hand: record.hand(),
            })
            .collect();

        Self {
            info: CocoInfo {
                description: DESCRIPTION.to_string(),
                url: String::new(),
                version: DATASET_VERSION.to_string(),
                year: now.year(),
                contributor: options.contributor.clone(),
                date_created: stamp.clone(),
            },
            licenses: vec![CocoLicense {
                id: LICENSE_ID,
                name: LICENSE_NAME.to_string(),
                url: LICENSE_URL.to_string(),
            }],
            categories,
            images: vec![CocoImage {
                id: 1,
                license: Some(LICENSE_ID),
                file_name: image.file_name.clone(),
                height: image.height,
                width: image.width,
                date_captured: stamp,
            }],
            annotations,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoInfo {
    description: String,
    url: String,
    version: String,
    year: i32,
    contributor: String,
    date_created: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoLicense {
    id: u32,
    name: String,
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u32,
    name: String,
    supercategory: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<u32>,
    file_name: String,
    height: u32,
    width: u32,
    date_captured: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u32,
    segmentation: Vec<Vec<f32>>,
    area: f32,
    bbox: [f32; 4],
    iscrowd: u8,
    person_id: PersonId,
    hand: HandSide,
}
