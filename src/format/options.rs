//! Export options and results.

use std::path::PathBuf;

use chrono::NaiveDateTime;

/// Options for export operations.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Creation time written into the document; the current local time if unset.
    pub timestamp: Option<NaiveDateTime>,

    /// Contributor recorded in the dataset info.
    pub contributor: String,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed creation time.
    pub fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the contributor.
    pub fn contributor(mut self, contributor: impl Into<String>) -> Self {
        self.contributor = contributor.into();
        self
    }

    /// The fixed timestamp, or the current local time.
    pub(crate) fn resolved_timestamp(&self) -> NaiveDateTime {
        self.timestamp
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Number of region annotations exported.
    pub regions_exported: usize,

    /// Number of bounding box annotations exported.
    pub boxes_exported: usize,

    /// Warnings generated during export.
    pub warnings: Vec<FormatWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    /// Create a new export result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of annotations exported.
    pub fn annotations_exported(&self) -> usize {
        self.regions_exported + self.boxes_exported
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Warning generated during export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatWarning {
    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }
}

/// Severity level for format warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Something was skipped or derived.
    Warning,
}
