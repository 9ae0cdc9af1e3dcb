//! Error types for editing operations.
//!
//! Every failure here is recoverable: the operation is a no-op and the
//! caller reports the message.

use thiserror::Error;

use crate::model::{CanvasSize, Category, PersonId};

/// Errors that can occur while editing annotations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// No canvas size is known yet
    #[error("No image loaded")]
    NoImage,

    /// A shape was completed with too few points
    #[error("Need at least {required} {what} to create a {shape}, got {found}")]
    InsufficientPoints {
        /// Shape being completed ("polygon", "curve")
        shape: &'static str,
        /// What was counted ("points", "distinct points", "control points")
        what: &'static str,
        /// Minimum required
        required: usize,
        /// Number provided
        found: usize,
    },

    /// Control point index does not exist
    #[error("Control point index {index} out of range (have {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of control points
        len: usize,
    },

    /// History is empty
    #[error("Nothing to undo")]
    NothingToUndo,

    /// A mask does not match the canvas
    #[error("Mask is {found} but canvas is {expected}")]
    DimensionMismatch {
        /// Current canvas size
        expected: CanvasSize,
        /// Size of the offending mask
        found: CanvasSize,
    },

    /// Person id was never assigned
    #[error("Unknown person {0}")]
    UnknownPerson(PersonId),

    /// Hand categories label boxes and have no mask layer
    #[error("Category '{}' labels hand boxes and cannot be painted", .0.name())]
    NotPaintable(Category),
}

impl EditError {
    /// Create an insufficient points error.
    pub fn insufficient_points(
        shape: &'static str,
        what: &'static str,
        required: usize,
        found: usize,
    ) -> Self {
        Self::InsufficientPoints {
            shape,
            what,
            required,
            found,
        }
    }

    /// Create an out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
