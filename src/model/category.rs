//! Fixed finger and hand categories.

use serde::{Deserialize, Serialize};

use super::key::HandSide;

/// An annotation category.
///
/// The six finger/palm categories own mask layers; the two hand categories
/// label per-hand bounding boxes. Ids are stable and match the exported
/// category table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
    Palm,
    LeftHand,
    RightHand,
}

impl Category {
    /// Get all categories in id order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Thumb,
            Category::Index,
            Category::Middle,
            Category::Ring,
            Category::Pinky,
            Category::Palm,
            Category::LeftHand,
            Category::RightHand,
        ]
    }

    /// Stable id used in exports.
    pub fn id(self) -> u32 {
        match self {
            Category::Thumb => 1,
            Category::Index => 2,
            Category::Middle => 3,
            Category::Ring => 4,
            Category::Pinky => 5,
            Category::Palm => 6,
            Category::LeftHand => 7,
            Category::RightHand => 8,
        }
    }

    /// Lowercase name used in exports and scripts.
    pub fn name(self) -> &'static str {
        match self {
            Category::Thumb => "thumb",
            Category::Index => "index",
            Category::Middle => "middle",
            Category::Ring => "ring",
            Category::Pinky => "pinky",
            Category::Palm => "palm",
            Category::LeftHand => "left_hand",
            Category::RightHand => "right_hand",
        }
    }

    /// RGB display color.
    pub fn color(self) -> [u8; 3] {
        match self {
            Category::Thumb => [255, 0, 0],
            Category::Index => [0, 255, 0],
            Category::Middle => [0, 0, 255],
            Category::Ring => [255, 255, 0],
            Category::Pinky => [255, 0, 255],
            Category::Palm => [0, 255, 255],
            Category::LeftHand => [255, 128, 0],
            Category::RightHand => [0, 128, 255],
        }
    }

    /// Whether this category labels a hand box.
    pub fn is_hand(self) -> bool {
        matches!(self, Category::LeftHand | Category::RightHand)
    }

    /// The box category for a hand side.
    pub fn for_hand(hand: HandSide) -> Self {
        match hand {
            HandSide::Left => Category::LeftHand,
            HandSide::Right => Category::RightHand,
        }
    }
}
