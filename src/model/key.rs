//! Entity keys identifying independently owned mask layers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::Category;

/// Identifier of an annotated person. Assigned from 1 upward and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u32);

impl PersonId {
    pub const FIRST: PersonId = PersonId(1);

    /// The id after this one.
    pub fn next(self) -> Self {
        PersonId(self.0 + 1)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which hand of a person.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    #[default]
    Left,
    Right,
}

impl HandSide {
    /// Lowercase name used in exports.
    pub fn name(self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The (person, hand, category) triple owning one mask layer.
///
/// Ordering is person, then hand, then category id, which is also the export
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub person: PersonId,
    pub hand: HandSide,
    pub category: Category,
}

impl EntityKey {
    /// Key for one person, hand and category.
    pub fn new(person: PersonId, hand: HandSide, category: Category) -> Self {
        Self {
            person,
            hand,
            category,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} hand, person {})",
            self.category.name(),
            self.hand,
            self.person
        )
    }
}
