//! Per-hand bounding boxes.

use std::collections::BTreeMap;

use crate::model::{BoundingBox, HandSide, PersonId, Point};

/// At most one box per (person, hand).
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxStore {
    boxes: BTreeMap<(PersonId, HandSide), BoundingBox>,
}

impl BoundingBoxStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a box, returning the one it replaced.
    pub fn set(&mut self, person: PersonId, hand: HandSide, bbox: BoundingBox) -> Option<BoundingBox> {
        self.boxes.insert((person, hand), bbox)
    }

    /// The box of one hand, if set.
    pub fn get(&self, person: PersonId, hand: HandSide) -> Option<BoundingBox> {
        self.boxes.get(&(person, hand)).copied()
    }

    /// Remove a box, returning it if one was set.
    pub fn clear(&mut self, person: PersonId, hand: HandSide) -> Option<BoundingBox> {
        self.boxes.remove(&(person, hand))
    }

    /// Remove every box.
    pub fn clear_all(&mut self) {
        self.boxes.clear();
    }

    /// Boxes in (person, hand) order.
    pub fn iter(&self) -> impl Iterator<Item = (PersonId, HandSide, BoundingBox)> + '_ {
        self.boxes
            .iter()
            .map(|(&(person, hand), &bbox)| (person, hand, bbox))
    }

    /// Boxes of one person, left hand first.
    pub fn for_person(&self, person: PersonId) -> Vec<(HandSide, BoundingBox)> {
        self.iter()
            .filter(|(p, _, _)| *p == person)
            .map(|(_, hand, bbox)| (hand, bbox))
            .collect()
    }

    /// Number of stored boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether no box is stored.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// A box being dragged out; not stored until finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDrag {
    start: Point,
    current: Point,
}

impl BoxDrag {
    /// Begin a drag at the press point.
    pub fn start(at: Point) -> Self {
        Self {
            start: at,
            current: at,
        }
    }

    /// Move the free corner.
    pub fn update(&mut self, to: Point) {
        self.current = to;
    }

    /// The normalized box spanned so far.
    pub fn preview(&self) -> BoundingBox {
        BoundingBox::from_corners(self.start, self.current)
    }

    /// Finish at the release point.
    pub fn finish(mut self, at: Point) -> BoundingBox {
        self.update(at);
        self.preview()
    }
}
