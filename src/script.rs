//! Scripted sessions.
//!
//! A script is a JSON array of steps, each tagged with `"op"`:
//!
//! ```json
//! [
//!   {"op": "polygon", "hand": "left", "category": "thumb",
//!    "points": [[10, 10], [60, 10], [40, 50]]},
//!   {"op": "add_person"},
//!   {"op": "curve", "person": 2, "hand": "right", "category": "palm",
//!    "control_points": [[100, 100], [200, 50], [300, 100]], "closed": true},
//!   {"op": "box", "person": 2, "hand": "right", "corners": [[80, 40], [320, 160]]},
//!   {"op": "undo"}
//! ]
//! ```
//!
//! Steps replay through a [`Session`], so they are validated exactly like
//! interactive edits. A rejected step is reported and skipped.

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::model::{BoundingBox, Category, EntityKey, HandSide, PersonId, Point};
use crate::session::Session;
use crate::undo::CurveStroke;

/// One scripted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Add the next person and select it
    AddPerson,
    /// Fill a polygon
    Polygon {
        /// Defaults to the selected person
        #[serde(default)]
        person: Option<PersonId>,
        hand: HandSide,
        category: Category,
        points: Vec<Point>,
    },
    /// Draw a curve; unset options use the session's settings
    Curve {
        #[serde(default)]
        person: Option<PersonId>,
        hand: HandSide,
        category: Category,
        control_points: Vec<Point>,
        #[serde(default)]
        tension: Option<f32>,
        #[serde(default)]
        steps: Option<usize>,
        #[serde(default)]
        closed: Option<bool>,
        #[serde(default)]
        stroke_width: Option<u32>,
    },
    /// Set a hand bounding box from two corners
    Box {
        #[serde(default)]
        person: Option<PersonId>,
        hand: HandSide,
        corners: [Point; 2],
    },
    /// Clear one layer
    Clear {
        #[serde(default)]
        person: Option<PersonId>,
        hand: HandSide,
        category: Category,
    },
    /// Clear every layer
    ClearAll,
    /// Undo the last committed step
    Undo,
}

impl ScriptStep {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptStep::AddPerson => "add_person",
            ScriptStep::Polygon { .. } => "polygon",
            ScriptStep::Curve { .. } => "curve",
            ScriptStep::Box { .. } => "box",
            ScriptStep::Clear { .. } => "clear",
            ScriptStep::ClearAll => "clear_all",
            ScriptStep::Undo => "undo",
        }
    }
}

/// Parse a script from JSON.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Apply one step to a session.
pub fn run_step(session: &mut Session, step: &ScriptStep) -> Result<(), EditError> {
    let selected = session.person();
    match step {
        ScriptStep::AddPerson => {
            session.add_person();
            Ok(())
        }
        ScriptStep::Polygon {
            person,
            hand,
            category,
            points,
        } => {
            let key = EntityKey::new(person.unwrap_or(selected), *hand, *category);
            session.commit_polygon(key, points.clone())
        }
        ScriptStep::Curve {
            person,
            hand,
            category,
            control_points,
            tension,
            steps,
            closed,
            stroke_width,
        } => {
            let key = EntityKey::new(person.unwrap_or(selected), *hand, *category);
            let mut curve = session.curve().clone();
            if let Some(tension) = tension {
                curve.set_tension(*tension);
            }
            if let Some(steps) = steps {
                curve.set_steps(*steps);
            }
            curve.set_control_points(control_points.iter().copied());
            let stroke = CurveStroke::from_curve(
                &curve,
                closed.unwrap_or(session.closed_curve()),
                stroke_width.unwrap_or(session.stroke_width()),
            );
            session.commit_curve(key, stroke)
        }
        ScriptStep::Box {
            person,
            hand,
            corners,
        } => {
            let bbox = BoundingBox::from_corners(corners[0], corners[1]);
            session.commit_box(person.unwrap_or(selected), *hand, bbox)
        }
        ScriptStep::Clear {
            person,
            hand,
            category,
        } => {
            let key = EntityKey::new(person.unwrap_or(selected), *hand, *category);
            session.clear(key)
        }
        ScriptStep::ClearAll => session.clear_all(),
        ScriptStep::Undo => session.undo().map(|_| ()),
    }
}

/// Outcome of replaying a script.
#[derive(Debug, Default)]
pub struct ScriptReport {
    /// Number of steps applied
    pub applied: usize,
    /// Index and error of every rejected step
    pub rejected: Vec<(usize, EditError)>,
}

impl ScriptReport {
    /// Whether every step was applied.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Replay every step, skipping the ones the session rejects.
pub fn run_script(session: &mut Session, steps: &[ScriptStep]) -> ScriptReport {
    let mut report = ScriptReport::default();
    for (index, step) in steps.iter().enumerate() {
        match run_step(session, step) {
            Ok(()) => report.applied += 1,
            Err(e) => {
                log::warn!("Step {} ({}) rejected: {}", index, step.name(), e);
                report.rejected.push((index, e));
            }
        }
    }
    log::info!(
        "Script replayed: {} applied, {} rejected",
        report.applied,
        report.rejected.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanvasSize;

    const SCRIPT: &str = r#"[
        {"op": "polygon", "hand": "left", "category": "thumb",
         "points": [[10, 10], [60, 10], [40, 50]]},
        {"op": "add_person"},
        {"op": "curve", "hand": "right", "category": "palm",
         "control_points": [[100, 100], [200, 50], [300, 100]], "tension": 0.3},
        {"op": "box", "hand": "right", "corners": [[320, 160], [80, 40]]},
        {"op": "clear", "person": 1, "hand": "left", "category": "thumb"},
        {"op": "undo"},
        {"op": "clear_all"}
    ]"#;

    fn session() -> Session {
        let mut session = Session::default();
        session.load_canvas(CanvasSize::new(400, 300));
        session
    }

    #[test]
    fn test_parse_script() {
        let steps = parse_script(SCRIPT).unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[1], ScriptStep::AddPerson);
        assert!(matches!(
            &steps[2],
            ScriptStep::Curve { person: None, closed: None, .. }
        ));
        assert_eq!(steps[6].name(), "clear_all");
    }

    #[test]
    fn test_unknown_op_rejected() {
        assert!(parse_script(r#"[{"op": "teleport"}]"#).is_err());
    }

    #[test]
    fn test_run_script() {
        let steps = parse_script(SCRIPT).unwrap();
        let mut session = session();
        let report = run_script(&mut session, &steps);

        assert!(report.is_clean());
        assert_eq!(report.applied, 7);
        assert_eq!(session.persons().len(), 2);
        assert_eq!(session.history().len(), 4);

        let thumb = EntityKey::new(PersonId(1), HandSide::Left, Category::Thumb);
        let palm = EntityKey::new(PersonId(2), HandSide::Right, Category::Palm);
        assert!(session.layers().get(&thumb).unwrap().is_blank());
        assert!(session.layers().get(&palm).unwrap().is_blank());
        assert!(session.boxes().get(PersonId(2), HandSide::Right).is_some());

        session.undo().unwrap();
        assert!(!session.layers().get(&thumb).unwrap().is_blank());
        assert!(!session.layers().get(&palm).unwrap().is_blank());
    }

    #[test]
    fn test_rejected_steps_are_reported() {
        let steps = parse_script(
            r#"[
                {"op": "undo"},
                {"op": "polygon", "hand": "left", "category": "ring",
                 "points": [[0, 0], [0, 0], [0, 0]]},
                {"op": "polygon", "person": 5, "hand": "left", "category": "ring",
                 "points": [[0, 0], [9, 0], [0, 9]]},
                {"op": "curve", "hand": "left", "category": "left_hand",
                 "control_points": [[0, 0], [9, 9]]},
                {"op": "polygon", "hand": "left", "category": "ring",
                 "points": [[0, 0], [9, 0], [0, 9]]}
            ]"#,
        )
        .unwrap();
        let mut session = session();
        let report = run_script(&mut session, &steps);

        assert_eq!(report.applied, 1);
        let indices: Vec<usize> = report.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(report.rejected[0].1, EditError::NothingToUndo);
        assert_eq!(report.rejected[2].1, EditError::UnknownPerson(PersonId(5)));
        assert_eq!(
            report.rejected[3].1,
            EditError::NotPaintable(Category::LeftHand)
        );
    }

    #[test]
    fn test_curve_options_override_session() {
        let steps = parse_script(
            r#"[{"op": "curve", "hand": "left", "category": "index",
                 "control_points": [[20, 150], [200, 150], [380, 150]],
                 "steps": 8, "closed": false, "stroke_width": 9}]"#,
        )
        .unwrap();
        let mut session = session();
        run_script(&mut session, &steps);

        let Some(crate::undo::AnnotationAction::Curve { stroke, .. }) = session.history().last()
        else {
            panic!("expected a curve action");
        };
        assert_eq!(stroke.steps, 8);
        assert!(!stroke.closed);
        assert_eq!(stroke.width, 9);
        assert_eq!(session.curve().steps(), crate::constants::DEFAULT_STEPS);
    }
}
