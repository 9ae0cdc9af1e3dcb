//! End-to-end editing scenarios.
//!
//! These drive a [`Session`] the way a front end would and check the layer,
//! box and history state it ends up in.

use super::*;
use crate::undo::fold;

const CANVAS: CanvasSize = CanvasSize {
    width: 200,
    height: 150,
};

fn session() -> Session {
    let mut session = Session::default();
    session.load_canvas(CANVAS);
    session
}

fn pt(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

fn square(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point> {
    vec![pt(x0, y0), pt(x1, y0), pt(x1, y1), pt(x0, y1)]
}

fn click_polygon(session: &mut Session, points: &[Point]) {
    for &p in points {
        session.press(p).unwrap();
    }
    session.complete().unwrap();
}

fn current_mask(session: &Session) -> crate::raster::Mask {
    session
        .layers()
        .get(&session.current_key())
        .map(|layer| layer.mask().clone())
        .unwrap_or_else(|| crate::raster::empty_mask(CANVAS))
}

#[test]
fn test_no_canvas_rejects_drawing() {
    let mut session = Session::default();
    assert_eq!(session.press(pt(1.0, 1.0)), Err(EditError::NoImage));
    assert_eq!(
        session.commit_polygon(session.current_key(), square(0.0, 0.0, 9.0, 9.0)),
        Err(EditError::NoImage)
    );
    assert_eq!(session.clear_all(), Err(EditError::NoImage));
    assert!(session.history().is_empty());
}

#[test]
fn test_undo_single_polygon_gives_blank_layer() {
    let mut session = session();
    click_polygon(&mut session, &square(20.0, 20.0, 80.0, 60.0));
    assert!(!crate::raster::is_blank(&current_mask(&session)));

    session.undo().unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));
    assert!(session.history().is_empty());
}

#[test]
fn test_undo_after_n_polygons_matches_first_n_minus_one() {
    let shapes = [
        square(10.0, 10.0, 40.0, 40.0),
        square(30.0, 30.0, 90.0, 70.0),
        vec![pt(100.0, 20.0), pt(180.0, 40.0), pt(120.0, 110.0)],
        square(150.0, 100.0, 190.0, 140.0),
    ];

    let mut expected = session();
    for shape in &shapes[..shapes.len() - 1] {
        click_polygon(&mut expected, shape);
    }

    let mut session = session();
    for shape in &shapes {
        click_polygon(&mut session, shape);
    }
    session.undo().unwrap();

    assert_eq!(current_mask(&session), current_mask(&expected));
    assert_eq!(session.history().len(), shapes.len() - 1);
}

#[test]
fn test_two_clears_then_two_undos_restore_original() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 60.0, 60.0));
    let original = session.layers().snapshot(&session.current_key()).unwrap();

    session.clear_current().unwrap();
    session.clear_current().unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));

    session.undo().unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));
    session.undo().unwrap();
    assert_eq!(
        session.layers().get(&session.current_key()).unwrap(),
        &original
    );
}

#[test]
fn test_degenerate_polygon_rejected() {
    let mut session = session();
    let result = session.commit_polygon(
        session.current_key(),
        vec![pt(0.0, 0.0), pt(0.0, 0.0), pt(0.0, 0.0)],
    );
    assert_eq!(
        result,
        Err(EditError::insufficient_points(
            "polygon",
            "distinct points",
            3,
            1
        ))
    );
    assert!(session.history().is_empty());
}

#[test]
fn test_too_few_points_keeps_pending_polygon() {
    let mut session = session();
    session.press(pt(10.0, 10.0)).unwrap();
    session.press(pt(50.0, 10.0)).unwrap();

    assert_eq!(
        session.complete(),
        Err(EditError::insufficient_points("polygon", "points", 3, 2))
    );
    assert_eq!(session.pending_polygon().len(), 2);

    session.press(pt(30.0, 40.0)).unwrap();
    session.complete().unwrap();
    assert!(session.pending_polygon().is_empty());
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_click_near_first_vertex_closes_polygon() {
    let mut session = session();
    for p in square(20.0, 20.0, 80.0, 80.0) {
        session.press(p).unwrap();
    }
    session.press(pt(24.0, 17.0)).unwrap();

    assert!(session.pending_polygon().is_empty());
    let Some(crate::undo::AnnotationAction::Polygon { points, .. }) = session.history().last()
    else {
        panic!("expected a polygon action");
    };
    assert_eq!(points.len(), 4);
}

#[test]
fn test_click_far_from_first_vertex_adds_vertex() {
    let mut session = session();
    for p in square(20.0, 20.0, 80.0, 80.0) {
        session.press(p).unwrap();
    }
    session.press(pt(35.0, 20.0)).unwrap();
    assert_eq!(session.pending_polygon().len(), 5);
    assert!(session.history().is_empty());
}

#[test]
fn test_curve_commit_and_undo() {
    let mut session = session();
    session.set_mode(DrawMode::Curve);
    session.press(pt(30.0, 30.0)).unwrap();
    assert_eq!(
        session.complete(),
        Err(EditError::insufficient_points("curve", "control points", 2, 1))
    );
    assert!(session.history().is_empty());

    session.press(pt(150.0, 40.0)).unwrap();
    session.press(pt(90.0, 120.0)).unwrap();
    session.complete().unwrap();
    assert!(session.curve().is_empty());
    assert!(!crate::raster::is_blank(&current_mask(&session)));

    session.undo().unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));
}

#[test]
fn test_open_curve_is_stroked() {
    let mut session = session();
    session.set_mode(DrawMode::Curve);
    session.set_closed_curve(false);
    session.set_stroke_width(3);
    for p in [pt(20.0, 75.0), pt(100.0, 75.0), pt(180.0, 75.0)] {
        session.press(p).unwrap();
    }
    session.complete().unwrap();

    let mask = current_mask(&session);
    assert_eq!(mask.get_pixel(100, 75)[0], 255);
    assert_eq!(mask.get_pixel(100, 20)[0], 0);
    assert!(
        !session
            .layers()
            .get(&session.current_key())
            .unwrap()
            .outlines()
            .is_empty()
    );
}

#[test]
fn test_bounding_box_drag_and_undo() {
    let mut session = session();
    session.set_mode(DrawMode::BoundingBox);
    session.set_hand(HandSide::Right);

    session.press(pt(120.0, 90.0)).unwrap();
    session.drag(pt(60.0, 40.0));
    assert_eq!(
        session.box_preview(),
        Some(BoundingBox::from_corners(pt(60.0, 40.0), pt(120.0, 90.0)))
    );
    let committed = session.release(pt(50.0, 30.0)).unwrap();
    let expected = BoundingBox::from_corners(pt(50.0, 30.0), pt(120.0, 90.0));
    assert_eq!(committed, Some(expected));
    assert_eq!(session.boxes().get(PersonId(1), HandSide::Right), Some(expected));
    assert_eq!(session.box_preview(), None);

    session.undo().unwrap();
    assert!(session.boxes().is_empty());
}

#[test]
fn test_new_drag_discards_previous() {
    let mut session = session();
    session.set_mode(DrawMode::BoundingBox);
    session.press(pt(10.0, 10.0)).unwrap();
    session.press(pt(100.0, 100.0)).unwrap();
    session.release(pt(110.0, 120.0)).unwrap();

    assert_eq!(
        session.boxes().get(PersonId(1), HandSide::Left),
        Some(BoundingBox::from_corners(pt(100.0, 100.0), pt(110.0, 120.0)))
    );
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_clearing_untouched_layer_records_nothing() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 50.0, 50.0));

    session.set_category(Category::Pinky).unwrap();
    session.clear_current().unwrap();
    assert_eq!(session.history().len(), 1);
    assert!(session.layers().get(&session.current_key()).is_none());

    // The undo reverts the polygon, not the skipped clear
    session.undo().unwrap();
    session.set_category(Category::Thumb).unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));
}

#[test]
fn test_undo_box_overwrite_removes_box() {
    let mut session = session();
    let first = BoundingBox::from_corners(pt(10.0, 10.0), pt(60.0, 60.0));
    let second = BoundingBox::from_corners(pt(80.0, 40.0), pt(150.0, 120.0));
    session.commit_box(PersonId(1), HandSide::Right, first).unwrap();
    session.commit_box(PersonId(1), HandSide::Right, second).unwrap();
    assert_eq!(session.boxes().get(PersonId(1), HandSide::Right), Some(second));

    session.undo().unwrap();
    assert_eq!(session.boxes().get(PersonId(1), HandSide::Right), None);
    assert_eq!(session.history().len(), 1);
}

#[test]
fn test_clear_all_undo_and_boxes_survive() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 50.0, 50.0));
    session.set_category(Category::Palm).unwrap();
    click_polygon(&mut session, &square(60.0, 60.0, 150.0, 140.0));
    session
        .commit_box(
            PersonId(1),
            HandSide::Left,
            BoundingBox::from_corners(pt(5.0, 5.0), pt(155.0, 145.0)),
        )
        .unwrap();
    let before = session.layers().snapshot_all();

    session.clear_all().unwrap();
    assert!(
        session
            .layers()
            .iter_sorted()
            .iter()
            .all(|(_, layer)| layer.is_blank())
    );
    assert_eq!(session.boxes().len(), 1);

    session.undo().unwrap();
    assert_eq!(session.layers().snapshot_all(), before);
}

#[test]
fn test_polygon_after_clear_undone_stays_cleared() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 50.0, 50.0));
    session.clear_current().unwrap();
    click_polygon(&mut session, &square(100.0, 80.0, 150.0, 130.0));

    session.undo().unwrap();
    assert!(crate::raster::is_blank(&current_mask(&session)));
}

#[test]
fn test_fold_reproduces_state_after_mixed_edits() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 50.0, 50.0));
    session.set_hand(HandSide::Right);
    session.set_category(Category::Ring).unwrap();
    click_polygon(&mut session, &square(60.0, 20.0, 120.0, 90.0));
    session.set_mode(DrawMode::Curve);
    for p in [pt(20.0, 100.0), pt(80.0, 140.0), pt(160.0, 100.0)] {
        session.press(p).unwrap();
    }
    session.complete().unwrap();
    session.clear_current().unwrap();
    session.add_person();
    session.set_mode(DrawMode::Polygon);
    click_polygon(&mut session, &square(150.0, 10.0, 190.0, 60.0));
    session.undo().unwrap();

    let folded = fold(session.history().iter(), CANVAS).unwrap();
    for (key, layer) in folded.iter_sorted() {
        assert_eq!(session.layers().get(&key).unwrap().mask(), layer.mask());
    }
    for (key, layer) in session.layers().iter_sorted() {
        match folded.get(&key) {
            Some(folded_layer) => assert_eq!(folded_layer.mask(), layer.mask()),
            None => assert!(layer.is_blank()),
        }
    }
}

#[test]
fn test_empty_undo() {
    let mut session = session();
    assert_eq!(session.undo(), Err(EditError::NothingToUndo));
}

#[test]
fn test_persons_and_categories() {
    let mut session = session();
    assert_eq!(session.persons(), &[PersonId(1)]);
    assert_eq!(session.add_person(), PersonId(2));
    assert_eq!(session.person(), PersonId(2));

    assert_eq!(
        session.select_person(PersonId(9)),
        Err(EditError::UnknownPerson(PersonId(9)))
    );
    session.select_person(PersonId(1)).unwrap();

    assert_eq!(
        session.set_category(Category::LeftHand),
        Err(EditError::NotPaintable(Category::LeftHand))
    );
    assert_eq!(session.category(), Category::Thumb);

    let stranger = EntityKey::new(PersonId(7), HandSide::Left, Category::Thumb);
    assert_eq!(
        session.commit_polygon(stranger, square(0.0, 0.0, 10.0, 10.0)),
        Err(EditError::UnknownPerson(PersonId(7)))
    );
}

#[test]
fn test_cancel_and_mode_switch_discard_progress() {
    let mut session = session();
    session.press(pt(10.0, 10.0)).unwrap();
    session.cancel();
    assert!(session.pending_polygon().is_empty());

    session.press(pt(10.0, 10.0)).unwrap();
    session.set_mode(DrawMode::Curve);
    assert!(session.pending_polygon().is_empty());

    session.press(pt(10.0, 10.0)).unwrap();
    session.cancel();
    assert!(session.curve().is_empty());
    assert!(session.history().is_empty());
}

#[test]
fn test_load_canvas_resets_everything() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 10.0, 50.0, 50.0));
    session
        .commit_box(
            PersonId(1),
            HandSide::Left,
            BoundingBox::from_corners(pt(0.0, 0.0), pt(5.0, 5.0)),
        )
        .unwrap();
    session.press(pt(1.0, 1.0)).unwrap();

    session.load_canvas(CanvasSize::new(32, 32));
    assert!(session.layers().is_empty());
    assert!(session.boxes().is_empty());
    assert!(session.history().is_empty());
    assert!(session.pending_polygon().is_empty());
    assert_eq!(session.canvas(), Some(CanvasSize::new(32, 32)));
}

#[test]
fn test_export_records_follow_state() {
    let mut session = session();
    click_polygon(&mut session, &square(10.0, 20.0, 50.0, 60.0));
    session
        .commit_box(
            PersonId(1),
            HandSide::Left,
            BoundingBox::from_corners(pt(5.0, 5.0), pt(65.0, 70.0)),
        )
        .unwrap();

    let records = session.export_records();
    assert_eq!(records.len(), 2);
    let ExportRecord::Region(region) = &records[0] else {
        panic!("expected a region record first");
    };
    assert_eq!(region.bbox, [10.0, 20.0, 40.0, 40.0]);
    assert_eq!(region.polygon.len(), 10);
    assert!(matches!(records[1], ExportRecord::BoundingBox(_)));

    session.undo().unwrap();
    session.undo().unwrap();
    assert!(session.export_records().is_empty());
}

#[test]
fn test_write_coco_needs_canvas() {
    let session = Session::default();
    let path = std::env::temp_dir().join("handseg-never-written.json");
    let result = session.write_coco(&path, "a.png", &ExportOptions::default());
    assert!(matches!(
        result,
        Err(FormatError::Edit(EditError::NoImage))
    ));
}
