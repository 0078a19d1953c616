//! Integration test: load a model document, render it, and edit it through
//! stripe and keyframe drags bounded by the row limits.

use keyline_core::{
    InteractionState, KeyframeId, Modifiers, PointerEvent, RowId, Timeline, TimelineModel, TimelineOptions,
};
use keyline_protocol::{Point, RenderCommand, ThemeToken};

/// Rows: Position y 30..54, Opacity y 54..94, Scale y 94..118,
/// Rotation y 118..142.
fn session() -> Timeline {
    let data = include_bytes!("fixtures/animation.json");
    let model = TimelineModel::from_json(data).expect("fixture should load");
    let options = TimelineOptions {
        left_margin: 0.0,
        row_gap: 0.0,
        ..TimelineOptions::default()
    };
    let mut t = Timeline::with_model(options, model);
    t.rescale(1000.0, 300.0, 1.0);
    t
}

fn pointer(x: f64, y: f64, time_ms: f64) -> PointerEvent {
    PointerEvent::new(1, Point::new(x, y), Modifiers::NONE, time_ms)
}

fn val(t: &Timeline, id: u64) -> Option<f64> {
    t.model().keyframe(KeyframeId(id)).map(|k| k.val)
}

#[test]
fn fixture_loads_with_its_ids() {
    let t = session();
    let model = t.model();
    assert_eq!(model.rows().len(), 4);
    assert_eq!(model.keyframe_count(), 8);
    assert_eq!(model.row(RowId(1)).and_then(|r| r.title.as_deref()), Some("Opacity"));
    assert_eq!(model.value_bounds(RowId(0)), (0.0, 8000.0));
    assert_eq!(model.value_bounds(RowId(1)), (0.0, 20_000.0));

    let json = model.to_json().unwrap_or_default();
    let reloaded = TimelineModel::from_json(json.as_bytes()).ok();
    assert_eq!(reloaded.as_ref().map(TimelineModel::keyframe_count), Some(8));
    assert_eq!(
        reloaded.and_then(|m| m.keyframe(KeyframeId(4)).map(|k| k.draggable)),
        Some(false)
    );
}

#[test]
fn frame_draws_every_visible_keyframe_with_its_state() {
    let mut t = session();
    let frame = t.take_frame().unwrap_or_default();

    let keyframes: Vec<(u64, ThemeToken)> = frame
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawPolygon {
                element_id: Some(id),
                color,
                ..
            } => Some((*id, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(
        keyframes,
        vec![
            (0, ThemeToken::Keyframe),
            (1, ThemeToken::Keyframe),
            (2, ThemeToken::Keyframe),
            (3, ThemeToken::Keyframe),
            (4, ThemeToken::KeyframeLocked),
            (5, ThemeToken::KeyframeLocked),
            (6, ThemeToken::Keyframe),
            (7, ThemeToken::Keyframe),
        ]
    );

    // Position joins group "a", Opacity's two ungrouped keyframes form the
    // second stripe; Rotation hides its stripes.
    let stripes = frame
        .iter()
        .filter(|c| matches!(c, RenderCommand::DrawRect { color: ThemeToken::Stripe, .. }))
        .count();
    assert_eq!(stripes, 2);

    let clips = frame.iter().filter(|c| matches!(c, RenderCommand::SetClip { .. })).count();
    let unclips = frame.iter().filter(|c| matches!(c, RenderCommand::ClearClip)).count();
    assert_eq!((clips, unclips), (1, 1));
}

#[test]
fn stripe_drag_moves_its_group_within_the_row_limit() {
    let mut t = session();
    t.on_pointer_down(pointer(200.0, 42.0, 0.0));
    t.on_pointer_move(pointer(250.0, 42.0, 10.0));
    assert!(matches!(t.state(), InteractionState::DraggingKeyframe(_)));
    assert_eq!((val(&t, 0), val(&t, 1), val(&t, 2)), (Some(1500.0), Some(3500.0), Some(6000.0)));

    // Row max is 8 s, so the group stops when its last keyframe gets there.
    t.on_pointer_move(pointer(900.0, 42.0, 20.0));
    t.on_pointer_up(pointer(900.0, 42.0, 30.0));
    assert_eq!((val(&t, 0), val(&t, 1)), (Some(6000.0), Some(8000.0)));
}

#[test]
fn locked_keyframes_stay_put() {
    let mut t = session();
    // Scale keyframe at 0.5 s: its row forbids keyframe drags.
    t.on_pointer_down(pointer(50.0, 106.0, 0.0));
    t.on_pointer_move(pointer(150.0, 106.0, 10.0));
    assert!(matches!(t.state(), InteractionState::DraggingSelection(_)));
    t.on_pointer_up(pointer(150.0, 106.0, 20.0));
    assert_eq!(val(&t, 5), Some(500.0));
}

#[test]
fn unselectable_keyframes_are_skipped_by_select_all() {
    let mut t = session();
    assert!(t.select(true));
    let mut ids: Vec<u64> = t.get_selected_elements().iter().map(|k| k.id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 7]);
}

#[test]
fn replacing_the_model_aborts_the_drag() {
    let mut t = session();
    t.on_pointer_down(pointer(100.0, 42.0, 0.0));
    t.on_pointer_move(pointer(140.0, 42.0, 10.0));
    assert!(matches!(t.state(), InteractionState::DraggingKeyframe(_)));

    t.set_model(TimelineModel::new());
    assert!(t.state().is_idle());
    assert!(t.element_from_point(Point::new(140.0, 42.0)).is_empty());
    t.on_pointer_up(pointer(140.0, 42.0, 20.0));
    assert!(t.state().is_idle());
}
