//! Integration tests: drive a timeline through pointer, keyboard and timer
//! input the way a host would, and check the observable outcome.

use std::cell::RefCell;
use std::rc::Rc;

use keyline_core::coords::CoordinateMapper;
use keyline_core::layout::Layout;
use keyline_core::{
    ElementKind, InteractionState, KeyframeId, Modifiers, PointerEvent, Timeline, TimelineModel,
    TimelineOptions, ViewState,
};
use keyline_protocol::Point;

/// Row 0 spans y 30..54 with keyframes at 1 s and 3 s (x 100 and 300),
/// row 1 spans y 54..78 with a keyframe at 1 s.
const ROW0_Y: f64 = 42.0;

fn options() -> TimelineOptions {
    TimelineOptions {
        left_margin: 0.0,
        row_gap: 0.0,
        drag_threshold_px: 5.0,
        ..TimelineOptions::default()
    }
}

fn timeline_with(options: TimelineOptions) -> (Timeline, Vec<KeyframeId>) {
    let mut model = TimelineModel::new();
    let r0 = model.add_row().unwrap();
    let r1 = model.add_row().unwrap();
    let ids = [(r0, 1000.0), (r0, 3000.0), (r1, 1000.0)]
        .into_iter()
        .filter_map(|(row, val)| model.add_keyframe(row, val).ok())
        .collect();
    let mut t = Timeline::with_model(options, model);
    t.rescale(1000.0, 300.0, 1.0);
    (t, ids)
}

fn pointer(x: f64, y: f64, time_ms: f64) -> PointerEvent {
    PointerEvent::new(1, Point::new(x, y), Modifiers::NONE, time_ms)
}

fn shift_pointer(x: f64, y: f64, time_ms: f64) -> PointerEvent {
    PointerEvent::new(1, Point::new(x, y), Modifiers::SHIFT, time_ms)
}

fn selected(t: &Timeline) -> Vec<KeyframeId> {
    let mut ids: Vec<KeyframeId> = t.get_selected_elements().iter().map(|k| k.id).collect();
    ids.sort();
    ids
}

#[test]
fn mapping_is_linear_at_zoom_one() {
    let (t, _) = timeline_with(options());
    assert_eq!(t.val_to_px(5000.0), 500.0);
    assert_eq!(t.px_to_val(500.0), 5000.0);
}

#[test]
fn default_left_margin_only_shifts_the_canvas() {
    let (t, ids) = timeline_with(TimelineOptions::default());
    assert_eq!(t.val_to_px(5000.0), 500.0);
    assert_eq!(t.px_to_val(500.0), 5000.0);

    // On the canvas the keyframe at 1 s sits 25 px right of its mapped x.
    let hits = t.element_from_point(Point::new(125.0, ROW0_Y));
    let first = hits.first().unwrap();
    assert_eq!(first.kind, ElementKind::Keyframe);
    assert_eq!(first.keyframe, Some(ids[0]));
    assert!((first.bounds.center().x - 125.0).abs() < 1e-9);
}

#[test]
fn mapping_round_trips_and_snapping_is_idempotent() {
    let options = TimelineOptions::default();
    for (zoom, scroll_left) in [(1.0, 0.0), (0.37, 120.0), (2.5, 3333.3), (8.0, 17.0)] {
        let view = ViewState {
            width: 800.0,
            height: 200.0,
            zoom,
            scroll_left,
            pixel_ratio: 2.0,
            ..ViewState::default()
        };
        let mapper = CoordinateMapper::new(&view, &options);
        // Half a device pixel expressed in ms.
        let tolerance = 0.5 / view.pixel_ratio / mapper.px_per_ms();
        for val in [0.0, 1.0, 999.9, 12_345.678, 3_600_000.0] {
            for absolute in [true, false] {
                let back = mapper.px_to_value(mapper.value_to_px(val, absolute), absolute);
                assert!((back - val).abs() <= tolerance, "val={val} zoom={zoom}");
            }
            let once = mapper.snap(val);
            assert_eq!(mapper.snap(once), once);
        }
    }
}

fn drag_first_keyframe_to(options: TimelineOptions, x: f64) -> Option<f64> {
    let (mut t, ids) = timeline_with(options);
    t.on_pointer_down(pointer(100.0, ROW0_Y, 0.0));
    t.on_pointer_move(pointer(x, ROW0_Y, 10.0));
    t.on_pointer_up(pointer(x, ROW0_Y, 20.0));
    t.model().keyframe(ids[0]).map(|k| k.val)
}

#[test]
fn keyframe_drag_respects_snapping() {
    let free = TimelineOptions {
        snap_enabled: false,
        ..options()
    };
    let grid = |step: f64| TimelineOptions {
        snap_step: Some(step),
        ..options()
    };

    assert_eq!(drag_first_keyframe_to(free, 150.0), Some(1500.0));
    assert_eq!(drag_first_keyframe_to(grid(100.0), 150.0), Some(1500.0));
    assert_eq!(drag_first_keyframe_to(grid(250.0), 150.0), Some(1500.0));
    assert_eq!(drag_first_keyframe_to(grid(250.0), 137.0), Some(1250.0));
}

#[test]
fn drag_past_threshold_selects_by_rectangle() {
    let (mut t, ids) = timeline_with(options());
    t.on_pointer_down(pointer(50.0, 35.0, 0.0));
    t.on_pointer_move(pointer(90.0, 45.0, 10.0));
    t.on_pointer_move(pointer(130.0, 60.0, 20.0));
    assert!(matches!(t.state(), InteractionState::DraggingSelection(_)));
    assert!(t.selection_rect().is_some());
    t.on_pointer_up(pointer(130.0, 60.0, 30.0));

    assert!(t.state().is_idle());
    assert!(t.selection_rect().is_none());
    // Only the row-0 keyframe at 1 s touches (50, 35)-(130, 60).
    assert_eq!(selected(&t), vec![ids[0]]);
    // A drag is not a click: the time cursor stays put.
    assert_eq!(t.get_time(), 0.0);
}

#[test]
fn shift_rectangle_extends_the_previous_selection() {
    let (mut t, ids) = timeline_with(options());
    assert!(matches!(t.select_keyframe(ids[2]), Ok(true)));

    t.on_pointer_down(shift_pointer(50.0, 35.0, 0.0));
    t.on_pointer_move(shift_pointer(130.0, 50.0, 10.0));
    assert_eq!(selected(&t), vec![ids[0], ids[2]]);
    // Shrinking the rectangle gives back only what the drag added.
    t.on_pointer_move(shift_pointer(60.0, 50.0, 20.0));
    assert_eq!(selected(&t), vec![ids[2]]);
    t.on_pointer_up(shift_pointer(60.0, 50.0, 30.0));

    // Without shift the rectangle replaces the selection.
    t.on_pointer_down(pointer(50.0, 35.0, 1000.0));
    t.on_pointer_move(pointer(130.0, 50.0, 1010.0));
    t.on_pointer_up(pointer(130.0, 50.0, 1020.0));
    assert_eq!(selected(&t), vec![ids[0]]);
}

#[test]
fn small_movement_is_a_click() {
    let (mut t, ids) = timeline_with(options());
    let drags = Rc::new(RefCell::new(0));
    let doubles = Rc::new(RefCell::new(0));
    let d = Rc::clone(&drags);
    t.on_drag_started(move |_| *d.borrow_mut() += 1);
    let d = Rc::clone(&doubles);
    t.on_double_click(move |_| *d.borrow_mut() += 1);

    t.on_pointer_down(pointer(100.0, ROW0_Y, 0.0));
    t.on_pointer_move(pointer(102.0, ROW0_Y, 5.0));
    assert!(matches!(t.state(), InteractionState::Deciding(_)));
    t.on_pointer_up(pointer(102.0, ROW0_Y, 20.0));

    assert_eq!(*drags.borrow(), 0);
    assert_eq!(selected(&t), vec![ids[0]]);
    assert_eq!(t.model().keyframe(ids[0]).map(|k| k.val), Some(1000.0));

    // A shift-click inside the double-click window toggles it off again.
    t.on_pointer_down(shift_pointer(101.0, ROW0_Y, 100.0));
    t.on_pointer_up(shift_pointer(101.0, ROW0_Y, 110.0));
    assert!(selected(&t).is_empty());
    assert_eq!(*drags.borrow(), 0);
    assert_eq!(*doubles.borrow(), 1);
}

#[test]
fn click_on_a_selected_keyframe_narrows_the_selection_to_it() {
    let (mut t, ids) = timeline_with(options());
    assert!(t.select(true));
    assert_eq!(selected(&t), vec![ids[0], ids[1], ids[2]]);

    let events = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&events);
    t.on_selected(move |ev| e.borrow_mut().push(ev.selected.clone()));

    t.on_pointer_down(pointer(100.0, ROW0_Y, 0.0));
    t.on_pointer_up(pointer(100.0, ROW0_Y, 20.0));

    assert_eq!(selected(&t), vec![ids[0]]);
    assert_eq!(*events.borrow(), vec![vec![ids[0]]]);
}

#[test]
fn auto_pan_scrolls_while_outside_and_halts_on_reentry() {
    let (mut t, _) = timeline_with(options());
    let sources = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&sources);
    t.on_scroll(move |e| s.borrow_mut().push(e.source));

    t.on_pointer_down(pointer(500.0, 100.0, 0.0));
    // 20 px past the right edge: full speed of 10 px per 50 ms tick.
    t.on_pointer_move(pointer(1020.0, 100.0, 0.0));
    assert!(matches!(t.state(), InteractionState::DraggingSelection(_)));

    let mut now = 0.0;
    while now < 500.0 {
        now += 50.0;
        t.tick(now);
    }
    assert!((t.scroll_left() - 100.0).abs() < 1e-9, "scroll_left={}", t.scroll_left());
    assert_eq!(sources.borrow().len(), 10);

    t.on_pointer_move(pointer(500.0, 100.0, 510.0));
    t.tick(550.0);
    t.tick(600.0);
    assert!((t.scroll_left() - 100.0).abs() < 1e-9);
    t.on_pointer_up(pointer(500.0, 100.0, 620.0));
    assert!(t.state().is_idle());
}

#[test]
fn stale_auto_pan_ticks_are_throttled() {
    let (mut t, _) = timeline_with(TimelineOptions {
        auto_pan_min_step_ms: 40.0,
        ..options()
    });
    t.on_pointer_down(pointer(500.0, 100.0, 0.0));
    t.on_pointer_move(pointer(1020.0, 100.0, 0.0));
    // One late tick catches up three due repeats but scrolls once.
    t.tick(150.0);
    assert!((t.scroll_left() - 10.0).abs() < 1e-9);
}

#[test]
fn visible_rows_match_the_scroll_window() {
    let mut model = TimelineModel::new();
    for i in 0..200 {
        let r = model.add_row().unwrap();
        let _ = model.add_keyframe(r, f64::from(i) * 100.0);
    }
    let mut t = Timeline::with_model(options(), model);
    t.rescale(1000.0, 300.0, 1.0);
    t.set_scroll_top(1000.0);

    let layout = Layout::new(t.model(), t.options(), t.view());
    let area = layout.rows_area();
    let visible = layout.compute_visible_rows(false);
    let expected: Vec<usize> = layout
        .compute_all_rows(false)
        .rows
        .iter()
        .filter(|r| r.y < area.bottom() && r.y + r.height > area.y)
        .map(|r| r.index)
        .collect();
    let got: Vec<usize> = visible.rows.iter().map(|r| r.index).collect();
    assert_eq!(got, expected);
    // 270 px of rows area at 24 px per row, partially cut at both ends.
    assert_eq!(got.first(), Some(&41));
    assert_eq!(got.len(), 12);
}

#[test]
fn keyframe_is_hit_before_its_stripe() {
    let (t, ids) = timeline_with(options());
    let hits = t.element_from_point(Point::new(100.0, ROW0_Y));
    let kinds: Vec<ElementKind> = hits.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ElementKind::Keyframe, ElementKind::Stripe, ElementKind::Row]);
    assert_eq!(hits[0].keyframe, Some(ids[0]));
}

#[test]
fn malformed_pointer_sequences_are_ignored() {
    let (mut t, _) = timeline_with(options());
    let events = Rc::new(RefCell::new(0));
    let e = Rc::clone(&events);
    t.on_drag_started(move |_| *e.borrow_mut() += 1);

    t.on_pointer_up(pointer(100.0, ROW0_Y, 0.0));
    t.on_pointer_move(PointerEvent::new(9, Point::new(200.0, ROW0_Y), Modifiers::NONE, 5.0));
    t.on_pointer_cancel(9);
    assert!(t.state().is_idle());

    t.on_pointer_down(pointer(100.0, ROW0_Y, 10.0));
    t.on_pointer_down(PointerEvent::new(2, Point::new(300.0, ROW0_Y), Modifiers::NONE, 11.0));
    t.on_pointer_move(PointerEvent::new(2, Point::new(400.0, ROW0_Y), Modifiers::NONE, 12.0));
    assert!(matches!(t.state(), InteractionState::Deciding(_)));
    assert_eq!(*events.borrow(), 0);

    t.on_pointer_cancel(1);
    assert!(t.state().is_idle());
    assert_eq!(t.get_time(), 0.0);
}

#[test]
fn dispose_mid_drag_tears_everything_down() {
    let (mut t, ids) = timeline_with(options());
    t.on_pointer_down(pointer(100.0, ROW0_Y, 0.0));
    t.on_pointer_move(pointer(150.0, ROW0_Y, 10.0));
    assert!(matches!(t.state(), InteractionState::DraggingKeyframe(_)));

    t.dispose();
    t.dispose();
    assert!(t.state().is_idle());
    assert_eq!(t.next_deadline(), None);

    t.on_pointer_move(pointer(300.0, ROW0_Y, 20.0));
    t.on_pointer_up(pointer(300.0, ROW0_Y, 30.0));
    t.tick(10_000.0);
    assert_eq!(t.model().keyframe(ids[0]).map(|k| k.val), Some(1500.0));
    assert!(t.take_frame().is_none());
}

#[test]
fn redraw_requests_collapse_into_one_frame() {
    let (mut t, _) = timeline_with(options());
    assert!(t.take_frame().is_some());
    t.set_scroll_left(10.0);
    t.set_scroll_left(20.0);
    t.set_time(300.0);
    t.select(true);
    assert!(t.take_frame().is_some());
    assert!(t.take_frame().is_none());
}
