use std::collections::HashSet;

use keyline_protocol::Rect;

use crate::coords::ViewState;
use crate::layout::Layout;
use crate::model::{KeyframeId, TimelineModel};
use crate::options::TimelineOptions;

/// What a selection operation applies to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selector {
    All,
    Keyframe(KeyframeId),
    /// Screen-space rectangle; keyframes whose rect touches it are hit.
    Rect(Rect),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionChange {
    pub changed: bool,
    /// Selected keyframes after the operation, in model order.
    pub selected: Vec<KeyframeId>,
}

/// Keyframes of every row, scrolled off-screen or not, whose screen rect
/// intersects `rect`.
pub fn keyframes_in_rect(layout: &Layout<'_>, rect: Rect) -> HashSet<KeyframeId> {
    let model = layout.model();
    let mut hits = HashSet::new();
    for row in layout.compute_all_rows(false).rows {
        for kf in row.keyframes.iter().filter_map(|id| model.keyframe(*id)) {
            if layout.keyframe_rect(kf, &row).intersects(&rect) {
                hits.insert(kf.id);
            }
        }
    }
    hits
}

/// Apply `selector` to the selection flags of `model`.
///
/// * `All` sets every selectable keyframe to `is_selected`.
/// * `Keyframe` with `ignore_others` makes that keyframe the whole
///   selection; without it the keyframe's flag is toggled.
/// * `Rect` selects exactly the hit keyframes, plus `baseline` when
///   `ignore_others` is false.
///
/// Keyframes that are not selectable are never selected.
pub fn perform_selection(
    model: &mut TimelineModel,
    options: &TimelineOptions,
    view: &ViewState,
    is_selected: bool,
    selector: Selector,
    ignore_others: bool,
    baseline: &HashSet<KeyframeId>,
) -> SelectionChange {
    let target: HashSet<KeyframeId> = match selector {
        Selector::All => {
            if is_selected {
                model.keyframes().map(|k| k.id).collect()
            } else {
                HashSet::new()
            }
        }
        Selector::Keyframe(id) => {
            let mut target = if ignore_others {
                HashSet::new()
            } else {
                model.selected_set()
            };
            let flag = if ignore_others {
                is_selected
            } else {
                !model.keyframe(id).is_some_and(|k| k.selected)
            };
            if flag {
                target.insert(id);
            } else {
                target.remove(&id);
            }
            target
        }
        Selector::Rect(rect) => {
            let hits = keyframes_in_rect(&Layout::new(model, options, view), rect);
            let mut target = if ignore_others {
                HashSet::new()
            } else {
                baseline.clone()
            };
            if is_selected {
                target.extend(hits);
            } else {
                target.retain(|id| !hits.contains(id));
            }
            target
        }
    };

    let mut change = SelectionChange::default();
    for kf in model.keyframes_mut() {
        let selected = kf.selectable && target.contains(&kf.id);
        if kf.selected != selected {
            kf.selected = selected;
            change.changed = true;
        }
        if kf.selected {
            change.selected.push(kf.id);
        }
    }
    change
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TimelineOptions {
        TimelineOptions {
            header_height: 0.0,
            left_margin: 0.0,
            row_height: 20.0,
            row_gap: 0.0,
            ..TimelineOptions::default()
        }
    }

    fn view(scroll_left: f64) -> ViewState {
        ViewState {
            width: 500.0,
            height: 100.0,
            scroll_left,
            ..ViewState::default()
        }
    }

    /// Two rows with keyframes at 0.5 s, 2 s and 8 s.
    fn model() -> (TimelineModel, Vec<KeyframeId>) {
        let mut model = TimelineModel::new();
        let mut ids = Vec::new();
        for _ in 0..2 {
            let r = model.add_row().unwrap();
            for val in [500.0, 2000.0, 8000.0] {
                if let Ok(id) = model.add_keyframe(r, val) {
                    ids.push(id);
                }
            }
        }
        (model, ids)
    }

    fn select(
        model: &mut TimelineModel,
        selector: Selector,
        ignore_others: bool,
        baseline: &HashSet<KeyframeId>,
    ) -> SelectionChange {
        perform_selection(model, &options(), &view(0.0), true, selector, ignore_others, baseline)
    }

    #[test]
    fn rect_selects_exactly_the_intersecting_keyframes() {
        let (mut model, ids) = model();
        // Covers x 40..210 in the first row only.
        let rect = Rect::new(40.0, 2.0, 170.0, 10.0);
        let change = select(&mut model, Selector::Rect(rect), true, &HashSet::new());
        assert!(change.changed);
        assert_eq!(change.selected, vec![ids[0], ids[1]]);

        let again = select(&mut model, Selector::Rect(rect), true, &HashSet::new());
        assert!(!again.changed);
    }

    #[test]
    fn rect_extends_the_baseline_when_not_exclusive() {
        let (mut model, ids) = model();
        let baseline: HashSet<KeyframeId> = [ids[5]].into_iter().collect();
        let rect = Rect::new(40.0, 2.0, 20.0, 10.0);
        let change = select(&mut model, Selector::Rect(rect), false, &baseline);
        assert_eq!(change.selected, vec![ids[0], ids[5]]);

        // Shrinking the rectangle drops the swept keyframe but keeps the baseline.
        let empty = Rect::new(300.0, 2.0, 1.0, 1.0);
        let change = select(&mut model, Selector::Rect(empty), false, &baseline);
        assert_eq!(change.selected, vec![ids[5]]);
    }

    #[test]
    fn rect_reaches_keyframes_scrolled_out_of_view() {
        let (mut model, ids) = model();
        // Scrolled 700 px right: the 500 ms keyframe sits at x = -650.
        let rect = Rect::new(-700.0, 2.0, 300.0, 10.0);
        let change = perform_selection(
            &mut model,
            &options(),
            &view(700.0),
            true,
            Selector::Rect(rect),
            true,
            &HashSet::new(),
        );
        assert_eq!(change.selected, vec![ids[0], ids[1]]);
    }

    #[test]
    fn single_keyframe_exclusive_and_toggle() {
        let (mut model, ids) = model();
        select(&mut model, Selector::Keyframe(ids[0]), true, &HashSet::new());
        let change = select(&mut model, Selector::Keyframe(ids[3]), true, &HashSet::new());
        assert_eq!(change.selected, vec![ids[3]]);

        let change = select(&mut model, Selector::Keyframe(ids[1]), false, &HashSet::new());
        assert_eq!(change.selected, vec![ids[1], ids[3]]);
        let change = select(&mut model, Selector::Keyframe(ids[1]), false, &HashSet::new());
        assert!(change.changed);
        assert_eq!(change.selected, vec![ids[3]]);
    }

    #[test]
    fn all_skips_unselectable_keyframes() {
        let (mut model, ids) = model();
        if let Some(k) = model.keyframe_mut(ids[2]) {
            k.selectable = false;
        }
        let change = select(&mut model, Selector::All, true, &HashSet::new());
        assert_eq!(change.selected.len(), 5);
        assert!(!change.selected.contains(&ids[2]));

        let change = perform_selection(
            &mut model,
            &options(),
            &view(0.0),
            false,
            Selector::All,
            true,
            &HashSet::new(),
        );
        assert!(change.changed);
        assert!(change.selected.is_empty());
    }
}
