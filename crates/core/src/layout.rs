//! Viewport virtualization: screen geometry for the rows and keyframes that
//! are actually on the canvas.
//!
//! Geometry is derived from scratch for every query and never patched in
//! place, so a replaced model or a scroll simply yields new numbers.

use keyline_protocol::Rect;

use crate::coords::{CoordinateMapper, ViewState};
use crate::model::{Keyframe, KeyframeId, Row, RowId, TimelineModel};
use crate::options::TimelineOptions;

/// Screen extent of one stripe (a group of keyframes in a row).
#[derive(Debug, Clone, PartialEq)]
pub struct StripeBounds {
    pub group: Option<String>,
    pub min_val: f64,
    pub max_val: f64,
    /// Uncut screen rectangle from the first to the last keyframe.
    pub rect: Rect,
    pub keyframes: Vec<KeyframeId>,
}

/// Screen placement of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSize {
    pub row: RowId,
    /// Position of the row in model order.
    pub index: usize,
    pub y: f64,
    pub height: f64,
    /// Full-width screen rectangle.
    pub rect: Rect,
    /// Keyframes of the row that fall inside the scanned horizontal window.
    pub keyframes: Vec<KeyframeId>,
    /// Filled only when stripe bounds were requested.
    pub stripes: Vec<StripeBounds>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowsCalculation {
    pub rows: Vec<RowSize>,
    /// Height of all rows including gaps, independent of scrolling.
    pub content_height: f64,
}

/// A rectangle clipped to the drawable area, remembering which edges were cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutBounds {
    pub rect: Rect,
    pub cut_left: bool,
    pub cut_right: bool,
    pub cut_top: bool,
    pub cut_bottom: bool,
}

/// Positional context handed to [`Layout::for_each_visible_keyframe`] callbacks.
#[derive(Debug, Clone, Copy)]
pub struct KeyframeVisit<'a> {
    pub keyframe: &'a Keyframe,
    /// Index of the keyframe within its row's visible keyframes.
    pub keyframe_index: usize,
    pub row: &'a RowSize,
    /// Index of the row within the visible rows.
    pub row_index: usize,
    /// First keyframe of a new row.
    pub new_row: bool,
}

/// Borrowed view of everything geometry depends on.
pub struct Layout<'a> {
    model: &'a TimelineModel,
    options: &'a TimelineOptions,
    view: &'a ViewState,
    mapper: CoordinateMapper,
}

impl<'a> Layout<'a> {
    pub fn new(model: &'a TimelineModel, options: &'a TimelineOptions, view: &'a ViewState) -> Self {
        Self {
            model,
            options,
            view,
            mapper: CoordinateMapper::new(view, options),
        }
    }

    pub fn model(&self) -> &'a TimelineModel {
        self.model
    }

    pub fn options(&self) -> &'a TimelineOptions {
        self.options
    }

    pub fn view(&self) -> &'a ViewState {
        self.view
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Canvas area below the time gauge where rows are drawn.
    pub fn rows_area(&self) -> Rect {
        let top = self.options.header_height.min(self.view.height);
        Rect::new(0.0, top, self.view.width.max(0.0), (self.view.height - top).max(0.0))
    }

    pub fn row_height(&self, row: &Row) -> f64 {
        match row.height {
            Some(h) if h.is_finite() && h >= 0.0 => h,
            _ => self.options.row_height,
        }
    }

    pub fn content_height(&self) -> f64 {
        self.model
            .rows()
            .iter()
            .map(|r| self.row_height(r) + self.options.row_gap)
            .sum()
    }

    /// Rows intersecting the vertical window, in model order.
    pub fn compute_visible_rows(&self, include_stripe_bounds: bool) -> RowsCalculation {
        self.compute_rows(true, include_stripe_bounds)
    }

    /// Every row, regardless of scrolling.
    pub fn compute_all_rows(&self, include_stripe_bounds: bool) -> RowsCalculation {
        self.compute_rows(false, include_stripe_bounds)
    }

    fn compute_rows(&self, visible_only: bool, include_stripe_bounds: bool) -> RowsCalculation {
        let area = self.rows_area();
        let mut result = RowsCalculation {
            rows: Vec::new(),
            content_height: self.content_height(),
        };
        let mut y = area.y - self.view.scroll_top;

        for (index, row) in self.model.rows().iter().enumerate() {
            let height = self.row_height(row);
            let row_y = y;
            y += height + self.options.row_gap;

            if visible_only {
                if row_y >= area.bottom() {
                    // Rows only grow downwards from here.
                    break;
                }
                if !spans_overlap(row_y, height, area.y, area.bottom()) {
                    continue;
                }
            }
            result
                .rows
                .push(self.row_size(row, index, row_y, height, visible_only, include_stripe_bounds));
        }
        result
    }

    fn row_size(
        &self,
        row: &Row,
        index: usize,
        y: f64,
        height: f64,
        visible_only: bool,
        include_stripe_bounds: bool,
    ) -> RowSize {
        let half_kf = self.options.keyframe_width / 2.0;
        let keyframes = self
            .model
            .row_keyframes(row)
            .filter(|k| {
                if !visible_only {
                    return true;
                }
                let x = self.mapper.value_to_canvas_x(k.val);
                x + half_kf >= 0.0 && x - half_kf <= self.view.width
            })
            .map(|k| k.id)
            .collect();

        let stripes = if include_stripe_bounds && row.stripe_visible {
            self.stripes(row, y, height, visible_only)
        } else {
            Vec::new()
        };

        RowSize {
            row: row.id,
            index,
            y,
            height,
            rect: Rect::new(0.0, y, self.view.width.max(0.0), height),
            keyframes,
            stripes,
        }
    }

    fn stripes(&self, row: &Row, y: f64, height: f64, visible_only: bool) -> Vec<StripeBounds> {
        let mut groups: Vec<StripeBounds> = Vec::new();
        for kf in self.model.row_keyframes(row) {
            match groups.iter_mut().find(|g| g.group == kf.group) {
                Some(g) => {
                    g.min_val = g.min_val.min(kf.val);
                    g.max_val = g.max_val.max(kf.val);
                    g.keyframes.push(kf.id);
                }
                None => groups.push(StripeBounds {
                    group: kf.group.clone(),
                    min_val: kf.val,
                    max_val: kf.val,
                    rect: Rect::default(),
                    keyframes: vec![kf.id],
                }),
            }
        }

        groups.retain(|g| g.keyframes.len() > 1);
        for g in &mut groups {
            let x0 = self.mapper.value_to_canvas_x(g.min_val);
            let x1 = self.mapper.value_to_canvas_x(g.max_val);
            g.rect = Rect::new(x0, y, x1 - x0, height);
        }
        if visible_only {
            groups.retain(|g| g.rect.right() >= 0.0 && g.rect.x <= self.view.width);
        }
        groups
    }

    /// Clip `rect` to the rows area. `None` when nothing of it is visible.
    pub fn cut_bounds(&self, rect: Rect) -> Option<CutBounds> {
        let area = self.rows_area();
        if rect.right() < area.x
            || rect.x > area.right()
            || rect.bottom() < area.y
            || rect.y > area.bottom()
        {
            return None;
        }
        let cut_left = rect.x < area.x;
        let cut_right = rect.right() > area.right();
        let cut_top = rect.y < area.y;
        let cut_bottom = rect.bottom() > area.bottom();
        let x = rect.x.max(area.x);
        let y = rect.y.max(area.y);
        let right = rect.right().min(area.right());
        let bottom = rect.bottom().min(area.bottom());
        Some(CutBounds {
            rect: Rect::new(x, y, right - x, bottom - y),
            cut_left,
            cut_right,
            cut_top,
            cut_bottom,
        })
    }

    /// Uncut screen rectangle of a keyframe centred in its row.
    pub fn keyframe_rect(&self, keyframe: &Keyframe, row: &RowSize) -> Rect {
        let x = self.mapper.value_to_canvas_x(keyframe.val);
        let w = self.options.keyframe_width;
        let h = self.options.keyframe_height.min(row.height);
        Rect::new(x - w / 2.0, row.y + (row.height - h) / 2.0, w, h)
    }

    /// Visit keyframes of visible rows, row by row.
    pub fn for_each_visible_keyframe<F>(&self, include_stripe_bounds: bool, mut callback: F)
    where
        F: FnMut(KeyframeVisit<'_>),
    {
        let rows = self.compute_visible_rows(include_stripe_bounds);
        for (row_index, row) in rows.rows.iter().enumerate() {
            let visible = row.keyframes.iter().filter_map(|id| self.model.keyframe(*id));
            for (keyframe_index, keyframe) in visible.enumerate() {
                callback(KeyframeVisit {
                    keyframe,
                    keyframe_index,
                    row,
                    row_index,
                    new_row: keyframe_index == 0,
                });
            }
        }
    }

    /// Row under screen coordinate `y`, if any.
    pub fn row_at_y(&self, y: f64) -> Option<RowId> {
        let area = self.rows_area();
        if y < area.y || y > area.bottom() {
            return None;
        }
        let mut top = area.y - self.view.scroll_top;
        for row in self.model.rows() {
            let h = self.row_height(row);
            if y >= top && y < top + h {
                return Some(row.id);
            }
            top += h + self.options.row_gap;
            if top > y {
                break;
            }
        }
        None
    }
}

/// Whether `[start, start + len]` overlaps the half-open window `[lo, hi)`.
/// Zero-length spans count when they sit inside the window.
fn spans_overlap(start: f64, len: f64, lo: f64, hi: f64) -> bool {
    if len <= 0.0 {
        start >= lo && start < hi
    } else {
        start < hi && start + len > lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TimelineOptions {
        TimelineOptions {
            header_height: 20.0,
            left_margin: 0.0,
            row_height: 20.0,
            row_gap: 0.0,
            ..TimelineOptions::default()
        }
    }

    fn view(scroll_top: f64) -> ViewState {
        ViewState {
            width: 400.0,
            height: 100.0,
            scroll_top,
            ..ViewState::default()
        }
    }

    /// Ten rows, each with one keyframe at 1000 ms (100 px).
    fn model() -> TimelineModel {
        let mut model = TimelineModel::new();
        for _ in 0..10 {
            let r = model.add_row().unwrap();
            let _ = model.add_keyframe(r, 1000.0);
        }
        model
    }

    #[test]
    fn empty_model_has_no_rows() {
        let model = TimelineModel::new();
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);
        assert!(layout.compute_visible_rows(true).rows.is_empty());
        assert_eq!(layout.content_height(), 0.0);
    }

    #[test]
    fn only_rows_in_window_are_returned() {
        let model = model();
        let (o, v) = (options(), view(50.0));
        let layout = Layout::new(&model, &o, &v);
        let calc = layout.compute_visible_rows(false);
        // Window is content y 50..130 → rows 2 (40..60) through 6 (120..140).
        let indices: Vec<usize> = calc.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 3, 4, 5, 6]);
        assert_eq!(calc.rows[0].y, 20.0 + 40.0 - 50.0);
        assert_eq!(calc.content_height, 200.0);
    }

    #[test]
    fn visible_count_matches_intersecting_rows() {
        let model = model();
        let o = options();
        for scroll in [0.0, 7.0, 33.0, 100.0, 120.0, 500.0] {
            let v = view(scroll);
            let layout = Layout::new(&model, &o, &v);
            let area = layout.rows_area();
            let all = layout.compute_all_rows(false);
            let expected = all
                .rows
                .iter()
                .filter(|r| r.y < area.bottom() && r.y + r.height > area.y)
                .count();
            assert_eq!(layout.compute_visible_rows(false).rows.len(), expected, "scroll={scroll}");
        }
    }

    #[test]
    fn zero_height_row_is_legal() {
        let mut model = TimelineModel::new();
        let r = model.add_row().unwrap();
        if let Some(row) = model.row_mut(r) {
            row.height = Some(0.0);
        }
        let _ = model.add_keyframe(r, 100.0);
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);
        let calc = layout.compute_visible_rows(true);
        assert_eq!(calc.rows.len(), 1);
        assert_eq!(calc.rows[0].rect.h, 0.0);
        let kf = model.keyframes().next().map(|k| layout.keyframe_rect(k, &calc.rows[0]));
        assert_eq!(kf.map(|r| r.h), Some(0.0));
    }

    #[test]
    fn offscreen_keyframes_are_not_in_visible_range() {
        let mut model = TimelineModel::new();
        let r = model.add_row().unwrap();
        let near = model.add_keyframe(r, 100.0).unwrap_or(KeyframeId(0));
        let _far = model.add_keyframe(r, 100_000.0);
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);
        let calc = layout.compute_visible_rows(false);
        assert_eq!(calc.rows[0].keyframes, vec![near]);
        assert_eq!(layout.compute_all_rows(false).rows[0].keyframes.len(), 2);
    }

    #[test]
    fn stripes_group_keyframes() {
        let mut model = TimelineModel::new();
        let r = model.add_row().unwrap();
        for (val, group) in [(100.0, "a"), (500.0, "a"), (800.0, "b"), (900.0, "b"), (50.0, "c")] {
            if let Ok(id) = model.add_keyframe(r, val)
                && let Some(k) = model.keyframe_mut(id)
            {
                k.group = Some(group.to_string());
            }
        }
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);
        let calc = layout.compute_visible_rows(true);
        let stripes = &calc.rows[0].stripes;
        // Single-keyframe group "c" has no stripe.
        assert_eq!(stripes.len(), 2);
        assert_eq!(stripes[0].rect.x, 10.0);
        assert_eq!(stripes[0].rect.w, 40.0);
        assert_eq!(stripes[1].min_val, 800.0);
    }

    #[test]
    fn cut_bounds_reports_clipped_edges() {
        let model = TimelineModel::new();
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);

        let cut = layout.cut_bounds(Rect::new(-10.0, 10.0, 50.0, 30.0));
        let Some(cut) = cut else {
            unreachable!("rect overlaps the rows area");
        };
        assert_eq!(cut.rect, Rect::new(0.0, 20.0, 40.0, 20.0));
        assert!(cut.cut_left && cut.cut_top);
        assert!(!cut.cut_right && !cut.cut_bottom);

        assert!(layout.cut_bounds(Rect::new(500.0, 30.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn visits_keyframes_row_by_row() {
        let model = model();
        let (o, v) = (options(), view(0.0));
        let layout = Layout::new(&model, &o, &v);
        let mut visits = Vec::new();
        layout.for_each_visible_keyframe(false, |visit| {
            visits.push((visit.row_index, visit.keyframe_index, visit.new_row));
        });
        // Rows area is 80 px tall → four 20 px rows.
        assert_eq!(visits, vec![(0, 0, true), (1, 0, true), (2, 0, true), (3, 0, true)]);
    }

    #[test]
    fn row_lookup_by_y() {
        let model = model();
        let (o, v) = (options(), view(10.0));
        let layout = Layout::new(&model, &o, &v);
        assert_eq!(layout.row_at_y(25.0), Some(RowId(0)));
        assert_eq!(layout.row_at_y(35.0), Some(RowId(1)));
        assert_eq!(layout.row_at_y(5.0), None);
    }
}
