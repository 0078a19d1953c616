use keyline_protocol::{Point, Rect, RenderCommand};

use crate::autopan::AutoPanner;
use crate::coords::{CoordinateMapper, ViewState};
use crate::events::{
    ClickEvent, DragEvent, EventSource, Events, ScrollEvent, SelectionEvent, SubscriptionId,
    TimeChangedEvent,
};
use crate::hit_test::{self, ClickableElement};
use crate::input::Modifiers;
use crate::interaction::{CursorHint, InteractionState, LastClick};
use crate::layout::Layout;
use crate::model::{Keyframe, KeyframeId, ModelError, RowId, TimelineModel};
use crate::options::{InteractionMode, TimelineOptions};
use crate::selection::{self, Selector};
use crate::timers::{TimerId, TimerKind, TimerQueue};
use crate::views::{self, LabelFn, Scene};

/// Formats a gauge tick value (ms) into its label.
pub type LabelFormatter = Box<LabelFn>;

/// The timeline component: owns the model, the viewport and the interaction
/// state, and turns host input into model edits, events and render commands.
///
/// The host drives it with input events, [`tick`](Self::tick) for timers and
/// [`take_frame`](Self::take_frame) at each paint opportunity.
pub struct Timeline {
    pub(crate) options: TimelineOptions,
    pub(crate) model: TimelineModel,
    pub(crate) view: ViewState,
    /// Width of the virtual scroll content in pixels.
    pub(crate) content_width: f64,
    pub(crate) time: f64,
    pub(crate) modifiers: Modifiers,
    pub(crate) state: InteractionState,
    pub(crate) autopan: AutoPanner,
    pub(crate) timers: TimerQueue,
    scroll_finished_timer: Option<TimerId>,
    pub(crate) last_click: Option<LastClick>,
    pub(crate) cursor: CursorHint,
    pub(crate) events: Events,
    label_formatter: Option<LabelFormatter>,
    /// Pixel ratio reported by the host, used unless the options override it.
    host_pixel_ratio: f64,
    needs_redraw: bool,
    /// Latest host timestamp seen through input or `tick`.
    pub(crate) now_ms: f64,
    disposed: bool,
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("view", &self.view)
            .field("time", &self.time)
            .field("state", &self.state)
            .field("keyframes", &self.model.keyframe_count())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineOptions::default())
    }
}

impl Timeline {
    pub fn new(options: TimelineOptions) -> Self {
        let options = options.sanitized();
        let view = ViewState {
            zoom: options.zoom,
            pixel_ratio: options.pixel_ratio.unwrap_or(1.0),
            ..ViewState::default()
        };
        Self {
            options,
            model: TimelineModel::new(),
            view,
            content_width: 0.0,
            time: 0.0,
            modifiers: Modifiers::NONE,
            state: InteractionState::Idle,
            autopan: AutoPanner::default(),
            timers: TimerQueue::new(),
            scroll_finished_timer: None,
            last_click: None,
            cursor: CursorHint::Default,
            events: Events::default(),
            label_formatter: None,
            host_pixel_ratio: 1.0,
            needs_redraw: true,
            now_ms: 0.0,
            disposed: false,
        }
    }

    pub fn with_model(options: TimelineOptions, model: TimelineModel) -> Self {
        let mut timeline = Self::new(options);
        timeline.set_model(model);
        timeline
    }

    pub(crate) fn layout(&self) -> Layout<'_> {
        Layout::new(&self.model, &self.options, &self.view)
    }

    pub(crate) fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(&self.view, &self.options)
    }

    // ---- time ----

    pub fn get_time(&self) -> f64 {
        self.time
    }

    /// Move the time cursor. Returns whether it moved.
    pub fn set_time(&mut self, val: f64) -> bool {
        self.set_time_internal(val, EventSource::Api)
    }

    pub(crate) fn set_time_internal(&mut self, val: f64, source: EventSource) -> bool {
        if self.disposed || !val.is_finite() {
            return false;
        }
        let mut val = val.max(self.model.min);
        if let Some(max) = self.model.max {
            val = val.min(max);
        }
        if val == self.time {
            return false;
        }
        let prev_val = self.time;
        self.time = val;
        self.events.time_changed.emit(&TimeChangedEvent {
            val,
            prev_val,
            source,
        });
        self.redraw();
        true
    }

    // ---- coordinates ----

    /// Time at `px` pixels from the scrolled view origin. The left margin
    /// is not part of this mapping.
    pub fn px_to_val(&self, px: f64) -> f64 {
        self.mapper().px_to_value(px, false)
    }

    /// Inverse of [`px_to_val`](Self::px_to_val).
    pub fn val_to_px(&self, val: f64) -> f64 {
        self.mapper().value_to_px(val, false)
    }

    /// Time under a canvas x coordinate, as delivered by pointer events.
    pub(crate) fn canvas_x_to_val(&self, x: f64) -> f64 {
        self.mapper().canvas_x_to_value(x)
    }

    /// `val` rounded to the current grid, unchanged when snapping is off.
    pub fn snap_val(&self, val: f64) -> f64 {
        self.snap_if(val, true)
    }

    pub(crate) fn snap_if(&self, val: f64, allowed: bool) -> f64 {
        if allowed && self.options.snap_enabled {
            self.mapper().snap(val)
        } else {
            val
        }
    }

    pub fn element_from_point(&self, point: Point) -> Vec<ClickableElement> {
        hit_test::element_from_point(&self.layout(), self.time, point, self.options.click_radius)
    }

    pub fn get_row_by_y(&self, y: f64) -> Option<RowId> {
        self.layout().row_at_y(y)
    }

    // ---- selection ----

    pub fn get_selected_elements(&self) -> Vec<&Keyframe> {
        self.model.keyframes().filter(|k| k.selected).collect()
    }

    /// Select or deselect every keyframe. Returns whether anything changed.
    pub fn select(&mut self, is_selected: bool) -> bool {
        self.apply_selection(is_selected, Selector::All, true, &Default::default())
    }

    /// Make `id` the only selected keyframe.
    pub fn select_keyframe(&mut self, id: KeyframeId) -> Result<bool, ModelError> {
        if self.model.keyframe(id).is_none() {
            return Err(ModelError::UnknownKeyframe(id));
        }
        Ok(self.apply_selection(true, Selector::Keyframe(id), true, &Default::default()))
    }

    pub(crate) fn apply_selection(
        &mut self,
        is_selected: bool,
        selector: Selector,
        ignore_others: bool,
        baseline: &std::collections::HashSet<KeyframeId>,
    ) -> bool {
        if self.disposed {
            return false;
        }
        let change = selection::perform_selection(
            &mut self.model,
            &self.options,
            &self.view,
            is_selected,
            selector,
            ignore_others,
            baseline,
        );
        if change.changed {
            self.events.selected.emit(&SelectionEvent {
                selected: change.selected,
            });
            self.redraw();
        }
        change.changed
    }

    // ---- options and model ----

    pub fn options(&self) -> &TimelineOptions {
        &self.options
    }

    /// Replace the options. Invalid values are corrected, never rejected.
    pub fn set_options(&mut self, options: TimelineOptions) {
        let options = options.sanitized();
        let zoom = if options.zoom != self.options.zoom {
            options.zoom
        } else {
            self.view.zoom.clamp(options.zoom_min, options.zoom_max)
        };
        if options.interaction_mode == InteractionMode::None {
            self.cancel_interaction();
        }
        self.options = options;
        self.view.zoom = zoom;
        self.view.pixel_ratio = self.options.pixel_ratio.unwrap_or(self.host_pixel_ratio);
        self.fit_content_width();
        self.clamp_scroll();
        self.redraw();
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.options.interaction_mode
    }

    pub fn set_interaction_mode(&mut self, mode: InteractionMode) {
        if mode == self.options.interaction_mode {
            return;
        }
        if !self.state.is_idle() {
            self.cancel_interaction();
        }
        self.options.interaction_mode = mode;
        self.cursor = CursorHint::Default;
    }

    /// Install a custom gauge label function.
    pub fn set_label_formatter(&mut self, formatter: impl Fn(f64) -> String + 'static) {
        self.label_formatter = Some(Box::new(formatter));
        self.redraw();
    }

    pub fn clear_label_formatter(&mut self) {
        self.label_formatter = None;
        self.redraw();
    }

    pub fn model(&self) -> &TimelineModel {
        &self.model
    }

    /// Mutable access for host-side edits. Geometry is recomputed on the
    /// next query and a redraw is requested.
    pub fn model_mut(&mut self) -> &mut TimelineModel {
        self.redraw();
        &mut self.model
    }

    /// Replace the model. An active press or drag is aborted first.
    pub fn set_model(&mut self, model: TimelineModel) {
        if self.disposed {
            return;
        }
        self.cancel_interaction();
        log::info!(
            "model set: {} rows, {} keyframes",
            model.rows().len(),
            model.keyframe_count()
        );
        self.model = model;
        self.last_click = None;
        self.fit_content_width();
        self.clamp_scroll();
        self.redraw();
    }

    // ---- viewport ----

    /// New canvas size in logical pixels and device pixel ratio.
    pub fn rescale(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        let finite = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.view.width = finite(width);
        self.view.height = finite(height);
        self.host_pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        self.view.pixel_ratio = self.options.pixel_ratio.unwrap_or(self.host_pixel_ratio);
        self.fit_content_width();
        self.clamp_scroll();
        self.redraw();
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn content_width(&self) -> f64 {
        self.content_width
    }

    pub fn scroll_left(&self) -> f64 {
        self.view.scroll_left
    }

    pub fn scroll_top(&self) -> f64 {
        self.view.scroll_top
    }

    pub fn max_scroll_left(&self) -> f64 {
        (self.content_width - self.view.width).max(0.0)
    }

    pub fn max_scroll_top(&self) -> f64 {
        (self.options.header_height + self.layout().content_height() - self.view.height).max(0.0)
    }

    pub fn set_scroll_left(&mut self, value: f64) -> bool {
        self.scroll_to(value, self.view.scroll_top, EventSource::Api, false)
    }

    pub fn set_scroll_top(&mut self, value: f64) -> bool {
        self.scroll_to(self.view.scroll_left, value, EventSource::Api, false)
    }

    /// Scroll to the right end of the content.
    pub fn scroll_to_max_left(&mut self) -> bool {
        self.fit_content_width();
        self.scroll_to(self.max_scroll_left(), self.view.scroll_top, EventSource::Api, false)
    }

    /// Clamp and apply a scroll position. With `grow`, scrolling past the
    /// right end extends the content instead of stopping.
    pub(crate) fn scroll_to(&mut self, left: f64, top: f64, source: EventSource, grow: bool) -> bool {
        if self.disposed || !left.is_finite() || !top.is_finite() {
            return false;
        }
        let mut left = left.max(0.0);
        if grow && left + self.view.width > self.content_width {
            self.content_width = left + self.view.width;
        }
        left = left.min(self.max_scroll_left());
        let top = top.clamp(0.0, self.max_scroll_top());

        let prev_scroll_left = self.view.scroll_left;
        let prev_scroll_top = self.view.scroll_top;
        if left == prev_scroll_left && top == prev_scroll_top {
            return false;
        }
        self.view.scroll_left = left;
        self.view.scroll_top = top;

        self.events.scroll.emit(&ScrollEvent {
            scroll_left: left,
            scroll_top: top,
            prev_scroll_left,
            prev_scroll_top,
            source,
        });
        if let Some(id) = self.scroll_finished_timer.take() {
            self.timers.cancel(id);
        }
        self.scroll_finished_timer = Some(self.timers.schedule_once(
            TimerKind::ScrollFinished,
            self.now_ms,
            self.options.scroll_finished_ms,
        ));
        self.redraw();
        true
    }

    fn clamp_scroll(&mut self) {
        self.scroll_to(self.view.scroll_left, self.view.scroll_top, EventSource::Api, false);
    }

    /// Size the virtual content so the last keyframe (or the time cursor)
    /// can be scrolled one screen width past, without cutting off the
    /// current scroll position.
    pub(crate) fn fit_content_width(&mut self) {
        let last = self
            .model
            .value_range()
            .map_or(self.time, |(_, hi)| hi.max(self.time));
        let needed = self.mapper().value_to_px(last, true) + self.options.left_margin + self.view.width;
        self.content_width = needed
            .max(self.view.width)
            .max(self.view.scroll_left + self.view.width);
    }

    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    /// Zoom keeping the time at the left edge of the rows in place.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.zoom_at(zoom, self.options.left_margin)
    }

    /// Zoom keeping the time under canvas x `anchor_px` in place.
    pub fn zoom_at(&mut self, zoom: f64, anchor_px: f64) -> bool {
        if self.disposed || !zoom.is_finite() {
            return false;
        }
        let zoom = zoom.clamp(self.options.zoom_min, self.options.zoom_max);
        if zoom == self.view.zoom {
            return false;
        }
        let anchor_val = self.canvas_x_to_val(anchor_px);
        self.view.zoom = zoom;
        self.fit_content_width();
        let left = self.mapper().value_to_px(anchor_val, true) + self.options.left_margin - anchor_px;
        self.scroll_to(left, self.view.scroll_top, EventSource::User, true);
        self.redraw();
        true
    }

    // ---- painting ----

    /// Request a paint. Requests collapse until the next
    /// [`take_frame`](Self::take_frame).
    pub fn redraw(&mut self) {
        if !self.disposed {
            self.needs_redraw = true;
        }
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Render commands for the pending paint, `None` when nothing changed
    /// since the last frame.
    pub fn take_frame(&mut self) -> Option<Vec<RenderCommand>> {
        if self.disposed || !self.needs_redraw {
            return None;
        }
        self.needs_redraw = false;
        Some(self.render())
    }

    /// Render the current state unconditionally.
    pub fn render(&self) -> Vec<RenderCommand> {
        let scene = Scene {
            layout: self.layout(),
            time: self.time,
            selection_rect: self.selection_rect(),
            label_formatter: self.label_formatter.as_deref(),
        };
        views::render_timeline(&scene)
    }

    /// Screen rectangle of an active rubber-band selection.
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::DraggingSelection(drag) => Some(drag.screen_rect(&self.view)),
            _ => None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn cursor_hint(&self) -> CursorHint {
        self.cursor
    }

    // ---- timers ----

    /// Advance the host clock to `now_ms` and fire due timers.
    pub fn tick(&mut self, now_ms: f64) {
        if self.disposed {
            return;
        }
        self.now_ms = self.now_ms.max(now_ms);
        while let Some((id, kind)) = self.timers.pop_due(now_ms) {
            match kind {
                TimerKind::ClickTimeout => self.on_click_timeout(id),
                TimerKind::AutoPan => self.on_auto_pan_tick(id, now_ms),
                TimerKind::ScrollFinished => self.fire_scroll_finished(id),
            }
        }
    }

    /// Host time at which [`tick`](Self::tick) should next be called.
    pub fn next_deadline(&self) -> Option<f64> {
        if self.disposed {
            None
        } else {
            self.timers.next_deadline()
        }
    }

    fn fire_scroll_finished(&mut self, id: TimerId) {
        if self.scroll_finished_timer != Some(id) {
            return;
        }
        self.scroll_finished_timer = None;
        self.fit_content_width();
        self.events.scroll_finished.emit(&ScrollEvent {
            scroll_left: self.view.scroll_left,
            scroll_top: self.view.scroll_top,
            prev_scroll_left: self.view.scroll_left,
            prev_scroll_top: self.view.scroll_top,
            source: EventSource::User,
        });
    }

    // ---- subscriptions ----

    pub fn on_drag_started(&mut self, callback: impl FnMut(&DragEvent) + 'static) -> SubscriptionId {
        self.events.on_drag_started(callback)
    }

    pub fn on_drag(&mut self, callback: impl FnMut(&DragEvent) + 'static) -> SubscriptionId {
        self.events.on_drag(callback)
    }

    pub fn on_drag_finished(&mut self, callback: impl FnMut(&DragEvent) + 'static) -> SubscriptionId {
        self.events.on_drag_finished(callback)
    }

    pub fn on_scroll(&mut self, callback: impl FnMut(&ScrollEvent) + 'static) -> SubscriptionId {
        self.events.on_scroll(callback)
    }

    pub fn on_scroll_finished(&mut self, callback: impl FnMut(&ScrollEvent) + 'static) -> SubscriptionId {
        self.events.on_scroll_finished(callback)
    }

    pub fn on_selected(&mut self, callback: impl FnMut(&SelectionEvent) + 'static) -> SubscriptionId {
        self.events.on_selected(callback)
    }

    pub fn on_time_changed(&mut self, callback: impl FnMut(&TimeChangedEvent) + 'static) -> SubscriptionId {
        self.events.on_time_changed(callback)
    }

    pub fn on_double_click(&mut self, callback: impl FnMut(&ClickEvent) + 'static) -> SubscriptionId {
        self.events.on_double_click(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ---- lifetime ----

    /// Tear down timers and subscriptions. Later input is ignored; calling
    /// this again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.autopan.stop(&mut self.timers);
        self.timers.cancel_all();
        self.scroll_finished_timer = None;
        self.state = InteractionState::Idle;
        self.events.clear();
        self.label_formatter = None;
        self.needs_redraw = false;
        self.disposed = true;
        log::info!("timeline disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn timeline() -> Timeline {
        let options = TimelineOptions {
            left_margin: 0.0,
            ..TimelineOptions::default()
        };
        let mut model = TimelineModel::new();
        let r = model.add_row().unwrap();
        let _ = model.add_keyframe(r, 1000.0);
        let _ = model.add_keyframe(r, 4000.0);
        let mut t = Timeline::with_model(options, model);
        t.rescale(1000.0, 300.0, 1.0);
        t
    }

    #[test]
    fn redraw_requests_coalesce() {
        let mut t = timeline();
        assert!(t.take_frame().is_some());
        t.redraw();
        t.redraw();
        t.set_time(500.0);
        assert!(t.take_frame().is_some());
        assert!(t.take_frame().is_none());
    }

    #[test]
    fn scroll_is_clamped_and_reported() {
        let mut t = timeline();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        t.on_scroll(move |e| s.borrow_mut().push(e.scroll_left));

        assert!(!t.set_scroll_left(-50.0));
        assert!(t.set_scroll_left(1e9));
        assert_eq!(t.scroll_left(), t.max_scroll_left());
        // 4000 ms at 0.1 px/ms plus one screen width.
        assert_eq!(t.content_width(), 1400.0);
        assert_eq!(*seen.borrow(), vec![400.0]);
    }

    #[test]
    fn scroll_finished_fires_after_quiet_period() {
        let mut t = timeline();
        let done = Rc::new(RefCell::new(0));
        let d = Rc::clone(&done);
        t.on_scroll_finished(move |_| *d.borrow_mut() += 1);

        t.set_scroll_left(100.0);
        assert_eq!(t.next_deadline(), Some(500.0));
        t.tick(400.0);
        assert_eq!(*done.borrow(), 0);
        t.tick(500.0);
        assert_eq!(*done.borrow(), 1);
        assert_eq!(t.next_deadline(), None);
    }

    #[test]
    fn zoom_keeps_anchor_time_in_place() {
        let mut t = timeline();
        let before = t.canvas_x_to_val(300.0);
        assert!(t.zoom_at(2.0, 300.0));
        assert!((t.canvas_x_to_val(300.0) - before).abs() < 1e-6);
        assert!(t.zoom_at(100.0, 0.0));
        assert_eq!(t.zoom(), 8.0);
    }

    #[test]
    fn time_is_clamped_to_model_range() {
        let mut t = timeline();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        t.on_time_changed(move |e| *s.borrow_mut() = Some((e.val, e.source)));
        assert!(!t.set_time(-20.0));
        assert!(t.set_time(2500.0));
        assert_eq!(*seen.borrow(), Some((2500.0, EventSource::Api)));
        assert!(!t.set_time(2500.0));
    }

    #[test]
    fn select_keyframe_rejects_unknown_ids() {
        let mut t = timeline();
        assert!(matches!(
            t.select_keyframe(KeyframeId(99)),
            Err(ModelError::UnknownKeyframe(KeyframeId(99)))
        ));
        assert!(matches!(t.select_keyframe(KeyframeId(1)), Ok(true)));
        assert_eq!(t.get_selected_elements().len(), 1);
        assert!(t.select(true));
        assert_eq!(t.get_selected_elements().len(), 2);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut t = timeline();
        t.on_time_changed(|_| {});
        t.set_scroll_left(10.0);
        t.dispose();
        t.dispose();
        assert!(t.is_disposed());
        assert_eq!(t.next_deadline(), None);
        assert!(t.take_frame().is_none());
        assert!(!t.set_time(100.0));
        assert_eq!(t.events.subscriber_count(), 0);
    }
}
