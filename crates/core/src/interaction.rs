//! Pointer, keyboard and wheel handling.
//!
//! A press starts in [`InteractionState::Deciding`]. Moving past the drag
//! threshold turns it into one of the dragging states; releasing it first
//! makes it a click. The click timeout only marks a stationary press as
//! held ([`InteractionState::Clicking`]), it does not end it.

use std::collections::HashSet;

use keyline_protocol::{Point, Rect};
use serde::Serialize;

use crate::autopan::pan_velocity;
use crate::coords::ViewState;
use crate::events::{ClickEvent, DragEvent, EventSource};
use crate::hit_test::{self, ClickableElement, ElementKind};
use crate::input::{Key, KeyEvent, Modifiers, PointerEvent, WheelEvent};
use crate::model::KeyframeId;
use crate::options::InteractionMode;
use crate::selection::Selector;
use crate::timeline::Timeline;
use crate::timers::{TimerId, TimerKind};

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
    Crosshair,
    Move,
}

/// What a press turns into once it moves past the threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum DragIntent {
    Element(ClickableElement),
    Selection,
    Pan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Press {
    pub pointer_id: u64,
    pub start: Point,
    pub start_ms: f64,
    /// Highest-priority element under the press.
    pub clicked: Option<ClickableElement>,
    pub intent: DragIntent,
    /// Modifiers held when the press started.
    pub modifiers: Modifiers,
    /// The press already made its keyframe the exclusive selection.
    pub selected_on_down: bool,
    pub(crate) timer: Option<TimerId>,
}

/// An element drag in progress. Keyframe values are written on every move,
/// so `originals` is what a host needs to revert.
#[derive(Debug, Clone, PartialEq)]
pub struct DraggableData {
    pub pointer_id: u64,
    pub target: ClickableElement,
    pub start_val: f64,
    /// Time between the pressed point and the target's value.
    pub pointer_offset: f64,
    pub val: f64,
    pub prev_val: f64,
    pub originals: Vec<(KeyframeId, f64)>,
    pub last_pos: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionDrag {
    pub pointer_id: u64,
    /// Press position in content coordinates, so it sticks to the content
    /// while the view scrolls.
    pub anchor: Point,
    /// Latest pointer position on screen.
    pub current: Point,
    /// Selection before the drag, kept when extending.
    pub baseline: HashSet<KeyframeId>,
    pub ignore_others: bool,
}

impl SelectionDrag {
    pub fn screen_rect(&self, view: &ViewState) -> Rect {
        let anchor = Point::new(self.anchor.x - view.scroll_left, self.anchor.y - view.scroll_top);
        Rect::from_points(anchor, self.current)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanDrag {
    pub pointer_id: u64,
    pub start: Point,
    /// Scroll offsets when the pan started.
    pub start_scroll: Point,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Deciding(Press),
    Clicking(Press),
    DraggingKeyframe(DraggableData),
    DraggingSelection(SelectionDrag),
    Panning(PanDrag),
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Deciding(_) => "deciding",
            InteractionState::Clicking(_) => "clicking",
            InteractionState::DraggingKeyframe(_) => "dragging-keyframe",
            InteractionState::DraggingSelection(_) => "dragging-selection",
            InteractionState::Panning(_) => "panning",
        }
    }

    pub fn pointer_id(&self) -> Option<u64> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Deciding(p) | InteractionState::Clicking(p) => Some(p.pointer_id),
            InteractionState::DraggingKeyframe(d) => Some(d.pointer_id),
            InteractionState::DraggingSelection(s) => Some(s.pointer_id),
            InteractionState::Panning(p) => Some(p.pointer_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LastClick {
    pos: Point,
    time_ms: f64,
}

impl Timeline {
    fn accepts_pointer(&self) -> bool {
        !self.is_disposed() && self.options.interaction_mode != InteractionMode::None
    }

    fn observe(&mut self, modifiers: Modifiers, time_ms: f64) {
        self.modifiers = modifiers;
        if time_ms.is_finite() {
            self.now_ms = self.now_ms.max(time_ms);
        }
    }

    pub fn on_pointer_down(&mut self, ev: PointerEvent) {
        if !self.accepts_pointer() {
            return;
        }
        self.observe(ev.modifiers, ev.time_ms);
        if !self.state.is_idle() {
            log::debug!(
                "ignoring pointer-down of pointer {} while {}",
                ev.id,
                self.state.name()
            );
            return;
        }

        let mode = self.options.interaction_mode;
        let hits = self.element_from_point(ev.pos);
        let control = ev.modifiers.control();
        let draggable = if matches!(mode, InteractionMode::Selection | InteractionMode::Pan) && !control {
            hit_test::find_draggable(&self.model, &self.options, &hits, self.canvas_x_to_val(ev.pos.x))
        } else {
            None
        };
        let intent = match draggable {
            Some(target) => DragIntent::Element(target),
            None if control || mode != InteractionMode::Selection => DragIntent::Pan,
            None => DragIntent::Selection,
        };

        // Pressing an unselected keyframe makes it the selection right away,
        // so the drag that may follow moves it alone.
        let mut selected_on_down = false;
        if let DragIntent::Element(target) = &intent
            && target.kind == ElementKind::Keyframe
            && !ev.modifiers.shift
            && let Some(id) = target.keyframe
            && self.model.keyframe(id).is_some_and(|k| !k.selected)
        {
            selected_on_down = self.apply_selection(true, Selector::Keyframe(id), true, &HashSet::new());
        }

        if matches!(intent, DragIntent::Element(_)) {
            self.cursor = CursorHint::Grabbing;
        }
        let timer = self.timers.schedule_once(
            TimerKind::ClickTimeout,
            self.now_ms,
            self.options.click_timeout_ms,
        );
        log::trace!("press at ({}, {}) intent {:?}", ev.pos.x, ev.pos.y, intent);
        self.state = InteractionState::Deciding(Press {
            pointer_id: ev.id,
            start: ev.pos,
            start_ms: ev.time_ms,
            clicked: hits.into_iter().next(),
            intent,
            modifiers: ev.modifiers,
            selected_on_down,
            timer: Some(timer),
        });
    }

    pub fn on_pointer_move(&mut self, ev: PointerEvent) {
        if !self.accepts_pointer() {
            return;
        }
        self.observe(ev.modifiers, ev.time_ms);

        match std::mem::take(&mut self.state) {
            InteractionState::Idle => self.update_hover(ev.pos),
            state if state.pointer_id() != Some(ev.id) => {
                log::debug!("ignoring move of pointer {} while {}", ev.id, state.name());
                self.state = state;
            }
            InteractionState::Deciding(press) | InteractionState::Clicking(press)
                if press.start.distance(ev.pos) > self.options.drag_threshold_px =>
            {
                self.begin_drag(press, ev.pos);
            }
            InteractionState::DraggingKeyframe(mut drag) => {
                self.apply_drag(&mut drag, ev.pos);
                self.state = InteractionState::DraggingKeyframe(drag);
            }
            InteractionState::DraggingSelection(mut drag) => {
                drag.current = ev.pos;
                self.update_selection_drag(&drag);
                self.update_auto_pan(&drag);
                self.state = InteractionState::DraggingSelection(drag);
            }
            InteractionState::Panning(pan) => {
                self.scroll_by_pan(&pan, ev.pos);
                self.state = InteractionState::Panning(pan);
            }
            // Still inside the threshold.
            state => self.state = state,
        }
    }

    pub fn on_pointer_up(&mut self, ev: PointerEvent) {
        if !self.accepts_pointer() {
            return;
        }
        self.observe(ev.modifiers, ev.time_ms);

        match std::mem::take(&mut self.state) {
            InteractionState::Idle => {
                log::debug!("ignoring pointer-up of pointer {} without a press", ev.id);
            }
            state if state.pointer_id() != Some(ev.id) => {
                log::debug!("ignoring pointer-up of pointer {} while {}", ev.id, state.name());
                self.state = state;
                return;
            }
            InteractionState::Deciding(press) | InteractionState::Clicking(press) => {
                if let Some(timer) = press.timer {
                    self.timers.cancel(timer);
                }
                self.perform_click(&press, ev.time_ms);
            }
            InteractionState::DraggingKeyframe(mut drag) => {
                self.apply_drag(&mut drag, ev.pos);
                self.finish_drag(&drag, false);
            }
            InteractionState::DraggingSelection(mut drag) => {
                drag.current = ev.pos;
                self.update_selection_drag(&drag);
                self.autopan.stop(&mut self.timers);
                self.redraw();
            }
            InteractionState::Panning(pan) => self.scroll_by_pan(&pan, ev.pos),
        }
        self.update_hover(ev.pos);
    }

    /// The host lost track of pointer `id` (capture lost, touch cancelled).
    pub fn on_pointer_cancel(&mut self, id: u64) {
        if self.state.pointer_id() == Some(id) {
            self.cancel_interaction();
        }
    }

    /// The surface lost focus: modifiers are released and any press ends.
    pub fn on_blur(&mut self) {
        self.modifiers = Modifiers::NONE;
        self.cancel_interaction();
    }

    /// Abort whatever the pointer is doing. Keyframe moves already applied
    /// stay; `drag_finished` reports the drag as cancelled.
    pub fn cancel_interaction(&mut self) {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => return,
            InteractionState::Deciding(press) | InteractionState::Clicking(press) => {
                if let Some(timer) = press.timer {
                    self.timers.cancel(timer);
                }
            }
            InteractionState::DraggingKeyframe(drag) => self.finish_drag(&drag, true),
            InteractionState::DraggingSelection(_) => {
                self.autopan.stop(&mut self.timers);
                self.redraw();
            }
            InteractionState::Panning(_) => {}
        }
        log::debug!("interaction cancelled");
        self.cursor = CursorHint::Default;
    }

    /// Returns whether the key was consumed.
    pub fn on_key(&mut self, ev: KeyEvent) -> bool {
        if self.is_disposed() {
            return false;
        }
        let mut modifiers = ev.modifiers;
        match ev.key {
            Key::Control => modifiers.ctrl = ev.pressed,
            Key::Shift => modifiers.shift = ev.pressed,
            Key::Alt => modifiers.alt = ev.pressed,
            Key::Meta => modifiers.meta = ev.pressed,
            _ => {}
        }
        let snapping_toggled = modifiers.control() != self.modifiers.control();
        self.observe(modifiers, ev.time_ms);
        if snapping_toggled {
            self.refresh_drag();
        }
        if !ev.pressed {
            return false;
        }

        match ev.key {
            Key::Escape if !self.state.is_idle() => {
                self.cancel_interaction();
                true
            }
            Key::Character(c)
                if c.eq_ignore_ascii_case(&'a')
                    && modifiers.control()
                    && self.options.interaction_mode != InteractionMode::NonInteractivePan =>
            {
                self.select(true);
                true
            }
            _ => false,
        }
    }

    pub fn on_wheel(&mut self, ev: WheelEvent) {
        if !self.accepts_pointer() {
            return;
        }
        self.observe(ev.modifiers, ev.time_ms);

        let left = self.view.scroll_left;
        let top = self.view.scroll_top;
        if ev.modifiers.control() {
            let factor = 1.0 + self.options.zoom_speed;
            let zoom = if ev.delta.y < 0.0 {
                self.view.zoom * factor
            } else if ev.delta.y > 0.0 {
                self.view.zoom / factor
            } else {
                return;
            };
            self.zoom_at(zoom, ev.pos.x);
        } else if ev.modifiers.shift {
            let dx = if ev.delta.x != 0.0 { ev.delta.x } else { ev.delta.y };
            self.scroll_to(left + dx, top, EventSource::User, false);
        } else {
            self.scroll_to(left + ev.delta.x, top + ev.delta.y, EventSource::User, false);
        }
        self.refresh_drag();
    }

    pub(crate) fn on_click_timeout(&mut self, id: TimerId) {
        match std::mem::take(&mut self.state) {
            InteractionState::Deciding(press) if press.timer == Some(id) => {
                log::trace!("press of pointer {} is held", press.pointer_id);
                self.state = InteractionState::Clicking(Press { timer: None, ..press });
            }
            state => self.state = state,
        }
    }

    pub(crate) fn on_auto_pan_tick(&mut self, id: TimerId, now_ms: f64) {
        if !self.autopan.owns(id) {
            self.timers.cancel(id);
            return;
        }
        let current = match &self.state {
            InteractionState::DraggingSelection(drag) => drag.current,
            _ => {
                self.autopan.stop(&mut self.timers);
                return;
            }
        };
        if self
            .autopan
            .check_update_speed_too_fast(now_ms, self.options.auto_pan_min_step_ms)
        {
            return;
        }
        let step = pan_velocity(current, self.auto_pan_bounds(), &self.options);
        if step.x == 0.0 && step.y == 0.0 {
            self.autopan.stop(&mut self.timers);
            return;
        }
        let left = self.view.scroll_left + step.x;
        let top = self.view.scroll_top + step.y;
        if self.scroll_to(left, top, EventSource::AutoPan, true) {
            self.refresh_drag();
        }
    }

    fn auto_pan_bounds(&self) -> Rect {
        let top = self.options.header_height;
        Rect::new(0.0, top, self.view.width, (self.view.height - top).max(0.0))
    }

    fn update_hover(&mut self, pos: Point) {
        self.cursor = match self.options.interaction_mode {
            InteractionMode::None | InteractionMode::Zoom => CursorHint::Default,
            InteractionMode::NonInteractivePan => CursorHint::Grab,
            InteractionMode::Selection | InteractionMode::Pan => {
                let hits = self.element_from_point(pos);
                let val = self.canvas_x_to_val(pos.x);
                if hit_test::find_draggable(&self.model, &self.options, &hits, val).is_some() {
                    CursorHint::Grab
                } else {
                    CursorHint::Default
                }
            }
        };
    }

    fn begin_drag(&mut self, press: Press, pos: Point) {
        if let Some(timer) = press.timer {
            self.timers.cancel(timer);
        }
        match press.intent {
            DragIntent::Element(target) => {
                let originals = self.drag_originals(&target);
                let start_val = target.val;
                let mut drag = DraggableData {
                    pointer_id: press.pointer_id,
                    pointer_offset: self.canvas_x_to_val(press.start.x) - start_val,
                    target,
                    start_val,
                    val: start_val,
                    prev_val: start_val,
                    originals,
                    last_pos: press.start,
                };
                log::trace!("drag of {:?} started", drag.target.kind);
                self.cursor = CursorHint::Grabbing;
                let event = self.drag_event(&drag, false);
                self.events.drag_started.emit(&event);
                self.apply_drag(&mut drag, pos);
                self.state = InteractionState::DraggingKeyframe(drag);
            }
            DragIntent::Selection => {
                let ignore_others = !press.modifiers.shift;
                let baseline = if ignore_others {
                    HashSet::new()
                } else {
                    self.model.selected_set()
                };
                let drag = SelectionDrag {
                    pointer_id: press.pointer_id,
                    anchor: Point::new(
                        press.start.x + self.view.scroll_left,
                        press.start.y + self.view.scroll_top,
                    ),
                    current: pos,
                    baseline,
                    ignore_others,
                };
                self.cursor = CursorHint::Crosshair;
                self.update_selection_drag(&drag);
                self.update_auto_pan(&drag);
                self.state = InteractionState::DraggingSelection(drag);
            }
            DragIntent::Pan => {
                let pan = PanDrag {
                    pointer_id: press.pointer_id,
                    start: press.start,
                    start_scroll: Point::new(self.view.scroll_left, self.view.scroll_top),
                };
                self.cursor = CursorHint::Move;
                self.scroll_by_pan(&pan, pos);
                self.state = InteractionState::Panning(pan);
            }
        }
    }

    /// Keyframes an element drag moves, with their current values.
    fn drag_originals(&mut self, target: &ClickableElement) -> Vec<(KeyframeId, f64)> {
        match target.kind {
            ElementKind::Keyframe => {
                let Some(id) = target.keyframe else {
                    return Vec::new();
                };
                // A shift-pressed keyframe joins the selection it drags with.
                if self.model.keyframe(id).is_some_and(|k| !k.selected) {
                    self.apply_selection(true, Selector::Keyframe(id), false, &HashSet::new());
                }
                let mut moved: Vec<(KeyframeId, f64)> = self
                    .model
                    .keyframes()
                    .filter(|k| {
                        k.selected
                            && k.draggable
                            && self.model.row(k.row).is_some_and(|r| r.keyframes_draggable)
                    })
                    .map(|k| (k.id, k.val))
                    .collect();
                if !moved.iter().any(|(kid, _)| *kid == id)
                    && let Some(k) = self.model.keyframe(id)
                {
                    moved.push((id, k.val));
                }
                moved
            }
            ElementKind::Stripe => {
                let Some(row) = target.row.and_then(|r| self.model.row(r)) else {
                    return Vec::new();
                };
                self.model
                    .row_keyframes(row)
                    .filter(|k| k.draggable && k.group == target.group)
                    .map(|k| (k.id, k.val))
                    .collect()
            }
            ElementKind::TimeCursor | ElementKind::Row => Vec::new(),
        }
    }

    /// Move the drag target under the pointer at `pos`.
    fn apply_drag(&mut self, drag: &mut DraggableData, pos: Point) {
        drag.last_pos = pos;
        let raw = self.canvas_x_to_val(pos.x) - drag.pointer_offset;
        let wanted = self.snap_if(raw, !self.modifiers.control());

        let val = if drag.target.kind == ElementKind::TimeCursor {
            self.set_time_internal(wanted, EventSource::User);
            self.time
        } else {
            let delta = self.clamp_drag_delta(&drag.originals, wanted - drag.start_val);
            for &(id, original) in &drag.originals {
                if let Some(k) = self.model.keyframe_mut(id) {
                    k.val = original + delta;
                }
            }
            drag.start_val + delta
        };

        if val != drag.val {
            drag.prev_val = drag.val;
            drag.val = val;
            self.redraw();
            let event = self.drag_event(drag, false);
            self.events.drag.emit(&event);
        }
    }

    /// Limit `delta` so every moved keyframe stays inside its row's bounds.
    /// All keyframes share the limit, keeping their spacing. When no shared
    /// delta fits every keyframe the drag does not move at all.
    fn clamp_drag_delta(&self, originals: &[(KeyframeId, f64)], delta: f64) -> f64 {
        let mut lo = f64::NEG_INFINITY;
        let mut hi = f64::INFINITY;
        for &(id, original) in originals {
            if let Some(k) = self.model.keyframe(id) {
                let (min, max) = self.model.value_bounds(k.row);
                lo = lo.max(min - original);
                hi = hi.min(max - original);
            }
        }
        if lo > hi {
            log::warn!("dragged keyframes have no common valid range ({lo} > {hi}), holding them in place");
            return 0.0;
        }
        delta.clamp(lo, hi)
    }

    fn finish_drag(&mut self, drag: &DraggableData, cancelled: bool) {
        log::trace!("drag finished at {} (cancelled: {cancelled})", drag.val);
        let event = self.drag_event(drag, cancelled);
        self.events.drag_finished.emit(&event);
        self.fit_content_width();
        self.redraw();
    }

    fn drag_event(&self, drag: &DraggableData, cancelled: bool) -> DragEvent {
        DragEvent {
            target: drag.target.clone(),
            elements: drag.originals.iter().map(|(id, _)| *id).collect(),
            start_val: drag.start_val,
            val: drag.val,
            prev_val: drag.prev_val,
            delta: drag.val - drag.start_val,
            point: drag.last_pos,
            cancelled,
        }
    }

    fn update_selection_drag(&mut self, drag: &SelectionDrag) {
        let rect = drag.screen_rect(&self.view);
        self.apply_selection(true, Selector::Rect(rect), drag.ignore_others, &drag.baseline);
        self.redraw();
    }

    fn update_auto_pan(&mut self, drag: &SelectionDrag) {
        let step = pan_velocity(drag.current, self.auto_pan_bounds(), &self.options);
        if step.x != 0.0 || step.y != 0.0 {
            self.autopan
                .start(&mut self.timers, self.now_ms, self.options.auto_pan_interval_ms);
        } else {
            self.autopan.stop(&mut self.timers);
        }
    }

    fn scroll_by_pan(&mut self, pan: &PanDrag, pos: Point) {
        let left = pan.start_scroll.x - (pos.x - pan.start.x);
        let top = pan.start_scroll.y - (pos.y - pan.start.y);
        self.scroll_to(left, top, EventSource::User, true);
    }

    /// Re-apply an active drag after the view or the modifiers changed under
    /// a pointer that did not move.
    fn refresh_drag(&mut self) {
        match std::mem::take(&mut self.state) {
            InteractionState::DraggingKeyframe(mut drag) => {
                let pos = drag.last_pos;
                self.apply_drag(&mut drag, pos);
                self.state = InteractionState::DraggingKeyframe(drag);
            }
            InteractionState::DraggingSelection(drag) => {
                self.update_selection_drag(&drag);
                self.state = InteractionState::DraggingSelection(drag);
            }
            state => self.state = state,
        }
    }

    fn perform_click(&mut self, press: &Press, time_ms: f64) {
        let mode = self.options.interaction_mode;
        let additive = press.modifiers.control() || press.modifiers.shift;
        let keyframe = press
            .clicked
            .as_ref()
            .filter(|e| e.kind == ElementKind::Keyframe)
            .and_then(|e| e.keyframe);

        match (mode, keyframe) {
            (InteractionMode::Zoom, _) => {
                let factor = 1.0 + self.options.zoom_speed;
                let zoom = if press.modifiers.control() || press.modifiers.alt {
                    self.view.zoom / factor
                } else {
                    self.view.zoom * factor
                };
                self.zoom_at(zoom, press.start.x);
            }
            (InteractionMode::Selection | InteractionMode::Pan, Some(id)) => {
                if !press.selected_on_down {
                    self.apply_selection(true, Selector::Keyframe(id), !additive, &HashSet::new());
                }
            }
            _ => {
                if !additive && mode != InteractionMode::NonInteractivePan {
                    self.select(false);
                }
                let val = self.snap_if(self.canvas_x_to_val(press.start.x), !press.modifiers.control());
                self.set_time_internal(val, EventSource::User);
            }
        }

        match self.last_click.take() {
            Some(last)
                if time_ms - last.time_ms <= self.options.double_click_ms
                    && last.pos.distance(press.start) <= self.options.click_radius =>
            {
                let event = ClickEvent {
                    point: press.start,
                    val: self.canvas_x_to_val(press.start.x),
                    target: press.clicked.clone(),
                };
                self.events.double_click.emit(&event);
            }
            _ => {
                self.last_click = Some(LastClick {
                    pos: press.start,
                    time_ms,
                });
            }
        }
    }
}
