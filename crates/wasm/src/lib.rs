use std::cell::RefCell;
use std::rc::Rc;

use keyline_core::{
    ClickEvent, CursorHint, DragEvent, Key, KeyEvent, KeyframeId, Modifiers, PointerEvent, ScrollEvent,
    SelectionEvent, TimeChangedEvent, Timeline, TimelineModel, TimelineOptions, WheelEvent,
};
use keyline_protocol::Point;
use serde::Serialize;
use wasm_bindgen::prelude::*;

const MOD_CTRL: u32 = 1;
const MOD_SHIFT: u32 = 2;
const MOD_ALT: u32 = 4;
const MOD_META: u32 = 8;

/// `Number.MAX_SAFE_INTEGER`: ids up to here survive a trip through a JS number.
const MAX_JS_ID: u64 = (1 << 53) - 1;

/// Event waiting to be collected by JS through [`WasmTimeline::take_events`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "args", rename_all = "camelCase")]
enum QueuedEvent {
    DragStarted(DragEvent),
    Drag(DragEvent),
    DragFinished(DragEvent),
    Scroll(ScrollEvent),
    ScrollFinished(ScrollEvent),
    Selected(SelectionEvent),
    TimeChanged(TimeChangedEvent),
    DoubleClick(ClickEvent),
}

type Queue = Rc<RefCell<Vec<QueuedEvent>>>;

fn js_err(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Modifier bit set used across the JS boundary: 1 ctrl, 2 shift, 4 alt, 8 meta.
fn modifiers(bits: u32) -> Modifiers {
    Modifiers {
        ctrl: bits & MOD_CTRL != 0,
        shift: bits & MOD_SHIFT != 0,
        alt: bits & MOD_ALT != 0,
        meta: bits & MOD_META != 0,
    }
}

/// Keyframe id from a JS number. Fractions, negatives and values past
/// [`MAX_JS_ID`] name no keyframe.
fn keyframe_id(value: f64) -> Option<KeyframeId> {
    let exact = value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= MAX_JS_ID as f64;
    exact.then(|| KeyframeId(value as u64))
}

fn js_id(id: KeyframeId) -> Option<f64> {
    (id.0 <= MAX_JS_ID).then(|| id.0 as f64)
}

/// Map a DOM `KeyboardEvent.key` value.
fn parse_key(key: &str) -> Key {
    match key {
        "Control" => Key::Control,
        "Shift" => Key::Shift,
        "Alt" => Key::Alt,
        "Meta" => Key::Meta,
        "Escape" | "Esc" => Key::Escape,
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Character(c),
                _ => Key::Other,
            }
        }
    }
}

fn cursor_name(hint: CursorHint) -> &'static str {
    match hint {
        CursorHint::Default => "default",
        CursorHint::Grab => "grab",
        CursorHint::Grabbing => "grabbing",
        CursorHint::Crosshair => "crosshair",
        CursorHint::Move => "move",
    }
}

fn subscribe(timeline: &mut Timeline, queue: &Queue) {
    macro_rules! forward {
        ($on:ident, $variant:ident) => {{
            let q = Rc::clone(queue);
            timeline.$on(move |e| q.borrow_mut().push(QueuedEvent::$variant(e.clone())));
        }};
    }
    forward!(on_drag_started, DragStarted);
    forward!(on_drag, Drag);
    forward!(on_drag_finished, DragFinished);
    forward!(on_scroll, Scroll);
    forward!(on_scroll_finished, ScrollFinished);
    forward!(on_selected, Selected);
    forward!(on_time_changed, TimeChanged);
    forward!(on_double_click, DoubleClick);
}

/// A timeline driven from JS. The host feeds canvas-relative input, calls
/// `tick` from `requestAnimationFrame` and paints the JSON command lists
/// returned by `render`.
#[wasm_bindgen]
pub struct WasmTimeline {
    timeline: Timeline,
    events: Queue,
}

#[wasm_bindgen]
impl WasmTimeline {
    /// Create a timeline. `options_json` may be a partial options object.
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<WasmTimeline, JsError> {
        let options = match options_json {
            Some(json) => TimelineOptions::from_json(&json).map_err(js_err)?,
            None => TimelineOptions::default(),
        };
        let mut timeline = Timeline::new(options);
        let events = Queue::default();
        subscribe(&mut timeline, &events);
        Ok(Self { timeline, events })
    }

    /// Replace the model with one parsed from JSON bytes.
    pub fn set_model_json(&mut self, data: &[u8]) -> Result<(), JsError> {
        let model = TimelineModel::from_json(data).map_err(js_err)?;
        self.timeline.set_model(model);
        Ok(())
    }

    pub fn model_json(&self) -> Result<String, JsError> {
        self.timeline.model().to_json().map_err(js_err)
    }

    pub fn set_options_json(&mut self, json: &str) -> Result<(), JsError> {
        let options = TimelineOptions::from_json(json).map_err(js_err)?;
        self.timeline.set_options(options);
        Ok(())
    }

    pub fn resize(&mut self, width: f64, height: f64, pixel_ratio: f64) {
        self.timeline.rescale(width, height, pixel_ratio);
    }

    pub fn pointer_down(&mut self, id: u32, x: f64, y: f64, modifier_bits: u32, time_ms: f64) {
        self.timeline
            .on_pointer_down(PointerEvent::new(id.into(), Point::new(x, y), modifiers(modifier_bits), time_ms));
    }

    pub fn pointer_move(&mut self, id: u32, x: f64, y: f64, modifier_bits: u32, time_ms: f64) {
        self.timeline
            .on_pointer_move(PointerEvent::new(id.into(), Point::new(x, y), modifiers(modifier_bits), time_ms));
    }

    pub fn pointer_up(&mut self, id: u32, x: f64, y: f64, modifier_bits: u32, time_ms: f64) {
        self.timeline
            .on_pointer_up(PointerEvent::new(id.into(), Point::new(x, y), modifiers(modifier_bits), time_ms));
    }

    pub fn pointer_cancel(&mut self, id: u32) {
        self.timeline.on_pointer_cancel(id.into());
    }

    pub fn blur(&mut self) {
        self.timeline.on_blur();
    }

    /// Returns true when the key was consumed and the host should call
    /// `preventDefault`.
    pub fn key(&mut self, key: &str, pressed: bool, modifier_bits: u32, time_ms: f64) -> bool {
        self.timeline.on_key(KeyEvent {
            key: parse_key(key),
            pressed,
            modifiers: modifiers(modifier_bits),
            time_ms,
        })
    }

    pub fn wheel(&mut self, x: f64, y: f64, dx: f64, dy: f64, modifier_bits: u32, time_ms: f64) {
        self.timeline.on_wheel(WheelEvent {
            pos: Point::new(x, y),
            delta: Point::new(dx, dy),
            modifiers: modifiers(modifier_bits),
            time_ms,
        });
    }

    /// Run due timers. Returns the time of the next deadline, if any.
    pub fn tick(&mut self, now_ms: f64) -> Option<f64> {
        self.timeline.tick(now_ms);
        self.timeline.next_deadline()
    }

    /// Render commands as JSON, or `undefined` when nothing changed since
    /// the last call.
    pub fn render(&mut self) -> Result<Option<String>, JsError> {
        self.timeline
            .take_frame()
            .map(|frame| serde_json::to_string(&frame).map_err(js_err))
            .transpose()
    }

    /// Drain queued events as a JSON array of `{type, args}` objects.
    pub fn take_events(&mut self) -> Result<String, JsError> {
        let events = std::mem::take(&mut *self.events.borrow_mut());
        serde_json::to_string(&events).map_err(js_err)
    }

    pub fn cursor(&self) -> String {
        cursor_name(self.timeline.cursor_hint()).to_string()
    }

    pub fn get_time(&self) -> f64 {
        self.timeline.get_time()
    }

    pub fn set_time(&mut self, val: f64) -> bool {
        self.timeline.set_time(val)
    }

    pub fn zoom(&self) -> f64 {
        self.timeline.zoom()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        self.timeline.set_zoom(zoom)
    }

    pub fn scroll_left(&self) -> f64 {
        self.timeline.scroll_left()
    }

    pub fn set_scroll_left(&mut self, value: f64) -> bool {
        self.timeline.set_scroll_left(value)
    }

    pub fn scroll_top(&self) -> f64 {
        self.timeline.scroll_top()
    }

    pub fn set_scroll_top(&mut self, value: f64) -> bool {
        self.timeline.set_scroll_top(value)
    }

    pub fn px_to_val(&self, px: f64) -> f64 {
        self.timeline.px_to_val(px)
    }

    pub fn val_to_px(&self, val: f64) -> f64 {
        self.timeline.val_to_px(val)
    }

    pub fn snap_val(&self, val: f64) -> f64 {
        self.timeline.snap_val(val)
    }

    pub fn select_all(&mut self, is_selected: bool) -> bool {
        self.timeline.select(is_selected)
    }

    pub fn select_keyframe(&mut self, id: f64) -> Result<bool, JsError> {
        let id = keyframe_id(id).ok_or_else(|| JsError::new(&format!("invalid keyframe id {id}")))?;
        self.timeline.select_keyframe(id).map_err(js_err)
    }

    /// Ids of the selected keyframes. Ids JS cannot hold exactly are left out.
    pub fn selected_ids(&self) -> Vec<f64> {
        self.timeline
            .get_selected_elements()
            .iter()
            .filter_map(|k| js_id(k.id))
            .collect()
    }

    /// Elements under a canvas point as JSON, topmost first.
    pub fn element_from_point(&self, x: f64, y: f64) -> Result<String, JsError> {
        serde_json::to_string(&self.timeline.element_from_point(Point::new(x, y))).map_err(js_err)
    }

    pub fn dispose(&mut self) {
        self.timeline.dispose();
        self.events.borrow_mut().clear();
    }
}
