//! Typed callback registries, one per event kind.
//!
//! Callbacks run synchronously inside the handler that emits them, in the
//! order they were registered.

use keyline_protocol::Point;
use serde::Serialize;

use crate::hit_test::ClickableElement;
use crate::model::KeyframeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(u64);

/// Who caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventSource {
    /// A public setter called by the host.
    Api,
    /// Pointer, wheel or keyboard input.
    User,
    /// Edge scrolling during a rectangle selection.
    AutoPan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragEvent {
    /// Element the drag started on.
    pub target: ClickableElement,
    /// Keyframes moved by the drag; empty for the time cursor.
    pub elements: Vec<KeyframeId>,
    pub start_val: f64,
    pub val: f64,
    pub prev_val: f64,
    /// `val - start_val`.
    pub delta: f64,
    pub point: Point,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollEvent {
    pub scroll_left: f64,
    pub scroll_top: f64,
    pub prev_scroll_left: f64,
    pub prev_scroll_top: f64,
    pub source: EventSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionEvent {
    pub selected: Vec<KeyframeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeChangedEvent {
    pub val: f64,
    pub prev_val: f64,
    pub source: EventSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickEvent {
    pub point: Point,
    pub val: f64,
    pub target: Option<ClickableElement>,
}

type Callback<T> = Box<dyn FnMut(&T)>;

pub struct EventRegistry<T> {
    callbacks: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for EventRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

impl<T> EventRegistry<T> {
    fn subscribe(&mut self, id: SubscriptionId, callback: Callback<T>) {
        self.callbacks.push((id, callback));
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: &T) {
        for (_, cb) in &mut self.callbacks {
            cb(event);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.callbacks.len()
    }

    fn clear(&mut self) {
        self.callbacks.clear();
    }
}

/// Every registry a timeline exposes, sharing one id space.
#[derive(Debug, Default)]
pub struct Events {
    next_id: u64,
    pub drag_started: EventRegistry<DragEvent>,
    pub drag: EventRegistry<DragEvent>,
    pub drag_finished: EventRegistry<DragEvent>,
    pub scroll: EventRegistry<ScrollEvent>,
    pub scroll_finished: EventRegistry<ScrollEvent>,
    pub selected: EventRegistry<SelectionEvent>,
    pub time_changed: EventRegistry<TimeChangedEvent>,
    pub double_click: EventRegistry<ClickEvent>,
}

macro_rules! subscribe_fns {
    ($($name:ident => $registry:ident : $event:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, callback: impl FnMut(&$event) + 'static) -> SubscriptionId {
                let id = self.allocate();
                self.$registry.subscribe(id, Box::new(callback));
                id
            }
        )*
    };
}

impl Events {
    fn allocate(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    subscribe_fns! {
        on_drag_started => drag_started: DragEvent,
        on_drag => drag: DragEvent,
        on_drag_finished => drag_finished: DragEvent,
        on_scroll => scroll: ScrollEvent,
        on_scroll_finished => scroll_finished: ScrollEvent,
        on_selected => selected: SelectionEvent,
        on_time_changed => time_changed: TimeChangedEvent,
        on_double_click => double_click: ClickEvent,
    }

    /// Returns whether `id` was registered anywhere.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        // Ids are unique across registries, so at most one of these hits.
        self.drag_started.unsubscribe(id)
            || self.drag.unsubscribe(id)
            || self.drag_finished.unsubscribe(id)
            || self.scroll.unsubscribe(id)
            || self.scroll_finished.unsubscribe(id)
            || self.selected.unsubscribe(id)
            || self.time_changed.unsubscribe(id)
            || self.double_click.unsubscribe(id)
    }

    pub fn clear(&mut self) {
        self.drag_started.clear();
        self.drag.clear();
        self.drag_finished.clear();
        self.scroll.clear();
        self.scroll_finished.clear();
        self.selected.clear();
        self.time_changed.clear();
        self.double_click.clear();
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.drag_started.len()
            + self.drag.len()
            + self.drag_finished.len()
            + self.scroll.len()
            + self.scroll_finished.len()
            + self.selected.len()
            + self.time_changed.len()
            + self.double_click.len()
    }
}
