//! Interactive timeline core: maps time to pixels, virtualizes rows and
//! keyframes, runs the pointer state machine and emits render commands.
//!
//! The crate owns no surface and no clock. Hosts feed it input events and
//! timestamps, call [`Timeline::tick`] when [`Timeline::next_deadline`] is
//! due, and paint the [`RenderCommand`](keyline_protocol::RenderCommand)s
//! returned by [`Timeline::take_frame`].

pub mod autopan;
pub mod coords;
pub mod events;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod options;
pub mod selection;
pub mod timeline;
pub mod timers;
pub mod views;

pub use coords::{CoordinateMapper, ViewState};
pub use events::{
    ClickEvent, DragEvent, EventSource, ScrollEvent, SelectionEvent, SubscriptionId, TimeChangedEvent,
};
pub use hit_test::{ClickableElement, ElementKind};
pub use input::{Key, KeyEvent, Modifiers, PointerEvent, WheelEvent};
pub use interaction::{CursorHint, InteractionState};
pub use model::{Keyframe, KeyframeId, ModelError, Row, RowId, TimelineModel};
pub use options::{InteractionMode, OptionsError, TickLabelFormat, TimelineOptions};
pub use selection::Selector;
pub use timeline::Timeline;
