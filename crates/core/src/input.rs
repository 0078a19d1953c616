//! Host-neutral input events.

use keyline_protocol::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn control(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Identity of the pointer (mouse, pen, touch contact).
    pub id: u64,
    /// Canvas-relative logical pixels.
    pub pos: Point,
    #[serde(default)]
    pub modifiers: Modifiers,
    pub time_ms: f64,
}

impl PointerEvent {
    pub fn new(id: u64, pos: Point, modifiers: Modifiers, time_ms: f64) -> Self {
        Self {
            id,
            pos,
            modifiers,
            time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Key {
    Control,
    Shift,
    Alt,
    Meta,
    Escape,
    Character(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
    /// Modifier state after this event.
    #[serde(default)]
    pub modifiers: Modifiers,
    pub time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub pos: Point,
    /// Scroll delta in logical pixels; positive y scrolls down.
    pub delta: Point,
    #[serde(default)]
    pub modifiers: Modifiers,
    pub time_ms: f64,
}
