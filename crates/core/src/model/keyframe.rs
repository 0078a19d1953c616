use serde::{Deserialize, Serialize};

use super::RowId;

/// Stable identifier of a keyframe inside a [`TimelineModel`](super::TimelineModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyframeId(pub u64);

impl std::fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "keyframe#{}", self.0)
    }
}

/// A time-positioned point owned by a row.
///
/// `val` is the single source of truth for the horizontal position; the
/// `selected` flag is only written by the selection algorithm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframe {
    pub id: KeyframeId,
    pub row: RowId,
    /// Time in milliseconds.
    pub val: f64,
    /// Stripe membership. Keyframes of one row sharing a group are joined
    /// by a stripe; `None` is a group of its own.
    pub group: Option<String>,
    pub selected: bool,
    pub draggable: bool,
    pub selectable: bool,
}

impl Keyframe {
    pub(crate) fn new(id: KeyframeId, row: RowId, val: f64) -> Self {
        Self {
            id,
            row,
            val,
            group: None,
            selected: false,
            draggable: true,
            selectable: true,
        }
    }
}
