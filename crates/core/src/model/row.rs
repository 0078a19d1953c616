use serde::{Deserialize, Serialize};

use super::KeyframeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// A horizontal lane of keyframes. Rows are stacked in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    pub title: Option<String>,
    /// Height in logical pixels; falls back to the `row_height` option.
    pub height: Option<f64>,
    /// Keyframes positioned in this row, in insertion order.
    pub keyframes: Vec<KeyframeId>,
    pub keyframes_draggable: bool,
    pub stripe_draggable: bool,
    pub stripe_visible: bool,
    /// Lower bound for keyframe values in this row.
    pub min: Option<f64>,
    /// Upper bound for keyframe values in this row.
    pub max: Option<f64>,
}

impl Row {
    pub(crate) fn new(id: RowId) -> Self {
        Self {
            id,
            title: None,
            height: None,
            keyframes: Vec::new(),
            keyframes_draggable: true,
            stripe_draggable: true,
            stripe_visible: true,
            min: None,
            max: None,
        }
    }
}
