use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

use super::document::{KeyframeDocument, ModelDocument, RowDocument};
use super::{Keyframe, KeyframeId, Row, RowId};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid model json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate row id {0}")]
    DuplicateRow(RowId),
    #[error("duplicate keyframe id {0}")]
    DuplicateKeyframe(KeyframeId),
    #[error("unknown row {0}")]
    UnknownRow(RowId),
    #[error("unknown keyframe {0}")]
    UnknownKeyframe(KeyframeId),
    #[error("no unused ids left")]
    IdSpaceExhausted,
}

/// Hand out `*counter` and advance it, failing once the id space is used up.
fn take_id(counter: &mut Option<u64>) -> Result<u64, ModelError> {
    let id = counter.ok_or(ModelError::IdSpaceExhausted)?;
    *counter = id.checked_add(1);
    Ok(id)
}

/// Rows and keyframes in flat owned collections.
///
/// Rows are kept in display order. Keyframes live in one arena keyed by id;
/// each row lists the ids it positions and each keyframe names its row, so
/// neither side holds a reference to the other.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineModel {
    rows: Vec<Row>,
    keyframes: IndexMap<KeyframeId, Keyframe>,
    /// Lowest valid keyframe value (ms).
    pub min: f64,
    /// Highest valid keyframe value (ms), unbounded when `None`.
    pub max: Option<f64>,
    /// Next id to hand out; `None` once `u64::MAX` has been used.
    next_row: Option<u64>,
    next_keyframe: Option<u64>,
}

impl TimelineModel {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            keyframes: IndexMap::new(),
            min: 0.0,
            max: None,
            next_row: Some(0),
            next_keyframe: Some(0),
        }
    }

    /// Append an empty row at the bottom.
    pub fn add_row(&mut self) -> Result<RowId, ModelError> {
        let id = RowId(take_id(&mut self.next_row)?);
        self.rows.push(Row::new(id));
        Ok(id)
    }

    /// Append a keyframe to `row` at `val` ms.
    pub fn add_keyframe(&mut self, row: RowId, val: f64) -> Result<KeyframeId, ModelError> {
        let row_ref = self
            .rows
            .iter_mut()
            .find(|r| r.id == row)
            .ok_or(ModelError::UnknownRow(row))?;
        let id = KeyframeId(take_id(&mut self.next_keyframe)?);
        row_ref.keyframes.push(id);
        self.keyframes.insert(id, Keyframe::new(id, row, val));
        Ok(id)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub fn keyframe(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.get(&id)
    }

    pub fn keyframe_mut(&mut self, id: KeyframeId) -> Option<&mut Keyframe> {
        self.keyframes.get_mut(&id)
    }

    /// All keyframes in insertion order, independent of row order.
    pub fn keyframes(&self) -> impl Iterator<Item = &Keyframe> {
        self.keyframes.values()
    }

    pub(crate) fn keyframes_mut(&mut self) -> impl Iterator<Item = &mut Keyframe> {
        self.keyframes.values_mut()
    }

    /// Keyframes positioned in `row`, in row order. Ids the arena does not
    /// know are skipped.
    pub fn row_keyframes<'a>(&'a self, row: &'a Row) -> impl Iterator<Item = &'a Keyframe> + 'a {
        row.keyframes.iter().filter_map(|id| self.keyframes.get(id))
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected_keyframes(&self) -> Vec<KeyframeId> {
        self.keyframes
            .values()
            .filter(|k| k.selected)
            .map(|k| k.id)
            .collect()
    }

    pub(crate) fn selected_set(&self) -> HashSet<KeyframeId> {
        self.keyframes
            .values()
            .filter(|k| k.selected)
            .map(|k| k.id)
            .collect()
    }

    /// Valid value range for keyframes of `row`: the model bounds narrowed
    /// by the row's own bounds.
    pub fn value_bounds(&self, row: RowId) -> (f64, f64) {
        let mut lo = self.min;
        let mut hi = self.max.unwrap_or(f64::INFINITY);
        if let Some(r) = self.row(row) {
            if let Some(min) = r.min {
                lo = lo.max(min);
            }
            if let Some(max) = r.max {
                hi = hi.min(max);
            }
        }
        if hi < lo { (lo, lo) } else { (lo, hi) }
    }

    /// Smallest and largest keyframe value, `None` without keyframes.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.keyframes.values().map(|k| k.val);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ModelError> {
        let doc: ModelDocument = serde_json::from_slice(data)?;
        Self::from_document(doc)
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(&self.to_document())?)
    }

    /// Build the arena from a document, assigning ids that are missing.
    pub fn from_document(doc: ModelDocument) -> Result<Self, ModelError> {
        let mut model = Self::new();
        model.min = doc.min.unwrap_or(0.0);
        model.max = doc.max;

        // Explicit ids first so generated ones never collide with them.
        let mut row_ids = HashSet::new();
        let mut keyframe_ids = HashSet::new();
        for row in &doc.rows {
            if let Some(id) = row.id
                && !row_ids.insert(id)
            {
                return Err(ModelError::DuplicateRow(RowId(id)));
            }
            for kf in &row.keyframes {
                if let Some(id) = kf.id
                    && !keyframe_ids.insert(id)
                {
                    return Err(ModelError::DuplicateKeyframe(KeyframeId(id)));
                }
            }
        }
        // Generated ids continue after the highest explicit one.
        model.next_row = row_ids.iter().max().map_or(Some(0), |m| m.checked_add(1));
        model.next_keyframe = keyframe_ids.iter().max().map_or(Some(0), |m| m.checked_add(1));

        for row_doc in doc.rows {
            let row_id = match row_doc.id {
                Some(id) => RowId(id),
                None => RowId(take_id(&mut model.next_row)?),
            };
            let mut row = Row::new(row_id);
            row.title = row_doc.title;
            row.height = row_doc.height;
            row.min = row_doc.min;
            row.max = row_doc.max;
            row.keyframes_draggable = row_doc.keyframes_draggable;
            row.stripe_draggable = row_doc.stripe_draggable;
            row.stripe_visible = row_doc.stripe_visible;

            for kf_doc in row_doc.keyframes {
                let id = match kf_doc.id {
                    Some(id) => KeyframeId(id),
                    None => KeyframeId(take_id(&mut model.next_keyframe)?),
                };
                let mut kf = Keyframe::new(id, row_id, kf_doc.val);
                kf.group = kf_doc.group;
                kf.selected = kf_doc.selected;
                kf.draggable = kf_doc.draggable;
                kf.selectable = kf_doc.selectable;
                row.keyframes.push(id);
                model.keyframes.insert(id, kf);
            }
            model.rows.push(row);
        }
        Ok(model)
    }

    pub fn to_document(&self) -> ModelDocument {
        ModelDocument {
            min: Some(self.min),
            max: self.max,
            rows: self
                .rows
                .iter()
                .map(|row| RowDocument {
                    id: Some(row.id.0),
                    title: row.title.clone(),
                    height: row.height,
                    min: row.min,
                    max: row.max,
                    keyframes_draggable: row.keyframes_draggable,
                    stripe_draggable: row.stripe_draggable,
                    stripe_visible: row.stripe_visible,
                    keyframes: self
                        .row_keyframes(row)
                        .map(|k| KeyframeDocument {
                            id: Some(k.id.0),
                            val: k.val,
                            group: k.group.clone(),
                            selected: k.selected,
                            draggable: k.draggable,
                            selectable: k.selectable,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl Default for TimelineModel {
    fn default() -> Self {
        Self::new()
    }
}
