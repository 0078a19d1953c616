mod document;
mod keyframe;
mod row;
mod timeline_model;

pub use document::{KeyframeDocument, ModelDocument, RowDocument};
pub use keyframe::{Keyframe, KeyframeId};
pub use row::{Row, RowId};
pub use timeline_model::{ModelError, TimelineModel};
