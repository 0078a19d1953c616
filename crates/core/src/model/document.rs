use serde::{Deserialize, Serialize};

/// Serialized form of a timeline model: rows with their keyframes inline,
/// the shape hosts usually keep their data in.
///
/// Ids are optional; missing ones are assigned when the document is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDocument {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub rows: Vec<RowDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub keyframes_draggable: bool,
    pub stripe_draggable: bool,
    pub stripe_visible: bool,
    pub keyframes: Vec<KeyframeDocument>,
}

impl Default for RowDocument {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            height: None,
            min: None,
            max: None,
            keyframes_draggable: true,
            stripe_draggable: true,
            stripe_visible: true,
            keyframes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub val: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub selected: bool,
    pub draggable: bool,
    pub selectable: bool,
}

impl Default for KeyframeDocument {
    fn default() -> Self {
        Self {
            id: None,
            val: 0.0,
            group: None,
            selected: false,
            draggable: true,
            selectable: true,
        }
    }
}
