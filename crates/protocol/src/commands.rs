use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::types::{Point, Rect};

/// A single, stateless drawing instruction for the timeline surface.
///
/// The core emits one `Vec<RenderCommand>` per paint, already in painter's
/// order. Renderers consume the list sequentially; each command carries all
/// the data it needs, in logical pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Filled rectangle with an optional outline.
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
    },

    /// Closed convex polygon (keyframe shapes).
    DrawPolygon {
        points: Vec<Point>,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        /// Stable id of the element the shape represents, for host-side
        /// tooltips or accessibility.
        element_id: Option<u64>,
    },

    /// Text anchored at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (header, rows, keyframes...). Renderers may use
    /// it for layering or accessibility; it has no visual effect.
    BeginGroup { id: String },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_survive_json() {
        let cmds = vec![
            RenderCommand::DrawRect {
                rect: Rect::new(0.0, 0.0, 10.0, 5.0),
                color: ThemeToken::Background,
                border_color: None,
            },
            RenderCommand::DrawPolygon {
                points: vec![Point::new(0.0, 0.0), Point::new(4.0, 4.0), Point::new(0.0, 8.0)],
                color: ThemeToken::Keyframe,
                border_color: Some(ThemeToken::KeyframeBorder),
                element_id: Some(7),
            },
            RenderCommand::EndGroup,
        ];
        let json = serde_json::to_string(&cmds).unwrap_or_default();
        let back: Vec<RenderCommand> = serde_json::from_str(&json).unwrap_or_default();
        assert_eq!(back, cmds);
    }
}
