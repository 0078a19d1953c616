//! Render pipeline: turns the visible geometry into [`RenderCommand`]s.
//!
//! Painter's order is fixed: background, gauge, rows, keyframes, selection
//! rectangle, time cursor.

pub mod keyframes;
pub mod overlay;
pub mod rows;
pub mod time_axis;

use keyline_protocol::{Rect, RenderCommand, ThemeToken};

use crate::layout::Layout;

/// Gauge label function: tick value in ms to text.
pub type LabelFn = dyn Fn(f64) -> String;

/// Everything one paint needs.
pub struct Scene<'a> {
    pub layout: Layout<'a>,
    pub time: f64,
    pub selection_rect: Option<Rect>,
    /// Overrides the label format from the options.
    pub label_formatter: Option<&'a LabelFn>,
}

pub fn render_timeline(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let view = scene.layout.view();
    if view.width <= 0.0 || view.height <= 0.0 {
        return Vec::new();
    }

    let mut commands = Vec::with_capacity(256);
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, view.width, view.height),
        color: ThemeToken::Background,
        border_color: None,
    });

    commands.extend(time_axis::render_time_axis(scene));

    commands.push(RenderCommand::SetClip {
        rect: scene.layout.rows_area(),
    });
    commands.extend(rows::render_rows(scene));
    commands.extend(keyframes::render_keyframes(scene));
    commands.extend(overlay::render_selection(scene));
    commands.push(RenderCommand::ClearClip);

    commands.extend(overlay::render_time_cursor(scene));
    commands
}
