use keyline_protocol::{Point, RenderCommand, ThemeToken};

use super::Scene;

/// Keyframe diamonds for every keyframe in a visible row.
///
/// Keyframes straddling the rows area edge are still emitted; the clip set
/// around the rows area crops them.
pub fn render_keyframes(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let layout = &scene.layout;
    let model = layout.model();
    let mut commands = Vec::with_capacity(64);

    commands.push(RenderCommand::BeginGroup {
        id: "keyframes".into(),
    });
    layout.for_each_visible_keyframe(false, |visit| {
        let rect = layout.keyframe_rect(visit.keyframe, visit.row);
        if rect.h <= 0.0 || layout.cut_bounds(rect).is_none() {
            return;
        }
        let locked = !visit.keyframe.draggable
            || model
                .row(visit.row.row)
                .is_some_and(|row| !row.keyframes_draggable);
        let color = if visit.keyframe.selected {
            ThemeToken::KeyframeSelected
        } else if locked {
            ThemeToken::KeyframeLocked
        } else {
            ThemeToken::Keyframe
        };

        let c = rect.center();
        commands.push(RenderCommand::DrawPolygon {
            points: vec![
                Point::new(c.x, rect.y),
                Point::new(rect.right(), c.y),
                Point::new(c.x, rect.bottom()),
                Point::new(rect.x, c.y),
            ],
            color,
            border_color: Some(ThemeToken::KeyframeBorder),
            element_id: Some(visit.keyframe.id.0),
        });
    });
    commands.push(RenderCommand::EndGroup);
    commands
}
