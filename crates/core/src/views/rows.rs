use keyline_protocol::{Rect, RenderCommand, ThemeToken};

use super::Scene;

/// Share of the row height a stripe leaves free above and below itself.
const STRIPE_INSET: f64 = 0.25;

/// Row bands and the stripes joining grouped keyframes.
///
/// Row fills are translucent theme colours, so the gauge gridlines drawn
/// before them stay visible.
pub fn render_rows(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let layout = &scene.layout;
    let rows = layout.compute_visible_rows(true);
    let mut commands = Vec::with_capacity(rows.rows.len() * 2 + 2);

    commands.push(RenderCommand::BeginGroup { id: "rows".into() });
    for row in &rows.rows {
        let Some(band) = layout.cut_bounds(row.rect) else {
            continue;
        };
        commands.push(RenderCommand::DrawRect {
            rect: band.rect,
            color: if row.index % 2 == 0 {
                ThemeToken::RowBackground
            } else {
                ThemeToken::RowBackgroundAlt
            },
            border_color: None,
        });

        for stripe in &row.stripes {
            let inset = stripe.rect.h * STRIPE_INSET;
            let rect = Rect::new(stripe.rect.x, stripe.rect.y + inset, stripe.rect.w, stripe.rect.h - inset * 2.0);
            if let Some(cut) = layout.cut_bounds(rect) {
                commands.push(RenderCommand::DrawRect {
                    rect: cut.rect,
                    color: ThemeToken::Stripe,
                    border_color: Some(ThemeToken::StripeBorder),
                });
            }
        }
    }
    commands.push(RenderCommand::EndGroup);
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ViewState;
    use crate::layout::Layout;
    use crate::model::TimelineModel;
    use crate::options::TimelineOptions;

    #[test]
    fn draws_bands_and_stripes() {
        let mut model = TimelineModel::new();
        let a = model.add_row().unwrap();
        let b = model.add_row().unwrap();
        for val in [1000.0, 2000.0] {
            let _ = model.add_keyframe(a, val);
        }
        let _ = model.add_keyframe(b, 1500.0);
        let options = TimelineOptions::default();
        let view = ViewState {
            width: 600.0,
            height: 200.0,
            ..ViewState::default()
        };
        let scene = Scene {
            layout: Layout::new(&model, &options, &view),
            time: 0.0,
            selection_rect: None,
            label_formatter: None,
        };
        let cmds = render_rows(&scene);

        let count = |token: ThemeToken| {
            cmds.iter()
                .filter(|c| matches!(c, RenderCommand::DrawRect { color, .. } if *color == token))
                .count()
        };
        assert_eq!(count(ThemeToken::RowBackground), 1);
        assert_eq!(count(ThemeToken::RowBackgroundAlt), 1);
        // Only row a has a group with more than one keyframe.
        assert_eq!(count(ThemeToken::Stripe), 1);
    }
}
