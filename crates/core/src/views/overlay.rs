use keyline_protocol::{Point, Rect, RenderCommand, ThemeToken};

use super::Scene;

const HANDLE_WIDTH: f64 = 10.0;

/// Rubber-band rectangle of an active selection drag.
pub fn render_selection(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let Some(rect) = scene.selection_rect else {
        return Vec::new();
    };
    let mapper = scene.layout.mapper();
    let x0 = mapper.sharp(rect.x, 1.0);
    let y0 = mapper.sharp(rect.y, 1.0);
    let x1 = mapper.sharp(rect.right(), 1.0);
    let y1 = mapper.sharp(rect.bottom(), 1.0);
    vec![RenderCommand::DrawRect {
        rect: Rect::new(x0, y0, x1 - x0, y1 - y0),
        color: ThemeToken::SelectionFill,
        border_color: Some(ThemeToken::SelectionBorder),
    }]
}

/// Vertical time cursor line with its handle in the gauge.
pub fn render_time_cursor(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let layout = &scene.layout;
    let view = layout.view();
    let mapper = layout.mapper();
    let x = mapper.sharp(mapper.value_to_canvas_x(scene.time), 1.0);
    if !x.is_finite() || x < -HANDLE_WIDTH || x > view.width + HANDLE_WIDTH {
        return Vec::new();
    }

    let header = layout.options().header_height.min(view.height);
    let handle_h = header / 2.0;
    vec![
        RenderCommand::BeginGroup {
            id: "time-cursor".into(),
        },
        RenderCommand::DrawLine {
            from: Point::new(x, 0.0),
            to: Point::new(x, view.height),
            color: ThemeToken::TimeCursor,
            width: 1.0,
        },
        RenderCommand::DrawRect {
            rect: Rect::new(x - HANDLE_WIDTH / 2.0, header - handle_h, HANDLE_WIDTH, handle_h),
            color: ThemeToken::TimeCursorHandle,
            border_color: None,
        },
        RenderCommand::EndGroup,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::ViewState;
    use crate::layout::Layout;
    use crate::model::TimelineModel;
    use crate::options::TimelineOptions;

    fn scene<'a>(model: &'a TimelineModel, options: &'a TimelineOptions, view: &'a ViewState, time: f64) -> Scene<'a> {
        Scene {
            layout: Layout::new(model, options, view),
            time,
            selection_rect: None,
            label_formatter: None,
        }
    }

    #[test]
    fn cursor_sits_on_a_pixel_centre() {
        let model = TimelineModel::new();
        let options = TimelineOptions::default();
        let view = ViewState {
            width: 400.0,
            height: 100.0,
            ..ViewState::default()
        };
        let cmds = render_time_cursor(&scene(&model, &options, &view, 1000.0));
        // 1000 ms → 100 px + 25 px margin, shifted half a pixel for a 1 px stroke.
        assert!(cmds.iter().any(|c| matches!(
            c,
            RenderCommand::DrawLine { from, color: ThemeToken::TimeCursor, .. } if from.x == 125.5
        )));
    }

    #[test]
    fn offscreen_cursor_is_skipped() {
        let model = TimelineModel::new();
        let options = TimelineOptions::default();
        let view = ViewState {
            width: 400.0,
            height: 100.0,
            ..ViewState::default()
        };
        assert!(render_time_cursor(&scene(&model, &options, &view, 60_000.0)).is_empty());
        assert!(render_selection(&scene(&model, &options, &view, 0.0)).is_empty());
    }
}
