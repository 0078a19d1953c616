use keyline_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

use super::Scene;
use crate::coords::on_grid;
use crate::options::TickLabelFormat;

const MAJOR_TICK_HEIGHT: f64 = 10.0;
const MINOR_TICK_HEIGHT: f64 = 4.0;
const FONT_SIZE: f64 = 10.0;
const LABEL_OFFSET_X: f64 = 3.0;
const LABEL_Y: f64 = 4.0;

/// Render the gauge: header bar, minor ticks, labelled major ticks, and
/// major gridlines running down through the rows area.
///
/// Tick spacing comes from the same ladder snapping uses, so snapped values
/// always land on a visible tick.
pub fn render_time_axis(scene: &Scene<'_>) -> Vec<RenderCommand> {
    let layout = &scene.layout;
    let options = layout.options();
    let view = layout.view();
    let mapper = layout.mapper();
    let header = options.header_height.min(view.height);
    let mut commands = Vec::with_capacity(64);

    commands.push(RenderCommand::BeginGroup {
        id: "time-axis".into(),
    });
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, view.width, header),
        color: ThemeToken::HeaderBackground,
        border_color: Some(ThemeToken::Border),
    });

    let major = mapper.grid_step(options.major_tick_min_px);
    let minor = mapper.grid_step(options.minor_tick_min_px).min(major);
    // The gauge starts at zero; the left margin stays blank.
    let view_start = mapper.canvas_x_to_value(0.0).max(0.0);
    let view_end = mapper.canvas_x_to_value(view.width);

    for t in ticks(view_start, view_end, minor) {
        if on_grid(t, major) {
            continue;
        }
        let x = mapper.sharp(mapper.value_to_canvas_x(t), 1.0);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, header - MINOR_TICK_HEIGHT),
            to: Point::new(x, header),
            color: ThemeToken::TickMinor,
            width: 1.0,
        });
    }

    for t in ticks(view_start, view_end, major) {
        let x = mapper.sharp(mapper.value_to_canvas_x(t), 1.0);
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, header - MAJOR_TICK_HEIGHT),
            to: Point::new(x, view.height),
            color: ThemeToken::TickMajor,
            width: 1.0,
        });

        let text = match scene.label_formatter {
            Some(format) => format(t),
            None => format_time_label(t, major, options.tick_labels),
        };
        commands.push(RenderCommand::DrawText {
            position: Point::new(x + LABEL_OFFSET_X, LABEL_Y),
            text,
            color: ThemeToken::TickLabel,
            font_size: FONT_SIZE,
            align: TextAlign::Left,
        });
    }

    commands.push(RenderCommand::EndGroup);
    commands
}

/// Multiples of `step` covering `[start, end]`. Values are computed from the
/// index rather than accumulated, so long gauges do not drift.
fn ticks(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    let valid = step > 0.0 && start.is_finite() && end.is_finite() && end >= start;
    let (first, last) = if valid {
        ((start / step).ceil() as i64, (end / step).floor() as i64)
    } else {
        (0, -1)
    };
    (first..=last).map(move |i| i as f64 * step)
}

/// Format a gauge value in milliseconds. `step` is the labelled tick
/// interval and decides how much precision is shown.
pub fn format_time_label(ms: f64, step: f64, format: TickLabelFormat) -> String {
    match format {
        TickLabelFormat::Hms => {
            let sign = if ms < 0.0 { "-" } else { "" };
            let total = ms.abs().round() as u64;
            let hours = total / 3_600_000;
            let minutes = total / 60_000 % 60;
            let seconds = total / 1_000 % 60;
            if step < 1_000.0 {
                format!("{sign}{hours}:{minutes:02}:{seconds:02}.{:03}", total % 1_000)
            } else {
                format!("{sign}{hours}:{minutes:02}:{seconds:02}")
            }
        }
        TickLabelFormat::Seconds => {
            let decimals = if step >= 1_000.0 {
                0
            } else if step >= 100.0 {
                1
            } else if step >= 10.0 {
                2
            } else {
                3
            };
            format!("{:.*}s", decimals, ms / 1_000.0)
        }
        TickLabelFormat::Milliseconds => format!("{:.0}ms", ms),
    }
}
