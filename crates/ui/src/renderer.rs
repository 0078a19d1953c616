use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};
use keyline_protocol::{RenderCommand, TextAlign};

use crate::theme::{self, ThemeMode};

/// Screen area of a drawn element, for hover lookups.
pub struct HitRegion {
    pub rect: Rect,
    pub element_id: u64,
}

/// Result of rendering a command list: includes hit regions for interaction.
pub struct RenderResult {
    pub hit_regions: Vec<HitRegion>,
}

/// Render a list of `RenderCommand` into an egui `Painter`.
///
/// `offset` is the top-left pixel position of the rendering area.
/// Returns hit regions of polygons that carry an element id.
pub fn render_commands(
    painter: &mut egui::Painter,
    commands: &[RenderCommand],
    offset: Pos2,
    mode: ThemeMode,
) -> RenderResult {
    let mut clip_stack: Vec<Rect> = Vec::new();
    let mut hit_regions: Vec<HitRegion> = Vec::new();
    let at = |x: f64, y: f64| Pos2::new(x as f32 + offset.x, y as f32 + offset.y);

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
            } => {
                let egui_rect = Rect::from_min_size(at(rect.x, rect.y), egui::vec2(rect.w as f32, rect.h as f32));
                if egui_rect.width() < 0.5 || egui_rect.height() < 0.5 {
                    continue;
                }
                // Cull off-screen
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }

                painter.rect_filled(egui_rect, CornerRadius::ZERO, theme::resolve(*color, mode));
                if let Some(bc) = border_color {
                    painter.rect_stroke(
                        egui_rect,
                        CornerRadius::ZERO,
                        Stroke::new(1.0, theme::resolve(*bc, mode)),
                        StrokeKind::Inside,
                    );
                }
            }

            RenderCommand::DrawPolygon {
                points,
                color,
                border_color,
                element_id,
            } => {
                if points.len() < 3 {
                    continue;
                }
                let points: Vec<Pos2> = points.iter().map(|p| at(p.x, p.y)).collect();
                let bounds = Rect::from_points(&points);
                if !painter.clip_rect().intersects(bounds) {
                    continue;
                }
                let stroke = border_color.map_or(Stroke::NONE, |bc| Stroke::new(1.0, theme::resolve(bc, mode)));
                painter.add(egui::Shape::convex_polygon(points, theme::resolve(*color, mode), stroke));

                if let Some(id) = element_id {
                    hit_regions.push(HitRegion {
                        rect: bounds.intersect(painter.clip_rect()),
                        element_id: *id,
                    });
                }
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = *font_size as f32;
                if size < 1.0 || text.is_empty() {
                    continue;
                }
                let anchor = match align {
                    TextAlign::Left => Align2::LEFT_TOP,
                    TextAlign::Center => Align2::CENTER_TOP,
                    TextAlign::Right => Align2::RIGHT_TOP,
                };
                painter.text(
                    at(position.x, position.y),
                    anchor,
                    text,
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => {
                painter.line_segment(
                    [at(from.x, from.y), at(to.x, to.y)],
                    Stroke::new(*width as f32, theme::resolve(*color, mode)),
                );
            }

            RenderCommand::SetClip { rect } => {
                let clip_rect = Rect::from_min_size(at(rect.x, rect.y), egui::vec2(rect.w as f32, rect.h as f32));
                clip_stack.push(painter.clip_rect());
                let intersected = painter.clip_rect().intersect(clip_rect);
                painter.set_clip_rect(intersected);
            }

            RenderCommand::ClearClip => {
                if let Some(prev) = clip_stack.pop() {
                    painter.set_clip_rect(prev);
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {
                // Groups only label command ranges.
            }
        }
    }

    RenderResult { hit_regions }
}
