use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use eframe::egui;
use keyline_core::views::time_axis::format_time_label;
use keyline_core::{
    CursorHint, InteractionMode, Key, KeyEvent, KeyframeId, ModelError, Modifiers, PointerEvent, TickLabelFormat, Timeline,
    TimelineModel, TimelineOptions, WheelEvent,
};
use keyline_protocol::{Point, RenderCommand};

use crate::renderer;
use crate::theme::ThemeMode;

/// egui reports a single pointer; the timeline still wants an id.
const MOUSE_POINTER_ID: u64 = 0;
/// Pixels scrolled per wheel line when the platform reports lines.
const WHEEL_LINE_PX: f32 = 40.0;

const MODES: [InteractionMode; 5] = [
    InteractionMode::Selection,
    InteractionMode::Pan,
    InteractionMode::NonInteractivePan,
    InteractionMode::Zoom,
    InteractionMode::None,
];

/// Status line content, written by timeline callbacks.
#[derive(Debug, Default)]
struct Status {
    time: f64,
    selected: usize,
    last_drag: Option<String>,
}

/// Main application state.
pub struct TimelineApp {
    timeline: Timeline,
    theme_mode: ThemeMode,
    /// Last frame produced by the timeline, repainted until it changes.
    commands: Vec<RenderCommand>,
    status: Rc<RefCell<Status>>,
    /// Modifier state seen on the previous frame.
    modifiers: Modifiers,
    pointer_down: bool,
    /// Canvas size and pixel ratio last passed to `rescale`.
    surface: Option<(f32, f32, f32)>,
    error: Option<String>,
}

impl TimelineApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: TimelineOptions, model: TimelineModel) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut timeline = Timeline::with_model(options, model);
        let status = Rc::new(RefCell::new(Status {
            time: timeline.get_time(),
            ..Status::default()
        }));
        subscribe(&mut timeline, &status);

        Self {
            timeline,
            theme_mode: ThemeMode::Dark,
            commands: Vec::new(),
            status,
            modifiers: Modifiers::NONE,
            pointer_down: false,
            surface: None,
            error: None,
        }
    }

    fn load_model(&mut self, data: &[u8]) {
        match TimelineModel::from_json(data) {
            Ok(model) => {
                log::info!(
                    "loaded {} rows with {} keyframes",
                    model.rows().len(),
                    model.keyframe_count()
                );
                self.pointer_down = false;
                self.timeline.set_model(model);
                self.status.borrow_mut().selected = self.timeline.get_selected_elements().len();
                self.error = None;
            }
            Err(e) => {
                log::warn!("rejected model: {e}");
                self.error = Some(format!("Failed to load model: {e}"));
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn load_path(&mut self, path: &std::path::Path) {
        match std::fs::read(path) {
            Ok(data) => self.load_model(&data),
            Err(e) => self.error = Some(format!("Failed to read {}: {e}", path.display())),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn open_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new().add_filter("Timeline", &["json"]).pick_file() {
            self.load_path(&path);
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline", &["json"])
            .set_file_name("timeline.json")
            .save_file()
        else {
            return;
        };
        match write_model(self.timeline.model(), &path) {
            Ok(()) => log::info!("saved model to {}", path.display()),
            Err(e) => self.error = Some(format!("{e:#}")),
        }
    }

    /// Feed this frame's raw egui events to the timeline. Positions are made
    /// relative to `canvas`.
    fn handle_input(&mut self, ctx: &egui::Context, canvas: egui::Rect) {
        let (events, modifiers, hover, now_ms) = ctx.input(|i| {
            (
                i.events.clone(),
                to_modifiers(i.modifiers),
                i.pointer.hover_pos(),
                i.time * 1000.0,
            )
        });
        self.sync_modifiers(modifiers, now_ms);

        let local = |pos: egui::Pos2| Point::new((pos.x - canvas.min.x) as f64, (pos.y - canvas.min.y) as f64);

        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    modifiers,
                } => {
                    let ev = PointerEvent::new(MOUSE_POINTER_ID, local(pos), to_modifiers(modifiers), now_ms);
                    if pressed {
                        if canvas.contains(pos) {
                            self.pointer_down = true;
                            self.timeline.on_pointer_down(ev);
                        }
                    } else if self.pointer_down {
                        self.pointer_down = false;
                        self.timeline.on_pointer_up(ev);
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    // Drags keep tracking outside the canvas so edge panning works.
                    if self.pointer_down || canvas.contains(pos) {
                        let ev = PointerEvent::new(MOUSE_POINTER_ID, local(pos), self.modifiers, now_ms);
                        self.timeline.on_pointer_move(ev);
                    }
                }
                egui::Event::MouseWheel {
                    unit,
                    delta,
                    modifiers,
                    ..
                } => {
                    let Some(pos) = hover.filter(|p| canvas.contains(*p)) else {
                        continue;
                    };
                    let scale = match unit {
                        egui::MouseWheelUnit::Point => 1.0,
                        egui::MouseWheelUnit::Line => WHEEL_LINE_PX,
                        egui::MouseWheelUnit::Page => canvas.height(),
                    };
                    // egui reports content motion; the timeline wants scroll direction.
                    self.timeline.on_wheel(WheelEvent {
                        pos: local(pos),
                        delta: Point::new(-(delta.x * scale) as f64, -(delta.y * scale) as f64),
                        modifiers: to_modifiers(modifiers),
                        time_ms: now_ms,
                    });
                }
                egui::Event::Key {
                    key,
                    pressed,
                    modifiers,
                    ..
                } => {
                    let key = match key {
                        egui::Key::Escape => Key::Escape,
                        egui::Key::A => Key::Character('a'),
                        _ => continue,
                    };
                    self.timeline.on_key(KeyEvent {
                        key,
                        pressed,
                        modifiers: to_modifiers(modifiers),
                        time_ms: now_ms,
                    });
                }
                egui::Event::WindowFocused(false) => {
                    self.pointer_down = false;
                    self.timeline.on_blur();
                }
                _ => {}
            }
        }
    }

    /// egui only exposes modifier state, so presses and releases are
    /// recovered by diffing against the previous frame.
    fn sync_modifiers(&mut self, modifiers: Modifiers, now_ms: f64) {
        let changes = [
            (Key::Control, self.modifiers.ctrl, modifiers.ctrl),
            (Key::Shift, self.modifiers.shift, modifiers.shift),
            (Key::Alt, self.modifiers.alt, modifiers.alt),
            (Key::Meta, self.modifiers.meta, modifiers.meta),
        ];
        self.modifiers = modifiers;
        for (key, before, now) in changes {
            if before != now {
                self.timeline.on_key(KeyEvent {
                    key,
                    pressed: now,
                    modifiers,
                    time_ms: now_ms,
                });
            }
        }
    }

    fn toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("keyline");
                ui.separator();

                #[cfg(not(target_arch = "wasm32"))]
                {
                    if ui.button("Open").clicked() {
                        self.open_file();
                    }
                    if ui.button("Save").clicked() {
                        self.save_file();
                    }
                    ui.separator();
                }

                let current = self.timeline.interaction_mode();
                let mut mode = current;
                egui::ComboBox::from_id_salt("interaction_mode")
                    .selected_text(mode_label(mode))
                    .show_ui(ui, |ui| {
                        for m in MODES {
                            ui.selectable_value(&mut mode, m, mode_label(m));
                        }
                    });
                if mode != current {
                    self.timeline.set_interaction_mode(mode);
                }

                let mut snap = self.timeline.options().snap_enabled;
                if ui.checkbox(&mut snap, "Snap").changed() {
                    let options = TimelineOptions {
                        snap_enabled: snap,
                        ..self.timeline.options().clone()
                    };
                    self.timeline.set_options(options);
                }

                if ui.button("Fit").clicked() {
                    self.timeline.set_zoom(1.0);
                    self.timeline.set_scroll_left(0.0);
                }

                ui.separator();
                let theme_label = match self.theme_mode {
                    ThemeMode::Dark => "Light",
                    ThemeMode::Light => "Dark",
                };
                if ui.button(theme_label).clicked() {
                    self.theme_mode = self.theme_mode.toggled();
                    ctx.set_visuals(match self.theme_mode {
                        ThemeMode::Dark => egui::Visuals::dark(),
                        ThemeMode::Light => egui::Visuals::light(),
                    });
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("zoom {:.0}%", self.timeline.zoom() * 100.0));
                });
            });
        });
    }

    fn status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let status = self.status.borrow();
                ui.label(format_time_label(status.time, 1.0, TickLabelFormat::Hms));
                ui.separator();
                ui.label(format!("{} selected", status.selected));
                if let Some(drag) = &status.last_drag {
                    ui.separator();
                    ui.label(drag);
                }
                ui.separator();
                ui.label(self.timeline.state().name());
                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(0xf3, 0x8b, 0xa8), err);
                }
            });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let ctx = ui.ctx().clone();
        let (canvas, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());

        let surface = (canvas.width(), canvas.height(), ctx.pixels_per_point());
        if self.surface != Some(surface) {
            self.surface = Some(surface);
            self.timeline
                .rescale(surface.0 as f64, surface.1 as f64, surface.2 as f64);
        }

        self.handle_input(&ctx, canvas);

        let now_ms = ctx.input(|i| i.time) * 1000.0;
        self.timeline.tick(now_ms);
        if let Some(frame) = self.timeline.take_frame() {
            self.commands = frame;
        }

        let mut painter = ui.painter_at(canvas);
        let result = renderer::render_commands(&mut painter, &self.commands, canvas.min, self.theme_mode);

        if response.hovered() || self.pointer_down {
            ctx.set_cursor_icon(cursor_icon(self.timeline.cursor_hint()));
        }

        if self.timeline.state().is_idle()
            && let Some(hover) = response.hover_pos()
            && let Some(hit) = result.hit_regions.iter().rev().find(|h| h.rect.contains(hover))
            && let Some(keyframe) = self.timeline.model().keyframe(KeyframeId(hit.element_id))
        {
            let row = self
                .timeline
                .model()
                .row(keyframe.row)
                .and_then(|r| r.title.clone())
                .unwrap_or_else(|| keyframe.row.to_string());
            let text = format!(
                "{row}\n{}",
                format_time_label(keyframe.val, 1.0, self.timeline.options().tick_labels)
            );
            #[allow(deprecated)]
            egui::show_tooltip_at_pointer(&ctx, ui.layer_id(), egui::Id::new("keyframe_tooltip"), |ui| {
                ui.label(text);
            });
        }

        if let Some(deadline) = self.timeline.next_deadline() {
            let wait = ((deadline - now_ms) / 1000.0).max(0.0);
            ctx.request_repaint_after(Duration::from_secs_f64(wait));
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let Some(file) = ctx.input(|i| i.raw.dropped_files.first().cloned()) else {
            return;
        };
        match (&file.bytes, &file.path) {
            (Some(bytes), _) => self.load_model(bytes),
            #[cfg(not(target_arch = "wasm32"))]
            (None, Some(path)) => self.load_path(path),
            _ => self.error = Some(format!("Could not read dropped file {}", file.name)),
        }
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);
        self.toolbar(ctx);
        self.status_bar(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas(ui));
    }
}

fn subscribe(timeline: &mut Timeline, status: &Rc<RefCell<Status>>) {
    let s = Rc::clone(status);
    timeline.on_time_changed(move |e| s.borrow_mut().time = e.val);

    let s = Rc::clone(status);
    timeline.on_selected(move |e| s.borrow_mut().selected = e.selected.len());

    let s = Rc::clone(status);
    timeline.on_drag_finished(move |e| {
        if e.elements.is_empty() {
            return;
        }
        let verb = if e.cancelled { "stopped" } else { "moved" };
        let summary = format!("{verb} {} keyframe(s) by {:+.0} ms", e.elements.len(), e.delta);
        log::debug!("{summary}");
        s.borrow_mut().last_drag = Some(summary);
    });

    timeline.on_double_click(|e| log::info!("double click at {:.0} ms", e.val));
}

#[cfg(not(target_arch = "wasm32"))]
fn write_model(model: &TimelineModel, path: &std::path::Path) -> anyhow::Result<()> {
    use anyhow::Context as _;
    let json = model.to_json()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn to_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        ctrl: m.ctrl,
        shift: m.shift,
        alt: m.alt,
        meta: m.mac_cmd,
    }
}

fn cursor_icon(hint: CursorHint) -> egui::CursorIcon {
    match hint {
        CursorHint::Default => egui::CursorIcon::Default,
        CursorHint::Grab => egui::CursorIcon::Grab,
        CursorHint::Grabbing => egui::CursorIcon::Grabbing,
        CursorHint::Crosshair => egui::CursorIcon::Crosshair,
        CursorHint::Move => egui::CursorIcon::Move,
    }
}

fn mode_label(mode: InteractionMode) -> &'static str {
    match mode {
        InteractionMode::Selection => "Select",
        InteractionMode::Pan => "Pan",
        InteractionMode::NonInteractivePan => "View only",
        InteractionMode::Zoom => "Zoom",
        InteractionMode::None => "Locked",
    }
}

/// A small animation used when no file is given.
pub fn demo_model() -> Result<TimelineModel, ModelError> {
    let mut model = TimelineModel::new();
    let tracks: [(&str, &[(f64, Option<&str>)]); 4] = [
        (
            "Position",
            &[(0.0, Some("in")), (800.0, Some("in")), (2_400.0, Some("out")), (3_200.0, Some("out"))],
        ),
        ("Rotation", &[(500.0, None), (1_500.0, None), (4_000.0, None)]),
        ("Scale", &[(1_000.0, Some("pulse")), (1_250.0, Some("pulse")), (1_500.0, Some("pulse"))]),
        ("Opacity", &[(0.0, None), (5_000.0, None)]),
    ];
    for (title, keyframes) in tracks {
        let row = model.add_row()?;
        if let Some(r) = model.row_mut(row) {
            r.title = Some(title.to_string());
        }
        for &(val, group) in keyframes {
            let id = model.add_keyframe(row, val)?;
            if let Some(k) = model.keyframe_mut(id) {
                k.group = group.map(str::to_string);
            }
        }
    }
    // Enough extra layers to scroll vertically.
    for layer in 1..=30u32 {
        let row = model.add_row()?;
        if let Some(r) = model.row_mut(row) {
            r.title = Some(format!("Layer {layer}"));
        }
        let start = f64::from(layer) * 250.0;
        model.add_keyframe(row, start)?;
        model.add_keyframe(row, start + 2_000.0)?;
    }
    Ok(model)
}
