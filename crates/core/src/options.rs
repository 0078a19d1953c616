use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid options json: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a plain drag on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    /// Drag keyframes, rubber-band select on empty space.
    #[default]
    Selection,
    /// Drag keyframes, pan on empty space.
    Pan,
    /// Every drag pans; keyframes cannot be edited.
    NonInteractivePan,
    /// Click zooms in, ctrl/alt-click zooms out.
    Zoom,
    /// Pointer input is ignored.
    None,
}

/// How gauge labels are written when no custom formatter is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TickLabelFormat {
    /// `H:MM:SS`, with milliseconds when the step is below a second.
    #[default]
    Hms,
    Seconds,
    Milliseconds,
}

/// Timeline configuration.
///
/// Every field has a default, so a partial JSON object merges over
/// [`TimelineOptions::default`]. Values are not trusted: the timeline runs
/// them through [`TimelineOptions::sanitized`] before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    pub snap_enabled: bool,
    /// Fixed snap grid in ms. `None` picks a grid from the zoom level.
    pub snap_step: Option<f64>,

    pub zoom: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Relative zoom change per wheel notch.
    pub zoom_speed: f64,
    /// Pixels covered by `step_val` ms at zoom 1.
    pub step_px: f64,
    pub step_val: f64,

    /// Minimum spacing between labelled gauge ticks.
    pub major_tick_min_px: f64,
    /// Minimum spacing between unlabelled ticks; also the snap grid spacing.
    pub minor_tick_min_px: f64,

    pub header_height: f64,
    pub left_margin: f64,
    pub row_height: f64,
    pub row_gap: f64,
    pub keyframe_width: f64,
    pub keyframe_height: f64,

    /// Pointer travel that turns a press into a drag.
    pub drag_threshold_px: f64,
    /// Hit-test radius around the pointer.
    pub click_radius: f64,
    /// Hold time after which a stationary press counts as a held click.
    pub click_timeout_ms: f64,
    pub double_click_ms: f64,
    /// Quiet period after the last scroll before `scroll_finished` fires.
    pub scroll_finished_ms: f64,

    /// Largest auto-pan step per tick, in pixels.
    pub auto_pan_speed: f64,
    pub auto_pan_interval_ms: f64,
    /// Distance from the edge at which auto-pan already starts.
    pub auto_pan_margin: f64,
    /// Overshoot past the margin at which auto-pan reaches full speed.
    pub auto_pan_ramp_px: f64,
    /// Ticks arriving closer together than this are skipped.
    pub auto_pan_min_step_ms: f64,

    /// Overrides the pixel ratio reported by the host.
    pub pixel_ratio: Option<f64>,
    pub tick_labels: TickLabelFormat,
    pub interaction_mode: InteractionMode,
    pub time_cursor_draggable: bool,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            snap_enabled: true,
            snap_step: None,
            zoom: 1.0,
            zoom_min: 0.1,
            zoom_max: 8.0,
            zoom_speed: 0.1,
            step_px: 100.0,
            step_val: 1000.0,
            major_tick_min_px: 100.0,
            minor_tick_min_px: 10.0,
            header_height: 30.0,
            left_margin: 25.0,
            row_height: 24.0,
            row_gap: 2.0,
            keyframe_width: 10.0,
            keyframe_height: 10.0,
            drag_threshold_px: 3.0,
            click_radius: 3.0,
            click_timeout_ms: 120.0,
            double_click_ms: 400.0,
            scroll_finished_ms: 500.0,
            auto_pan_speed: 10.0,
            auto_pan_interval_ms: 50.0,
            auto_pan_margin: 10.0,
            auto_pan_ramp_px: 20.0,
            auto_pan_min_step_ms: 10.0,
            pixel_ratio: None,
            tick_labels: TickLabelFormat::Hms,
            interaction_mode: InteractionMode::Selection,
            time_cursor_draggable: true,
        }
    }
}

impl TimelineOptions {
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str::<Self>(json)?.sanitized())
    }

    /// Replace values that would break the coordinate math or the state
    /// machine with their defaults. Never fails; each correction is logged.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();

        fn positive(name: &str, value: &mut f64, fallback: f64) {
            if !value.is_finite() || *value <= 0.0 {
                log::warn!("option {name}={value} is not positive, using {fallback}");
                *value = fallback;
            }
        }
        fn non_negative(name: &str, value: &mut f64, fallback: f64) {
            if !value.is_finite() || *value < 0.0 {
                log::warn!("option {name}={value} is negative, using {fallback}");
                *value = fallback;
            }
        }

        positive("zoom_min", &mut self.zoom_min, d.zoom_min);
        positive("zoom_max", &mut self.zoom_max, d.zoom_max);
        if self.zoom_min > self.zoom_max {
            log::warn!("zoom_min > zoom_max, swapping");
            std::mem::swap(&mut self.zoom_min, &mut self.zoom_max);
        }
        positive("zoom", &mut self.zoom, d.zoom);
        self.zoom = self.zoom.clamp(self.zoom_min, self.zoom_max);
        positive("zoom_speed", &mut self.zoom_speed, d.zoom_speed);
        positive("step_px", &mut self.step_px, d.step_px);
        positive("step_val", &mut self.step_val, d.step_val);
        positive("major_tick_min_px", &mut self.major_tick_min_px, d.major_tick_min_px);
        positive("minor_tick_min_px", &mut self.minor_tick_min_px, d.minor_tick_min_px);

        non_negative("header_height", &mut self.header_height, d.header_height);
        non_negative("left_margin", &mut self.left_margin, d.left_margin);
        non_negative("row_height", &mut self.row_height, d.row_height);
        non_negative("row_gap", &mut self.row_gap, d.row_gap);
        non_negative("keyframe_width", &mut self.keyframe_width, d.keyframe_width);
        non_negative("keyframe_height", &mut self.keyframe_height, d.keyframe_height);

        non_negative("drag_threshold_px", &mut self.drag_threshold_px, d.drag_threshold_px);
        non_negative("click_radius", &mut self.click_radius, d.click_radius);
        non_negative("click_timeout_ms", &mut self.click_timeout_ms, d.click_timeout_ms);
        non_negative("double_click_ms", &mut self.double_click_ms, d.double_click_ms);
        non_negative("scroll_finished_ms", &mut self.scroll_finished_ms, d.scroll_finished_ms);

        non_negative("auto_pan_speed", &mut self.auto_pan_speed, d.auto_pan_speed);
        positive("auto_pan_interval_ms", &mut self.auto_pan_interval_ms, d.auto_pan_interval_ms);
        non_negative("auto_pan_margin", &mut self.auto_pan_margin, d.auto_pan_margin);
        positive("auto_pan_ramp_px", &mut self.auto_pan_ramp_px, d.auto_pan_ramp_px);
        non_negative("auto_pan_min_step_ms", &mut self.auto_pan_min_step_ms, d.auto_pan_min_step_ms);

        if let Some(step) = self.snap_step
            && (!step.is_finite() || step <= 0.0)
        {
            log::warn!("option snap_step={step} is not positive, using zoom grid");
            self.snap_step = None;
        }
        if let Some(ratio) = self.pixel_ratio
            && (!ratio.is_finite() || ratio <= 0.0)
        {
            log::warn!("option pixel_ratio={ratio} is not positive, ignoring");
            self.pixel_ratio = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_merges_over_defaults() {
        let opts = TimelineOptions::from_json(r#"{ "row_height": 40, "snap_enabled": false }"#)
            .unwrap_or_default();
        assert_eq!(opts.row_height, 40.0);
        assert!(!opts.snap_enabled);
        assert_eq!(opts.header_height, TimelineOptions::default().header_height);
    }

    #[test]
    fn bad_values_are_clamped_not_rejected() {
        let opts = TimelineOptions {
            zoom: 0.0,
            row_height: -5.0,
            step_px: f64::NAN,
            snap_step: Some(-1.0),
            pixel_ratio: Some(0.0),
            ..TimelineOptions::default()
        }
        .sanitized();
        assert_eq!(opts.zoom, 1.0);
        assert_eq!(opts.row_height, 24.0);
        assert_eq!(opts.step_px, 100.0);
        assert_eq!(opts.snap_step, None);
        assert_eq!(opts.pixel_ratio, None);
    }

    #[test]
    fn zoom_is_kept_inside_limits() {
        let opts = TimelineOptions {
            zoom: 50.0,
            zoom_min: 4.0,
            zoom_max: 2.0,
            ..TimelineOptions::default()
        }
        .sanitized();
        assert_eq!((opts.zoom_min, opts.zoom_max), (2.0, 4.0));
        assert_eq!(opts.zoom, 4.0);
    }

    #[test]
    fn modes_use_camel_case_names() {
        let opts = TimelineOptions::from_json(r#"{ "interaction_mode": "nonInteractivePan" }"#)
            .unwrap_or_default();
        assert_eq!(opts.interaction_mode, InteractionMode::NonInteractivePan);
    }
}
