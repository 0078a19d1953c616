//! Time ↔ pixel conversion and grid snapping.
//!
//! Everything here is a pure function of its inputs and a [`ViewState`]
//! snapshot, so conversions can be tested without a surface.

use crate::options::TimelineOptions;

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;

/// "Nice" grid steps in milliseconds, shared by snapping and the gauge.
const GRID_LADDER_MS: &[f64] = &[
    1.0,
    2.0,
    5.0,
    10.0,
    20.0,
    50.0,
    100.0,
    200.0,
    250.0,
    500.0,
    SECOND,
    2.0 * SECOND,
    5.0 * SECOND,
    10.0 * SECOND,
    15.0 * SECOND,
    30.0 * SECOND,
    MINUTE,
    2.0 * MINUTE,
    5.0 * MINUTE,
    10.0 * MINUTE,
    15.0 * MINUTE,
    30.0 * MINUTE,
    HOUR,
];

/// Long-lived viewport state, mutated by scroll/zoom/resize handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Canvas size in logical pixels.
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
    pub zoom: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            pixel_ratio: 1.0,
            zoom: 1.0,
            scroll_left: 0.0,
            scroll_top: 0.0,
        }
    }
}

/// Converts between time values and horizontal pixel offsets for one
/// snapshot of the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    px_per_ms: f64,
    scroll_left: f64,
    left_margin: f64,
    pixel_ratio: f64,
    snap_step: Option<f64>,
    minor_min_px: f64,
}

impl CoordinateMapper {
    pub fn new(view: &ViewState, options: &TimelineOptions) -> Self {
        Self {
            px_per_ms: options.step_px * view.zoom / options.step_val,
            scroll_left: view.scroll_left,
            left_margin: options.left_margin,
            pixel_ratio: view.pixel_ratio,
            snap_step: options.snap_step,
            minor_min_px: options.minor_tick_min_px,
        }
    }

    pub fn px_per_ms(&self) -> f64 {
        self.px_per_ms
    }

    /// Horizontal pixel of `val`: scrolled view offset unless `absolute`
    /// asks for the offset inside the scroll content. The left margin is
    /// not included; see [`value_to_canvas_x`](Self::value_to_canvas_x).
    pub fn value_to_px(&self, val: f64, absolute: bool) -> f64 {
        let px = val * self.px_per_ms;
        if absolute { px } else { px - self.scroll_left }
    }

    /// Exact inverse of [`value_to_px`](Self::value_to_px).
    pub fn px_to_value(&self, px: f64, absolute: bool) -> f64 {
        let px = if absolute { px } else { px + self.scroll_left };
        px / self.px_per_ms
    }

    /// Canvas x of `val`, with the rows area shifted right by the left margin.
    pub fn value_to_canvas_x(&self, val: f64) -> f64 {
        self.value_to_px(val, false) + self.left_margin
    }

    /// Time under canvas x.
    pub fn canvas_x_to_value(&self, x: f64) -> f64 {
        self.px_to_value(x - self.left_margin, false)
    }

    /// Smallest ladder step whose on-screen width is at least `min_px`.
    pub fn grid_step(&self, min_px: f64) -> f64 {
        let min_ms = min_px / self.px_per_ms;
        if let Some(&step) = GRID_LADDER_MS.iter().find(|&&s| s >= min_ms) {
            return step;
        }
        // Past the ladder: whole hours, rounded up to 1, 2 or 5 × 10^n hours.
        let hours = (min_ms / HOUR).max(1.0);
        let magnitude = 10f64.powf(hours.log10().floor());
        let mantissa = hours / magnitude;
        let nice = if mantissa <= 1.0 {
            1.0
        } else if mantissa <= 2.0 {
            2.0
        } else if mantissa <= 5.0 {
            5.0
        } else {
            10.0
        };
        nice * magnitude * HOUR
    }

    /// Grid that snapping rounds to: the fixed `snap_step` option when set,
    /// otherwise the minor gauge step at the current zoom.
    pub fn snap_step(&self) -> f64 {
        self.snap_step
            .unwrap_or_else(|| self.grid_step(self.minor_min_px))
    }

    /// Round `val` to the nearest grid point. Idempotent.
    pub fn snap(&self, val: f64) -> f64 {
        let step = self.snap_step();
        if !val.is_finite() || step <= 0.0 {
            return val;
        }
        (val / step).round() * step
    }

    /// Align a line coordinate to the device pixel grid so a stroke of
    /// `thickness` device pixels lands on whole pixels.
    pub fn sharp(&self, pos: f64, thickness: f64) -> f64 {
        sharp(pos, thickness, self.pixel_ratio)
    }
}

/// Whether `val` sits on a multiple of the grid `step`, within a millionth
/// of a step.
pub fn on_grid(val: f64, step: f64) -> bool {
    if step <= 0.0 || !val.is_finite() {
        return false;
    }
    (val - (val / step).round() * step).abs() <= step * 1e-6
}

pub fn sharp(pos: f64, thickness: f64, pixel_ratio: f64) -> f64 {
    let device = (pos * pixel_ratio).round();
    let odd = (thickness.round() as i64) % 2 != 0;
    let device = if odd { device + 0.5 } else { device };
    device / pixel_ratio
}
