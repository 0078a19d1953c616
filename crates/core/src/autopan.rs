//! Edge scrolling while a selection rectangle is being dragged.

use keyline_protocol::{Point, Rect};

use crate::options::TimelineOptions;
use crate::timers::{TimerId, TimerKind, TimerQueue};

/// Scroll step per tick for a pointer at `pos`.
///
/// Each axis starts moving once the pointer is within `auto_pan_margin` of
/// an edge of `bounds` (or past it) and ramps linearly up to
/// `auto_pan_speed` over `auto_pan_ramp_px`.
pub fn pan_velocity(pos: Point, bounds: Rect, options: &TimelineOptions) -> Point {
    let axis = |p: f64, lo: f64, hi: f64| -> f64 {
        let margin = options.auto_pan_margin;
        let ramp = |overshoot: f64| options.auto_pan_speed * (overshoot / options.auto_pan_ramp_px).min(1.0);
        if p > hi - margin {
            ramp(p - (hi - margin))
        } else if p < lo + margin {
            -ramp(lo + margin - p)
        } else {
            0.0
        }
    };
    Point::new(
        axis(pos.x, bounds.x, bounds.right()),
        axis(pos.y, bounds.y, bounds.bottom()),
    )
}

#[derive(Debug, Default)]
pub struct AutoPanner {
    timer: Option<TimerId>,
    last_step_ms: Option<f64>,
}

impl AutoPanner {
    /// Whether `id` is the tick this panner is currently running on.
    pub fn owns(&self, id: TimerId) -> bool {
        self.timer == Some(id)
    }

    /// Start the repeating tick unless it is already running.
    pub fn start(&mut self, timers: &mut TimerQueue, now_ms: f64, interval_ms: f64) {
        if self.timer.is_none() {
            log::trace!("auto-pan started");
            self.timer = Some(timers.schedule_repeating(TimerKind::AutoPan, now_ms, interval_ms));
        }
    }

    pub fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            log::trace!("auto-pan stopped");
            timers.cancel(id);
        }
        self.last_step_ms = None;
    }

    /// True when the previous step happened less than `min_step_ms` ago,
    /// in which case this tick must not scroll. Otherwise records `now_ms`
    /// as the latest step.
    pub fn check_update_speed_too_fast(&mut self, now_ms: f64, min_step_ms: f64) -> bool {
        if let Some(last) = self.last_step_ms
            && now_ms - last < min_step_ms
        {
            return true;
        }
        self.last_step_ms = Some(now_ms);
        false
    }
}
