//! Host-driven timers.
//!
//! The core never reads a clock or spawns anything. Hosts call
//! `Timeline::tick(now_ms)` and ask `Timeline::next_deadline()` when to call
//! again; due entries fire in deadline order.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// A stationary press turns into a held click.
    ClickTimeout,
    /// Edge scrolling during a rectangle selection.
    AutoPan,
    /// Quiet period after the last scroll.
    ScrollFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    kind: TimerKind,
    due_ms: f64,
    interval_ms: Option<f64>,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<Entry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, kind: TimerKind, now_ms: f64, delay_ms: f64) -> TimerId {
        self.push(kind, now_ms + delay_ms.max(0.0), None)
    }

    /// First fires one `interval_ms` from now. Intervals below one
    /// millisecond are raised to one.
    pub fn schedule_repeating(&mut self, kind: TimerKind, now_ms: f64, interval_ms: f64) -> TimerId {
        let interval = interval_ms.max(1.0);
        self.push(kind, now_ms + interval, Some(interval))
    }

    fn push(&mut self, kind: TimerKind, due_ms: f64, interval_ms: Option<f64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            kind,
            due_ms,
            interval_ms,
        });
        id
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.due_ms).min_by(f64::total_cmp)
    }

    /// Take the earliest entry due at `now_ms`. One-shot entries are removed,
    /// repeating ones move on by one interval so missed periods still fire.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<(TimerId, TimerKind)> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[index];
        let fired = (entry.id, entry.kind);
        match entry.interval_ms {
            Some(interval) => entry.due_ms += interval,
            None => {
                self.entries.remove(index);
            }
        }
        Some(fired)
    }
}
