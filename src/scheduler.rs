//! Loop scheduling — a re-armable one-shot timer on the context clock.

/// Interval between loop iterations: fire `margin_ms` before the current
/// iteration's audio ends so the next one is fully scheduled in time.
pub fn rearm_interval_ms(loop_duration: f64, margin_ms: u64) -> u64 {
    let loop_ms = (loop_duration * 1000.0).round().max(0.0) as u64;
    loop_ms.saturating_sub(margin_ms)
}

/// The next-iteration timer. Armed after each iteration is scheduled; fired
/// by polling against the context clock.
#[derive(Debug, Clone, Default)]
pub struct LoopTask {
    due_at: Option<f64>,
    iterations: u64,
}

impl LoopTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `delay_ms` after `now` (seconds).
    pub fn arm(&mut self, now: f64, delay_ms: u64) {
        self.due_at = Some(now + delay_ms as f64 / 1000.0);
    }

    pub fn due_at(&self) -> Option<f64> {
        self.due_at
    }

    pub fn is_armed(&self) -> bool {
        self.due_at.is_some()
    }

    /// Consume the timer if it has come due. The caller re-arms it after
    /// scheduling the next iteration.
    pub fn take_due(&mut self, now: f64) -> bool {
        match self.due_at {
            Some(due) if now >= due => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }

    /// Record that an iteration was scheduled; returns its 1-based number.
    pub fn record_iteration(&mut self) -> u64 {
        self.iterations += 1;
        self.iterations
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}
