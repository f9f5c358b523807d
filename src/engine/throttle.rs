use std::time::{Duration, Instant};

/// Rate gate for outbound accounting events. The hardware counter can fire
/// many times a second during a brisk walk; unthrottled forwarding would
/// flood persistence and UI redraw. At most one emission is admitted per
/// interval, measured from the previous admitted emission, regardless of
/// whether the value changed.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_admitted: Option<(u64, Instant)>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_admitted: None,
        }
    }

    /// Decide whether a computed value may be emitted at `now`. Records the
    /// value and instant on admission; a suppressed value leaves no trace.
    pub fn admit(&mut self, steps: u64, now: Instant) -> bool {
        if let Some((_, last_at)) = self.last_admitted {
            if now.duration_since(last_at) < self.min_interval {
                return false;
            }
        }
        self.last_admitted = Some((steps, now));
        true
    }

    /// The most recently emitted value, if any.
    pub fn last_admitted_value(&self) -> Option<u64> {
        self.last_admitted.map(|(steps, _)| steps)
    }
}
