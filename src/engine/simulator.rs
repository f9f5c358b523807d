use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::source::CounterDevice;

/// Steps per second of a steady walk; each read jitters around this.
const WALK_CADENCE_STEPS_PER_SEC: f64 = 1.8;

/// Synthetic cumulative counter for hardware-free development and tests.
/// Advances at a walking cadence with a little per-read jitter; the total is
/// monotonically non-decreasing like the real register.
pub struct SimulatedCounter {
    state: Mutex<SimState>,
}

struct SimState {
    total: f64,
    last_read: Instant,
    rng: StdRng,
}

impl SimulatedCounter {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                total: 0.0,
                last_read: Instant::now(),
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }
}

impl CounterDevice for SimulatedCounter {
    fn read_total(&self) -> Option<u64> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        let elapsed = now.duration_since(state.last_read).as_secs_f64();
        state.last_read = now;

        let jitter: f64 = state.rng.gen_range(0.7..1.3);
        state.total += elapsed * WALK_CADENCE_STEPS_PER_SEC * jitter;

        Some(state.total as u64)
    }
}

/// A device slot with no hardware behind it. Sources built on this stay
/// permanently inert, the degraded state consumers must tolerate.
pub struct AbsentCounter;

impl CounterDevice for AbsentCounter {
    fn read_total(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_total_never_decreases() {
        let counter = SimulatedCounter::new(7);
        let mut previous = 0;
        for _ in 0..50 {
            let total = counter.read_total().unwrap();
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn absent_counter_reads_none() {
        assert!(AbsentCounter.read_total().is_none());
    }
}
