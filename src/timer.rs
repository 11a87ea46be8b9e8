//! Periodic "once every" timers for the control loop.
//!
//! A timer is polled, never waited on: [`Timer::fire`] answers whether the
//! period has elapsed at the given time and, if so, restarts the period at
//! that time. Because the restart point is the poll time rather than the
//! scheduled time, late polls push every later firing back: the cadence
//! drifts instead of catching up. Keep it that way; a phase-locked timer
//! would fire in bursts after a stall.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Timer {
    period: f64,
    last_fired: Option<f64>,
}

impl Timer {
    /// A timer with `period` seconds between firings. The first poll fires.
    pub fn every(period: f64) -> Self {
        Self {
            period,
            last_fired: None,
        }
    }

    pub fn from_hz(hz: f64) -> Self {
        Self::every(1.0 / hz)
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }

    /// Returns `true` if at least one period has passed since the last firing,
    /// and records `now` as the new firing time.
    pub fn fire(&mut self, now: f64) -> bool {
        let due = match self.last_fired {
            None => true,
            Some(last) => now - last >= self.period,
        };
        if due {
            self.last_fired = Some(now);
        }
        due
    }
}

/// Monotonic seconds since the simulator started. Shared by the control loop
/// and the receiver so their timestamps are comparable.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
