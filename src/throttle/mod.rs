// Update throttle
//
// Counts ticks since the last flush. The dispatcher asks once per tick and
// flushes when the window has elapsed.

/// Tick-counting flush gate.
///
/// A threshold of 0 or 1 opens the gate on every tick; T > 1 opens it
/// every T ticks.
#[derive(Debug, Clone)]
pub struct UpdateThrottle {
    countdown: u32,
    threshold: u32,
}

impl UpdateThrottle {
    pub fn new(threshold: u32) -> Self {
        Self {
            countdown: 0,
            threshold,
        }
    }

    /// Advance one tick. Returns true when the window has elapsed, in which
    /// case the counter restarts from 0.
    pub fn tick(&mut self) -> bool {
        self.countdown = self.countdown.saturating_add(1);
        if self.countdown >= self.threshold {
            self.countdown = 0;
            true
        } else {
            false
        }
    }

    /// Change the window length; the running count is kept
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Restart the window (login)
    pub fn reset(&mut self) {
        self.countdown = 0;
    }
}
