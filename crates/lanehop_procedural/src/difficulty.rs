//! Tick-counted difficulty interval.
//!
//! Difficulty steps are decided inside `update()` from simulated ticks, so
//! a replay with the same seed ramps up at exactly the same moments.

/// Fires once every `interval_ticks` ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyClock {
    interval_ticks: u64,
    elapsed: u64,
    level: u32,
}

impl DifficultyClock {
    /// Creates a clock. An interval of zero never fires.
    #[must_use]
    pub const fn new(interval_ticks: u64) -> Self {
        Self {
            interval_ticks,
            elapsed: 0,
            level: 0,
        }
    }

    /// Counts one tick. Returns true when a difficulty step is due.
    pub fn tick(&mut self) -> bool {
        if self.interval_ticks == 0 {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed >= self.interval_ticks {
            self.elapsed = 0;
            self.level += 1;
            return true;
        }
        false
    }

    /// Steps fired so far.
    #[inline]
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Ticks until the next step, or `None` if the clock is disabled.
    #[must_use]
    pub const fn ticks_remaining(&self) -> Option<u64> {
        if self.interval_ticks == 0 {
            None
        } else {
            Some(self.interval_ticks - self.elapsed)
        }
    }

    /// Starts over from level zero.
    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.level = 0;
    }
}
