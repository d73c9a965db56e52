//! Drop speed policy
//!
//! The piece falls one row per drop interval. Every speed-up period of
//! running play shortens the interval by a fixed step, down to a floor.
//! Holding soft drop switches to a fixed fast interval.

use std::time::Duration;

/// All timing parameters of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Starting drop interval
    pub base_interval: Duration,
    /// Drop interval while soft drop is held
    pub soft_drop_interval: Duration,
    /// Running time between speed-ups
    pub speed_up_every: Duration,
    /// Amount each speed-up removes from the interval
    pub speed_up_step: Duration,
    /// Shortest drop interval
    pub min_interval: Duration,
    /// How long a blast zone stays highlighted before removal
    pub clear_flash: Duration,
    /// Pause after columns fall before the next match check
    pub chain_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(800),
            soft_drop_interval: Duration::from_millis(50),
            speed_up_every: Duration::from_millis(60_000),
            speed_up_step: Duration::from_millis(75),
            min_interval: Duration::from_millis(150),
            clear_flash: Duration::from_millis(200),
            chain_delay: Duration::from_millis(200),
        }
    }
}

/// Tracks the current drop interval over the course of a game
#[derive(Debug, Clone)]
pub struct SpeedController {
    timing: Timing,
    interval: Duration,
    /// Running time since the last speed-up
    since_speed_up: Duration,
}

impl SpeedController {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            interval: timing.base_interval,
            since_speed_up: Duration::ZERO,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Current gravity interval, ignoring soft drop
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Interval between gravity steps
    pub fn drop_interval(&self, soft_drop: bool) -> Duration {
        if soft_drop {
            self.timing.soft_drop_interval
        } else {
            self.interval
        }
    }

    /// Account for `dt` of running play. Returns true if the interval changed.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.timing.speed_up_every.is_zero() {
            return false;
        }
        let before = self.interval;
        self.since_speed_up += dt;
        while self.since_speed_up >= self.timing.speed_up_every {
            self.since_speed_up -= self.timing.speed_up_every;
            self.interval = self
                .interval
                .saturating_sub(self.timing.speed_up_step)
                .max(self.timing.min_interval);
        }
        self.interval != before
    }

    /// Back to the starting interval
    pub fn reset(&mut self) {
        *self = Self::new(self.timing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_starts_at_base_interval() {
        let speed = SpeedController::new(Timing::default());
        assert_eq!(speed.drop_interval(false), Duration::from_millis(800));
        assert_eq!(speed.drop_interval(true), Duration::from_millis(50));
    }

    #[test]
    fn test_speeds_up_each_minute() {
        let mut speed = SpeedController::new(Timing::default());
        assert!(!speed.advance(Duration::from_secs(59)));
        assert!(speed.advance(Duration::from_secs(1)));
        assert_eq!(speed.interval(), Duration::from_millis(725));
        assert!(speed.advance(MINUTE));
        assert_eq!(speed.interval(), Duration::from_millis(650));
    }

    #[test]
    fn test_interval_floor() {
        let mut speed = SpeedController::new(Timing::default());
        for _ in 0..20 {
            speed.advance(MINUTE);
        }
        assert_eq!(speed.interval(), Duration::from_millis(150));
        assert!(!speed.advance(MINUTE));
    }

    #[test]
    fn test_large_step_applies_every_period() {
        let mut speed = SpeedController::new(Timing::default());
        speed.advance(MINUTE * 3);
        assert_eq!(speed.interval(), Duration::from_millis(575));
    }

    #[test]
    fn test_reset() {
        let mut speed = SpeedController::new(Timing::default());
        speed.advance(MINUTE * 2);
        speed.reset();
        assert_eq!(speed.interval(), Duration::from_millis(800));
    }
}
