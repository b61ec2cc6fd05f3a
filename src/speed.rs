//! Chat "energy" cycle.
//!
//! DESIGN
//! ======
//! The machine is the sole writer of the active mode. It decides *what*
//! the next mode is and *how long* it lasts; the engine's task queue owns
//! the timer that calls `transition` again when the dwell elapses.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::random::{duration_between, weighted_choice};

const MODE_WEIGHTS: [u32; 4] = [35, 45, 15, 5];

const DWELL_MIN: Duration = Duration::from_secs(30);
const DWELL_MAX: Duration = Duration::from_secs(180);
const BURST_DWELL_MIN: Duration = Duration::from_secs(10);
const BURST_DWELL_MAX: Duration = Duration::from_secs(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedMode {
    Slow,
    Normal,
    Fast,
    Burst,
}

impl SpeedMode {
    pub const ALL: [SpeedMode; 4] = [Self::Slow, Self::Normal, Self::Fast, Self::Burst];

    /// Factor applied to the jittered emission delay.
    #[must_use]
    pub fn delay_multiplier(self) -> f64 {
        match self {
            Self::Slow => 1.6,
            Self::Normal => 1.0,
            Self::Fast => 0.6,
            Self::Burst => 0.35,
        }
    }

    /// Factor applied to the per-tick hype-burst probability.
    #[must_use]
    pub fn burst_boost(self) -> f64 {
        match self {
            Self::Slow => 0.5,
            Self::Normal => 1.0,
            Self::Fast => 1.5,
            Self::Burst => 3.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeedStateMachine {
    current: SpeedMode,
    transitions: u64,
}

impl SpeedStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self { current: SpeedMode::Normal, transitions: 0 }
    }

    #[must_use]
    pub fn current(&self) -> SpeedMode {
        self.current
    }

    #[must_use]
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Dwell before the first transition of a session.
    pub fn initial_dwell<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        dwell_for(self.current, rng)
    }

    /// Advance to the next mode. Returns the new mode and how long it lasts.
    pub fn transition<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (SpeedMode, Duration) {
        self.current = select_next(self.current, rng);
        self.transitions += 1;
        (self.current, dwell_for(self.current, rng))
    }
}

impl Default for SpeedStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted draw of the next mode; a burst is never followed by a burst.
pub fn select_next<R: Rng + ?Sized>(previous: SpeedMode, rng: &mut R) -> SpeedMode {
    loop {
        let candidate = weighted_choice(&SpeedMode::ALL, &MODE_WEIGHTS, rng)
            .copied()
            .unwrap_or(SpeedMode::Normal);
        if !(previous == SpeedMode::Burst && candidate == SpeedMode::Burst) {
            return candidate;
        }
    }
}

/// Random dwell for `mode`. Bursts always get the short range.
pub fn dwell_for<R: Rng + ?Sized>(mode: SpeedMode, rng: &mut R) -> Duration {
    match mode {
        SpeedMode::Burst => duration_between(BURST_DWELL_MIN, BURST_DWELL_MAX, rng),
        _ => duration_between(DWELL_MIN, DWELL_MAX, rng),
    }
}

#[cfg(test)]
#[path = "speed_test.rs"]
mod tests;
