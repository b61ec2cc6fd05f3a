//! Emission cadence.
//!
//! DESIGN
//! ======
//! Each tick `plan_tick` turns the viewer count and active speed mode into
//! a `TickPlan`: a list of emissions with offsets from the tick, plus the
//! delay until the next tick. The engine schedules one task per planned
//! emission, so batch members and burst messages fire in offset order.
//!
//! Base intervals come from a breakpoint table that never increases with
//! viewer count and bottoms out at the configured minimum.

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;

use crate::config::ChatConfig;
use crate::random::{chance, jitter};
use crate::speed::SpeedMode;

/// `(max viewers, base divisor)`, checked in order.
const INTERVAL_TIERS: [(u64, u32); 4] = [(10, 1), (50, 2), (200, 4), (1_000, 8)];
const HIGH_TRAFFIC_DIVISOR: u32 = 16;
/// At and above this count the base interval is the configured floor.
pub const FLOOR_VIEWERS: u64 = 5_000;

const JITTER_LOW: f64 = 0.7;
const JITTER_HIGH: f64 = 1.3;

/// `(max viewers, min batch, max batch)`.
const BATCH_TIERS: [(u64, usize, usize); 4] = [(10, 1, 1), (50, 1, 2), (200, 1, 3), (1_000, 2, 4)];
const HIGH_TRAFFIC_BATCH: (usize, usize) = (3, 5);

const BURST_MIN_PROBABILITY: f64 = 0.01;
const BURST_MAX_PROBABILITY: f64 = 0.15;
const BURST_PROBABILITY_CAP: f64 = 0.6;

pub const MILESTONES: [u64; 10] = [100, 250, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000];
const MILESTONE_CROSSED_PROBABILITY: f64 = 0.5;
const MILESTONE_NEAR_PROBABILITY: f64 = 0.05;
const MILESTONE_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitKind {
    /// Ordinary chat line from the roster.
    Regular,
    /// Short reaction inside a hype burst.
    Hype,
    /// Celebration of a viewer-count milestone.
    Milestone(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedEmit {
    pub offset: Duration,
    pub kind: EmitKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickPlan {
    /// Emissions ordered by offset from the tick.
    pub emits: Vec<PlannedEmit>,
    /// Delay until the following tick.
    pub next_delay: Duration,
}

impl TickPlan {
    #[must_use]
    pub fn count(&self, kind: EmitKind) -> usize {
        self.emits.iter().filter(|e| e.kind == kind).count()
    }

    #[must_use]
    pub fn milestone(&self) -> Option<u64> {
        self.emits.iter().find_map(|e| match e.kind {
            EmitKind::Milestone(m) => Some(m),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RateScheduler {
    base_interval: Duration,
    min_interval: Duration,
    batch_stagger: Duration,
    burst_stagger: Duration,
    last_viewers: Option<u64>,
    celebrated: HashSet<u64>,
}

impl RateScheduler {
    #[must_use]
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            base_interval: config.base_interval,
            min_interval: config.min_interval,
            batch_stagger: config.batch_stagger,
            burst_stagger: config.burst_stagger,
            last_viewers: None,
            celebrated: HashSet::new(),
        }
    }

    /// Un-jittered interval for `viewers`. Non-increasing in `viewers`.
    #[must_use]
    pub fn base_interval(&self, viewers: u64) -> Duration {
        if viewers >= FLOOR_VIEWERS {
            return self.min_interval;
        }
        let divisor = INTERVAL_TIERS
            .iter()
            .find(|(max, _)| viewers <= *max)
            .map_or(HIGH_TRAFFIC_DIVISOR, |(_, d)| *d);
        (self.base_interval / divisor).max(self.min_interval)
    }

    /// Jittered delay until the next tick, scaled by the speed mode.
    pub fn next_delay<R: Rng + ?Sized>(&self, viewers: u64, mode: SpeedMode, rng: &mut R) -> Duration {
        let jittered = jitter(self.base_interval(viewers), JITTER_LOW, JITTER_HIGH, rng);
        jittered.mul_f64(mode.delay_multiplier()).max(self.min_interval)
    }

    /// Number of regular messages to emit this tick.
    pub fn batch_size<R: Rng + ?Sized>(&self, viewers: u64, rng: &mut R) -> usize {
        let (low, high) = batch_bounds(viewers);
        rng.random_range(low..=high)
    }

    /// Chance that a tick adds a hype burst on top of its batch.
    #[must_use]
    pub fn burst_probability(&self, viewers: u64, mode: SpeedMode) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let scaled = (viewers as f64 / 10_000.0).clamp(BURST_MIN_PROBABILITY, BURST_MAX_PROBABILITY);
        (scaled * mode.burst_boost()).min(BURST_PROBABILITY_CAP)
    }

    /// Decide whether a milestone celebration fires this tick.
    ///
    /// A milestone crossed upward since the previous check fires with a high
    /// probability; a count merely close to one uses a low probability. Each
    /// milestone is celebrated at most once.
    pub fn check_milestone<R: Rng + ?Sized>(&mut self, viewers: u64, rng: &mut R) -> Option<u64> {
        let previous = self.last_viewers.replace(viewers);

        let crossed = previous.and_then(|prev| {
            MILESTONES
                .iter()
                .rev()
                .copied()
                .find(|m| prev < *m && viewers >= *m && !self.celebrated.contains(m))
        });
        let candidate = match crossed {
            Some(m) => Some((m, MILESTONE_CROSSED_PROBABILITY)),
            None => nearby_milestone(viewers)
                .filter(|m| !self.celebrated.contains(m))
                .map(|m| (m, MILESTONE_NEAR_PROBABILITY)),
        };

        let (milestone, probability) = candidate?;
        if !chance(probability, rng) {
            return None;
        }
        self.celebrated.insert(milestone);
        Some(milestone)
    }

    #[must_use]
    pub fn is_celebrated(&self, milestone: u64) -> bool {
        self.celebrated.contains(&milestone)
    }

    /// Plan one emission tick.
    pub fn plan_tick<R: Rng + ?Sized>(&mut self, viewers: u64, mode: SpeedMode, rng: &mut R) -> TickPlan {
        let mut emits = Vec::new();

        let batch = self.batch_size(viewers, rng);
        emits.extend((0..batch).map(|i| PlannedEmit { offset: self.batch_stagger * stagger_index(i), kind: EmitKind::Regular }));

        if chance(self.burst_probability(viewers, mode), rng) {
            let size = burst_size(viewers, rng);
            // Starts just after the first batch member.
            emits.extend(
                (1..=size).map(|i| PlannedEmit { offset: self.burst_stagger * stagger_index(i), kind: EmitKind::Hype }),
            );
        }

        if let Some(milestone) = self.check_milestone(viewers, rng) {
            let size = rng.random_range(2..=4);
            emits.extend((0..size).map(|i| PlannedEmit {
                offset: MILESTONE_DELAY + self.burst_stagger * stagger_index(i),
                kind: EmitKind::Milestone(milestone),
            }));
        }

        // Stable: members of one group keep their relative order.
        emits.sort_by_key(|e| e.offset);

        TickPlan { emits, next_delay: self.next_delay(viewers, mode, rng) }
    }
}

fn batch_bounds(viewers: u64) -> (usize, usize) {
    BATCH_TIERS
        .iter()
        .find(|(max, _, _)| viewers <= *max)
        .map_or(HIGH_TRAFFIC_BATCH, |(_, low, high)| (*low, *high))
}

fn burst_size<R: Rng + ?Sized>(viewers: u64, rng: &mut R) -> usize {
    if viewers > 1_000 { rng.random_range(4..=8) } else { rng.random_range(3..=6) }
}

/// Milestone within 2% below or 5% above `viewers`.
fn nearby_milestone(viewers: u64) -> Option<u64> {
    MILESTONES
        .iter()
        .copied()
        .find(|m| viewers.saturating_mul(100) >= m * 98 && viewers.saturating_mul(100) <= m * 105)
}

fn stagger_index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[path = "rate_test.rs"]
mod tests;
