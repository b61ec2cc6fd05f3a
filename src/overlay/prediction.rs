//! Channel-points prediction: timed betting that locks on a countdown and
//! is resolved by the channel owner.
//!
//! LIFECYCLE
//! =========
//! 1. `Open`: viewers stake points on one outcome each; `tick` runs once
//!    per second.
//! 2. `Locked`: countdown hit zero (or the owner locked early); no stakes.
//! 3. `Completed`: owner picked the winner; terminal. Backers of the winner
//!    split the whole pool in proportion to their stake.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::{OptionId, OverlayStatus, VoteOutcome, percentage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionOption {
    pub text: String,
    pub participant_count: u64,
    pub points_staked: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stake {
    option: OptionId,
    points: u64,
}

/// Points owed to a viewer after resolution. The balance itself lives
/// with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub viewer: Uuid,
    pub points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved { winner: OptionId, payouts: Vec<Payout> },
    Unauthorized,
    /// Still open; lock it (or wait for the countdown) first.
    NotLocked,
    AlreadyCompleted,
    UnknownOption,
    /// The id does not match the active prediction.
    NoSuchPrediction,
}

#[derive(Debug, Clone)]
pub struct Prediction {
    id: Uuid,
    question: String,
    owner_id: Uuid,
    options: Vec<PredictionOption>,
    status: OverlayStatus,
    winner: Option<OptionId>,
    seconds_remaining: u64,
    stakes: HashMap<Uuid, Stake>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOptionSnapshot {
    pub id: OptionId,
    pub text: String,
    pub participant_count: u64,
    pub points_staked: u64,
    pub participant_percentage: f64,
    pub points_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSnapshot {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<PredictionOptionSnapshot>,
    pub total_participants: u64,
    pub total_points: u64,
    pub status: OverlayStatus,
    pub winner: Option<OptionId>,
    pub seconds_remaining: u64,
    pub my_stake: Option<(OptionId, u64)>,
}

impl Prediction {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        owner_id: Uuid,
        window: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            owner_id,
            options: options
                .into_iter()
                .map(|text| PredictionOption { text: text.into(), participant_count: 0, points_staked: 0 })
                .collect(),
            status: OverlayStatus::Open,
            winner: None,
            seconds_remaining: window.as_secs().max(1),
            stakes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    #[must_use]
    pub fn status(&self) -> OverlayStatus {
        self.status
    }

    #[must_use]
    pub fn winner(&self) -> Option<OptionId> {
        self.winner
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    #[must_use]
    pub fn options(&self) -> &[PredictionOption] {
        &self.options
    }

    #[must_use]
    pub fn has_voted(&self, viewer: Uuid) -> bool {
        self.stakes.contains_key(&viewer)
    }

    #[must_use]
    pub fn total_participants(&self) -> u64 {
        self.options.iter().map(|o| o.participant_count).fold(0, u64::saturating_add)
    }

    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.options.iter().map(|o| o.points_staked).fold(0, u64::saturating_add)
    }

    /// Stake `points` on `option` for `viewer`. One stake per viewer.
    pub fn vote(&mut self, viewer: Uuid, option: OptionId, points: u64) -> VoteOutcome {
        if self.status != OverlayStatus::Open {
            return VoteOutcome::NotOpen;
        }
        if self.stakes.contains_key(&viewer) {
            return VoteOutcome::AlreadyVoted;
        }
        let Some(slot) = self.options.get_mut(option) else {
            return VoteOutcome::UnknownOption;
        };
        slot.participant_count += 1;
        slot.points_staked = slot.points_staked.saturating_add(points);
        self.stakes.insert(viewer, Stake { option, points });
        VoteOutcome::Accepted
    }

    /// One second of countdown. Returns `true` when this tick locked the
    /// prediction; the caller stops ticking once it is no longer open.
    pub fn tick(&mut self) -> bool {
        if self.status != OverlayStatus::Open {
            return false;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        self.seconds_remaining == 0 && self.lock()
    }

    /// Close betting early or on countdown expiry.
    pub fn lock(&mut self) -> bool {
        if self.status != OverlayStatus::Open {
            return false;
        }
        self.seconds_remaining = 0;
        self.status.advance_to(OverlayStatus::Locked)
    }

    /// Pick the winning outcome. Only the owner may resolve, only once.
    pub fn resolve(&mut self, actor: Uuid, winner: OptionId) -> ResolveOutcome {
        match self.status {
            OverlayStatus::Completed => return ResolveOutcome::AlreadyCompleted,
            OverlayStatus::Open => return ResolveOutcome::NotLocked,
            OverlayStatus::Locked => {}
        }
        if actor != self.owner_id {
            return ResolveOutcome::Unauthorized;
        }
        let Some(winning) = self.options.get(winner) else {
            return ResolveOutcome::UnknownOption;
        };

        let winning_pool = winning.points_staked;
        let total_pool = self.total_points();
        let mut payouts: Vec<Payout> = self
            .stakes
            .iter()
            .filter(|(_, stake)| stake.option == winner && stake.points > 0)
            .map(|(viewer, stake)| Payout { viewer: *viewer, points: payout(stake.points, winning_pool, total_pool) })
            .collect();
        payouts.sort_by(|a, b| b.points.cmp(&a.points).then(a.viewer.cmp(&b.viewer)));

        self.status.advance_to(OverlayStatus::Completed);
        self.winner = Some(winner);
        ResolveOutcome::Resolved { winner, payouts }
    }

    #[must_use]
    pub fn snapshot(&self, viewer: Option<Uuid>) -> PredictionSnapshot {
        let total_participants = self.total_participants();
        let total_points = self.total_points();
        PredictionSnapshot {
            id: self.id,
            question: self.question.clone(),
            options: self
                .options
                .iter()
                .enumerate()
                .map(|(id, o)| PredictionOptionSnapshot {
                    id,
                    text: o.text.clone(),
                    participant_count: o.participant_count,
                    points_staked: o.points_staked,
                    participant_percentage: percentage(o.participant_count, total_participants),
                    points_percentage: percentage(o.points_staked, total_points),
                })
                .collect(),
            total_participants,
            total_points,
            status: self.status,
            winner: self.winner,
            seconds_remaining: self.seconds_remaining,
            my_stake: viewer
                .and_then(|v| self.stakes.get(&v))
                .map(|stake| (stake.option, stake.points)),
        }
    }
}

/// Proportional share of the pool, never less than the stake itself.
fn payout(stake: u64, winning_pool: u64, total_pool: u64) -> u64 {
    if winning_pool == 0 {
        return stake;
    }
    let share = u128::from(stake) * u128::from(total_pool) / u128::from(winning_pool);
    u64::try_from(share).unwrap_or(u64::MAX).max(stake)
}

#[cfg(test)]
#[path = "prediction_test.rs"]
mod tests;
