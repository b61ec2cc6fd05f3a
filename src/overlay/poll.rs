//! Viewer poll: open until closed or expired, one vote per viewer.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use super::{OptionId, OverlayStatus, VoteOutcome, percentage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOption {
    pub text: String,
    pub votes: u64,
}

#[derive(Debug, Clone)]
pub struct Poll {
    id: Uuid,
    question: String,
    options: Vec<PollOption>,
    ends_at: Instant,
    status: OverlayStatus,
    winner: Option<OptionId>,
    voters: HashMap<Uuid, OptionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollOptionSnapshot {
    pub id: OptionId,
    pub text: String,
    pub votes: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSnapshot {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<PollOptionSnapshot>,
    pub total_votes: u64,
    pub status: OverlayStatus,
    pub winner: Option<OptionId>,
    pub seconds_remaining: u64,
    /// The requesting viewer's vote, if any.
    pub my_vote: Option<OptionId>,
}

impl Poll {
    #[must_use]
    pub fn new(question: impl Into<String>, options: impl IntoIterator<Item = impl Into<String>>, ends_at: Instant) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.into(),
            options: options.into_iter().map(|text| PollOption { text: text.into(), votes: 0 }).collect(),
            ends_at,
            status: OverlayStatus::Open,
            winner: None,
            voters: HashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
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
    pub fn ends_at(&self) -> Instant {
        self.ends_at
    }

    #[must_use]
    pub fn options(&self) -> &[PollOption] {
        &self.options
    }

    #[must_use]
    pub fn has_voted(&self, viewer: Uuid) -> bool {
        self.voters.contains_key(&viewer)
    }

    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// Cast `viewer`'s single vote.
    pub fn vote(&mut self, viewer: Uuid, option: OptionId) -> VoteOutcome {
        if self.status != OverlayStatus::Open {
            return VoteOutcome::NotOpen;
        }
        if self.voters.contains_key(&viewer) {
            return VoteOutcome::AlreadyVoted;
        }
        let Some(slot) = self.options.get_mut(option) else {
            return VoteOutcome::UnknownOption;
        };
        slot.votes += 1;
        self.voters.insert(viewer, option);
        VoteOutcome::Accepted
    }

    /// Stop accepting votes without picking a winner yet.
    pub fn lock(&mut self) -> bool {
        self.status.advance_to(OverlayStatus::Locked)
    }

    /// Complete the poll. The winner is the option with the most votes,
    /// the earliest one on ties, and none if nobody voted. Returns `false`
    /// if the poll was already completed.
    pub fn close(&mut self) -> bool {
        if !self.status.advance_to(OverlayStatus::Completed) {
            return false;
        }
        self.winner = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, o)| o.votes > 0)
            .fold(None::<(OptionId, u64)>, |best, (i, o)| match best {
                Some((_, votes)) if votes >= o.votes => best,
                _ => Some((i, o.votes)),
            })
            .map(|(i, _)| i);
        true
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.ends_at
    }

    #[must_use]
    pub fn snapshot(&self, now: Instant, viewer: Option<Uuid>) -> PollSnapshot {
        let total_votes = self.total_votes();
        PollSnapshot {
            id: self.id,
            question: self.question.clone(),
            options: self
                .options
                .iter()
                .enumerate()
                .map(|(id, o)| PollOptionSnapshot {
                    id,
                    text: o.text.clone(),
                    votes: o.votes,
                    percentage: percentage(o.votes, total_votes),
                })
                .collect(),
            total_votes,
            status: self.status,
            winner: self.winner,
            seconds_remaining: if self.status == OverlayStatus::Open {
                remaining_secs(self.ends_at, now)
            } else {
                0
            },
            my_vote: viewer.and_then(|v| self.voters.get(&v).copied()),
        }
    }
}

fn remaining_secs(ends_at: Instant, now: Instant) -> u64 {
    let left = ends_at.saturating_duration_since(now);
    // Round up so a poll with 200ms left still shows 1s.
    (left + Duration::from_millis(999)).as_secs()
}

#[cfg(test)]
#[path = "poll_test.rs"]
mod tests;
