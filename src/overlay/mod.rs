//! Interactive overlays layered over the chat: polls and predictions.
//!
//! DESIGN
//! ======
//! Both widgets share a forward-only status (`Open -> Locked -> Completed`)
//! and one-vote-per-viewer semantics. Rejected actions are not errors: they
//! come back as outcome enums the host is free to ignore. Percentages are computed on every snapshot
//! and never cached.

pub mod poll;
pub mod prediction;

use serde::Serialize;

pub use poll::{Poll, PollSnapshot};
pub use prediction::{Payout, Prediction, PredictionSnapshot, ResolveOutcome};

/// Index of an option within its poll or prediction.
pub type OptionId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStatus {
    Open,
    Locked,
    Completed,
}

impl OverlayStatus {
    /// Move to `next` if that is a forward step. Returns whether it moved.
    pub fn advance_to(&mut self, next: OverlayStatus) -> bool {
        if next <= *self {
            return false;
        }
        *self = next;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Accepted,
    AlreadyVoted,
    NotOpen,
    UnknownOption,
    /// The id does not match the active poll or prediction.
    NoSuchOverlay,
}

impl VoteOutcome {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// `part / total` as a percentage; 0 when `total` is 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
