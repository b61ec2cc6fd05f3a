//! Auto-follow for the chat surface.
//!
//! DESIGN
//! ======
//! Two states, `Following` and `Paused`, recomputed from the surface's
//! distance to the bottom on every evaluated scroll event. The controller
//! never touches a real viewport: it returns `ScrollCommand`s for the host
//! to apply and exposes a derived `ScrollState`.
//!
//! THROTTLING
//! ==========
//! Leading-edge throttle. The first scroll event in a quiet period is
//! evaluated at once and opens a window of `throttle` length; events inside
//! the window only replace the deferred metrics. `on_scroll` asks the caller
//! for a single timer at the window end, where `on_throttle_elapsed`
//! evaluates the newest deferred metrics (trailing edge).

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Geometry of the scrollable chat surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    #[must_use]
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self { scroll_top, scroll_height, client_height }
    }

    /// Metrics for a surface scrolled `offset` px above its bottom.
    #[must_use]
    pub fn at_offset(offset: f64, scroll_height: f64, client_height: f64) -> Self {
        Self { scroll_top: (scroll_height - client_height - offset).max(0.0), scroll_height, client_height }
    }

    #[must_use]
    pub fn offset_from_bottom(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    Following,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Immediate,
}

/// Instruction for the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScrollCommand {
    ScrollToBottom { behavior: ScrollBehavior },
}

/// Derived view of the controller for the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollState {
    pub is_auto_following: bool,
    pub has_pending_new: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollController {
    mode: FollowMode,
    has_pending_new: bool,
    auto_scroll: bool,
    append_behavior: ScrollBehavior,
    threshold_px: f64,
    throttle: Duration,
    throttle_until: Option<Instant>,
    deferred: Option<ScrollMetrics>,
    flush_requested: bool,
    evaluations: u64,
}

impl ScrollController {
    #[must_use]
    pub fn new(threshold_px: f64, throttle: Duration) -> Self {
        Self {
            mode: FollowMode::Following,
            has_pending_new: false,
            auto_scroll: true,
            append_behavior: ScrollBehavior::Smooth,
            threshold_px,
            throttle,
            throttle_until: None,
            deferred: None,
            flush_requested: false,
            evaluations: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> ScrollState {
        ScrollState { is_auto_following: self.mode == FollowMode::Following, has_pending_new: self.has_pending_new }
    }

    #[must_use]
    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    #[must_use]
    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    /// Scroll events actually evaluated (after throttling).
    #[must_use]
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Behavior used when new content drags the surface to the bottom.
    pub fn set_append_behavior(&mut self, behavior: ScrollBehavior) {
        self.append_behavior = behavior;
    }

    /// Feed a scroll event from the surface.
    ///
    /// Returns the instant at which the caller must invoke
    /// [`Self::on_throttle_elapsed`], when a trailing timer is needed and
    /// not already requested.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) -> Option<Instant> {
        match self.throttle_until {
            Some(until) if now < until => {
                self.deferred = Some(metrics);
                if self.flush_requested {
                    return None;
                }
                self.flush_requested = true;
                Some(until)
            }
            _ => {
                // Metrics deferred from an earlier window are older than these.
                self.deferred = None;
                self.evaluate(metrics);
                self.throttle_until = Some(now + self.throttle);
                None
            }
        }
    }

    /// Trailing edge of a throttle window.
    pub fn on_throttle_elapsed(&mut self, now: Instant) {
        self.flush_requested = false;
        match self.deferred.take() {
            Some(metrics) => {
                self.evaluate(metrics);
                self.throttle_until = Some(now + self.throttle);
            }
            None => {
                if self.throttle_until.is_some_and(|until| now >= until) {
                    self.throttle_until = None;
                }
            }
        }
    }

    /// React to appended content.
    pub fn on_content_changed(&mut self) -> Option<ScrollCommand> {
        if self.mode == FollowMode::Following && self.auto_scroll {
            return Some(ScrollCommand::ScrollToBottom { behavior: self.append_behavior });
        }
        if !self.has_pending_new {
            debug!("new chat messages while not following");
        }
        self.has_pending_new = true;
        None
    }

    /// Explicit "jump to latest" from the viewer.
    pub fn jump_to_latest(&mut self) -> ScrollCommand {
        self.follow(ScrollBehavior::Smooth)
    }

    /// The chat view became visible again.
    pub fn on_view_activated(&mut self) -> ScrollCommand {
        self.follow(ScrollBehavior::Immediate)
    }

    /// Toggle the auto-scroll preference. Turning it on snaps to the bottom.
    pub fn set_auto_scroll(&mut self, enabled: bool) -> Option<ScrollCommand> {
        self.auto_scroll = enabled;
        enabled.then(|| self.follow(ScrollBehavior::Immediate))
    }

    /// Content height changed under the viewer; prior offsets are stale.
    pub fn on_font_size_changed(&mut self) -> Option<ScrollCommand> {
        self.auto_scroll.then(|| self.follow(ScrollBehavior::Immediate))
    }

    fn follow(&mut self, behavior: ScrollBehavior) -> ScrollCommand {
        self.mode = FollowMode::Following;
        self.has_pending_new = false;
        self.deferred = None;
        ScrollCommand::ScrollToBottom { behavior }
    }

    fn evaluate(&mut self, metrics: ScrollMetrics) {
        self.evaluations += 1;
        let offset = metrics.offset_from_bottom();
        let next = if offset > self.threshold_px { FollowMode::Paused } else { FollowMode::Following };
        if next != self.mode {
            debug!(offset, mode = ?next, "chat follow mode changed");
        }
        if next == FollowMode::Following {
            self.has_pending_new = false;
        }
        self.mode = next;
    }
}

#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;
