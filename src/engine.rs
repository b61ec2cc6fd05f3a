//! Chat session engine.
//!
//! DESIGN
//! ======
//! `ChatEngine` owns every component and one `TaskQueue<Task>`. All timers
//! the simulation needs are tasks in that queue:
//!
//! - `SpeedTransition`: reschedules itself after each dwell
//! - `EmissionTick`: plans a tick, schedules its `Emit`s, reschedules itself
//! - `Emit`: one staggered batch, burst or milestone message
//! - `ScrollFlush`: trailing edge of the scroll throttle
//! - `PredictionCountdown`: one second of prediction countdown
//! - `PollExpiry`: closes the active poll at its end time
//!
//! The host calls `advance(now)`; due tasks run in `(due, schedule order)`
//! and reschedule relative to their own due instant, so a late `advance`
//! catches up without drifting. `teardown` cancels the whole queue, after
//! which nothing in the engine can fire again.
//!
//! Every append goes through one path (`append`) that notifies the scroll
//! controller synchronously. Scroll commands and overlay notifications are
//! queued as `EngineEvent`s for the host to drain.

use std::time::Duration;

use rand::rngs::StdRng;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::generator::MessageGenerator;
use crate::overlay::{OptionId, Payout, Poll, PollSnapshot, Prediction, PredictionSnapshot, ResolveOutcome, VoteOutcome};
use crate::rate::{EmitKind, RateScheduler};
use crate::roster::ChatUser;
use crate::scheduler::{TaskId, TaskQueue};
use crate::scroll::{ScrollBehavior, ScrollCommand, ScrollController, ScrollMetrics, ScrollState};
use crate::speed::{SpeedMode, SpeedStateMachine};
use crate::store::{Message, MessageDraft, MessageId, MessageKind, MessageStore, SendOptions};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    SpeedTransition,
    EmissionTick,
    Emit(EmitKind),
    ScrollFlush,
    PredictionCountdown,
    PollExpiry,
}

/// Notification for the host, drained with [`ChatEngine::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Scroll { command: ScrollCommand },
    PollLocked { poll_id: Uuid },
    PollClosed { poll_id: Uuid, winner: Option<OptionId> },
    PredictionLocked { prediction_id: Uuid },
    PredictionResolved { prediction_id: Uuid, winner: OptionId },
    /// A viewer backed the winning outcome; credit their balance.
    PointsAwarded { prediction_id: Uuid, payout: Payout },
}

/// Everything a render surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSnapshot {
    pub messages: Vec<Message>,
    pub scroll: ScrollState,
    pub speed: SpeedMode,
    pub viewer_count: u64,
    pub poll: Option<PollSnapshot>,
    pub prediction: Option<PredictionSnapshot>,
}

#[derive(Debug, Default)]
struct Handles {
    countdown: Option<TaskId>,
    poll_expiry: Option<TaskId>,
}

pub struct ChatEngine {
    config: ChatConfig,
    rng: StdRng,
    tasks: TaskQueue<Task>,
    handles: Handles,
    speed: SpeedStateMachine,
    rate: RateScheduler,
    generator: MessageGenerator,
    store: MessageStore,
    scroll: ScrollController,
    poll: Option<Poll>,
    prediction: Option<Prediction>,
    users: Vec<ChatUser>,
    current_user: Option<Uuid>,
    viewer_count: u64,
    events: Vec<EngineEvent>,
    running: bool,
    torn_down: bool,
}

impl ChatEngine {
    #[must_use]
    pub fn new(config: ChatConfig, rng: StdRng) -> Self {
        Self {
            rate: RateScheduler::new(&config),
            store: MessageStore::new(config.retention_cap),
            scroll: ScrollController::new(config.scroll_threshold_px, config.scroll_throttle),
            config,
            rng,
            tasks: TaskQueue::new(),
            handles: Handles::default(),
            speed: SpeedStateMachine::new(),
            generator: MessageGenerator::default(),
            poll: None,
            prediction: None,
            users: Vec::new(),
            current_user: None,
            viewer_count: 0,
            events: Vec::new(),
            running: false,
            torn_down: false,
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Start the speed cycle and the emission timer.
    pub fn start(&mut self, now: Instant) {
        if self.running || self.torn_down {
            return;
        }
        self.running = true;

        let dwell = self.speed.initial_dwell(&mut self.rng);
        self.tasks.schedule_after(now, dwell, Task::SpeedTransition);

        let delay = self.rate.next_delay(self.viewer_count, self.speed.current(), &mut self.rng);
        self.tasks.schedule_after(now, delay, Task::EmissionTick);

        info!(viewers = self.viewer_count, users = self.users.len(), "chat simulation started");
    }

    /// Cancel every pending task and refuse further work. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let cancelled = self.tasks.cancel_all();
        self.handles = Handles::default();
        self.running = false;
        self.torn_down = true;
        info!(cancelled, messages = self.store.len(), "chat session torn down");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Run every task due at or before `now`. Returns how many ran.
    pub fn advance(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        while let Some(fired) = self.tasks.pop_due(now) {
            self.run(fired.task, fired.due);
            ran += 1;
        }
        ran
    }

    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.tasks.next_due()
    }

    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    fn run(&mut self, task: Task, at: Instant) {
        match task {
            Task::SpeedTransition => {
                let (mode, dwell) = self.speed.transition(&mut self.rng);
                debug!(?mode, dwell_secs = dwell.as_secs(), "chat speed changed");
                self.tasks.schedule_after(at, dwell, Task::SpeedTransition);
            }
            Task::EmissionTick => {
                let plan = self.rate.plan_tick(self.viewer_count, self.speed.current(), &mut self.rng);
                if let Some(milestone) = plan.milestone() {
                    debug!(milestone, viewers = self.viewer_count, "milestone celebration");
                }
                let hype = plan.count(EmitKind::Hype);
                if hype > 0 {
                    debug!(hype, "hype burst");
                }
                for emit in &plan.emits {
                    self.tasks.schedule_after(at, emit.offset, Task::Emit(emit.kind));
                }
                self.tasks.schedule_after(at, plan.next_delay, Task::EmissionTick);
            }
            Task::Emit(kind) => {
                let draft = match kind {
                    EmitKind::Regular => self.generator.regular(&self.users, self.viewer_count, &mut self.rng),
                    EmitKind::Hype => self.generator.hype(&self.users, &mut self.rng),
                    EmitKind::Milestone(m) => self.generator.milestone(&self.users, m, &mut self.rng),
                };
                if let Some(draft) = draft {
                    self.append(draft);
                }
            }
            Task::ScrollFlush => self.scroll.on_throttle_elapsed(at),
            Task::PredictionCountdown => self.countdown(at),
            Task::PollExpiry => {
                self.handles.poll_expiry = None;
                if let Some(poll_id) = self.poll.as_ref().map(Poll::id) {
                    self.close_poll(poll_id);
                }
            }
        }
    }

    // =========================================================================
    // EXTERNAL INPUTS
    // =========================================================================

    pub fn set_viewer_count(&mut self, viewers: u64) {
        self.viewer_count = viewers;
    }

    pub fn set_users(&mut self, users: Vec<ChatUser>) {
        self.users = users;
    }

    pub fn set_current_user(&mut self, user: Option<Uuid>) {
        self.current_user = user;
    }

    /// Message sink shared by real input and the simulation.
    ///
    /// Returns the new message id, or `None` for blank text, an unknown
    /// sender, or a torn-down session.
    pub fn send_message(&mut self, text: &str, sender_id: Uuid, options: SendOptions) -> Option<MessageId> {
        if self.torn_down {
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let Some(sender) = self.users.iter().find(|u| u.id == sender_id) else {
            debug!(%sender_id, "dropping message from unknown sender");
            return None;
        };
        let draft = MessageDraft::new(sender.id, sender.name.clone(), text, MessageKind::Chat).with_options(options);
        Some(self.append(draft))
    }

    /// Post a system line (overlay announcements and the like).
    pub fn announce(&mut self, text: &str) -> Option<MessageId> {
        if self.torn_down {
            return None;
        }
        Some(self.append(MessageDraft::new(Uuid::nil(), "system", text, MessageKind::System)))
    }

    fn append(&mut self, draft: MessageDraft) -> MessageId {
        let change = self.store.append(draft);
        if let Some(command) = self.scroll.on_content_changed() {
            self.events.push(EngineEvent::Scroll { command });
        }
        change.last_id
    }

    // =========================================================================
    // SCROLL
    // =========================================================================

    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) {
        if self.torn_down {
            return;
        }
        if let Some(flush_at) = self.scroll.on_scroll(metrics, now) {
            self.tasks.schedule_at(flush_at, Task::ScrollFlush);
        }
    }

    pub fn jump_to_latest(&mut self) {
        let command = self.scroll.jump_to_latest();
        self.events.push(EngineEvent::Scroll { command });
    }

    pub fn view_activated(&mut self) {
        let command = self.scroll.on_view_activated();
        self.events.push(EngineEvent::Scroll { command });
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        if let Some(command) = self.scroll.set_auto_scroll(enabled) {
            self.events.push(EngineEvent::Scroll { command });
        }
    }

    pub fn font_size_changed(&mut self) {
        if let Some(command) = self.scroll.on_font_size_changed() {
            self.events.push(EngineEvent::Scroll { command });
        }
    }

    pub fn set_append_behavior(&mut self, behavior: ScrollBehavior) {
        self.scroll.set_append_behavior(behavior);
    }

    // =========================================================================
    // POLL
    // =========================================================================

    /// Open a poll, replacing any current one. Returns its id.
    pub fn start_poll(&mut self, question: &str, options: &[String], now: Instant) -> Option<Uuid> {
        if self.torn_down || options.len() < 2 {
            return None;
        }
        if let Some(handle) = self.handles.poll_expiry.take() {
            self.tasks.cancel(handle);
        }
        let poll = Poll::new(question, options.iter().cloned(), now + self.config.poll_duration);
        let poll_id = poll.id();
        self.handles.poll_expiry = Some(self.tasks.schedule_at(poll.ends_at(), Task::PollExpiry));
        self.poll = Some(poll);
        info!(%poll_id, options = options.len(), "poll opened");
        self.announce(&format!("Poll started: {question}"));
        Some(poll_id)
    }

    pub fn vote_poll(&mut self, poll_id: Uuid, viewer: Uuid, option: OptionId) -> VoteOutcome {
        let Some(poll) = self.poll.as_mut().filter(|p| p.id() == poll_id) else {
            return VoteOutcome::NoSuchOverlay;
        };
        let outcome = poll.vote(viewer, option);
        if !outcome.is_accepted() {
            debug!(%poll_id, %viewer, ?outcome, "poll vote ignored");
        }
        outcome
    }

    /// Stop accepting votes. The expiry timer still completes the poll.
    pub fn lock_poll(&mut self, poll_id: Uuid) -> bool {
        let Some(poll) = self.poll.as_mut().filter(|p| p.id() == poll_id) else {
            return false;
        };
        if !poll.lock() {
            return false;
        }
        info!(%poll_id, "poll locked");
        self.events.push(EngineEvent::PollLocked { poll_id });
        true
    }

    /// Complete the poll now. Returns `false` if it was already completed.
    pub fn close_poll(&mut self, poll_id: Uuid) -> bool {
        let Some(poll) = self.poll.as_mut().filter(|p| p.id() == poll_id) else {
            return false;
        };
        if !poll.close() {
            return false;
        }
        let winner = poll.winner();
        if let Some(handle) = self.handles.poll_expiry.take() {
            self.tasks.cancel(handle);
        }
        info!(%poll_id, ?winner, "poll closed");
        self.events.push(EngineEvent::PollClosed { poll_id, winner });
        true
    }

    // =========================================================================
    // PREDICTION
    // =========================================================================

    /// Open a prediction owned by `owner`, replacing any current one.
    pub fn start_prediction(&mut self, question: &str, options: &[String], owner: Uuid, now: Instant) -> Option<Uuid> {
        if self.torn_down || options.len() < 2 {
            return None;
        }
        if let Some(handle) = self.handles.countdown.take() {
            self.tasks.cancel(handle);
        }
        let prediction = Prediction::new(question, options.iter().cloned(), owner, self.config.prediction_window);
        let prediction_id = prediction.id();
        self.prediction = Some(prediction);
        self.handles.countdown = Some(self.tasks.schedule_after(now, COUNTDOWN_STEP, Task::PredictionCountdown));
        info!(%prediction_id, %owner, window_secs = self.config.prediction_window.as_secs(), "prediction opened");
        self.announce(&format!("Prediction started: {question}"));
        Some(prediction_id)
    }

    pub fn predict(&mut self, prediction_id: Uuid, viewer: Uuid, option: OptionId, points: u64) -> VoteOutcome {
        let Some(prediction) = self.prediction.as_mut().filter(|p| p.id() == prediction_id) else {
            return VoteOutcome::NoSuchOverlay;
        };
        let outcome = prediction.vote(viewer, option, points);
        if !outcome.is_accepted() {
            debug!(%prediction_id, %viewer, ?outcome, "prediction vote ignored");
        }
        outcome
    }

    /// Owner closes betting before the countdown ends.
    pub fn lock_prediction(&mut self, prediction_id: Uuid, actor: Uuid) -> bool {
        let Some(prediction) = self.prediction.as_mut().filter(|p| p.id() == prediction_id) else {
            return false;
        };
        if actor != prediction.owner_id() || !prediction.lock() {
            return false;
        }
        if let Some(handle) = self.handles.countdown.take() {
            self.tasks.cancel(handle);
        }
        info!(%prediction_id, "prediction locked early");
        self.events.push(EngineEvent::PredictionLocked { prediction_id });
        true
    }

    pub fn resolve_prediction(&mut self, prediction_id: Uuid, actor: Uuid, winner: OptionId) -> ResolveOutcome {
        let Some(prediction) = self.prediction.as_mut().filter(|p| p.id() == prediction_id) else {
            return ResolveOutcome::NoSuchPrediction;
        };
        let outcome = prediction.resolve(actor, winner);
        match &outcome {
            ResolveOutcome::Resolved { winner, payouts } => {
                info!(%prediction_id, winner, winners = payouts.len(), "prediction resolved");
                self.events.push(EngineEvent::PredictionResolved { prediction_id, winner: *winner });
                self.events.extend(
                    payouts
                        .iter()
                        .map(|payout| EngineEvent::PointsAwarded { prediction_id, payout: *payout }),
                );
            }
            other => debug!(%prediction_id, %actor, ?other, "prediction resolve rejected"),
        }
        outcome
    }

    fn countdown(&mut self, at: Instant) {
        self.handles.countdown = None;
        let Some(prediction) = self.prediction.as_mut() else {
            return;
        };
        let prediction_id = prediction.id();
        if prediction.tick() {
            info!(%prediction_id, "prediction locked");
            self.events.push(EngineEvent::PredictionLocked { prediction_id });
        } else if prediction.seconds_remaining() > 0 {
            self.handles.countdown = Some(self.tasks.schedule_after(at, COUNTDOWN_STEP, Task::PredictionCountdown));
        }
    }

    // =========================================================================
    // OUTPUTS
    // =========================================================================

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn messages(&self) -> &MessageStore {
        &self.store
    }

    #[must_use]
    pub fn speed(&self) -> SpeedMode {
        self.speed.current()
    }

    #[must_use]
    pub fn scroll_state(&self) -> ScrollState {
        self.scroll.state()
    }

    #[must_use]
    pub fn viewer_count(&self) -> u64 {
        self.viewer_count
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Uuid> {
        self.current_user
    }

    #[must_use]
    pub fn poll(&self) -> Option<&Poll> {
        self.poll.as_ref()
    }

    #[must_use]
    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    #[must_use]
    pub fn snapshot(&self, now: Instant) -> ChatSnapshot {
        ChatSnapshot {
            messages: self.store.to_vec(),
            scroll: self.scroll.state(),
            speed: self.speed.current(),
            viewer_count: self.viewer_count,
            poll: self.poll.as_ref().map(|p| p.snapshot(now, self.current_user)),
            prediction: self.prediction.as_ref().map(|p| p.snapshot(self.current_user)),
        }
    }
}

impl Drop for ChatEngine {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
