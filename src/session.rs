//! Real-time session driver.
//!
//! DESIGN
//! ======
//! `spawn_session` moves a `ChatEngine` onto a tokio task. The task sleeps
//! until the engine's next due instant or the next command, whichever comes
//! first, then publishes:
//!
//! - the latest `ChatSnapshot` on a `watch` channel (render surfaces only
//!   ever need the newest frame)
//! - each `EngineEvent` on a bounded mpsc queue, enqueued with `try_send`
//!
//! The loop ends on `SessionCommand::Shutdown` or when every command sender
//! is dropped. Either way the engine is torn down before the task exits.

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::engine::{ChatEngine, ChatSnapshot, EngineEvent};
use crate::error::SessionError;
use crate::overlay::{OptionId, ResolveOutcome, VoteOutcome};
use crate::roster::ChatUser;
use crate::scroll::{ScrollBehavior, ScrollMetrics};
use crate::store::{MessageId, SendOptions};

const COMMAND_QUEUE_CAPACITY: usize = 64;
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Input to a running session. Variants carrying a `reply` answer on it.
#[derive(Debug)]
pub enum SessionCommand {
    SetViewerCount(u64),
    SetUsers(Vec<ChatUser>),
    SetCurrentUser(Option<Uuid>),
    SendMessage { text: String, sender_id: Uuid, options: SendOptions, reply: oneshot::Sender<Option<MessageId>> },
    Announce(String),
    Scroll(ScrollMetrics),
    JumpToLatest,
    ViewActivated,
    SetAutoScroll(bool),
    FontSizeChanged,
    SetAppendBehavior(ScrollBehavior),
    StartPoll { question: String, options: Vec<String>, reply: oneshot::Sender<Option<Uuid>> },
    VotePoll { poll_id: Uuid, viewer: Uuid, option: OptionId, reply: oneshot::Sender<VoteOutcome> },
    LockPoll { poll_id: Uuid, reply: oneshot::Sender<bool> },
    ClosePoll { poll_id: Uuid, reply: oneshot::Sender<bool> },
    StartPrediction { question: String, options: Vec<String>, owner: Uuid, reply: oneshot::Sender<Option<Uuid>> },
    Predict { prediction_id: Uuid, viewer: Uuid, option: OptionId, points: u64, reply: oneshot::Sender<VoteOutcome> },
    LockPrediction { prediction_id: Uuid, actor: Uuid, reply: oneshot::Sender<bool> },
    ResolvePrediction { prediction_id: Uuid, actor: Uuid, winner: OptionId, reply: oneshot::Sender<ResolveOutcome> },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionEvent {
    Engine(EngineEvent),
    /// Last event before the task exits.
    Stopped { messages: usize },
}

/// Owner's side of a spawned session.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<ChatSnapshot>,
    events: mpsc::Receiver<SessionEvent>,
    task: JoinHandle<()>,
}

/// Start a session on the current tokio runtime.
///
/// `seed` makes the simulation reproducible; `None` seeds from the OS.
#[must_use]
pub fn spawn_session(
    config: ChatConfig,
    users: Vec<ChatUser>,
    current_user: Option<Uuid>,
    viewers: u64,
    seed: Option<u64>,
) -> SessionHandle {
    let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let mut engine = ChatEngine::new(config, rng);
    engine.set_users(users);
    engine.set_current_user(current_user);
    engine.set_viewer_count(viewers);

    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot(Instant::now()));

    info!(viewers, seeded = seed.is_some(), "spawning chat session");
    let task = tokio::spawn(run(engine, command_rx, snapshot_tx, event_tx));

    SessionHandle { commands: command_tx, snapshots: snapshot_rx, events: event_rx, task }
}

// =============================================================================
// DRIVER
// =============================================================================

async fn run(
    mut engine: ChatEngine,
    mut commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<ChatSnapshot>,
    events: mpsc::Sender<SessionEvent>,
) {
    engine.start(Instant::now());
    publish(&mut engine, &snapshots, &events);

    loop {
        let deadline = engine.next_due();
        tokio::select! {
            maybe_command = commands.recv() => {
                match maybe_command {
                    Some(SessionCommand::Shutdown) => {
                        debug!("chat session shutdown requested");
                        break;
                    }
                    Some(command) => apply(&mut engine, command, Instant::now()),
                    None => {
                        debug!("all session handles dropped");
                        break;
                    }
                }
            }
            () = sleep_until(deadline) => {
                engine.advance(Instant::now());
            }
        }
        publish(&mut engine, &snapshots, &events);
    }

    engine.teardown();
    snapshots.send_replace(engine.snapshot(Instant::now()));
    emit(&events, SessionEvent::Stopped { messages: engine.messages().len() });
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

fn apply(engine: &mut ChatEngine, command: SessionCommand, now: Instant) {
    // Reply send errors mean the caller stopped waiting; nothing to do.
    match command {
        SessionCommand::SetViewerCount(viewers) => engine.set_viewer_count(viewers),
        SessionCommand::SetUsers(users) => engine.set_users(users),
        SessionCommand::SetCurrentUser(user) => engine.set_current_user(user),
        SessionCommand::SendMessage { text, sender_id, options, reply } => {
            let _ = reply.send(engine.send_message(&text, sender_id, options));
        }
        SessionCommand::Announce(text) => {
            engine.announce(&text);
        }
        SessionCommand::Scroll(metrics) => engine.on_scroll(metrics, now),
        SessionCommand::JumpToLatest => engine.jump_to_latest(),
        SessionCommand::ViewActivated => engine.view_activated(),
        SessionCommand::SetAutoScroll(enabled) => engine.set_auto_scroll(enabled),
        SessionCommand::FontSizeChanged => engine.font_size_changed(),
        SessionCommand::SetAppendBehavior(behavior) => engine.set_append_behavior(behavior),
        SessionCommand::StartPoll { question, options, reply } => {
            let _ = reply.send(engine.start_poll(&question, &options, now));
        }
        SessionCommand::VotePoll { poll_id, viewer, option, reply } => {
            let _ = reply.send(engine.vote_poll(poll_id, viewer, option));
        }
        SessionCommand::LockPoll { poll_id, reply } => {
            let _ = reply.send(engine.lock_poll(poll_id));
        }
        SessionCommand::ClosePoll { poll_id, reply } => {
            let _ = reply.send(engine.close_poll(poll_id));
        }
        SessionCommand::StartPrediction { question, options, owner, reply } => {
            let _ = reply.send(engine.start_prediction(&question, &options, owner, now));
        }
        SessionCommand::Predict { prediction_id, viewer, option, points, reply } => {
            let _ = reply.send(engine.predict(prediction_id, viewer, option, points));
        }
        SessionCommand::LockPrediction { prediction_id, actor, reply } => {
            let _ = reply.send(engine.lock_prediction(prediction_id, actor));
        }
        SessionCommand::ResolvePrediction { prediction_id, actor, winner, reply } => {
            let _ = reply.send(engine.resolve_prediction(prediction_id, actor, winner));
        }
        SessionCommand::Shutdown => {}
    }
}

fn publish(engine: &mut ChatEngine, snapshots: &watch::Sender<ChatSnapshot>, events: &mpsc::Sender<SessionEvent>) {
    for event in engine.drain_events() {
        emit(events, SessionEvent::Engine(event));
    }
    snapshots.send_replace(engine.snapshot(Instant::now()));
}

/// Best-effort enqueue; a slow consumer loses events, never stalls the engine.
fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!(?event, "session event queue full; dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

// =============================================================================
// HANDLE
// =============================================================================

impl SessionHandle {
    /// Latest published frame.
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Independent receiver for render loops.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshots.clone()
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Wait up to `limit` for the next event.
    pub async fn next_event_within(&mut self, limit: Duration) -> Option<SessionEvent> {
        tokio::time::timeout(limit, self.events.recv()).await.ok().flatten()
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<T, F>(&self, build: F) -> Result<T, SessionError>
    where
        F: FnOnce(oneshot::Sender<T>) -> SessionCommand,
    {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| SessionError::Closed)
    }

    pub async fn set_viewer_count(&self, viewers: u64) -> Result<(), SessionError> {
        self.send(SessionCommand::SetViewerCount(viewers)).await
    }

    pub async fn set_users(&self, users: Vec<ChatUser>) -> Result<(), SessionError> {
        self.send(SessionCommand::SetUsers(users)).await
    }

    pub async fn set_current_user(&self, user: Option<Uuid>) -> Result<(), SessionError> {
        self.send(SessionCommand::SetCurrentUser(user)).await
    }

    pub async fn send_message(
        &self,
        text: impl Into<String>,
        sender_id: Uuid,
        options: SendOptions,
    ) -> Result<Option<MessageId>, SessionError> {
        let text = text.into();
        self.request(|reply| SessionCommand::SendMessage { text, sender_id, options, reply }).await
    }

    pub async fn announce(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(SessionCommand::Announce(text.into())).await
    }

    pub async fn scroll(&self, metrics: ScrollMetrics) -> Result<(), SessionError> {
        self.send(SessionCommand::Scroll(metrics)).await
    }

    pub async fn jump_to_latest(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::JumpToLatest).await
    }

    pub async fn view_activated(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::ViewActivated).await
    }

    pub async fn set_auto_scroll(&self, enabled: bool) -> Result<(), SessionError> {
        self.send(SessionCommand::SetAutoScroll(enabled)).await
    }

    pub async fn font_size_changed(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::FontSizeChanged).await
    }

    pub async fn set_append_behavior(&self, behavior: ScrollBehavior) -> Result<(), SessionError> {
        self.send(SessionCommand::SetAppendBehavior(behavior)).await
    }

    pub async fn start_poll(&self, question: impl Into<String>, options: Vec<String>) -> Result<Option<Uuid>, SessionError> {
        let question = question.into();
        self.request(|reply| SessionCommand::StartPoll { question, options, reply }).await
    }

    pub async fn vote_poll(&self, poll_id: Uuid, viewer: Uuid, option: OptionId) -> Result<VoteOutcome, SessionError> {
        self.request(|reply| SessionCommand::VotePoll { poll_id, viewer, option, reply }).await
    }

    pub async fn lock_poll(&self, poll_id: Uuid) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::LockPoll { poll_id, reply }).await
    }

    pub async fn close_poll(&self, poll_id: Uuid) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::ClosePoll { poll_id, reply }).await
    }

    pub async fn start_prediction(
        &self,
        question: impl Into<String>,
        options: Vec<String>,
        owner: Uuid,
    ) -> Result<Option<Uuid>, SessionError> {
        let question = question.into();
        self.request(|reply| SessionCommand::StartPrediction { question, options, owner, reply }).await
    }

    pub async fn predict(
        &self,
        prediction_id: Uuid,
        viewer: Uuid,
        option: OptionId,
        points: u64,
    ) -> Result<VoteOutcome, SessionError> {
        self.request(|reply| SessionCommand::Predict { prediction_id, viewer, option, points, reply }).await
    }

    pub async fn lock_prediction(&self, prediction_id: Uuid, actor: Uuid) -> Result<bool, SessionError> {
        self.request(|reply| SessionCommand::LockPrediction { prediction_id, actor, reply }).await
    }

    pub async fn resolve_prediction(
        &self,
        prediction_id: Uuid,
        actor: Uuid,
        winner: OptionId,
    ) -> Result<ResolveOutcome, SessionError> {
        self.request(|reply| SessionCommand::ResolvePrediction { prediction_id, actor, winner, reply }).await
    }

    /// Stop the session and wait for its task to finish teardown.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Join`] if the session task panicked.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        // Already-stopped sessions just get joined.
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("finished", &self.task.is_finished()).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
