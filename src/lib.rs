//! Simulated live-stream chat engine.
//!
//! DESIGN
//! ======
//! One `ChatEngine` per chat session. Every timer the simulation needs
//! (speed transitions, emission ticks, staggered batch members, scroll
//! throttling, overlay countdowns) is a task in a single cancellable
//! `TaskQueue`, so tearing a session down is one `cancel_all`.
//!
//! The engine itself is synchronous and takes explicit `Instant`s. The
//! `session` module drives it on a tokio task for real-time use.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod overlay;
pub mod random;
pub mod rate;
pub mod roster;
pub mod scheduler;
pub mod scroll;
pub mod session;
pub mod speed;
pub mod store;

pub use config::ChatConfig;
pub use engine::{ChatEngine, ChatSnapshot, EngineEvent};
pub use error::{ConfigError, SessionError};
pub use roster::{ChatUser, Role};
pub use session::{SessionCommand, SessionEvent, SessionHandle, spawn_session};
pub use speed::SpeedMode;
pub use store::{Message, MessageKind};
