//! Bounded, append-only message log.
//!
//! DESIGN
//! ======
//! Ids are assigned at append time from a session-local counter, so they
//! increase strictly in append order no matter which timer produced the
//! draft. Only the newest `cap` messages are retained; evicted messages are
//! gone for good and are only reported as a count in `ContentChanged`.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Chat,
    Hype,
    Milestone,
    SubscriberThanks,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Donation {
    pub amount: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gift {
    pub count: u32,
}

/// A stored chat line. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch at append time.
    pub ts: i64,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation: Option<Donation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<Gift>,
    pub highlighted: bool,
}

/// Optional attributes for an outgoing message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub donation: Option<u32>,
    pub gift: Option<u32>,
    pub highlighted: bool,
}

/// A message that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub kind: MessageKind,
    pub options: SendOptions,
}

impl MessageDraft {
    #[must_use]
    pub fn new(sender_id: Uuid, sender_name: impl Into<String>, text: impl Into<String>, kind: MessageKind) -> Self {
        Self { sender_id, sender_name: sender_name.into(), text: text.into(), kind, options: SendOptions::default() }
    }

    #[must_use]
    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }
}

/// Notification raised by every append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChanged {
    pub first_id: MessageId,
    pub last_id: MessageId,
    pub appended: usize,
    /// Oldest messages dropped to stay within the cap.
    pub evicted: usize,
}

#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: VecDeque<Message>,
    cap: usize,
    next_id: MessageId,
}

impl MessageStore {
    /// Create a store retaining at most `cap` messages (`cap >= 1`).
    #[must_use]
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { messages: VecDeque::with_capacity(cap), cap, next_id: 1 }
    }

    /// Append one draft.
    pub fn append(&mut self, draft: MessageDraft) -> ContentChanged {
        self.append_all(std::iter::once(draft)).unwrap_or(ContentChanged {
            first_id: self.next_id,
            last_id: self.next_id,
            appended: 0,
            evicted: 0,
        })
    }

    /// Append drafts in order as one change. `None` if `drafts` was empty.
    pub fn append_all(&mut self, drafts: impl IntoIterator<Item = MessageDraft>) -> Option<ContentChanged> {
        let first_id = self.next_id;
        let ts = now_ms();
        let mut appended = 0;
        for draft in drafts {
            let id = self.next_id;
            self.next_id += 1;
            self.messages.push_back(Message {
                id,
                sender_id: draft.sender_id,
                sender_name: draft.sender_name,
                text: draft.text,
                ts,
                kind: draft.kind,
                donation: draft.options.donation.map(|amount| Donation { amount }),
                gift: draft.options.gift.map(|count| Gift { count }),
                highlighted: draft.options.highlighted,
            });
            appended += 1;
        }
        if appended == 0 {
            return None;
        }

        let evicted = self.messages.len().saturating_sub(self.cap);
        self.messages.drain(..evicted);

        Some(ContentChanged { first_id, last_id: self.next_id - 1, appended, evicted })
    }

    /// Retained messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Message> {
        self.messages.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
