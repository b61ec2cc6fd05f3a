//! Chat participants as supplied by the host application.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Role {
    Streamer,
    Moderator,
    Vip,
    Subscriber { months: u32 },
}

/// A chat participant. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: Uuid,
    pub name: String,
    pub roles: HashSet<Role>,
}

impl ChatUser {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), name: name.into(), roles: HashSet::new() }
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    /// Subscription length, if the user is a subscriber.
    #[must_use]
    pub fn subscriber_months(&self) -> Option<u32> {
        self.roles.iter().find_map(|role| match role {
            Role::Subscriber { months } => Some(*months),
            _ => None,
        })
    }

    #[must_use]
    pub fn is_streamer(&self) -> bool {
        self.roles.contains(&Role::Streamer)
    }
}

/// A small mock audience for demos and tests.
#[must_use]
pub fn sample_roster() -> Vec<ChatUser> {
    vec![
        ChatUser::new("NightOwlNova").with_role(Role::Streamer),
        ChatUser::new("modsquad_ray").with_role(Role::Moderator).with_role(Role::Subscriber { months: 26 }),
        ChatUser::new("PixelPilot").with_role(Role::Vip),
        ChatUser::new("lurker_lou").with_role(Role::Subscriber { months: 3 }),
        ChatUser::new("greenscreen_gwen").with_role(Role::Subscriber { months: 14 }),
        ChatUser::new("turbo_taco"),
        ChatUser::new("quietstorm"),
        ChatUser::new("bytebandit"),
        ChatUser::new("hype_harbor").with_role(Role::Subscriber { months: 1 }),
        ChatUser::new("first_time_fern"),
    ]
}

#[cfg(test)]
#[path = "roster_test.rs"]
mod tests;
