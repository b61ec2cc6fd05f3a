//! Message content and attribute selection.
//!
//! DESIGN
//! ======
//! Two content pools: a general pool of full sentences and a high-traffic
//! pool of short reactions. The high-traffic share grows with viewer count,
//! as do donation and gift odds. Generation is pure given the rng, the
//! roster and the viewer count; ids are assigned later by the store.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::random::{chance, weighted_choice};
use crate::roster::ChatUser;
use crate::store::{MessageDraft, MessageKind, SendOptions};

const GENERAL_POOL: &[&str] = &[
    "this stream is so chill tonight",
    "how long have you been working on this?",
    "first time catching you live, love the vibe",
    "what settings are you running?",
    "the audio sounds way better today",
    "can you explain that last part again?",
    "just got off work, what did I miss",
    "that was actually so clean",
    "chat is moving fast today",
    "greetings from Lisbon!",
    "do you have a schedule posted anywhere?",
    "I tried this yesterday and it worked",
    "the overlay looks great btw",
    "is this the same build as last week?",
    "ngl I did not expect that",
    "we need a highlight clip of that",
    "back from lunch, still going strong",
    "anyone else watching from mobile?",
    "how many hours are we going today?",
    "this is my favorite part of the week",
    "the lighting setup is really nice",
    "hi chat, hi streamer",
];

const HIGH_TRAFFIC_POOL: &[&str] = &[
    "LUL", "W", "POG", "KEKW", "GG", "lets gooo", "PogChamp", "no way", "HYPE", "OMEGALUL", "clip it",
    "L", "monkaS", "5Head", "EZ", "Kreygasm", "sheesh", "+1", "based", "o7",
];

const HYPE_POOL: &[&str] = &[
    "HYPE HYPE HYPE", "LETS GOOOO", "POGGERS", "W STREAM", "CLIP THAT", "NO SHOT", "INSANE", "GOATED",
    "W W W W", "ABSOLUTE CINEMA",
];

const MILESTONE_TEMPLATES: &[&str] = &[
    "{count} viewers!! LETS GO",
    "we hit {count}! W chat",
    "{count} strong, hype!",
    "GG we made it to {count} viewers",
];

const SUBSCRIBER_TEMPLATES: &[&str] = &[
    "thanks for the sub hype, {months} months and counting!",
    "happy to support, {months} months subscribed",
    "{months} month sub streak, love this channel",
];

const DONATION_AMOUNTS: [u32; 7] = [1, 2, 5, 10, 20, 50, 100];
const DONATION_WEIGHTS: [u32; 7] = [30, 25, 20, 12, 7, 4, 2];

const GIFT_COUNTS: [u32; 4] = [1, 5, 10, 20];
const GIFT_WEIGHTS: [u32; 4] = [50, 30, 15, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pool {
    General,
    HighTraffic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageGenerator {
    pub highlight_probability: f64,
    pub subscriber_thanks_probability: f64,
}

impl Default for MessageGenerator {
    fn default() -> Self {
        Self { highlight_probability: 0.02, subscriber_thanks_probability: 0.05 }
    }
}

impl MessageGenerator {
    /// Regular chat line from a random roster member. `None` for an empty roster.
    pub fn regular<R: Rng + ?Sized>(&self, users: &[ChatUser], viewers: u64, rng: &mut R) -> Option<MessageDraft> {
        let sender = users.choose(rng)?;

        let thanks = sender
            .subscriber_months()
            .filter(|_| chance(self.subscriber_thanks_probability, rng))
            .and_then(|months| fill(SUBSCRIBER_TEMPLATES, "{months}", months, rng));
        let (text, kind) = match thanks {
            Some(text) => (text, MessageKind::SubscriberThanks),
            None => (pick_content(viewers, rng).to_string(), MessageKind::Chat),
        };

        let options = SendOptions {
            donation: chance(donation_probability(viewers), rng)
                .then(|| weighted_choice(&DONATION_AMOUNTS, &DONATION_WEIGHTS, rng).copied())
                .flatten(),
            gift: chance(gift_probability(viewers), rng)
                .then(|| weighted_choice(&GIFT_COUNTS, &GIFT_WEIGHTS, rng).copied())
                .flatten(),
            highlighted: chance(self.highlight_probability, rng),
        };

        Some(MessageDraft::new(sender.id, sender.name.clone(), text, kind).with_options(options))
    }

    /// Short reaction for a hype burst.
    pub fn hype<R: Rng + ?Sized>(&self, users: &[ChatUser], rng: &mut R) -> Option<MessageDraft> {
        let sender = users.choose(rng)?;
        let text = HYPE_POOL.choose(rng)?;
        Some(MessageDraft::new(sender.id, sender.name.clone(), *text, MessageKind::Hype))
    }

    /// Celebration line referencing `milestone`.
    pub fn milestone<R: Rng + ?Sized>(&self, users: &[ChatUser], milestone: u64, rng: &mut R) -> Option<MessageDraft> {
        let sender = users.choose(rng)?;
        let text = fill(MILESTONE_TEMPLATES, "{count}", milestone, rng)?;
        Some(MessageDraft::new(sender.id, sender.name.clone(), text, MessageKind::Milestone))
    }
}

/// Share of messages drawn from the short-reaction pool.
#[must_use]
pub fn high_traffic_share(viewers: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let share = viewers as f64 / 2_000.0;
    share.clamp(0.1, 0.75)
}

#[must_use]
pub fn donation_probability(viewers: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let scaled = 0.005 + viewers as f64 / 100_000.0;
    scaled.min(0.05)
}

#[must_use]
pub fn gift_probability(viewers: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let scaled = 0.002 + viewers as f64 / 200_000.0;
    scaled.min(0.02)
}

fn pick_content<R: Rng + ?Sized>(viewers: u64, rng: &mut R) -> &'static str {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let high = (high_traffic_share(viewers) * 100.0).round() as u32;
    let pool = weighted_choice(&[Pool::General, Pool::HighTraffic], &[100 - high, high], rng)
        .copied()
        .unwrap_or(Pool::General);
    let lines = match pool {
        Pool::General => GENERAL_POOL,
        Pool::HighTraffic => HIGH_TRAFFIC_POOL,
    };
    lines.choose(rng).copied().unwrap_or("hi")
}

fn fill<R: Rng + ?Sized>(templates: &[&str], placeholder: &str, value: impl ToString, rng: &mut R) -> Option<String> {
    templates
        .choose(rng)
        .map(|template| template.replace(placeholder, &value.to_string()))
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
