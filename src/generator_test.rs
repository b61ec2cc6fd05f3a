use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::roster::{Role, sample_roster};

// =============================================================================
// Sender selection
// =============================================================================

#[test]
fn empty_roster_generates_nothing() {
    let generator = MessageGenerator::default();
    let mut rng = StdRng::seed_from_u64(1);
    assert!(generator.regular(&[], 100, &mut rng).is_none());
    assert!(generator.hype(&[], &mut rng).is_none());
    assert!(generator.milestone(&[], 1_000, &mut rng).is_none());
}

#[test]
fn sender_comes_from_roster() {
    let generator = MessageGenerator::default();
    let users = sample_roster();
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..200 {
        let draft = generator.regular(&users, 100, &mut rng).unwrap();
        let sender = users.iter().find(|u| u.id == draft.sender_id).unwrap();
        assert_eq!(sender.name, draft.sender_name);
    }
}

// =============================================================================
// Content pools
// =============================================================================

#[test]
fn busy_rooms_lean_on_short_reactions() {
    let generator = MessageGenerator { subscriber_thanks_probability: 0.0, ..MessageGenerator::default() };
    let users = vec![ChatUser::new("solo")];
    let count_reactions = |viewers| {
        let mut rng = StdRng::seed_from_u64(3);
        (0..2_000)
            .filter(|_| {
                let draft = generator.regular(&users, viewers, &mut rng).unwrap();
                HIGH_TRAFFIC_POOL.contains(&draft.text.as_str())
            })
            .count()
    };
    assert!(count_reactions(50_000) > count_reactions(5) * 3);
}

#[test]
fn share_and_odds_grow_with_viewers() {
    assert!(high_traffic_share(10) < high_traffic_share(1_000));
    assert!(donation_probability(10) < donation_probability(1_000));
    assert!(gift_probability(10) < gift_probability(1_000));
    assert!(donation_probability(u64::MAX) <= 0.05);
}

// =============================================================================
// Attributes
// =============================================================================

#[test]
fn donations_come_from_the_amount_table() {
    let generator = MessageGenerator::default();
    let users = sample_roster();
    let mut rng = StdRng::seed_from_u64(4);
    let amounts: Vec<u32> = (0..5_000)
        .filter_map(|_| generator.regular(&users, 10_000, &mut rng).unwrap().options.donation)
        .collect();
    assert!(!amounts.is_empty());
    assert!(amounts.iter().all(|a| DONATION_AMOUNTS.contains(a)));
    let small = amounts.iter().filter(|a| **a <= 5).count();
    assert!(small * 2 > amounts.len(), "amounts should skew small");
}

#[test]
fn highlight_can_be_disabled() {
    let generator = MessageGenerator { highlight_probability: 0.0, ..MessageGenerator::default() };
    let users = sample_roster();
    let mut rng = StdRng::seed_from_u64(5);
    assert!((0..500).all(|_| !generator.regular(&users, 100, &mut rng).unwrap().options.highlighted));
}

#[test]
fn subscribers_can_send_thanks() {
    let generator = MessageGenerator { subscriber_thanks_probability: 1.0, ..MessageGenerator::default() };
    let users = vec![ChatUser::new("loyal").with_role(Role::Subscriber { months: 7 })];
    let mut rng = StdRng::seed_from_u64(6);
    let draft = generator.regular(&users, 100, &mut rng).unwrap();
    assert_eq!(draft.kind, MessageKind::SubscriberThanks);
    assert!(draft.text.contains('7'));
}

#[test]
fn non_subscribers_never_send_thanks() {
    let generator = MessageGenerator { subscriber_thanks_probability: 1.0, ..MessageGenerator::default() };
    let users = vec![ChatUser::new("drive_by")];
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        assert_eq!(generator.regular(&users, 100, &mut rng).unwrap().kind, MessageKind::Chat);
    }
}

#[test]
fn milestone_text_mentions_the_count() {
    let generator = MessageGenerator::default();
    let users = sample_roster();
    let mut rng = StdRng::seed_from_u64(8);
    let draft = generator.milestone(&users, 2_500, &mut rng).unwrap();
    assert_eq!(draft.kind, MessageKind::Milestone);
    assert!(draft.text.contains("2500"));
}
