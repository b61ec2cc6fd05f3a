use super::*;

fn poll_with(options: &[&str]) -> (Poll, Instant) {
    let now = Instant::now();
    (Poll::new("Best snack?", options.iter().copied(), now + Duration::from_secs(60)), now)
}

// =============================================================================
// Voting
// =============================================================================

#[test]
fn one_vote_per_viewer() {
    let (mut poll, _) = poll_with(&["chips", "fruit"]);
    let viewer = Uuid::new_v4();
    assert_eq!(poll.vote(viewer, 0), VoteOutcome::Accepted);
    assert_eq!(poll.vote(viewer, 1), VoteOutcome::AlreadyVoted);
    assert_eq!(poll.total_votes(), 1);
    assert!(poll.has_voted(viewer));
}

#[test]
fn unknown_option_is_ignored() {
    let (mut poll, _) = poll_with(&["chips", "fruit"]);
    let viewer = Uuid::new_v4();
    assert_eq!(poll.vote(viewer, 9), VoteOutcome::UnknownOption);
    assert!(!poll.has_voted(viewer));
    assert_eq!(poll.total_votes(), 0);
}

#[test]
fn votes_freeze_once_not_open() {
    let (mut poll, _) = poll_with(&["chips", "fruit"]);
    poll.vote(Uuid::new_v4(), 0);
    assert!(poll.lock());
    assert_eq!(poll.vote(Uuid::new_v4(), 1), VoteOutcome::NotOpen);
    assert!(poll.close());
    assert_eq!(poll.vote(Uuid::new_v4(), 1), VoteOutcome::NotOpen);
    assert_eq!(poll.options()[1].votes, 0);
}

// =============================================================================
// Percentages
// =============================================================================

#[test]
fn no_votes_means_zero_percent_everywhere() {
    let (poll, now) = poll_with(&["a", "b", "c"]);
    let snap = poll.snapshot(now, None);
    assert_eq!(snap.total_votes, 0);
    assert!(snap.options.iter().all(|o| o.percentage.abs() < f64::EPSILON));
}

#[test]
fn five_and_five_is_fifty_fifty() {
    let (mut poll, now) = poll_with(&["a", "b"]);
    for i in 0..10 {
        poll.vote(Uuid::new_v4(), i % 2);
    }
    let snap = poll.snapshot(now, None);
    assert!((snap.options[0].percentage - 50.0).abs() < f64::EPSILON);
    assert!((snap.options[1].percentage - 50.0).abs() < f64::EPSILON);
}

#[test]
fn snapshot_reports_my_vote_and_time_left() {
    let (mut poll, now) = poll_with(&["a", "b"]);
    let me = Uuid::new_v4();
    poll.vote(me, 1);
    let snap = poll.snapshot(now + Duration::from_millis(59_200), Some(me));
    assert_eq!(snap.my_vote, Some(1));
    assert_eq!(snap.seconds_remaining, 1);
    assert_eq!(poll.snapshot(now, Some(Uuid::new_v4())).my_vote, None);
}

// =============================================================================
// Closing
// =============================================================================

#[test]
fn close_picks_most_voted_option() {
    let (mut poll, _) = poll_with(&["a", "b", "c"]);
    poll.vote(Uuid::new_v4(), 2);
    poll.vote(Uuid::new_v4(), 2);
    poll.vote(Uuid::new_v4(), 0);
    assert!(poll.close());
    assert_eq!(poll.winner(), Some(2));
    assert_eq!(poll.status(), OverlayStatus::Completed);
}

#[test]
fn close_breaks_ties_by_earliest_option() {
    let (mut poll, _) = poll_with(&["a", "b"]);
    poll.vote(Uuid::new_v4(), 1);
    poll.vote(Uuid::new_v4(), 0);
    poll.close();
    assert_eq!(poll.winner(), Some(0));
}

#[test]
fn close_without_votes_has_no_winner() {
    let (mut poll, _) = poll_with(&["a", "b"]);
    poll.close();
    assert_eq!(poll.winner(), None);
}

#[test]
fn completed_poll_is_immutable() {
    let (mut poll, _) = poll_with(&["a", "b"]);
    poll.vote(Uuid::new_v4(), 1);
    poll.close();
    assert!(!poll.close());
    assert!(!poll.lock());
    assert_eq!(poll.status(), OverlayStatus::Completed);
    assert_eq!(poll.winner(), Some(1));
}

#[test]
fn expiry_is_reported_at_end_time() {
    let (poll, now) = poll_with(&["a"]);
    assert!(!poll.is_expired(now));
    assert!(poll.is_expired(poll.ends_at()));
}
