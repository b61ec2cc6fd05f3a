use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

fn scheduler() -> RateScheduler {
    RateScheduler::new(&ChatConfig::default())
}

// =============================================================================
// Base interval
// =============================================================================

#[test]
fn base_interval_is_floor_at_and_above_top_breakpoint() {
    let rs = scheduler();
    let floor = ChatConfig::default().min_interval;
    for viewers in [FLOOR_VIEWERS, FLOOR_VIEWERS + 1, 20_000, 1_000_000, u64::MAX] {
        assert_eq!(rs.base_interval(viewers), floor, "viewers={viewers}");
    }
}

#[test]
fn base_interval_is_non_increasing() {
    let rs = scheduler();
    let mut previous = rs.base_interval(0);
    for viewers in 1..=(FLOOR_VIEWERS + 100) {
        let current = rs.base_interval(viewers);
        assert!(current <= previous, "interval rose at {viewers}");
        previous = current;
    }
}

#[test]
fn base_interval_follows_tiers() {
    let rs = scheduler();
    assert_eq!(rs.base_interval(5), Duration::from_millis(4000));
    assert_eq!(rs.base_interval(50), Duration::from_millis(2000));
    assert_eq!(rs.base_interval(51), Duration::from_millis(1000));
    assert_eq!(rs.base_interval(1_000), Duration::from_millis(500));
    assert_eq!(rs.base_interval(4_999), Duration::from_millis(250));
}

#[test]
fn base_interval_never_drops_below_floor() {
    let config = ChatConfig {
        base_interval: Duration::from_millis(400),
        min_interval: Duration::from_millis(300),
        ..ChatConfig::default()
    };
    let rs = RateScheduler::new(&config);
    assert_eq!(rs.base_interval(3_000), Duration::from_millis(300));
}

// =============================================================================
// Jitter + speed
// =============================================================================

#[test]
fn next_delay_is_jittered_within_bounds() {
    let rs = scheduler();
    let mut rng = StdRng::seed_from_u64(10);
    let mut distinct = std::collections::HashSet::new();
    for _ in 0..200 {
        let d = rs.next_delay(5, SpeedMode::Normal, &mut rng);
        assert!(d >= Duration::from_millis(2799) && d <= Duration::from_millis(5201), "{d:?}");
        distinct.insert(d);
    }
    assert!(distinct.len() > 1, "delay should not be periodic");
}

#[test]
fn next_delay_respects_floor_in_burst_mode() {
    let rs = scheduler();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        assert!(rs.next_delay(50_000, SpeedMode::Burst, &mut rng) >= ChatConfig::default().min_interval);
    }
}

// =============================================================================
// Batch size
// =============================================================================

#[test]
fn fifty_viewers_batch_is_one_or_two() {
    let rs = scheduler();
    let mut rng = StdRng::seed_from_u64(12);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..500 {
        let size = rs.batch_size(50, &mut rng);
        assert!(size == 1 || size == 2, "size={size}");
        seen.insert(size);
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn tiny_rooms_emit_single_messages() {
    let rs = scheduler();
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..100 {
        assert_eq!(rs.batch_size(3, &mut rng), 1);
    }
}

#[test]
fn huge_rooms_emit_multi_message_batches() {
    let rs = scheduler();
    let mut rng = StdRng::seed_from_u64(14);
    for _ in 0..100 {
        let size = rs.batch_size(80_000, &mut rng);
        assert!((3..=5).contains(&size));
    }
}

// =============================================================================
// Burst
// =============================================================================

#[test]
fn burst_probability_scales_with_viewers_and_mode() {
    let rs = scheduler();
    assert!(rs.burst_probability(10, SpeedMode::Normal) < rs.burst_probability(1_000, SpeedMode::Normal));
    assert!(rs.burst_probability(1_000, SpeedMode::Normal) < rs.burst_probability(1_000, SpeedMode::Burst));
    assert!(rs.burst_probability(u64::MAX, SpeedMode::Burst) <= 0.6);
}

#[test]
fn plan_orders_emits_by_offset() {
    let mut rs = scheduler();
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let plan = rs.plan_tick(20_000, SpeedMode::Burst, &mut rng);
        assert!(plan.emits.windows(2).all(|w| w[0].offset <= w[1].offset));
        assert!(plan.count(EmitKind::Regular) >= 3);
        assert!(plan.next_delay >= ChatConfig::default().min_interval);
    }
}

#[test]
fn bursts_eventually_happen_in_busy_rooms() {
    let mut rs = scheduler();
    let mut rng = StdRng::seed_from_u64(15);
    let bursts = (0..500)
        .filter(|_| rs.plan_tick(20_000, SpeedMode::Burst, &mut rng).count(EmitKind::Hype) > 0)
        .count();
    assert!(bursts > 0);
}

// =============================================================================
// Milestones
// =============================================================================

#[test]
fn crossing_a_milestone_celebrates_it_once() {
    let mut rs = scheduler();
    let mut fired = Vec::new();
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        rs.check_milestone(900, &mut rng);
        if let Some(m) = rs.check_milestone(1_010, &mut rng) {
            fired.push(m);
        }
    }
    assert_eq!(fired, vec![1_000]);
    assert!(rs.is_celebrated(1_000));
}

#[test]
fn far_from_milestones_never_celebrates() {
    let mut rs = scheduler();
    let mut rng = StdRng::seed_from_u64(16);
    for _ in 0..1_000 {
        assert_eq!(rs.check_milestone(700, &mut rng), None);
    }
}

#[test]
fn milestone_plan_references_the_count() {
    let mut rs = scheduler();
    let mut found = None;
    for seed in 0..500 {
        let mut rng = StdRng::seed_from_u64(seed);
        rs.plan_tick(2_400, SpeedMode::Normal, &mut rng);
        let plan = rs.plan_tick(2_600, SpeedMode::Normal, &mut rng);
        if let Some(m) = plan.milestone() {
            found = Some(m);
            break;
        }
    }
    assert_eq!(found, Some(2_500));
}
