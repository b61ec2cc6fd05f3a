use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;

// =============================================================================
// weighted_choice
// =============================================================================

#[test]
fn weighted_choice_never_picks_zero_weight() {
    let mut rng = StdRng::seed_from_u64(7);
    let candidates = ["a", "b", "c"];
    for _ in 0..500 {
        let picked = weighted_choice(&candidates, &[1, 0, 3], &mut rng).unwrap();
        assert_ne!(*picked, "b");
    }
}

#[test]
fn weighted_choice_rejects_bad_input() {
    let mut rng = StdRng::seed_from_u64(1);
    let empty: [u8; 0] = [];
    assert!(weighted_choice(&empty, &[], &mut rng).is_none());
    assert!(weighted_choice(&[1, 2], &[1], &mut rng).is_none());
    assert!(weighted_choice(&[1, 2], &[0, 0], &mut rng).is_none());
}

#[test]
fn weighted_choice_follows_weights() {
    let mut rng = StdRng::seed_from_u64(42);
    let candidates = [0usize, 1];
    let mut counts = [0u32; 2];
    for _ in 0..10_000 {
        counts[*weighted_choice(&candidates, &[9, 1], &mut rng).unwrap()] += 1;
    }
    assert!(counts[0] > counts[1] * 5, "counts: {counts:?}");
}

#[test]
fn weighted_choice_is_deterministic_for_a_seed() {
    let candidates = ["x", "y", "z"];
    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..20)
            .map(|_| *weighted_choice(&candidates, &[1, 1, 1], &mut rng).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(99), run(99));
}

// =============================================================================
// chance / durations
// =============================================================================

#[test]
fn chance_clamps_out_of_range_probabilities() {
    let mut rng = StdRng::seed_from_u64(3);
    assert!(chance(2.0, &mut rng));
    assert!(!chance(-1.0, &mut rng));
    assert!(!chance(f64::NAN, &mut rng));
}

#[test]
fn duration_between_stays_in_range() {
    let mut rng = StdRng::seed_from_u64(11);
    let low = Duration::from_secs(30);
    let high = Duration::from_secs(180);
    for _ in 0..200 {
        let d = duration_between(low, high, &mut rng);
        assert!(d >= low && d <= high);
    }
    assert_eq!(duration_between(high, low, &mut rng), high);
}

#[test]
fn jitter_stays_within_factor_bounds() {
    let mut rng = StdRng::seed_from_u64(5);
    let base = Duration::from_millis(1000);
    for _ in 0..200 {
        let d = jitter(base, 0.7, 1.3, &mut rng);
        assert!(d >= Duration::from_millis(699) && d <= Duration::from_millis(1301), "{d:?}");
    }
}
