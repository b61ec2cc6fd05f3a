use super::*;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn pops_in_due_order() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    q.schedule_after(start, ms(300), "c");
    q.schedule_after(start, ms(100), "a");
    q.schedule_after(start, ms(200), "b");

    let later = start + ms(1000);
    let order: Vec<_> = std::iter::from_fn(|| q.pop_due(later).map(|f| f.task)).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn same_instant_keeps_schedule_order() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    for i in 0..5 {
        q.schedule_at(start, i);
    }
    let order: Vec<_> = std::iter::from_fn(|| q.pop_due(start).map(|f| f.task)).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn future_tasks_are_not_popped() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    q.schedule_after(start, ms(50), ());
    assert!(q.pop_due(start + ms(49)).is_none());
    assert!(q.pop_due(start + ms(50)).is_some());
    assert!(q.is_empty());
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn cancel_removes_a_single_task() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    let a = q.schedule_after(start, ms(10), "a");
    let b = q.schedule_after(start, ms(20), "b");

    assert_eq!(q.cancel(a), Some("a"));
    assert!(!q.is_pending(a));
    assert!(q.is_pending(b));
    assert_eq!(q.cancel(a), None);
    assert_eq!(q.next_due(), Some(start + ms(20)));
}

#[test]
fn cancel_after_fire_is_a_no_op() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    let id = q.schedule_at(start, 1);
    assert_eq!(q.pop_due(start), Some(Fired { id, due: start, task: 1 }));
    assert_eq!(q.cancel(id), None);
}

#[test]
fn cancel_all_clears_everything() {
    let start = Instant::now();
    let mut q = TaskQueue::new();
    for i in 0..10 {
        q.schedule_after(start, ms(i * 10), i);
    }
    assert_eq!(q.cancel_all(), 10);
    assert!(q.is_empty());
    assert!(q.next_due().is_none());
    assert!(q.pop_due(start + ms(10_000)).is_none());
}
