use super::*;

#[test]
fn percentage_of_zero_total_is_zero() {
    assert!(percentage(0, 0).abs() < f64::EPSILON);
    assert!(percentage(7, 0).abs() < f64::EPSILON);
}

#[test]
fn even_split_is_fifty_percent() {
    assert!((percentage(5, 10) - 50.0).abs() < f64::EPSILON);
}

#[test]
fn status_only_moves_forward() {
    let mut status = OverlayStatus::Open;
    assert!(status.advance_to(OverlayStatus::Locked));
    assert!(!status.advance_to(OverlayStatus::Open));
    assert!(!status.advance_to(OverlayStatus::Locked));
    assert!(status.advance_to(OverlayStatus::Completed));
    assert!(!status.advance_to(OverlayStatus::Locked));
    assert_eq!(status, OverlayStatus::Completed);
}

#[test]
fn open_can_jump_to_completed() {
    let mut status = OverlayStatus::Open;
    assert!(status.advance_to(OverlayStatus::Completed));
}
