//! Tests for TimeManager and round phases

use bandit_simulator_core_rs::{Phase, TimeManager};

#[test]
fn test_time_manager_new() {
    let time = TimeManager::new(100, 5);
    assert_eq!(time.current_round(), 0);
    assert_eq!(time.horizon(), 100);
    assert_eq!(time.warmup_rounds(), 5);
    assert_eq!(time.remaining_rounds(), 100);
    assert!(!time.is_finished());
}

#[test]
fn test_advance_round() {
    let mut time = TimeManager::new(10, 3);

    time.advance_round();
    assert_eq!(time.current_round(), 1);

    time.advance_round();
    assert_eq!(time.current_round(), 2);
    assert_eq!(time.remaining_rounds(), 8);
}

#[test]
fn test_warmup_boundary() {
    let mut time = TimeManager::new(10, 3);

    for round in 0..3 {
        assert_eq!(time.phase(), Phase::Warmup, "round {} is warm-up", round);
        assert!(!time.is_warmup_boundary());
        time.advance_round();
    }

    // Round 3 is the first steady-state round
    assert!(time.is_warmup_boundary());
    assert_eq!(time.phase(), Phase::SteadyState);

    time.advance_round();
    assert!(!time.is_warmup_boundary());
    assert_eq!(time.phase(), Phase::SteadyState);
}

#[test]
fn test_horizon_shorter_than_warmup() {
    let mut time = TimeManager::new(2, 5);
    time.advance_round();
    time.advance_round();

    assert!(time.is_finished());
    assert_eq!(time.phase(), Phase::Warmup);
    assert_eq!(time.remaining_rounds(), 0);
}

#[test]
fn test_phase_for_round() {
    assert_eq!(Phase::for_round(0, 3), Phase::Warmup);
    assert_eq!(Phase::for_round(2, 3), Phase::Warmup);
    assert_eq!(Phase::for_round(3, 3), Phase::SteadyState);
    assert_eq!(Phase::for_round(1000, 3), Phase::SteadyState);
}

#[test]
fn test_resume_at() {
    let time = TimeManager::resume_at(50, 5, 20);
    assert_eq!(time.current_round(), 20);
    assert_eq!(time.remaining_rounds(), 30);
    assert_eq!(time.phase(), Phase::SteadyState);
}

#[test]
#[should_panic(expected = "horizon must be positive")]
fn test_zero_horizon_rejected() {
    TimeManager::new(0, 3);
}
