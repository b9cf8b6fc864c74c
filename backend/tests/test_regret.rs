//! Regret accounting tests

use bandit_simulator_core_rs::{
    best_achievable_reward, cumulative_regret, run_simulation, RegretReport, SimulationConfig,
};

#[test]
fn test_best_reward_sums_top_means() {
    let best = best_achievable_reward(&[0.1, 0.9, 0.5, 0.3], 2);
    assert!((best - 1.4).abs() < 1e-12);

    let single = best_achievable_reward(&[0.1, 0.9, 0.5], 1);
    assert!((single - 0.9).abs() < 1e-12);
}

#[test]
fn test_cumulative_regret_accumulates_shortfall() {
    let regret = cumulative_regret(&[0.5, 0.5], 2, &[1.0, 0.0, 2.0]);
    assert_eq!(regret, vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_empty_series() {
    assert!(cumulative_regret(&[0.5], 1, &[]).is_empty());

    let report = RegretReport::new(&[0.5], 1, &[]);
    assert_eq!(report.final_regret(), 0.0);
    assert_eq!(report.total_reward(), 0.0);
}

#[test]
fn test_report_from_simulation() {
    let config = SimulationConfig {
        t_horizon: 2000,
        record_events: false,
        ..SimulationConfig::default()
    };
    let rewards = run_simulation(config.clone()).unwrap();
    let report = RegretReport::new(&config.arm_means, config.n_users, &rewards);

    assert_eq!(report.cumulative_regret.len(), 2000);
    assert!((report.best_achievable_reward - 2.2).abs() < 1e-12);
    assert_eq!(report.total_reward(), rewards.iter().sum::<f64>());

    // Regret grows sublinearly once users settle on distinct good arms
    let early = report.cumulative_regret[199] / 200.0;
    let late = (report.final_regret() - report.cumulative_regret[999]) / 1000.0;
    assert!(late < early, "per-round regret should fall: early {}, late {}", early, late);
}

#[test]
fn test_report_serializes_series() {
    let report = RegretReport::new(&[0.2, 0.8], 1, &[1.0, 0.0]);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["n_users"], 1);
    assert_eq!(json["round_rewards"].as_array().unwrap().len(), 2);
    assert_eq!(json["cumulative_reward"][1], 1.0);
}
