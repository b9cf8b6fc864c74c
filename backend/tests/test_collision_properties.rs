//! Property tests for the round protocol
//!
//! Randomized configurations checked round by round:
//! - Warm-up determinism: every warm-up choice is `round mod n_arms`
//! - Draw count equals the number of sole choosers, bounded by n_users
//! - Collision symmetry: every user sharing an arm collides and none draws
//! - Aggregate bound: `0 <= total_reward <= num_draws <= n_users`

use bandit_simulator_core_rs::policy::rank_arms;
use bandit_simulator_core_rs::{Orchestrator, Phase, PolicyConfig, SimulationConfig};
use proptest::prelude::*;

fn arb_config() -> impl Strategy<Value = SimulationConfig> {
    (1usize..5, 0usize..4, 1usize..60, any::<u64>(), any::<bool>())
        .prop_flat_map(|(n_users, extra_arms, t_horizon, seed, thompson)| {
            let n_arms = n_users + extra_arms;
            prop::collection::vec(0.01f64..0.99, n_arms).prop_map(move |arm_means| {
                SimulationConfig {
                    n_users,
                    n_arms,
                    t_horizon,
                    arm_means,
                    rng_seed: seed,
                    policy: if thompson {
                        PolicyConfig::ThompsonSampling
                    } else {
                        PolicyConfig::Ucb
                    },
                    record_events: false,
                }
            })
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_round_protocol_holds(config in arb_config()) {
        let n_users = config.n_users;
        let n_arms = config.n_arms;
        let mut orch = Orchestrator::new(config).unwrap();

        while !orch.is_finished() {
            let draws_before: Vec<u64> =
                orch.state().users().iter().map(|u| u.total_draws()).collect();
            let collisions_before: Vec<u64> =
                orch.state().users().iter().map(|u| u.collision_count()).collect();

            let result = orch.tick().unwrap();

            let mut counts = vec![0usize; n_arms];
            for &arm in &result.choices {
                counts[arm] += 1;
            }

            match result.phase {
                Phase::Warmup => {
                    prop_assert!(result.choices.iter().all(|&arm| arm == result.round % n_arms));
                    prop_assert!(result.colliding_users.is_empty());
                    prop_assert_eq!(result.num_draws, n_users);
                    prop_assert_eq!(result.total_reward, 0.0);
                }
                Phase::SteadyState => {
                    let sole = result.choices.iter().filter(|&&arm| counts[arm] == 1).count();
                    prop_assert_eq!(result.num_draws, sole);

                    let expected_colliders: Vec<usize> = (0..n_users)
                        .filter(|&id| counts[result.choices[id]] > 1)
                        .collect();
                    prop_assert_eq!(&result.colliding_users, &expected_colliders);
                }
            }

            for id in 0..n_users {
                let user = orch.user(id).unwrap();
                let collided = result.colliding_users.contains(&id);
                let drew = user.total_draws() - draws_before[id];
                let new_collisions = user.collision_count() - collisions_before[id];

                prop_assert_eq!(drew, if collided { 0 } else { 1 });
                prop_assert_eq!(new_collisions, if collided { 1 } else { 0 });
                prop_assert!(user.rank_to_consider() < n_users);
            }

            prop_assert!(result.num_draws <= n_users);
            prop_assert!(result.total_reward >= 0.0);
            prop_assert!(result.total_reward <= result.num_draws as f64);
        }

        prop_assert_eq!(orch.round_rewards().len(), orch.horizon());
    }

    #[test]
    fn prop_rank_arms_orders_descending_with_stable_ties(
        scores in prop::collection::vec(prop::sample::select(vec![0.0f64, 0.25, 0.5, 0.75, 1.0]), 1..12)
    ) {
        let indexed: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
        let ranking = rank_arms(indexed);

        prop_assert_eq!(ranking.len(), scores.len());
        for pair in ranking.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            prop_assert!(
                scores[a] > scores[b] || (scores[a] == scores[b] && a < b),
                "arm {} ({}) ranked before arm {} ({})", a, scores[a], b, scores[b]
            );
        }
    }
}
