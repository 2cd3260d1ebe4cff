use crate::*;
use rand::Rng;
use rand::rngs::SmallRng;

/// The crying baby: feed or ignore a baby that might be hungry, hearing
/// only (noisy) crying. Feeding always cures hunger; an ignored full baby
/// gets hungry on its own now and then.
#[derive(Debug, Clone, Copy)]
pub struct BabyPomdp {
    pub r_feed: Utility,
    pub r_hungry: Utility,
    pub p_become_hungry: Probability,
    pub p_cry_hungry: Probability,
    pub p_cry_full: Probability,
    pub discount: Discount,
}

impl Default for BabyPomdp {
    fn default() -> Self {
        Self {
            r_feed: -5.0,
            r_hungry: -10.0,
            p_become_hungry: 0.1,
            p_cry_hungry: 0.8,
            p_cry_full: 0.1,
            discount: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BabyState {
    pub hungry: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BabyAction {
    pub feed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BabyObs {
    pub crying: bool,
}

impl BabyPomdp {
    /// A prior putting the given mass on "hungry".
    pub fn belief(p_hungry: Probability) -> WeightedBelief<BabyState> {
        WeightedBelief::from_parts(
            vec![BabyState { hungry: true }, BabyState { hungry: false }],
            vec![p_hungry, 1.0 - p_hungry],
        )
    }
    fn p_cry(&self, state: &BabyState) -> Probability {
        match state.hungry {
            true => self.p_cry_hungry,
            false => self.p_cry_full,
        }
    }
}

impl Pomdp for BabyPomdp {
    type State = BabyState;
    type Action = BabyAction;
    type Obs = BabyObs;

    fn actions(&self, _: &BeliefView<'_, Self>) -> Vec<Self::Action> {
        vec![BabyAction { feed: true }, BabyAction { feed: false }]
    }

    fn step(&self, state: &Self::State, action: &Self::Action, rng: &mut SmallRng) -> Outcome<Self> {
        let hungry = match (action.feed, state.hungry) {
            (true, _) => false,
            (false, true) => true,
            (false, false) => rng.random::<f64>() < self.p_become_hungry,
        };
        let next = BabyState { hungry };
        let crying = rng.random::<f64>() < self.p_cry(&next);
        let mut reward = 0.0;
        if state.hungry {
            reward += self.r_hungry;
        }
        if action.feed {
            reward += self.r_feed;
        }
        Outcome {
            state: next,
            obs: BabyObs { crying },
            reward,
        }
    }

    fn obs_density(&self, _: &Self::Action, next: &Self::State, obs: &Self::Obs) -> Probability {
        match obs.crying {
            true => self.p_cry(next),
            false => 1.0 - self.p_cry(next),
        }
    }

    fn is_terminal(&self, _: &Self::State) -> bool {
        false
    }

    fn discount(&self) -> Discount {
        self.discount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// the undiscounted configuration used throughout these tests
    fn undiscounted() -> BabyPomdp {
        BabyPomdp {
            discount: 1.0,
            ..BabyPomdp::default()
        }
    }

    /// feed exactly when the belief leans hungry
    struct FeedWhenLikelyHungry;
    impl PomdpPolicy<BabyPomdp> for FeedWhenLikelyHungry {
        fn action(
            &self,
            _: &BabyPomdp,
            belief: &BeliefView<'_, BabyPomdp>,
            _: &mut rand::rngs::SmallRng,
        ) -> BabyAction {
            let hungry: f64 = belief
                .iter()
                .filter(|(s, _)| s.hungry)
                .map(|(_, w)| w)
                .sum();
            BabyAction {
                feed: hungry > 0.5 * belief.weight_sum(),
            }
        }
    }

    #[test]
    fn feeds_a_probably_hungry_baby() {
        for p_hungry in [0.6, 0.8, 1.0] {
            let mut planner = Solver::new(IndependentBounds::new(-150.0, 0.0))
                .with_t_max(10.0)
                .with_max_trials(200)
                .with_max_depth(10)
                .with_particles(200, 300)
                .with_seed(8)
                .solve(undiscounted())
                .expect("valid configuration");
            let (action, _) = planner
                .plan(&BabyPomdp::belief(p_hungry))
                .expect("search succeeds");
            assert_eq!(action, BabyAction { feed: true }, "p_hungry {}", p_hungry);
        }
    }

    #[test]
    fn long_undiscounted_runs_complete() {
        let mut planner = Solver::new(IndependentBounds::new(-150.0, 0.0))
            .with_t_max(10.0)
            .with_max_trials(50)
            .with_max_depth(10)
            .with_particles(200, 300)
            .with_seed(9)
            .solve(undiscounted())
            .expect("valid configuration");
        let filter = BootstrapFilter::new(200);
        let ref mut rng = SmallRng::seed_from_u64(10);
        for _ in 0..5 {
            let ret = run_episode(&mut planner, &BabyPomdp::belief(0.5), &filter, 20, rng)
                .expect("episode runs");
            assert!(ret.is_finite() && ret <= 0.0);
        }
    }

    #[test]
    fn semipo_rollout_tracks_the_constant_bound_config() {
        let filter = BootstrapFilter::new(150);
        let prior = BabyPomdp::belief(0.5);
        let episodes = 15;
        let mut means = Vec::new();
        for variant in 0..2 {
            let mut total = 0.0;
            for episode in 0..episodes {
                let ref mut rng = SmallRng::seed_from_u64(1_000 + episode);
                total += match variant {
                    0 => {
                        let mut planner = Solver::new(IndependentBounds::new(-150.0, 0.0))
                            .with_t_max(10.0)
                            .with_max_trials(30)
                            .with_max_depth(10)
                            .with_particles(30, 60)
                            .with_seed(11)
                            .solve(undiscounted())
                            .expect("valid configuration");
                        run_episode(&mut planner, &prior, &filter, 20, rng)
                    }
                    _ => {
                        let bounds =
                            IndependentBounds::new(SemiPoRollout(FeedWhenLikelyHungry), 0.0)
                                .with_fix_thresh(1.0);
                        let mut planner = Solver::new(bounds)
                            .with_t_max(10.0)
                            .with_max_trials(30)
                            .with_max_depth(10)
                            .with_particles(30, 60)
                            .with_seed(11)
                            .solve(undiscounted())
                            .expect("valid configuration");
                        run_episode(&mut planner, &prior, &filter, 20, rng)
                    }
                }
                .expect("episode runs");
            }
            means.push(total / episodes as f64);
        }
        let scale = means[0].abs().max(means[1].abs());
        assert!(
            (means[0] - means[1]).abs() <= 0.15 * scale,
            "returns diverge: {:?}",
            means
        );
    }

    /// a deliberately gloomy belief value function
    struct Pessimist;
    impl PomdpValue<BabyPomdp> for Pessimist {
        fn value(&self, _: &BabyPomdp, belief: &BeliefView<'_, BabyPomdp>) -> Utility {
            if belief.weight_sum() <= 0.0 {
                return 0.0;
            }
            let hungry: f64 = belief
                .iter()
                .filter(|(s, _)| s.hungry)
                .map(|(_, w)| w)
                .sum();
            -5.0 - 120.0 * hungry / belief.weight_sum()
        }
    }

    // every estimator family drives a full decision on the same model
    macro_rules! estimator {
        ($name:ident, $lower:expr) => {
            paste::paste! {
                #[test]
                fn [<plans_with_ $name _lower>]() {
                    let bounds = IndependentBounds::new($lower, 0.0).with_fix_thresh(300.0);
                    let mut planner = Solver::new(bounds)
                        .with_t_max(10.0)
                        .with_max_trials(15)
                        .with_max_depth(8)
                        .with_particles(15, 30)
                        .with_tree_in_info(true)
                        .with_seed(21)
                        .solve(BabyPomdp::default())
                        .expect("valid configuration");
                    let (_, info) = planner
                        .plan(&BabyPomdp::belief(0.7))
                        .expect("search succeeds");
                    assert!(info.trials >= 1);
                    let tree = info.tree.expect("tree was requested");
                    for b in 0..tree.n_b() {
                        assert!(tree.l[b] <= tree.u[b] + 1e-9, "node {} inverted", b);
                    }
                }
            }
        };
    }

    estimator!(constant, -150.0);
    estimator!(fo_rollout, FoRollout(RandomPolicy));
    estimator!(fo_value, FoValue(|_: &BabyPomdp, s: &BabyState| match s.hungry {
        true => -115.0,
        false => -55.0,
    }));
    estimator!(po_rollout, PoRollout {
        policy: FeedWhenLikelyHungry,
        updater: BootstrapFilter::new(30),
    });
    estimator!(po_value, PoValue(Pessimist));
    estimator!(semipo_rollout, SemiPoRollout(FeedWhenLikelyHungry));
}
