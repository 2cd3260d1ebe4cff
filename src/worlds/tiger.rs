use crate::*;
use rand::Rng;
use rand::rngs::SmallRng;

/// The tiger problem: a tiger behind one of two doors, a growl heard
/// with fixed accuracy on every listen. Opening resets the tiger to a
/// uniform door, so episodes run indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct TigerPomdp {
    pub r_listen: Utility,
    pub r_escape: Utility,
    pub r_tiger: Utility,
    pub accuracy: Probability,
    pub discount: Discount,
}

impl Default for TigerPomdp {
    fn default() -> Self {
        Self {
            r_listen: -1.0,
            r_escape: 10.0,
            r_tiger: -100.0,
            accuracy: 0.85,
            discount: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TigerState {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TigerAction {
    Listen,
    OpenLeft,
    OpenRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TigerObs {
    HearLeft,
    HearRight,
}

impl TigerPomdp {
    /// The uniform two-particle prior.
    pub fn uniform_belief() -> WeightedBelief<TigerState> {
        WeightedBelief::uniform(vec![TigerState::Left, TigerState::Right])
    }
    fn growl(&self, state: TigerState, rng: &mut SmallRng) -> TigerObs {
        let truthful = rng.random::<f64>() < self.accuracy;
        match (state, truthful) {
            (TigerState::Left, true) | (TigerState::Right, false) => TigerObs::HearLeft,
            (TigerState::Right, true) | (TigerState::Left, false) => TigerObs::HearRight,
        }
    }
}

impl Pomdp for TigerPomdp {
    type State = TigerState;
    type Action = TigerAction;
    type Obs = TigerObs;

    fn actions(&self, _: &BeliefView<'_, Self>) -> Vec<Self::Action> {
        vec![
            TigerAction::Listen,
            TigerAction::OpenLeft,
            TigerAction::OpenRight,
        ]
    }

    fn step(&self, state: &Self::State, action: &Self::Action, rng: &mut SmallRng) -> Outcome<Self> {
        match action {
            TigerAction::Listen => Outcome {
                state: *state,
                obs: self.growl(*state, rng),
                reward: self.r_listen,
            },
            open => {
                let tiger = match open {
                    TigerAction::OpenLeft => TigerState::Left,
                    _ => TigerState::Right,
                };
                let reward = match *state == tiger {
                    true => self.r_tiger,
                    false => self.r_escape,
                };
                // the tiger is reshuffled behind a fresh door
                let state = match rng.random::<bool>() {
                    true => TigerState::Left,
                    false => TigerState::Right,
                };
                let obs = match rng.random::<bool>() {
                    true => TigerObs::HearLeft,
                    false => TigerObs::HearRight,
                };
                Outcome { state, obs, reward }
            }
        }
    }

    fn obs_density(&self, action: &Self::Action, next: &Self::State, obs: &Self::Obs)
    -> Probability {
        match action {
            TigerAction::Listen => {
                let truthful = matches!(
                    (next, obs),
                    (TigerState::Left, TigerObs::HearLeft) | (TigerState::Right, TigerObs::HearRight)
                );
                match truthful {
                    true => self.accuracy,
                    false => 1.0 - self.accuracy,
                }
            }
            _ => 0.5,
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

    fn planner(trials: usize, seed: u64) -> Planner<TigerPomdp, Utility, Utility> {
        Solver::new(IndependentBounds::new(-20.0, 0.0))
            .with_t_max(10.0)
            .with_max_trials(trials)
            .with_max_depth(20)
            .with_particles(30, 60)
            .with_seed(seed)
            .solve(TigerPomdp::default())
            .expect("valid configuration")
    }

    #[test]
    fn listens_while_uncertain() {
        let (action, info) = planner(300, 1)
            .plan(&TigerPomdp::uniform_belief())
            .expect("search succeeds");
        assert!(info.trials >= 1);
        assert_eq!(action, TigerAction::Listen);
    }

    #[test]
    fn opens_away_from_a_located_tiger() {
        let sure = WeightedBelief::from_parts(
            vec![TigerState::Left, TigerState::Right],
            vec![0.02, 0.98],
        );
        let (action, _) = planner(500, 2).plan(&sure).expect("search succeeds");
        assert_eq!(action, TigerAction::OpenLeft);
    }

    #[test]
    fn repeated_play_comes_out_ahead() {
        let mut planner = planner(60, 5);
        let filter = BootstrapFilter::new(300);
        let prior = TigerPomdp::uniform_belief();
        let ref mut rng = SmallRng::seed_from_u64(6);
        let episodes = 30;
        let mut total = 0.0;
        for _ in 0..episodes {
            total += run_episode(&mut planner, &prior, &filter, 10, rng).expect("episode runs");
        }
        let mean = total / episodes as f64;
        assert!(mean > 0.0, "mean discounted return {}", mean);
    }
}
