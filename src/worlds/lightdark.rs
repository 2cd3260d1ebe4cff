use super::gaussian;
use crate::*;
use rand::rngs::SmallRng;

/// One-dimensional light-dark navigation: move along a line toward the
/// origin, observing position with noise that shrinks near a light
/// source off to the side. The optimal play detours into the light to
/// localize before committing to the stop action.
#[derive(Debug, Clone, Copy)]
pub struct LightDark {
    pub light: f64,
    pub goal_radius: f64,
    pub r_correct: Utility,
    pub r_wrong: Utility,
    pub r_step: Utility,
    pub init_mean: f64,
    pub init_std: f64,
    pub discount: Discount,
}

impl Default for LightDark {
    fn default() -> Self {
        Self {
            light: 10.0,
            goal_radius: 1.0,
            r_correct: 100.0,
            r_wrong: -100.0,
            r_step: -1.0,
            init_mean: 2.0,
            init_std: 3.0,
            discount: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LdState {
    pub y: f64,
    pub done: bool,
}

/// Movement step sizes; 0 commits to the current position.
pub const LD_ACTIONS: [i32; 5] = [-10, -1, 0, 1, 10];

impl LightDark {
    /// Observation noise at a position: tight under the light, wide in
    /// the dark.
    pub fn sigma(&self, y: f64) -> f64 {
        1e-2 + (y - self.light).abs() / 2.0
    }
    /// Sample an initial particle belief.
    pub fn initial_belief(&self, n: usize, rng: &mut SmallRng) -> WeightedBelief<LdState> {
        WeightedBelief::uniform(
            (0..n)
                .map(|_| LdState {
                    y: self.init_mean + self.init_std * gaussian(rng),
                    done: false,
                })
                .collect(),
        )
    }
}

impl Pomdp for LightDark {
    type State = LdState;
    type Action = i32;
    type Obs = i64;

    fn actions(&self, _: &BeliefView<'_, Self>) -> Vec<Self::Action> {
        LD_ACTIONS.to_vec()
    }

    fn step(&self, state: &Self::State, action: &Self::Action, rng: &mut SmallRng) -> Outcome<Self> {
        let (next, reward) = match action {
            0 => {
                let reward = match state.y.abs() <= self.goal_radius {
                    true => self.r_correct,
                    false => self.r_wrong,
                };
                (LdState { y: state.y, done: true }, reward)
            }
            a => (
                LdState {
                    y: state.y + *a as f64,
                    done: false,
                },
                self.r_step,
            ),
        };
        let obs = (next.y + self.sigma(next.y) * gaussian(rng)).round() as i64;
        Outcome {
            state: next,
            obs,
            reward,
        }
    }

    fn obs_density(&self, _: &Self::Action, next: &Self::State, obs: &Self::Obs) -> Probability {
        let sigma = self.sigma(next.y);
        let z = (*obs as f64 - next.y) / sigma;
        (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.done
    }

    fn discount(&self) -> Discount {
        self.discount
    }
}

/// Position grid for the KLD rule over this world.
#[derive(Debug, Clone)]
pub struct LdGrid(UniformGrid<1>);

impl LdGrid {
    pub fn new(lo: f64, hi: f64, bins: usize) -> Self {
        Self(UniformGrid::new([lo], [hi], [bins]))
    }
}

impl StateGrid<LdState> for LdGrid {
    fn len(&self) -> usize {
        self.0.cells()
    }
    fn bin(&self, state: &LdState) -> usize {
        self.0.cell(&[state.y])
    }
}
