use crate::*;
use rand::rngs::SmallRng;

/// One draw from the generative model: successor state, emitted
/// observation, immediate reward.
pub struct Outcome<P: Pomdp> {
    pub state: P::State,
    pub obs: P::Obs,
    pub reward: Utility,
}

/// A partially observable Markov decision process, generative form.
///
/// The planner drives the model exclusively through sampling: it never
/// enumerates states or observations on its own. Implementations define
/// three associated types and five operations:
///
/// - [`actions`](Self::actions) — the action set, conditioned on the
///   current belief (most models ignore the belief and return a fixed set)
/// - [`step`](Self::step) — sample `(s', o, r)` given `(s, a)`
/// - [`obs_density`](Self::obs_density) — likelihood of an observation
///   given the action taken and the successor state reached
/// - [`is_terminal`](Self::is_terminal) — absorbing-state classification
/// - [`discount`](Self::discount) — `γ ∈ (0, 1]`
///
/// `Obs` needs `Eq + Hash` because expansion buckets sampled observations
/// into dense indices before packing; continuous observations should be
/// discretized by the model (see the light-dark world).
pub trait Pomdp: Sized {
    type State: Clone;
    type Action: Clone + PartialEq;
    type Obs: Clone + Eq + std::hash::Hash;

    /// Actions applicable under the given belief.
    fn actions(&self, belief: &BeliefView<'_, Self>) -> Vec<Self::Action>;

    /// Sample a transition from the generative model.
    fn step(&self, state: &Self::State, action: &Self::Action, rng: &mut SmallRng) -> Outcome<Self>;

    /// Density of observing `obs` after taking `action` and landing on `next`.
    fn obs_density(&self, action: &Self::Action, next: &Self::State, obs: &Self::Obs)
    -> Probability;

    /// Whether a state is absorbing. Terminal states carry zero weight
    /// throughout tree operations and are never propagated.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Discount factor in `(0, 1]`.
    fn discount(&self) -> Discount;
}
