use crate::*;
use rand::Rng;
use rand::rngs::SmallRng;

/// A policy over fully observed states, for rollouts that pretend the
/// hidden state is known.
pub trait MdpPolicy<P: Pomdp> {
    fn action(&self, pomdp: &P, state: &P::State, rng: &mut SmallRng) -> P::Action;
}

/// A state value function for the underlying MDP.
pub trait MdpValue<P: Pomdp> {
    fn value(&self, pomdp: &P, state: &P::State) -> Utility;
}

/// A policy over beliefs.
pub trait PomdpPolicy<P: Pomdp> {
    fn action(&self, pomdp: &P, belief: &BeliefView<'_, P>, rng: &mut SmallRng) -> P::Action;
}

/// A belief value function.
pub trait PomdpValue<P: Pomdp> {
    fn value(&self, pomdp: &P, belief: &BeliefView<'_, P>) -> Utility;
}

/// Uniform-random action selection; the default rollout policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl<P: Pomdp> MdpPolicy<P> for RandomPolicy {
    fn action(&self, pomdp: &P, state: &P::State, rng: &mut SmallRng) -> P::Action {
        let actions = pomdp.actions(&BeliefView::singleton(state));
        debug_assert!(!actions.is_empty());
        let i = rng.random_range(0..actions.len());
        actions.into_iter().nth(i).expect("nonempty action set")
    }
}

impl<P: Pomdp> PomdpPolicy<P> for RandomPolicy {
    fn action(&self, pomdp: &P, belief: &BeliefView<'_, P>, rng: &mut SmallRng) -> P::Action {
        let actions = pomdp.actions(belief);
        debug_assert!(!actions.is_empty());
        let i = rng.random_range(0..actions.len());
        actions.into_iter().nth(i).expect("nonempty action set")
    }
}

/// Closures act as state policies.
impl<P: Pomdp, F> MdpPolicy<P> for F
where
    F: Fn(&P, &P::State) -> P::Action,
{
    fn action(&self, pomdp: &P, state: &P::State, _: &mut SmallRng) -> P::Action {
        self(pomdp, state)
    }
}

/// Closures act as state value functions.
impl<P: Pomdp, F> MdpValue<P> for F
where
    F: Fn(&P, &P::State) -> Utility,
{
    fn value(&self, pomdp: &P, state: &P::State) -> Utility {
        self(pomdp, state)
    }
}
