//! Leaf value estimators for the belief tree.
//!
//! Fresh leaves need initial lower and upper bounds on their value; the
//! search then tightens those by expansion and backup. Estimators come in
//! an *unsolved* form the caller configures (a number, a callback, a
//! rollout policy) and a *solved* form the planner resolves once at
//! construction — the solved form owns its policy, its own RNG split off
//! the planner's, and scratch sized to the particle ceiling, so
//! evaluation never allocates.
//!
//! # Variants
//!
//! | Unsolved | Solved | Estimate |
//! |----------|--------|----------|
//! | `f64` | itself | that constant |
//! | [`ByFunction`] | itself | user callback on the belief |
//! | [`FoRollout`] | [`SolvedFoRollout`] | per-particle MDP rollout under a state policy |
//! | [`FoValue`] | [`SolvedFoValue`] | per-particle `value(policy, s)` |
//! | [`PoRollout`] | [`SolvedPoRollout`] | per-particle POMDP rollout under a belief policy + filter |
//! | [`PoValue`] | [`SolvedPoValue`] | `value(policy, belief)` |
//! | [`SemiPoRollout`] | [`SolvedSemiPoRollout`] | observation-grouped recursive rollout |
//!
//! Estimators whose per-particle value depends only on the state override
//! [`Estimator::bound_batch`] to score all sibling beliefs that share one
//! particle set in a single inner pass.

mod function;
mod independent;
mod policy;
mod rollout;
mod semipo;
mod value;

pub use function::*;
pub use independent::*;
pub use policy::*;
pub use rollout::*;
pub use semipo::*;
pub use value::*;

use crate::*;
use rand::rngs::SmallRng;

/// A solved leaf value estimator.
pub trait Estimator<P: Pomdp> {
    /// Estimate the value of a belief, looking ahead at most
    /// `max_depth − depth(belief)` steps.
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, max_depth: usize) -> Utility;

    /// Estimate every sibling belief in one call. Siblings share a single
    /// particle vector and differ only in weights and incoming
    /// observation; implementations free to exploit that should.
    fn bound_batch(
        &mut self,
        pomdp: &P,
        siblings: &[BeliefView<'_, P>],
        max_depth: usize,
        out: &mut Vec<Utility>,
    ) {
        for belief in siblings {
            let v = self.bound(pomdp, belief, max_depth);
            out.push(v);
        }
    }
}

/// An unsolved estimator: configuration that resolves into an
/// [`Estimator`] exactly once, when the planner is built.
pub trait BoundSpec<P: Pomdp> {
    type Solved: Estimator<P>;

    /// Resolve into the solved form, allocating scratch for up to `m_max`
    /// particles and rollouts of at most `max_depth` steps.
    fn solve(self, pomdp: &P, m_max: usize, max_depth: usize, rng: &mut SmallRng) -> Self::Solved;

    /// Reject configurations that can never produce a finite bound.
    fn validate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A constant is its own estimator.
impl<P: Pomdp> Estimator<P> for Utility {
    fn bound(&mut self, _: &P, _: &BeliefView<'_, P>, _: usize) -> Utility {
        *self
    }
    fn bound_batch(
        &mut self,
        _: &P,
        siblings: &[BeliefView<'_, P>],
        _: usize,
        out: &mut Vec<Utility>,
    ) {
        out.extend(std::iter::repeat(*self).take(siblings.len()));
    }
}

impl<P: Pomdp> BoundSpec<P> for Utility {
    type Solved = Utility;
    fn solve(self, _: &P, _: usize, _: usize, _: &mut SmallRng) -> Self::Solved {
        self
    }
    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.is_finite(), "constant bound {} is not finite", self);
        Ok(())
    }
}
