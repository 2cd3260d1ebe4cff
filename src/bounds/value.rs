use crate::*;
use rand::rngs::SmallRng;

/// Fully observed value: weighted mean of `value(policy, s)` over
/// particles. The cheap sibling of [`FoRollout`] when a state value
/// function is already on hand.
#[derive(Debug, Clone, Copy)]
pub struct FoValue<Pol>(pub Pol);

/// Solved form of [`FoValue`].
pub struct SolvedFoValue<Pol> {
    policy: Pol,
    values: Vec<Utility>,
}

impl<P, Pol> BoundSpec<P> for FoValue<Pol>
where
    P: Pomdp,
    Pol: MdpValue<P>,
{
    type Solved = SolvedFoValue<Pol>;
    fn solve(self, _: &P, m_max: usize, _: usize, _: &mut SmallRng) -> Self::Solved {
        SolvedFoValue {
            policy: self.0,
            values: Vec::with_capacity(m_max),
        }
    }
}

impl<P, Pol> Estimator<P> for SolvedFoValue<Pol>
where
    P: Pomdp,
    Pol: MdpValue<P>,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, _: usize) -> Utility {
        if belief.weight_sum() <= 0.0 {
            return 0.0;
        }
        belief
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(s, w)| w * self.policy.value(pomdp, s))
            .sum::<Utility>()
            / belief.weight_sum()
    }

    /// One state evaluation per shared particle, reused across siblings.
    fn bound_batch(
        &mut self,
        pomdp: &P,
        siblings: &[BeliefView<'_, P>],
        _: usize,
        out: &mut Vec<Utility>,
    ) {
        let Some(first) = siblings.first() else {
            return;
        };
        self.values.clear();
        for (i, s) in first.particles().iter().enumerate() {
            let live = siblings.iter().any(|b| b.weight(i) > 0.0);
            self.values.push(match live {
                true => self.policy.value(pomdp, s),
                false => 0.0,
            });
        }
        for belief in siblings {
            out.push(weighted_mean(&self.values, belief));
        }
    }
}

/// Belief value: delegate straight to a belief value function.
#[derive(Debug, Clone, Copy)]
pub struct PoValue<Pol>(pub Pol);

/// Solved form of [`PoValue`].
pub struct SolvedPoValue<Pol> {
    policy: Pol,
}

impl<P, Pol> BoundSpec<P> for PoValue<Pol>
where
    P: Pomdp,
    Pol: PomdpValue<P>,
{
    type Solved = SolvedPoValue<Pol>;
    fn solve(self, _: &P, _: usize, _: usize, _: &mut SmallRng) -> Self::Solved {
        SolvedPoValue { policy: self.0 }
    }
}

impl<P, Pol> Estimator<P> for SolvedPoValue<Pol>
where
    P: Pomdp,
    Pol: PomdpValue<P>,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, _: usize) -> Utility {
        self.policy.value(pomdp, belief)
    }
}
