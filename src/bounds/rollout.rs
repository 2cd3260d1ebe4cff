use crate::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Fully observed rollout: estimate `E[V]` by simulating the underlying
/// MDP from each particle under a state policy.
#[derive(Debug, Clone, Copy)]
pub struct FoRollout<Pol>(pub Pol);

/// Solved form of [`FoRollout`]: policy, private RNG, and a value scratch
/// sized to the particle ceiling so batch evaluation never allocates.
pub struct SolvedFoRollout<Pol> {
    policy: Pol,
    rng: SmallRng,
    values: Vec<Utility>,
}

impl<P, Pol> BoundSpec<P> for FoRollout<Pol>
where
    P: Pomdp,
    Pol: MdpPolicy<P>,
{
    type Solved = SolvedFoRollout<Pol>;
    fn solve(self, _: &P, m_max: usize, _: usize, rng: &mut SmallRng) -> Self::Solved {
        SolvedFoRollout {
            policy: self.0,
            rng: SmallRng::seed_from_u64(rand::Rng::random(rng)),
            values: Vec::with_capacity(m_max),
        }
    }
}

impl<P, Pol> Estimator<P> for SolvedFoRollout<Pol>
where
    P: Pomdp,
    Pol: MdpPolicy<P>,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, max_depth: usize) -> Utility {
        if belief.weight_sum() <= 0.0 {
            return 0.0;
        }
        let steps = max_depth.saturating_sub(belief.depth());
        let mut total = 0.0;
        for (s, w) in belief.iter() {
            if w > 0.0 {
                total += w * mdp_rollout(pomdp, &self.policy, s, steps, &mut self.rng);
            }
        }
        total / belief.weight_sum()
    }

    /// One rollout per shared particle, reused across every sibling.
    fn bound_batch(
        &mut self,
        pomdp: &P,
        siblings: &[BeliefView<'_, P>],
        max_depth: usize,
        out: &mut Vec<Utility>,
    ) {
        let Some(first) = siblings.first() else {
            return;
        };
        let steps = max_depth.saturating_sub(first.depth());
        self.values.clear();
        for (i, s) in first.particles().iter().enumerate() {
            let live = siblings.iter().any(|b| b.weight(i) > 0.0);
            self.values.push(match live {
                true => mdp_rollout(pomdp, &self.policy, s, steps, &mut self.rng),
                false => 0.0,
            });
        }
        for belief in siblings {
            out.push(weighted_mean(&self.values, belief));
        }
    }
}

/// Partially observed rollout: simulate the POMDP from each particle,
/// with the policy acting on a filtered belief rather than the state.
#[derive(Debug, Clone, Copy)]
pub struct PoRollout<Pol, Up> {
    pub policy: Pol,
    pub updater: Up,
}

/// Solved form of [`PoRollout`].
pub struct SolvedPoRollout<Pol, Up> {
    policy: Pol,
    updater: Up,
    rng: SmallRng,
}

impl<P, Pol, Up> BoundSpec<P> for PoRollout<Pol, Up>
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
    Up: BeliefUpdater<P>,
{
    type Solved = SolvedPoRollout<Pol, Up>;
    fn solve(self, _: &P, _: usize, _: usize, rng: &mut SmallRng) -> Self::Solved {
        SolvedPoRollout {
            policy: self.policy,
            updater: self.updater,
            rng: SmallRng::seed_from_u64(rand::Rng::random(rng)),
        }
    }
}

impl<P, Pol, Up> Estimator<P> for SolvedPoRollout<Pol, Up>
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
    Up: BeliefUpdater<P>,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, max_depth: usize) -> Utility {
        if belief.weight_sum() <= 0.0 {
            return 0.0;
        }
        let steps = max_depth.saturating_sub(belief.depth());
        let prior = belief.to_owned();
        let mut total = 0.0;
        for (s, w) in belief.iter() {
            if w <= 0.0 {
                continue;
            }
            let mut ret = 0.0;
            let mut disc = 1.0;
            let mut state = s.clone();
            let mut filtered = prior.clone();
            for _ in 0..steps {
                if pomdp.is_terminal(&state) {
                    break;
                }
                let view = BeliefView::new(
                    filtered.particles(),
                    filtered.weights(),
                    filtered.weight_sum(),
                    0,
                    None,
                );
                let a = self.policy.action(pomdp, &view, &mut self.rng);
                let step = pomdp.step(&state, &a, &mut self.rng);
                ret += disc * step.reward;
                disc *= pomdp.discount();
                filtered = self.updater.update(pomdp, &filtered, &a, &step.obs, &mut self.rng);
                state = step.state;
            }
            total += w * ret;
        }
        total / belief.weight_sum()
    }
}

/// Simulate the MDP from `state` for at most `steps` steps under `policy`,
/// returning the discounted return.
pub(crate) fn mdp_rollout<P: Pomdp, Pol: MdpPolicy<P>>(
    pomdp: &P,
    policy: &Pol,
    state: &P::State,
    steps: usize,
    rng: &mut SmallRng,
) -> Utility {
    let mut ret = 0.0;
    let mut disc = 1.0;
    let mut state = state.clone();
    for _ in 0..steps {
        if pomdp.is_terminal(&state) {
            break;
        }
        let a = policy.action(pomdp, &state, rng);
        let step = pomdp.step(&state, &a, rng);
        ret += disc * step.reward;
        disc *= pomdp.discount();
        state = step.state;
    }
    ret
}

/// Weighted mean of precomputed per-particle values under one sibling.
pub(crate) fn weighted_mean<P: Pomdp>(values: &[Utility], belief: &BeliefView<'_, P>) -> Utility {
    if belief.weight_sum() <= 0.0 {
        return 0.0;
    }
    let total: Utility = values
        .iter()
        .zip(belief.weights())
        .map(|(v, w)| v * w)
        .sum();
    total / belief.weight_sum()
}
