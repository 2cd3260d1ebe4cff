use crate::*;
use rand::rngs::SmallRng;

/// Updates a belief given an action taken and an observation received.
///
/// The planner itself never updates beliefs across decision epochs; that
/// is the caller's job. This trait exists so the partially observable
/// rollout estimator and the episode harness can be handed whatever
/// filter the caller trusts.
pub trait BeliefUpdater<P: Pomdp> {
    fn update(
        &self,
        pomdp: &P,
        belief: &WeightedBelief<P::State>,
        action: &P::Action,
        obs: &P::Obs,
        rng: &mut SmallRng,
    ) -> WeightedBelief<P::State>;
}

/// The plain bootstrap particle filter: draw ancestors proportional to
/// weight, propagate through the generative model, reweight by the
/// observation density. A posterior that collapses to zero mass falls
/// back to the unweighted propagated particles rather than dying.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapFilter {
    pub n: usize,
}

impl BootstrapFilter {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<P: Pomdp> BeliefUpdater<P> for BootstrapFilter {
    fn update(
        &self,
        pomdp: &P,
        belief: &WeightedBelief<P::State>,
        action: &P::Action,
        obs: &P::Obs,
        rng: &mut SmallRng,
    ) -> WeightedBelief<P::State> {
        let mut next = WeightedBelief::new();
        for _ in 0..self.n {
            let s = belief.rand(rng);
            if pomdp.is_terminal(s) {
                next.push(s.clone(), 0.0);
                continue;
            }
            let out = pomdp.step(s, action, rng);
            let w = pomdp.obs_density(action, &out.state, obs);
            next.push(out.state, w);
        }
        if next.weight_sum() <= 0.0 {
            // degenerate posterior: keep the propagated states, flatten weights
            for i in 0..next.n_particles() {
                next.set_weight(i, 1.0);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worlds::*;
    use rand::SeedableRng;

    #[test]
    fn filter_concentrates_on_consistent_states() {
        let pomdp = TigerPomdp::default();
        let ref mut rng = SmallRng::seed_from_u64(11);
        let mut belief =
            WeightedBelief::uniform(vec![TigerState::Left; 50].into_iter().chain(vec![TigerState::Right; 50]).collect());
        // repeated left growls should pile mass onto the tiger-left state
        for _ in 0..6 {
            belief = BootstrapFilter::new(100).update(
                &pomdp,
                &belief,
                &TigerAction::Listen,
                &TigerObs::HearLeft,
                rng,
            );
        }
        assert!(belief.pdf(&TigerState::Left) > 0.9);
    }

    #[test]
    fn degenerate_posterior_keeps_particles() {
        let pomdp = BabyPomdp::default();
        let ref mut rng = SmallRng::seed_from_u64(12);
        let belief = WeightedBelief::uniform(vec![BabyState { hungry: false }]);
        let next = BootstrapFilter::new(30).update(
            &pomdp,
            &belief,
            &BabyAction { feed: true },
            &BabyObs { crying: false },
            rng,
        );
        assert_eq!(next.n_particles(), 30);
        assert!(next.weight_sum() > 0.0);
    }
}
