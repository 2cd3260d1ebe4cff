use crate::*;
use anyhow::Result;
use rand::rngs::SmallRng;

/// Play one episode: plan, act, filter, repeat.
///
/// The environment state starts as a draw from `initial`; each step the
/// planner decides from the tracked belief, the model advances the true
/// state, and the bootstrap filter folds the emitted observation back
/// into the belief. Stops at a terminal state or after `steps` decisions.
/// Returns the discounted return actually collected.
pub fn run_episode<P, L, U>(
    planner: &mut Planner<P, L, U>,
    initial: &WeightedBelief<P::State>,
    filter: &BootstrapFilter,
    steps: usize,
    rng: &mut SmallRng,
) -> Result<Utility>
where
    P: Pomdp,
    L: Estimator<P>,
    U: Estimator<P>,
{
    let mut state = initial.rand(rng).clone();
    let mut belief = initial.clone();
    let mut ret = 0.0;
    let mut disc = 1.0;
    for _ in 0..steps {
        if planner.pomdp().is_terminal(&state) {
            break;
        }
        let (action, _) = planner.plan(&belief)?;
        let step = planner.pomdp().step(&state, &action, rng);
        ret += disc * step.reward;
        disc *= planner.pomdp().discount();
        belief = filter.update(planner.pomdp(), &belief, &action, &step.obs, rng);
        state = step.state;
    }
    Ok(ret)
}
