use crate::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Semi-observable rollout: a bounded-depth recursion that picks one
/// action per belief under the policy, groups sampled successor states by
/// their observation, and recurses into each group with its share of the
/// mass. Groups of one particle fall through to a cheap single-path
/// rollout. Sits between the optimistic fully observed rollout and the
/// expensive filtered rollout in both cost and tightness.
#[derive(Debug, Clone, Copy)]
pub struct SemiPoRollout<Pol>(pub Pol);

/// Per-depth scratch: observation buckets with pooled state/weight lists.
/// Outer vectors never shrink; `obs.len()` is the live bucket count.
struct Frame<P: Pomdp> {
    obs: Vec<P::Obs>,
    states: Vec<Vec<P::State>>,
    weights: Vec<Vec<Probability>>,
}

impl<P: Pomdp> Default for Frame<P> {
    fn default() -> Self {
        Self {
            obs: Vec::new(),
            states: Vec::new(),
            weights: Vec::new(),
        }
    }
}

impl<P: Pomdp> Frame<P> {
    fn clear(&mut self) {
        self.obs.clear();
        for v in &mut self.states {
            v.clear();
        }
        for v in &mut self.weights {
            v.clear();
        }
    }
    /// Bucket index for an observation, allocating a slot on first sight.
    fn bucket(&mut self, obs: P::Obs) -> usize {
        match self.obs.iter().position(|o| *o == obs) {
            Some(i) => i,
            None => {
                let i = self.obs.len();
                self.obs.push(obs);
                if self.states.len() == i {
                    self.states.push(Vec::new());
                    self.weights.push(Vec::new());
                }
                i
            }
        }
    }
}

/// Solved form of [`SemiPoRollout`]: policy, private RNG, and one scratch
/// frame per lookahead depth so recursion reuses buffers instead of
/// allocating per call.
pub struct SolvedSemiPoRollout<P: Pomdp, Pol> {
    policy: Pol,
    rng: SmallRng,
    frames: Vec<Frame<P>>,
}

impl<P, Pol> BoundSpec<P> for SemiPoRollout<Pol>
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
{
    type Solved = SolvedSemiPoRollout<P, Pol>;
    fn solve(self, _: &P, _: usize, max_depth: usize, rng: &mut SmallRng) -> Self::Solved {
        SolvedSemiPoRollout {
            policy: self.0,
            rng: SmallRng::seed_from_u64(rand::Rng::random(rng)),
            frames: (0..=max_depth).map(|_| Frame::default()).collect(),
        }
    }
}

impl<P, Pol> Estimator<P> for SolvedSemiPoRollout<P, Pol>
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, max_depth: usize) -> Utility {
        let steps = max_depth.saturating_sub(belief.depth());
        level(
            pomdp,
            &self.policy,
            &mut self.rng,
            &mut self.frames,
            belief.particles(),
            belief.weights(),
            steps,
        )
    }
}

/// One recursion level: act, propagate, group by observation, recurse.
/// `frames[0]` is this level's scratch; deeper levels use the tail.
fn level<P, Pol>(
    pomdp: &P,
    policy: &Pol,
    rng: &mut SmallRng,
    frames: &mut [Frame<P>],
    states: &[P::State],
    weights: &[Probability],
    steps: usize,
) -> Utility
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
{
    let wsum: Probability = weights.iter().sum();
    if steps == 0 || wsum <= 0.0 {
        return 0.0;
    }
    if states.len() == 1 {
        return path(pomdp, policy, &states[0], steps, rng);
    }
    let (frame, rest) = frames.split_first_mut().expect("frame per lookahead step");
    frame.clear();
    let view = BeliefView::<P>::new(states, weights, wsum, 0, None);
    let a = policy.action(pomdp, &view, rng);
    let mut rsum = 0.0;
    for (s, w) in states.iter().zip(weights.iter().copied()) {
        if w <= 0.0 || pomdp.is_terminal(s) {
            continue;
        }
        let step = pomdp.step(s, &a, rng);
        rsum += w * step.reward;
        let i = frame.bucket(step.obs);
        frame.states[i].push(step.state);
        frame.weights[i].push(w);
    }
    let mut value = rsum / wsum;
    let gamma = pomdp.discount();
    for i in 0..frame.obs.len() {
        // lists leave the frame for the recursive call, then return so
        // their capacity survives into the next invocation
        let s = std::mem::take(&mut frame.states[i]);
        let w = std::mem::take(&mut frame.weights[i]);
        let mass: Probability = w.iter().sum();
        value += gamma * (mass / wsum) * level(pomdp, policy, rng, rest, &s, &w, steps - 1);
        frame.states[i] = s;
        frame.weights[i] = w;
    }
    value
}

/// Single-path rollout for one-particle groups: no branching, the policy
/// acts on the lone state's singleton belief.
fn path<P, Pol>(
    pomdp: &P,
    policy: &Pol,
    state: &P::State,
    steps: usize,
    rng: &mut SmallRng,
) -> Utility
where
    P: Pomdp,
    Pol: PomdpPolicy<P>,
{
    let mut ret = 0.0;
    let mut disc = 1.0;
    let mut state = state.clone();
    for _ in 0..steps {
        if pomdp.is_terminal(&state) {
            break;
        }
        let a = policy.action(pomdp, &BeliefView::<P>::singleton(&state), rng);
        let step = pomdp.step(&state, &a, rng);
        ret += disc * step.reward;
        disc *= pomdp.discount();
        state = step.state;
    }
    ret
}
