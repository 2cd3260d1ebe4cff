use crate::*;
use rand::rngs::SmallRng;

static UNIT_WEIGHT: [Probability; 1] = [1.0];

/// A borrowed belief over particle and weight slices resident elsewhere
/// (usually the tree arenas), with the depth and incoming observation of
/// the node it stands for.
///
/// Views are constructed for the duration of a bound evaluation or an
/// action query and dropped before the underlying arena mutates again;
/// the borrow checker enforces exactly that discipline.
pub struct BeliefView<'a, P: Pomdp> {
    particles: &'a [P::State],
    weights: &'a [Probability],
    sum: Probability,
    depth: usize,
    obs: Option<&'a P::Obs>,
}

impl<'a, P: Pomdp> BeliefView<'a, P> {
    pub fn new(
        particles: &'a [P::State],
        weights: &'a [Probability],
        sum: Probability,
        depth: usize,
        obs: Option<&'a P::Obs>,
    ) -> Self {
        debug_assert!(particles.len() == weights.len());
        Self {
            particles,
            weights,
            sum,
            depth,
            obs,
        }
    }
    /// A unit-mass view over a single state, for state-conditioned
    /// policies that want to reuse belief-conditioned action sets.
    pub fn singleton(state: &'a P::State) -> Self {
        Self {
            particles: std::slice::from_ref(state),
            weights: &UNIT_WEIGHT,
            sum: 1.0,
            depth: 0,
            obs: None,
        }
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }
    pub fn particles(&self) -> &'a [P::State] {
        self.particles
    }
    pub fn weights(&self) -> &'a [Probability] {
        self.weights
    }
    pub fn weight_sum(&self) -> Probability {
        self.sum
    }
    pub fn weight(&self, i: usize) -> Probability {
        self.weights[i]
    }
    /// Tree depth of the node this belief lives at.
    pub fn depth(&self) -> usize {
        self.depth
    }
    /// The observation that led here, when there is one. This is the
    /// whole observable history a bound estimator gets to see.
    pub fn obs(&self) -> Option<&'a P::Obs> {
        self.obs
    }
    /// Iterate `(particle, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'a P::State, Probability)> {
        self.particles.iter().zip(self.weights.iter().copied())
    }
    /// Draw a particle with probability proportional to its weight.
    pub fn rand(&self, rng: &mut SmallRng) -> &'a P::State {
        let i = draw(self.weights, self.sum, rng);
        &self.particles[i]
    }
    /// Weighted mean of `f` over particles.
    pub fn mean_by(&self, f: impl Fn(&P::State) -> f64) -> f64 {
        if self.sum <= 0.0 {
            return 0.0;
        }
        self.iter().map(|(s, w)| w * f(s)).sum::<f64>() / self.sum
    }
    /// Materialize into owned storage.
    pub fn to_owned(&self) -> WeightedBelief<P::State> {
        WeightedBelief::from_parts_with_sum(self.particles.to_vec(), self.weights.to_vec(), self.sum)
    }
}
