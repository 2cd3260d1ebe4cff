use crate::*;
use rand::rngs::SmallRng;

/// A user callback as a bound estimator. The callback sees the model and
/// the belief (depth and incoming observation included) and returns the
/// estimate directly; it is already its own solved form.
#[derive(Debug, Clone, Copy)]
pub struct ByFunction<F>(pub F);

impl<P, F> Estimator<P> for ByFunction<F>
where
    P: Pomdp,
    F: Fn(&P, &BeliefView<'_, P>) -> Utility,
{
    fn bound(&mut self, pomdp: &P, belief: &BeliefView<'_, P>, _: usize) -> Utility {
        (self.0)(pomdp, belief)
    }
}

impl<P, F> BoundSpec<P> for ByFunction<F>
where
    P: Pomdp,
    F: Fn(&P, &BeliefView<'_, P>) -> Utility,
{
    type Solved = Self;
    fn solve(self, _: &P, _: usize, _: usize, _: &mut SmallRng) -> Self::Solved {
        self
    }
}
