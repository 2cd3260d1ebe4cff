use crate::*;
use rand::rngs::SmallRng;

/// A lower and an upper estimator evaluated independently.
///
/// Independent estimators can disagree by estimation noise alone. An
/// inversion within `consistency_fix_thresh` is silently repaired by
/// pulling the upper bound up to the lower; anything past the window is a
/// genuine estimator bug and gets a diagnostic instead.
#[derive(Debug, Clone, Copy)]
pub struct IndependentBounds<L, U> {
    pub lower: L,
    pub upper: U,
    pub consistency_fix_thresh: Utility,
}

impl<L, U> IndependentBounds<L, U> {
    pub fn new(lower: L, upper: U) -> Self {
        Self {
            lower,
            upper,
            consistency_fix_thresh: 0.0,
        }
    }
    pub fn with_fix_thresh(mut self, thresh: Utility) -> Self {
        self.consistency_fix_thresh = thresh;
        self
    }

    pub(crate) fn validate<P: Pomdp>(&self) -> anyhow::Result<()>
    where
        L: BoundSpec<P>,
        U: BoundSpec<P>,
    {
        self.lower.validate()?;
        self.upper.validate()?;
        Ok(())
    }

    pub(crate) fn solve<P: Pomdp>(
        self,
        pomdp: &P,
        m_max: usize,
        max_depth: usize,
        warnings: bool,
        rng: &mut SmallRng,
    ) -> SolvedBounds<L::Solved, U::Solved>
    where
        L: BoundSpec<P>,
        U: BoundSpec<P>,
    {
        SolvedBounds {
            lower: self.lower.solve(pomdp, m_max, max_depth, rng),
            upper: self.upper.solve(pomdp, m_max, max_depth, rng),
            fix: self.consistency_fix_thresh,
            warnings,
        }
    }
}

/// The resolved bound pair the planner actually evaluates.
pub struct SolvedBounds<L, U> {
    lower: L,
    upper: U,
    fix: Utility,
    warnings: bool,
}

impl<L, U> SolvedBounds<L, U> {
    pub fn bound<P: Pomdp>(
        &mut self,
        pomdp: &P,
        belief: &BeliefView<'_, P>,
        max_depth: usize,
    ) -> (Utility, Utility)
    where
        L: Estimator<P>,
        U: Estimator<P>,
    {
        let l = self.lower.bound(pomdp, belief, max_depth);
        let mut u = self.upper.bound(pomdp, belief, max_depth);
        self.sanitize(l, &mut u);
        (l, u)
    }

    pub fn bound_batch<P: Pomdp>(
        &mut self,
        pomdp: &P,
        siblings: &[BeliefView<'_, P>],
        max_depth: usize,
        l_out: &mut Vec<Utility>,
        u_out: &mut Vec<Utility>,
    ) where
        L: Estimator<P>,
        U: Estimator<P>,
    {
        l_out.clear();
        u_out.clear();
        self.lower.bound_batch(pomdp, siblings, max_depth, l_out);
        self.upper.bound_batch(pomdp, siblings, max_depth, u_out);
        debug_assert!(l_out.len() == siblings.len() && u_out.len() == siblings.len());
        for (l, u) in l_out.iter().zip(u_out.iter_mut()) {
            self.sanitize(*l, u);
        }
    }

    fn sanitize(&self, l: Utility, u: &mut Utility) {
        if self.warnings && (!l.is_finite() || !u.is_finite()) {
            log::warn!("non-finite bound estimate (l = {}, u = {})", l, u);
        }
        if *u < l {
            if *u >= l - self.fix {
                *u = l;
            } else if self.warnings {
                log::warn!(
                    "lower bound {} above upper bound {} beyond tolerance {}",
                    l,
                    u,
                    self.fix
                );
            }
        }
    }
}
