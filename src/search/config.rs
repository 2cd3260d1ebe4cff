use crate::*;
use anyhow::Result;
use anyhow::ensure;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Numeric search parameters, shared by [`Solver`] and [`Planner`].
#[derive(Debug, Clone)]
pub struct Params {
    /// terminate once the root gap falls to this
    pub epsilon_0: Utility,
    /// excess-uncertainty fraction governing descent tolerance, `(0, 1]`
    pub xi: Utility,
    /// wall-clock budget per decision, seconds
    pub t_max: f64,
    /// warn when elapsed exceeds `t_max` by this fraction
    pub overtime_warning_threshold: f64,
    /// trial cap per decision
    pub max_trials: usize,
    /// tree depth cap
    pub max_depth: usize,
    /// L1 observation packing radius
    pub delta: f64,
    /// particle count floor per belief
    pub m_min: usize,
    /// particle count ceiling per belief
    pub m_max: usize,
    /// KLD confidence complement, `(0, 1)`
    pub zeta: f64,
    /// design-effect threshold for in-tree resampling
    pub deff_thres: f64,
    /// belief-node arena size hint
    pub num_b: usize,
    /// hand the materialized tree back in the result info
    pub tree_in_info: bool,
    /// emit diagnostics on bound inconsistencies
    pub bounds_warnings: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            epsilon_0: EPSILON_0,
            xi: XI,
            t_max: T_MAX,
            overtime_warning_threshold: OVERTIME_WARNING_THRESHOLD,
            max_trials: MAX_TRIALS,
            max_depth: MAX_DEPTH,
            delta: DELTA,
            m_min: M_MIN,
            m_max: M_MAX,
            zeta: ZETA,
            deff_thres: DEFF_THRES,
            num_b: NUM_B,
            tree_in_info: false,
            bounds_warnings: true,
        }
    }
}

/// What to answer when a search fails outright.
pub enum DefaultAction<P: Pomdp> {
    /// always this action
    Constant(P::Action),
    /// ask a callback, which also sees what went wrong
    Policy(Box<dyn Fn(&P, &anyhow::Error) -> P::Action>),
}

/// Planner configuration. Build one around a bound pair, chain the knobs
/// you care about, then [`solve`](Self::solve) it against a model.
///
/// ```ignore
/// let planner = Solver::new(IndependentBounds::new(-20.0, 0.0))
///     .with_t_max(0.5)
///     .with_seed(42)
///     .solve(TigerPomdp::default())?;
/// ```
pub struct Solver<P: Pomdp, L, U> {
    params: Params,
    bounds: IndependentBounds<L, U>,
    grid: Option<Box<dyn StateGrid<P::State>>>,
    default_action: Option<DefaultAction<P>>,
    rng: SmallRng,
}

impl<P: Pomdp, L, U> Solver<P, L, U> {
    pub fn new(bounds: IndependentBounds<L, U>) -> Self {
        Self {
            params: Params::default(),
            bounds,
            grid: None,
            default_action: None,
            rng: SmallRng::from_os_rng(),
        }
    }

    pub fn with_epsilon_0(mut self, v: Utility) -> Self {
        self.params.epsilon_0 = v;
        self
    }
    pub fn with_xi(mut self, v: Utility) -> Self {
        self.params.xi = v;
        self
    }
    pub fn with_t_max(mut self, seconds: f64) -> Self {
        self.params.t_max = seconds;
        self
    }
    pub fn with_overtime_warning_threshold(mut self, v: f64) -> Self {
        self.params.overtime_warning_threshold = v;
        self
    }
    pub fn with_max_trials(mut self, v: usize) -> Self {
        self.params.max_trials = v;
        self
    }
    pub fn with_max_depth(mut self, v: usize) -> Self {
        self.params.max_depth = v;
        self
    }
    pub fn with_delta(mut self, v: f64) -> Self {
        self.params.delta = v;
        self
    }
    pub fn with_particles(mut self, m_min: usize, m_max: usize) -> Self {
        self.params.m_min = m_min;
        self.params.m_max = m_max;
        self
    }
    pub fn with_zeta(mut self, v: f64) -> Self {
        self.params.zeta = v;
        self
    }
    pub fn with_deff_thres(mut self, v: f64) -> Self {
        self.params.deff_thres = v;
        self
    }
    pub fn with_num_b(mut self, v: usize) -> Self {
        self.params.num_b = v;
        self
    }
    pub fn with_tree_in_info(mut self, v: bool) -> Self {
        self.params.tree_in_info = v;
        self
    }
    pub fn with_bounds_warnings(mut self, v: bool) -> Self {
        self.params.bounds_warnings = v;
        self
    }
    pub fn with_grid(mut self, grid: impl StateGrid<P::State> + 'static) -> Self {
        self.grid = Some(Box::new(grid));
        self
    }
    pub fn with_default_action(mut self, action: DefaultAction<P>) -> Self {
        self.default_action = Some(action);
        self
    }
    pub fn with_rng(mut self, rng: SmallRng) -> Self {
        self.rng = rng;
        self
    }
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(SmallRng::seed_from_u64(seed))
    }

    /// Validate the configuration and resolve it against a model.
    pub fn solve(mut self, pomdp: P) -> Result<Planner<P, L::Solved, U::Solved>>
    where
        L: BoundSpec<P>,
        U: BoundSpec<P>,
    {
        let ref p = self.params;
        ensure!(p.m_min >= 1, "m_min must be at least 1");
        ensure!(
            p.m_min <= p.m_max,
            "m_min {} exceeds m_max {}",
            p.m_min,
            p.m_max
        );
        ensure!(p.xi > 0.0 && p.xi <= 1.0, "xi must lie in (0, 1]");
        ensure!(p.zeta > 0.0 && p.zeta < 1.0, "zeta must lie in (0, 1)");
        ensure!(p.delta >= 0.0, "packing radius must be nonnegative");
        ensure!(p.t_max > 0.0, "time budget must be positive");
        ensure!(p.max_depth >= 1, "max_depth must be at least 1");
        ensure!(p.deff_thres > 0.0, "design-effect threshold must be positive");
        let gamma = pomdp.discount();
        ensure!(
            gamma > 0.0 && gamma <= 1.0,
            "discount {} outside (0, 1]",
            gamma
        );
        self.bounds.validate::<P>()?;
        let bounds = self.bounds.solve(
            &pomdp,
            self.params.m_max,
            self.params.max_depth,
            self.params.bounds_warnings,
            &mut self.rng,
        );
        Ok(Planner::new(
            pomdp,
            self.params,
            bounds,
            self.grid,
            self.default_action,
            self.rng,
        ))
    }
}
