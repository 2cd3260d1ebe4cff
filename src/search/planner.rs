use crate::*;
use anyhow::Result;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::time::Duration;

/// The online planner for one model: resolved bounds, the reusable tree,
/// and every scratch buffer the expansion pipeline touches. Built once
/// via [`Solver::solve`]; [`plan`](Self::plan) is then called with the
/// current belief at every decision epoch.
pub struct Planner<P: Pomdp, L, U> {
    pub(crate) pomdp: P,
    pub(crate) params: Params,
    pub(crate) bounds: SolvedBounds<L, U>,
    pub(crate) grid: Option<Box<dyn StateGrid<P::State>>>,
    pub(crate) default_action: Option<DefaultAction<P>>,
    pub(crate) rng: SmallRng,
    pub(crate) tree: Tree<P>,
    /// in-tree stratified resample buffer
    pub(crate) mat: WeightedBelief<P::State>,
    /// terminal-zeroed copy of a node's weights
    pub(crate) zeroed: Vec<Probability>,
    /// grid occupancy scratch for the KLD rule
    pub(crate) counts: Vec<u32>,
    pub(crate) scratch: Scratch<P>,
}

/// What a decision epoch reports besides the action.
pub struct SearchInfo<P: Pomdp> {
    /// depth reached by each trial, in order
    pub depths: Vec<usize>,
    /// trials executed
    pub trials: usize,
    /// wall clock consumed
    pub elapsed: Duration,
    /// the materialized tree, when `tree_in_info` was requested
    pub tree: Option<Tree<P>>,
}

impl<P: Pomdp> SearchInfo<P> {
    pub(crate) fn empty() -> Self {
        Self {
            depths: Vec::new(),
            trials: 0,
            elapsed: Duration::ZERO,
            tree: None,
        }
    }
}

impl<P: Pomdp, L, U> Planner<P, L, U> {
    pub(crate) fn new(
        pomdp: P,
        params: Params,
        bounds: SolvedBounds<L, U>,
        grid: Option<Box<dyn StateGrid<P::State>>>,
        default_action: Option<DefaultAction<P>>,
        rng: SmallRng,
    ) -> Self {
        let num_b = params.num_b;
        let m_max = params.m_max;
        Self {
            pomdp,
            params,
            bounds,
            grid,
            default_action,
            rng,
            tree: Tree::new(num_b),
            mat: WeightedBelief::new(),
            zeroed: Vec::with_capacity(m_max),
            counts: Vec::new(),
            scratch: Scratch::new(m_max),
        }
    }

    /// The model this planner was solved against.
    pub fn pomdp(&self) -> &P {
        &self.pomdp
    }

    /// Plan one decision from the given root belief.
    ///
    /// A failed search (no nonterminal root support, non-finite root
    /// bounds) falls back to the configured default action; without one
    /// the error propagates.
    pub fn plan<B: SampleBelief<P::State>>(
        &mut self,
        belief: &B,
    ) -> Result<(P::Action, SearchInfo<P>)>
    where
        L: Estimator<P>,
        U: Estimator<P>,
    {
        match self.build(belief) {
            Ok(result) => Ok(result),
            Err(error) => match &self.default_action {
                Some(DefaultAction::Constant(action)) => {
                    log::warn!("search failed, taking the default action: {:#}", error);
                    Ok((action.clone(), SearchInfo::empty()))
                }
                Some(DefaultAction::Policy(policy)) => {
                    log::warn!("search failed, deferring to the default policy: {:#}", error);
                    Ok((policy(&self.pomdp, &error), SearchInfo::empty()))
                }
                None => Err(error),
            },
        }
    }
}

/// Expansion scratch, cleared (lengths only) at the start of every
/// action-branch expansion. The pooled `ws`/`norm` outer vectors never
/// shrink; `packed_obs.len()` is the live child count.
pub(crate) struct Scratch<P: Pomdp> {
    /// dense index of raw observations seen this branch
    pub obs: Vec<P::Obs>,
    /// per raw observation: total mass of generating particles
    pub obs_w: Vec<Probability>,
    pub obs_map: HashMap<P::Obs, usize>,
    /// candidate reweighting over the comparison prefix
    pub cand: Vec<Probability>,
    pub cand_norm: Vec<Probability>,
    /// accepted reweightings, one per packed observation
    pub ws: Vec<Vec<Probability>>,
    /// their L1-normalized prefixes, kept for merge tests
    pub norm: Vec<Vec<Probability>>,
    pub packed_obs: Vec<P::Obs>,
    pub packed_w: Vec<Probability>,
    /// child bound outputs
    pub l: Vec<Utility>,
    pub u: Vec<Utility>,
}

impl<P: Pomdp> Scratch<P> {
    pub fn new(m_max: usize) -> Self {
        Self {
            obs: Vec::new(),
            obs_w: Vec::new(),
            obs_map: HashMap::new(),
            cand: Vec::with_capacity(m_max),
            cand_norm: Vec::with_capacity(m_max),
            ws: Vec::new(),
            norm: Vec::new(),
            packed_obs: Vec::new(),
            packed_w: Vec::new(),
            l: Vec::new(),
            u: Vec::new(),
        }
    }
    /// Zero lengths, keep capacity.
    pub fn empty_buffers(&mut self) {
        self.obs.clear();
        self.obs_w.clear();
        self.obs_map.clear();
        self.cand.clear();
        self.cand_norm.clear();
        self.packed_obs.clear();
        self.packed_w.clear();
        self.l.clear();
        self.u.clear();
        // ws/norm inner buffers are recycled lazily on acceptance
    }
}
