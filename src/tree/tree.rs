use crate::*;
use std::ops::Range;

/// Handle of the root belief node.
pub const ROOT: usize = 0;

/// Sentinel for "no parent" (only ever the root's).
pub const NIL: usize = usize::MAX;

/// The search tree over beliefs and action branches.
///
/// Columns are parallel: entry `b` of every `b-node` vector describes the
/// same belief node, entry `ba` of every `ba_*` vector the same action
/// branch. A b-node's particle weights index into its parent branch's
/// particle vector; the particles themselves are stored once per branch
/// and shared by all observation children. The root's particles live in
/// [`root`](Self::root) because it has no parent branch.
///
/// The tree is built once and reused across decision epochs:
/// [`reset`](Self::reset) zeroes lengths but keeps every allocation.
pub struct Tree<P: Pomdp> {
    // belief node columns
    pub depth: Vec<usize>,
    pub obs: Vec<Option<P::Obs>>,
    pub obs_prob: Vec<Probability>,
    pub weights: Vec<Vec<Probability>>,
    pub l: Vec<Utility>,
    pub u: Vec<Utility>,
    pub children: Vec<Range<usize>>,
    pub parent: Vec<usize>,
    // action branch columns
    pub ba_action: Vec<P::Action>,
    pub ba_r: Vec<Utility>,
    pub ba_particles: Vec<Vec<P::State>>,
    pub ba_l: Vec<Utility>,
    pub ba_u: Vec<Utility>,
    pub ba_children: Vec<Range<usize>>,
    pub ba_parent: Vec<usize>,
    /// the resampled root belief; weights of b-node 0
    pub root: WeightedBelief<P::State>,
}

impl<P: Pomdp> Tree<P> {
    /// An empty tree with room for roughly `num_b` belief nodes.
    pub fn new(num_b: usize) -> Self {
        Self {
            depth: Vec::with_capacity(num_b),
            obs: Vec::with_capacity(num_b),
            obs_prob: Vec::with_capacity(num_b),
            weights: Vec::with_capacity(num_b),
            l: Vec::with_capacity(num_b),
            u: Vec::with_capacity(num_b),
            children: Vec::with_capacity(num_b),
            parent: Vec::with_capacity(num_b),
            ba_action: Vec::new(),
            ba_r: Vec::new(),
            ba_particles: Vec::new(),
            ba_l: Vec::new(),
            ba_u: Vec::new(),
            ba_children: Vec::new(),
            ba_parent: Vec::new(),
            root: WeightedBelief::new(),
        }
    }

    pub fn n_b(&self) -> usize {
        self.depth.len()
    }
    pub fn n_ba(&self) -> usize {
        self.ba_action.len()
    }
    pub fn is_leaf(&self, b: usize) -> bool {
        self.children[b].is_empty()
    }
    pub fn gap(&self, b: usize) -> Utility {
        self.u[b] - self.l[b]
    }
    pub fn root_gap(&self) -> Utility {
        self.gap(ROOT)
    }

    /// Drop all nodes, keep all capacity. The root belief is cleared too;
    /// the next search reseeds it.
    pub fn reset(&mut self) {
        self.depth.clear();
        self.obs.clear();
        self.obs_prob.clear();
        self.weights.clear();
        self.l.clear();
        self.u.clear();
        self.children.clear();
        self.parent.clear();
        self.ba_action.clear();
        self.ba_r.clear();
        self.ba_particles.clear();
        self.ba_l.clear();
        self.ba_u.clear();
        self.ba_children.clear();
        self.ba_parent.clear();
        self.root.clear();
    }

    /// Install the root node. The tree must be empty.
    pub fn seed(&mut self, l: Utility, u: Utility) {
        debug_assert!(self.n_b() == 0 && self.n_ba() == 0);
        self.push_b(0, None, 1.0, Vec::new(), l, u, NIL);
    }

    /// Append a belief node; returns its handle.
    #[allow(clippy::too_many_arguments)]
    pub fn push_b(
        &mut self,
        depth: usize,
        obs: Option<P::Obs>,
        obs_prob: Probability,
        weights: Vec<Probability>,
        l: Utility,
        u: Utility,
        parent: usize,
    ) -> usize {
        let b = self.n_b();
        self.depth.push(depth);
        self.obs.push(obs);
        self.obs_prob.push(obs_prob);
        self.weights.push(weights);
        self.l.push(l);
        self.u.push(u);
        self.children.push(0..0);
        self.parent.push(parent);
        b
    }

    /// Append an action branch; returns its handle.
    #[allow(clippy::too_many_arguments)]
    pub fn push_ba(
        &mut self,
        action: P::Action,
        r: Utility,
        particles: Vec<P::State>,
        l: Utility,
        u: Utility,
        parent: usize,
    ) -> usize {
        let ba = self.n_ba();
        self.ba_action.push(action);
        self.ba_r.push(r);
        self.ba_particles.push(particles);
        self.ba_l.push(l);
        self.ba_u.push(u);
        self.ba_children.push(0..0);
        self.ba_parent.push(parent);
        ba
    }

    /// The child branch of `b` with the greatest upper bound.
    pub fn best_upper_branch(&self, b: usize) -> Option<usize> {
        self.children[b]
            .clone()
            .max_by(|x, y| self.ba_u[*x].partial_cmp(&self.ba_u[*y]).expect("finite bound"))
    }

    /// The greatest lower bound among `b`'s child branches.
    pub fn best_lower(&self, b: usize) -> Option<Utility> {
        self.children[b]
            .clone()
            .map(|ba| self.ba_l[ba])
            .max_by(|x, y| x.partial_cmp(y).expect("finite bound"))
    }
}

impl<P: Pomdp> std::fmt::Display for Tree<P>
where
    P::Action: std::fmt::Debug,
    P::Obs: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.n_b() == 0 {
            return writeln!(f, "(empty tree)");
        }
        writeln!(
            f,
            "\nROOT   [{:+.3}, {:+.3}]  ({} particles)",
            self.l[ROOT],
            self.u[ROOT],
            self.root.n_particles()
        )?;
        self.show(f, ROOT, "")
    }
}

impl<P: Pomdp> Tree<P>
where
    P::Action: std::fmt::Debug,
    P::Obs: std::fmt::Debug,
{
    /// display a subtree in a human-readable format
    /// be careful because it can be really big and recursive
    fn show(&self, f: &mut std::fmt::Formatter<'_>, b: usize, prefix: &str) -> std::fmt::Result {
        let branches = self.children[b].clone().collect::<Vec<_>>();
        let n = branches.len();
        for (i, ba) in branches.into_iter().enumerate() {
            let last = i == n - 1;
            let gaps = if last { "    " } else { "│   " };
            let stem = if last { "└" } else { "├" };
            writeln!(
                f,
                "{}{}──{:?}  r̄ {:+.3}  [{:+.3}, {:+.3}]",
                prefix, stem, self.ba_action[ba], self.ba_r[ba], self.ba_l[ba], self.ba_u[ba],
            )?;
            let inner = format!("{}{}", prefix, gaps);
            let kids = self.ba_children[ba].clone().collect::<Vec<_>>();
            let m = kids.len();
            for (j, child) in kids.into_iter().enumerate() {
                let last_kid = j == m - 1;
                let kid_gaps = if last_kid { "    " } else { "│   " };
                let kid_stem = if last_kid { "└" } else { "├" };
                writeln!(
                    f,
                    "{}{}──{:?}  p {:.3}  [{:+.3}, {:+.3}]",
                    inner,
                    kid_stem,
                    self.obs[child].as_ref().expect("non-root has an observation"),
                    self.obs_prob[child],
                    self.l[child],
                    self.u[child],
                )?;
                self.show(f, child, &format!("{}{}", inner, kid_gaps))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worlds::*;

    fn toy() -> Tree<BabyPomdp> {
        let mut tree = Tree::new(8);
        tree.seed(-10.0, 0.0);
        let ba = tree.push_ba(BabyAction { feed: true }, -5.0, Vec::new(), -6.0, -1.0, ROOT);
        let b = tree.push_b(
            1,
            Some(BabyObs { crying: false }),
            1.0,
            Vec::new(),
            -6.0,
            -1.0,
            ba,
        );
        tree.ba_children[ba] = b..b + 1;
        tree.children[ROOT] = ba..ba + 1;
        tree
    }

    #[test]
    fn handles_are_stable_and_linked() {
        let tree = toy();
        assert_eq!(tree.n_b(), 2);
        assert_eq!(tree.n_ba(), 1);
        assert_eq!(tree.parent[1], 0);
        assert_eq!(tree.ba_parent[0], ROOT);
        assert!(!tree.is_leaf(ROOT));
        assert!(tree.is_leaf(1));
        assert_eq!(tree.best_upper_branch(ROOT), Some(0));
        assert_eq!(tree.best_lower(ROOT), Some(-6.0));
    }

    #[test]
    fn reset_retains_capacity() {
        let mut tree = toy();
        let cap = tree.depth.capacity();
        tree.reset();
        assert_eq!(tree.n_b(), 0);
        assert_eq!(tree.n_ba(), 0);
        assert_eq!(tree.root.n_particles(), 0);
        assert!(tree.depth.capacity() >= cap);
        tree.seed(-1.0, 1.0);
        assert_eq!(tree.n_b(), 1);
        assert_eq!(tree.root_gap(), 2.0);
    }
}
