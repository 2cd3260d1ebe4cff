use crate::*;

impl<P: Pomdp, L, U> Planner<P, L, U> {
    /// Apply a leaf's bound deltas and carry them to the root.
    ///
    /// Upper bounds propagate unconditionally: each ancestor branch
    /// absorbs `γ·p_obs·Δu`, and the ancestor belief takes the max over
    /// its branches. Lower bounds propagate monotonically: a branch
    /// update only travels further while it still raises its parent.
    /// Returns whether any ancestor's best branch changed along the way.
    pub(crate) fn backup(&mut self, leaf: usize, mut dl: Utility, mut du: Utility) -> bool {
        let gamma = self.pomdp.discount();
        let tree = &mut self.tree;
        tree.l[leaf] += dl;
        tree.u[leaf] += du;
        let mut relabeled = false;
        let mut b = leaf;
        while b != ROOT {
            let ba = tree.parent[b];
            let bp = tree.ba_parent[ba];
            let scale = gamma * tree.obs_prob[b];
            let before = tree.best_upper_branch(bp);
            tree.ba_u[ba] += scale * du;
            let after = tree.best_upper_branch(bp).expect("non-leaf ancestor");
            relabeled |= before != Some(after);
            let largest = tree.ba_u[after];
            du = largest - tree.u[bp];
            tree.u[bp] = largest;
            if dl != 0.0 {
                tree.ba_l[ba] += scale * dl;
                if tree.ba_l[ba] > tree.l[bp] {
                    dl = tree.ba_l[ba] - tree.l[bp];
                    tree.l[bp] = tree.ba_l[ba];
                } else {
                    dl = 0.0;
                }
            }
            b = bp;
        }
        relabeled
    }

    /// Next-best descent step from a non-leaf node: the branch with the
    /// greatest upper bound, then its child with the greatest excess
    /// uncertainty
    /// `p_obs · (u − l − ξ · max(gap_root, 0) / γ^Δ)`.
    /// `None` once every child's gap sits under the depth-scaled
    /// tolerance — the trial has nothing left to learn here.
    pub(crate) fn next_best(&self, b: usize) -> Option<usize> {
        let tree = &self.tree;
        let ba = tree.best_upper_branch(b)?;
        let gap_root = tree.root_gap().max(0.0);
        let gamma = self.pomdp.discount();
        let mut best = None;
        let mut best_eu = 0.0;
        for child in tree.ba_children[ba].clone() {
            let tolerated = self.params.xi * gap_root / gamma.powi(tree.depth[child] as i32);
            let eu = tree.obs_prob[child] * (tree.gap(child) - tolerated);
            if eu > best_eu {
                best_eu = eu;
                best = Some(child);
            }
        }
        best
    }
}
