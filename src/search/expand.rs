use crate::*;

impl<P, L, U> Planner<P, L, U>
where
    P: Pomdp,
    L: Estimator<P>,
    U: Estimator<P>,
{
    /// Expand a leaf belief node in place.
    ///
    /// Materializes the node's belief (resampling it when degenerate),
    /// then for every applicable action: propagates particles through the
    /// generative model, packs raw observations whose normalized
    /// posteriors sit within the L1 radius of an accepted one, and
    /// initializes child bounds with one vectorized estimator call per
    /// branch. Returns the deltas `(Δl, Δu)` the backup pass applies to
    /// this node.
    pub(crate) fn expand(&mut self, b: usize) -> (Utility, Utility) {
        let depth = self.tree.depth[b];
        let cur_obs = self.tree.obs[b].clone();
        let parent_ba = self.tree.parent[b];

        // belief materialization: take the backing particle storage out
        // of the tree for the duration of the expansion
        let mut taken_root: Option<WeightedBelief<P::State>> = None;
        let mut taken: Option<Vec<P::State>> = None;
        let mut use_resampled = false;
        if b == ROOT {
            taken_root = Some(std::mem::take(&mut self.tree.root));
        } else {
            let particles = std::mem::take(&mut self.tree.ba_particles[parent_ba]);
            self.zeroed.clear();
            for (s, w) in particles.iter().zip(self.tree.weights[b].iter()) {
                self.zeroed
                    .push(if self.pomdp.is_terminal(s) { 0.0 } else { *w });
            }
            let sum: Probability = self.zeroed.iter().sum();
            if sum <= 0.0 {
                // dead leaf: nothing nonterminal left, collapse to zero
                self.tree.ba_particles[parent_ba] = particles;
                return (-self.tree.l[b], -self.tree.u[b]);
            }
            let sq: Probability = self.zeroed.iter().map(|w| w * w).sum();
            let deff = particles.len() as f64 * sq / (sum * sum);
            if deff > self.params.deff_thres {
                resample_weighted(
                    &mut self.mat,
                    &particles,
                    &self.zeroed,
                    sum,
                    self.grid.as_deref(),
                    &mut self.counts,
                    self.params.m_min,
                    self.params.m_max,
                    self.params.zeta,
                    &mut self.rng,
                );
                use_resampled = true;
            }
            taken = Some(particles);
        }
        let (particles, weights): (&[P::State], &[Probability]) =
            match (&taken_root, &taken, use_resampled) {
                (Some(root), _, _) => (root.particles(), root.weights()),
                (None, _, true) => (self.mat.particles(), self.mat.weights()),
                (None, Some(p), false) => (p.as_slice(), self.zeroed.as_slice()),
                (None, None, false) => unreachable!(),
            };
        let wsum: Probability = weights.iter().sum();
        let n = particles.len();
        debug_assert!(wsum > 0.0);

        let view = BeliefView::<P>::new(particles, weights, wsum, depth, cur_obs.as_ref());
        let actions = self.pomdp.actions(&view);
        if actions.is_empty() {
            if let Some(root) = taken_root {
                self.tree.root = root;
            }
            if let Some(p) = taken {
                self.tree.ba_particles[parent_ba] = p;
            }
            return (-self.tree.l[b], -self.tree.u[b]);
        }

        let ba_start = self.tree.n_ba();
        let gamma = self.pomdp.discount();
        let prefix = self.params.m_min.min(n);
        for action in actions {
            self.scratch.empty_buffers();

            // particle propagation
            let mut next: Vec<P::State> = Vec::with_capacity(n);
            let mut rsum = 0.0;
            for (s, w) in particles.iter().zip(weights.iter().copied()) {
                if w > 0.0 {
                    let step = self.pomdp.step(s, &action, &mut self.rng);
                    rsum += w * step.reward;
                    let raw = match self.scratch.obs_map.get(&step.obs) {
                        Some(raw) => *raw,
                        None => {
                            let raw = self.scratch.obs.len();
                            self.scratch.obs_map.insert(step.obs.clone(), raw);
                            self.scratch.obs.push(step.obs);
                            self.scratch.obs_w.push(0.0);
                            raw
                        }
                    };
                    self.scratch.obs_w[raw] += w;
                    next.push(step.state);
                } else {
                    // terminal particles ride along with zero weight
                    next.push(s.clone());
                }
            }

            // observation packing over the comparison prefix
            for raw in 0..self.scratch.obs.len() {
                let mass = self.scratch.obs_w[raw];
                self.scratch.cand.clear();
                for j in 0..prefix {
                    let w = weights[j];
                    self.scratch.cand.push(match w > 0.0 {
                        true => {
                            w * self
                                .pomdp
                                .obs_density(&action, &next[j], &self.scratch.obs[raw])
                        }
                        false => 0.0,
                    });
                }
                let csum: Probability = self.scratch.cand.iter().sum();
                self.scratch.cand_norm.clear();
                match csum > 0.0 {
                    true => self
                        .scratch
                        .cand_norm
                        .extend(self.scratch.cand.iter().map(|w| w / csum)),
                    false => self
                        .scratch
                        .cand_norm
                        .extend(std::iter::repeat(0.0).take(prefix)),
                }
                let merged = (0..self.scratch.packed_obs.len()).find(|i| {
                    let dist: f64 = self
                        .scratch
                        .cand_norm
                        .iter()
                        .zip(self.scratch.norm[*i].iter())
                        .map(|(a, b)| (a - b).abs())
                        .sum();
                    dist <= self.params.delta
                });
                match merged {
                    Some(i) => self.scratch.packed_w[i] += mass,
                    None => {
                        let i = self.scratch.packed_obs.len();
                        if self.scratch.ws.len() == i {
                            self.scratch.ws.push(Vec::new());
                            self.scratch.norm.push(Vec::new());
                        }
                        self.scratch.ws[i].clear();
                        self.scratch.ws[i].extend_from_slice(&self.scratch.cand);
                        self.scratch.norm[i].clear();
                        self.scratch.norm[i].extend_from_slice(&self.scratch.cand_norm);
                        self.scratch.packed_obs.push(self.scratch.obs[raw].clone());
                        self.scratch.packed_w.push(mass);
                    }
                }
            }

            // finish reweighting past the prefix, accepted branches only
            let packed = self.scratch.packed_obs.len();
            for i in 0..packed {
                for j in prefix..n {
                    let w = weights[j];
                    self.scratch.ws[i].push(match w > 0.0 {
                        true => {
                            w * self.pomdp.obs_density(
                                &action,
                                &next[j],
                                &self.scratch.packed_obs[i],
                            )
                        }
                        false => 0.0,
                    });
                }
            }

            // child bound initialization, one vectorized call per branch
            let views = (0..packed)
                .map(|i| {
                    BeliefView::<P>::new(
                        &next,
                        &self.scratch.ws[i],
                        self.scratch.ws[i].iter().sum(),
                        depth + 1,
                        Some(&self.scratch.packed_obs[i]),
                    )
                })
                .collect::<Vec<_>>();
            self.bounds.bound_batch(
                &self.pomdp,
                &views,
                self.params.max_depth,
                &mut self.scratch.l,
                &mut self.scratch.u,
            );
            drop(views);

            // action-branch bounds from the packed children
            let psum: Probability = self.scratch.packed_w.iter().sum();
            debug_assert!((psum - wsum).abs() <= 1e-9 * wsum.max(1.0));
            let rbar = rsum / wsum;
            let mut ba_l = 0.0;
            let mut ba_u = 0.0;
            for i in 0..packed {
                let p = self.scratch.packed_w[i] / psum;
                ba_l += p * self.scratch.l[i];
                ba_u += p * self.scratch.u[i];
            }
            let ba_l = rbar + gamma * ba_l;
            let ba_u = rbar + gamma * ba_u;
            let ba = self.tree.push_ba(action, rbar, next, ba_l, ba_u, b);

            let b_start = self.tree.n_b();
            for i in 0..packed {
                self.tree.push_b(
                    depth + 1,
                    Some(self.scratch.packed_obs[i].clone()),
                    self.scratch.packed_w[i] / psum,
                    self.scratch.ws[i].clone(),
                    self.scratch.l[i],
                    self.scratch.u[i],
                    ba,
                );
            }
            self.tree.ba_children[ba] = b_start..self.tree.n_b();
        }
        self.tree.children[b] = ba_start..self.tree.n_ba();

        // restore the particle storage the expansion borrowed
        if let Some(root) = taken_root {
            self.tree.root = root;
        }
        if let Some(p) = taken {
            self.tree.ba_particles[parent_ba] = p;
        }

        let best_l = self.tree.best_lower(b).expect("freshly expanded children");
        let best_u = self
            .tree
            .children[b]
            .clone()
            .map(|ba| self.tree.ba_u[ba])
            .max_by(|x, y| x.partial_cmp(y).expect("finite bound"))
            .expect("freshly expanded children");
        (best_l - self.tree.l[b], best_u - self.tree.u[b])
    }
}

#[cfg(test)]
mod tests {
    use crate::worlds::*;
    use crate::*;

    fn one_expansion() -> Tree<BabyPomdp> {
        let mut planner = Solver::new(IndependentBounds::new(-150.0, 0.0))
            .with_max_trials(1)
            .with_t_max(5.0)
            .with_max_depth(10)
            .with_particles(30, 60)
            .with_tree_in_info(true)
            .with_seed(5)
            .solve(BabyPomdp::default())
            .expect("valid configuration");
        let (_, info) = planner.plan(&BabyPomdp::belief(0.5)).expect("search succeeds");
        info.tree.expect("tree was requested")
    }

    #[test]
    fn one_branch_per_action_with_packed_children() {
        let tree = one_expansion();
        assert_eq!(tree.children[ROOT].len(), 2);
        for ba in tree.children[ROOT].clone() {
            let kids = tree.ba_children[ba].len();
            assert!((1..=2).contains(&kids), "{} observation children", kids);
        }
    }

    #[test]
    fn observation_probabilities_sum_to_one() {
        let tree = one_expansion();
        for ba in 0..tree.n_ba() {
            let total: f64 = tree.ba_children[ba]
                .clone()
                .map(|b| tree.obs_prob[b])
                .sum();
            assert!((total - 1.0).abs() < 1e-12, "branch {} sums to {}", ba, total);
        }
    }

    #[test]
    fn branch_bounds_match_their_children() {
        let tree = one_expansion();
        let gamma = BabyPomdp::default().discount;
        for ba in 0..tree.n_ba() {
            let l: f64 = tree.ba_children[ba]
                .clone()
                .map(|b| tree.obs_prob[b] * tree.l[b])
                .sum();
            let u: f64 = tree.ba_children[ba]
                .clone()
                .map(|b| tree.obs_prob[b] * tree.u[b])
                .sum();
            assert!((tree.ba_l[ba] - (tree.ba_r[ba] + gamma * l)).abs() < 1e-9);
            assert!((tree.ba_u[ba] - (tree.ba_r[ba] + gamma * u)).abs() < 1e-9);
        }
    }

    #[test]
    fn bounds_stay_ordered_everywhere() {
        let tree = one_expansion();
        for b in 0..tree.n_b() {
            assert!(tree.l[b] <= tree.u[b] + 1e-9, "node {} inverted", b);
        }
    }

    #[test]
    fn terminal_belief_collapses_to_zero_bounds() {
        let mut planner = Solver::new(IndependentBounds::new(-100.0, 100.0))
            .with_seed(0)
            .solve(LightDark::default())
            .expect("valid configuration");
        planner.tree.seed(-100.0, 100.0);
        let done = vec![
            LdState { y: 0.0, done: true },
            LdState { y: 1.0, done: true },
        ];
        let ba = planner.tree.push_ba(0, 0.0, done, -100.0, 100.0, ROOT);
        let b = planner
            .tree
            .push_b(1, Some(0), 1.0, vec![0.5, 0.5], -7.0, 3.0, ba);
        planner.tree.ba_children[ba] = b..b + 1;
        planner.tree.children[ROOT] = ba..ba + 1;
        let (dl, du) = planner.expand(b);
        assert_eq!((dl, du), (7.0, -3.0));
        assert!(planner.tree.is_leaf(b));
    }
}
