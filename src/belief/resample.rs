use crate::*;
use anyhow::Result;
use anyhow::bail;
use rand::Rng;
use rand::rngs::SmallRng;

/// Cap on consecutive rejected (terminal) draws before the source
/// distribution is declared empty of nonterminal support.
const REJECTION_LIMIT: usize = 10_000;

/// Adaptive iid resample from a root distribution into `out`.
///
/// Without a grid the sample size is exactly `m_max`. With one, draws
/// accumulate starting from a target of `m_min`; each time the target is
/// reached the occupied-bin count `k` updates the target to
/// `min(m_max, ⌈KLD(k, ζ)⌉)`, so the final size lands in `[m_min, m_max]`
/// and grows with the dispersion of the sampled states. Terminal draws
/// are rejected and redrawn. Output particles carry unit weight.
pub fn resample_root<S: Clone>(
    out: &mut WeightedBelief<S>,
    src: &impl SampleBelief<S>,
    terminal: impl Fn(&S) -> bool,
    grid: Option<&dyn StateGrid<S>>,
    counts: &mut Vec<u32>,
    m_min: usize,
    m_max: usize,
    zeta: f64,
    rng: &mut SmallRng,
) -> Result<()> {
    out.clear();
    let mut rejected = 0;
    let mut next = |rng: &mut SmallRng| -> Result<S> {
        loop {
            let s = src.sample_state(rng);
            if !terminal(&s) {
                return Ok(s);
            }
            rejected += 1;
            if rejected > REJECTION_LIMIT {
                bail!("root belief has no nonterminal support");
            }
        }
    };
    match grid {
        None => {
            for _ in 0..m_max {
                let s = next(rng)?;
                out.push(s, 1.0);
            }
        }
        Some(grid) => {
            counts.clear();
            counts.resize(grid.len(), 0);
            let mut k = 0;
            let mut m = m_min.max(1).min(m_max);
            loop {
                while out.n_particles() < m {
                    let s = next(rng)?;
                    k += grid.access(counts, &s);
                    out.push(s, 1.0);
                }
                let target = (kld_sample_size(k, zeta).ceil() as usize)
                    .max(m_min)
                    .min(m_max);
                if target <= out.n_particles() {
                    break;
                }
                m = target;
            }
        }
    }
    Ok(())
}

/// Stratified resample of an existing weighted belief into `out`.
///
/// The KLD target is computed from the occupied bins of the source's
/// positive-weight particles and clamped into `[m_min, m_max]` before a
/// single stratified draw; without a grid the size is `m_max`. The total
/// weight of the source is preserved, spread uniformly over the output.
pub fn resample_weighted<S: Clone>(
    out: &mut WeightedBelief<S>,
    particles: &[S],
    weights: &[Probability],
    sum: Probability,
    grid: Option<&dyn StateGrid<S>>,
    counts: &mut Vec<u32>,
    m_min: usize,
    m_max: usize,
    zeta: f64,
    rng: &mut SmallRng,
) -> usize {
    let m = match grid {
        None => m_max,
        Some(grid) => {
            counts.clear();
            counts.resize(grid.len(), 0);
            let mut k = 0;
            for (s, w) in particles.iter().zip(weights) {
                if *w > 0.0 {
                    k += grid.access(counts, s);
                }
            }
            (kld_sample_size(k, zeta).ceil() as usize)
                .max(m_min)
                .min(m_max)
        }
    };
    stratified(out, particles, weights, sum, m, rng);
    m
}

/// Low-variance stratified draw of `m` particles, each with weight
/// `sum / m` so the total is unchanged.
pub fn stratified<S: Clone>(
    out: &mut WeightedBelief<S>,
    particles: &[S],
    weights: &[Probability],
    sum: Probability,
    m: usize,
    rng: &mut SmallRng,
) {
    debug_assert!(particles.len() == weights.len());
    debug_assert!(sum > 0.0);
    out.clear();
    let step = sum / m as f64;
    let mut j = 0;
    let mut acc = weights[0];
    for i in 0..m {
        let target = (i as f64 + rng.random::<f64>()) * step;
        while acc <= target && j + 1 < weights.len() {
            j += 1;
            acc += weights[j];
        }
        out.push(particles[j].clone(), step);
    }
}
