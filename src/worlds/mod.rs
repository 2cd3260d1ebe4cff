//! Reference worlds used as planner test cases.
//!
//! Each is a classic from the POMDP literature, small enough to reason
//! about by hand and cheap enough to hammer in tests, while jointly
//! covering the planner's surface:
//!
//! - [`TigerPomdp`] — two states, information-gathering vs. acting; the
//!   planner must listen before it opens
//! - [`BabyPomdp`] — feed/ignore with noisy crying; exercises long
//!   horizons and the constant-bound configuration
//! - [`LightDark`] — continuous 1-D state with position-dependent
//!   observation noise; exercises the grid, the KLD rule, and
//!   observation packing over a large raw branching factor

mod baby;
mod lightdark;
mod tiger;

pub use baby::*;
pub use lightdark::*;
pub use tiger::*;

use rand::Rng;
use rand::rngs::SmallRng;

/// standard normal draw, Box-Muller
pub(crate) fn gaussian(rng: &mut SmallRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
