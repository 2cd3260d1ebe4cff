//! State-space discretization and the adaptive sample-size rule.
//!
//! The planner sizes each belief's particle set by how dispersed the
//! belief actually is: states hash into the bins of a user-supplied
//! [`StateGrid`], and the occupied-bin count feeds Fox's KLD rule
//! ([`kld_sample_size`]) to pick the smallest sample that pins the
//! empirical distribution down to a target divergence. No grid, no
//! adaptivity — resampling then always uses the configured maximum.

mod grid;
mod kld;

pub use grid::*;
pub use kld::*;
