//! The capability contract a POMDP exposes to the planner.
//!
//! The planner never sees a transition matrix or an explicit observation
//! model. Everything it needs fits in a narrow generative interface:
//! sample a step, score an observation, classify terminality, discount.
//! Models stay cheap to write (see [`crate::worlds`]) and the planner
//! stays agnostic to their internals.

mod pomdp;

pub use pomdp::*;
