//! `roam-control` – the arbitration engine.
//!
//! A fixed-period control loop in which several independently-reasoning
//! behaviours each propose a motor action with a confidence score, and a
//! winner-take-all arbitrator selects exactly one actuation per tick.
//!
//! # Modules
//!
//! - [`behaviour`] – [`Behaviour`][behaviour::Behaviour]: the
//!   activation/deactivation state machine and the closed set of concrete
//!   strategies (crash prevention, goal seeking, line following, explore).
//! - [`arbitrator`] – [`Arbitrator`][arbitrator::Arbitrator]: pure
//!   winner-take-all selection over the active behaviours, with a monotonic
//!   halt flag.
//! - [`controller`] – [`Controller`][controller::Controller]: sequences the
//!   eight tick phases and owns the shared sensor-registration set.

pub mod arbitrator;
pub mod behaviour;
pub mod controller;

pub use arbitrator::Arbitrator;
pub use behaviour::{Behaviour, Transition};
pub use controller::Controller;

use rand::SeedableRng;
use rand::rngs::SmallRng;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Deterministic per-behaviour RNG.
///
/// Each randomness-consuming behaviour gets its own `SmallRng` seeded from
/// the run's global seed and a behaviour slot, so runs are reproducible and
/// behaviours never share RNG state.
pub fn behaviour_rng(global_seed: u64, slot: u64) -> SmallRng {
    SmallRng::seed_from_u64(global_seed ^ slot.wrapping_mul(MIXING_CONSTANT))
}
