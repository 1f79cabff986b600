//! CLI arguments shared across the simulation binaries.

use clap::Parser;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Randomness control shared by every binary.
///
/// A pinned seed makes a run reproducible; without one the generator is
/// seeded from the OS and the chosen seed is logged so the run can be
/// replayed.
#[derive(Parser, Debug, Clone)]
pub struct RandomnessArgs {
    /// Random seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RandomnessArgs {
    /// Build the run's random number generator, logging the effective seed
    pub fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or(rand::rng().next_u64());
        log::info!("using random seed {seed}");
        StdRng::seed_from_u64(seed)
    }
}
