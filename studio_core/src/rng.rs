use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bevy::prelude::Resource;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seedable random source shared by the content generators and the
/// disruption roll.
///
/// A ChaCha8 master stream keeps the whole session reproducible from one
/// seed. Burst work (generating a contract, rolling a candidate batch)
/// forks a [`SmallRng`] substream so the number of draws it makes cannot
/// shift every later roll of the session.
#[derive(Resource)]
pub struct SimRng {
    seed: u64,
    master: ChaCha8Rng,
}

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            master: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[0, 1)`.
    pub fn roll(&mut self) -> f32 {
        self.master.gen::<f32>()
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// `len` of zero returns zero; callers guard emptiness themselves.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            self.master.gen_range(0..len)
        }
    }

    /// Forks a labelled substream off the master stream.
    pub fn substream(&mut self, label: &str) -> SmallRng {
        let mut hasher = DefaultHasher::new();
        label.hash(&mut hasher);
        SmallRng::seed_from_u64(hasher.finish() ^ self.master.gen::<u64>())
    }
}
