//! Deterministic per-entity and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each entity gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (entity_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive entity IDs uniformly across the seed space.
//! Spawning or destroying zombies therefore never disturbs the random
//! streams of the ones already alive, and a run replays exactly from its
//! seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::EntityId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Helpers shared by both wrappers.  The game logic mostly wants "a float in
/// `[lo, hi)` that tolerates an empty range" and "base plus-or-minus spread".
macro_rules! sampling_helpers {
    () => {
        #[inline]
        pub fn inner(&mut self) -> &mut SmallRng {
            &mut self.0
        }

        /// Sample a uniformly distributed value of any `Standard`-distributed type.
        #[inline]
        pub fn random<T>(&mut self) -> T
        where
            rand::distributions::Standard: rand::distributions::Distribution<T>,
        {
            self.0.r#gen()
        }

        /// Generate a value uniformly in `range`.
        #[inline]
        pub fn gen_range<T, R>(&mut self, range: R) -> T
        where
            T: rand::distributions::uniform::SampleUniform,
            R: rand::distributions::uniform::SampleRange<T>,
        {
            self.0.gen_range(range)
        }

        /// `true` with probability `p` (clamped to [0, 1]).
        #[inline]
        pub fn gen_bool(&mut self, p: f64) -> bool {
            self.0.gen_bool(p.clamp(0.0, 1.0))
        }

        /// Uniform float in `[lo, hi)`; returns `lo` when the range is empty.
        #[inline]
        pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
            if hi > lo { self.0.gen_range(lo..hi) } else { lo }
        }

        /// Uniform integer in `[lo, hi)`; returns `lo` when the range is empty.
        #[inline]
        pub fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
            if hi > lo { self.0.gen_range(lo..hi) } else { lo }
        }

        /// `base` plus a uniform offset in `[-spread, spread]`.
        #[inline]
        pub fn jitter(&mut self, base: f32, spread: f32) -> f32 {
            if spread > 0.0 {
                base + self.0.gen_range(-spread..=spread)
            } else {
                base
            }
        }

        /// Uniform index into a collection of `len` elements.
        #[inline]
        pub fn index(&mut self, len: usize) -> Option<usize> {
            if len == 0 { None } else { Some(self.0.gen_range(0..len)) }
        }

        /// Choose a random element from a slice.  `None` if the slice is empty.
        #[inline]
        pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
            use rand::seq::SliceRandom;
            slice.choose(&mut self.0)
        }

        /// Shuffle a mutable slice in-place (Fisher-Yates).
        #[inline]
        pub fn shuffle<T>(&mut self, slice: &mut [T]) {
            use rand::seq::SliceRandom;
            slice.shuffle(&mut self.0);
        }
    };
}

// ── AgentRng ──────────────────────────────────────────────────────────────────

/// Per-entity deterministic RNG.
///
/// Owned by the entity's brain; behavior nodes, steering wander, and sensing
/// throttles all draw from it.
#[derive(Clone, Debug)]
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an entity ID.
    pub fn new(global_seed: u64, entity: EntityId) -> Self {
        let seed = global_seed ^ (entity.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    sampling_helpers!();
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for global decisions: spawner choice, horde target
/// assignment, stalker placement.
#[derive(Clone, Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset, so a subsystem
    /// can own its stream without disturbing the parent's.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    sampling_helpers!();
}
