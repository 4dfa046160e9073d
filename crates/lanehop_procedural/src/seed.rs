//! # Seeds
//!
//! Every random decision in map generation comes from one generator built
//! from a [`WorldSeed`]. Given the same seed and the same sequence of
//! calls, the map is identical on every platform.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// The generator threaded through all generation calls.
pub type MapRng = ChaCha8Rng;

/// World seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives an independent sub-seed for a specific purpose.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Builds the generator for this seed.
    #[must_use]
    pub fn rng(self) -> MapRng {
        ChaCha8Rng::seed_from_u64(self.0)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0x1A4E_B0B0_F20C_0001)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = WorldSeed::new(7).rng();
        let mut b = WorldSeed::new(7).rng();
        for _ in 0..100 {
            assert_eq!(a.gen_range(0..1000), b.gen_range(0..1000));
        }
    }

    #[test]
    fn test_derive_is_stable_and_distinct() {
        let seed = WorldSeed::new(42);
        assert_eq!(seed.derive(1), seed.derive(1));
        assert_ne!(seed.derive(1), seed.derive(2));
        assert_ne!(seed.derive(1), seed);
    }
}
