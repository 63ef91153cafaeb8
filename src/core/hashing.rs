//! Stable hashing for partition routing
//!
//! `std::collections::hash_map::DefaultHasher` makes no promise that its
//! output stays the same between Rust releases, and `RandomState` is seeded
//! per process. Partition routing needs the opposite: the same key must land
//! on the same partition every time. [`StableHasher`] is a 64-bit FNV-1a
//! hasher with fixed parameters, usable with any `std::hash::Hash` key.

use std::hash::{BuildHasher, Hash, Hasher};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hasher
#[derive(Debug, Clone, Copy)]
pub struct StableHasher {
    state: u64,
}

impl Default for StableHasher {
    fn default() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }
}

impl Hasher for StableHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }
}

/// [`BuildHasher`] producing [`StableHasher`]s; the default for partitioned channels
#[derive(Debug, Clone, Copy, Default)]
pub struct StableBuildHasher;

impl BuildHasher for StableBuildHasher {
    type Hasher = StableHasher;

    fn build_hasher(&self) -> Self::Hasher {
        StableHasher::default()
    }
}

/// Map a key onto `[0, partition_count)` using the given hash builder
///
/// Returns 0 when `partition_count` is 0 so callers never divide by zero;
/// channel constructors reject a zero partition count before this is reached.
pub fn partition_index<K, S>(key: &K, partition_count: usize, hash_builder: &S) -> usize
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    if partition_count == 0 {
        return 0;
    }
    let mut hasher = hash_builder.build_hasher();
    key.hash(&mut hasher);
    (hasher.finish() % partition_count as u64) as usize
}
