//! A fast, deterministic, non-cryptographic 64-bit hasher.
//!
//! The same rotate-xor-multiply scheme rustc uses for incremental
//! compilation. Unlike `DefaultHasher` it carries no per-process random
//! seed, so the same bytes hash to the same value on every run and every
//! machine.

use std::hash::Hasher;
use std::ops::BitXor;

#[derive(Default)]
pub struct StableHasher {
    hash: u64,
}

impl StableHasher {
    const K: u64 = 0x517c_c1b7_2722_0a95;
}

impl Hasher for StableHasher {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash = self
                .hash
                .rotate_left(5)
                .bitxor(u64::from(*byte))
                .wrapping_mul(Self::K);
        }
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}
