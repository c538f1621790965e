// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cheap numeric helpers for the hot paths: an integer floor-log2
//! for the 2x supersampling resolve, and a tiny xorshift generator
//! for the chaos game.

use rand::{Error, RngCore, SeedableRng};

/// Integer approximation of `log2(v)`: the position of the highest
/// set bit, i.e. `floor(log2(v))`.  Defined as 0 for `v == 0`.
#[inline]
pub fn fast_log2(v: u32) -> u32 {
    if v == 0 {
        0
    } else {
        31 - v.leading_zeros()
    }
}

const DEFAULT_Y: u32 = 362_436_069;
const DEFAULT_Z: u32 = 521_288_629;

/// Marsaglia's three-word xorshift generator.  Fast, small, and not
/// remotely cryptographic; each chaos-game worker owns one.
#[derive(Clone, Debug)]
pub struct XorShiftRng {
    x: u32,
    y: u32,
    z: u32,
}

impl XorShiftRng {
    /// A generator whose first word is `x` and whose other two words
    /// are Marsaglia's defaults.
    pub fn new(x: u32) -> Self {
        XorShiftRng {
            x,
            y: DEFAULT_Y,
            z: DEFAULT_Z,
        }
    }
}

impl RngCore for XorShiftRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.x ^= self.x << 16;
        self.x ^= self.x >> 5;
        self.x ^= self.x << 1;

        let t = self.x;
        self.x = self.y;
        self.y = self.z;
        self.z = t ^ self.x ^ self.y;
        self.z
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for XorShiftRng {
    type Seed = [u8; 12];

    /// An all-zero state would only ever produce zeros, so an all-zero
    /// seed falls back to the default words.
    fn from_seed(seed: Self::Seed) -> Self {
        let word = |i: usize| u32::from_le_bytes([seed[i], seed[i + 1], seed[i + 2], seed[i + 3]]);
        let (x, y, z) = (word(0), word(4), word(8));
        if x == 0 && y == 0 && z == 0 {
            XorShiftRng::new(0)
        } else {
            XorShiftRng { x, y, z }
        }
    }
}
