//! Overflow guard for the per-lane counters of the CSA kernels
//!
//! Each group of the CSA network adds at most [`GROUP_MAX`] to every lane.
//! Lane counts stay bit-sliced in the kernel's own words, first as 8-bit
//! counters, which can absorb `floor(255 / GROUP_MAX) = 17` groups, then as
//! 16-bit counters, which can absorb `floor(65535 / 255) = 257` spills of
//! the 8-bit ones (4369 groups, i.e. 65535 words). Only then are they folded
//! into the wide positional counts.

use crate::simd::BitSlice;

/// Largest per-lane count produced by one group of the CSA network
pub const GROUP_MAX: u8 = 15;

/// Groups that 8-bit lane counters can absorb before spilling
pub const U8S_ROUND: u64 = u8::MAX as u64 / GROUP_MAX as u64;

/// Spills of 8-bit counters that 16-bit counters can absorb before spilling
pub const U16S_ROUND: u64 = u16::MAX as u64 / u8::MAX as u64;

/// Bit-sliced lane counters, spilled into the positional counts before they
/// can overflow
///
/// The input of [`add_group()`](Self::add_group) is four words of nibbles,
/// `quads[k]` holding the count of lane `64 * s + 4 * m + k` in nibble `m`
/// of its subword `s`. Splitting nibbles into bytes and bytes into 16-bit
/// integers never moves a lane across a 64-bit subword, and the indexing
/// below keeps track of where each lane ends up.
pub(crate) struct LaneCounters<W, const SUBWORDS: usize> {
    /// 8-bit counters `[k][h]`, byte `b` of subword `s` counting lane
    /// `64 * s + 8 * b + 4 * h + k`
    simd_u8s: [[W; 2]; 4],

    /// Number of groups accumulated into `simd_u8s` since they were spilled
    u8s_usage: u64,

    /// 16-bit counters `[k][h][e]`, integer `c` of subword `s` counting lane
    /// `64 * s + 16 * c + 8 * e + 4 * h + k`
    simd_u16s: [[[W; 2]; 2]; 4],

    /// Number of 8-bit spills accumulated into `simd_u16s`
    u16s_usage: u64,

    /// Number of 8-bit spills after which `simd_u16s` must be spilled
    u16s_capacity: u64,
}
//
impl<W: BitSlice<SUBWORDS>, const SUBWORDS: usize> LaneCounters<W, SUBWORDS> {
    /// Set up zeroed lane counters
    pub fn new() -> Self {
        Self::with_u16s_capacity(U16S_ROUND)
    }

    /// Set up zeroed lane counters whose 16-bit stage is spilled every
    /// `u16s_capacity` spills of the 8-bit stage
    pub fn with_u16s_capacity(u16s_capacity: u64) -> Self {
        assert!(
            (1..=U16S_ROUND).contains(&u16s_capacity),
            "16-bit lane counters can only absorb 1 to {U16S_ROUND} spills"
        );
        let zero = W::splat(0);
        Self {
            simd_u8s: [[zero; 2]; 4],
            u8s_usage: 0,
            simd_u16s: [[[zero; 2]; 2]; 4],
            u16s_usage: 0,
            u16s_capacity,
        }
    }

    /// Add the output of one group, spilling first if the counters are full
    #[inline(always)]
    pub fn add_group(&mut self, counts: &mut [i64], quads: [W; 4]) {
        if self.u8s_usage == U8S_ROUND {
            self.spill_u8s_to_u16s(counts);
        }
        let low_nibbles = W::splat(0x0f0f_0f0f_0f0f_0f0f);
        for (simd_u8, quad) in self.simd_u8s.iter_mut().zip(quads) {
            simd_u8[0] = simd_u8[0].add_u8(quad.and(low_nibbles));
            simd_u8[1] = simd_u8[1].add_u8(quad.shr::<4>().and(low_nibbles));
        }
        self.u8s_usage += 1;
    }

    /// Fold every lane into `counts[lane % counts.len()]` and reset
    pub fn spill(&mut self, counts: &mut [i64]) {
        self.spill_u8s_to_u16s(counts);
        self.spill_u16s_to_scalars(counts);
    }

    /// Spill 8-bit counters into the matching 16-bit ones
    #[inline(always)]
    fn spill_u8s_to_u16s(&mut self, counts: &mut [i64]) {
        if self.u16s_usage == self.u16s_capacity {
            self.spill_u16s_to_scalars(counts);
        }
        let low_bytes = W::splat(0x00ff_00ff_00ff_00ff);
        for (simd_u8, simd_u16) in self.simd_u8s.iter_mut().zip(self.simd_u16s.iter_mut()) {
            for (u8s, u16s) in simd_u8.iter_mut().zip(simd_u16.iter_mut()) {
                u16s[0] = u16s[0].add_u16(u8s.and(low_bytes));
                u16s[1] = u16s[1].add_u16(u8s.shr::<8>().and(low_bytes));
                *u8s = W::splat(0);
            }
        }
        self.u8s_usage = 0;
        self.u16s_usage += 1;
    }

    /// Spill 16-bit counters into the positional counts
    fn spill_u16s_to_scalars(&mut self, counts: &mut [i64]) {
        let width = counts.len();
        for (k, simd_u16) in self.simd_u16s.iter_mut().enumerate() {
            for (h, halves) in simd_u16.iter_mut().enumerate() {
                for (e, u16s) in halves.iter_mut().enumerate() {
                    for (s, subword) in u16s.into_subwords().into_iter().enumerate() {
                        for c in 0..4 {
                            let lane = 64 * s + 16 * c + 8 * e + 4 * h + k;
                            counts[lane % width] += (subword >> (16 * c) & 0xffff) as i64;
                        }
                    }
                    *u16s = W::splat(0);
                }
            }
        }
        self.u16s_usage = 0;
    }
}
