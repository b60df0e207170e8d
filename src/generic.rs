//! Portable carry-save adder (CSA) kernel
//!
//! Groups of 15 words go through a network of 11 full adders working on all
//! bit lanes at once. The four output planes `d:c:b:a` hold, for every lane,
//! a 4-bit count of how many of the 15 words had that lane set. A masked
//! shift transpose then gathers each lane's 4 bits into a nibble, and the
//! nibbles are added to guarded bit-sliced lane counters, still in words.
//!
//! The same network runs on any [`BitSlice`] word: `u64` here, vector
//! registers in [`crate::simd::multiversion`].

use crate::{guard::LaneCounters, reference, simd::BitSlice, Element, Kernel};

/// Number of words reduced by one pass through the CSA network
pub const GROUP_WORDS: usize = 15;

/// Portable positional population count, always available
pub fn count<E: Element>(counts: &mut E::Counts, buf: &[E]) {
    count_csa::<E, u64, 1>(counts, buf, reference::count::<E>)
}

/// Full adder on every bit lane, returns `(carry, sum)`
#[inline(always)]
fn csa<W: BitSlice<S>, const S: usize>(a: W, b: W, c: W) -> (W, W) {
    let sum_ab = a.xor(b);
    let carry_ab = a.and(b);
    (carry_ab.or(sum_ab.and(c)), sum_ab.xor(c))
}

/// Reduce 15 words to the bit planes `[a, b, c, d]` of per-lane 4-bit counts
#[inline(always)]
fn csa15<W: BitSlice<S>, const S: usize>(x: [W; GROUP_WORDS]) -> [W; 4] {
    let (b0, a0) = csa(x[0], x[1], x[2]);
    let (b1, a1) = csa(x[3], x[4], x[5]);
    let (b2, a2) = csa(a0, a1, x[6]);
    let (c0, b3) = csa(b0, b1, b2);
    let (b4, a3) = csa(a2, x[7], x[8]);
    let (b5, a4) = csa(a3, x[9], x[10]);
    let (c1, b6) = csa(b3, b4, b5);
    let (b7, a5) = csa(a4, x[11], x[12]);
    let (b8, a) = csa(a5, x[13], x[14]);
    let (c2, b) = csa(b6, b7, b8);
    let (d, c) = csa(c0, c1, c2);
    [a, b, c, d]
}

/// Gather each lane's 4 count bits into a nibble
///
/// In output `k`, nibble `m` of each 64-bit subword is the count of lane
/// `4 * m + k` of that subword.
#[inline(always)]
fn transpose<W: BitSlice<S>, const S: usize>([a, b, c, d]: [W; 4]) -> [W; 4] {
    let even = W::splat(0x5555_5555_5555_5555);
    let odd = W::splat(0xaaaa_aaaa_aaaa_aaaa);
    let low_pairs = W::splat(0x3333_3333_3333_3333);
    let high_pairs = W::splat(0xcccc_cccc_cccc_cccc);

    // Pair up a:b and c:d, for even lanes (0) and odd lanes (1)
    let ba0 = a.and(even).or(b.shl::<1>().and(odd));
    let ba1 = a.shr::<1>().and(even).or(b.and(odd));
    let dc0 = c.and(even).or(d.shl::<1>().and(odd));
    let dc1 = c.shr::<1>().and(even).or(d.and(odd));

    // Merge pairs into nibbles, for lanes 4m, 4m + 2, 4m + 1, 4m + 3
    let dcba0 = ba0.and(low_pairs).or(dc0.shl::<2>().and(high_pairs));
    let dcba1 = ba0.shr::<2>().and(low_pairs).or(dc0.and(high_pairs));
    let dcba2 = ba1.and(low_pairs).or(dc1.shl::<2>().and(high_pairs));
    let dcba3 = ba1.shr::<2>().and(low_pairs).or(dc1.and(high_pairs));

    [dcba0, dcba2, dcba1, dcba3]
}

/// CSA kernel over words of type `W`
///
/// Elements that do not fill a whole group are handed to `tail`. Only whole
/// groups are ever loaded, so no read goes past the end of `buf`.
#[inline]
pub fn count_csa<E, W, const SUBWORDS: usize>(counts: &mut E::Counts, buf: &[E], tail: Kernel<E>)
where
    E: Element,
    W: BitSlice<SUBWORDS>,
{
    count_with_lanes(counts, buf, tail, LaneCounters::<W, SUBWORDS>::new())
}

#[inline(always)]
fn count_with_lanes<E, W, const SUBWORDS: usize>(
    counts: &mut E::Counts,
    buf: &[E],
    tail: Kernel<E>,
    mut lanes: LaneCounters<W, SUBWORDS>,
) where
    E: Element,
    W: BitSlice<SUBWORDS>,
{
    let group_bytes = GROUP_WORDS * W::BYTES;
    let group_len = group_bytes / std::mem::size_of::<E>();
    let (body, rest) = buf.split_at(buf.len() - buf.len() % group_len);

    if !body.is_empty() {
        for group in bytemuck::cast_slice::<E, u8>(body).chunks_exact(group_bytes) {
            let mut words = [W::splat(0); GROUP_WORDS];
            for (word, bytes) in words.iter_mut().zip(group.chunks_exact(W::BYTES)) {
                *word = W::load(bytes);
            }
            lanes.add_group(counts.as_mut(), transpose(csa15(words)));
        }
        lanes.spill(counts.as_mut());
    }

    tail(counts, rest);
}
