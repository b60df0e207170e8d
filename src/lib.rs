//! Positional population counts
//!
//! For an array of 8, 16, 32 or 64-bit unsigned integers, count how many
//! elements have each bit position set. `counts[j]` receives the number of
//! elements with bit `j` (of weight `1 << j`) set.
//!
//! ```
//! let mut counts = [0; 8];
//! poscount::count8(&mut counts, &[1, 2, 3, 5, 6, 9]);
//! // 1, 3, 5 and 9 have bit 0 set, 2, 3 and 6 have bit 1 set, and so on
//! assert_eq!(counts, [4, 3, 2, 1, 0, 0, 0, 0]);
//! ```
//!
//! Counts are accumulated, not overwritten, so a running total can be kept
//! across calls.
//!
//! Each width has a list of kernels, and the first one that can run on this
//! machine is picked once, on first use. Vector kernels are only compiled in
//! when the matching target features are enabled, e.g. by building with
//! `RUSTFLAGS="-C target-cpu=native"`. The portable kernel is always there
//! as a fallback.
//!
//! Counting functions can be called concurrently from any number of threads.
//! Threads that accumulate into the same counter array must synchronize, for
//! example by counting into per-thread arrays and summing them afterwards.

pub mod dispatch;
pub mod generic;
mod guard;
pub mod reference;
pub mod simd;

use dispatch::{KernelDescriptor, Registry};
use once_cell::sync::Lazy;
use std::fmt;

/// Unsigned integer type whose bits can be counted
pub trait Element:
    bytemuck::Pod + num_traits::PrimInt + fmt::Debug + fmt::LowerHex + Send + Sync + 'static
{
    /// Number of bits, and thus of positional counters
    const WIDTH: usize;

    /// Positional counters, `[i64; Self::WIDTH]`
    type Counts: AsRef<[i64]> + AsMut<[i64]> + Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Positional counters set to zero
    const ZERO_COUNTS: Self::Counts;

    /// Kernels that can count this type, best first
    fn registry() -> &'static Registry<Self>;

    /// Kernel used by [`count()`], selected on first use
    fn selected() -> &'static KernelDescriptor<Self>;
}

/// Signature shared by all counting kernels
pub type Kernel<E> = fn(&mut <E as Element>::Counts, &[E]);

macro_rules! impl_element {
    ($($t:ty => $width:literal),*) => {
        $(
            impl Element for $t {
                const WIDTH: usize = $width;
                type Counts = [i64; $width];
                const ZERO_COUNTS: Self::Counts = [0; $width];

                fn registry() -> &'static Registry<Self> {
                    const KERNELS: &[KernelDescriptor<$t>] = &[
                        #[cfg(target_feature = "avx2")]
                        KernelDescriptor {
                            kernel: simd::multiversion::avx2::<$t>,
                            name: "avx2",
                            available: simd::multiversion::avx2_available,
                        },
                        #[cfg(target_feature = "sse2")]
                        KernelDescriptor {
                            kernel: simd::multiversion::sse2::<$t>,
                            name: "sse2",
                            available: simd::multiversion::sse2_available,
                        },
                        KernelDescriptor {
                            kernel: generic::count::<$t>,
                            name: "generic",
                            available: dispatch::always,
                        },
                    ];
                    static REGISTRY: Registry<$t> = Registry::new(KERNELS);
                    &REGISTRY
                }

                fn selected() -> &'static KernelDescriptor<Self> {
                    static SELECTED: Lazy<&'static KernelDescriptor<$t>> =
                        Lazy::new(|| <$t as Element>::registry().select_or_abort());
                    *SELECTED
                }
            }
        )*
    };
}
//
impl_element!(u8 => 8, u16 => 16, u32 => 32, u64 => 64);

/// Add the positional population count of `buf` to `counts`
#[inline]
pub fn count<E: Element>(counts: &mut E::Counts, buf: &[E]) {
    E::selected().count(counts, buf)
}

/// Count the set bits of the bytes in `buf` by position, adding the results
/// to `counts`: `counts[0]` for `0x01`, `counts[1]` for `0x02`, and so on to
/// `counts[7]` for `0x80`.
pub fn count8(counts: &mut [i64; 8], buf: &[u8]) {
    count::<u8>(counts, buf)
}

/// Count the set bits of the values in `buf` by position, adding the results
/// to `counts`: `counts[0]` for `0x0001` up to `counts[15]` for `0x8000`.
pub fn count16(counts: &mut [i64; 16], buf: &[u16]) {
    count::<u16>(counts, buf)
}

/// Count the set bits of the values in `buf` by position, adding the results
/// to `counts`: `counts[0]` for `0x0000_0001` up to `counts[31]` for
/// `0x8000_0000`.
pub fn count32(counts: &mut [i64; 32], buf: &[u32]) {
    count::<u32>(counts, buf)
}

/// Count the set bits of the values in `buf` by position, adding the results
/// to `counts`: `counts[0]` for `1 << 0` up to `counts[63]` for `1 << 63`.
pub fn count64(counts: &mut [i64; 64], buf: &[u64]) {
    count::<u64>(counts, buf)
}

/// All kernels known for element type `E`, best first, available or not
pub fn kernels<E: Element>() -> &'static [KernelDescriptor<E>] {
    E::registry().entries()
}

/// Name of the kernel that [`count()`] uses for element type `E`
pub fn selected_kernel<E: Element>() -> &'static str {
    E::selected().name
}
