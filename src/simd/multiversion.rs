//! Kernels that run the CSA network on vector registers
//!
//! These only exist when the matching target feature is enabled at compile
//! time (e.g. with `-C target-cpu=native`), and are still gated at runtime
//! by a capability probe before the dispatcher may pick them.

#[cfg(any(target_feature = "sse2", target_feature = "avx2"))]
use crate::{generic, Element};

#[cfg(target_feature = "avx2")]
use super::BitSlice;

#[cfg(target_feature = "sse2")]
pub fn sse2<E: Element>(counts: &mut E::Counts, buf: &[E]) {
    generic::count_csa::<E, safe_arch::m128i, 2>(counts, buf, generic::count::<E>)
}

#[cfg(target_feature = "sse2")]
pub fn sse2_available() -> bool {
    std::arch::is_x86_feature_detected!("sse2")
}

#[cfg(target_feature = "avx2")]
impl BitSlice<4> for safe_arch::m256i {
    #[inline(always)]
    fn from_subwords(subwords: [u64; 4]) -> Self {
        Self::from(subwords)
    }

    #[inline(always)]
    fn into_subwords(self) -> [u64; 4] {
        self.into()
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        safe_arch::bitand_m256i(self, other)
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        safe_arch::bitor_m256i(self, other)
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        safe_arch::bitxor_m256i(self, other)
    }

    #[inline(always)]
    fn add_u8(self, other: Self) -> Self {
        safe_arch::add_i8_m256i(self, other)
    }

    #[inline(always)]
    fn add_u16(self, other: Self) -> Self {
        safe_arch::add_i16_m256i(self, other)
    }

    #[inline(always)]
    fn shl<const BITS: i32>(self) -> Self {
        safe_arch::shl_imm_u64_m256i::<BITS>(self)
    }

    #[inline(always)]
    fn shr<const BITS: i32>(self) -> Self {
        safe_arch::shr_imm_u64_m256i::<BITS>(self)
    }

    #[inline(always)]
    fn load(bytes: &[u8]) -> Self {
        safe_arch::load_unaligned_m256i(bytemuck::from_bytes(bytes))
    }
}

#[cfg(target_feature = "avx2")]
pub fn avx2<E: Element>(counts: &mut E::Counts, buf: &[E]) {
    generic::count_csa::<E, safe_arch::m256i, 4>(counts, buf, generic::count::<E>)
}

#[cfg(target_feature = "avx2")]
pub fn avx2_available() -> bool {
    std::arch::is_x86_feature_detected!("avx2")
}
