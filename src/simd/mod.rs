pub mod multiversion;

/// Machine word whose bits are processed as independent 1-bit lanes
///
/// The word is viewed as `SUBWORDS` consecutive 64-bit subwords. Shifts
/// operate within each 64-bit subword, which is all the bit-slicing
/// transpose needs since its masks never let bits cross a nibble boundary.
pub trait BitSlice<const SUBWORDS: usize>: Copy + Sized {
    /// Number of bytes loaded per word
    const BYTES: usize = 8 * SUBWORDS;

    /// Build a word from its 64-bit subwords
    fn from_subwords(subwords: [u64; SUBWORDS]) -> Self;

    /// Split a word into its 64-bit subwords
    fn into_subwords(self) -> [u64; SUBWORDS];

    /// Lane-wise AND
    fn and(self, other: Self) -> Self;

    /// Lane-wise OR
    fn or(self, other: Self) -> Self;

    /// Lane-wise XOR
    fn xor(self, other: Self) -> Self;

    /// Lane-wise wrapping addition of 8-bit integers
    fn add_u8(self, other: Self) -> Self;

    /// Lane-wise wrapping addition of 16-bit integers
    fn add_u16(self, other: Self) -> Self;

    /// Shift every 64-bit subword left
    fn shl<const BITS: i32>(self) -> Self;

    /// Shift every 64-bit subword right
    fn shr<const BITS: i32>(self) -> Self;

    /// Repeat a 64-bit pattern across the word
    #[inline(always)]
    fn splat(pattern: u64) -> Self {
        Self::from_subwords([pattern; SUBWORDS])
    }

    /// Load a word from `Self::BYTES` bytes of native-endian memory
    ///
    /// Whatever the host's byte order, an element of width W stored in
    /// these bytes keeps its bit `j` on a lane `i` such that `i % W == j`.
    #[inline(always)]
    fn load(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), Self::BYTES);
        let mut subwords = [0u64; SUBWORDS];
        for (subword, chunk) in subwords.iter_mut().zip(bytes.chunks_exact(8)) {
            *subword = bytemuck::pod_read_unaligned(chunk);
        }
        Self::from_subwords(subwords)
    }
}

/// Wrapping addition of the integers packed in `a` and `b`, whose top bits
/// are marked by `high`
#[inline(always)]
fn add_packed(a: u64, b: u64, high: u64) -> u64 {
    let low = !high;
    ((a & low) + (b & low)) ^ ((a ^ b) & high)
}

impl BitSlice<1> for u64 {
    #[inline(always)]
    fn from_subwords([subword]: [u64; 1]) -> Self {
        subword
    }

    #[inline(always)]
    fn into_subwords(self) -> [u64; 1] {
        [self]
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        self & other
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        self | other
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        self ^ other
    }

    #[inline(always)]
    fn add_u8(self, other: Self) -> Self {
        add_packed(self, other, 0x8080_8080_8080_8080)
    }

    #[inline(always)]
    fn add_u16(self, other: Self) -> Self {
        add_packed(self, other, 0x8000_8000_8000_8000)
    }

    #[inline(always)]
    fn shl<const BITS: i32>(self) -> Self {
        self << BITS
    }

    #[inline(always)]
    fn shr<const BITS: i32>(self) -> Self {
        self >> BITS
    }
}

#[cfg(target_feature = "sse2")]
impl BitSlice<2> for safe_arch::m128i {
    #[inline(always)]
    fn from_subwords(subwords: [u64; 2]) -> Self {
        Self::from(subwords)
    }

    #[inline(always)]
    fn into_subwords(self) -> [u64; 2] {
        self.into()
    }

    #[inline(always)]
    fn and(self, other: Self) -> Self {
        safe_arch::bitand_m128i(self, other)
    }

    #[inline(always)]
    fn or(self, other: Self) -> Self {
        safe_arch::bitor_m128i(self, other)
    }

    #[inline(always)]
    fn xor(self, other: Self) -> Self {
        safe_arch::bitxor_m128i(self, other)
    }

    #[inline(always)]
    fn add_u8(self, other: Self) -> Self {
        safe_arch::add_i8_m128i(self, other)
    }

    #[inline(always)]
    fn add_u16(self, other: Self) -> Self {
        safe_arch::add_i16_m128i(self, other)
    }

    #[inline(always)]
    fn shl<const BITS: i32>(self) -> Self {
        safe_arch::shl_imm_u64_m128i::<BITS>(self)
    }

    #[inline(always)]
    fn shr<const BITS: i32>(self) -> Self {
        safe_arch::shr_imm_u64_m128i::<BITS>(self)
    }

    #[inline(always)]
    fn load(bytes: &[u8]) -> Self {
        safe_arch::load_unaligned_m128i(bytemuck::from_bytes(bytes))
    }
}
