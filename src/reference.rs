use crate::Element;

/// Reference positional population count. Do not alter.
///
/// Adds bit `j` of every element of `buf` to `counts[j]`, one bit at a time.
/// This is the oracle all other kernels are tested against, and the tail
/// handler of the portable kernel.
pub fn count<E: Element>(counts: &mut E::Counts, buf: &[E]) {
    let counts = counts.as_mut();
    for &x in buf {
        for (j, count) in counts.iter_mut().enumerate() {
            *count += (((x >> j) & E::one()) != E::zero()) as i64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::count;

    #[test]
    fn single_bits() {
        let mut counts = [0; 16];
        count::<u16>(&mut counts, &[1 << 0, 1 << 7, 1 << 15, 1 << 15]);
        let mut expected = [0; 16];
        expected[0] = 1;
        expected[7] = 1;
        expected[15] = 2;
        assert_eq!(counts, expected);
    }

    #[test]
    fn all_ones() {
        let mut counts = [3; 64];
        count::<u64>(&mut counts, &[u64::MAX; 5]);
        assert_eq!(counts, [8; 64]);
    }
}
