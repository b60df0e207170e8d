//! Capability-gated kernel registry
//!
//! Each element width has an ordered list of kernels, best first. The
//! dispatcher uses the first one whose availability probe succeeds. The
//! portable kernel is always available and always listed last, so selection
//! cannot fail on a well-formed registry.

use crate::{Element, Kernel};
use std::fmt;

/// A counting kernel, as listed in a [`Registry`]
#[derive(Clone, Copy)]
pub struct KernelDescriptor<E: Element> {
    /// Counting function
    pub kernel: Kernel<E>,

    /// Human-readable name, without the `countN` prefix
    pub name: &'static str,

    /// Truth that the kernel can run on this machine
    ///
    /// Must reflect a durable platform capability, which does not change
    /// during the lifetime of the process.
    pub available: fn() -> bool,
}
//
impl<E: Element> KernelDescriptor<E> {
    /// Count the bits of `buf` into `counts` with this kernel
    #[inline]
    pub fn count(&self, counts: &mut E::Counts, buf: &[E]) {
        (self.kernel)(counts, buf)
    }
}
//
impl<E: Element> fmt::Debug for KernelDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelDescriptor")
            .field("width", &E::WIDTH)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Availability probe of kernels that run everywhere
pub fn always() -> bool {
    true
}

/// Ordered list of kernels for one element width
#[derive(Debug)]
pub struct Registry<E: Element> {
    /// Kernels in order of decreasing preference
    entries: &'static [KernelDescriptor<E>],
}
//
impl<E: Element> Registry<E> {
    /// Set up a registry from kernels listed best first
    pub const fn new(entries: &'static [KernelDescriptor<E>]) -> Self {
        Self { entries }
    }

    /// Kernels in order of decreasing preference
    pub fn entries(&self) -> &'static [KernelDescriptor<E>] {
        self.entries
    }

    /// Pick the first kernel that is available on this machine
    pub fn select(&self) -> Result<&'static KernelDescriptor<E>, NoKernelAvailable> {
        for entry in self.entries {
            if (entry.available)() {
                log::debug!("count{}: selected {} kernel", E::WIDTH, entry.name);
                return Ok(entry);
            }
            log::trace!("count{}: {} kernel is not available", E::WIDTH, entry.name);
        }
        Err(NoKernelAvailable { width: E::WIDTH })
    }

    /// Like `select()`, but a registry without any available kernel is a
    /// broken build and brings the process down
    pub(crate) fn select_or_abort(&self) -> &'static KernelDescriptor<E> {
        self.select().unwrap_or_else(|e| panic!("{e}"))
    }
}

/// Error returned when no kernel of a registry can run on this machine
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NoKernelAvailable {
    /// Element width of the registry
    pub width: usize,
}
//
impl fmt::Display for NoKernelAvailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no implementation of count{} available", self.width)
    }
}
//
impl std::error::Error for NoKernelAvailable {}

#[cfg(test)]
mod tests {
    use super::{always, KernelDescriptor, NoKernelAvailable, Registry};
    use crate::{generic, reference};

    fn never() -> bool {
        false
    }

    /// Kernel that does no work, to tell dispatch results apart
    fn dummy(_counts: &mut [i64; 32], buf: &[u32]) {
        std::hint::black_box(buf.iter().fold(0u32, |acc, &x| acc.wrapping_add(x)));
    }

    const PREFERS_AVAILABLE_KERNELS: &[KernelDescriptor<u32>] = &[
        KernelDescriptor {
            kernel: dummy,
            name: "unavailable",
            available: never,
        },
        KernelDescriptor {
            kernel: reference::count::<u32>,
            name: "reference",
            available: always,
        },
        KernelDescriptor {
            kernel: generic::count::<u32>,
            name: "generic",
            available: always,
        },
    ];
    static PREFERS_AVAILABLE: Registry<u32> = Registry::new(PREFERS_AVAILABLE_KERNELS);

    const NOTHING_AVAILABLE_KERNELS: &[KernelDescriptor<u32>] = &[KernelDescriptor {
        kernel: dummy,
        name: "unavailable",
        available: never,
    }];
    static NOTHING_AVAILABLE: Registry<u32> = Registry::new(NOTHING_AVAILABLE_KERNELS);

    static EMPTY: Registry<u32> = Registry::new(&[]);

    #[test]
    fn first_available_wins() {
        let selected = PREFERS_AVAILABLE.select().unwrap();
        assert_eq!(selected.name, "reference");
        assert!(std::ptr::eq(selected, &PREFERS_AVAILABLE.entries()[1]));

        let mut counts = [0; 32];
        selected.count(&mut counts, &[0b101, 0b100]);
        assert_eq!(counts[..4], [1, 0, 2, 0]);
    }

    #[test]
    fn selection_is_stable() {
        let first = PREFERS_AVAILABLE.select().unwrap();
        for _ in 0..10 {
            assert!(std::ptr::eq(first, PREFERS_AVAILABLE.select().unwrap()));
        }
    }

    #[test]
    fn nothing_available() {
        assert_eq!(
            NOTHING_AVAILABLE.select().unwrap_err(),
            NoKernelAvailable { width: 32 }
        );
        assert_eq!(
            EMPTY.select().unwrap_err().to_string(),
            "no implementation of count32 available"
        );
    }

    #[test]
    #[should_panic(expected = "no implementation of count32 available")]
    fn nothing_available_is_fatal() {
        NOTHING_AVAILABLE.select_or_abort();
    }

    #[test]
    fn builtin_registries_end_with_generic() {
        fn check<E: crate::Element>() {
            let entries = E::registry().entries();
            let last = entries.last().expect("registries are never empty");
            assert_eq!(last.name, "generic");
            assert!((last.available)());
            let mut names: Vec<_> = entries.iter().map(|entry| entry.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), entries.len(), "duplicate kernel names");
        }
        check::<u8>();
        check::<u16>();
        check::<u32>();
        check::<u64>();
    }
}
