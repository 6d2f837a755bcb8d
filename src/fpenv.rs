//! Scoped denormal control.
//!
//! Subnormal operands can make float arithmetic orders of magnitude slower on
//! most cores. [`DenormalGuard`] switches the current thread's FP control
//! register to flush them to zero for the guard's lifetime and writes the
//! exact previous register value back on drop.
//!
//! | arch    | register | bits                                  |
//! |---------|----------|---------------------------------------|
//! | x86_64  | MXCSR    | FTZ (bit 15), DAZ (bit 6)             |
//! | aarch64 | FPCR     | FZ (bit 24), covers inputs and outputs |
//! | other   | none     | guard is a no-op                      |
//!
//! Guards nest. Each one saves the register as it found it, so dropping an
//! inner guard hands control back to the outer guard's mode, not to the
//! thread's original mode. Guards must be dropped in reverse order of
//! creation; they are `!Send` so a guard cannot migrate to a thread whose
//! register it never touched.
//!
//! ```
//! use laneflow::fpenv::DenormalGuard;
//!
//! let tiny = std::hint::black_box(f32::MIN_POSITIVE);
//! {
//!     let _guard = DenormalGuard::new();
//!     if DenormalGuard::is_supported() {
//!         assert_eq!(tiny * std::hint::black_box(0.5), 0.0);
//!     }
//! }
//! assert!(tiny * std::hint::black_box(0.5) > 0.0);
//! ```

use core::cell::Cell;
use core::marker::PhantomData;

use bitflags::bitflags;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which denormal shortcuts a guard enables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DenormalMode: u8 {
        /// Subnormal results are replaced by zero.
        const FLUSH_TO_ZERO = 1 << 0;
        /// Subnormal operands are read as zero.
        const DENORMALS_ARE_ZERO = 1 << 1;
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Restores the thread's previous FP control state when dropped.
#[must_use = "the previous floating-point mode is restored as soon as the guard drops"]
pub struct DenormalGuard {
    saved: arch::ControlWord,
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl DenormalGuard {
    /// Enables every mode the target supports.
    #[inline]
    pub fn new() -> Self {
        Self::with_mode(DenormalMode::all())
    }

    /// Enables `mode` on top of whatever is currently set.
    ///
    /// On AArch64 a single bit controls both directions, so any non-empty
    /// `mode` enables both.
    pub fn with_mode(mode: DenormalMode) -> Self {
        let saved = arch::read();
        arch::write(arch::enable(saved, mode));

        let depth = DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });

        if arch::SUPPORTED.is_empty() {
            debug!("denormal control unsupported on this target; guard is a no-op");
        } else {
            trace!("denormal guard {depth} acquired: {mode:?}");
        }

        Self {
            saved,
            depth,
            _not_send: PhantomData,
        }
    }

    /// The denormal modes active on this thread right now.
    pub fn current_mode() -> DenormalMode {
        arch::decode(arch::read())
    }

    /// Whether this target has a denormal control register.
    pub const fn is_supported() -> bool {
        !arch::SUPPORTED.is_empty()
    }

    /// Number of live guards on this thread.
    pub fn nesting_depth() -> usize {
        DEPTH.with(Cell::get)
    }
}

impl Default for DenormalGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DenormalGuard {
    fn drop(&mut self) {
        let live = DEPTH.with(|d| {
            let live = d.get();
            d.set(self.depth - 1);
            live
        });
        if live != self.depth {
            error!(
                "denormal guard {} released while {} guards are live; FP state of inner guards is lost",
                self.depth, live
            );
            debug_assert_eq!(live, self.depth, "denormal guards dropped out of order");
        }
        arch::write(self.saved);
        trace!("denormal guard {} released", self.depth);
    }
}

#[cfg(target_arch = "x86_64")]
mod arch {
    use super::DenormalMode;
    use bitflags::bitflags;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Mxcsr: u32 {
            const DAZ = 1 << 6;
            const FTZ = 1 << 15;
        }
    }

    pub type ControlWord = u32;

    pub const SUPPORTED: DenormalMode = DenormalMode::all();

    #[inline]
    pub fn read() -> u32 {
        let mut csr: u32 = 0;
        // SAFETY: stmxcsr stores the SSE control word; SSE is baseline on x86_64.
        unsafe {
            core::arch::asm!(
                "stmxcsr [{p}]",
                p = in(reg) core::ptr::addr_of_mut!(csr),
                options(nostack, preserves_flags),
            );
        }
        csr
    }

    #[inline]
    pub fn write(csr: u32) {
        // SAFETY: only values previously read back from MXCSR, with FTZ/DAZ
        // toggled, are ever loaded.
        unsafe {
            core::arch::asm!(
                "ldmxcsr [{p}]",
                p = in(reg) core::ptr::addr_of!(csr),
                options(nostack, readonly, preserves_flags),
            );
        }
    }

    pub fn enable(csr: u32, mode: DenormalMode) -> u32 {
        let mut flags = Mxcsr::from_bits_retain(csr);
        if mode.contains(DenormalMode::FLUSH_TO_ZERO) {
            flags.insert(Mxcsr::FTZ);
        }
        if mode.contains(DenormalMode::DENORMALS_ARE_ZERO) {
            flags.insert(Mxcsr::DAZ);
        }
        flags.bits()
    }

    pub fn decode(csr: u32) -> DenormalMode {
        let flags = Mxcsr::from_bits_retain(csr);
        let mut mode = DenormalMode::empty();
        mode.set(DenormalMode::FLUSH_TO_ZERO, flags.contains(Mxcsr::FTZ));
        mode.set(DenormalMode::DENORMALS_ARE_ZERO, flags.contains(Mxcsr::DAZ));
        mode
    }
}

#[cfg(target_arch = "aarch64")]
mod arch {
    use super::DenormalMode;
    use bitflags::bitflags;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Fpcr: u64 {
            const FZ = 1 << 24;
        }
    }

    pub type ControlWord = u64;

    pub const SUPPORTED: DenormalMode = DenormalMode::all();

    #[inline]
    pub fn read() -> u64 {
        let fpcr: u64;
        // SAFETY: FPCR is readable at EL0.
        unsafe {
            core::arch::asm!(
                "mrs {v}, fpcr",
                v = out(reg) fpcr,
                options(nomem, nostack, preserves_flags),
            );
        }
        fpcr
    }

    #[inline]
    pub fn write(fpcr: u64) {
        // SAFETY: only values previously read back from FPCR, with FZ toggled,
        // are ever written.
        unsafe {
            core::arch::asm!(
                "msr fpcr, {v}",
                v = in(reg) fpcr,
                options(nomem, nostack, preserves_flags),
            );
        }
    }

    pub fn enable(fpcr: u64, mode: DenormalMode) -> u64 {
        let mut flags = Fpcr::from_bits_retain(fpcr);
        if !mode.is_empty() {
            flags.insert(Fpcr::FZ);
        }
        flags.bits()
    }

    pub fn decode(fpcr: u64) -> DenormalMode {
        if Fpcr::from_bits_retain(fpcr).contains(Fpcr::FZ) {
            DenormalMode::all()
        } else {
            DenormalMode::empty()
        }
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod arch {
    use super::DenormalMode;

    pub type ControlWord = ();

    pub const SUPPORTED: DenormalMode = DenormalMode::empty();

    pub fn read() {}

    pub fn write(_: ()) {}

    pub fn enable(_: (), _: DenormalMode) {}

    pub fn decode(_: ()) -> DenormalMode {
        DenormalMode::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_guards_restore_in_order() {
        let before = DenormalGuard::current_mode();
        {
            let _outer = DenormalGuard::with_mode(DenormalMode::FLUSH_TO_ZERO);
            let outer_mode = DenormalGuard::current_mode();
            assert_eq!(DenormalGuard::nesting_depth(), 1);
            {
                let _inner = DenormalGuard::new();
                assert_eq!(DenormalGuard::nesting_depth(), 2);
            }
            assert_eq!(DenormalGuard::current_mode(), outer_mode);
        }
        assert_eq!(DenormalGuard::current_mode(), before);
        assert_eq!(DenormalGuard::nesting_depth(), 0);
    }

    #[test]
    fn empty_mode_changes_nothing() {
        let before = DenormalGuard::current_mode();
        let _guard = DenormalGuard::with_mode(DenormalMode::empty());
        assert_eq!(DenormalGuard::current_mode(), before);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn x86_modes_are_independent() {
        let _guard = DenormalGuard::with_mode(DenormalMode::DENORMALS_ARE_ZERO);
        let mode = DenormalGuard::current_mode();
        assert!(mode.contains(DenormalMode::DENORMALS_ARE_ZERO));
    }

    #[test]
    fn mode_serializes_as_bits() {
        let json = serde_json::to_string(&DenormalMode::all()).unwrap();
        let back: DenormalMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DenormalMode::all());
    }
}
