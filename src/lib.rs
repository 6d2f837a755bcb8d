//! # laneflow
//!
//! Fixed-width 128-bit vectors with one semantic surface over three
//! backends: SSE on x86_64, NEON on AArch64, and a portable generic backend
//! that every target can build and that defines the reference results.
//!
//! ## Design Philosophy
//!
//! **The backend is chosen at build time; the types never change.**
//!
//! - `I32x4`, `I64x2`, `F32x4`, `F64x2`: the four vector shapes
//! - `MaskI32x4` .. `MaskF64x2`: one comparison-mask type per shape
//! - `Generic*` lane structs: plain per-lane views for inspection and tests
//!
//! The crate root re-exports the selected backend's types. The generic
//! backend is always compiled under [`backend::generic`] so native results
//! can be checked against it.
//!
//! ```
//! use laneflow::prelude::*;
//!
//! let v = I32x4::new(3, 2, 1, 0);
//! let reversed = shuffle!(v, [3, 2, 1, 0]);
//! assert_eq!(reversed.to_generic(), GenericI32x4::new(0, 1, 2, 3));
//!
//! let mask = v.cmp_gt(I32x4::splat(1));
//! let picked = I32x4::select(mask, I32x4::new(40, 30, 20, 10), I32x4::new(400, 300, 200, 100));
//! assert_eq!(picked.to_generic(), GenericI32x4::new(40, 30, 200, 100));
//! ```

pub mod backend;
pub mod config;
pub mod fpenv;
/// Compile-time checks for lane indices and shift immediates.
pub mod imm;
pub mod lanes;
pub mod safe;
pub mod selftest;
pub mod shuffle;

pub use backend::{
    Backend, BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4,
    Vector128, Widen,
};
pub use fpenv::{DenormalGuard, DenormalMode};
pub use lanes::{BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2, Lane};
pub use shuffle::{perm2, perm4};

// ============================================================================
// Active backend
// ============================================================================

#[cfg(all(laneflow_sse, target_arch = "x86_64"))]
pub use backend::x86::{
    F32x4, F64x2, I32x4, I64x2, MaskF32x4, MaskF64x2, MaskI32x4, MaskI64x2, Sse as Active,
};

#[cfg(all(laneflow_neon, target_arch = "aarch64"))]
pub use backend::arm::{
    F32x4, F64x2, I32x4, I64x2, MaskF32x4, MaskF64x2, MaskI32x4, MaskI64x2, Neon as Active,
};

#[cfg(not(any(
    all(laneflow_sse, target_arch = "x86_64"),
    all(laneflow_neon, target_arch = "aarch64")
)))]
pub use backend::generic::{
    F32x4, F64x2, I32x4, I64x2, MaskF32x4, MaskF64x2, MaskI32x4, MaskI64x2, Generic as Active,
};

/// The backend the crate-root types come from.
pub const ACTIVE_BACKEND: BackendKind = <Active as Backend>::KIND;

/// Reinterprets the bits of `v` as another shape of the same width.
///
/// ```
/// use laneflow::prelude::*;
///
/// let bits: I32x4 = laneflow::cast(F32x4::splat(1.0));
/// assert_eq!(bits.to_array(), [0x3F80_0000; 4]);
/// ```
#[inline(always)]
pub fn cast<From: BitCast<To>, To>(v: From) -> To {
    v.bit_cast()
}

/// Everything most call sites need.
pub mod prelude {
    pub use crate::backend::{
        BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4, Vector128,
        Widen,
    };
    pub use crate::lanes::{GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2};
    pub use crate::shuffle;
    pub use crate::shuffle::{perm2, perm4};
    pub use crate::{F32x4, F64x2, I32x4, I64x2, MaskF32x4, MaskF64x2, MaskI32x4, MaskI64x2};
}
