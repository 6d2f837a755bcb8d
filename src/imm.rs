//! Compile-time validation of immediate operands.
//!
//! Lane indices and shift counts are `const` generics. Each check lives in an
//! associated const, so an out-of-range value is a compile error at the call
//! site that instantiates it, never a runtime branch.

/// Validates a lane index against a shape's lane count.
///
/// ```
/// use laneflow::prelude::*;
///
/// let v = I32x4::new(3, 2, 1, 0);
/// assert_eq!(v.get::<3>(), 3);
/// assert_eq!(v.with::<0>(9).get::<0>(), 9);
/// assert!(v.cmp_gt(I32x4::splat(0)).test::<1>());
/// ```
///
/// Reading past the last lane does not compile:
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = I32x4::splat(1).get::<4>();
/// ```
///
/// Neither does a negative index:
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = F64x2::splat(1.0).with::<{ -1 }>(0.0);
/// ```
///
/// Masks check their lane the same way:
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = MaskF64x2::splat(true).test::<2>();
/// ```
///
/// ```compile_fail
/// let _ = laneflow::imm::LaneIndex::<4, 4>::INDEX;
/// ```
pub struct LaneIndex<const LANE: i32, const LANES: usize>;

impl<const LANE: i32, const LANES: usize> LaneIndex<LANE, LANES> {
    /// The validated index.
    pub const INDEX: usize = {
        assert!(
            LANE >= 0 && (LANE as usize) < LANES,
            "lane index out of range for this vector shape"
        );
        LANE as usize
    };
}

/// Validates an immediate shift count against a lane width in bits.
///
/// ```
/// use laneflow::prelude::*;
///
/// assert_eq!(I64x2::splat(1).shl_imm::<63>().to_array(), [i64::MIN; 2]);
/// ```
///
/// A count equal to the lane width does not compile:
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = I64x2::splat(1).shl_imm::<64>();
/// ```
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = I32x4::splat(-1).shr_imm::<32>();
/// ```
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = I32x4::splat(-1).shr_logical_imm::<{ -1 }>();
/// ```
pub struct ShiftCount<const N: i32, const BITS: u32>;

impl<const N: i32, const BITS: u32> ShiftCount<N, BITS> {
    /// The validated shift count.
    pub const COUNT: u32 = {
        assert!(
            N >= 0 && (N as u32) < BITS,
            "shift immediate must be smaller than the lane width"
        );
        N as u32
    };
}
