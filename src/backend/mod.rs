//! Backend traits.
//!
//! Every backend provides the same four vector shapes and four mask shapes
//! and implements the traits below for them. Client code written against
//! these traits (or against the crate-root re-exports, which name the
//! selected backend's types) runs unchanged on every backend.
//!
//! # Layers
//!
//! - [`Vector128`]: construction, lane access, arithmetic, bitwise ops,
//!   comparisons and selection. Shared by all shapes.
//! - [`IntVector128`] / [`FloatVector128`]: shifts and integer-to-float
//!   conversion; rounding and float-to-integer conversion.
//! - [`Shuffle4`] / [`Shuffle2`]: compile-time lane permutation.
//! - [`Widen`] / [`Narrow`] / [`BitCast`]: shape changes.
//! - [`Mask128`]: per-lane booleans produced by comparisons.
//!
//! Masks have no numeric operators and no path to a vector type; the only
//! things a mask can do are combine with other masks and drive a select.

use core::fmt::Debug;
use core::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Sub};

use crate::lanes::{
    BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2, Lane,
};

pub mod generic;

#[cfg(target_arch = "x86_64")]
pub mod x86;

#[cfg(target_arch = "aarch64")]
pub mod arm;

/// A complete set of vector and mask types for one execution backend.
///
/// The associated-type bounds pin down which shapes convert, widen, narrow
/// and reinterpret into which, so code generic over `B: Backend` can use the
/// whole surface.
pub trait Backend: 'static + Copy + Clone + Debug + Default + Send + Sync {
    /// Which backend this is.
    const KIND: BackendKind;

    /// Four `i32` lanes.
    type I32x4: IntVector128<Scalar = i32, Generic = GenericI32x4, Mask = Self::MaskI32x4, Float = Self::F32x4>
        + Shuffle4
        + Widen<Wide = Self::I64x2>
        + BitCast<Self::I64x2>
        + BitCast<Self::F32x4>
        + BitCast<Self::F64x2>;

    /// Two `i64` lanes.
    type I64x2: IntVector128<Scalar = i64, Generic = GenericI64x2, Mask = Self::MaskI64x2, Float = Self::F64x2>
        + Shuffle2
        + Narrow<Narrowed = Self::I32x4>
        + BitCast<Self::I32x4>
        + BitCast<Self::F32x4>
        + BitCast<Self::F64x2>;

    /// Four `f32` lanes.
    type F32x4: FloatVector128<Scalar = f32, Generic = GenericF32x4, Mask = Self::MaskF32x4, Int = Self::I32x4>
        + Shuffle4
        + Widen<Wide = Self::F64x2>
        + BitCast<Self::I32x4>
        + BitCast<Self::I64x2>
        + BitCast<Self::F64x2>;

    /// Two `f64` lanes.
    type F64x2: FloatVector128<Scalar = f64, Generic = GenericF64x2, Mask = Self::MaskF64x2, Int = Self::I64x2>
        + Shuffle2
        + Narrow<Narrowed = Self::F32x4>
        + BitCast<Self::I32x4>
        + BitCast<Self::I64x2>
        + BitCast<Self::F32x4>;

    /// Mask for [`Backend::I32x4`].
    type MaskI32x4: Mask128 + From<Self::MaskF32x4>;
    /// Mask for [`Backend::I64x2`].
    type MaskI64x2: Mask128 + From<Self::MaskF64x2>;
    /// Mask for [`Backend::F32x4`].
    type MaskF32x4: Mask128 + From<Self::MaskI32x4>;
    /// Mask for [`Backend::F64x2`].
    type MaskF64x2: Mask128 + From<Self::MaskI64x2>;
}

/// Per-lane booleans.
///
/// Every lane is all-zeros (false) or all-ones (true) in the backend's
/// register representation. Bit `i` of [`Mask128::bitmask`] is lane `i`.
pub trait Mask128:
    Copy
    + Clone
    + Debug
    + Default
    + PartialEq
    + Eq
    + Send
    + Sync
    + 'static
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Number of lanes.
    const LANES: usize;

    /// Every lane set to `value`.
    fn splat(value: bool) -> Self;

    /// Lane `i` is true when bit `i` of `bits` is set. Bits at or above
    /// [`Mask128::LANES`] are ignored.
    fn from_bitmask(bits: u8) -> Self;

    /// One bit per lane, lane 0 in bit 0.
    fn bitmask(self) -> u8;

    /// True if any lane is true.
    #[inline(always)]
    fn any(self) -> bool {
        self.bitmask() != 0
    }

    /// True if every lane is true.
    #[inline(always)]
    fn all(self) -> bool {
        self.bitmask() == ((1u16 << Self::LANES) - 1) as u8
    }

    /// True if no lane is true.
    #[inline(always)]
    fn none(self) -> bool {
        !self.any()
    }

    /// Reads lane `LANE`. An out-of-range lane fails to compile.
    fn test<const LANE: i32>(self) -> bool;

    /// `if_true` where this mask is set, `if_false` elsewhere.
    #[inline(always)]
    fn select<V: Vector128<Mask = Self>>(self, if_true: V, if_false: V) -> V {
        V::select(self, if_true, if_false)
    }

    /// `if_true` where this mask is set, zero elsewhere.
    #[inline(always)]
    fn select_or_zero<V: Vector128<Mask = Self>>(self, if_true: V) -> V {
        V::select_or_zero(self, if_true)
    }
}

/// Operations shared by every vector shape.
///
/// Integer arithmetic wraps. Float arithmetic follows IEEE-754 in the
/// thread's current rounding mode. Bitwise operators act on the raw lane
/// bits for float shapes too.
pub trait Vector128:
    Copy
    + Clone
    + Debug
    + Default
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Lane type.
    type Scalar: Lane;
    /// Plain per-lane struct used for inspection and exchange.
    type Generic: Copy + Debug + Default + PartialEq + Eq;
    /// Mask produced by comparisons on this shape.
    type Mask: Mask128;

    /// Number of lanes.
    const LANES: usize;

    /// Every lane set to `value`.
    fn splat(value: Self::Scalar) -> Self;

    /// Loads lanes from the generic struct.
    fn from_generic(lanes: Self::Generic) -> Self;

    /// Stores lanes into the generic struct.
    fn to_generic(self) -> Self::Generic;

    /// `self & !rhs`.
    fn and_not(self, rhs: Self) -> Self;

    /// Lane-wise `==`. NaN is unequal to everything.
    fn cmp_eq(self, rhs: Self) -> Self::Mask;
    /// Lane-wise `!=`. True for NaN.
    fn cmp_ne(self, rhs: Self) -> Self::Mask;
    /// Lane-wise `<`.
    fn cmp_lt(self, rhs: Self) -> Self::Mask;
    /// Lane-wise `<=`.
    fn cmp_le(self, rhs: Self) -> Self::Mask;
    /// Lane-wise `>`.
    fn cmp_gt(self, rhs: Self) -> Self::Mask;
    /// Lane-wise `>=`.
    fn cmp_ge(self, rhs: Self) -> Self::Mask;

    /// `if_true` where `mask` is set, `if_false` elsewhere. Branchless.
    fn select(mask: Self::Mask, if_true: Self, if_false: Self) -> Self;

    /// `if_true` where `mask` is set, zero elsewhere.
    ///
    /// One instruction cheaper than [`Vector128::select`] with a zero
    /// `if_false`; use it whenever the else-branch is zero.
    fn select_or_zero(mask: Self::Mask, if_true: Self) -> Self;

    /// Lane-wise minimum: `if self < rhs { self } else { rhs }`.
    ///
    /// For floats this is the fast form: when either lane is NaN, or both
    /// are zeros of either sign, the result is `rhs`'s lane. Normalise with
    /// [`FloatVector128::remove_signed_zero`] first if the sign of a zero
    /// result matters.
    fn min(self, rhs: Self) -> Self;

    /// Lane-wise maximum: `if self > rhs { self } else { rhs }`.
    ///
    /// Same NaN and signed-zero rule as [`Vector128::min`].
    fn max(self, rhs: Self) -> Self;

    /// `self.max(lo).min(hi)`.
    #[inline(always)]
    fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// Lane-wise absolute value. Integer `MIN` maps to itself; float `abs`
    /// clears the sign bit (NaN included).
    fn abs(self) -> Self;

    /// Divides, substituting `1` for every zero lane of `divisor` so the
    /// division itself can never trap. The affected result lanes hold the
    /// undivided dividend and are meant to be masked out by the caller.
    #[inline(always)]
    fn safe_divide(self, divisor: Self) -> Self {
        let zero = divisor.cmp_eq(Self::default());
        self / Self::select(zero, Self::splat(<Self::Scalar as Lane>::ONE), divisor)
    }

    /// Reads lane `LANE`. Out-of-range lanes do not compile.
    fn get<const LANE: i32>(self) -> Self::Scalar;

    /// Returns a copy with lane `LANE` replaced by `value`.
    fn with<const LANE: i32>(self, value: Self::Scalar) -> Self;
}

/// Integer shapes.
pub trait IntVector128: Vector128 {
    /// Float shape with the same lane count.
    type Float: FloatVector128;

    /// Lane width in bits.
    const BITS: u32;

    /// Shift left by a constant. `N` must be below [`IntVector128::BITS`].
    fn shl_imm<const N: i32>(self) -> Self;
    /// Arithmetic shift right by a constant.
    fn shr_imm<const N: i32>(self) -> Self;
    /// Logical shift right by a constant.
    fn shr_logical_imm<const N: i32>(self) -> Self;

    /// Shift left; counts at or above the lane width give zero.
    fn shl(self, count: u32) -> Self;
    /// Arithmetic shift right; counts at or above the lane width give the
    /// sign mask (all-ones for negative lanes, zero otherwise).
    fn shr(self, count: u32) -> Self;
    /// Logical shift right; counts at or above the lane width give zero.
    fn shr_logical(self, count: u32) -> Self;

    /// Converts to float, rounding to nearest-even where the value is not
    /// exactly representable.
    fn to_float(self) -> Self::Float;
}

/// Float shapes.
///
/// Float-to-integer conversion always names its rounding. Results outside
/// the integer range saturate to `MIN`/`MAX` and NaN converts to zero on
/// every backend.
pub trait FloatVector128: Vector128 {
    /// Integer shape with the same lane count.
    type Int: IntVector128;

    /// Lane-wise square root.
    fn sqrt(self) -> Self;
    /// Round toward negative infinity.
    fn floor(self) -> Self;
    /// Round toward positive infinity.
    fn ceil(self) -> Self;
    /// Round toward zero.
    fn trunc(self) -> Self;
    /// Round to nearest, ties to even.
    fn round_even(self) -> Self;

    /// True in lanes holding NaN.
    fn is_nan(self) -> Self::Mask;

    /// Replaces `-0.0` with `+0.0`; every other value, NaN included, is
    /// unchanged.
    #[inline(always)]
    fn remove_signed_zero(self) -> Self {
        Self::select_or_zero(self.cmp_ne(Self::default()), self)
    }

    /// Converts to integer, rounding to nearest with ties to even.
    fn round_nearest_even(self) -> Self::Int;
    /// Converts to integer, rounding toward zero.
    fn truncate_toward_zero(self) -> Self::Int;
    /// Converts to integer, rounding toward negative infinity.
    fn floor_toward_negative_infinity(self) -> Self::Int;
}

/// Permutation of a 4-lane shape.
pub trait Shuffle4: Vector128 {
    /// Destination lane `i` takes source lane `(IMM >> 2 * i) & 3`.
    ///
    /// Build `IMM` with [`crate::shuffle::perm4`] or use the
    /// [`shuffle!`](crate::shuffle!) macro.
    fn shuffle<const IMM: i32>(self) -> Self;
}

/// Permutation of a 2-lane shape.
pub trait Shuffle2: Vector128 {
    /// Destination lane `i` takes source lane `(IMM >> i) & 1`.
    ///
    /// Build `IMM` with [`crate::shuffle::perm2`] or use the
    /// [`shuffle!`](crate::shuffle!) macro.
    fn shuffle<const IMM: i32>(self) -> Self;
}

/// 4-lane to 2-lane conversion of lanes 0 and 1; lanes 2 and 3 are dropped.
pub trait Widen {
    /// The double-width shape.
    type Wide;
    /// Sign-extends integers; converts `f32` to `f64` exactly.
    fn widen(self) -> Self::Wide;
}

/// 2-lane to 4-lane conversion into lanes 0 and 1; lanes 2 and 3 are zero.
pub trait Narrow {
    /// The half-width shape.
    type Narrowed;
    /// Truncates integers (two's complement); rounds `f64` to the nearest
    /// `f32`, ties to even.
    fn narrow(self) -> Self::Narrowed;
}

/// Same-size reinterpretation. The bit pattern is unchanged.
pub trait BitCast<To> {
    /// Reinterprets `self` as `To`.
    fn bit_cast(self) -> To;
}
