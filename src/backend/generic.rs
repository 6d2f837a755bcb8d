//! Generic backend: portable per-lane emulation.
//!
//! This backend is the reference semantics. Each vector is a plain lane
//! array and every operation is a per-lane loop over it, so it compiles on
//! any target and has no undefined or platform-dependent corner: integer
//! arithmetic wraps, float arithmetic is IEEE-754, reinterpretation goes
//! through a byte copy. The native backends are tested against it and call
//! into it for operations their instruction sets lack.
//!
//! Its inherent constructors are ordinary functions, exactly as on the native
//! backends, so client code that builds against one backend builds against
//! all of them. None of them is usable in a const item:
//!
//! ```compile_fail
//! use laneflow::backend::generic::I32x4;
//!
//! const V: I32x4 = I32x4::new(3, 2, 1, 0);
//! ```

use core::array;
use core::fmt::{Debug, Formatter};
use core::ops::*;

use super::{
    Backend, BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4,
    Vector128, Widen,
};
use crate::imm::{LaneIndex, ShiftCount};
use crate::lanes::{
    BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2, Lane,
};
use crate::shuffle::{Imm2, Imm4};

/// Generic backend marker.
#[derive(Copy, Clone, Debug, Default)]
pub struct Generic;

impl Backend for Generic {
    const KIND: BackendKind = BackendKind::Generic;
    type I32x4 = I32x4;
    type I64x2 = I64x2;
    type F32x4 = F32x4;
    type F64x2 = F64x2;
    type MaskI32x4 = MaskI32x4;
    type MaskI64x2 = MaskI64x2;
    type MaskF32x4 = MaskF32x4;
    type MaskF64x2 = MaskF64x2;
}

#[inline(always)]
fn zip_with<T: Copy, U, const N: usize>(a: [T; N], b: [T; N], f: impl Fn(T, T) -> U) -> [U; N] {
    array::from_fn(|i| f(a[i], b[i]))
}

/// All ones for a set lane, all zeros otherwise.
#[inline(always)]
fn lane_mask<T: Lane>(set: bool) -> T::Bits {
    let zero = T::ZERO.to_lane_bits();
    [zero, !zero][set as usize]
}

/// Per-lane arithmetic with the semantics every backend must reproduce.
trait LaneArith: Lane {
    fn lane_add(self, rhs: Self) -> Self;
    fn lane_sub(self, rhs: Self) -> Self;
    fn lane_mul(self, rhs: Self) -> Self;
    fn lane_div(self, rhs: Self) -> Self;
    fn lane_neg(self) -> Self;
    fn lane_abs(self) -> Self;
}

// Integer arithmetic wraps to match SIMD semantics. A zero divisor gives 0,
// as AArch64 `sdiv` does.
macro_rules! impl_lane_arith_int {
    ($t:ty) => {
        impl LaneArith for $t {
            #[inline(always)]
            fn lane_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
            #[inline(always)]
            fn lane_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }
            #[inline(always)]
            fn lane_mul(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }
            #[inline(always)]
            fn lane_div(self, rhs: Self) -> Self {
                if rhs == 0 {
                    0
                } else {
                    self.wrapping_div(rhs)
                }
            }
            #[inline(always)]
            fn lane_neg(self) -> Self {
                self.wrapping_neg()
            }
            #[inline(always)]
            fn lane_abs(self) -> Self {
                self.wrapping_abs()
            }
        }
    };
}

macro_rules! impl_lane_arith_float {
    ($t:ty) => {
        impl LaneArith for $t {
            #[inline(always)]
            fn lane_add(self, rhs: Self) -> Self {
                self + rhs
            }
            #[inline(always)]
            fn lane_sub(self, rhs: Self) -> Self {
                self - rhs
            }
            #[inline(always)]
            fn lane_mul(self, rhs: Self) -> Self {
                self * rhs
            }
            #[inline(always)]
            fn lane_div(self, rhs: Self) -> Self {
                self / rhs
            }
            #[inline(always)]
            fn lane_neg(self) -> Self {
                -self
            }
            #[inline(always)]
            fn lane_abs(self) -> Self {
                self.abs()
            }
        }
    };
}

impl_lane_arith_int!(i32);
impl_lane_arith_int!(i64);
impl_lane_arith_float!(f32);
impl_lane_arith_float!(f64);

// ============================================================================
// Masks
// ============================================================================

macro_rules! define_mask {
    ($(#[$meta:meta])* $name:ident, $n:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Default, PartialEq, Eq)]
        pub struct $name([bool; $n]);

        impl $name {
            /// Builds the mask from booleans in lane order.
            #[inline(always)]
            pub fn from_array(lanes: [bool; $n]) -> Self {
                Self(lanes)
            }

            /// Returns the lanes as booleans in lane order.
            #[inline(always)]
            pub fn to_array(self) -> [bool; $n] {
                self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl Mask128 for $name {
            const LANES: usize = $n;

            #[inline(always)]
            fn test<const LANE: i32>(self) -> bool {
                self.0[LaneIndex::<LANE, { $n }>::INDEX]
            }

            #[inline(always)]
            fn splat(value: bool) -> Self {
                Self([value; $n])
            }

            #[inline(always)]
            fn from_bitmask(bits: u8) -> Self {
                Self(array::from_fn(|i| (bits >> i) & 1 != 0))
            }

            #[inline(always)]
            fn bitmask(self) -> u8 {
                self.0
                    .iter()
                    .enumerate()
                    .fold(0, |acc, (i, &lane)| acc | (lane as u8) << i)
            }

            #[inline(always)]
            fn any(self) -> bool {
                self.0.iter().any(|&lane| lane)
            }

            #[inline(always)]
            fn all(self) -> bool {
                self.0.iter().all(|&lane| lane)
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| a & b))
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| a | b))
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| a ^ b))
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                Self(self.0.map(|lane| !lane))
            }
        }
    };
}

define_mask!(
    /// Mask for [`I32x4`].
    MaskI32x4, 4
);
define_mask!(
    /// Mask for [`I64x2`].
    MaskI64x2, 2
);
define_mask!(
    /// Mask for [`F32x4`].
    MaskF32x4, 4
);
define_mask!(
    /// Mask for [`F64x2`].
    MaskF64x2, 2
);

macro_rules! impl_mask_from {
    ($a:ident, $b:ident) => {
        impl From<$a> for $b {
            #[inline(always)]
            fn from(mask: $a) -> Self {
                Self(mask.0)
            }
        }
        impl From<$b> for $a {
            #[inline(always)]
            fn from(mask: $b) -> Self {
                Self(mask.0)
            }
        }
    };
}

impl_mask_from!(MaskI32x4, MaskF32x4);
impl_mask_from!(MaskI64x2, MaskF64x2);

// ============================================================================
// Vectors
// ============================================================================

macro_rules! define_vector {
    (
        $(#[$meta:meta])*
        $name:ident, $t:ty, $n:literal, $generic:ident, $mask:ident, new($($arg:ident),+)
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Default)]
        #[repr(C, align(16))]
        pub struct $name([$t; $n]);

        impl $name {
            /// Builds a vector from lanes given highest lane first.
            #[inline(always)]
            pub fn new($($arg: $t),+) -> Self {
                Self($generic::new($($arg),+).to_array())
            }

            /// Builds a vector from an array in lane order (lane 0 first).
            #[inline(always)]
            pub fn from_array(lanes: [$t; $n]) -> Self {
                Self(lanes)
            }

            /// Returns the lanes in lane order (lane 0 first).
            #[inline(always)]
            pub fn to_array(self) -> [$t; $n] {
                self.0
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline(always)]
            fn add(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, <$t as LaneArith>::lane_add))
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline(always)]
            fn sub(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, <$t as LaneArith>::lane_sub))
            }
        }

        impl Mul for $name {
            type Output = Self;
            #[inline(always)]
            fn mul(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, <$t as LaneArith>::lane_mul))
            }
        }

        impl Div for $name {
            type Output = Self;
            #[inline(always)]
            fn div(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, <$t as LaneArith>::lane_div))
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline(always)]
            fn neg(self) -> Self {
                Self(self.0.map(<$t as LaneArith>::lane_neg))
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| {
                    <$t>::from_lane_bits(a.to_lane_bits() & b.to_lane_bits())
                }))
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| {
                    <$t>::from_lane_bits(a.to_lane_bits() | b.to_lane_bits())
                }))
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| {
                    <$t>::from_lane_bits(a.to_lane_bits() ^ b.to_lane_bits())
                }))
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                Self(self.0.map(|a| <$t>::from_lane_bits(!a.to_lane_bits())))
            }
        }

        impl Vector128 for $name {
            type Scalar = $t;
            type Generic = $generic;
            type Mask = $mask;
            const LANES: usize = $n;

            #[inline(always)]
            fn splat(value: $t) -> Self {
                Self([value; $n])
            }

            #[inline(always)]
            fn from_generic(lanes: $generic) -> Self {
                Self(lanes.to_array())
            }

            #[inline(always)]
            fn to_generic(self) -> $generic {
                $generic::from_array(self.0)
            }

            #[inline(always)]
            fn and_not(self, rhs: Self) -> Self {
                self & !rhs
            }

            #[inline(always)]
            fn cmp_eq(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a == b))
            }

            #[inline(always)]
            fn cmp_ne(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a != b))
            }

            #[inline(always)]
            fn cmp_lt(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a < b))
            }

            #[inline(always)]
            fn cmp_le(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a <= b))
            }

            #[inline(always)]
            fn cmp_gt(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a > b))
            }

            #[inline(always)]
            fn cmp_ge(self, rhs: Self) -> $mask {
                $mask(zip_with(self.0, rhs.0, |a, b| a >= b))
            }

            #[inline(always)]
            fn select(mask: $mask, if_true: Self, if_false: Self) -> Self {
                Self(array::from_fn(|i| {
                    let m = lane_mask::<$t>(mask.0[i]);
                    <$t>::from_lane_bits(
                        (if_true.0[i].to_lane_bits() & m) | (if_false.0[i].to_lane_bits() & !m),
                    )
                }))
            }

            #[inline(always)]
            fn select_or_zero(mask: $mask, if_true: Self) -> Self {
                Self(array::from_fn(|i| {
                    <$t>::from_lane_bits(if_true.0[i].to_lane_bits() & lane_mask::<$t>(mask.0[i]))
                }))
            }

            #[inline(always)]
            fn min(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| if a < b { a } else { b }))
            }

            #[inline(always)]
            fn max(self, rhs: Self) -> Self {
                Self(zip_with(self.0, rhs.0, |a, b| if a > b { a } else { b }))
            }

            #[inline(always)]
            fn abs(self) -> Self {
                Self(self.0.map(<$t as LaneArith>::lane_abs))
            }

            #[inline(always)]
            fn get<const LANE: i32>(self) -> $t {
                self.0[LaneIndex::<LANE, $n>::INDEX]
            }

            #[inline(always)]
            fn with<const LANE: i32>(self, value: $t) -> Self {
                let mut lanes = self.0;
                lanes[LaneIndex::<LANE, $n>::INDEX] = value;
                Self(lanes)
            }
        }
    };
}

define_vector!(
    /// Four `i32` lanes.
    I32x4, i32, 4, GenericI32x4, MaskI32x4, new(lane3, lane2, lane1, lane0)
);
define_vector!(
    /// Two `i64` lanes.
    I64x2, i64, 2, GenericI64x2, MaskI64x2, new(lane1, lane0)
);
define_vector!(
    /// Four `f32` lanes.
    F32x4, f32, 4, GenericF32x4, MaskF32x4, new(lane3, lane2, lane1, lane0)
);
define_vector!(
    /// Two `f64` lanes.
    F64x2, f64, 2, GenericF64x2, MaskF64x2, new(lane1, lane0)
);

macro_rules! impl_int_vector {
    ($name:ident, $t:ty, $u:ty, $bits:literal, $float:ident, $f:ty) => {
        impl IntVector128 for $name {
            type Float = $float;
            const BITS: u32 = $bits;

            #[inline(always)]
            fn shl_imm<const N: i32>(self) -> Self {
                let n = ShiftCount::<N, $bits>::COUNT;
                Self(self.0.map(|x| x << n))
            }

            #[inline(always)]
            fn shr_imm<const N: i32>(self) -> Self {
                let n = ShiftCount::<N, $bits>::COUNT;
                Self(self.0.map(|x| x >> n))
            }

            #[inline(always)]
            fn shr_logical_imm<const N: i32>(self) -> Self {
                let n = ShiftCount::<N, $bits>::COUNT;
                Self(self.0.map(|x| ((x as $u) >> n) as $t))
            }

            #[inline(always)]
            fn shl(self, count: u32) -> Self {
                if count >= $bits {
                    return Self::default();
                }
                Self(self.0.map(|x| x << count))
            }

            #[inline(always)]
            fn shr(self, count: u32) -> Self {
                let count = count.min($bits - 1);
                Self(self.0.map(|x| x >> count))
            }

            #[inline(always)]
            fn shr_logical(self, count: u32) -> Self {
                if count >= $bits {
                    return Self::default();
                }
                Self(self.0.map(|x| ((x as $u) >> count) as $t))
            }

            #[inline(always)]
            fn to_float(self) -> $float {
                $float(self.0.map(|x| x as $f))
            }
        }
    };
}

impl_int_vector!(I32x4, i32, u32, 32, F32x4, f32);
impl_int_vector!(I64x2, i64, u64, 64, F64x2, f64);

// `as` from float to integer saturates and maps NaN to zero, which is the
// conversion contract of every backend.
macro_rules! impl_float_vector {
    ($name:ident, $t:ty, $mask:ident, $int:ident, $i:ty) => {
        impl FloatVector128 for $name {
            type Int = $int;

            #[inline(always)]
            fn sqrt(self) -> Self {
                Self(self.0.map(<$t>::sqrt))
            }

            #[inline(always)]
            fn floor(self) -> Self {
                Self(self.0.map(<$t>::floor))
            }

            #[inline(always)]
            fn ceil(self) -> Self {
                Self(self.0.map(<$t>::ceil))
            }

            #[inline(always)]
            fn trunc(self) -> Self {
                Self(self.0.map(<$t>::trunc))
            }

            #[inline(always)]
            fn round_even(self) -> Self {
                Self(self.0.map(<$t>::round_ties_even))
            }

            #[inline(always)]
            fn is_nan(self) -> $mask {
                $mask(self.0.map(<$t>::is_nan))
            }

            #[inline(always)]
            fn round_nearest_even(self) -> $int {
                $int(self.0.map(|x| x.round_ties_even() as $i))
            }

            #[inline(always)]
            fn truncate_toward_zero(self) -> $int {
                $int(self.0.map(|x| x as $i))
            }

            #[inline(always)]
            fn floor_toward_negative_infinity(self) -> $int {
                $int(self.0.map(|x| x.floor() as $i))
            }
        }
    };
}

impl_float_vector!(F32x4, f32, MaskF32x4, I32x4, i32);
impl_float_vector!(F64x2, f64, MaskF64x2, I64x2, i64);

macro_rules! impl_shuffle4 {
    ($name:ident) => {
        impl Shuffle4 for $name {
            #[inline(always)]
            fn shuffle<const IMM: i32>(self) -> Self {
                if Imm4::<IMM>::IS_IDENTITY {
                    return self;
                }
                Self(Imm4::<IMM>::LANES.map(|l| self.0[l]))
            }
        }
    };
}

macro_rules! impl_shuffle2 {
    ($name:ident) => {
        impl Shuffle2 for $name {
            #[inline(always)]
            fn shuffle<const IMM: i32>(self) -> Self {
                if Imm2::<IMM>::IS_IDENTITY {
                    return self;
                }
                Self(Imm2::<IMM>::LANES.map(|l| self.0[l]))
            }
        }
    };
}

impl_shuffle4!(I32x4);
impl_shuffle4!(F32x4);
impl_shuffle2!(I64x2);
impl_shuffle2!(F64x2);

impl Widen for I32x4 {
    type Wide = I64x2;
    #[inline(always)]
    fn widen(self) -> I64x2 {
        I64x2([self.0[0] as i64, self.0[1] as i64])
    }
}

impl Widen for F32x4 {
    type Wide = F64x2;
    #[inline(always)]
    fn widen(self) -> F64x2 {
        F64x2([self.0[0] as f64, self.0[1] as f64])
    }
}

impl Narrow for I64x2 {
    type Narrowed = I32x4;
    #[inline(always)]
    fn narrow(self) -> I32x4 {
        I32x4([self.0[0] as i32, self.0[1] as i32, 0, 0])
    }
}

impl Narrow for F64x2 {
    type Narrowed = F32x4;
    #[inline(always)]
    fn narrow(self) -> F32x4 {
        F32x4([self.0[0] as f32, self.0[1] as f32, 0.0, 0.0])
    }
}

// Reinterpretation copies bytes; no value is ever read through a pointer of
// another type.
macro_rules! impl_bitcast {
    ($from:ident => $($to:ident($generic:ident)),+) => {
        $(
            impl BitCast<$to> for $from {
                #[inline(always)]
                fn bit_cast(self) -> $to {
                    $to::from_generic($generic::from_bytes(self.to_generic().to_bytes()))
                }
            }
        )+
    };
}

impl_bitcast!(I32x4 => I64x2(GenericI64x2), F32x4(GenericF32x4), F64x2(GenericF64x2));
impl_bitcast!(I64x2 => I32x4(GenericI32x4), F32x4(GenericF32x4), F64x2(GenericF64x2));
impl_bitcast!(F32x4 => I32x4(GenericI32x4), I64x2(GenericI64x2), F64x2(GenericF64x2));
impl_bitcast!(F64x2 => I32x4(GenericI32x4), I64x2(GenericI64x2), F32x4(GenericF32x4));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::{perm2, perm4};

    #[test]
    fn integer_arithmetic_wraps() {
        let a = I32x4::splat(i32::MAX);
        assert_eq!((a + I32x4::splat(1)).to_array(), [i32::MIN; 4]);
        assert_eq!((-I32x4::splat(i32::MIN)).to_array(), [i32::MIN; 4]);
        assert_eq!((I64x2::splat(i64::MIN) / I64x2::splat(-1)).to_array(), [i64::MIN; 2]);
        assert_eq!(I32x4::splat(i32::MIN).abs().to_array(), [i32::MIN; 4]);
    }

    #[test]
    fn bitwise_ops_act_on_float_bits() {
        let sign = F32x4::splat(-0.0);
        let v = F32x4::from_array([1.0, -2.0, 3.0, -4.0]);
        assert_eq!((v ^ sign).to_array(), [-1.0, 2.0, -3.0, 4.0]);
        assert_eq!(v.and_not(sign).to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn runtime_shifts_saturate() {
        let v = I64x2::from_array([-8, 8]);
        assert_eq!(v.shr(64).to_array(), [-1, 0]);
        assert_eq!(v.shr(1000).to_array(), [-1, 0]);
        assert_eq!(v.shl(64).to_array(), [0, 0]);
        assert_eq!(v.shr_logical(64).to_array(), [0, 0]);
        assert_eq!(v.shr(2).to_array(), [-2, 2]);
        assert_eq!(v.shr_logical(60).to_array(), [0xF, 0]);
    }

    #[test]
    fn float_to_int_saturates() {
        let v = F32x4::from_array([f32::NAN, 3e9, -3e9, f32::INFINITY]);
        assert_eq!(v.truncate_toward_zero().to_array(), [0, i32::MAX, i32::MIN, i32::MAX]);
        assert_eq!(v.round_nearest_even().to_array(), [0, i32::MAX, i32::MIN, i32::MAX]);
    }

    #[test]
    fn rounding_keeps_sign_of_zero() {
        let v = F64x2::from_array([-0.5, 0.5]);
        assert_eq!(v.ceil().to_array()[0].to_bits(), (-0.0f64).to_bits());
        assert_eq!(v.trunc().to_array()[0].to_bits(), (-0.0f64).to_bits());
        assert_eq!(v.round_even().to_array(), [-0.0, 0.0]);
        assert_eq!(v.floor().to_array(), [-1.0, 0.0]);
    }

    #[test]
    fn widen_and_narrow_use_low_lanes() {
        let wide = I32x4::from_array([-1, 2, 3, 4]).widen();
        assert_eq!(wide.to_array(), [-1, 2]);
        let narrow = I64x2::from_array([0x1_0000_0005, -1]).narrow();
        assert_eq!(narrow.to_array(), [5, -1, 0, 0]);
        let f = F64x2::from_array([0.1, 1e300]).narrow();
        assert_eq!(f.to_array(), [0.1f32, f32::INFINITY, 0.0, 0.0]);
    }

    #[test]
    fn shuffles_follow_index_lists() {
        let v = F32x4::from_array([0.0, 1.0, 2.0, 3.0]);
        assert_eq!(v.shuffle::<{ perm4(3, 3, 0, 1) }>().to_array(), [3.0, 3.0, 0.0, 1.0]);
        let w = I64x2::from_array([10, 20]);
        assert_eq!(w.shuffle::<{ perm2(1, 0) }>().to_array(), [20, 10]);
    }

    #[test]
    fn masks_report_bits() {
        let m = I32x4::from_array([1, 5, 2, 9]).cmp_gt(I32x4::splat(2));
        assert_eq!(m.to_array(), [false, true, false, true]);
        assert_eq!(m.bitmask(), 0b1010);
        assert_eq!(MaskI32x4::from_bitmask(0b1010), m);
        assert!(m.any() && !m.all());
        assert_eq!(MaskF32x4::from(m).to_array(), m.to_array());
    }

    #[test]
    fn bit_cast_is_a_byte_copy() {
        let v = F32x4::from_array([1.0, -0.0, f32::INFINITY, 0.5]);
        let bits: I32x4 = v.bit_cast();
        assert_eq!(
            bits.to_array(),
            [0x3F80_0000, i32::MIN, 0x7F80_0000, 0x3F00_0000]
        );
        let back: F32x4 = bits.bit_cast();
        assert_eq!(back.to_generic(), v.to_generic());
    }

    #[test]
    fn select_moves_lane_bits_untouched() {
        let nan = f32::from_bits(0x7FC0_1234);
        let t = F32x4::from_array([nan, -0.0, 1.0, -0.0]);
        let f = F32x4::from_array([2.0, 3.0, f32::NEG_INFINITY, 4.0]);
        let mask = MaskF32x4::from_bitmask(0b0011);

        let out = F32x4::select(mask, t, f).to_generic();
        assert_eq!(out, GenericF32x4::from_array([nan, -0.0, f32::NEG_INFINITY, 4.0]));

        let zeroed = F32x4::select_or_zero(mask, t).to_generic();
        assert_eq!(zeroed.to_bits(), [0x7FC0_1234, 0x8000_0000, 0, 0]);
    }

    #[test]
    fn integer_division_by_zero_is_zero() {
        let q = I32x4::from_array([7, i32::MIN, -3, 0]) / I32x4::from_array([0, -1, 0, 0]);
        assert_eq!(q.to_array(), [0, i32::MIN, 0, 0]);
    }
}
