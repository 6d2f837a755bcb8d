//! x86_64 backend (SSE2 baseline).
//!
//! SSE2 is part of the x86_64 baseline, so every operation here has an SSE2
//! implementation. When the target enables SSSE3, SSE4.1 or SSE4.2 (for
//! example with `-C target-cpu=native`), single-instruction forms replace the
//! SSE2 sequences; both paths produce the same bits.
//!
//! The SSE2 rounding sequences assume the MXCSR rounding mode is
//! round-to-nearest, which is the default and is never changed by this crate.

use core::array;
use core::arch::x86_64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

use super::generic;
use super::{
    Backend, BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4,
    Vector128, Widen,
};
use crate::imm::{LaneIndex, ShiftCount};
use crate::lanes::{BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2};
use crate::shuffle::{Imm2, Imm4};

/// SSE backend marker.
#[derive(Copy, Clone, Debug, Default)]
pub struct Sse;

impl Backend for Sse {
    const KIND: BackendKind = BackendKind::Sse;
    type I32x4 = I32x4;
    type I64x2 = I64x2;
    type F32x4 = F32x4;
    type F64x2 = F64x2;
    type MaskI32x4 = MaskI32x4;
    type MaskI64x2 = MaskI64x2;
    type MaskF32x4 = MaskF32x4;
    type MaskF64x2 = MaskF64x2;
}

// ============================================================================
// Helpers
// ============================================================================

#[inline(always)]
unsafe fn all_ones() -> __m128i {
    _mm_set1_epi32(-1)
}

#[inline(always)]
unsafe fn blend_si128(mask: __m128i, if_true: __m128i, if_false: __m128i) -> __m128i {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_blendv_epi8(if_false, if_true, mask)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        // _mm_andnot_si128(a, b) computes (!a) & b
        _mm_or_si128(_mm_and_si128(mask, if_true), _mm_andnot_si128(mask, if_false))
    }
}

#[inline(always)]
unsafe fn blend_ps(mask: __m128, if_true: __m128, if_false: __m128) -> __m128 {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_blendv_ps(if_false, if_true, mask)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        _mm_or_ps(_mm_and_ps(mask, if_true), _mm_andnot_ps(mask, if_false))
    }
}

#[inline(always)]
unsafe fn blend_pd(mask: __m128d, if_true: __m128d, if_false: __m128d) -> __m128d {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_blendv_pd(if_false, if_true, mask)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        _mm_or_pd(_mm_and_pd(mask, if_true), _mm_andnot_pd(mask, if_false))
    }
}

/// Low 32 bits of each lane product.
#[inline(always)]
unsafe fn mullo_epi32(a: __m128i, b: __m128i) -> __m128i {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_mullo_epi32(a, b)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        // pmuludq multiplies lanes 0 and 2 into 64-bit products. Shift the
        // odd lanes down to get the other two, then gather the low halves.
        let even = _mm_mul_epu32(a, b);
        let odd = _mm_mul_epu32(_mm_srli_epi64::<32>(a), _mm_srli_epi64::<32>(b));
        let even = _mm_shuffle_epi32::<0b00_00_10_00>(even);
        let odd = _mm_shuffle_epi32::<0b00_00_10_00>(odd);
        _mm_unpacklo_epi32(even, odd)
    }
}

#[inline(always)]
unsafe fn cmpeq_epi64(a: __m128i, b: __m128i) -> __m128i {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_cmpeq_epi64(a, b)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        // Both 32-bit halves must match: AND each half with its neighbour.
        let eq = _mm_cmpeq_epi32(a, b);
        _mm_and_si128(eq, _mm_shuffle_epi32::<0b10_11_00_01>(eq))
    }
}

#[inline(always)]
unsafe fn cmpgt_epi64(a: __m128i, b: __m128i) -> __m128i {
    #[cfg(target_feature = "sse4.2")]
    {
        _mm_cmpgt_epi64(a, b)
    }
    #[cfg(not(target_feature = "sse4.2"))]
    {
        // Signed compare of the high halves; on a tie, unsigned compare of
        // the low halves (flipping their sign bit turns it into a signed one).
        let bias = _mm_set_epi32(0, i32::MIN, 0, i32::MIN);
        let a = _mm_xor_si128(a, bias);
        let b = _mm_xor_si128(b, bias);
        let gt = _mm_cmpgt_epi32(a, b);
        let eq = _mm_cmpeq_epi32(a, b);
        let gt_hi = _mm_shuffle_epi32::<0b11_11_01_01>(gt);
        let eq_hi = _mm_shuffle_epi32::<0b11_11_01_01>(eq);
        let gt_lo = _mm_shuffle_epi32::<0b10_10_00_00>(gt);
        _mm_or_si128(gt_hi, _mm_and_si128(eq_hi, gt_lo))
    }
}

/// All-ones in negative 64-bit lanes, zero elsewhere.
#[inline(always)]
unsafe fn sign_epi64(a: __m128i) -> __m128i {
    _mm_shuffle_epi32::<0b11_11_01_01>(_mm_srai_epi32::<31>(a))
}

/// Arithmetic right shift of 64-bit lanes; `count` is at most 63.
#[inline(always)]
unsafe fn sra_epi64(a: __m128i, count: u32) -> __m128i {
    // sll by 64 yields zero, so count == 0 leaves the sign fill empty.
    let logical = _mm_srl_epi64(a, _mm_cvtsi32_si128(count as i32));
    let fill = _mm_sll_epi64(sign_epi64(a), _mm_cvtsi32_si128(64 - count as i32));
    _mm_or_si128(logical, fill)
}

/// f32 to i32 with truncation, saturating out-of-range values and mapping
/// NaN to zero.
#[inline(always)]
unsafe fn cvtt_sat_epi32(x: __m128) -> __m128i {
    // cvttps2dq returns i32::MIN for NaN and for anything out of range.
    // Flip it to MAX where x is too large, and zero it where x is NaN.
    let raw = _mm_cvttps_epi32(x);
    let too_big = _mm_castps_si128(_mm_cmpge_ps(x, _mm_set1_ps(2_147_483_648.0)));
    let ordered = _mm_castps_si128(_mm_cmpord_ps(x, x));
    _mm_and_si128(_mm_xor_si128(raw, too_big), ordered)
}

#[inline(always)]
unsafe fn round_even_ps(x: __m128) -> __m128 {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_round_ps::<{ _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC }>(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        // Adding and subtracting 2^23 drops the fraction bits of |x| with
        // ties-to-even rounding. Lanes at or above 2^23 (and NaN) are
        // already integral and pass through.
        let sign_bit = _mm_set1_ps(-0.0);
        let sign = _mm_and_ps(x, sign_bit);
        let magnitude = _mm_andnot_ps(sign_bit, x);
        let magic = _mm_set1_ps(8_388_608.0);
        let rounded = _mm_sub_ps(_mm_add_ps(magnitude, magic), magic);
        let small = _mm_cmplt_ps(magnitude, magic);
        blend_ps(small, _mm_or_ps(rounded, sign), x)
    }
}

#[inline(always)]
unsafe fn floor_ps(x: __m128) -> __m128 {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_floor_ps(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let rounded = round_even_ps(x);
        let correction = _mm_and_ps(_mm_cmpgt_ps(rounded, x), _mm_set1_ps(1.0));
        _mm_or_ps(_mm_sub_ps(rounded, correction), _mm_and_ps(x, _mm_set1_ps(-0.0)))
    }
}

#[inline(always)]
unsafe fn ceil_ps(x: __m128) -> __m128 {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_ceil_ps(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        // -0.0 + 0.0 is +0.0, so OR the sign of x back in.
        let rounded = round_even_ps(x);
        let correction = _mm_and_ps(_mm_cmplt_ps(rounded, x), _mm_set1_ps(1.0));
        _mm_or_ps(_mm_add_ps(rounded, correction), _mm_and_ps(x, _mm_set1_ps(-0.0)))
    }
}

#[inline(always)]
unsafe fn trunc_ps(x: __m128) -> __m128 {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_round_ps::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let sign_bit = _mm_set1_ps(-0.0);
        let magnitude = _mm_andnot_ps(sign_bit, x);
        let rounded = round_even_ps(magnitude);
        let correction = _mm_and_ps(_mm_cmpgt_ps(rounded, magnitude), _mm_set1_ps(1.0));
        _mm_or_ps(_mm_sub_ps(rounded, correction), _mm_and_ps(x, sign_bit))
    }
}

#[inline(always)]
unsafe fn round_even_pd(x: __m128d) -> __m128d {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_round_pd::<{ _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC }>(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let sign_bit = _mm_set1_pd(-0.0);
        let sign = _mm_and_pd(x, sign_bit);
        let magnitude = _mm_andnot_pd(sign_bit, x);
        let magic = _mm_set1_pd(4_503_599_627_370_496.0);
        let rounded = _mm_sub_pd(_mm_add_pd(magnitude, magic), magic);
        let small = _mm_cmplt_pd(magnitude, magic);
        blend_pd(small, _mm_or_pd(rounded, sign), x)
    }
}

#[inline(always)]
unsafe fn floor_pd(x: __m128d) -> __m128d {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_floor_pd(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let rounded = round_even_pd(x);
        let correction = _mm_and_pd(_mm_cmpgt_pd(rounded, x), _mm_set1_pd(1.0));
        _mm_or_pd(_mm_sub_pd(rounded, correction), _mm_and_pd(x, _mm_set1_pd(-0.0)))
    }
}

#[inline(always)]
unsafe fn ceil_pd(x: __m128d) -> __m128d {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_ceil_pd(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let rounded = round_even_pd(x);
        let correction = _mm_and_pd(_mm_cmplt_pd(rounded, x), _mm_set1_pd(1.0));
        _mm_or_pd(_mm_add_pd(rounded, correction), _mm_and_pd(x, _mm_set1_pd(-0.0)))
    }
}

#[inline(always)]
unsafe fn trunc_pd(x: __m128d) -> __m128d {
    #[cfg(target_feature = "sse4.1")]
    {
        _mm_round_pd::<{ _MM_FROUND_TO_ZERO | _MM_FROUND_NO_EXC }>(x)
    }
    #[cfg(not(target_feature = "sse4.1"))]
    {
        let sign_bit = _mm_set1_pd(-0.0);
        let magnitude = _mm_andnot_pd(sign_bit, x);
        let rounded = round_even_pd(magnitude);
        let correction = _mm_and_pd(_mm_cmpgt_pd(rounded, magnitude), _mm_set1_pd(1.0));
        _mm_or_pd(_mm_sub_pd(rounded, correction), _mm_and_pd(x, sign_bit))
    }
}

// ============================================================================
// Masks
// ============================================================================

#[inline(always)]
unsafe fn movemask4(mask: __m128i) -> u8 {
    _mm_movemask_ps(_mm_castsi128_ps(mask)) as u8
}

#[inline(always)]
unsafe fn movemask2(mask: __m128i) -> u8 {
    _mm_movemask_pd(_mm_castsi128_pd(mask)) as u8
}

#[inline(always)]
unsafe fn expand4(bits: u8) -> __m128i {
    let lane = |i: u8| -(((bits >> i) & 1) as i32);
    _mm_set_epi32(lane(3), lane(2), lane(1), lane(0))
}

#[inline(always)]
unsafe fn expand2(bits: u8) -> __m128i {
    let lane = |i: u8| -(((bits >> i) & 1) as i64);
    _mm_set_epi64x(lane(1), lane(0))
}

// Every mask is held as an integer register whatever its shape; float code
// reinterprets it for free at the point of use.
macro_rules! define_mask {
    ($(#[$meta:meta])* $name:ident, $n:literal, $movemask:ident, $expand:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone)]
        #[repr(transparent)]
        pub struct $name(__m128i);

        impl $name {
            /// Builds the mask from booleans in lane order.
            #[inline(always)]
            pub fn from_array(lanes: [bool; $n]) -> Self {
                let bits = lanes
                    .iter()
                    .enumerate()
                    .fold(0u8, |acc, (i, &lane)| acc | (lane as u8) << i);
                Self::from_bitmask(bits)
            }

            /// Returns the lanes as booleans in lane order.
            #[inline(always)]
            pub fn to_array(self) -> [bool; $n] {
                let bits = self.bitmask();
                array::from_fn(|i| (bits >> i) & 1 != 0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                unsafe { Self(_mm_setzero_si128()) }
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.to_array())
            }
        }

        impl PartialEq for $name {
            #[inline(always)]
            fn eq(&self, other: &Self) -> bool {
                self.bitmask() == other.bitmask()
            }
        }

        impl Eq for $name {}

        impl Mask128 for $name {
            const LANES: usize = $n;

            #[inline(always)]
            fn test<const LANE: i32>(self) -> bool {
                (self.bitmask() >> LaneIndex::<LANE, { $n }>::INDEX) & 1 != 0
            }

            #[inline(always)]
            fn splat(value: bool) -> Self {
                unsafe { Self(_mm_set1_epi32(-(value as i32))) }
            }

            #[inline(always)]
            fn from_bitmask(bits: u8) -> Self {
                unsafe { Self($expand(bits)) }
            }

            #[inline(always)]
            fn bitmask(self) -> u8 {
                unsafe { $movemask(self.0) }
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                unsafe { Self(_mm_and_si128(self.0, rhs.0)) }
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                unsafe { Self(_mm_or_si128(self.0, rhs.0)) }
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                unsafe { Self(_mm_xor_si128(self.0, rhs.0)) }
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                unsafe { Self(_mm_xor_si128(self.0, all_ones())) }
            }
        }
    };
}

define_mask!(
    /// Mask for [`I32x4`].
    MaskI32x4, 4, movemask4, expand4
);
define_mask!(
    /// Mask for [`I64x2`].
    MaskI64x2, 2, movemask2, expand2
);
define_mask!(
    /// Mask for [`F32x4`].
    MaskF32x4, 4, movemask4, expand4
);
define_mask!(
    /// Mask for [`F64x2`].
    MaskF64x2, 2, movemask2, expand2
);

impl MaskF32x4 {
    #[inline(always)]
    unsafe fn ps(self) -> __m128 {
        _mm_castsi128_ps(self.0)
    }

    #[inline(always)]
    unsafe fn from_ps(mask: __m128) -> Self {
        Self(_mm_castps_si128(mask))
    }
}

impl MaskF64x2 {
    #[inline(always)]
    unsafe fn pd(self) -> __m128d {
        _mm_castsi128_pd(self.0)
    }

    #[inline(always)]
    unsafe fn from_pd(mask: __m128d) -> Self {
        Self(_mm_castpd_si128(mask))
    }
}

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
// Shared vector boilerplate
// ============================================================================

macro_rules! impl_common {
    ($name:ident, $zero:ident, $and:ident, $or:ident, $xor:ident, $ones:expr) => {
        impl Default for $name {
            fn default() -> Self {
                unsafe { Self($zero()) }
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.to_array())
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                unsafe { Self($and(self.0, rhs.0)) }
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                unsafe { Self($or(self.0, rhs.0)) }
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                unsafe { Self($xor(self.0, rhs.0)) }
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                unsafe { Self($xor(self.0, $ones)) }
            }
        }
    };
}

// ============================================================================
// I32x4
// ============================================================================

/// Four `i32` lanes in an SSE register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x4(__m128i);

impl I32x4 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane3: i32, lane2: i32, lane1: i32, lane0: i32) -> Self {
        // _mm_set_epi32 args are in the same order: e3, e2, e1, e0
        unsafe { Self(_mm_set_epi32(lane3, lane2, lane1, lane0)) }
    }

    /// Builds a vector from an array in lane order.
    #[inline(always)]
    pub fn from_array(lanes: [i32; 4]) -> Self {
        unsafe { Self(_mm_loadu_si128(lanes.as_ptr() as *const __m128i)) }
    }

    /// Returns the lanes in lane order.
    #[inline(always)]
    pub fn to_array(self) -> [i32; 4] {
        let mut out = [0i32; 4];
        unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, self.0) };
        out
    }
}

impl_common!(I32x4, _mm_setzero_si128, _mm_and_si128, _mm_or_si128, _mm_xor_si128, all_ones());

impl Add for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_epi32(self.0, rhs.0)) }
    }
}

impl Sub for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_epi32(self.0, rhs.0)) }
    }
}

impl Mul for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(mullo_epi32(self.0, rhs.0)) }
    }
}

impl Div for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        // No SIMD integer division.
        let q = generic::I32x4::from_generic(self.to_generic()) / generic::I32x4::from_generic(rhs.to_generic());
        Self::from_generic(q.to_generic())
    }
}

impl Neg for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(_mm_sub_epi32(_mm_setzero_si128(), self.0)) }
    }
}

impl Vector128 for I32x4 {
    type Scalar = i32;
    type Generic = GenericI32x4;
    type Mask = MaskI32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(value: i32) -> Self {
        unsafe { Self(_mm_set1_epi32(value)) }
    }

    #[inline(always)]
    fn from_generic(lanes: GenericI32x4) -> Self {
        Self::from_array(lanes.to_array())
    }

    #[inline(always)]
    fn to_generic(self) -> GenericI32x4 {
        GenericI32x4::from_array(self.to_array())
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_si128(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(_mm_cmpeq_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskI32x4 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(_mm_cmplt_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskI32x4 {
        !self.cmp_gt(rhs)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(_mm_cmpgt_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskI32x4 {
        !self.cmp_lt(rhs)
    }

    #[inline(always)]
    fn select(mask: MaskI32x4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(blend_si128(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskI32x4, if_true: Self) -> Self {
        unsafe { Self(_mm_and_si128(mask.0, if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_min_epi32(self.0, rhs.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            Self::select(self.cmp_lt(rhs), self, rhs)
        }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_max_epi32(self.0, rhs.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            Self::select(self.cmp_gt(rhs), self, rhs)
        }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        #[cfg(target_feature = "ssse3")]
        unsafe {
            Self(_mm_abs_epi32(self.0))
        }
        #[cfg(not(target_feature = "ssse3"))]
        unsafe {
            // (x ^ s) - s with s = x >> 31
            let sign = _mm_srai_epi32::<31>(self.0);
            Self(_mm_sub_epi32(_mm_xor_si128(self.0, sign), sign))
        }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> i32 {
        let index = LaneIndex::<LANE, 4>::INDEX;
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            let _ = index;
            _mm_extract_epi32::<LANE>(self.0)
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            self.to_array()[index]
        }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: i32) -> Self {
        let index = LaneIndex::<LANE, 4>::INDEX;
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            let _ = index;
            Self(_mm_insert_epi32::<LANE>(self.0, value))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            let mut lanes = self.to_array();
            lanes[index] = value;
            Self::from_array(lanes)
        }
    }
}

impl IntVector128 for I32x4 {
    type Float = F32x4;
    const BITS: u32 = 32;

    #[inline(always)]
    fn shl_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 32>::COUNT;
        unsafe { Self(_mm_slli_epi32::<N>(self.0)) }
    }

    #[inline(always)]
    fn shr_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 32>::COUNT;
        unsafe { Self(_mm_srai_epi32::<N>(self.0)) }
    }

    #[inline(always)]
    fn shr_logical_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 32>::COUNT;
        unsafe { Self(_mm_srli_epi32::<N>(self.0)) }
    }

    // The register-count shifts read a 64-bit count and already saturate:
    // psll/psrl give zero and psra gives the sign fill from 32 upward.
    #[inline(always)]
    fn shl(self, count: u32) -> Self {
        unsafe { Self(_mm_sll_epi32(self.0, _mm_cvtsi32_si128(count as i32))) }
    }

    #[inline(always)]
    fn shr(self, count: u32) -> Self {
        unsafe { Self(_mm_sra_epi32(self.0, _mm_cvtsi32_si128(count.min(31) as i32))) }
    }

    #[inline(always)]
    fn shr_logical(self, count: u32) -> Self {
        unsafe { Self(_mm_srl_epi32(self.0, _mm_cvtsi32_si128(count as i32))) }
    }

    #[inline(always)]
    fn to_float(self) -> F32x4 {
        unsafe { F32x4(_mm_cvtepi32_ps(self.0)) }
    }
}

impl Shuffle4 for I32x4 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm4::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe { Self(_mm_shuffle_epi32::<IMM>(self.0)) }
    }
}

impl Widen for I32x4 {
    type Wide = I64x2;
    #[inline(always)]
    fn widen(self) -> I64x2 {
        // Interleave each lane with its sign fill.
        unsafe { I64x2(_mm_unpacklo_epi32(self.0, _mm_srai_epi32::<31>(self.0))) }
    }
}

// ============================================================================
// I64x2
// ============================================================================

/// Two `i64` lanes in an SSE register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I64x2(__m128i);

impl I64x2 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane1: i64, lane0: i64) -> Self {
        unsafe { Self(_mm_set_epi64x(lane1, lane0)) }
    }

    /// Builds a vector from an array in lane order.
    #[inline(always)]
    pub fn from_array(lanes: [i64; 2]) -> Self {
        unsafe { Self(_mm_loadu_si128(lanes.as_ptr() as *const __m128i)) }
    }

    /// Returns the lanes in lane order.
    #[inline(always)]
    pub fn to_array(self) -> [i64; 2] {
        let mut out = [0i64; 2];
        unsafe { _mm_storeu_si128(out.as_mut_ptr() as *mut __m128i, self.0) };
        out
    }

    #[inline(always)]
    fn via_generic(self) -> generic::I64x2 {
        generic::I64x2::from_generic(self.to_generic())
    }
}

impl_common!(I64x2, _mm_setzero_si128, _mm_and_si128, _mm_or_si128, _mm_xor_si128, all_ones());

impl Add for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_epi64(self.0, rhs.0)) }
    }
}

impl Sub for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_epi64(self.0, rhs.0)) }
    }
}

impl Mul for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        // No 64-bit lane multiply below AVX-512.
        Self::from_generic((self.via_generic() * rhs.via_generic()).to_generic())
    }
}

impl Div for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        Self::from_generic((self.via_generic() / rhs.via_generic()).to_generic())
    }
}

impl Neg for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(_mm_sub_epi64(_mm_setzero_si128(), self.0)) }
    }
}

impl Vector128 for I64x2 {
    type Scalar = i64;
    type Generic = GenericI64x2;
    type Mask = MaskI64x2;
    const LANES: usize = 2;

    #[inline(always)]
    fn splat(value: i64) -> Self {
        unsafe { Self(_mm_set1_epi64x(value)) }
    }

    #[inline(always)]
    fn from_generic(lanes: GenericI64x2) -> Self {
        Self::from_array(lanes.to_array())
    }

    #[inline(always)]
    fn to_generic(self) -> GenericI64x2 {
        GenericI64x2::from_array(self.to_array())
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_si128(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2(cmpeq_epi64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskI64x2 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskI64x2 {
        rhs.cmp_gt(self)
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskI64x2 {
        !self.cmp_gt(rhs)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2(cmpgt_epi64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskI64x2 {
        !rhs.cmp_gt(self)
    }

    #[inline(always)]
    fn select(mask: MaskI64x2, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(blend_si128(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskI64x2, if_true: Self) -> Self {
        unsafe { Self(_mm_and_si128(mask.0, if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        Self::select(self.cmp_lt(rhs), self, rhs)
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        Self::select(self.cmp_gt(rhs), self, rhs)
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe {
            let sign = sign_epi64(self.0);
            Self(_mm_sub_epi64(_mm_xor_si128(self.0, sign), sign))
        }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> i64 {
        let index = LaneIndex::<LANE, 2>::INDEX;
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            let _ = index;
            _mm_extract_epi64::<LANE>(self.0)
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            self.to_array()[index]
        }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: i64) -> Self {
        let index = LaneIndex::<LANE, 2>::INDEX;
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            let _ = index;
            Self(_mm_insert_epi64::<LANE>(self.0, value))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        {
            let mut lanes = self.to_array();
            lanes[index] = value;
            Self::from_array(lanes)
        }
    }
}

impl IntVector128 for I64x2 {
    type Float = F64x2;
    const BITS: u32 = 64;

    #[inline(always)]
    fn shl_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 64>::COUNT;
        unsafe { Self(_mm_slli_epi64::<N>(self.0)) }
    }

    #[inline(always)]
    fn shr_imm<const N: i32>(self) -> Self {
        // No psraq before AVX-512.
        let count = ShiftCount::<N, 64>::COUNT;
        unsafe { Self(sra_epi64(self.0, count)) }
    }

    #[inline(always)]
    fn shr_logical_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 64>::COUNT;
        unsafe { Self(_mm_srli_epi64::<N>(self.0)) }
    }

    #[inline(always)]
    fn shl(self, count: u32) -> Self {
        unsafe { Self(_mm_sll_epi64(self.0, _mm_cvtsi32_si128(count as i32))) }
    }

    #[inline(always)]
    fn shr(self, count: u32) -> Self {
        unsafe { Self(sra_epi64(self.0, count.min(63))) }
    }

    #[inline(always)]
    fn shr_logical(self, count: u32) -> Self {
        unsafe { Self(_mm_srl_epi64(self.0, _mm_cvtsi32_si128(count as i32))) }
    }

    #[inline(always)]
    fn to_float(self) -> F64x2 {
        // cvtqq2pd is AVX-512 only.
        F64x2::from_generic(self.via_generic().to_float().to_generic())
    }
}

impl Shuffle2 for I64x2 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm2::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe {
            let v = _mm_castsi128_pd(self.0);
            Self(_mm_castpd_si128(_mm_shuffle_pd::<IMM>(v, v)))
        }
    }
}

impl Narrow for I64x2 {
    type Narrowed = I32x4;
    #[inline(always)]
    fn narrow(self) -> I32x4 {
        // Gather the low halves into lanes 0 and 1, then clear the top.
        unsafe { I32x4(_mm_move_epi64(_mm_shuffle_epi32::<0b00_00_10_00>(self.0))) }
    }
}

// ============================================================================
// F32x4
// ============================================================================

/// Four `f32` lanes in an SSE register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x4(__m128);

impl F32x4 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane3: f32, lane2: f32, lane1: f32, lane0: f32) -> Self {
        unsafe { Self(_mm_set_ps(lane3, lane2, lane1, lane0)) }
    }

    /// Builds a vector from an array in lane order.
    #[inline(always)]
    pub fn from_array(lanes: [f32; 4]) -> Self {
        unsafe { Self(_mm_loadu_ps(lanes.as_ptr())) }
    }

    /// Returns the lanes in lane order.
    #[inline(always)]
    pub fn to_array(self) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.0) };
        out
    }
}

impl_common!(
    F32x4,
    _mm_setzero_ps,
    _mm_and_ps,
    _mm_or_ps,
    _mm_xor_ps,
    _mm_castsi128_ps(all_ones())
);

impl Add for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_ps(self.0, rhs.0)) }
    }
}

impl Sub for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_ps(self.0, rhs.0)) }
    }
}

impl Mul for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm_mul_ps(self.0, rhs.0)) }
    }
}

impl Div for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm_div_ps(self.0, rhs.0)) }
    }
}

impl Neg for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        // Flip the sign bit; 0.0 - x would turn -0.0 into +0.0.
        unsafe { Self(_mm_xor_ps(self.0, _mm_set1_ps(-0.0))) }
    }
}

impl Vector128 for F32x4 {
    type Scalar = f32;
    type Generic = GenericF32x4;
    type Mask = MaskF32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        unsafe { Self(_mm_set1_ps(value)) }
    }

    #[inline(always)]
    fn from_generic(lanes: GenericF32x4) -> Self {
        Self::from_array(lanes.to_array())
    }

    #[inline(always)]
    fn to_generic(self) -> GenericF32x4 {
        GenericF32x4::from_array(self.to_array())
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_ps(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmpeq_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskF32x4 {
        // cmpneqps is the unordered form: true for NaN.
        unsafe { MaskF32x4::from_ps(_mm_cmpneq_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmplt_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmple_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmpgt_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmpge_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskF32x4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(blend_ps(mask.ps(), if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskF32x4, if_true: Self) -> Self {
        unsafe { Self(_mm_and_ps(mask.ps(), if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm_min_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm_max_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(_mm_andnot_ps(_mm_set1_ps(-0.0), self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> f32 {
        self.to_array()[LaneIndex::<LANE, 4>::INDEX]
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: f32) -> Self {
        let mut lanes = self.to_array();
        lanes[LaneIndex::<LANE, 4>::INDEX] = value;
        Self::from_array(lanes)
    }
}

impl FloatVector128 for F32x4 {
    type Int = I32x4;

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm_sqrt_ps(self.0)) }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(floor_ps(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(ceil_ps(self.0)) }
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        unsafe { Self(trunc_ps(self.0)) }
    }

    #[inline(always)]
    fn round_even(self) -> Self {
        unsafe { Self(round_even_ps(self.0)) }
    }

    #[inline(always)]
    fn is_nan(self) -> MaskF32x4 {
        unsafe { MaskF32x4::from_ps(_mm_cmpunord_ps(self.0, self.0)) }
    }

    #[inline(always)]
    fn round_nearest_even(self) -> I32x4 {
        unsafe { I32x4(cvtt_sat_epi32(round_even_ps(self.0))) }
    }

    #[inline(always)]
    fn truncate_toward_zero(self) -> I32x4 {
        unsafe { I32x4(cvtt_sat_epi32(self.0)) }
    }

    #[inline(always)]
    fn floor_toward_negative_infinity(self) -> I32x4 {
        unsafe { I32x4(cvtt_sat_epi32(floor_ps(self.0))) }
    }
}

impl Shuffle4 for F32x4 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm4::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe { Self(_mm_shuffle_ps::<IMM>(self.0, self.0)) }
    }
}

impl Widen for F32x4 {
    type Wide = F64x2;
    #[inline(always)]
    fn widen(self) -> F64x2 {
        unsafe { F64x2(_mm_cvtps_pd(self.0)) }
    }
}

// ============================================================================
// F64x2
// ============================================================================

/// Two `f64` lanes in an SSE register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F64x2(__m128d);

impl F64x2 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane1: f64, lane0: f64) -> Self {
        unsafe { Self(_mm_set_pd(lane1, lane0)) }
    }

    /// Builds a vector from an array in lane order.
    #[inline(always)]
    pub fn from_array(lanes: [f64; 2]) -> Self {
        unsafe { Self(_mm_loadu_pd(lanes.as_ptr())) }
    }

    /// Returns the lanes in lane order.
    #[inline(always)]
    pub fn to_array(self) -> [f64; 2] {
        let mut out = [0.0f64; 2];
        unsafe { _mm_storeu_pd(out.as_mut_ptr(), self.0) };
        out
    }

    #[inline(always)]
    fn via_generic(self) -> generic::F64x2 {
        generic::F64x2::from_generic(self.to_generic())
    }
}

impl_common!(
    F64x2,
    _mm_setzero_pd,
    _mm_and_pd,
    _mm_or_pd,
    _mm_xor_pd,
    _mm_castsi128_pd(all_ones())
);

impl Add for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_pd(self.0, rhs.0)) }
    }
}

impl Sub for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_pd(self.0, rhs.0)) }
    }
}

impl Mul for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm_mul_pd(self.0, rhs.0)) }
    }
}

impl Div for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm_div_pd(self.0, rhs.0)) }
    }
}

impl Neg for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(_mm_xor_pd(self.0, _mm_set1_pd(-0.0))) }
    }
}

impl Vector128 for F64x2 {
    type Scalar = f64;
    type Generic = GenericF64x2;
    type Mask = MaskF64x2;
    const LANES: usize = 2;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        unsafe { Self(_mm_set1_pd(value)) }
    }

    #[inline(always)]
    fn from_generic(lanes: GenericF64x2) -> Self {
        Self::from_array(lanes.to_array())
    }

    #[inline(always)]
    fn to_generic(self) -> GenericF64x2 {
        GenericF64x2::from_array(self.to_array())
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_pd(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmpeq_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmpneq_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmplt_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmple_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmpgt_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmpge_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskF64x2, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(blend_pd(mask.pd(), if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskF64x2, if_true: Self) -> Self {
        unsafe { Self(_mm_and_pd(mask.pd(), if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm_min_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm_max_pd(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(_mm_andnot_pd(_mm_set1_pd(-0.0), self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> f64 {
        self.to_array()[LaneIndex::<LANE, 2>::INDEX]
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: f64) -> Self {
        let mut lanes = self.to_array();
        lanes[LaneIndex::<LANE, 2>::INDEX] = value;
        Self::from_array(lanes)
    }
}

impl FloatVector128 for F64x2 {
    type Int = I64x2;

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm_sqrt_pd(self.0)) }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(floor_pd(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(ceil_pd(self.0)) }
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        unsafe { Self(trunc_pd(self.0)) }
    }

    #[inline(always)]
    fn round_even(self) -> Self {
        unsafe { Self(round_even_pd(self.0)) }
    }

    #[inline(always)]
    fn is_nan(self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_pd(_mm_cmpunord_pd(self.0, self.0)) }
    }

    // SSE2 only converts f64 to i32; the i64 forms go through the generic
    // backend.
    #[inline(always)]
    fn round_nearest_even(self) -> I64x2 {
        I64x2::from_generic(self.via_generic().round_nearest_even().to_generic())
    }

    #[inline(always)]
    fn truncate_toward_zero(self) -> I64x2 {
        I64x2::from_generic(self.via_generic().truncate_toward_zero().to_generic())
    }

    #[inline(always)]
    fn floor_toward_negative_infinity(self) -> I64x2 {
        I64x2::from_generic(self.via_generic().floor_toward_negative_infinity().to_generic())
    }
}

impl Shuffle2 for F64x2 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm2::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe { Self(_mm_shuffle_pd::<IMM>(self.0, self.0)) }
    }
}

impl Narrow for F64x2 {
    type Narrowed = F32x4;
    #[inline(always)]
    fn narrow(self) -> F32x4 {
        // cvtpd2ps zeroes the upper two lanes.
        unsafe { F32x4(_mm_cvtpd_ps(self.0)) }
    }
}

// ============================================================================
// Reinterpretation
// ============================================================================

// Register casts are free and never touch memory.
macro_rules! impl_bitcast {
    ($from:ident => $to:ident, |$v:ident| $cast:expr) => {
        impl BitCast<$to> for $from {
            #[inline(always)]
            #[allow(unused_unsafe)]
            fn bit_cast(self) -> $to {
                let $v = self.0;
                unsafe { $to($cast) }
            }
        }
    };
}

impl_bitcast!(I32x4 => I64x2, |v| v);
impl_bitcast!(I32x4 => F32x4, |v| _mm_castsi128_ps(v));
impl_bitcast!(I32x4 => F64x2, |v| _mm_castsi128_pd(v));
impl_bitcast!(I64x2 => I32x4, |v| v);
impl_bitcast!(I64x2 => F32x4, |v| _mm_castsi128_ps(v));
impl_bitcast!(I64x2 => F64x2, |v| _mm_castsi128_pd(v));
impl_bitcast!(F32x4 => I32x4, |v| _mm_castps_si128(v));
impl_bitcast!(F32x4 => I64x2, |v| _mm_castps_si128(v));
impl_bitcast!(F32x4 => F64x2, |v| _mm_castps_pd(v));
impl_bitcast!(F64x2 => I32x4, |v| _mm_castpd_si128(v));
impl_bitcast!(F64x2 => I64x2, |v| _mm_castpd_si128(v));
impl_bitcast!(F64x2 => F32x4, |v| _mm_castpd_ps(v));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::perm4;

    #[test]
    fn lane_order_matches_set_intrinsics() {
        let v = I32x4::new(3, 2, 1, 0);
        assert_eq!(v.to_array(), [0, 1, 2, 3]);
        assert_eq!(v.get::<3>(), 3);
        assert_eq!(v.with::<0>(9).to_array(), [9, 1, 2, 3]);
        assert_eq!(F64x2::new(1.0, 2.0).to_array(), [2.0, 1.0]);
    }

    #[test]
    fn sse2_i32_multiply_keeps_low_bits() {
        let a = I32x4::from_array([3, -4, i32::MAX, 0x1_0000]);
        let b = I32x4::from_array([5, 6, 2, 0x1_0000]);
        assert_eq!((a * b).to_array(), [15, -24, -2, 0]);
    }

    #[test]
    fn i64_compare_crosses_the_word_boundary() {
        let a = I64x2::from_array([0x1_0000_0000, -1]);
        let b = I64x2::from_array([0x0_FFFF_FFFF, 0]);
        assert_eq!(a.cmp_gt(b).to_array(), [true, false]);
        assert_eq!(a.cmp_lt(b).to_array(), [false, true]);
        assert_eq!(a.cmp_eq(a).to_array(), [true, true]);
        let c = I64x2::from_array([0x1_0000_0000, 1]);
        assert_eq!(a.cmp_eq(c).to_array(), [true, false]);
    }

    #[test]
    fn i64_arithmetic_shift_saturates() {
        let v = I64x2::from_array([i64::MIN, 12345]);
        assert_eq!(v.shr(63).to_array(), [-1, 0]);
        assert_eq!(v.shr(64).to_array(), [-1, 0]);
        assert_eq!(v.shr(u32::MAX).to_array(), [-1, 0]);
        assert_eq!(v.shr(0).to_array(), [i64::MIN, 12345]);
        assert_eq!(v.shr_imm::<4>().to_array(), [i64::MIN >> 4, 12345 >> 4]);
    }

    #[test]
    fn conversions_saturate_like_as_casts() {
        let v = F32x4::from_array([f32::NAN, 2_147_483_648.0, -2_147_483_904.0, -1.5]);
        assert_eq!(v.truncate_toward_zero().to_array(), [0, i32::MAX, i32::MIN, -1]);
        assert_eq!(v.floor_toward_negative_infinity().to_array(), [0, i32::MAX, i32::MIN, -2]);
        assert_eq!(v.round_nearest_even().to_array(), [0, i32::MAX, i32::MIN, -2]);
    }

    #[test]
    fn rounding_matches_std() {
        let samples = [-2.5f32, -1.5, -0.5, -0.0, 0.49999997, 0.5, 1.5, 2.5, 8_388_607.5, -8_388_609.0];
        for chunk in samples.chunks(2) {
            let lanes = [chunk[0], chunk[1], -chunk[0], -chunk[1]];
            let v = F32x4::from_array(lanes);
            let bits = |a: [f32; 4]| a.map(f32::to_bits);
            assert_eq!(bits(v.floor().to_array()), bits(lanes.map(f32::floor)));
            assert_eq!(bits(v.ceil().to_array()), bits(lanes.map(f32::ceil)));
            assert_eq!(bits(v.trunc().to_array()), bits(lanes.map(f32::trunc)));
            assert_eq!(bits(v.round_even().to_array()), bits(lanes.map(f32::round_ties_even)));
        }
    }

    #[test]
    fn narrow_and_widen_fill_rules() {
        let n = I64x2::from_array([-2, 0x7_0000_0003]).narrow();
        assert_eq!(n.to_array(), [-2, 3, 0, 0]);
        let w = I32x4::from_array([-7, 7, 1, 1]).widen();
        assert_eq!(w.to_array(), [-7, 7]);
    }

    #[test]
    fn shuffle_reverses() {
        let v = I32x4::from_array([0, 1, 2, 3]);
        assert_eq!(v.shuffle::<{ perm4(3, 2, 1, 0) }>().to_array(), [3, 2, 1, 0]);
    }

    #[test]
    fn masks_round_trip_bitmasks() {
        for bits in 0..16u8 {
            assert_eq!(MaskF32x4::from_bitmask(bits).bitmask(), bits);
        }
        for bits in 0..4u8 {
            assert_eq!(MaskI64x2::from_bitmask(bits).bitmask(), bits);
        }
    }
}
