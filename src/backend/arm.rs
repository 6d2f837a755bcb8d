//! AArch64 NEON backend.
//!
//! NEON has no immediate-driven lane permute. Shuffles run the instruction
//! sequence that [`crate::shuffle::NEON_RECIPES`] holds for the immediate;
//! the recipe is an associated const, so after inlining only the selected
//! instructions remain.

use core::array;
use core::arch::aarch64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

use super::generic;
use super::{
    Backend, BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4,
    Vector128, Widen,
};
use crate::imm::{LaneIndex, ShiftCount};
use crate::lanes::{BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2};
use crate::shuffle::{Imm2, Imm4, Operands, PermOp, Recipe, Recipe2, Step};

/// NEON backend marker.
#[derive(Copy, Clone, Debug, Default)]
pub struct Neon;

impl Backend for Neon {
    const KIND: BackendKind = BackendKind::Neon;
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
// Permutation
// ============================================================================

macro_rules! copy_lane {
    ($a:ident, $b:ident, $dst:ident, $src:ident; $(($d:literal, $s:literal))+) => {
        match ($dst, $src) {
            $(($d, $s) => vcopyq_laneq_u32::<$d, $s>($a, $b),)+
            _ => $a,
        }
    };
}

#[inline(always)]
unsafe fn insert_lane(a: uint32x4_t, b: uint32x4_t, dst: u8, src: u8) -> uint32x4_t {
    copy_lane!(a, b, dst, src;
        (0, 0) (0, 1) (0, 2) (0, 3)
        (1, 0) (1, 1) (1, 2) (1, 3)
        (2, 0) (2, 1) (2, 2) (2, 3)
        (3, 0) (3, 1) (3, 2) (3, 3))
}

#[inline(always)]
unsafe fn run_step(step: Step, cur: uint32x4_t, src: uint32x4_t) -> uint32x4_t {
    let (a, b) = match step.operands {
        Operands::CurCur => (cur, cur),
        Operands::CurSrc => (cur, src),
        Operands::SrcCur => (src, cur),
    };
    match step.op {
        PermOp::Rev64 => vrev64q_u32(a),
        PermOp::Ext(1) => vextq_u32::<1>(a, b),
        PermOp::Ext(2) => vextq_u32::<2>(a, b),
        PermOp::Ext(3) => vextq_u32::<3>(a, b),
        PermOp::Ext(_) => a,
        PermOp::Zip1 => vzip1q_u32(a, b),
        PermOp::Zip2 => vzip2q_u32(a, b),
        PermOp::Uzp1 => vuzp1q_u32(a, b),
        PermOp::Uzp2 => vuzp2q_u32(a, b),
        PermOp::Trn1 => vtrn1q_u32(a, b),
        PermOp::Trn2 => vtrn2q_u32(a, b),
        PermOp::Dup(0) => vdupq_laneq_u32::<0>(a),
        PermOp::Dup(1) => vdupq_laneq_u32::<1>(a),
        PermOp::Dup(2) => vdupq_laneq_u32::<2>(a),
        PermOp::Dup(_) => vdupq_laneq_u32::<3>(a),
        PermOp::Ins { dst, src } => insert_lane(a, b, dst, src),
    }
}

#[inline(always)]
unsafe fn permute4(src: uint32x4_t, recipe: &Recipe) -> uint32x4_t {
    let mut cur = src;
    for &step in recipe.steps() {
        cur = run_step(step, cur, src);
    }
    cur
}

#[inline(always)]
unsafe fn permute2(v: uint64x2_t, recipe: Recipe2) -> uint64x2_t {
    match recipe {
        Recipe2::Identity => v,
        Recipe2::Swap => vextq_u64::<1>(v, v),
        Recipe2::Dup(0) => vdupq_laneq_u64::<0>(v),
        Recipe2::Dup(_) => vdupq_laneq_u64::<1>(v),
    }
}

// ============================================================================
// Masks
// ============================================================================

const LANE_BITS4: [u32; 4] = [1, 2, 4, 8];
const LANE_BITS2: [u64; 2] = [1, 2];

#[inline(always)]
unsafe fn movemask4(mask: uint32x4_t) -> u8 {
    vaddvq_u32(vandq_u32(mask, vld1q_u32(LANE_BITS4.as_ptr()))) as u8
}

#[inline(always)]
unsafe fn movemask2(mask: uint32x4_t) -> u8 {
    let wide = vreinterpretq_u64_u32(mask);
    vaddvq_u64(vandq_u64(wide, vld1q_u64(LANE_BITS2.as_ptr()))) as u8
}

#[inline(always)]
unsafe fn expand4(bits: u8) -> uint32x4_t {
    vtstq_u32(vdupq_n_u32(bits as u32), vld1q_u32(LANE_BITS4.as_ptr()))
}

#[inline(always)]
unsafe fn expand2(bits: u8) -> uint32x4_t {
    vreinterpretq_u32_u64(vtstq_u64(vdupq_n_u64(bits as u64), vld1q_u64(LANE_BITS2.as_ptr())))
}

// Every mask is held as a u32 register. Lanes are all-ones or all-zeros, so
// the horizontal max/min over 32-bit words answers any/all for 64-bit lanes
// too.
macro_rules! define_mask {
    ($(#[$meta:meta])* $name:ident, $n:literal, $movemask:ident, $expand:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone)]
        #[repr(transparent)]
        pub struct $name(uint32x4_t);

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
                unsafe { Self(vdupq_n_u32(0)) }
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
                unsafe { Self(vdupq_n_u32(if value { u32::MAX } else { 0 })) }
            }

            #[inline(always)]
            fn from_bitmask(bits: u8) -> Self {
                unsafe { Self($expand(bits)) }
            }

            #[inline(always)]
            fn bitmask(self) -> u8 {
                unsafe { $movemask(self.0) }
            }

            #[inline(always)]
            fn any(self) -> bool {
                // Inline asm keeps LLVM from rewriting umaxv into a longer
                // movemask-style sequence.
                unsafe {
                    let max_val: u32;
                    core::arch::asm!(
                        "umaxv {s:s}, {v:v}.4s",
                        "fmov {w:w}, {s:s}",
                        v = in(vreg) self.0,
                        s = lateout(vreg) _,
                        w = lateout(reg) max_val,
                        options(pure, nomem, nostack),
                    );
                    max_val != 0
                }
            }

            #[inline(always)]
            fn all(self) -> bool {
                unsafe {
                    let min_val: u32;
                    core::arch::asm!(
                        "uminv {s:s}, {v:v}.4s",
                        "fmov {w:w}, {s:s}",
                        v = in(vreg) self.0,
                        s = lateout(vreg) _,
                        w = lateout(reg) min_val,
                        options(pure, nomem, nostack),
                    );
                    min_val != 0
                }
            }
        }

        impl BitAnd for $name {
            type Output = Self;
            #[inline(always)]
            fn bitand(self, rhs: Self) -> Self {
                unsafe { Self(vandq_u32(self.0, rhs.0)) }
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                unsafe { Self(vorrq_u32(self.0, rhs.0)) }
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                unsafe { Self(veorq_u32(self.0, rhs.0)) }
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                unsafe { Self(vmvnq_u32(self.0)) }
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

impl MaskI64x2 {
    #[inline(always)]
    unsafe fn wide(self) -> uint64x2_t {
        vreinterpretq_u64_u32(self.0)
    }

    #[inline(always)]
    unsafe fn from_wide(mask: uint64x2_t) -> Self {
        Self(vreinterpretq_u32_u64(mask))
    }
}

impl MaskF64x2 {
    #[inline(always)]
    unsafe fn wide(self) -> uint64x2_t {
        vreinterpretq_u64_u32(self.0)
    }

    #[inline(always)]
    unsafe fn from_wide(mask: uint64x2_t) -> Self {
        Self(vreinterpretq_u32_u64(mask))
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

// Bitwise ops run on the u32 view of the register.
macro_rules! impl_common {
    ($name:ident, $t:ty, $n:literal, $load:ident, $store:ident, $to_u32:ident, $from_u32:ident) => {
        impl $name {
            /// Builds a vector from an array in lane order.
            #[inline(always)]
            pub fn from_array(lanes: [$t; $n]) -> Self {
                unsafe { Self($load(lanes.as_ptr())) }
            }

            /// Returns the lanes in lane order.
            #[inline(always)]
            pub fn to_array(self) -> [$t; $n] {
                let mut out = [<$t>::default(); $n];
                unsafe { $store(out.as_mut_ptr(), self.0) };
                out
            }

            #[inline(always)]
            unsafe fn bits(self) -> uint32x4_t {
                $to_u32(self.0)
            }

            #[inline(always)]
            unsafe fn from_bits(bits: uint32x4_t) -> Self {
                Self($from_u32(bits))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                unsafe { Self::from_bits(vdupq_n_u32(0)) }
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
                unsafe { Self::from_bits(vandq_u32(self.bits(), rhs.bits())) }
            }
        }

        impl BitOr for $name {
            type Output = Self;
            #[inline(always)]
            fn bitor(self, rhs: Self) -> Self {
                unsafe { Self::from_bits(vorrq_u32(self.bits(), rhs.bits())) }
            }
        }

        impl BitXor for $name {
            type Output = Self;
            #[inline(always)]
            fn bitxor(self, rhs: Self) -> Self {
                unsafe { Self::from_bits(veorq_u32(self.bits(), rhs.bits())) }
            }
        }

        impl Not for $name {
            type Output = Self;
            #[inline(always)]
            fn not(self) -> Self {
                unsafe { Self::from_bits(vmvnq_u32(self.bits())) }
            }
        }
    };
}

// ============================================================================
// I32x4
// ============================================================================

/// Four `i32` lanes in a NEON register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x4(int32x4_t);

impl I32x4 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane3: i32, lane2: i32, lane1: i32, lane0: i32) -> Self {
        Self::from_array([lane0, lane1, lane2, lane3])
    }
}

impl_common!(I32x4, i32, 4, vld1q_s32, vst1q_s32, vreinterpretq_u32_s32, vreinterpretq_s32_u32);

impl Add for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_s32(self.0, rhs.0)) }
    }
}

impl Sub for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_s32(self.0, rhs.0)) }
    }
}

impl Mul for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_s32(self.0, rhs.0)) }
    }
}

impl Div for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        // No SIMD integer division.
        let q = generic::I32x4::from_generic(self.to_generic())
            / generic::I32x4::from_generic(rhs.to_generic());
        Self::from_generic(q.to_generic())
    }
}

impl Neg for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(vnegq_s32(self.0)) }
    }
}

impl Vector128 for I32x4 {
    type Scalar = i32;
    type Generic = GenericI32x4;
    type Mask = MaskI32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(value: i32) -> Self {
        unsafe { Self(vdupq_n_s32(value)) }
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
        unsafe { Self(vbicq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(vceqq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskI32x4 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(vcltq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(vcleq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(vcgtq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskI32x4 {
        unsafe { MaskI32x4(vcgeq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskI32x4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_s32(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskI32x4, if_true: Self) -> Self {
        unsafe { Self::from_bits(vandq_u32(mask.0, if_true.bits())) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(vminq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(vmaxq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        // abs, not the saturating sqabs: MIN stays MIN.
        unsafe { Self(vabsq_s32(self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> i32 {
        let _ = LaneIndex::<LANE, 4>::INDEX;
        unsafe { vgetq_lane_s32::<LANE>(self.0) }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: i32) -> Self {
        let _ = LaneIndex::<LANE, 4>::INDEX;
        unsafe { Self(vsetq_lane_s32::<LANE>(value, self.0)) }
    }
}

// Right shifts go through vshlq with a negated count: the vshrq_n forms
// reject a count of zero, and the register forms let counts saturate.
impl IntVector128 for I32x4 {
    type Float = F32x4;
    const BITS: u32 = 32;

    #[inline(always)]
    fn shl_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 32>::COUNT;
        unsafe { Self(vshlq_n_s32::<N>(self.0)) }
    }

    #[inline(always)]
    fn shr_imm<const N: i32>(self) -> Self {
        let n = ShiftCount::<N, 32>::COUNT as i32;
        unsafe { Self(vshlq_s32(self.0, vdupq_n_s32(-n))) }
    }

    #[inline(always)]
    fn shr_logical_imm<const N: i32>(self) -> Self {
        let n = ShiftCount::<N, 32>::COUNT as i32;
        unsafe { Self::from_bits(vshlq_u32(self.bits(), vdupq_n_s32(-n))) }
    }

    // sshl/ushl read only the low byte of each count, so counts are clamped
    // before they reach the register.
    #[inline(always)]
    fn shl(self, count: u32) -> Self {
        let count = count.min(32) as i32;
        unsafe { Self(vshlq_s32(self.0, vdupq_n_s32(count))) }
    }

    #[inline(always)]
    fn shr(self, count: u32) -> Self {
        let count = count.min(31) as i32;
        unsafe { Self(vshlq_s32(self.0, vdupq_n_s32(-count))) }
    }

    #[inline(always)]
    fn shr_logical(self, count: u32) -> Self {
        let count = count.min(32) as i32;
        unsafe { Self::from_bits(vshlq_u32(self.bits(), vdupq_n_s32(-count))) }
    }

    #[inline(always)]
    fn to_float(self) -> F32x4 {
        unsafe { F32x4(vcvtq_f32_s32(self.0)) }
    }
}

impl Shuffle4 for I32x4 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm4::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe { Self::from_bits(permute4(self.bits(), &Imm4::<IMM>::RECIPE)) }
    }
}

impl Widen for I32x4 {
    type Wide = I64x2;
    #[inline(always)]
    fn widen(self) -> I64x2 {
        unsafe { I64x2(vmovl_s32(vget_low_s32(self.0))) }
    }
}

// ============================================================================
// I64x2
// ============================================================================

/// Two `i64` lanes in a NEON register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I64x2(int64x2_t);

impl I64x2 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane1: i64, lane0: i64) -> Self {
        Self::from_array([lane0, lane1])
    }

    #[inline(always)]
    fn via_generic(self) -> generic::I64x2 {
        generic::I64x2::from_generic(self.to_generic())
    }
}

impl_common!(I64x2, i64, 2, vld1q_s64, vst1q_s64, vreinterpretq_u32_s64, vreinterpretq_s64_u32);

impl Add for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_s64(self.0, rhs.0)) }
    }
}

impl Sub for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_s64(self.0, rhs.0)) }
    }
}

impl Mul for I64x2 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        // No 64-bit lane multiply in NEON.
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
        unsafe { Self(vnegq_s64(self.0)) }
    }
}

impl Vector128 for I64x2 {
    type Scalar = i64;
    type Generic = GenericI64x2;
    type Mask = MaskI64x2;
    const LANES: usize = 2;

    #[inline(always)]
    fn splat(value: i64) -> Self {
        unsafe { Self(vdupq_n_s64(value)) }
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
        unsafe { Self(vbicq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2::from_wide(vceqq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskI64x2 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2::from_wide(vcltq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2::from_wide(vcleq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2::from_wide(vcgtq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskI64x2 {
        unsafe { MaskI64x2::from_wide(vcgeq_s64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskI64x2, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_s64(mask.wide(), if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskI64x2, if_true: Self) -> Self {
        unsafe { Self::from_bits(vandq_u32(mask.0, if_true.bits())) }
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
        unsafe { Self(vabsq_s64(self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> i64 {
        let _ = LaneIndex::<LANE, 2>::INDEX;
        unsafe { vgetq_lane_s64::<LANE>(self.0) }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: i64) -> Self {
        let _ = LaneIndex::<LANE, 2>::INDEX;
        unsafe { Self(vsetq_lane_s64::<LANE>(value, self.0)) }
    }
}

impl IntVector128 for I64x2 {
    type Float = F64x2;
    const BITS: u32 = 64;

    #[inline(always)]
    fn shl_imm<const N: i32>(self) -> Self {
        let _ = ShiftCount::<N, 64>::COUNT;
        unsafe { Self(vshlq_n_s64::<N>(self.0)) }
    }

    #[inline(always)]
    fn shr_imm<const N: i32>(self) -> Self {
        let n = ShiftCount::<N, 64>::COUNT as i64;
        unsafe { Self(vshlq_s64(self.0, vdupq_n_s64(-n))) }
    }

    #[inline(always)]
    fn shr_logical_imm<const N: i32>(self) -> Self {
        let n = ShiftCount::<N, 64>::COUNT as i64;
        unsafe {
            let bits = vreinterpretq_u64_s64(self.0);
            Self(vreinterpretq_s64_u64(vshlq_u64(bits, vdupq_n_s64(-n))))
        }
    }

    #[inline(always)]
    fn shl(self, count: u32) -> Self {
        let count = count.min(64) as i64;
        unsafe { Self(vshlq_s64(self.0, vdupq_n_s64(count))) }
    }

    #[inline(always)]
    fn shr(self, count: u32) -> Self {
        let count = count.min(63) as i64;
        unsafe { Self(vshlq_s64(self.0, vdupq_n_s64(-count))) }
    }

    #[inline(always)]
    fn shr_logical(self, count: u32) -> Self {
        let count = count.min(64) as i64;
        unsafe {
            let bits = vreinterpretq_u64_s64(self.0);
            Self(vreinterpretq_s64_u64(vshlq_u64(bits, vdupq_n_s64(-count))))
        }
    }

    #[inline(always)]
    fn to_float(self) -> F64x2 {
        unsafe { F64x2(vcvtq_f64_s64(self.0)) }
    }
}

impl Shuffle2 for I64x2 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm2::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe {
            let bits = vreinterpretq_u64_s64(self.0);
            Self(vreinterpretq_s64_u64(permute2(bits, Imm2::<IMM>::RECIPE)))
        }
    }
}

impl Narrow for I64x2 {
    type Narrowed = I32x4;
    #[inline(always)]
    fn narrow(self) -> I32x4 {
        unsafe { I32x4(vcombine_s32(vmovn_s64(self.0), vdup_n_s32(0))) }
    }
}

// ============================================================================
// F32x4
// ============================================================================

/// Four `f32` lanes in a NEON register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x4(float32x4_t);

impl F32x4 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane3: f32, lane2: f32, lane1: f32, lane0: f32) -> Self {
        Self::from_array([lane0, lane1, lane2, lane3])
    }
}

impl_common!(F32x4, f32, 4, vld1q_f32, vst1q_f32, vreinterpretq_u32_f32, vreinterpretq_f32_u32);

impl Add for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_f32(self.0, rhs.0)) }
    }
}

impl Sub for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_f32(self.0, rhs.0)) }
    }
}

impl Mul for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_f32(self.0, rhs.0)) }
    }
}

impl Div for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(vdivq_f32(self.0, rhs.0)) }
    }
}

impl Neg for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(vnegq_f32(self.0)) }
    }
}

impl Vector128 for F32x4 {
    type Scalar = f32;
    type Generic = GenericF32x4;
    type Mask = MaskF32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        unsafe { Self(vdupq_n_f32(value)) }
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
        unsafe { Self::from_bits(vbicq_u32(self.bits(), rhs.bits())) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4(vceqq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskF32x4 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4(vcltq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4(vcleq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4(vcgtq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskF32x4 {
        unsafe { MaskF32x4(vcgeq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskF32x4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_f32(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskF32x4, if_true: Self) -> Self {
        unsafe { Self::from_bits(vandq_u32(mask.0, if_true.bits())) }
    }

    // fmin/fmax propagate NaN and order -0.0 below +0.0; compare-and-select
    // gives the same lanes as minps/maxps instead.
    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(vbslq_f32(vcltq_f32(self.0, rhs.0), self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(vbslq_f32(vcgtq_f32(self.0, rhs.0), self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(vabsq_f32(self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> f32 {
        let _ = LaneIndex::<LANE, 4>::INDEX;
        unsafe { vgetq_lane_f32::<LANE>(self.0) }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: f32) -> Self {
        let _ = LaneIndex::<LANE, 4>::INDEX;
        unsafe { Self(vsetq_lane_f32::<LANE>(value, self.0)) }
    }
}

impl FloatVector128 for F32x4 {
    type Int = I32x4;

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(vsqrtq_f32(self.0)) }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(vrndmq_f32(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(vrndpq_f32(self.0)) }
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        unsafe { Self(vrndq_f32(self.0)) }
    }

    #[inline(always)]
    fn round_even(self) -> Self {
        unsafe { Self(vrndnq_f32(self.0)) }
    }

    #[inline(always)]
    fn is_nan(self) -> MaskF32x4 {
        unsafe { MaskF32x4(vmvnq_u32(vceqq_f32(self.0, self.0))) }
    }

    // The fcvt*s conversions saturate and turn NaN into zero natively.
    #[inline(always)]
    fn round_nearest_even(self) -> I32x4 {
        unsafe { I32x4(vcvtnq_s32_f32(self.0)) }
    }

    #[inline(always)]
    fn truncate_toward_zero(self) -> I32x4 {
        unsafe { I32x4(vcvtq_s32_f32(self.0)) }
    }

    #[inline(always)]
    fn floor_toward_negative_infinity(self) -> I32x4 {
        unsafe { I32x4(vcvtmq_s32_f32(self.0)) }
    }
}

impl Shuffle4 for F32x4 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm4::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe { Self::from_bits(permute4(self.bits(), &Imm4::<IMM>::RECIPE)) }
    }
}

impl Widen for F32x4 {
    type Wide = F64x2;
    #[inline(always)]
    fn widen(self) -> F64x2 {
        unsafe { F64x2(vcvt_f64_f32(vget_low_f32(self.0))) }
    }
}

// ============================================================================
// F64x2
// ============================================================================

/// Two `f64` lanes in a NEON register.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F64x2(float64x2_t);

impl F64x2 {
    /// Builds a vector from lanes given highest lane first.
    #[inline(always)]
    pub fn new(lane1: f64, lane0: f64) -> Self {
        Self::from_array([lane0, lane1])
    }
}

impl_common!(F64x2, f64, 2, vld1q_f64, vst1q_f64, vreinterpretq_u32_f64, vreinterpretq_f64_u32);

impl Add for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_f64(self.0, rhs.0)) }
    }
}

impl Sub for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_f64(self.0, rhs.0)) }
    }
}

impl Mul for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_f64(self.0, rhs.0)) }
    }
}

impl Div for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(vdivq_f64(self.0, rhs.0)) }
    }
}

impl Neg for F64x2 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(vnegq_f64(self.0)) }
    }
}

impl Vector128 for F64x2 {
    type Scalar = f64;
    type Generic = GenericF64x2;
    type Mask = MaskF64x2;
    const LANES: usize = 2;

    #[inline(always)]
    fn splat(value: f64) -> Self {
        unsafe { Self(vdupq_n_f64(value)) }
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
        unsafe { Self::from_bits(vbicq_u32(self.bits(), rhs.bits())) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_wide(vceqq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> MaskF64x2 {
        !self.cmp_eq(rhs)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_wide(vcltq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_wide(vcleq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_wide(vcgtq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> MaskF64x2 {
        unsafe { MaskF64x2::from_wide(vcgeq_f64(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: MaskF64x2, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_f64(mask.wide(), if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn select_or_zero(mask: MaskF64x2, if_true: Self) -> Self {
        unsafe { Self::from_bits(vandq_u32(mask.0, if_true.bits())) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(vbslq_f64(vcltq_f64(self.0, rhs.0), self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(vbslq_f64(vcgtq_f64(self.0, rhs.0), self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(vabsq_f64(self.0)) }
    }

    #[inline(always)]
    fn get<const LANE: i32>(self) -> f64 {
        let _ = LaneIndex::<LANE, 2>::INDEX;
        unsafe { vgetq_lane_f64::<LANE>(self.0) }
    }

    #[inline(always)]
    fn with<const LANE: i32>(self, value: f64) -> Self {
        let _ = LaneIndex::<LANE, 2>::INDEX;
        unsafe { Self(vsetq_lane_f64::<LANE>(value, self.0)) }
    }
}

impl FloatVector128 for F64x2 {
    type Int = I64x2;

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(vsqrtq_f64(self.0)) }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(vrndmq_f64(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(vrndpq_f64(self.0)) }
    }

    #[inline(always)]
    fn trunc(self) -> Self {
        unsafe { Self(vrndq_f64(self.0)) }
    }

    #[inline(always)]
    fn round_even(self) -> Self {
        unsafe { Self(vrndnq_f64(self.0)) }
    }

    #[inline(always)]
    fn is_nan(self) -> MaskF64x2 {
        !self.cmp_eq(self)
    }

    #[inline(always)]
    fn round_nearest_even(self) -> I64x2 {
        unsafe { I64x2(vcvtnq_s64_f64(self.0)) }
    }

    #[inline(always)]
    fn truncate_toward_zero(self) -> I64x2 {
        unsafe { I64x2(vcvtq_s64_f64(self.0)) }
    }

    #[inline(always)]
    fn floor_toward_negative_infinity(self) -> I64x2 {
        unsafe { I64x2(vcvtmq_s64_f64(self.0)) }
    }
}

impl Shuffle2 for F64x2 {
    #[inline(always)]
    fn shuffle<const IMM: i32>(self) -> Self {
        if Imm2::<IMM>::IS_IDENTITY {
            return self;
        }
        unsafe {
            let bits = vreinterpretq_u64_f64(self.0);
            Self(vreinterpretq_f64_u64(permute2(bits, Imm2::<IMM>::RECIPE)))
        }
    }
}

impl Narrow for F64x2 {
    type Narrowed = F32x4;
    #[inline(always)]
    fn narrow(self) -> F32x4 {
        unsafe { F32x4(vcombine_f32(vcvt_f32_f64(self.0), vdup_n_f32(0.0))) }
    }
}

// ============================================================================
// Reinterpretation
// ============================================================================

macro_rules! impl_bitcast {
    ($from:ident => $to:ident, $cast:ident) => {
        impl BitCast<$to> for $from {
            #[inline(always)]
            fn bit_cast(self) -> $to {
                unsafe { $to($cast(self.0)) }
            }
        }
    };
}

impl_bitcast!(I32x4 => I64x2, vreinterpretq_s64_s32);
impl_bitcast!(I32x4 => F32x4, vreinterpretq_f32_s32);
impl_bitcast!(I32x4 => F64x2, vreinterpretq_f64_s32);
impl_bitcast!(I64x2 => I32x4, vreinterpretq_s32_s64);
impl_bitcast!(I64x2 => F32x4, vreinterpretq_f32_s64);
impl_bitcast!(I64x2 => F64x2, vreinterpretq_f64_s64);
impl_bitcast!(F32x4 => I32x4, vreinterpretq_s32_f32);
impl_bitcast!(F32x4 => I64x2, vreinterpretq_s64_f32);
impl_bitcast!(F32x4 => F64x2, vreinterpretq_f64_f32);
impl_bitcast!(F64x2 => I32x4, vreinterpretq_s32_f64);
impl_bitcast!(F64x2 => I64x2, vreinterpretq_s64_f64);
impl_bitcast!(F64x2 => F32x4, vreinterpretq_f32_f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::{decode4, perm4};

    #[test]
    fn lane_order_matches_memory_order() {
        let v = I32x4::new(3, 2, 1, 0);
        assert_eq!(v.to_array(), [0, 1, 2, 3]);
        assert_eq!(v.get::<3>(), 3);
        assert_eq!(v.with::<1>(-1).to_array(), [0, -1, 2, 3]);
    }

    #[test]
    fn every_recipe_runs_on_hardware() {
        let src = [10u32, 11, 12, 13];
        for (imm, recipe) in crate::shuffle::NEON_RECIPES.iter().enumerate() {
            let out = unsafe {
                let v = permute4(vld1q_u32(src.as_ptr()), recipe);
                let mut out = [0u32; 4];
                vst1q_u32(out.as_mut_ptr(), v);
                out
            };
            let expected = decode4(imm as i32).map(|l| src[l]);
            assert_eq!(out, expected, "imm {imm:#04x}");
        }
    }

    #[test]
    fn reverse_shuffle() {
        let v = F32x4::from_array([0.0, 1.0, 2.0, 3.0]);
        assert_eq!(v.shuffle::<{ perm4(3, 2, 1, 0) }>().to_array(), [3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn masks_round_trip_bitmasks() {
        for bits in 0..16u8 {
            let m = MaskI32x4::from_bitmask(bits);
            assert_eq!(m.bitmask(), bits);
            assert_eq!(m.any(), bits != 0);
            assert_eq!(m.all(), bits == 0xF);
        }
        for bits in 0..4u8 {
            let m = MaskF64x2::from_bitmask(bits);
            assert_eq!(m.bitmask(), bits);
            assert_eq!(m.all(), bits == 0b11);
        }
    }

    #[test]
    fn shifts_saturate() {
        let v = I64x2::from_array([-5, 5]);
        assert_eq!(v.shr(64).to_array(), [-1, 0]);
        assert_eq!(v.shl(300).to_array(), [0, 0]);
        assert_eq!(v.shr_logical(64).to_array(), [0, 0]);
        assert_eq!(v.shr_imm::<0>().to_array(), [-5, 5]);
    }
}
