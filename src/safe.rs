//! Trap-free arithmetic helpers.
//!
//! Free-function forms of the operations call sites reach for when a lane may
//! hold a value that would fault or disagree across backends: zero divisors,
//! integer `MIN`, signed zeros. They work on any backend's vectors.
//!
//! ```
//! use laneflow::prelude::*;
//! use laneflow::safe;
//!
//! let a = I32x4::new(40, 30, 20, 10);
//! let b = I32x4::new(4, 0, 2, 0);
//! let q = safe::divide_or_zero(a, b);
//! assert_eq!(q.to_array(), [0, 10, 0, 10]);
//! ```

use crate::backend::{FloatVector128, Vector128};

pub use crate::fpenv::{DenormalGuard, DenormalMode};

/// Divides with every zero lane of `divisor` replaced by one.
///
/// The division never traps. Result lanes where `divisor` was zero hold the
/// dividend and must be masked out by the caller.
#[inline(always)]
pub fn safe_divide<V: Vector128>(dividend: V, divisor: V) -> V {
    dividend.safe_divide(divisor)
}

/// Divides, giving zero in every lane whose divisor is zero.
#[inline(always)]
pub fn divide_or_zero<V: Vector128>(dividend: V, divisor: V) -> V {
    let nonzero = divisor.cmp_ne(V::default());
    V::select_or_zero(nonzero, dividend.safe_divide(divisor))
}

/// Lane-wise absolute value. Integer `MIN` stays `MIN`.
#[inline(always)]
pub fn abs<V: Vector128>(v: V) -> V {
    v.abs()
}

/// `v.max(lo).min(hi)`.
#[inline(always)]
pub fn clamp<V: Vector128>(v: V, lo: V, hi: V) -> V {
    v.clamp(lo, hi)
}

/// Replaces `-0.0` with `+0.0`.
///
/// Run inputs through this before `min`/`max` when the sign of a zero result
/// has to be deterministic.
#[inline(always)]
pub fn remove_signed_zero<V: FloatVector128>(v: V) -> V {
    v.remove_signed_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::generic::{F32x4, I32x4, I64x2};

    #[test]
    fn divide_or_zero_clears_zero_divisor_lanes() {
        let a = I64x2::from_array([9, i64::MIN]);
        let b = I64x2::from_array([0, -1]);
        // MIN / -1 wraps
        assert_eq!(divide_or_zero(a, b).to_array(), [0, i64::MIN]);
    }

    #[test]
    fn float_division_by_zero_keeps_dividend() {
        let a = F32x4::from_array([1.0, -2.0, 3.0, 4.0]);
        let b = F32x4::from_array([0.0, -0.0, 3.0, 2.0]);
        assert_eq!(safe_divide(a, b).to_array(), [1.0, -2.0, 1.0, 2.0]);
    }

    #[test]
    fn abs_of_min_wraps() {
        let v = I32x4::from_array([i32::MIN, -1, 0, i32::MAX]);
        assert_eq!(abs(v).to_array(), [i32::MIN, 1, 0, i32::MAX]);
    }

    #[test]
    fn signed_zero_only_changes_negative_zero() {
        let v = F32x4::from_array([-0.0, 0.0, -1.0, f32::NAN]);
        let bits = remove_signed_zero(v).to_array().map(f32::to_bits);
        assert_eq!(bits[0], 0);
        assert_eq!(bits[1], 0);
        assert_eq!(bits[2], (-1.0f32).to_bits());
        assert_eq!(bits[3], f32::NAN.to_bits());
    }

    #[test]
    fn clamp_orders_max_then_min() {
        let v = I32x4::from_array([-5, 5, 50, 0]);
        let out = clamp(v, I32x4::splat(0), I32x4::splat(10));
        assert_eq!(out.to_array(), [0, 5, 10, 0]);
    }
}
