//! Property tests: the active backend against the generic backend.
//!
//! Random lanes come from proptest's full-range strategies, so NaN,
//! infinities and subnormals all show up. NaN payloads are erased before
//! comparing float arithmetic.

use laneflow::backend::generic as reference;
use laneflow::prelude::*;
use proptest::prelude::*;

fn canon32(lanes: [f32; 4]) -> [u32; 4] {
    lanes.map(|v| if v.is_nan() { f32::NAN } else { v }.to_bits())
}

fn canon64(lanes: [f64; 2]) -> [u64; 2] {
    lanes.map(|v| if v.is_nan() { f64::NAN } else { v }.to_bits())
}

proptest! {
    #[test]
    fn i32x4_arithmetic_matches(a in any::<[i32; 4]>(), b in any::<[i32; 4]>()) {
        let (x, y) = (I32x4::from_array(a), I32x4::from_array(b));
        let (rx, ry) = (reference::I32x4::from_array(a), reference::I32x4::from_array(b));

        prop_assert_eq!((x + y).to_array(), (rx + ry).to_array());
        prop_assert_eq!((x - y).to_array(), (rx - ry).to_array());
        prop_assert_eq!((x * y).to_array(), (rx * ry).to_array());
        prop_assert_eq!(x.safe_divide(y).to_array(), rx.safe_divide(ry).to_array());
        prop_assert_eq!(x.min(y).to_array(), rx.min(ry).to_array());
        prop_assert_eq!(x.max(y).to_array(), rx.max(ry).to_array());
        prop_assert_eq!(x.abs().to_array(), rx.abs().to_array());
        prop_assert_eq!(x.cmp_lt(y).bitmask(), rx.cmp_lt(ry).bitmask());
        prop_assert_eq!(x.cmp_ge(y).bitmask(), rx.cmp_ge(ry).bitmask());
    }

    #[test]
    fn i64x2_arithmetic_matches(a in any::<[i64; 2]>(), b in any::<[i64; 2]>(), count in 0u32..80) {
        let (x, y) = (I64x2::from_array(a), I64x2::from_array(b));
        let (rx, ry) = (reference::I64x2::from_array(a), reference::I64x2::from_array(b));

        prop_assert_eq!((x * y).to_array(), (rx * ry).to_array());
        prop_assert_eq!(x.cmp_gt(y).bitmask(), rx.cmp_gt(ry).bitmask());
        prop_assert_eq!(x.shl(count).to_array(), rx.shl(count).to_array());
        prop_assert_eq!(x.shr(count).to_array(), rx.shr(count).to_array());
        prop_assert_eq!(x.shr_logical(count).to_array(), rx.shr_logical(count).to_array());
        prop_assert_eq!(x.to_float().to_array(), rx.to_float().to_array());
    }

    #[test]
    fn f32x4_arithmetic_matches(a in any::<[f32; 4]>(), b in any::<[f32; 4]>()) {
        let (x, y) = (F32x4::from_array(a), F32x4::from_array(b));
        let (rx, ry) = (reference::F32x4::from_array(a), reference::F32x4::from_array(b));

        prop_assert_eq!(canon32((x + y).to_array()), canon32((rx + ry).to_array()));
        prop_assert_eq!(canon32((x * y).to_array()), canon32((rx * ry).to_array()));
        prop_assert_eq!(canon32((x / y).to_array()), canon32((rx / ry).to_array()));
        prop_assert_eq!(canon32(x.sqrt().to_array()), canon32(rx.sqrt().to_array()));
        prop_assert_eq!(canon32(x.floor().to_array()), canon32(rx.floor().to_array()));
        prop_assert_eq!(canon32(x.ceil().to_array()), canon32(rx.ceil().to_array()));
        prop_assert_eq!(canon32(x.round_even().to_array()), canon32(rx.round_even().to_array()));
        prop_assert_eq!(x.min(y).to_generic(), rx.min(ry).to_generic());
        prop_assert_eq!(x.max(y).to_generic(), rx.max(ry).to_generic());
        prop_assert_eq!(x.cmp_ne(y).bitmask(), rx.cmp_ne(ry).bitmask());
        prop_assert_eq!(x.is_nan().bitmask(), rx.is_nan().bitmask());
    }

    #[test]
    fn f32x4_conversions_match(a in any::<[f32; 4]>()) {
        let (x, rx) = (F32x4::from_array(a), reference::F32x4::from_array(a));

        prop_assert_eq!(x.round_nearest_even().to_array(), rx.round_nearest_even().to_array());
        prop_assert_eq!(x.truncate_toward_zero().to_array(), rx.truncate_toward_zero().to_array());
        prop_assert_eq!(
            x.floor_toward_negative_infinity().to_array(),
            rx.floor_toward_negative_infinity().to_array()
        );
        prop_assert_eq!(canon64(x.widen().to_array()), canon64(rx.widen().to_array()));
    }

    #[test]
    fn f64x2_conversions_match(a in any::<[f64; 2]>(), b in any::<[f64; 2]>()) {
        let (x, y) = (F64x2::from_array(a), F64x2::from_array(b));
        let (rx, ry) = (reference::F64x2::from_array(a), reference::F64x2::from_array(b));

        prop_assert_eq!(canon64((x - y).to_array()), canon64((rx - ry).to_array()));
        prop_assert_eq!(canon64(x.trunc().to_array()), canon64(rx.trunc().to_array()));
        prop_assert_eq!(x.round_nearest_even().to_array(), rx.round_nearest_even().to_array());
        prop_assert_eq!(
            x.floor_toward_negative_infinity().to_array(),
            rx.floor_toward_negative_infinity().to_array()
        );
        prop_assert_eq!(canon32(x.narrow().to_array()), canon32(rx.narrow().to_array()));
    }
}

#[test]
fn signed_zero_min_max_takes_rhs() {
    let pos = F32x4::splat(0.0);
    let neg = F32x4::splat(-0.0);
    assert_eq!(pos.min(neg).to_generic(), neg.to_generic());
    assert_eq!(neg.min(pos).to_generic(), pos.to_generic());
    assert_eq!(pos.max(neg).to_generic(), neg.to_generic());
}

#[test]
fn nan_min_max_takes_rhs() {
    let nan = F64x2::splat(f64::NAN);
    let one = F64x2::splat(1.0);
    assert_eq!(nan.min(one).to_array(), [1.0, 1.0]);
    assert!(one.max(nan).to_array()[0].is_nan());
}
