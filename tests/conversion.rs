//! Float/int conversion and shape changes.

use laneflow::prelude::*;

#[test]
fn rounding_laws() {
    let v = F32x4::new(-2.3, -2.7, 3.5, 2.5);
    assert_eq!(v.round_nearest_even().to_array(), [2, 4, -3, -2]);
    assert_eq!(v.truncate_toward_zero().to_array(), [2, 3, -2, -2]);
    assert_eq!(v.floor_toward_negative_infinity().to_array(), [2, 3, -3, -3]);

    let d = F64x2::new(-2.3, 2.5);
    assert_eq!(d.round_nearest_even().to_array(), [2, -2]);
    assert_eq!(d.truncate_toward_zero().to_array(), [2, -2]);
    assert_eq!(d.floor_toward_negative_infinity().to_array(), [2, -3]);
}

#[test]
fn float_to_int_saturates_and_zeroes_nan() {
    let v = F32x4::from_array([f32::NAN, f32::INFINITY, -1.0e20, 2147483648.0]);
    assert_eq!(v.truncate_toward_zero().to_array(), [0, i32::MAX, i32::MIN, i32::MAX]);
    assert_eq!(v.round_nearest_even().to_array(), [0, i32::MAX, i32::MIN, i32::MAX]);
    assert_eq!(v.floor_toward_negative_infinity().to_array(), [0, i32::MAX, i32::MIN, i32::MAX]);

    let d = F64x2::from_array([f64::NAN, -1.0e300]);
    assert_eq!(d.truncate_toward_zero().to_array(), [0, i64::MIN]);
    let d = F64x2::from_array([f64::NEG_INFINITY, 9.3e18]);
    assert_eq!(d.round_nearest_even().to_array(), [i64::MIN, i64::MAX]);
}

#[test]
fn float_rounding_keeps_sign() {
    let v = F32x4::from_array([-0.5, 0.5, -0.0, 1.0e-40]);
    let bits = |x: F32x4| x.to_array().map(f32::to_bits);

    assert_eq!(bits(v.round_even()), [(-0.0f32).to_bits(), 0, (-0.0f32).to_bits(), 0]);
    assert_eq!(bits(v.trunc()), [(-0.0f32).to_bits(), 0, (-0.0f32).to_bits(), 0]);
    assert_eq!(v.floor().to_array(), [-1.0, 0.0, -0.0, 0.0]);
    assert_eq!(bits(v.ceil())[0], (-0.0f32).to_bits());
    assert_eq!(v.ceil().to_array()[1], 1.0);
}

#[test]
fn large_floats_are_already_integral() {
    let v = F32x4::from_array([8388609.0, -16777216.0, f32::MAX, f32::INFINITY]);
    assert_eq!(v.floor().to_generic(), v.to_generic());
    assert_eq!(v.ceil().to_generic(), v.to_generic());
    assert_eq!(v.round_even().to_generic(), v.to_generic());
}

#[test]
fn int_to_float() {
    let v = I32x4::from_array([0, -1, 16_777_217, i32::MIN]);
    assert_eq!(v.to_float().to_array(), [0.0, -1.0, 16_777_216.0, -2147483648.0]);

    let w = I64x2::from_array([(1 << 53) + 1, -3]);
    assert_eq!(w.to_float().to_array(), [9007199254740992.0, -3.0]);
}

#[test]
fn widen_takes_low_lanes() {
    let v = I32x4::new(99, 98, -2, i32::MIN);
    assert_eq!(v.widen().to_array(), [i32::MIN as i64, -2]);

    let f = F32x4::new(9.0, 9.0, 0.1, -0.0);
    let wide = f.widen().to_generic();
    assert_eq!(wide, GenericF64x2::from_array([-0.0, 0.1f32 as f64]));
}

#[test]
fn narrow_fills_high_lanes_with_zero() {
    let v = I64x2::new(0x1_0000_0005, -1);
    assert_eq!(v.narrow().to_array(), [-1, 5, 0, 0]);

    let d = F64x2::new(1.0e300, 0.1);
    assert_eq!(d.narrow().to_array(), [0.1f32, f32::INFINITY, 0.0, 0.0]);
}

#[test]
fn shifts_saturate_past_lane_width() {
    let v = I32x4::from_array([-8, 8, i32::MIN, 1]);
    assert_eq!(v.shl(32).to_array(), [0; 4]);
    assert_eq!(v.shr_logical(40).to_array(), [0; 4]);
    assert_eq!(v.shr(32).to_array(), [-1, 0, -1, 0]);
    assert_eq!(v.shr(1).to_array(), [-4, 4, i32::MIN / 2, 0]);
    assert_eq!(v.shr_logical(28).to_array(), [0xF, 0, 0x8, 0]);
    assert_eq!(v.shl_imm::<1>().to_array(), [-16, 16, 0, 2]);
    assert_eq!(v.shr_imm::<3>().to_array(), [-1, 1, i32::MIN >> 3, 0]);
    assert_eq!(v.shr_logical_imm::<31>().to_array(), [1, 0, 1, 0]);
}

#[test]
fn wide_arithmetic_shift_by_huge_count_gives_sign_mask() {
    let v = I64x2::from_array([i64::MIN + 1, i64::MAX]);
    for count in [64, 65, 127, 1000, u32::MAX] {
        assert_eq!(v.shr(count).to_array(), [-1, 0], "count {count}");
    }
    assert_eq!(v.shr(63).to_array(), [-1, 0]);
    assert_eq!(v.shr_imm::<63>().to_array(), [-1, 0]);
}
