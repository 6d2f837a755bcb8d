//! Trap-free division and the other safe-arithmetic helpers.

use laneflow::prelude::*;
use laneflow::{backend, safe};

#[test]
fn divide_by_zero_does_not_trap() {
    let out = I32x4::splat(5).safe_divide(I32x4::splat(0));
    // The lane is garbage by contract; it only has to exist.
    let _ = out.to_array();

    let out = I64x2::splat(5).safe_divide(I64x2::splat(0));
    let _ = out.to_array();
}

#[test]
fn divide_by_one_is_identity() {
    assert_eq!(I32x4::splat(5).safe_divide(I32x4::splat(1)).to_array(), [5; 4]);
    assert_eq!(F64x2::splat(5.0).safe_divide(F64x2::splat(1.0)).to_array(), [5.0; 2]);
}

#[test]
fn masked_division() {
    let a = I32x4::new(40, 30, 20, 10);
    let b = I32x4::new(4, 0, 2, 0);
    assert_eq!(safe::divide_or_zero(a, b).to_array(), [0, 10, 0, 10]);

    let wrap = I32x4::splat(i32::MIN).safe_divide(I32x4::splat(-1));
    assert_eq!(wrap.to_array(), [i32::MIN; 4]);
}

#[test]
fn integer_division_by_zero_lane_is_zero() {
    let q = I32x4::splat(5) / I32x4::from_array([1, 0, 1, 1]);
    assert_eq!(q.to_array(), [5, 0, 5, 5]);

    let q = I64x2::new(-7, i64::MIN) / I64x2::new(0, -1);
    assert_eq!(q.to_array(), [i64::MIN, 0]);

    let g = backend::generic::I32x4::splat(-9) / backend::generic::I32x4::default();
    assert_eq!(g.to_array(), [0; 4]);
}

#[test]
fn abs_min_value_wraps() {
    assert_eq!(I32x4::splat(i32::MIN).abs().to_array(), [i32::MIN; 4]);
    assert_eq!(I64x2::new(i64::MIN, -9).abs().to_array(), [9, i64::MIN]);
    let f = F32x4::from_array([-0.0, -1.5, f32::NEG_INFINITY, 2.0]).abs();
    assert_eq!(f.to_generic(), GenericF32x4::from_array([0.0, 1.5, f32::INFINITY, 2.0]));
}

#[test]
fn remove_signed_zero_normalises_min_max() {
    let a = safe::remove_signed_zero(F32x4::splat(-0.0));
    let b = F32x4::splat(0.0);
    assert_eq!(a.min(b).to_generic(), b.min(a).to_generic());
    assert_eq!(a.to_generic(), GenericF32x4::from_array([0.0; 4]));

    let nan = safe::remove_signed_zero(F64x2::splat(f64::NAN));
    assert!(nan.is_nan().all());
}

#[test]
fn free_function_clamp() {
    let v = F64x2::new(7.0, -7.0);
    let out = safe::clamp(v, F64x2::splat(-1.0), F64x2::splat(1.0));
    assert_eq!(out.to_array(), [-1.0, 1.0]);
    assert_eq!(safe::abs(v).to_array(), [7.0, 7.0]);
}
