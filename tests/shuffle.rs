//! Shuffle laws, checked exhaustively on the active backend.

use laneflow::backend::generic as reference;
use laneflow::prelude::*;
use laneflow::selftest::{all_shuffles2, all_shuffles4};
use laneflow::shuffle::{decode2, decode4, IDENTITY2, IDENTITY4, NEON_RECIPES};

#[test]
fn identity_is_a_no_op() {
    let ints = I32x4::new(i32::MIN, -1, 7, i32::MAX);
    assert_eq!(ints.shuffle::<IDENTITY4>().to_generic(), ints.to_generic());

    let nans = F32x4::from_array([f32::from_bits(0x7FC0_1234), -0.0, 1.0, f32::INFINITY]);
    assert_eq!(nans.shuffle::<IDENTITY4>().to_generic(), nans.to_generic());

    let wide = I64x2::new(i64::MIN, 3);
    assert_eq!(wide.shuffle::<IDENTITY2>().to_generic(), wide.to_generic());

    let doubles = F64x2::new(-0.0, f64::NAN);
    assert_eq!(doubles.shuffle::<IDENTITY2>().to_generic(), doubles.to_generic());
}

#[test]
fn every_four_lane_permutation() {
    let src = [100, 101, 102, 103];
    let native = all_shuffles4(I32x4::from_array(src));
    let oracle = all_shuffles4(reference::I32x4::from_array(src));

    for imm in 0..256 {
        let expected = decode4(imm as i32).map(|lane| src[lane]);
        assert_eq!(native[imm].to_array(), expected, "active backend, imm {imm:#04x}");
        assert_eq!(oracle[imm].to_array(), expected, "generic backend, imm {imm:#04x}");
    }
}

#[test]
fn every_four_lane_float_permutation_keeps_bits() {
    let src = [-0.0f32, f32::from_bits(0x7F80_0001), f32::MIN_POSITIVE / 2.0, -1.5];
    let native = all_shuffles4(F32x4::from_array(src));

    for (imm, out) in native.iter().enumerate() {
        let expected = GenericF32x4::from_array(decode4(imm as i32).map(|lane| src[lane]));
        assert_eq!(out.to_generic(), expected, "imm {imm:#04x}");
    }
}

#[test]
fn every_two_lane_permutation() {
    let ints = all_shuffles2(I64x2::from_array([-5, 9]));
    let floats = all_shuffles2(F64x2::from_array([0.25, -0.0]));

    for imm in 0..4 {
        let lanes = decode2(imm as i32);
        assert_eq!(ints[imm].to_array(), lanes.map(|l| [-5, 9][l]));
        assert_eq!(
            floats[imm].to_generic(),
            GenericF64x2::from_array(lanes.map(|l| [0.25, -0.0][l]))
        );
    }
}

#[test]
fn macro_encodes_index_lists() {
    let v = I32x4::new(3, 2, 1, 0);
    assert_eq!(shuffle!(v, [3, 2, 1, 0]).to_array(), [3, 2, 1, 0]);
    assert_eq!(shuffle!(v, [2, 2, 2, 2]).to_array(), [2, 2, 2, 2]);

    let w = F64x2::new(2.0, 1.0);
    assert_eq!(shuffle!(w, [1, 0]).to_array(), [2.0, 1.0]);
    assert_eq!(shuffle!(w, [0, 0]).to_array(), [1.0, 1.0]);
}

#[test]
fn recipe_table_is_short() {
    assert!(NEON_RECIPES.iter().all(|recipe| recipe.len() <= 4));
    assert!(NEON_RECIPES[IDENTITY4 as usize].is_empty());
    // A single dup broadcasts any one lane.
    for lane in 0..4 {
        assert_eq!(NEON_RECIPES[perm4(lane, lane, lane, lane) as usize].len(), 1);
    }
}
