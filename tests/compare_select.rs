//! Comparisons, mask logic and selection.

use laneflow::prelude::*;

#[test]
fn select_follows_every_mask() {
    let t = I32x4::new(40, 30, 20, 10);
    let f = I32x4::new(400, 300, 200, 100);
    for bits in 0..16u8 {
        let mask = MaskI32x4::from_bitmask(bits);
        let out = I32x4::select(mask, t, f).to_array();
        let zeroed = I32x4::select_or_zero(mask, t).to_array();
        for lane in 0..4 {
            let set = bits & (1 << lane) != 0;
            assert_eq!(out[lane], if set { t.to_array()[lane] } else { f.to_array()[lane] });
            assert_eq!(zeroed[lane], if set { t.to_array()[lane] } else { 0 });
        }
        assert_eq!(
            [mask.test::<0>(), mask.test::<1>(), mask.test::<2>(), mask.test::<3>()],
            [0, 1, 2, 3].map(|lane| bits & (1 << lane) != 0)
        );
    }
}

#[test]
fn select_follows_every_two_lane_mask() {
    let t = F64x2::new(-0.0, f64::INFINITY);
    let f = F64x2::new(1.0, 2.0);
    for bits in 0..4u8 {
        let out = MaskF64x2::from_bitmask(bits).select(t, f).to_generic();
        let expected = GenericF64x2::from_array([
            if bits & 1 != 0 { f64::INFINITY } else { 2.0 },
            if bits & 2 != 0 { -0.0 } else { 1.0 },
        ]);
        assert_eq!(out, expected);
        let mask = MaskF64x2::from_bitmask(bits);
        assert_eq!([mask.test::<0>(), mask.test::<1>()], [bits & 1 != 0, bits & 2 != 0]);
    }
}

#[test]
fn nan_compares_false_except_ne() {
    let nan = F32x4::splat(f32::NAN);
    let one = F32x4::splat(1.0);
    assert!(nan.cmp_eq(nan).none());
    assert!(nan.cmp_lt(one).none());
    assert!(nan.cmp_le(one).none());
    assert!(nan.cmp_gt(one).none());
    assert!(nan.cmp_ge(nan).none());
    assert!(nan.cmp_ne(nan).all());
    assert!(nan.is_nan().all());
    assert!(one.is_nan().none());
}

#[test]
fn signed_zeros_compare_equal() {
    let pos = F64x2::splat(0.0);
    let neg = F64x2::splat(-0.0);
    assert!(pos.cmp_eq(neg).all());
    assert!(pos.cmp_lt(neg).none());
}

#[test]
fn integer_compares_are_signed() {
    let a = I64x2::new(i64::MIN, -1);
    let b = I64x2::new(0, i64::MAX);
    assert_eq!(a.cmp_lt(b).bitmask(), 0b11);
    assert_eq!(b.cmp_gt(a).bitmask(), 0b11);
    assert_eq!(a.cmp_le(a).bitmask(), 0b11);
}

#[test]
fn mask_logic() {
    let v = I32x4::new(3, 2, 1, 0);
    let high = v.cmp_gt(I32x4::splat(1));
    let odd = (v & I32x4::splat(1)).cmp_eq(I32x4::splat(1));

    assert_eq!(high.bitmask(), 0b1100);
    assert_eq!(odd.bitmask(), 0b1010);
    assert_eq!((high & odd).bitmask(), 0b1000);
    assert_eq!((high | odd).bitmask(), 0b1110);
    assert_eq!((high ^ odd).bitmask(), 0b0110);
    assert_eq!((!high).bitmask(), 0b0011);
    assert!(MaskI32x4::splat(true).all());
    assert!(MaskI32x4::default().none());
}

#[test]
fn masks_convert_between_same_lane_counts() {
    let ints = I32x4::new(1, 0, 1, 0).cmp_eq(I32x4::splat(1));
    let floats: MaskF32x4 = ints.into();
    let picked = F32x4::select(floats, F32x4::splat(1.0), F32x4::splat(-1.0));
    assert_eq!(picked.to_array(), [-1.0, 1.0, -1.0, 1.0]);

    let back: MaskI32x4 = floats.into();
    assert_eq!(back, ints);

    let wide: MaskF64x2 = I64x2::new(5, 0).cmp_ne(I64x2::default()).into();
    assert_eq!(wide.bitmask(), 0b10);
}

#[test]
fn min_max_clamp() {
    let v = I32x4::new(-50, 50, 5, i32::MIN);
    let lo = I32x4::splat(0);
    let hi = I32x4::splat(10);
    assert_eq!(v.clamp(lo, hi).to_array(), [0, 5, 10, 0]);
    assert_eq!(v.min(lo).to_array(), [i32::MIN, 0, 0, -50]);
    assert_eq!(v.max(lo).to_array(), [0, 5, 50, 0]);
}
