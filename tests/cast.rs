//! Bit reinterpretation between shapes.

use laneflow::prelude::*;
use laneflow::cast;

#[test]
fn cast_is_not_conversion() {
    let bits: I32x4 = cast(F32x4::splat(1.0));
    assert_eq!(bits.to_array(), [0x3F80_0000; 4]);

    let tiny: F32x4 = cast(I32x4::splat(1));
    assert_eq!(tiny.to_array()[0], f32::from_bits(1));
    assert_ne!(tiny.to_array()[0], 1.0);

    let converted = I32x4::splat(1).to_float();
    assert_eq!(converted.to_array(), [1.0; 4]);
}

#[test]
fn lanes_split_little_end_first() {
    let wide = I64x2::from_array([0x0000_0002_0000_0001, -1]);
    let narrow: I32x4 = cast(wide);
    assert_eq!(narrow.to_array(), [1, 2, -1, -1]);

    let doubles: F64x2 = cast(I64x2::from_array([0x3FF0_0000_0000_0000, 0]));
    assert_eq!(doubles.to_array(), [1.0, 0.0]);
}

macro_rules! round_trip {
    ($v:expr, $from:ty => $via:ty) => {{
        let v: $from = $v;
        let there: $via = cast(v);
        let back: $from = cast(there);
        assert_eq!(back.to_generic(), v.to_generic(), "{} via {}", stringify!($from), stringify!($via));
    }};
}

#[test]
fn every_pair_round_trips() {
    let i = I32x4::from_array([i32::MIN, -1, 0x7FC0_0001, 0x7F80_0001]);
    let l = I64x2::from_array([i64::MIN, 0x7FF0_0000_0000_0001]);
    let f = F32x4::from_array([-0.0, f32::from_bits(0x7FA0_0000), f32::INFINITY, 1.0e-42]);
    let d = F64x2::from_array([-0.0, f64::from_bits(0xFFF0_0000_0000_0002)]);

    round_trip!(i, I32x4 => I64x2);
    round_trip!(i, I32x4 => F32x4);
    round_trip!(i, I32x4 => F64x2);
    round_trip!(l, I64x2 => I32x4);
    round_trip!(l, I64x2 => F32x4);
    round_trip!(l, I64x2 => F64x2);
    round_trip!(f, F32x4 => I32x4);
    round_trip!(f, F32x4 => I64x2);
    round_trip!(f, F32x4 => F64x2);
    round_trip!(d, F64x2 => I32x4);
    round_trip!(d, F64x2 => I64x2);
    round_trip!(d, F64x2 => F32x4);
}
