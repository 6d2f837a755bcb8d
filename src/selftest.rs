//! Backend parity self-check.
//!
//! Runs every operation on the active backend and on the generic backend over
//! the same inputs and compares the results bit for bit. Inputs are a fixed
//! set of edge values (signed zeros, infinities, NaN, integer extremes,
//! subnormals, rounding ties) plus a seeded pseudo-random sample, so two runs
//! with the same [`SelfTestConfig`] check exactly the same lanes.
//!
//! Float results of arithmetic are compared with every NaN lane collapsed to
//! one canonical NaN: payload propagation is not part of the contract.
//! Bitwise ops, selects, shuffles and casts are compared on raw bits.

use anyhow::Context;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backend::generic::{self, Generic};
use crate::backend::{
    Backend, BitCast, FloatVector128, IntVector128, Mask128, Narrow, Shuffle2, Shuffle4,
    Vector128, Widen,
};
use crate::config::SelfTestConfig;
use crate::lanes::{BackendKind, GenericF32x4, GenericF64x2, GenericI32x4, GenericI64x2};
use crate::shuffle::{decode2, decode4};

/// Mismatches recorded in full; the rest are only counted.
const MAX_REPORTED: usize = 32;

/// Inputs per shape that get the exhaustive shuffle sweep.
const SHUFFLE_CASES: usize = 8;

const SHIFT_COUNTS: [u32; 11] = [0, 1, 7, 31, 32, 33, 63, 64, 65, 200, u32::MAX];

/// Outcome of a self-check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfTestReport {
    /// Backend under test.
    pub backend: BackendKind,
    /// Backend the results were compared against.
    pub reference: BackendKind,
    /// Seed of the pseudo-random inputs.
    pub seed: u64,
    /// Individual comparisons made.
    pub checks: usize,
    /// Comparisons that disagreed.
    pub mismatches: usize,
    /// The first few mismatches.
    pub failures: Vec<Mismatch>,
}

impl SelfTestReport {
    /// True when every comparison agreed.
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize self-test report")
    }
}

/// One disagreeing comparison. Lane bits are hex, lane 0 first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Vector shape, e.g. `F32x4`.
    pub shape: String,
    /// Operation name.
    pub op: String,
    /// Index of the input in the corpus.
    pub case: usize,
    /// Generic backend result.
    pub expected: Vec<String>,
    /// Active backend result.
    pub actual: Vec<String>,
}

// ============================================================================
// Observation
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Lanes {
    len: usize,
    bits: [u64; 4],
}

impl Lanes {
    fn from_slice(lanes: &[u64]) -> Self {
        let mut bits = [0; 4];
        bits[..lanes.len()].copy_from_slice(lanes);
        Lanes {
            len: lanes.len(),
            bits,
        }
    }

    fn hex(&self) -> Vec<String> {
        self.bits[..self.len].iter().map(|b| format!("{b:#x}")).collect()
    }
}

/// Reduces a result to comparable lane bits.
trait Observe {
    fn exact(&self) -> Lanes;

    /// Like `exact`, with NaN payloads erased.
    fn canonical(&self) -> Lanes {
        self.exact()
    }
}

impl Observe for GenericI32x4 {
    fn exact(&self) -> Lanes {
        Lanes::from_slice(&self.to_bits().map(u64::from))
    }
}

impl Observe for GenericI64x2 {
    fn exact(&self) -> Lanes {
        Lanes::from_slice(&self.to_bits())
    }
}

impl Observe for GenericF32x4 {
    fn exact(&self) -> Lanes {
        Lanes::from_slice(&self.to_bits().map(u64::from))
    }

    fn canonical(&self) -> Lanes {
        let lanes = self
            .to_array()
            .map(|v| if v.is_nan() { f32::NAN } else { v }.to_bits() as u64);
        Lanes::from_slice(&lanes)
    }
}

impl Observe for GenericF64x2 {
    fn exact(&self) -> Lanes {
        Lanes::from_slice(&self.to_bits())
    }

    fn canonical(&self) -> Lanes {
        let lanes = self
            .to_array()
            .map(|v| if v.is_nan() { f64::NAN } else { v }.to_bits());
        Lanes::from_slice(&lanes)
    }
}

/// Mask bitmasks and boolean summaries.
impl Observe for u8 {
    fn exact(&self) -> Lanes {
        Lanes::from_slice(&[*self as u64])
    }
}

#[derive(Default)]
struct Checker {
    checks: usize,
    mismatches: usize,
    failures: Vec<Mismatch>,
}

impl Checker {
    fn compare(&mut self, shape: &str, op: &str, case: usize, expected: Lanes, actual: Lanes) {
        self.checks += 1;
        if expected == actual {
            return;
        }
        self.mismatches += 1;
        if self.failures.len() < MAX_REPORTED {
            warn!("{shape}.{op} case {case}: expected {:?}, got {:?}", expected.hex(), actual.hex());
            self.failures.push(Mismatch {
                shape: shape.to_string(),
                op: op.to_string(),
                case,
                expected: expected.hex(),
                actual: actual.hex(),
            });
        }
    }
}

// Each input is a (native, reference) pair. The body is expanded once per
// side so it type-checks against each backend's own types.
macro_rules! check {
    ($ck:expr, $shape:expr, $op:expr, $case:expr, $observe:ident, ($($x:ident),+) => $body:expr) => {{
        let expected = { $(let $x = $x.1;)+ $body };
        let actual = { $(let $x = $x.0;)+ $body };
        $ck.compare($shape, $op, $case, Observe::$observe(&expected), Observe::$observe(&actual));
    }};
}

macro_rules! check_cast {
    ($ck:expr, $shape:expr, $op:expr, $case:expr, $x:expr, $native:ty, $reference:ty) => {{
        let actual: $native = BitCast::bit_cast($x.0);
        let expected: $reference = BitCast::bit_cast($x.1);
        $ck.compare($shape, $op, $case, expected.to_generic().exact(), actual.to_generic().exact());
    }};
}

fn mask_of<V: Vector128>(_: V, bits: u8) -> V::Mask {
    V::Mask::from_bitmask(bits)
}

fn summary<M: Mask128>(m: M) -> u8 {
    (m.any() as u8) | (m.all() as u8) << 1 | (m.none() as u8) << 2
}

// ============================================================================
// Per-trait checks
// ============================================================================

fn check_common<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: Vector128,
    G: Vector128<Generic = N::Generic>,
    N::Generic: Observe,
{
    for (case, &(a, b)) in pairs.iter().enumerate() {
        let x = (N::from_generic(a), G::from_generic(a));
        let y = (N::from_generic(b), G::from_generic(b));

        check!(ck, shape, "from_generic", case, exact, (x) => x.to_generic());
        check!(ck, shape, "add", case, canonical, (x, y) => (x + y).to_generic());
        check!(ck, shape, "sub", case, canonical, (x, y) => (x - y).to_generic());
        check!(ck, shape, "mul", case, canonical, (x, y) => (x * y).to_generic());
        check!(ck, shape, "neg", case, canonical, (x) => (-x).to_generic());
        check!(ck, shape, "abs", case, canonical, (x) => x.abs().to_generic());
        check!(ck, shape, "safe_divide", case, canonical, (x, y) => x.safe_divide(y).to_generic());

        check!(ck, shape, "and", case, exact, (x, y) => (x & y).to_generic());
        check!(ck, shape, "or", case, exact, (x, y) => (x | y).to_generic());
        check!(ck, shape, "xor", case, exact, (x, y) => (x ^ y).to_generic());
        check!(ck, shape, "not", case, exact, (x) => (!x).to_generic());
        check!(ck, shape, "and_not", case, exact, (x, y) => x.and_not(y).to_generic());

        check!(ck, shape, "min", case, exact, (x, y) => x.min(y).to_generic());
        check!(ck, shape, "max", case, exact, (x, y) => x.max(y).to_generic());
        check!(ck, shape, "clamp", case, exact, (x, y) => x.clamp(y, x.max(y)).to_generic());

        check!(ck, shape, "cmp_eq", case, exact, (x, y) => x.cmp_eq(y).bitmask());
        check!(ck, shape, "cmp_ne", case, exact, (x, y) => x.cmp_ne(y).bitmask());
        check!(ck, shape, "cmp_lt", case, exact, (x, y) => x.cmp_lt(y).bitmask());
        check!(ck, shape, "cmp_le", case, exact, (x, y) => x.cmp_le(y).bitmask());
        check!(ck, shape, "cmp_gt", case, exact, (x, y) => x.cmp_gt(y).bitmask());
        check!(ck, shape, "cmp_ge", case, exact, (x, y) => x.cmp_ge(y).bitmask());
        check!(ck, shape, "mask_logic", case, exact, (x, y) => {
            ((x.cmp_lt(y) | x.cmp_eq(y)) ^ !x.cmp_ge(y) & x.cmp_ne(y)).bitmask()
        });
        check!(ck, shape, "mask_summary", case, exact, (x, y) => summary(x.cmp_le(y)));

        check!(ck, shape, "select", case, exact, (x, y) => {
            Vector128::select(x.cmp_lt(y), x, y).to_generic()
        });
        check!(ck, shape, "select_or_zero", case, exact, (x, y) => {
            Vector128::select_or_zero(x.cmp_gt(y), x).to_generic()
        });
        for bits in 0..(1u8 << N::LANES) {
            check!(ck, shape, "select_bitmask", case, exact, (x, y) => {
                mask_of(x, bits).select(x, y).to_generic()
            });
        }

        check!(ck, shape, "get_with", case, exact, (x, y) => x.with::<0>(y.get::<1>()).to_generic());
    }
}

fn check_int<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: IntVector128,
    G: IntVector128<Generic = N::Generic>,
    N::Generic: Observe,
    <N::Float as Vector128>::Generic: Observe,
    <G::Float as Vector128>::Generic: Observe,
{
    for (case, &(a, b)) in pairs.iter().enumerate() {
        let x = (N::from_generic(a), G::from_generic(a));
        let y = (N::from_generic(b), G::from_generic(b));

        check!(ck, shape, "div", case, exact, (x, y) => (x / y).to_generic());
        check!(ck, shape, "to_float", case, canonical, (x) => x.to_float().to_generic());
        check!(ck, shape, "shl_imm", case, exact, (x) => x.shl_imm::<5>().to_generic());
        check!(ck, shape, "shr_imm", case, exact, (x) => x.shr_imm::<31>().to_generic());
        check!(ck, shape, "shr_imm_zero", case, exact, (x) => x.shr_imm::<0>().to_generic());
        check!(ck, shape, "shr_logical_imm", case, exact, (x) => {
            x.shr_logical_imm::<13>().to_generic()
        });

        for (k, &count) in SHIFT_COUNTS.iter().enumerate() {
            let sub = case * SHIFT_COUNTS.len() + k;
            check!(ck, shape, "shl", sub, exact, (x) => x.shl(count).to_generic());
            check!(ck, shape, "shr", sub, exact, (x) => x.shr(count).to_generic());
            check!(ck, shape, "shr_logical", sub, exact, (x) => x.shr_logical(count).to_generic());
        }
    }
}

fn check_float<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: FloatVector128,
    G: FloatVector128<Generic = N::Generic>,
    N::Generic: Observe,
    <N::Int as Vector128>::Generic: Observe,
    <G::Int as Vector128>::Generic: Observe,
{
    for (case, &(a, b)) in pairs.iter().enumerate() {
        let x = (N::from_generic(a), G::from_generic(a));
        let y = (N::from_generic(b), G::from_generic(b));

        check!(ck, shape, "div", case, canonical, (x, y) => (x / y).to_generic());
        check!(ck, shape, "sqrt", case, canonical, (x) => x.sqrt().to_generic());
        check!(ck, shape, "floor", case, canonical, (x) => x.floor().to_generic());
        check!(ck, shape, "ceil", case, canonical, (x) => x.ceil().to_generic());
        check!(ck, shape, "trunc", case, canonical, (x) => x.trunc().to_generic());
        check!(ck, shape, "round_even", case, canonical, (x) => x.round_even().to_generic());
        check!(ck, shape, "remove_signed_zero", case, canonical, (x) => {
            x.remove_signed_zero().to_generic()
        });
        check!(ck, shape, "is_nan", case, exact, (x) => x.is_nan().bitmask());
        check!(ck, shape, "round_nearest_even", case, exact, (x) => {
            x.round_nearest_even().to_generic()
        });
        check!(ck, shape, "truncate_toward_zero", case, exact, (x) => {
            x.truncate_toward_zero().to_generic()
        });
        check!(ck, shape, "floor_toward_negative_infinity", case, exact, (x) => {
            x.floor_toward_negative_infinity().to_generic()
        });
    }
}

fn check_widen<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: Vector128 + Widen,
    G: Vector128<Generic = N::Generic> + Widen,
    N::Wide: Vector128,
    G::Wide: Vector128,
    <N::Wide as Vector128>::Generic: Observe,
    <G::Wide as Vector128>::Generic: Observe,
{
    for (case, &(a, _)) in pairs.iter().enumerate() {
        let x = (N::from_generic(a), G::from_generic(a));
        check!(ck, shape, "widen", case, canonical, (x) => x.widen().to_generic());
    }
}

fn check_narrow<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: Vector128 + Narrow,
    G: Vector128<Generic = N::Generic> + Narrow,
    N::Narrowed: Vector128,
    G::Narrowed: Vector128,
    <N::Narrowed as Vector128>::Generic: Observe,
    <G::Narrowed as Vector128>::Generic: Observe,
{
    for (case, &(a, _)) in pairs.iter().enumerate() {
        let x = (N::from_generic(a), G::from_generic(a));
        check!(ck, shape, "narrow", case, canonical, (x) => x.narrow().to_generic());
    }
}

fn check_shuffle4<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: Shuffle4,
    G: Shuffle4<Generic = N::Generic>,
    N::Generic: Observe,
{
    for (case, &(a, _)) in pairs.iter().take(SHUFFLE_CASES).enumerate() {
        let src = a.exact();
        let native = all_shuffles4(N::from_generic(a));
        let reference = all_shuffles4(G::from_generic(a));
        for (imm, (n, g)) in native.iter().zip(reference.iter()).enumerate() {
            let sub = case * 256 + imm;
            let lanes = decode4(imm as i32);
            let defined = Lanes::from_slice(&lanes.map(|l| src.bits[l]));
            ck.compare(shape, "shuffle_definition", sub, defined, g.to_generic().exact());
            ck.compare(shape, "shuffle", sub, g.to_generic().exact(), n.to_generic().exact());
        }
    }
}

fn check_shuffle2<N, G>(ck: &mut Checker, shape: &str, pairs: &[(N::Generic, N::Generic)])
where
    N: Shuffle2,
    G: Shuffle2<Generic = N::Generic>,
    N::Generic: Observe,
{
    for (case, &(a, _)) in pairs.iter().take(SHUFFLE_CASES).enumerate() {
        let src = a.exact();
        let native = all_shuffles2(N::from_generic(a));
        let reference = all_shuffles2(G::from_generic(a));
        for (imm, (n, g)) in native.iter().zip(reference.iter()).enumerate() {
            let sub = case * 4 + imm;
            let lanes = decode2(imm as i32);
            let defined = Lanes::from_slice(&lanes.map(|l| src.bits[l]));
            ck.compare(shape, "shuffle_definition", sub, defined, g.to_generic().exact());
            ck.compare(shape, "shuffle", sub, g.to_generic().exact(), n.to_generic().exact());
        }
    }
}

fn check_casts<B: Backend>(ck: &mut Checker, corpus: &Corpus) {
    for (case, &(a, _)) in corpus.i32x4.iter().enumerate() {
        let x = (B::I32x4::from_generic(a), generic::I32x4::from_generic(a));
        check_cast!(ck, "i32x4", "cast_i64x2", case, x, B::I64x2, generic::I64x2);
        check_cast!(ck, "i32x4", "cast_f32x4", case, x, B::F32x4, generic::F32x4);
        check_cast!(ck, "i32x4", "cast_f64x2", case, x, B::F64x2, generic::F64x2);
    }
    for (case, &(a, _)) in corpus.i64x2.iter().enumerate() {
        let x = (B::I64x2::from_generic(a), generic::I64x2::from_generic(a));
        check_cast!(ck, "i64x2", "cast_i32x4", case, x, B::I32x4, generic::I32x4);
        check_cast!(ck, "i64x2", "cast_f32x4", case, x, B::F32x4, generic::F32x4);
        check_cast!(ck, "i64x2", "cast_f64x2", case, x, B::F64x2, generic::F64x2);
    }
    for (case, &(a, _)) in corpus.f32x4.iter().enumerate() {
        let x = (B::F32x4::from_generic(a), generic::F32x4::from_generic(a));
        check_cast!(ck, "f32x4", "cast_i32x4", case, x, B::I32x4, generic::I32x4);
        check_cast!(ck, "f32x4", "cast_i64x2", case, x, B::I64x2, generic::I64x2);
        check_cast!(ck, "f32x4", "cast_f64x2", case, x, B::F64x2, generic::F64x2);
    }
    for (case, &(a, _)) in corpus.f64x2.iter().enumerate() {
        let x = (B::F64x2::from_generic(a), generic::F64x2::from_generic(a));
        check_cast!(ck, "f64x2", "cast_i32x4", case, x, B::I32x4, generic::I32x4);
        check_cast!(ck, "f64x2", "cast_i64x2", case, x, B::I64x2, generic::I64x2);
        check_cast!(ck, "f64x2", "cast_f32x4", case, x, B::F32x4, generic::F32x4);
    }
}

// ============================================================================
// Exhaustive shuffles
// ============================================================================

macro_rules! for_each_imm4 {
    ($m:ident) => { for_each_imm4!(@a $m [0 1 2 3]); };
    (@a $m:ident [$($a:literal)+]) => { $(for_each_imm4!(@b $m $a [0 1 2 3]);)+ };
    (@b $m:ident $a:literal [$($b:literal)+]) => { $(for_each_imm4!(@c $m $a $b [0 1 2 3]);)+ };
    (@c $m:ident $a:literal $b:literal [$($c:literal)+]) => {
        $(for_each_imm4!(@d $m $a $b $c [0 1 2 3]);)+
    };
    (@d $m:ident $a:literal $b:literal $c:literal [$($d:literal)+]) => {
        $($m!($a * 64 + $b * 16 + $c * 4 + $d);)+
    };
}

/// Every 4-lane shuffle of `v`; element `imm` is `v.shuffle::<imm>()`.
pub fn all_shuffles4<V: Shuffle4>(v: V) -> [V; 256] {
    let mut out = [v; 256];
    macro_rules! one {
        ($imm:expr) => {
            out[$imm] = v.shuffle::<{ $imm }>();
        };
    }
    for_each_imm4!(one);
    out
}

/// Every 2-lane shuffle of `v`; element `imm` is `v.shuffle::<imm>()`.
pub fn all_shuffles2<V: Shuffle2>(v: V) -> [V; 4] {
    [
        v.shuffle::<0>(),
        v.shuffle::<1>(),
        v.shuffle::<2>(),
        v.shuffle::<3>(),
    ]
}

// ============================================================================
// Inputs
// ============================================================================

struct Corpus {
    i32x4: Vec<(GenericI32x4, GenericI32x4)>,
    i64x2: Vec<(GenericI64x2, GenericI64x2)>,
    f32x4: Vec<(GenericF32x4, GenericF32x4)>,
    f64x2: Vec<(GenericF64x2, GenericF64x2)>,
}

const I32_EDGES: [i32; 14] = [
    0,
    1,
    -1,
    2,
    -7,
    31,
    i32::MIN,
    i32::MAX,
    i32::MIN + 1,
    0x5555_5555,
    -0x5555_5556,
    0x0100_0001,
    1 << 24,
    65536,
];

const I64_EDGES: [i64; 12] = [
    0,
    1,
    -1,
    -7,
    63,
    i64::MIN,
    i64::MAX,
    i64::MIN + 1,
    1 << 53,
    (1 << 53) + 1,
    i32::MIN as i64,
    0x5555_5555_5555_5555,
];

const F32_EDGES: [f32; 24] = [
    0.0,
    -0.0,
    1.0,
    -1.0,
    0.5,
    -0.5,
    1.5,
    2.5,
    -2.5,
    3.5,
    -2.7,
    -2.3,
    f32::MIN_POSITIVE,
    1.0e-40,
    -1.0e-40,
    f32::MAX,
    f32::MIN,
    f32::INFINITY,
    f32::NEG_INFINITY,
    2147483648.0,
    -2147483904.0,
    8388607.5,
    -8388607.5,
    0.49999997,
];

const F64_EDGES: [f64; 22] = [
    0.0,
    -0.0,
    1.0,
    -1.0,
    0.5,
    -0.5,
    2.5,
    -2.5,
    3.5,
    -2.7,
    f64::MIN_POSITIVE,
    5.0e-324,
    -5.0e-324,
    f64::MAX,
    f64::MIN,
    f64::INFINITY,
    f64::NEG_INFINITY,
    i64::MAX as f64,
    -9.3e18,
    4503599627370495.5,
    -4503599627370495.5,
    0.49999999999999994,
];

/// One vector per edge value, each holding `N` consecutive edges.
fn windows<T: Copy, V, const N: usize>(edges: &[T], make: fn([T; N]) -> V) -> Vec<V> {
    (0..edges.len())
        .map(|i| make(core::array::from_fn(|k| edges[(i + k) % edges.len()])))
        .collect()
}

fn edge_pairs<T: Copy>(vectors: &[T]) -> Vec<(T, T)> {
    vectors
        .iter()
        .flat_map(|&a| vectors.iter().map(move |&b| (a, b)))
        .collect()
}

impl Corpus {
    fn build(config: &SelfTestConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut f32_edges = F32_EDGES.to_vec();
        let mut f64_edges = F64_EDGES.to_vec();
        if config.include_nan {
            f32_edges.extend([f32::NAN, -f32::NAN]);
            f64_edges.extend([f64::NAN, -f64::NAN]);
        }

        let mut i32x4 = edge_pairs(&windows(&I32_EDGES, GenericI32x4::from_array));
        let mut i64x2 = edge_pairs(&windows(&I64_EDGES, GenericI64x2::from_array));
        let mut f32x4 = edge_pairs(&windows(&f32_edges, GenericF32x4::from_array));
        let mut f64x2 = edge_pairs(&windows(&f64_edges, GenericF64x2::from_array));

        let include_nan = config.include_nan;
        let f32_lane = |rng: &mut StdRng| -> f32 {
            match rng.gen_range(0..3) {
                0 => {
                    let v = f32::from_bits(rng.gen());
                    if v.is_nan() && !include_nan { 0.0 } else { v }
                }
                1 => rng.gen_range(-1.0e4f32..1.0e4),
                _ => rng.gen_range(-100i32..100) as f32 + 0.5,
            }
        };
        let f64_lane = |rng: &mut StdRng| -> f64 {
            match rng.gen_range(0..3) {
                0 => {
                    let v = f64::from_bits(rng.gen());
                    if v.is_nan() && !include_nan { 0.0 } else { v }
                }
                1 => rng.gen_range(-1.0e12f64..1.0e12),
                _ => rng.gen_range(-100i64..100) as f64 + 0.5,
            }
        };

        for _ in 0..config.samples {
            let a: [i32; 4] = rng.gen();
            let b: [i32; 4] = rng.gen();
            i32x4.push((a.into(), b.into()));

            let a: [i64; 2] = rng.gen();
            let b: [i64; 2] = rng.gen();
            i64x2.push((a.into(), b.into()));

            let a: [f32; 4] = core::array::from_fn(|_| f32_lane(&mut rng));
            let b: [f32; 4] = core::array::from_fn(|_| f32_lane(&mut rng));
            f32x4.push((a.into(), b.into()));

            let a: [f64; 2] = core::array::from_fn(|_| f64_lane(&mut rng));
            let b: [f64; 2] = core::array::from_fn(|_| f64_lane(&mut rng));
            f64x2.push((a.into(), b.into()));
        }

        Corpus {
            i32x4,
            i64x2,
            f32x4,
            f64x2,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Checks backend `B` against the generic backend.
pub fn run_backend<B: Backend>(config: &SelfTestConfig) -> SelfTestReport {
    if B::KIND == BackendKind::Generic {
        info!("Generic backend selected; checking it against itself");
    }
    let corpus = Corpus::build(config);
    debug!(
        "Self-test corpus: {} i32x4, {} i64x2, {} f32x4, {} f64x2 pairs (seed {:#x})",
        corpus.i32x4.len(),
        corpus.i64x2.len(),
        corpus.f32x4.len(),
        corpus.f64x2.len(),
        config.seed
    );

    let mut ck = Checker::default();

    check_common::<B::I32x4, generic::I32x4>(&mut ck, "i32x4", &corpus.i32x4);
    check_common::<B::I64x2, generic::I64x2>(&mut ck, "i64x2", &corpus.i64x2);
    check_common::<B::F32x4, generic::F32x4>(&mut ck, "f32x4", &corpus.f32x4);
    check_common::<B::F64x2, generic::F64x2>(&mut ck, "f64x2", &corpus.f64x2);

    check_int::<B::I32x4, generic::I32x4>(&mut ck, "i32x4", &corpus.i32x4);
    check_int::<B::I64x2, generic::I64x2>(&mut ck, "i64x2", &corpus.i64x2);
    check_float::<B::F32x4, generic::F32x4>(&mut ck, "f32x4", &corpus.f32x4);
    check_float::<B::F64x2, generic::F64x2>(&mut ck, "f64x2", &corpus.f64x2);

    check_widen::<B::I32x4, generic::I32x4>(&mut ck, "i32x4", &corpus.i32x4);
    check_widen::<B::F32x4, generic::F32x4>(&mut ck, "f32x4", &corpus.f32x4);
    check_narrow::<B::I64x2, generic::I64x2>(&mut ck, "i64x2", &corpus.i64x2);
    check_narrow::<B::F64x2, generic::F64x2>(&mut ck, "f64x2", &corpus.f64x2);

    check_shuffle4::<B::I32x4, generic::I32x4>(&mut ck, "i32x4", &corpus.i32x4);
    check_shuffle4::<B::F32x4, generic::F32x4>(&mut ck, "f32x4", &corpus.f32x4);
    check_shuffle2::<B::I64x2, generic::I64x2>(&mut ck, "i64x2", &corpus.i64x2);
    check_shuffle2::<B::F64x2, generic::F64x2>(&mut ck, "f64x2", &corpus.f64x2);

    check_casts::<B>(&mut ck, &corpus);

    info!(
        "Self-test of {} backend: {} checks, {} mismatches",
        B::KIND,
        ck.checks,
        ck.mismatches
    );

    SelfTestReport {
        backend: B::KIND,
        reference: Generic::KIND,
        seed: config.seed,
        checks: ck.checks,
        mismatches: ck.mismatches,
        failures: ck.failures,
    }
}

/// Checks the compiled-in backend against the generic backend.
pub fn run(config: &SelfTestConfig) -> SelfTestReport {
    run_backend::<crate::Active>(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SelfTestConfig {
        SelfTestConfig {
            samples: 64,
            ..SelfTestConfig::default()
        }
    }

    #[test]
    fn generic_agrees_with_itself() {
        let report = run_backend::<Generic>(&small());
        assert!(report.passed(), "{:?}", report.failures);
        assert!(report.checks > 10_000);
    }

    #[test]
    fn active_backend_matches_reference() {
        let report = run(&small());
        assert!(report.passed(), "{}", report.to_json().unwrap());
    }

    #[test]
    fn same_seed_same_checks() {
        let a = run_backend::<Generic>(&small());
        let b = run_backend::<Generic>(&small());
        assert_eq!(a, b);
    }

    #[test]
    fn checker_caps_recorded_failures() {
        let mut ck = Checker::default();
        let one = Lanes::from_slice(&[1]);
        let two = Lanes::from_slice(&[2]);
        for case in 0..MAX_REPORTED + 5 {
            ck.compare("i32x4", "add", case, one, two);
        }
        assert_eq!(ck.mismatches, MAX_REPORTED + 5);
        assert_eq!(ck.failures.len(), MAX_REPORTED);
        assert_eq!(ck.failures[0].expected, vec!["0x1".to_string()]);
    }

    #[test]
    fn shuffle_sweep_is_indexed_by_immediate() {
        let v = generic::I32x4::from_array([10, 11, 12, 13]);
        let all = all_shuffles4(v);
        assert_eq!(all[0].to_array(), [10, 10, 10, 10]);
        assert_eq!(all[0b00_01_10_11].to_array(), [13, 12, 11, 10]);
        assert_eq!(all[255].to_array(), [13, 13, 13, 13]);
    }
}
