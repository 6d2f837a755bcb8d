//! Permutation engine.
//!
//! A shuffle is described by a list of source-lane indices, one per
//! destination lane, packed into a single integer:
//!
//! - 4-lane shapes: [`perm4`]`(l0, l1, l2, l3) = l0 | l1 << 2 | l2 << 4 | l3 << 6`
//! - 2-lane shapes: [`perm2`]`(l0, l1) = l0 | l1 << 1`
//!
//! The packed value is the immediate the x86 shuffle instructions take
//! (`pshufd`, `shufps`, `shufpd`), so the SSE backend hands it straight to one
//! instruction. NEON has no immediate-driven permute; instead the same packed
//! value indexes [`NEON_RECIPES`], a table of minimal instruction sequences
//! built at compile time by a breadth-first search over NEON's fixed lane-move
//! instructions. Because the index is a `const` generic, the table lookup is
//! an associated const and the whole dispatch folds to straight-line code.
//!
//! The recipes carry a scalar interpreter ([`Recipe::apply`]) so the table can
//! be checked on any host, not only on AArch64.

/// Packs four source-lane indices into a shuffle immediate.
///
/// Panics (a compile error when evaluated in a const context) if any index is
/// not below 4.
pub const fn perm4(l0: usize, l1: usize, l2: usize, l3: usize) -> i32 {
    assert!(
        l0 < 4 && l1 < 4 && l2 < 4 && l3 < 4,
        "shuffle lane index out of range for a 4-lane shape"
    );
    (l0 | l1 << 2 | l2 << 4 | l3 << 6) as i32
}

/// Packs two source-lane indices into a shuffle immediate.
///
/// Panics (a compile error when evaluated in a const context) if any index is
/// not below 2.
pub const fn perm2(l0: usize, l1: usize) -> i32 {
    assert!(l0 < 2 && l1 < 2, "shuffle lane index out of range for a 2-lane shape");
    (l0 | l1 << 1) as i32
}

/// Unpacks a 4-lane shuffle immediate into source-lane indices.
pub const fn decode4(imm: i32) -> [usize; 4] {
    assert!(imm >= 0 && imm <= 0xFF, "4-lane shuffle immediate out of range");
    let i = imm as usize;
    [i & 3, (i >> 2) & 3, (i >> 4) & 3, (i >> 6) & 3]
}

/// Unpacks a 2-lane shuffle immediate into source-lane indices.
pub const fn decode2(imm: i32) -> [usize; 2] {
    assert!(imm >= 0 && imm <= 0b11, "2-lane shuffle immediate out of range");
    let i = imm as usize;
    [i & 1, (i >> 1) & 1]
}

/// `perm4(0, 1, 2, 3)`.
pub const IDENTITY4: i32 = perm4(0, 1, 2, 3);
/// `perm2(0, 1)`.
pub const IDENTITY2: i32 = perm2(0, 1);

// ============================================================================
// NEON lane-move primitives
// ============================================================================

/// One NEON lane-move instruction on 32-bit lanes.
///
/// `a` and `b` are the instruction's two register operands; unary ops read
/// only `a`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PermOp {
    /// `rev64`: swap lanes within each 64-bit half.
    Rev64,
    /// `ext #n`: lanes `n..n+4` of the concatenation `a:b`.
    Ext(u8),
    /// `zip1`: `[a0, b0, a1, b1]`.
    Zip1,
    /// `zip2`: `[a2, b2, a3, b3]`.
    Zip2,
    /// `uzp1`: `[a0, a2, b0, b2]`.
    Uzp1,
    /// `uzp2`: `[a1, a3, b1, b3]`.
    Uzp2,
    /// `trn1`: `[a0, b0, a2, b2]`.
    Trn1,
    /// `trn2`: `[a1, b1, a3, b3]`.
    Trn2,
    /// `dup`: broadcast lane `l` of `a`.
    Dup(u8),
    /// `ins`: `a` with lane `dst` replaced by lane `src` of `b`.
    Ins {
        /// Destination lane in `a`.
        dst: u8,
        /// Source lane in `b`.
        src: u8,
    },
}

impl PermOp {
    /// Applies the instruction to lane arrays.
    pub const fn apply<T: Copy>(self, a: [T; 4], b: [T; 4]) -> [T; 4] {
        match self {
            PermOp::Rev64 => [a[1], a[0], a[3], a[2]],
            PermOp::Ext(n) => {
                let cat = [a[0], a[1], a[2], a[3], b[0], b[1], b[2], b[3]];
                let n = n as usize;
                [cat[n], cat[n + 1], cat[n + 2], cat[n + 3]]
            }
            PermOp::Zip1 => [a[0], b[0], a[1], b[1]],
            PermOp::Zip2 => [a[2], b[2], a[3], b[3]],
            PermOp::Uzp1 => [a[0], a[2], b[0], b[2]],
            PermOp::Uzp2 => [a[1], a[3], b[1], b[3]],
            PermOp::Trn1 => [a[0], b[0], a[2], b[2]],
            PermOp::Trn2 => [a[1], b[1], a[3], b[3]],
            PermOp::Dup(l) => {
                let v = a[l as usize];
                [v, v, v, v]
            }
            PermOp::Ins { dst, src } => {
                let v = b[src as usize];
                [
                    if dst == 0 { v } else { a[0] },
                    if dst == 1 { v } else { a[1] },
                    if dst == 2 { v } else { a[2] },
                    if dst == 3 { v } else { a[3] },
                ]
            }
        }
    }
}

/// Which values feed a step's two operands.
///
/// `Cur` is the result of the previous step (the input vector for the first
/// step); `Src` is always the original input vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operands {
    /// `op(cur, cur)`.
    CurCur,
    /// `op(cur, src)`.
    CurSrc,
    /// `op(src, cur)`.
    SrcCur,
}

/// One instruction of a recipe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// The instruction.
    pub op: PermOp,
    /// Its operands.
    pub operands: Operands,
}

impl Step {
    const fn new(op: PermOp, operands: Operands) -> Self {
        Self { op, operands }
    }

    /// Applies the step to the running value `cur` and the original `src`.
    pub const fn apply<T: Copy>(self, cur: [T; 4], src: [T; 4]) -> [T; 4] {
        match self.operands {
            Operands::CurCur => self.op.apply(cur, cur),
            Operands::CurSrc => self.op.apply(cur, src),
            Operands::SrcCur => self.op.apply(src, cur),
        }
    }
}

/// Longest sequence any 4-lane permutation needs.
///
/// Four `ins` steps starting from the input reach every permutation, so the
/// search never has to go deeper.
pub const MAX_STEPS: usize = 4;

const UNREACHED: u8 = u8::MAX;

/// A fixed sequence of NEON lane moves realising one 4-lane permutation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Recipe {
    steps: [Step; MAX_STEPS],
    len: u8,
}

impl Recipe {
    const PLACEHOLDER: Step = Step::new(PermOp::Rev64, Operands::CurCur);

    const EMPTY: Recipe = Recipe {
        steps: [Self::PLACEHOLDER; MAX_STEPS],
        len: 0,
    };

    const UNSET: Recipe = Recipe {
        steps: [Self::PLACEHOLDER; MAX_STEPS],
        len: UNREACHED,
    };

    /// Number of instructions.
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the recipe is the identity (no instructions).
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The instructions, in execution order.
    pub const fn steps(&self) -> &[Step] {
        self.steps.split_at(self.len as usize).0
    }

    /// Runs the recipe on a lane array.
    pub const fn apply<T: Copy>(&self, src: [T; 4]) -> [T; 4] {
        let mut cur = src;
        let mut i = 0;
        while i < self.len as usize {
            cur = self.steps[i].apply(cur, src);
            i += 1;
        }
        cur
    }

    const fn push(self, step: Step) -> Recipe {
        let mut steps = self.steps;
        steps[self.len as usize] = step;
        Recipe {
            steps,
            len: self.len + 1,
        }
    }
}

const BINARY_OPS: [PermOp; 9] = [
    PermOp::Ext(1),
    PermOp::Ext(2),
    PermOp::Ext(3),
    PermOp::Zip1,
    PermOp::Zip2,
    PermOp::Uzp1,
    PermOp::Uzp2,
    PermOp::Trn1,
    PermOp::Trn2,
];

const OPERAND_ORDERS: [Operands; 3] = [Operands::CurCur, Operands::CurSrc, Operands::SrcCur];

// rev64 and four dups read one operand; the binary ops and the 16 inserts
// come in each operand order.
const CANDIDATE_COUNT: usize = 5 + (BINARY_OPS.len() + 16) * OPERAND_ORDERS.len();

const fn candidates() -> [Step; CANDIDATE_COUNT] {
    let mut out = [Recipe::PLACEHOLDER; CANDIDATE_COUNT];
    let mut n = 0;

    out[n] = Step::new(PermOp::Rev64, Operands::CurCur);
    n += 1;

    let mut o = 0;
    while o < OPERAND_ORDERS.len() {
        let mut b = 0;
        while b < BINARY_OPS.len() {
            out[n] = Step::new(BINARY_OPS[b], OPERAND_ORDERS[o]);
            n += 1;
            b += 1;
        }
        o += 1;
    }

    let mut l: u8 = 0;
    while l < 4 {
        out[n] = Step::new(PermOp::Dup(l), Operands::CurCur);
        n += 1;
        l += 1;
    }

    let mut o = 0;
    while o < OPERAND_ORDERS.len() {
        let mut dst: u8 = 0;
        while dst < 4 {
            let mut src: u8 = 0;
            while src < 4 {
                out[n] = Step::new(PermOp::Ins { dst, src }, OPERAND_ORDERS[o]);
                n += 1;
                src += 1;
            }
            dst += 1;
        }
        o += 1;
    }

    assert!(n == CANDIDATE_COUNT);
    out
}

const fn build_recipes() -> [Recipe; 256] {
    const IDENTITY_LANES: [usize; 4] = [0, 1, 2, 3];

    let steps = candidates();
    let mut table = [Recipe::UNSET; 256];
    let mut queue = [0usize; 256];
    let mut head = 0;
    let mut tail = 0;

    table[IDENTITY4 as usize] = Recipe::EMPTY;
    queue[tail] = IDENTITY4 as usize;
    tail += 1;

    // Breadth-first: the first time a permutation is reached it is reached
    // with the fewest instructions.
    while head < tail {
        let state = queue[head];
        head += 1;

        let recipe = table[state];
        if recipe.len() == MAX_STEPS {
            continue;
        }
        let lanes = decode4(state as i32);

        let mut c = 0;
        while c < steps.len() {
            let next = steps[c].apply(lanes, IDENTITY_LANES);
            let idx = perm4(next[0], next[1], next[2], next[3]) as usize;
            if table[idx].len == UNREACHED {
                table[idx] = recipe.push(steps[c]);
                queue[tail] = idx;
                tail += 1;
            }
            c += 1;
        }
    }

    assert!(tail == 256, "NEON recipe search left a permutation unreachable");
    table
}

/// Minimal NEON instruction sequence for every 4-lane shuffle immediate.
pub const NEON_RECIPES: [Recipe; 256] = build_recipes();

/// NEON realisation of a 2-lane permutation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Recipe2 {
    /// No instruction.
    Identity,
    /// `ext #1` of the input with itself.
    Swap,
    /// `dup` of one lane.
    Dup(u8),
}

impl Recipe2 {
    /// Runs the recipe on a lane array.
    pub const fn apply<T: Copy>(self, src: [T; 2]) -> [T; 2] {
        match self {
            Recipe2::Identity => src,
            Recipe2::Swap => [src[1], src[0]],
            Recipe2::Dup(l) => [src[l as usize], src[l as usize]],
        }
    }

    const fn for_imm(imm: i32) -> Recipe2 {
        match decode2(imm) {
            [0, 1] => Recipe2::Identity,
            [1, 0] => Recipe2::Swap,
            [l, _] => Recipe2::Dup(l as u8),
        }
    }
}

/// NEON realisation of every 2-lane shuffle immediate.
pub const NEON_RECIPES2: [Recipe2; 4] = [
    Recipe2::for_imm(0),
    Recipe2::for_imm(1),
    Recipe2::for_imm(2),
    Recipe2::for_imm(3),
];

// ============================================================================
// Per-immediate constants
// ============================================================================

/// Compile-time facts about a 4-lane shuffle immediate.
///
/// Referencing any of these constants rejects an out-of-range immediate at
/// compile time.
pub struct Imm4<const IMM: i32>;

impl<const IMM: i32> Imm4<IMM> {
    /// Source lane for each destination lane.
    pub const LANES: [usize; 4] = decode4(IMM);
    /// Whether the shuffle leaves every lane in place.
    pub const IS_IDENTITY: bool = {
        let _ = Self::LANES;
        IMM == IDENTITY4
    };
    /// NEON instruction sequence for this shuffle.
    pub const RECIPE: Recipe = NEON_RECIPES[Self::LANES[0] | Self::LANES[1] << 2 | Self::LANES[2] << 4 | Self::LANES[3] << 6];
}

/// Compile-time facts about a 2-lane shuffle immediate.
pub struct Imm2<const IMM: i32>;

impl<const IMM: i32> Imm2<IMM> {
    /// Source lane for each destination lane.
    pub const LANES: [usize; 2] = decode2(IMM);
    /// Whether the shuffle leaves every lane in place.
    pub const IS_IDENTITY: bool = {
        let _ = Self::LANES;
        IMM == IDENTITY2
    };
    /// NEON instruction sequence for this shuffle.
    pub const RECIPE: Recipe2 = NEON_RECIPES2[Self::LANES[0] | Self::LANES[1] << 1];
}

/// Shuffles a vector with literal lane indices.
///
/// `shuffle!(v, [3, 2, 1, 0])` reverses a 4-lane vector; `shuffle!(v, [1, 0])`
/// swaps a 2-lane one. The index count selects the shape, so four indices on
/// a 2-lane vector (or two on a 4-lane one) do not compile, and neither does
/// an out-of-range index.
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = shuffle!(I32x4::splat(1), [4, 0, 0, 0]);
/// ```
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = shuffle!(F64x2::splat(1.0), [0, 1, 0, 1]);
/// ```
///
/// Raw immediates are checked too:
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = F64x2::splat(1.0).shuffle::<4>();
/// ```
///
/// ```compile_fail
/// use laneflow::prelude::*;
///
/// let _ = F32x4::splat(1.0).shuffle::<256>();
/// ```
#[macro_export]
macro_rules! shuffle {
    ($v:expr, [$l0:expr, $l1:expr, $l2:expr, $l3:expr $(,)?]) => {
        $crate::backend::Shuffle4::shuffle::<{ $crate::shuffle::perm4($l0, $l1, $l2, $l3) }>($v)
    };
    ($v:expr, [$l0:expr, $l1:expr $(,)?]) => {
        $crate::backend::Shuffle2::shuffle::<{ $crate::shuffle::perm2($l0, $l1) }>($v)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_matches_x86_immediates() {
        // _MM_SHUFFLE(3, 2, 1, 0) is the identity for pshufd.
        assert_eq!(IDENTITY4, 0b11_10_01_00);
        assert_eq!(perm4(3, 2, 1, 0), 0b00_01_10_11);
        assert_eq!(perm2(1, 0), 0b01);
        assert_eq!(IDENTITY2, 0b10);
    }

    #[test]
    fn decode_inverts_encode() {
        for imm in 0..256 {
            let [a, b, c, d] = decode4(imm);
            assert_eq!(perm4(a, b, c, d), imm);
        }
        for imm in 0..4 {
            let [a, b] = decode2(imm);
            assert_eq!(perm2(a, b), imm);
        }
    }

    #[test]
    fn every_recipe_realises_its_permutation() {
        let src = [10u32, 11, 12, 13];
        for imm in 0..256 {
            let lanes = decode4(imm);
            let expected = lanes.map(|l| src[l]);
            let recipe = NEON_RECIPES[imm as usize];
            assert_eq!(recipe.apply(src), expected, "imm {imm:#04x}: {:?}", recipe.steps());
            assert!(recipe.len() <= MAX_STEPS);
        }
    }

    #[test]
    fn identity_recipe_is_empty() {
        assert!(NEON_RECIPES[IDENTITY4 as usize].is_empty());
        assert_eq!(NEON_RECIPES2[IDENTITY2 as usize], Recipe2::Identity);
    }

    #[test]
    fn single_instruction_permutations_take_one_step() {
        let reverse_pairs = NEON_RECIPES[perm4(1, 0, 3, 2) as usize];
        assert_eq!(reverse_pairs.steps(), &[Step::new(PermOp::Rev64, Operands::CurCur)]);

        let rotate = NEON_RECIPES[perm4(2, 3, 0, 1) as usize];
        assert_eq!(rotate.len(), 1);

        let broadcast = NEON_RECIPES[perm4(3, 3, 3, 3) as usize];
        assert_eq!(broadcast.steps(), &[Step::new(PermOp::Dup(3), Operands::CurCur)]);
    }

    #[test]
    fn reversal_needs_two_steps() {
        // No single NEON lane move reverses four lanes.
        let reverse = NEON_RECIPES[perm4(3, 2, 1, 0) as usize];
        assert_eq!(reverse.len(), 2);
        assert_eq!(reverse.apply([0, 1, 2, 3]), [3, 2, 1, 0]);
    }

    #[test]
    fn two_lane_recipes() {
        for imm in 0..4 {
            let lanes = decode2(imm);
            let src = [7i64, 9];
            assert_eq!(NEON_RECIPES2[imm as usize].apply(src), lanes.map(|l| src[l]));
        }
    }

    #[test]
    fn imm_constants_decode() {
        assert_eq!(Imm4::<{ perm4(3, 0, 0, 1) }>::LANES, [3, 0, 0, 1]);
        assert!(Imm4::<IDENTITY4>::IS_IDENTITY);
        assert!(!Imm2::<{ perm2(1, 1) }>::IS_IDENTITY);
        assert_eq!(Imm2::<{ perm2(1, 1) }>::RECIPE, Recipe2::Dup(1));
    }
}
