//! Lane-type model.
//!
//! Defines the backend selector and the plain per-lane structs that serve as
//! the exchange format between backends. Every vector shape has a matching
//! `Generic*` struct whose fields name each lane individually, so a lane that
//! lands in the wrong slot shows up as a wrong *field* in test output rather
//! than a wrong array index.
//!
//! Equality on the generic structs is bit-exact: `-0.0` and `+0.0` differ, and
//! a NaN lane equals a NaN lane with the same bit pattern.

use core::fmt;
use core::mem::size_of;
use core::ops::{BitAnd, BitOr, BitXor, Not};
use serde::{Deserialize, Serialize};

/// The execution backend compiled into the crate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Portable scalar emulation, available on every target.
    Generic,
    /// x86_64 SSE family (SSE2 baseline).
    Sse,
    /// AArch64 Advanced SIMD (NEON).
    Neon,
}

impl BackendKind {
    /// Short lowercase name, used in logs and reports.
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::Generic => "generic",
            BackendKind::Sse => "sse",
            BackendKind::Neon => "neon",
        }
    }

    /// Whether this backend uses vector hardware.
    pub const fn is_native(self) -> bool {
        !matches!(self, BackendKind::Generic)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar type that can occupy a lane.
///
/// Gives the generic backend uniform access to a lane's bit pattern.
pub trait Lane: Copy + Default + fmt::Debug + PartialOrd + Send + Sync + 'static {
    /// Unsigned integer with the same width as the lane.
    type Bits: Copy
        + Eq
        + fmt::Debug
        + BitAnd<Output = Self::Bits>
        + BitOr<Output = Self::Bits>
        + BitXor<Output = Self::Bits>
        + Not<Output = Self::Bits>;

    /// The lane value `0`.
    const ZERO: Self;
    /// The lane value `1`.
    const ONE: Self;

    /// Reinterprets the lane as raw bits.
    fn to_lane_bits(self) -> Self::Bits;

    /// Reinterprets raw bits as a lane.
    fn from_lane_bits(bits: Self::Bits) -> Self;
}

macro_rules! impl_lane {
    ($t:ty, $bits:ty, $zero:expr, $one:expr, |$v:ident| $to:expr, |$b:ident| $from:expr) => {
        impl Lane for $t {
            type Bits = $bits;
            const ZERO: Self = $zero;
            const ONE: Self = $one;

            #[inline(always)]
            fn to_lane_bits(self) -> $bits {
                let $v = self;
                $to
            }

            #[inline(always)]
            fn from_lane_bits(bits: $bits) -> Self {
                let $b = bits;
                $from
            }
        }
    };
}

impl_lane!(i32, u32, 0, 1, |v| v as u32, |b| b as i32);
impl_lane!(i64, u64, 0, 1, |v| v as u64, |b| b as i64);
impl_lane!(f32, u32, 0.0, 1.0, |v| v.to_bits(), |b| f32::from_bits(b));
impl_lane!(f64, u64, 0.0, 1.0, |v| v.to_bits(), |b| f64::from_bits(b));

// ============================================================================
// Generic lane structs
// ============================================================================

macro_rules! define_generic {
    (
        $(#[$meta:meta])*
        $name:ident, $t:ty, $n:literal, [$($lane:ident),+], new($($arg:ident),+)
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[allow(missing_docs)]
                pub $lane: $t,
            )+
        }

        impl $name {
            /// Number of lanes.
            pub const LANES: usize = $n;

            /// Builds the struct from lanes given highest lane first.
            ///
            /// `new(a, b, ..)` puts `a` in the top lane and the last argument
            /// in lane 0, matching how literal vectors are written.
            #[inline(always)]
            pub const fn new($($arg: $t),+) -> Self {
                Self { $($arg),+ }
            }

            /// Builds the struct from an array in lane order (lane 0 first).
            #[inline(always)]
            pub const fn from_array(lanes: [$t; $n]) -> Self {
                let [$($lane),+] = lanes;
                Self { $($lane),+ }
            }

            /// Returns the lanes in lane order (lane 0 first).
            #[inline(always)]
            pub const fn to_array(self) -> [$t; $n] {
                [$(self.$lane),+]
            }

            /// Returns the lanes' raw bit patterns in lane order.
            #[inline]
            pub fn to_bits(self) -> [<$t as Lane>::Bits; $n] {
                self.to_array().map(Lane::to_lane_bits)
            }

            /// Builds the struct from raw bit patterns in lane order.
            #[inline]
            pub fn from_bits(bits: [<$t as Lane>::Bits; $n]) -> Self {
                Self::from_array(bits.map(<$t as Lane>::from_lane_bits))
            }

            /// Copies the 128 bits out as native-endian bytes, lane 0 first.
            ///
            /// This is the layout a 128-bit register has when stored to memory,
            /// so a byte copy through here is how the generic backend
            /// reinterprets one shape as another.
            #[inline]
            pub fn to_bytes(self) -> [u8; 16] {
                let mut out = [0u8; 16];
                for (chunk, lane) in out.chunks_exact_mut(size_of::<$t>()).zip(self.to_array()) {
                    chunk.copy_from_slice(&lane.to_ne_bytes());
                }
                out
            }

            /// Inverse of [`Self::to_bytes`].
            #[inline]
            pub fn from_bytes(bytes: [u8; 16]) -> Self {
                let mut lanes = [<$t as Lane>::ZERO; $n];
                for (lane, chunk) in lanes.iter_mut().zip(bytes.chunks_exact(size_of::<$t>())) {
                    let mut buf = [0u8; size_of::<$t>()];
                    buf.copy_from_slice(chunk);
                    *lane = <$t>::from_ne_bytes(buf);
                }
                Self::from_array(lanes)
            }
        }

        impl PartialEq for $name {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.to_bytes() == other.to_bytes()
            }
        }

        impl Eq for $name {}

        impl From<[$t; $n]> for $name {
            #[inline(always)]
            fn from(lanes: [$t; $n]) -> Self {
                Self::from_array(lanes)
            }
        }
    };
}

define_generic!(
    /// Four `i32` lanes.
    GenericI32x4, i32, 4, [lane0, lane1, lane2, lane3], new(lane3, lane2, lane1, lane0)
);
define_generic!(
    /// Two `i64` lanes.
    GenericI64x2, i64, 2, [lane0, lane1], new(lane1, lane0)
);
define_generic!(
    /// Four `f32` lanes.
    GenericF32x4, f32, 4, [lane0, lane1, lane2, lane3], new(lane3, lane2, lane1, lane0)
);
define_generic!(
    /// Two `f64` lanes.
    GenericF64x2, f64, 2, [lane0, lane1], new(lane1, lane0)
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_takes_highest_lane_first() {
        let v = GenericI32x4::new(3, 2, 1, 0);
        assert_eq!(v.lane3, 3);
        assert_eq!(v.lane0, 0);
        assert_eq!(v.to_array(), [0, 1, 2, 3]);
    }

    #[test]
    fn equality_is_bit_exact() {
        let pos = GenericF32x4::from_array([0.0; 4]);
        let neg = GenericF32x4::from_array([-0.0, 0.0, 0.0, 0.0]);
        assert_ne!(pos, neg);

        let nan = GenericF64x2::from_array([f64::NAN, 1.0]);
        assert_eq!(nan, nan);
    }

    #[test]
    fn byte_copy_reinterprets_lanes() {
        let ints = GenericI32x4::from_array([0x3F80_0000, 0, 0, 0x4000_0000]);
        let floats = GenericF32x4::from_bytes(ints.to_bytes());
        assert_eq!(floats.lane0, 1.0);
        assert_eq!(floats.lane3, 2.0);

        let wide = GenericI64x2::from_bytes(GenericI32x4::from_array([1, 0, -1, -1]).to_bytes());
        assert_eq!(wide.to_array(), [1, -1]);
    }

    #[test]
    fn serde_round_trip_keeps_field_names() {
        let v = GenericI64x2::new(7, -7);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"lane0":-7,"lane1":7}"#);
        let back: GenericI64x2 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn backend_kind_names() {
        assert_eq!(BackendKind::Sse.to_string(), "sse");
        assert!(BackendKind::Neon.is_native());
        assert!(!BackendKind::Generic.is_native());
    }
}
