//! Lane vectors for 16-pixel blocks
//!
//! A block is `BLOCK_WIDTH` x `BLOCK_HEIGHT` pixels processed together.
//! Lane `i` is the pixel at `(i % BLOCK_WIDTH, i / BLOCK_WIDTH)` within the
//! block, and bit `i` of a [`LaneMask`] says whether that pixel is live.
//!
//! Every operation here is lane-wise and branch-free. Comparisons produce a
//! mask instead of a bool, and "if" becomes [`F32x16::select`].

use core::fmt;
use core::ops::{Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, Div, Mul, Neg, Not, Shl, Shr, Sub};

/// Block width in pixels
pub const BLOCK_WIDTH: usize = 4;

/// Block height in pixels
pub const BLOCK_HEIGHT: usize = 4;

/// Number of lanes (pixels) per block
pub const LANES: usize = BLOCK_WIDTH * BLOCK_HEIGHT;

/// One bit per lane
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct LaneMask(u16);

impl LaneMask {
    pub const NONE: LaneMask = LaneMask(0);
    pub const ALL: LaneMask = LaneMask(u16::MAX);

    #[inline]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Mask with only `lane` set
    #[inline]
    pub const fn lane(lane: usize) -> Self {
        assert!(lane < LANES, "lane index out of range");
        Self(1 << lane)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_full(self) -> bool {
        self.0 == u16::MAX
    }

    #[inline]
    pub const fn contains(self, lane: usize) -> bool {
        lane < LANES && (self.0 >> lane) & 1 != 0
    }

    /// Number of live lanes
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_subset_of(self, other: LaneMask) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate over the indices of live lanes, lowest first
    pub fn iter(self) -> LaneIter {
        LaneIter(self.0)
    }
}

impl fmt::Debug for LaneMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LaneMask({:#018b})", self.0)
    }
}

impl BitAnd for LaneMask {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for LaneMask {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for LaneMask {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LaneMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl Not for LaneMask {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Iterator over live lane indices
pub struct LaneIter(u16);

impl Iterator for LaneIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let lane = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(lane)
    }
}

/// Sixteen f32 lanes
#[derive(Clone, Copy, PartialEq, Debug)]
#[repr(C, align(64))]
pub struct F32x16(pub [f32; LANES]);

/// Sixteen i32 lanes
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(C, align(64))]
pub struct I32x16(pub [i32; LANES]);

macro_rules! impl_binary_op {
    ($vec:ident, $trait:ident, $method:ident, |$a:ident, $b:ident| $body:expr) => {
        impl $trait for $vec {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                let (lhs, rhs) = (self.0, rhs.0);
                $vec(core::array::from_fn(|i| {
                    let ($a, $b) = (lhs[i], rhs[i]);
                    $body
                }))
            }
        }
    };
}

macro_rules! impl_compare {
    ($vec:ident, $($name:ident => $op:tt),* $(,)?) => {
        impl $vec {
            $(
                #[inline(always)]
                pub fn $name(self, rhs: Self) -> LaneMask {
                    let mut bits = 0u16;
                    for i in 0..LANES {
                        bits |= ((self.0[i] $op rhs.0[i]) as u16) << i;
                    }
                    LaneMask(bits)
                }
            )*
        }
    };
}

impl_binary_op!(F32x16, Add, add, |a, b| a + b);
impl_binary_op!(F32x16, Sub, sub, |a, b| a - b);
impl_binary_op!(F32x16, Mul, mul, |a, b| a * b);
impl_binary_op!(F32x16, Div, div, |a, b| a / b);
impl_compare!(F32x16, lt => <, le => <=, gt => >, ge => >=, eq => ==);

// Integer arithmetic wraps to match hardware vector units
impl_binary_op!(I32x16, Add, add, |a, b| a.wrapping_add(b));
impl_binary_op!(I32x16, Sub, sub, |a, b| a.wrapping_sub(b));
impl_binary_op!(I32x16, Mul, mul, |a, b| a.wrapping_mul(b));
impl_binary_op!(I32x16, BitAnd, bitand, |a, b| a & b);
impl_binary_op!(I32x16, BitOr, bitor, |a, b| a | b);
impl_compare!(I32x16, lt => <, gt => >, eq => ==);

impl Neg for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        self.map(|v| -v)
    }
}

impl F32x16 {
    pub const ZERO: F32x16 = F32x16([0.0; LANES]);
    pub const ONE: F32x16 = F32x16([1.0; LANES]);

    /// Broadcast `value` to every lane
    #[inline(always)]
    pub const fn splat(value: f32) -> Self {
        Self([value; LANES])
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Self(core::array::from_fn(f))
    }

    #[inline(always)]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }

    #[inline(always)]
    pub fn to_array(self) -> [f32; LANES] {
        self.0
    }

    #[inline(always)]
    pub fn lane(&self, index: usize) -> f32 {
        self.0[index]
    }

    /// Lane-wise `mask ? self : other`
    #[inline(always)]
    pub fn select(mask: LaneMask, if_set: Self, if_clear: Self) -> Self {
        Self::from_fn(|i| if mask.contains(i) { if_set.0[i] } else { if_clear.0[i] })
    }

    #[inline(always)]
    pub fn min(self, rhs: Self) -> Self {
        Self::from_fn(|i| self.0[i].min(rhs.0[i]))
    }

    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        Self::from_fn(|i| self.0[i].max(rhs.0[i]))
    }

    /// Clamp every lane to `[0, 1]`. NaN lanes become 0.
    #[inline(always)]
    pub fn clamp01(self) -> Self {
        self.max(Self::ZERO).min(Self::ONE)
    }

    #[inline(always)]
    pub fn floor(self) -> Self {
        self.map(libm::floorf)
    }

    #[inline(always)]
    pub fn recip(self) -> Self {
        self.map(|v| 1.0 / v)
    }

    /// Convert to integers, truncating toward zero. Out-of-range lanes
    /// saturate and NaN becomes 0.
    #[inline(always)]
    pub fn to_i32(self) -> I32x16 {
        I32x16(self.0.map(|v| v as i32))
    }

    /// Horizontal sum of all lanes
    #[inline]
    pub fn reduce_add(self) -> f32 {
        self.0.iter().sum()
    }

    #[inline]
    pub fn reduce_min(self) -> f32 {
        self.0.iter().copied().fold(f32::INFINITY, f32::min)
    }

    #[inline]
    pub fn reduce_max(self) -> f32 {
        self.0.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

impl Default for F32x16 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f32; LANES]> for F32x16 {
    fn from(lanes: [f32; LANES]) -> Self {
        Self(lanes)
    }
}

/// Shifts take the amount modulo 32, like `wrapping_shl`. Bits shifted
/// past the top of a lane are lost; no overflow is reported.
impl Shl<u32> for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, amount: u32) -> Self {
        Self(self.0.map(|v| v.wrapping_shl(amount)))
    }
}

/// Arithmetic (sign-extending) shift, amount taken modulo 32
impl Shr<u32> for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, amount: u32) -> Self {
        Self(self.0.map(|v| v.wrapping_shr(amount)))
    }
}

impl I32x16 {
    pub const ZERO: I32x16 = I32x16([0; LANES]);

    #[inline(always)]
    pub const fn splat(value: i32) -> Self {
        Self([value; LANES])
    }

    #[inline(always)]
    pub fn from_fn(f: impl FnMut(usize) -> i32) -> Self {
        Self(core::array::from_fn(f))
    }

    /// Reinterpret packed `u32` pixels as lanes
    #[inline(always)]
    pub fn from_bits(bits: [u32; LANES]) -> Self {
        Self(bits.map(|v| v as i32))
    }

    #[inline(always)]
    pub fn to_bits(self) -> [u32; LANES] {
        self.0.map(|v| v as u32)
    }

    #[inline(always)]
    pub fn lane(&self, index: usize) -> i32 {
        self.0[index]
    }

    #[inline(always)]
    pub fn select(mask: LaneMask, if_set: Self, if_clear: Self) -> Self {
        Self::from_fn(|i| if mask.contains(i) { if_set.0[i] } else { if_clear.0[i] })
    }

    #[inline(always)]
    pub fn to_f32(self) -> F32x16 {
        F32x16(self.0.map(|v| v as f32))
    }

    #[inline]
    pub fn reduce_add(self) -> i32 {
        self.0.iter().fold(0i32, |acc, &v| acc.wrapping_add(v))
    }
}

impl Default for I32x16 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Block-relative x of each lane, in pixels
#[inline]
pub fn lane_columns() -> F32x16 {
    F32x16::from_fn(|i| (i % BLOCK_WIDTH) as f32)
}

/// Block-relative y of each lane, in pixels
#[inline]
pub fn lane_rows() -> F32x16 {
    F32x16::from_fn(|i| (i / BLOCK_WIDTH) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_produces_one_bit_per_lane() {
        let a = F32x16::from_fn(|i| i as f32);
        let mask = a.lt(F32x16::splat(4.0));
        assert_eq!(mask.bits(), 0b1111);
        assert_eq!(a.ge(F32x16::splat(12.0)).bits(), 0xF000);
        assert!(a.eq(a).is_full());
    }

    #[test]
    fn test_nan_compares_false() {
        let nan = F32x16::splat(f32::NAN);
        assert!(nan.lt(F32x16::ONE).is_empty());
        assert!(nan.ge(F32x16::ONE).is_empty());
    }

    #[test]
    fn test_select_merges_by_mask() {
        let mask = LaneMask::from_bits(0b1010_1010_1010_1010);
        let merged = F32x16::select(mask, F32x16::ONE, F32x16::ZERO);
        for i in 0..LANES {
            assert_eq!(merged.lane(i), if i % 2 == 1 { 1.0 } else { 0.0 });
        }
        let ints = I32x16::select(mask, I32x16::splat(7), I32x16::splat(-1));
        assert_eq!(ints.lane(0), -1);
        assert_eq!(ints.lane(1), 7);
    }

    #[test]
    fn test_clamp01() {
        let v = F32x16::from_fn(|i| i as f32 * 0.25 - 1.0);
        let c = v.clamp01();
        assert_eq!(c.lane(0), 0.0);
        assert_eq!(c.lane(5), 0.25);
        assert_eq!(c.lane(15), 1.0);
        assert_eq!(F32x16::splat(f32::NAN).clamp01().lane(3), 0.0);
    }

    #[test]
    fn test_float_to_int_truncates_toward_zero() {
        let v = F32x16::from_fn(|i| if i % 2 == 0 { 2.9 } else { -2.9 });
        let t = v.to_i32();
        assert_eq!(t.lane(0), 2);
        assert_eq!(t.lane(1), -2);
        assert_eq!(I32x16::splat(-3).to_f32().lane(4), -3.0);
    }

    #[test]
    fn test_integer_shifts_and_bitwise() {
        let v = I32x16::splat(0x00AB_CDEF);
        assert_eq!(((v >> 16) & I32x16::splat(0xff)).lane(0), 0xAB);
        assert_eq!(((v >> 8) & I32x16::splat(0xff)).lane(0), 0xCD);
        assert_eq!((I32x16::splat(0x12) << 16 | I32x16::splat(0x34)).lane(9), 0x12_0034);
        // Arithmetic shift keeps the sign
        assert_eq!((I32x16::splat(-256) >> 8).lane(0), -1);
        // Shift amount wraps modulo 32
        assert_eq!((I32x16::splat(1) << 33).lane(0), 2);
    }

    #[test]
    fn test_horizontal_reductions() {
        let v = F32x16::from_fn(|i| i as f32);
        assert_eq!(v.reduce_add(), 120.0);
        assert_eq!(v.reduce_min(), 0.0);
        assert_eq!(v.reduce_max(), 15.0);
        assert_eq!(I32x16::from_fn(|i| i as i32).reduce_add(), 120);
    }

    #[test]
    fn test_mask_helpers() {
        let m = LaneMask::lane(3) | LaneMask::lane(9);
        assert_eq!(m.count(), 2);
        assert!(m.contains(9));
        assert!(!m.contains(4));
        assert!(!m.contains(LANES));
        assert!(m.is_subset_of(LaneMask::ALL));
        assert!(!LaneMask::ALL.is_subset_of(m));
        assert_eq!(m.iter().collect::<alloc::vec::Vec<_>>(), [3, 9]);
        assert_eq!(!LaneMask::NONE, LaneMask::ALL);
    }

    #[test]
    fn test_lane_layout() {
        let cols = lane_columns();
        let rows = lane_rows();
        assert_eq!((cols.lane(0), rows.lane(0)), (0.0, 0.0));
        assert_eq!((cols.lane(5), rows.lane(5)), (1.0, 1.0));
        assert_eq!((cols.lane(15), rows.lane(15)), (3.0, 3.0));
    }
}
