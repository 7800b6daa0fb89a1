//! Signed 16.16 fixed-point numbers.
//!
//! Every sampling coordinate, transform coefficient and filter weight in the engine is a
//! [`Fixed`]. Products of two values are formed in 64 bits, so intermediate transform results
//! live in a 48.16 form (`i64` with 16 fractional bits).

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A signed 16.16 fixed-point value.
///
/// Arithmetic wraps like the underlying `i32`; callers keep coordinates inside the 16.16 range
/// (the `composite` entry point rejects transforms whose extents would not fit).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    /// Number of fractional bits.
    pub const FRAC_BITS: u32 = 16;
    /// `0.0`
    pub const ZERO: Self = Self(0);
    /// `1.0`
    pub const ONE: Self = Self(1 << 16);
    /// `0.5`
    pub const HALF: Self = Self(1 << 15);
    /// Smallest positive step.
    pub const EPSILON: Self = Self(1);
    /// Largest representable value.
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i32::MIN);

    /// Integer to fixed. Values outside `-32768..=32767` lose their high bits.
    pub const fn from_int(i: i32) -> Self {
        Self(i.wrapping_shl(16))
    }

    /// Floor to an integer.
    pub const fn to_int(self) -> i32 {
        self.0 >> 16
    }

    /// Fractional part, `0..=0xffff`.
    pub const fn frac(self) -> i32 {
        self.0 & 0xffff
    }

    /// Round toward negative infinity.
    pub const fn floor(self) -> Self {
        Self(self.0 & !0xffff)
    }

    /// Round toward positive infinity.
    pub const fn ceil(self) -> Self {
        Self(self.0.wrapping_add(Self::ONE.0 - Self::EPSILON.0)).floor()
    }

    /// Truncating conversion from a double (`NaN` maps to zero, out-of-range values saturate).
    pub fn from_f64(v: f64) -> Self {
        Self((v * 65536.0) as i32)
    }

    /// Exact conversion to a double.
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 65536.0
    }

    /// Product of two fixed values, truncated toward negative infinity.
    pub const fn mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> 16) as i32)
    }

    /// Widen to the 48.16 form used for transformed coordinates.
    pub const fn to_48_16(self) -> i64 {
        self.0 as i64
    }

    /// Narrow a 48.16 value, or `None` when it does not fit in 16.16.
    pub fn from_48_16(v: i64) -> Option<Self> {
        i32::try_from(v).ok().map(Self)
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

/// Convert a fixed value to a double.
pub fn fixed_to_double(f: Fixed) -> f64 {
    f.to_f64()
}

/// Convert a double to a fixed value, truncating toward zero.
pub fn double_to_fixed(d: f64) -> Fixed {
    Fixed::from_f64(d)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fixed.rs"]
mod tests;
