//! Fixed point numbers and binary angles, as used by translated game code.

use crate::{shift::Shift, util};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Number of fractional bits in the standard 16.16 format.
pub const FRACBITS: u32 = 16;
/// `1.0` in 16.16 format.
pub const FRACUNIT: i32 = 1 << FRACBITS;
/// Mask for the fractional part of a 16.16 number.
pub const FRACMASK: i32 = FRACUNIT - 1;

/// Converts an integer to fixed point with `FRAC` fractional bits.
#[inline(always)]
pub fn int_to_fixed<const FRAC: u32>(value: i32) -> i32 {
    value.left_shift::<FRAC>()
}

/// Converts a fixed point number with `FRAC` fractional bits to an integer, rounding towards
/// negative infinity.
#[inline(always)]
pub fn fixed_to_int<const FRAC: u32>(value: i32) -> i32 {
    value.right_shift::<FRAC>()
}

/// A signed 16.16 fixed point number.
///
/// Addition and subtraction wrap, like the `ADDU`/`SUBU` instructions translated code was built from.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(pub i32);

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:#010X})", f64::from(self.0) / f64::from(FRACUNIT), self.0)
    }
}

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(FRACUNIT);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Creates a [`Fixed`] with the given integer value.
    #[inline(always)]
    pub fn from_int(value: i32) -> Self {
        Self(int_to_fixed::<FRACBITS>(value))
    }

    /// The integer part of this number, rounded towards negative infinity.
    #[inline(always)]
    pub fn to_int(self) -> i32 {
        fixed_to_int::<FRACBITS>(self.0)
    }

    /// The raw value.
    #[inline(always)]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// The fractional part of this number.
    #[inline(always)]
    pub const fn frac(self) -> i32 {
        self.0 & FRACMASK
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Self;

    /// 16.16 multiplication with a 64-bit intermediate. The result is truncated to 32 bits.
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        let product = i64::from(self.0) * i64::from(rhs.0);
        Self(product.right_shift::<FRACBITS>() as i32)
    }
}

impl Div for Fixed {
    type Output = Self;

    /// 16.16 division. Saturates to [`Fixed::MAX`] or [`Fixed::MIN`] instead of overflowing,
    /// including when dividing by zero.
    #[inline(always)]
    fn div(self, rhs: Self) -> Self::Output {
        if (self.0.unsigned_abs() >> 14) >= rhs.0.unsigned_abs() {
            util::cold_path();
            return if (self.0 ^ rhs.0) < 0 {
                Self::MIN
            } else {
                Self::MAX
            };
        }

        let dividend = i64::from(self.0).left_shift::<FRACBITS>();
        Self((dividend / i64::from(rhs.0)) as i32)
    }
}

/// A binary angular measurement: the whole `u32` range is one full turn.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Angle(pub u32);

impl std::fmt::Debug for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}° ({:#010X})", self.degrees(), self.0)
    }
}

impl Angle {
    pub const ANG5: Self = Self(Self::ANG45.0 / 9);
    pub const ANG45: Self = Self(0x2000_0000);
    pub const ANG90: Self = Self(0x4000_0000);
    pub const ANG180: Self = Self(0x8000_0000);
    pub const ANG270: Self = Self(0xC000_0000);

    /// The raw value.
    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// This angle in degrees, for display purposes.
    pub fn degrees(self) -> f64 {
        f64::from(self.0) * 360.0 / 4_294_967_296.0
    }

    /// The signed difference `self - other`, i.e. the shortest arc from `other` to `self`.
    #[inline(always)]
    pub const fn delta(self, other: Self) -> i32 {
        self.0.wrapping_sub(other.0) as i32
    }
}

impl Add for Angle {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Angle {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn int_conversions() {
        assert_eq!(Fixed::from_int(3), Fixed(0x3_0000));
        assert_eq!(Fixed::from_int(-1), Fixed(-0x1_0000));
        assert_eq!(Fixed(-0x8000).to_int(), -1);
        assert_eq!(Fixed(0x1_8000).to_int(), 1);
        assert_eq!(Fixed(-0x1_8000).frac(), 0x8000);

        assert_eq!(int_to_fixed::<8>(2), 0x200);
        assert_eq!(fixed_to_int::<8>(-0x180), -2);
    }

    #[test]
    fn mul_and_div() {
        let half = Fixed(FRACUNIT / 2);
        assert_eq!(Fixed::from_int(6) * half, Fixed::from_int(3));
        assert_eq!(Fixed::from_int(-6) * half, Fixed::from_int(-3));
        assert_eq!(Fixed::from_int(3) / half, Fixed::from_int(6));
        assert_eq!(Fixed::from_int(-3) / Fixed::from_int(2), Fixed(-0x1_8000));
    }

    #[test]
    fn div_saturates() {
        assert_eq!(Fixed::ONE / Fixed::ZERO, Fixed::MAX);
        assert_eq!(-Fixed::ONE / Fixed::ZERO, Fixed::MIN);
        assert_eq!(Fixed::from_int(-0x7000) / Fixed(1), Fixed::MIN);
        assert_eq!(Fixed::from_int(0x7000) / Fixed(-1), Fixed::MIN);
    }

    #[test]
    fn angle_delta_takes_shortest_arc() {
        assert_eq!(Angle(10).delta(Angle(u32::MAX - 9)), 20);
        assert_eq!(Angle(u32::MAX - 9).delta(Angle(10)), -20);
        assert_eq!((Angle::ANG270 + Angle::ANG180), Angle::ANG90);
    }

    proptest::proptest! {
        #[test]
        fn mul_by_one_is_identity(v in any::<i32>()) {
            prop_assert_eq!(Fixed(v) * Fixed::ONE, Fixed(v));
        }

        #[test]
        fn small_ints_round_trip(v in -0x7FFFi32..0x7FFF) {
            prop_assert_eq!(Fixed::from_int(v).to_int(), v);
        }
    }
}
