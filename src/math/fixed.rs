//! Signed fixed-point scalar stored in an `i32` with `P` fractional bits.
//!
//! Three multiplication/division flavours exist because the renderer picks
//! one per call site depending on the magnitude of the operands:
//!
//! * `multiplication` / `division`: pre-scale both operands by half the
//!   precision so the product stays in 32 bits. Loses low bits on small values.
//! * `safe_*`: goes through `i64`; exact up to truncation.
//! * `unsafe_*`: plain 32-bit product. Only valid when the caller knows the
//!   raw product fits.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedT<const P: u32>(i32);

/// Scalar used for world coordinates, angles and normals.
pub type Fixed = FixedT<12>;

/// Higher precision scalar used while walking polygon edges.
pub type RasterFixed = FixedT<18>;

impl<const P: u32> FixedT<P> {
    pub const PRECISION: u32 = P;
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << P);

    #[inline]
    const fn scale() -> i32 {
        1 << P
    }

    #[inline]
    const fn half_scale() -> i32 {
        1 << (P / 2)
    }

    #[inline]
    pub const fn from_data(data: i32) -> Self {
        Self(data)
    }

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self(value * Self::scale())
    }

    /// Truncates toward zero, like a C float-to-int conversion.
    #[inline]
    pub const fn from_f64(value: f64) -> Self {
        Self((value * Self::scale() as f64) as i32)
    }

    #[inline]
    pub const fn data(self) -> i32 {
        self.0
    }

    /// Integer part, truncated toward zero.
    #[inline]
    pub const fn integer(self) -> i32 {
        self.0 / Self::scale()
    }

    /// Integer part, rounded toward negative infinity.
    #[inline]
    pub const fn right_shift_integer(self) -> i32 {
        self.0 >> P
    }

    #[inline]
    pub const fn fraction(self) -> i32 {
        self.0 & (Self::scale() - 1)
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::scale() as f64
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Re-expresses the value with `Q` fractional bits.
    #[inline]
    pub const fn convert<const Q: u32>(self) -> FixedT<Q> {
        if Q >= P {
            FixedT(self.0 << (Q - P))
        } else {
            FixedT(self.0 >> (P - Q))
        }
    }

    /*──────────────────────── multiplication ───────────────────────*/

    #[inline]
    pub const fn multiplication(self, other: Self) -> Self {
        if P % 2 == 0 {
            Self((self.0 / Self::half_scale()) * (other.0 / Self::half_scale()))
        } else {
            self.safe_multiplication(other)
        }
    }

    #[inline]
    pub const fn safe_multiplication(self, other: Self) -> Self {
        Self(((self.0 as i64 * other.0 as i64) / Self::scale() as i64) as i32)
    }

    #[inline]
    pub const fn unsafe_multiplication(self, other: Self) -> Self {
        Self(self.0.wrapping_mul(other.0) / Self::scale())
    }

    /*─────────────────────────── division ──────────────────────────*/

    #[inline]
    pub const fn division(self, other: Self) -> Self {
        if P % 2 == 0 {
            Self((self.0 * Self::half_scale()) / (other.0 / Self::half_scale()))
        } else {
            self.safe_division(other)
        }
    }

    #[inline]
    pub const fn safe_division(self, other: Self) -> Self {
        Self(((self.0 as i64 * Self::scale() as i64) / other.0 as i64) as i32)
    }

    #[inline]
    pub const fn unsafe_division(self, other: Self) -> Self {
        Self(self.0.wrapping_mul(Self::scale()) / other.0)
    }
}

impl<const P: u32> From<i32> for FixedT<P> {
    #[inline]
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl<const P: u32> fmt::Debug for FixedT<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed<{P}>({})", self.to_f64())
    }
}

impl<const P: u32> fmt::Display for FixedT<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

/*──────────────────────────── operators ───────────────────────────*/

impl<const P: u32> Add for FixedT<P> {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl<const P: u32> Sub for FixedT<P> {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl<const P: u32> Neg for FixedT<P> {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl<const P: u32> Mul for FixedT<P> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.multiplication(rhs)
    }
}

impl<const P: u32> Mul<i32> for FixedT<P> {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0 * rhs)
    }
}

impl<const P: u32> Div for FixedT<P> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.division(rhs)
    }
}

impl<const P: u32> Div<i32> for FixedT<P> {
    type Output = Self;
    #[inline]
    fn div(self, rhs: i32) -> Self {
        Self(self.0 / rhs)
    }
}

impl<const P: u32> AddAssign for FixedT<P> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl<const P: u32> SubAssign for FixedT<P> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl<const P: u32> MulAssign for FixedT<P> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.multiplication(rhs);
    }
}

impl<const P: u32> MulAssign<i32> for FixedT<P> {
    #[inline]
    fn mul_assign(&mut self, rhs: i32) {
        self.0 *= rhs;
    }
}

impl<const P: u32> DivAssign for FixedT<P> {
    #[inline]
    fn div_assign(&mut self, rhs: Self) {
        *self = self.division(rhs);
    }
}

impl<const P: u32> DivAssign<i32> for FixedT<P> {
    #[inline]
    fn div_assign(&mut self, rhs: i32) {
        self.0 /= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_truncates_and_shift_floors() {
        let v = Fixed::from_f64(-1.5);
        assert_eq!(v.data(), -6144);
        assert_eq!(v.integer(), -1);
        assert_eq!(v.right_shift_integer(), -2);
        assert_eq!(Fixed::from_f64(2.75).integer(), 2);
    }

    #[test]
    fn from_f64_truncates() {
        // 0.0001 * 4096 = 0.4096
        assert_eq!(Fixed::from_f64(0.0001).data(), 0);
        assert_eq!(Fixed::from_f64(-0.0001).data(), 0);
    }

    #[test]
    fn multiplication_flavours_agree_on_small_values() {
        let a = Fixed::from_f64(3.5);
        let b = Fixed::from_f64(-2.25);
        assert_eq!(a.multiplication(b), Fixed::from_f64(-7.875));
        assert_eq!(a.safe_multiplication(b), Fixed::from_f64(-7.875));
        assert_eq!(a.unsafe_multiplication(b), Fixed::from_f64(-7.875));
    }

    #[test]
    fn default_multiplication_drops_low_bits() {
        // 1/4096 is below the half-precision step.
        let tiny = Fixed::from_data(1);
        assert_eq!(tiny.multiplication(Fixed::from_int(100)), Fixed::ZERO);
        assert_eq!(tiny.safe_multiplication(Fixed::from_int(100)).data(), 100);
    }

    #[test]
    fn safe_multiplication_handles_large_products() {
        let a = Fixed::from_int(1000);
        let b = Fixed::from_int(300);
        assert_eq!(a.safe_multiplication(b), Fixed::from_int(300_000));
    }

    #[test]
    fn division_flavours() {
        let a = Fixed::from_int(9);
        let b = Fixed::from_int(4);
        assert_eq!(a.division(b), Fixed::from_f64(2.25));
        assert_eq!(a.safe_division(b), Fixed::from_f64(2.25));
        assert_eq!(a.unsafe_division(b), Fixed::from_f64(2.25));
        assert_eq!(a / 3, Fixed::from_int(3));
    }

    #[test]
    fn precision_conversion() {
        let v = Fixed::from_f64(1.25);
        let r: RasterFixed = v.convert();
        assert_eq!(r, RasterFixed::from_f64(1.25));
        assert_eq!(r.convert::<12>(), v);
    }
}
