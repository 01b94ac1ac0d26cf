//! Fixed-point 3D points and vertices.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::Fixed;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point3d {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl Point3d {
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO);

    #[inline]
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_int(x), Fixed::from_int(y), Fixed::from_int(z))
    }

    #[inline]
    pub const fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self::new(Fixed::from_f64(x), Fixed::from_f64(y), Fixed::from_f64(z))
    }

    /*──────────────────────── dot products ─────────────────────────*/

    #[inline]
    pub const fn dot_product(&self, other: &Self) -> Fixed {
        Fixed::from_data(
            self.x.multiplication(other.x).data()
                + self.y.multiplication(other.y).data()
                + self.z.multiplication(other.z).data(),
        )
    }

    #[inline]
    pub const fn safe_dot_product(&self, other: &Self) -> Fixed {
        Fixed::from_data(
            self.x.safe_multiplication(other.x).data()
                + self.y.safe_multiplication(other.y).data()
                + self.z.safe_multiplication(other.z).data(),
        )
    }

    #[inline]
    pub const fn unsafe_dot_product(&self, other: &Self) -> Fixed {
        Fixed::from_data(
            self.x.unsafe_multiplication(other.x).data()
                + self.y.unsafe_multiplication(other.y).data()
                + self.z.unsafe_multiplication(other.z).data(),
        )
    }

    /*─────────────────────── cross products ────────────────────────*/

    #[inline]
    pub const fn cross_product(&self, other: &Self) -> Self {
        Self::new(
            Fixed::from_data(
                self.y.multiplication(other.z).data() - self.z.multiplication(other.y).data(),
            ),
            Fixed::from_data(
                self.z.multiplication(other.x).data() - self.x.multiplication(other.z).data(),
            ),
            Fixed::from_data(
                self.x.multiplication(other.y).data() - self.y.multiplication(other.x).data(),
            ),
        )
    }

    #[inline]
    pub const fn safe_cross_product(&self, other: &Self) -> Self {
        Self::new(
            Fixed::from_data(
                self.y.safe_multiplication(other.z).data()
                    - self.z.safe_multiplication(other.y).data(),
            ),
            Fixed::from_data(
                self.z.safe_multiplication(other.x).data()
                    - self.x.safe_multiplication(other.z).data(),
            ),
            Fixed::from_data(
                self.x.safe_multiplication(other.y).data()
                    - self.y.safe_multiplication(other.x).data(),
            ),
        )
    }

    #[inline]
    pub const fn unsafe_cross_product(&self, other: &Self) -> Self {
        Self::new(
            Fixed::from_data(
                self.y.unsafe_multiplication(other.z).data()
                    - self.z.unsafe_multiplication(other.y).data(),
            ),
            Fixed::from_data(
                self.z.unsafe_multiplication(other.x).data()
                    - self.x.unsafe_multiplication(other.z).data(),
            ),
            Fixed::from_data(
                self.x.unsafe_multiplication(other.y).data()
                    - self.y.unsafe_multiplication(other.x).data(),
            ),
        )
    }
}

impl Add for Point3d {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3d {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Point3d {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Fixed> for Point3d {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Fixed) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Mul<i32> for Point3d {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<Fixed> for Point3d {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Fixed) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Div<i32> for Point3d {
    type Output = Self;
    #[inline]
    fn div(self, rhs: i32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Point3d {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Point3d {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<Fixed> for Point3d {
    #[inline]
    fn mul_assign(&mut self, rhs: Fixed) {
        *self = *self * rhs;
    }
}

impl DivAssign<i32> for Point3d {
    #[inline]
    fn div_assign(&mut self, rhs: i32) {
        *self = *self / rhs;
    }
}

/// A model vertex: a point plus the precomputed `x * y` product used by the
/// rotation formula.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Vertex3d {
    point: Point3d,
    xy: Fixed,
}

impl Vertex3d {
    #[inline]
    pub const fn new(point: Point3d) -> Self {
        Self {
            point,
            xy: point.x.safe_multiplication(point.y),
        }
    }

    #[inline]
    pub const fn from_f64(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3d::from_f64(x, y, z))
    }

    #[inline]
    pub const fn point(&self) -> &Point3d {
        &self.point
    }

    #[inline]
    pub const fn xy(&self) -> Fixed {
        self.xy
    }
}

impl From<Point3d> for Vertex3d {
    #[inline]
    fn from(point: Point3d) -> Self {
        Self::new(point)
    }
}
