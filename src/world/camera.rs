use crate::math::{Fixed, Point3d, cos, sin};

use super::instance::wrap_angle;

/// Lowest height the camera may sit at.
pub const MIN_CAMERA_Y: i32 = 2;

/// Top-down camera: it looks along `-y` and only yaws (`phi`) about the
/// vertical axis.
///
/// * `u` is the screen-right axis on the ground plane.
/// * `v` is the screen-up axis on the ground plane.
#[derive(Clone, Copy, Debug)]
pub struct Camera3d {
    position: Point3d,
    phi: Fixed,
    u: Point3d,
    v: Point3d,
}

impl Default for Camera3d {
    fn default() -> Self {
        Self::new(Point3d::from_ints(0, 128, 0), Fixed::ZERO)
    }
}

impl Camera3d {
    pub fn new(position: Point3d, phi: Fixed) -> Self {
        let mut camera = Self {
            position: Point3d::ZERO,
            phi: Fixed::ZERO,
            u: Point3d::ZERO,
            v: Point3d::ZERO,
        };
        camera.set_position(position);
        camera.set_phi(phi);
        camera
    }

    #[inline]
    pub fn position(&self) -> &Point3d {
        &self.position
    }

    /// Moves the camera; `y` is clamped to `MIN_CAMERA_Y`.
    pub fn set_position(&mut self, mut position: Point3d) {
        let min_y = Fixed::from_int(MIN_CAMERA_Y);
        if position.y < min_y {
            position.y = min_y;
        }
        self.position = position;
    }

    #[inline]
    pub fn phi(&self) -> Fixed {
        self.phi
    }

    pub fn set_phi(&mut self, phi: Fixed) {
        self.phi = wrap_angle(phi);
        let bucket = self.phi.right_shift_integer();
        let (s, c) = (sin(bucket), cos(bucket));
        self.u = Point3d::new(c, Fixed::ZERO, s);
        self.v = Point3d::new(s, Fixed::ZERO, -c);
    }

    #[inline]
    pub fn u(&self) -> &Point3d {
        &self.u
    }

    #[inline]
    pub fn v(&self) -> &Point3d {
        &self.v
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move `forward` units towards screen-up and `side` units towards
    /// screen-right, keeping the height.
    pub fn step(&mut self, forward: Fixed, side: Fixed) {
        let mut position = self.position;
        position.x += self.v.x.safe_multiplication(forward) + self.u.x.safe_multiplication(side);
        position.z += self.v.z.safe_multiplication(forward) + self.u.z.safe_multiplication(side);
        self.set_position(position);
    }

    /// Yaw by `delta` angle units.
    pub fn turn(&mut self, delta: Fixed) {
        self.set_phi(self.phi + delta);
    }

    /// Raise (or lower, for negative `delta`) the camera.
    pub fn lift(&mut self, delta: Fixed) {
        let mut position = self.position;
        position.y += delta;
        self.set_position(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_at_zero_yaw() {
        let cam = Camera3d::new(Point3d::from_ints(0, 100, 0), Fixed::ZERO);
        assert_eq!(*cam.u(), Point3d::from_ints(1, 0, 0));
        assert_eq!(*cam.v(), Point3d::from_ints(0, 0, -1));
    }

    #[test]
    fn axes_are_orthonormal() {
        let cam = Camera3d::new(Point3d::ZERO, Fixed::from_int(5000));
        let (u, v) = (cam.u(), cam.v());
        assert!(u.safe_dot_product(v).data().abs() <= 2);
        assert!((u.safe_dot_product(u) - Fixed::ONE).data().abs() <= 4);
        assert!((v.safe_dot_product(v) - Fixed::ONE).data().abs() <= 4);
    }

    #[test]
    fn height_is_clamped() {
        let cam = Camera3d::new(Point3d::from_ints(3, -10, 4), Fixed::ZERO);
        assert_eq!(*cam.position(), Point3d::from_ints(3, MIN_CAMERA_Y, 4));
    }

    #[test]
    fn step_moves_towards_screen_up() {
        let mut cam = Camera3d::new(Point3d::from_ints(0, 64, 0), Fixed::ZERO);
        cam.step(Fixed::from_int(10), Fixed::ZERO);
        assert_eq!(*cam.position(), Point3d::from_ints(0, 64, -10));
        cam.step(Fixed::ZERO, Fixed::from_int(3));
        assert_eq!(*cam.position(), Point3d::from_ints(3, 64, -10));
    }

    #[test]
    fn turn_wraps() {
        let mut cam = Camera3d::default();
        cam.turn(Fixed::from_int(-1));
        assert_eq!(cam.phi(), Fixed::from_int(65535));
    }
}
