//! World → screen mapping for the top-down camera.

use glam::IVec2;

use super::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FOCAL_LENGTH_SHIFT, NEAR_PLANE, SPRITE_SIZE};
use crate::math::{Fixed, Point3d, reciprocal};
use crate::world::{Camera3d, VerticalCylinder};

/// Camera snapshot used to project points for one frame.
#[derive(Clone, Copy, Debug)]
pub struct Projector {
    position: Point3d,
    u_x: Fixed,
    u_z: Fixed,
    v_x: Fixed,
    v_z: Fixed,
}

impl Projector {
    pub fn new(camera: &Camera3d) -> Self {
        Self {
            position: *camera.position(),
            u_x: camera.u().x,
            u_z: camera.u().z,
            v_x: camera.v().x,
            v_z: camera.v().z,
        }
    }

    #[inline]
    pub fn camera_position(&self) -> &Point3d {
        &self.position
    }

    /// Raw view depth of `point`, or `None` if it is nearer than the near
    /// plane (or behind the camera).
    #[inline]
    pub fn depth(&self, point: &Point3d) -> Option<i32> {
        let vcz = -(point.y - self.position.y).data();
        (vcz >= NEAR_PLANE).then_some(vcz)
    }

    /// Raw view-space `x` (right) and `y` (down) of `point`.
    #[inline]
    pub fn view_xy(&self, point: &Point3d) -> (i32, i32) {
        let vrx = (point.x - self.position.x) / 16;
        let vrz = (point.z - self.position.z) / 16;
        let vcx = vrx.unsafe_multiplication(self.u_x) + vrz.unsafe_multiplication(self.u_z);
        let vcy = -(vrx.unsafe_multiplication(self.v_x) + vrz.unsafe_multiplication(self.v_z));
        (vcx.data(), vcy.data())
    }

    /// Perspective scale for a depth, with 16 fractional bits.
    #[inline]
    pub fn scale(vcz: i32) -> i32 {
        ((reciprocal(vcz >> 10) as i64) << (FOCAL_LENGTH_SHIFT - 8) >> 6) as i32
    }

    /// Scale applied to sprites, with 19 fractional bits.
    #[inline]
    pub fn sprite_scale(vcz: i32) -> i32 {
        ((reciprocal(vcz >> 10) as i64) << (FOCAL_LENGTH_SHIFT - 8) >> 3) as i32
    }

    #[inline]
    fn to_screen(vcx: i32, vcy: i32, scale: i32) -> IVec2 {
        IVec2::new(
            ((vcx as i64 * scale as i64) >> 16) as i32 + DISPLAY_WIDTH / 2,
            ((vcy as i64 * scale as i64) >> 16) as i32 + DISPLAY_HEIGHT / 2,
        )
    }

    /// Screen position of `point`, `None` if it fails the near-plane test.
    pub fn project(&self, point: &Point3d) -> Option<IVec2> {
        let vcz = self.depth(point)?;
        let (vcx, vcy) = self.view_xy(point);
        Some(Self::to_screen(vcx, vcy, Self::scale(vcz)))
    }

    /// Top-left corner of a sprite centred on `point`, its sprite scale and
    /// depth, or `None` if it is too near or its box misses the screen.
    pub fn project_sprite(&self, point: &Point3d) -> Option<(IVec2, i32, i32)> {
        let vcz = self.depth(point)?;
        let (vcx, vcy) = self.view_xy(point);
        let sprite_scale = Self::sprite_scale(vcz);
        let centre = Self::to_screen(vcx, vcy, sprite_scale >> 3);
        let corner = centre - IVec2::splat(SPRITE_SIZE / 2);

        let visible = corner.x + SPRITE_SIZE > 0
            && corner.x < DISPLAY_WIDTH
            && corner.y + SPRITE_SIZE > 0
            && corner.y < DISPLAY_HEIGHT;
        visible.then_some((corner, sprite_scale, vcz))
    }

    /// Whether a cylinder's ground circle could overlap the screen.
    pub fn cylinder_visible(&self, cylinder: &VerticalCylinder) -> bool {
        let ground = Point3d::new(cylinder.centroid_x(), Fixed::ZERO, cylinder.centroid_z());
        let Some(vcz) = self.depth(&ground) else {
            return false;
        };
        let (vcx, vcy) = self.view_xy(&ground);
        let scale = Self::scale(vcz);
        let centre = Self::to_screen(vcx, vcy, scale);
        // World units become raw view units after the /16 pre-shift.
        let radius = ((cylinder.radius() as i64 * 256 * scale as i64) >> 16) as i32;

        centre.x + radius >= 0
            && centre.x - radius < DISPLAY_WIDTH
            && centre.y + radius >= 0
            && centre.y - radius < DISPLAY_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overhead(y: i32) -> Projector {
        Projector::new(&Camera3d::new(Point3d::from_ints(0, y, 0), Fixed::ZERO))
    }

    #[test]
    fn point_below_camera_hits_screen_centre() {
        let p = overhead(256).project(&Point3d::ZERO).unwrap();
        assert_eq!(p, IVec2::new(DISPLAY_WIDTH / 2, DISPLAY_HEIGHT / 2));
    }

    #[test]
    fn near_plane_rejects_close_points() {
        let projector = overhead(100);
        assert!(projector.project(&Point3d::from_ints(0, 80, 0)).is_none());
        assert!(projector.project(&Point3d::from_ints(0, 150, 0)).is_none());
        assert!(projector.project(&Point3d::from_ints(0, 76, 0)).is_some());
    }

    #[test]
    fn screen_axes_follow_camera() {
        let projector = overhead(256);
        let right = projector.project(&Point3d::from_ints(16, 0, 0)).unwrap();
        let up = projector.project(&Point3d::from_ints(0, 0, -16)).unwrap();
        assert!(right.x > DISPLAY_WIDTH / 2 && right.y == DISPLAY_HEIGHT / 2);
        assert!(up.y < DISPLAY_HEIGHT / 2 && up.x == DISPLAY_WIDTH / 2);
    }

    #[test]
    fn farther_points_shrink() {
        let near = overhead(128).project(&Point3d::from_ints(32, 0, 0)).unwrap();
        let far = overhead(256).project(&Point3d::from_ints(32, 0, 0)).unwrap();
        assert!(near.x > far.x);
    }

    #[test]
    fn cylinder_culling() {
        let projector = overhead(256);
        let here = VerticalCylinder::new(Fixed::ZERO, Fixed::ZERO, 8).unwrap();
        let far_away = VerticalCylinder::new(Fixed::from_int(900), Fixed::ZERO, 8).unwrap();
        let big = VerticalCylinder::new(Fixed::from_int(180), Fixed::ZERO, 80).unwrap();
        assert!(projector.cylinder_visible(&here));
        assert!(!projector.cylinder_visible(&far_away));
        assert!(projector.cylinder_visible(&big));
    }

    #[test]
    fn sprite_box_culling() {
        let projector = overhead(256);
        let (corner, _, _) = projector.project_sprite(&Point3d::ZERO).unwrap();
        assert_eq!(corner, IVec2::new(DISPLAY_WIDTH / 2 - 32, DISPLAY_HEIGHT / 2 - 32));
        assert!(projector.project_sprite(&Point3d::from_ints(400, 0, 0)).is_none());
    }
}
