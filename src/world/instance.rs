//! Placed instances: rotated/scaled dynamic models and billboard sprites.

use smallvec::SmallVec;

use super::model::{ModelItem, Shading};
use crate::math::{ANGLE_TURN, Fixed, Point3d, Vertex3d, cos, sin};

/// Maps a model-space vertex to world space.
pub trait RigidTransform {
    fn transform(&self, vertex: &Vertex3d) -> Point3d;
}

/// Wraps an angle into `[0, 65536)`. Only one turn of correction is applied.
pub fn wrap_angle(angle: Fixed) -> Fixed {
    let turn = Fixed::from_int(ANGLE_TURN);
    let wrapped = if angle >= turn {
        angle - turn
    } else if angle < Fixed::ZERO {
        angle + turn
    } else {
        angle
    };
    assert!(
        wrapped >= Fixed::ZERO && wrapped < turn,
        "invalid angle: {angle}"
    );
    wrapped
}

/// Angle plus sine/cosine of its integer bucket.
#[derive(Clone, Copy, Debug)]
struct CachedAngle {
    angle: Fixed,
    sin: Fixed,
    cos: Fixed,
}

impl CachedAngle {
    const fn new() -> Self {
        Self {
            angle: Fixed::ZERO,
            sin: Fixed::ZERO,
            cos: Fixed::ONE,
        }
    }

    /// Returns `true` when the integer bucket changed.
    fn set(&mut self, angle: Fixed) -> bool {
        let angle = wrap_angle(angle);
        let old_bucket = self.angle.right_shift_integer();
        let new_bucket = angle.right_shift_integer();
        self.angle = angle;
        if old_bucket == new_bucket {
            return false;
        }
        self.sin = sin(new_bucket);
        self.cos = cos(new_bucket);
        true
    }
}

/// Products cached by `Model3d::update` and consumed by `rotate`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationTerms {
    pub xx: Fixed,
    pub xy: Fixed,
    pub xz: Fixed,
    pub yx: Fixed,
    pub yy: Fixed,
    pub yz: Fixed,
    pub zx: Fixed,
    pub zy: Fixed,
    pub zz: Fixed,
    pub xx_xy: Fixed,
    pub yx_yy: Fixed,
    pub zx_zy: Fixed,
}

/*──────────────────────────── Model3d ─────────────────────────────*/

pub struct Model3d<'a> {
    item: &'a ModelItem,
    position: Point3d,
    scale: Fixed,
    phi: CachedAngle,
    theta: CachedAngle,
    psi: CachedAngle,
    terms: RotationTerms,
    dirty: bool,
    shading_overrides: SmallVec<[(u16, Shading); 4]>,
}

impl<'a> Model3d<'a> {
    pub fn new(item: &'a ModelItem) -> Self {
        Self {
            item,
            position: Point3d::ZERO,
            scale: Fixed::ONE,
            phi: CachedAngle::new(),
            theta: CachedAngle::new(),
            psi: CachedAngle::new(),
            terms: RotationTerms::default(),
            dirty: true,
            shading_overrides: SmallVec::new(),
        }
    }

    #[inline]
    pub fn item(&self) -> &'a ModelItem {
        self.item
    }

    #[inline]
    pub fn position(&self) -> &Point3d {
        &self.position
    }

    #[inline]
    pub fn set_position(&mut self, position: Point3d) {
        self.position = position;
    }

    #[inline]
    pub fn scale(&self) -> Fixed {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Fixed) {
        assert!(scale > Fixed::ZERO, "invalid scale: {scale}");
        self.scale = scale;
    }

    #[inline]
    pub fn phi(&self) -> Fixed {
        self.phi.angle
    }

    #[inline]
    pub fn theta(&self) -> Fixed {
        self.theta.angle
    }

    #[inline]
    pub fn psi(&self) -> Fixed {
        self.psi.angle
    }

    pub fn set_phi(&mut self, phi: Fixed) {
        self.dirty |= self.phi.set(phi);
    }

    pub fn set_theta(&mut self, theta: Fixed) {
        self.dirty |= self.theta.set(theta);
    }

    pub fn set_psi(&mut self, psi: Fixed) {
        self.dirty |= self.psi.set(psi);
    }

    #[inline]
    pub fn needs_update(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn rotation_terms(&self) -> &RotationTerms {
        &self.terms
    }

    /// Overrides the shading of one face of this instance only.
    pub fn set_face_shading(&mut self, face_index: usize, shading: Shading) {
        assert!(
            face_index < self.item.faces().len(),
            "invalid face index: {face_index}"
        );
        assert!(shading.validate().is_ok(), "invalid shading: {shading:?}");
        let key = face_index as u16;
        match self.shading_overrides.iter_mut().find(|(i, _)| *i == key) {
            Some(entry) => entry.1 = shading,
            None => self.shading_overrides.push((key, shading)),
        }
    }

    /// Shading mode of a face, honouring per-instance overrides.
    pub fn face_shading(&self, face_index: usize) -> Shading {
        self.shading_overrides
            .iter()
            .find(|(i, _)| *i as usize == face_index)
            .map(|&(_, shading)| shading)
            .unwrap_or_else(|| self.item.faces()[face_index].shading_mode())
    }

    /// Recomputes the cached rotation terms if an angle bucket changed.
    pub fn update(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let (phi_sin, phi_cos) = (self.phi.sin, self.phi.cos);
        let (theta_sin, theta_cos) = (self.theta.sin, self.theta.cos);
        let (psi_sin, psi_cos) = (self.psi.sin, self.psi.cos);

        let phi_cos_theta_sin = phi_cos.unsafe_multiplication(theta_sin);
        let xx = phi_cos.unsafe_multiplication(theta_cos);
        let xy = phi_cos_theta_sin.unsafe_multiplication(psi_sin)
            - phi_sin.unsafe_multiplication(psi_cos);
        let xz = phi_cos_theta_sin.unsafe_multiplication(psi_cos)
            + phi_sin.unsafe_multiplication(psi_sin);

        let phi_sin_theta_sin = phi_sin.unsafe_multiplication(theta_sin);
        let yx = phi_sin.unsafe_multiplication(theta_cos);
        let yy = phi_sin_theta_sin.unsafe_multiplication(psi_sin)
            + phi_cos.unsafe_multiplication(psi_cos);
        let yz = phi_sin_theta_sin.unsafe_multiplication(psi_cos)
            - phi_cos.unsafe_multiplication(psi_sin);

        let zx = -theta_sin;
        let zy = theta_cos.unsafe_multiplication(psi_sin);
        let zz = theta_cos.unsafe_multiplication(psi_cos);

        self.terms = RotationTerms {
            xx,
            xy,
            xz,
            yx,
            yy,
            yz,
            zx,
            zy,
            zz,
            xx_xy: xx.unsafe_multiplication(xy),
            yx_yy: yx.unsafe_multiplication(yy),
            zx_zy: zx.unsafe_multiplication(zy),
        };
    }

    /// Rotates a model-space vertex using the cached terms. Uses the
    /// precomputed `x * y` product to save one multiply per row.
    pub fn rotate(&self, vertex: &Vertex3d) -> Point3d {
        let t = &self.terms;
        let p = vertex.point();
        let (vx, vy, vz, vxy) = (p.x, p.y, p.z, vertex.xy());

        let rx = (t.xx + vy).safe_multiplication(t.xy + vx) + vz.unsafe_multiplication(t.xz)
            - t.xx_xy
            - vxy;
        let ry = (t.yx + vy).safe_multiplication(t.yy + vx) + vz.unsafe_multiplication(t.yz)
            - t.yx_yy
            - vxy;
        let rz = (t.zx + vy).safe_multiplication(t.zy + vx) + vz.unsafe_multiplication(t.zz)
            - t.zx_zy
            - vxy;
        Point3d::new(rx, ry, rz)
    }
}

impl RigidTransform for Model3d<'_> {
    fn transform(&self, vertex: &Vertex3d) -> Point3d {
        let mut result = self.rotate(vertex);
        if self.scale != Fixed::ONE {
            result.x = result.x.unsafe_multiplication(self.scale);
            result.y = result.y.unsafe_multiplication(self.scale);
            result.z = result.z.unsafe_multiplication(self.scale);
        }
        result + self.position
    }
}

/*──────────────────────────── sprites ─────────────────────────────*/

/// Hardware handles a 3D sprite draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sprite3dItem {
    pub tiles_id: u16,
    pub palette_id: u8,
    pub affine_mat_id: u8,
}

/// Billboard drawn as a single 64x64 affine hardware sprite.
pub struct Sprite3d<'a> {
    item: &'a Sprite3dItem,
    position: Point3d,
    scale: Fixed,
    theta: CachedAngle,
}

impl<'a> Sprite3d<'a> {
    pub fn new(item: &'a Sprite3dItem) -> Self {
        Self {
            item,
            position: Point3d::ZERO,
            scale: Fixed::ONE,
            theta: CachedAngle::new(),
        }
    }

    #[inline]
    pub fn item(&self) -> &'a Sprite3dItem {
        self.item
    }

    #[inline]
    pub fn position(&self) -> &Point3d {
        &self.position
    }

    #[inline]
    pub fn set_position(&mut self, position: Point3d) {
        self.position = position;
    }

    #[inline]
    pub fn scale(&self) -> Fixed {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Fixed) {
        assert!(scale > Fixed::ZERO, "invalid scale: {scale}");
        self.scale = scale;
    }

    #[inline]
    pub fn theta(&self) -> Fixed {
        self.theta.angle
    }

    pub fn set_theta(&mut self, theta: Fixed) {
        self.theta.set(theta);
    }
}

impl RigidTransform for Sprite3d<'_> {
    /// Rotation about the vertical axis by `theta`, then scale and position.
    fn transform(&self, vertex: &Vertex3d) -> Point3d {
        let p = vertex.point();
        let (s, c) = (self.theta.sin, self.theta.cos);
        let mut result = Point3d::new(
            p.x.unsafe_multiplication(c) - p.z.unsafe_multiplication(s),
            p.y,
            p.x.unsafe_multiplication(s) + p.z.unsafe_multiplication(c),
        );
        if self.scale != Fixed::ONE {
            result.x = result.x.unsafe_multiplication(self.scale);
            result.y = result.y.unsafe_multiplication(self.scale);
            result.z = result.z.unsafe_multiplication(self.scale);
        }
        result + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Face;

    fn item() -> ModelItem {
        let vertices = vec![
            Vertex3d::from_f64(-1.0, 0.0, -1.0),
            Vertex3d::from_f64(1.0, 0.0, -1.0),
            Vertex3d::from_f64(1.0, 0.0, 1.0),
            Vertex3d::from_f64(-1.0, 0.0, 1.0),
        ];
        let face = Face::quad(
            &vertices,
            Point3d::from_ints(0, 1, 0),
            [0, 1, 2, 3],
            1,
            Shading::Level(4),
        )
        .unwrap();
        ModelItem::new(vertices, vec![face]).unwrap()
    }

    #[test]
    fn identity_rotation_preserves_vertices() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_position(Point3d::from_ints(10, 20, 30));
        model.update();

        for v in [
            Vertex3d::from_f64(1.5, -2.25, 3.0),
            Vertex3d::from_f64(-7.0, 0.5, -0.75),
            Vertex3d::from_f64(0.0, 12.0, -5.5),
        ] {
            assert_eq!(model.transform(&v), *v.point() + Point3d::from_ints(10, 20, 30));
        }
    }

    #[test]
    fn identity_terms() {
        let item = item();
        let mut model = Model3d::new(&item);
        assert!(model.needs_update());
        model.update();
        assert!(!model.needs_update());
        let t = model.rotation_terms();
        assert_eq!((t.xx, t.yy, t.zz), (Fixed::ONE, Fixed::ONE, Fixed::ONE));
        assert_eq!((t.xy, t.xz, t.yx), (Fixed::ZERO, Fixed::ZERO, Fixed::ZERO));
    }

    #[test]
    fn sub_unit_angle_changes_do_not_dirty() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.update();
        model.set_phi(Fixed::from_f64(0.5));
        assert!(!model.needs_update());
        model.set_phi(Fixed::from_int(100));
        assert!(model.needs_update());
    }

    #[test]
    fn repeated_updates_are_idempotent() {
        let item = item();
        let angle = Fixed::from_f64(12345.75);

        let mut model = Model3d::new(&item);
        model.set_phi(angle);
        model.update();
        let first = *model.rotation_terms();
        model.set_phi(angle);
        assert!(!model.needs_update());
        model.update();
        assert_eq!(*model.rotation_terms(), first);

        let mut fresh = Model3d::new(&item);
        fresh.set_phi(angle);
        fresh.update();
        assert_eq!(*fresh.rotation_terms(), first);
    }

    #[test]
    fn quarter_turn_about_theta_yaws() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_theta(Fixed::from_int(16384));
        model.update();
        let rotated = model.rotate(&Vertex3d::from_f64(0.0, 0.0, -1.0));
        assert_eq!(rotated, Point3d::from_ints(-1, 0, 0));
    }

    #[test]
    fn angles_wrap_by_a_full_turn() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_theta(Fixed::from_int(-16384));
        assert_eq!(model.theta(), Fixed::from_int(49152));
        model.set_psi(Fixed::from_int(65536 + 5));
        assert_eq!(model.psi(), Fixed::from_int(5));
    }

    #[test]
    #[should_panic(expected = "invalid angle")]
    fn angles_more_than_one_turn_out_panic() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_phi(Fixed::from_int(3 * 65536));
    }

    #[test]
    fn quarter_turn_about_phi() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_phi(Fixed::from_int(16384));
        model.update();
        // phi mixes x and y: (1, 0, 0) -> (0, 1, 0).
        let rotated = model.rotate(&Vertex3d::from_f64(1.0, 0.0, 0.0));
        assert_eq!(rotated, Point3d::from_ints(0, 1, 0));
    }

    #[test]
    fn scale_applies_after_rotation() {
        let item = item();
        let mut model = Model3d::new(&item);
        model.set_scale(Fixed::from_int(2));
        model.update();
        let p = model.transform(&Vertex3d::from_f64(1.0, 2.0, 3.0));
        assert_eq!(p, Point3d::from_ints(2, 4, 6));
    }

    #[test]
    fn face_shading_overrides() {
        let item = item();
        let mut model = Model3d::new(&item);
        assert_eq!(model.face_shading(0), Shading::Level(4));
        model.set_face_shading(0, Shading::Directional);
        assert_eq!(model.face_shading(0), Shading::Directional);
        model.set_face_shading(0, Shading::Level(1));
        assert_eq!(model.face_shading(0), Shading::Level(1));
    }

    #[test]
    fn sprite_rotates_about_vertical_axis() {
        let sprite_item = Sprite3dItem {
            tiles_id: 0,
            palette_id: 0,
            affine_mat_id: 0,
        };
        let mut sprite = Sprite3d::new(&sprite_item);
        sprite.set_theta(Fixed::from_int(16384));
        sprite.set_position(Point3d::from_ints(0, 5, 0));
        let p = sprite.transform(&Vertex3d::from_f64(1.0, 0.0, 0.0));
        assert_eq!(p, Point3d::from_ints(0, 5, 1));
    }
}
