//! Player-versus-scenery collision on the ground plane.
//!
//! Static models may carry a collision face: a triangle or quad whose
//! top-down (x/z) outline is the model's footprint. A collision point is
//! inside a footprint when the winding number of the outline around it is
//! non-zero.

use glam::I64Vec2;
use smallvec::SmallVec;

use crate::math::{Point3d, Vertex3d};
use crate::world::{Face, ModelItem, RigidTransform, Stage, cell_of};

/// Offsets, in car space, of the five points tested each collision frame:
/// front-left, front-centre, front-right, rear-left and rear-right.
pub const PLAYER_COLLISION_OFFSETS: [Point3d; 5] = [
    Point3d::from_ints(6, 0, -14),
    Point3d::from_ints(0, 0, -14),
    Point3d::from_ints(-6, 0, -14),
    Point3d::from_ints(6, 0, 14),
    Point3d::from_ints(-6, 0, 14),
];

pub type CollisionPoints = SmallVec<[Point3d; 5]>;

/// Something that can run into the scenery, normally the player's car.
pub trait CollisionTarget {
    /// `false` while the target is already crashing or otherwise immune.
    fn can_crash(&self) -> bool;

    /// World-space points to test this frame.
    fn collision_points(&self) -> CollisionPoints;

    /// Called once with the model that was hit.
    fn crash(&mut self, model_index: usize);
}

/// World positions of [`PLAYER_COLLISION_OFFSETS`] under `transform`.
pub fn player_collision_points(transform: &impl RigidTransform) -> CollisionPoints {
    PLAYER_COLLISION_OFFSETS
        .iter()
        .map(|offset| transform.transform(&Vertex3d::new(*offset)))
        .collect()
}

/// Tests the target's collision points against the static models of the
/// cells they fall in, and calls `crash` on the first hit.
///
/// Panics if a collision point lies outside the stage grid.
pub fn check_collision(stage: &Stage, target: &mut (impl CollisionTarget + ?Sized)) -> bool {
    if !target.can_crash() {
        return false;
    }

    let models = stage.model_items();
    for point in target.collision_points() {
        let Some((column, row)) = cell_of(&point) else {
            panic!("collision point outside the stage grid: {point:?}");
        };
        for &model_index in stage.model_grid().cell(column, row) {
            let model = &models[model_index as usize];
            let Some(face) = model.collision_face() else {
                continue;
            };
            if footprint_contains(model, face, &point) {
                log::debug!("collision with model {model_index}");
                target.crash(model_index as usize);
                return true;
            }
        }
    }
    false
}

#[inline]
fn ground_point(point: &Point3d) -> I64Vec2 {
    I64Vec2::new(point.x.data() as i64, point.z.data() as i64)
}

/// Twice the signed area of `a, b, p`: positive when `p` is left of `a → b`.
#[inline]
fn is_left(a: I64Vec2, b: I64Vec2, p: I64Vec2) -> i64 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

fn footprint_contains(model: &ModelItem, face: &Face, point: &Point3d) -> bool {
    let vertices = model.vertices();
    let mut outline: SmallVec<[I64Vec2; 4]> = face.indices()[..face.vertex_count()]
        .iter()
        .map(|&i| ground_point(vertices[i].point()))
        .collect();
    winding_number(&mut outline, ground_point(point)) != 0
}

/// Winding number of the closed polygon `outline` around `p`.
fn winding_number(outline: &mut SmallVec<[I64Vec2; 4]>, p: I64Vec2) -> i32 {
    let Some(&first) = outline.first() else {
        return 0;
    };
    outline.push(first);

    let mut wn = 0;
    for edge in outline.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        if a.y <= p.y {
            if b.y > p.y && is_left(a, b, p) > 0 {
                wn += 1;
            }
        } else if b.y <= p.y && is_left(a, b, p) < 0 {
            wn -= 1;
        }
    }
    wn
}

/// Whether the ground under `position` slows the player down.
pub fn is_slow_ground(stage: &Stage, position: &Point3d) -> bool {
    stage.ground().tile_at(position.x, position.z) == Some(stage.slow_ground_tile_index())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::world::{GroundMap, Shading};

    fn outline(points: &[(i64, i64)]) -> SmallVec<[I64Vec2; 4]> {
        points.iter().map(|&(x, y)| I64Vec2::new(x, y)).collect()
    }

    #[test]
    fn winding_number_of_square() {
        let square = [(0, 0), (10, 0), (10, 10), (0, 10)];
        assert_ne!(winding_number(&mut outline(&square), I64Vec2::new(5, 5)), 0);
        assert_eq!(winding_number(&mut outline(&square), I64Vec2::new(15, 5)), 0);
        assert_eq!(winding_number(&mut outline(&square), I64Vec2::new(5, -1)), 0);

        // Reversed winding only flips the sign.
        let reversed = [(0, 10), (10, 10), (10, 0), (0, 0)];
        assert_eq!(
            winding_number(&mut outline(&reversed), I64Vec2::new(5, 5)),
            -winding_number(&mut outline(&square), I64Vec2::new(5, 5))
        );
    }

    #[test]
    fn winding_number_of_triangle() {
        let triangle = [(0, 0), (10, 0), (0, 10)];
        assert_ne!(winding_number(&mut outline(&triangle), I64Vec2::new(2, 2)), 0);
        assert_eq!(winding_number(&mut outline(&triangle), I64Vec2::new(8, 8)), 0);
    }

    /// Moves the five offsets to a fixed world position, no rotation.
    struct Car {
        position: Point3d,
        crashes: Vec<usize>,
        immune: bool,
    }

    impl RigidTransform for Car {
        fn transform(&self, vertex: &Vertex3d) -> Point3d {
            *vertex.point() + self.position
        }
    }

    impl CollisionTarget for Car {
        fn can_crash(&self) -> bool {
            !self.immune
        }

        fn collision_points(&self) -> CollisionPoints {
            player_collision_points(self)
        }

        fn crash(&mut self, model_index: usize) {
            self.crashes.push(model_index);
        }
    }

    fn car_at(x: i32, z: i32) -> Car {
        Car {
            position: Point3d::from_ints(x, 0, z),
            crashes: Vec::new(),
            immune: false,
        }
    }

    /// One block with footprint `(100, 100)..(120, 120)`.
    fn stage() -> Stage {
        let vertices = vec![
            Vertex3d::new(Point3d::from_ints(100, 0, 100)),
            Vertex3d::new(Point3d::from_ints(120, 0, 100)),
            Vertex3d::new(Point3d::from_ints(120, 0, 120)),
            Vertex3d::new(Point3d::from_ints(100, 0, 120)),
        ];
        let up = Point3d::from_ints(0, 1, 0);
        let face = Face::quad(&vertices, up, [0, 1, 2, 3], 0, Shading::Level(0)).unwrap();
        let block = ModelItem::new(vertices, vec![face.clone()])
            .unwrap()
            .with_collision_face(face)
            .unwrap();
        let ground = GroundMap::new(2, 1, vec![0, 1]).unwrap();
        Stage::new(vec![block], ground, 1, Vec::new(), Point3d::ZERO, Fixed::ZERO).unwrap()
    }

    #[test]
    fn offsets_follow_the_transform() {
        let points = player_collision_points(&car_at(50, 60));
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], Point3d::from_ints(56, 0, 46));
        assert_eq!(points[4], Point3d::from_ints(44, 0, 74));
    }

    #[test]
    fn front_point_inside_footprint_crashes() {
        let stage = stage();
        // Front-centre point lands on (110, 0, 110).
        let mut car = car_at(110, 124);
        assert!(check_collision(&stage, &mut car));
        assert_eq!(car.crashes, vec![0]);
    }

    #[test]
    fn clear_road_and_immune_targets_do_not_crash() {
        let stage = stage();
        let mut car = car_at(200, 200);
        assert!(!check_collision(&stage, &mut car));

        let mut immune = car_at(110, 124);
        immune.immune = true;
        assert!(!check_collision(&stage, &mut immune));
        assert!(immune.crashes.is_empty());
    }

    #[test]
    fn slow_ground_lookup() {
        let stage = stage();
        assert!(!is_slow_ground(&stage, &Point3d::from_ints(4, 0, 4)));
        assert!(is_slow_ground(&stage, &Point3d::from_ints(12, 0, 4)));
        assert!(!is_slow_ground(&stage, &Point3d::from_ints(40, 0, 4)));
    }

    #[test]
    #[should_panic(expected = "collision point outside the stage grid")]
    fn collision_point_off_grid_panics() {
        let stage = stage();
        let mut car = car_at(4, 512);
        check_collision(&stage, &mut car);
    }
}
