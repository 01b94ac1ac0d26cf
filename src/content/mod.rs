//! Built-in assets: a handful of primitive models and a demo track.

use crate::math::{Fixed, Point3d, Vertex3d};
use crate::renderer::Color;
use crate::world::{
    ContentError, Face, GRID_COLUMNS, GROUND_TILE_SIZE, GroundMap, ModelItem, Shading, Sprite3dItem,
    Stage, StageError, VerticalCylinder, CELL_SIZE,
};

/// Face index of the `+y` face of [`cube`].
pub const CUBE_TOP_FACE: usize = 0;

pub const CAR_COLOR: usize = 0;
pub const CUBE_COLOR: usize = 1;
pub const LEAVES_COLOR: usize = 2;
pub const FENCE_COLOR: usize = 3;
pub const ROOF_COLOR: usize = 4;

pub const ROAD_TILE: u16 = 0;
pub const GRASS_TILE: u16 = 1;

pub fn demo_colors() -> Vec<Color> {
    vec![
        Color::new(28, 4, 4),
        Color::new(28, 28, 26),
        Color::new(4, 20, 6),
        Color::new(18, 14, 10),
        Color::new(10, 2, 2),
    ]
}

#[inline]
fn vertex(x: i32, y: i32, z: i32) -> Vertex3d {
    Vertex3d::new(Point3d::from_ints(x, y, z))
}

/// Six quads of a box spanning `min..max`, top face first.
fn box_faces(
    vertices: &[Vertex3d],
    side_color: usize,
    top_color: usize,
) -> Result<Vec<Face>, ContentError> {
    let side = |normal: (i32, i32, i32), indices, shading| {
        let (x, y, z) = normal;
        Face::quad(
            vertices,
            Point3d::from_ints(x, y, z),
            indices,
            side_color,
            Shading::Level(shading),
        )
    };
    // 0..4 bottom ring, 4..8 top ring, both ordered -x-z, +x-z, +x+z, -x+z.
    Ok(vec![
        Face::quad(
            vertices,
            Point3d::from_ints(0, 1, 0),
            [4, 5, 6, 7],
            top_color,
            Shading::Level(7),
        )?,
        side((0, -1, 0), [0, 3, 2, 1], 2)?,
        side((1, 0, 0), [1, 2, 6, 5], 5)?,
        side((-1, 0, 0), [0, 4, 7, 3], 4)?,
        side((0, 0, 1), [3, 7, 6, 2], 3)?,
        side((0, 0, -1), [0, 1, 5, 4], 6)?,
    ])
}

/// Collision face over the ground ring `0..4`.
fn footprint(vertices: &[Vertex3d], color_index: usize) -> Result<Face, ContentError> {
    Face::quad(
        vertices,
        Point3d::from_ints(0, 1, 0),
        [0, 1, 2, 3],
        color_index,
        Shading::Level(0),
    )
}

fn box_vertices(min: (i32, i32, i32), max: (i32, i32, i32)) -> Vec<Vertex3d> {
    let (x0, y0, z0) = min;
    let (x1, y1, z1) = max;
    vec![
        vertex(x0, y0, z0),
        vertex(x1, y0, z0),
        vertex(x1, y0, z1),
        vertex(x0, y0, z1),
        vertex(x0, y1, z0),
        vertex(x1, y1, z0),
        vertex(x1, y1, z1),
        vertex(x0, y1, z1),
    ]
}

/// Axis-aligned cube of side `size` centred on the origin.
pub fn cube(size: i32, color_index: usize) -> Result<ModelItem, ContentError> {
    let half = size / 2;
    let vertices = box_vertices((-half, -half, -half), (half, half, half));
    let faces = box_faces(&vertices, color_index, color_index)?;
    ModelItem::new(vertices, faces)
}

/// Player car body, nose towards `-z`, resting on `y = 0`.
pub fn car() -> Result<ModelItem, ContentError> {
    let vertices = box_vertices((-6, 0, -14), (6, 6, 14));
    let faces = box_faces(&vertices, CAR_COLOR, ROOF_COLOR)?;
    ModelItem::new(vertices, faces)
}

/// Square-based pyramid standing at `(x, 0, z)`, in world coordinates.
pub fn tree(x: i32, z: i32) -> Result<ModelItem, ContentError> {
    const RADIUS: i32 = 8;
    const HEIGHT: i32 = 20;
    let vertices = vec![
        vertex(x - RADIUS, 0, z - RADIUS),
        vertex(x + RADIUS, 0, z - RADIUS),
        vertex(x + RADIUS, 0, z + RADIUS),
        vertex(x - RADIUS, 0, z + RADIUS),
        vertex(x, HEIGHT, z),
    ];
    // Slope normal of a side: (height, radius) normalised.
    let length = ((HEIGHT * HEIGHT + RADIUS * RADIUS) as f64).sqrt();
    let (n, up) = (HEIGHT as f64 / length, RADIUS as f64 / length);
    let slope = |normal: (f64, f64), indices, shading| {
        Face::triangle(
            &vertices,
            Point3d::from_f64(normal.0, up, normal.1),
            indices,
            LEAVES_COLOR,
            shading,
        )
    };
    let faces = vec![
        slope((0.0, -n), [0, 1, 4], Shading::Directional)?,
        slope((n, 0.0), [1, 2, 4], Shading::Directional)?,
        slope((0.0, n), [2, 3, 4], Shading::Level(3))?,
        slope((-n, 0.0), [3, 0, 4], Shading::Level(4))?,
    ];
    let collision = footprint(&vertices, LEAVES_COLOR)?;
    let cylinder = VerticalCylinder::new(Fixed::from_int(x), Fixed::from_int(z), RADIUS + 1)?;
    Ok(ModelItem::new(vertices, faces)?
        .with_collision_face(collision)?
        .with_vertical_cylinder(cylinder))
}

/// Low wall over the rectangle `(x0, z0)..(x1, z1)`.
pub fn fence(x0: i32, z0: i32, x1: i32, z1: i32) -> Result<ModelItem, ContentError> {
    const HEIGHT: i32 = 6;
    let vertices = box_vertices((x0, 0, z0), (x1, HEIGHT, z1));
    let mut faces = box_faces(&vertices, FENCE_COLOR, FENCE_COLOR)?;
    // Nobody looks at the underside.
    faces.remove(1);
    let collision = footprint(&vertices, FENCE_COLOR)?;

    let (dx, dz) = (x1 - x0, z1 - z0);
    let radius = (((dx * dx + dz * dz) as f64).sqrt() / 2.0).ceil() as i32;
    let cylinder = VerticalCylinder::new(
        Fixed::from_int(x0 + x1) / 2,
        Fixed::from_int(z0 + z1) / 2,
        radius,
    )?;
    Ok(ModelItem::new(vertices, faces)?
        .with_collision_face(collision)?
        .with_vertical_cylinder(cylinder))
}

pub fn explosion_sprite_item() -> Sprite3dItem {
    Sprite3dItem {
        tiles_id: 512,
        palette_id: 8,
        affine_mat_id: 0,
    }
}

/*──────────────────────────── demo stage ──────────────────────────*/

const WORLD_SIZE: i32 = GRID_COLUMNS as i32 * CELL_SIZE;
const ROAD_INNER: i32 = 320;
const ROAD_OUTER: i32 = 416;

/// Distance from the track centre, in the square (Chebyshev) metric.
#[inline]
fn ring_distance(x: i32, z: i32) -> i32 {
    let centre = WORLD_SIZE / 2;
    (x - centre).abs().max((z - centre).abs())
}

fn demo_ground() -> Result<GroundMap, ContentError> {
    let tiles_per_side = (WORLD_SIZE / GROUND_TILE_SIZE) as usize;
    let mut tiles = Vec::with_capacity(tiles_per_side * tiles_per_side);
    for row in 0..tiles_per_side as i32 {
        for column in 0..tiles_per_side as i32 {
            let x = column * GROUND_TILE_SIZE + GROUND_TILE_SIZE / 2;
            let z = row * GROUND_TILE_SIZE + GROUND_TILE_SIZE / 2;
            let d = ring_distance(x, z);
            tiles.push(if (ROAD_INNER..ROAD_OUTER).contains(&d) { ROAD_TILE } else { GRASS_TILE });
        }
    }
    GroundMap::new(tiles_per_side, tiles_per_side, tiles)
}

/// Square ring road with trees on the grass and fences along the inner
/// kerb of the start straight.
pub fn demo_stage() -> Result<Stage, StageError> {
    let mut models = Vec::new();

    for z in (48..WORLD_SIZE - 32).step_by(64) {
        for x in (48..WORLD_SIZE - 32).step_by(64) {
            let d = ring_distance(x, z);
            if d > ROAD_INNER - 24 && d < ROAD_OUTER + 24 {
                continue;
            }
            models.push(tree(x, z)?);
        }
    }

    let kerb = WORLD_SIZE / 2 + ROAD_INNER;
    for z in (WORLD_SIZE / 2 - 160..WORLD_SIZE / 2 + 160).step_by(64) {
        models.push(fence(kerb - 8, z, kerb - 4, z + 24)?);
    }

    let start_x = (WORLD_SIZE / 2 + (ROAD_INNER + ROAD_OUTER) / 2) as f64;
    let start = Point3d::from_f64(start_x, 0.0, (WORLD_SIZE / 2) as f64);
    Stage::new(models, demo_ground()?, GRASS_TILE, demo_colors(), start, Fixed::ZERO)
}
