//! Immutable model content: faces, model items and the cylinders used to
//! cull static models before their vertices are projected.

use thiserror::Error;

use crate::math::{Fixed, Point3d, Vertex3d};

/// Colors a face can index; palette slot 0 is reserved for transparency.
pub const MAX_COLORS: usize = 10;
pub const MAX_SHADING: u8 = 7;
pub const MAX_MODEL_VERTICES: usize = 32767;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("model has no vertices")]
    NoVertices,
    #[error("model has {0} vertices, the limit is {MAX_MODEL_VERTICES}")]
    TooManyVertices(usize),
    #[error("model has no faces")]
    NoFaces,
    #[error("vertex index {index} out of range ({count} vertices)")]
    VertexIndexOutOfRange { index: usize, count: usize },
    #[error("face vertices {0} and {1} share the same position")]
    DuplicateVertex(usize, usize),
    #[error("invalid color index: {0}")]
    InvalidColor(usize),
    #[error("invalid shading: {0}")]
    InvalidShading(u8),
    #[error("invalid cylinder radius: {0}")]
    InvalidRadius(i32),
    #[error("too many colors: {0} (max {MAX_COLORS})")]
    TooManyColors(usize),
    #[error("ground map is {columns}x{rows} but has {len} tiles")]
    GroundMapSize {
        columns: usize,
        rows: usize,
        len: usize,
    },
}

/*──────────────────────────── shading ─────────────────────────────*/

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Fixed palette bank in `0..=7`.
    Level(u8),
    /// Derived from the vertical component of the (rotated) face normal.
    Directional,
}

impl Shading {
    pub fn validate(self) -> Result<Self, ContentError> {
        match self {
            Shading::Level(level) if level > MAX_SHADING => {
                Err(ContentError::InvalidShading(level))
            }
            _ => Ok(self),
        }
    }

    /// Palette bank for a face whose normal has the given `y` component.
    #[inline]
    pub fn resolve(self, normal_y: Fixed) -> u8 {
        match self {
            Shading::Level(level) => level,
            Shading::Directional => (normal_y.abs().data() >> 9).min(MAX_SHADING as i32) as u8,
        }
    }
}

/*────────────────────────────── face ──────────────────────────────*/

#[derive(Clone, Debug)]
pub struct Face {
    centroid: Point3d,
    normal: Vertex3d,
    indices: [u16; 4],
    color_index: u8,
    shading: Shading,
    triangle: bool,
}

impl Face {
    pub fn triangle(
        vertices: &[Vertex3d],
        normal: Point3d,
        indices: [usize; 3],
        color_index: usize,
        shading: Shading,
    ) -> Result<Self, ContentError> {
        Self::build(vertices, normal, &indices, color_index, shading)
    }

    pub fn quad(
        vertices: &[Vertex3d],
        normal: Point3d,
        indices: [usize; 4],
        color_index: usize,
        shading: Shading,
    ) -> Result<Self, ContentError> {
        Self::build(vertices, normal, &indices, color_index, shading)
    }

    fn build(
        vertices: &[Vertex3d],
        normal: Point3d,
        indices: &[usize],
        color_index: usize,
        shading: Shading,
    ) -> Result<Self, ContentError> {
        check_indices(vertices, indices)?;
        if color_index >= MAX_COLORS {
            return Err(ContentError::InvalidColor(color_index));
        }
        let shading = shading.validate()?;

        let sum = indices
            .iter()
            .fold(Point3d::ZERO, |acc, &i| acc + *vertices[i].point());
        let centroid = sum / indices.len() as i32;

        let mut packed = [0u16; 4];
        for (slot, &i) in packed.iter_mut().zip(indices) {
            *slot = i as u16;
        }
        let triangle = indices.len() == 3;
        if triangle {
            packed[3] = packed[0];
        }

        Ok(Self {
            centroid,
            normal: Vertex3d::new(normal),
            indices: packed,
            color_index: color_index as u8,
            shading,
            triangle,
        })
    }

    #[inline]
    pub fn centroid(&self) -> &Point3d {
        &self.centroid
    }

    #[inline]
    pub fn normal(&self) -> &Vertex3d {
        &self.normal
    }

    /// Vertex indices; for triangles the fourth repeats the first.
    #[inline]
    pub fn indices(&self) -> [usize; 4] {
        self.indices.map(usize::from)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        if self.triangle { 3 } else { 4 }
    }

    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.triangle
    }

    #[inline]
    pub fn color_index(&self) -> usize {
        self.color_index as usize
    }

    #[inline]
    pub fn shading_mode(&self) -> Shading {
        self.shading
    }

    /// Palette bank computed against the face's own normal.
    #[inline]
    pub fn shading(&self) -> u8 {
        self.shading.resolve(self.normal.point().y)
    }

    pub fn set_shading(&mut self, shading: Shading) -> Result<(), ContentError> {
        self.shading = shading.validate()?;
        Ok(())
    }

    pub fn set_color_index(&mut self, color_index: usize) -> Result<(), ContentError> {
        if color_index >= MAX_COLORS {
            return Err(ContentError::InvalidColor(color_index));
        }
        self.color_index = color_index as u8;
        Ok(())
    }
}

fn check_indices(vertices: &[Vertex3d], indices: &[usize]) -> Result<(), ContentError> {
    for &index in indices {
        if index >= vertices.len() {
            return Err(ContentError::VertexIndexOutOfRange {
                index,
                count: vertices.len(),
            });
        }
    }
    for (a, &ia) in indices.iter().enumerate() {
        for &ib in &indices[a + 1..] {
            if vertices[ia].point() == vertices[ib].point() {
                return Err(ContentError::DuplicateVertex(ia, ib));
            }
        }
    }
    Ok(())
}

/*──────────────────────── vertical cylinder ───────────────────────*/

/// Upright cylinder enclosing a static model, in world units on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerticalCylinder {
    centroid_x: Fixed,
    centroid_z: Fixed,
    radius: i32,
}

impl VerticalCylinder {
    pub fn new(centroid_x: Fixed, centroid_z: Fixed, radius: i32) -> Result<Self, ContentError> {
        if radius < 0 {
            return Err(ContentError::InvalidRadius(radius));
        }
        Ok(Self {
            centroid_x,
            centroid_z,
            radius,
        })
    }

    #[inline]
    pub fn centroid_x(&self) -> Fixed {
        self.centroid_x
    }

    #[inline]
    pub fn centroid_z(&self) -> Fixed {
        self.centroid_z
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }
}

/*──────────────────────────── model item ──────────────────────────*/

#[derive(Clone, Debug)]
pub struct ModelItem {
    vertices: Vec<Vertex3d>,
    faces: Vec<Face>,
    collision_face: Option<Face>,
    vertical_cylinder: Option<VerticalCylinder>,
}

impl ModelItem {
    pub fn new(vertices: Vec<Vertex3d>, faces: Vec<Face>) -> Result<Self, ContentError> {
        if vertices.is_empty() {
            return Err(ContentError::NoVertices);
        }
        if vertices.len() > MAX_MODEL_VERTICES {
            return Err(ContentError::TooManyVertices(vertices.len()));
        }
        if faces.is_empty() {
            return Err(ContentError::NoFaces);
        }
        for face in &faces {
            for index in face.indices() {
                if index >= vertices.len() {
                    return Err(ContentError::VertexIndexOutOfRange {
                        index,
                        count: vertices.len(),
                    });
                }
            }
        }
        Ok(Self {
            vertices,
            faces,
            collision_face: None,
            vertical_cylinder: None,
        })
    }

    /// Attaches the ground footprint used for collision tests. Its vertex
    /// indices refer to this item's vertex list.
    pub fn with_collision_face(mut self, face: Face) -> Result<Self, ContentError> {
        for index in face.indices() {
            if index >= self.vertices.len() {
                return Err(ContentError::VertexIndexOutOfRange {
                    index,
                    count: self.vertices.len(),
                });
            }
        }
        self.collision_face = Some(face);
        Ok(self)
    }

    pub fn with_vertical_cylinder(mut self, cylinder: VerticalCylinder) -> Self {
        self.vertical_cylinder = Some(cylinder);
        self
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex3d] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    #[inline]
    pub fn collision_face(&self) -> Option<&Face> {
        self.collision_face.as_ref()
    }

    #[inline]
    pub fn vertical_cylinder(&self) -> Option<&VerticalCylinder> {
        self.vertical_cylinder.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vertex3d> {
        vec![
            Vertex3d::from_f64(0.0, 0.0, 0.0),
            Vertex3d::from_f64(4.0, 0.0, 0.0),
            Vertex3d::from_f64(4.0, 0.0, 4.0),
            Vertex3d::from_f64(0.0, 0.0, 4.0),
        ]
    }

    const UP: Point3d = Point3d::from_ints(0, 1, 0);

    #[test]
    fn quad_centroid_is_vertex_mean() {
        let face = Face::quad(&square(), UP, [0, 1, 2, 3], 2, Shading::Level(3)).unwrap();
        assert_eq!(*face.centroid(), Point3d::from_ints(2, 0, 2));
        assert_eq!(face.vertex_count(), 4);
        assert_eq!(face.shading(), 3);
    }

    #[test]
    fn triangle_repeats_first_index() {
        let face = Face::triangle(&square(), UP, [1, 2, 3], 0, Shading::Level(0)).unwrap();
        assert!(face.is_triangle());
        assert_eq!(face.indices(), [1, 2, 3, 1]);
    }

    #[test]
    fn rejects_bad_faces() {
        let vertices = square();
        assert_eq!(
            Face::quad(&vertices, UP, [0, 1, 2, 9], 0, Shading::Level(0)).unwrap_err(),
            ContentError::VertexIndexOutOfRange { index: 9, count: 4 }
        );
        assert_eq!(
            Face::triangle(&vertices, UP, [0, 1, 2], MAX_COLORS, Shading::Level(0)).unwrap_err(),
            ContentError::InvalidColor(MAX_COLORS)
        );
        assert_eq!(
            Face::triangle(&vertices, UP, [0, 1, 2], 0, Shading::Level(8)).unwrap_err(),
            ContentError::InvalidShading(8)
        );

        let mut dup = square();
        dup[2] = dup[0];
        assert_eq!(
            Face::triangle(&dup, UP, [0, 1, 2], 0, Shading::Level(0)).unwrap_err(),
            ContentError::DuplicateVertex(0, 2)
        );
    }

    #[test]
    fn setters_validate() {
        let mut face = Face::quad(&square(), UP, [0, 1, 2, 3], 0, Shading::Level(0)).unwrap();
        face.set_color_index(4).unwrap();
        face.set_shading(Shading::Directional).unwrap();
        assert_eq!(face.color_index(), 4);
        assert_eq!(face.shading(), 7);

        assert!(face.set_color_index(MAX_COLORS).is_err());
        assert!(face.set_shading(Shading::Level(9)).is_err());
        assert_eq!(face.color_index(), 4);
        assert_eq!(face.shading_mode(), Shading::Directional);
    }

    #[test]
    fn directional_shading_follows_normal() {
        assert_eq!(Shading::Directional.resolve(Fixed::ONE), 7);
        assert_eq!(Shading::Directional.resolve(-Fixed::ONE), 7);
        assert_eq!(Shading::Directional.resolve(Fixed::from_f64(0.25)), 2);
        assert_eq!(Shading::Directional.resolve(Fixed::ZERO), 0);
    }

    #[test]
    fn model_item_validation() {
        let vertices = square();
        let face = Face::quad(&vertices, UP, [0, 1, 2, 3], 0, Shading::Level(0)).unwrap();
        assert_eq!(
            ModelItem::new(Vec::new(), vec![face.clone()]).unwrap_err(),
            ContentError::NoVertices
        );
        assert_eq!(
            ModelItem::new(vertices.clone(), Vec::new()).unwrap_err(),
            ContentError::NoFaces
        );
        let item = ModelItem::new(vertices, vec![face.clone()])
            .unwrap()
            .with_collision_face(face)
            .unwrap();
        assert!(item.collision_face().is_some());
        assert!(item.vertical_cylinder().is_none());
    }

    #[test]
    fn cylinder_radius_must_be_positive() {
        assert_eq!(
            VerticalCylinder::new(Fixed::ZERO, Fixed::ZERO, -1).unwrap_err(),
            ContentError::InvalidRadius(-1)
        );
    }
}
