//! Model/sprite pools and the per-frame polygon pipeline.
//!
//! 1. Project every vertex of every static then dynamic model. A model with
//!    any vertex in front of the near plane is skipped whole.
//! 2. Keep faces whose normal points at the camera.
//! 3. Drop faces and sprites whose screen box misses the display.
//! 4. Sort by depth, farthest first; ties keep insertion order.
//! 5. Rasterise faces into spans and queue everything in [`ShapeGroups`].

use glam::IVec2;

use super::hw::{
    Attr0Flags, BppMode, Color, SpriteAttributes, SpriteHardware, SpriteShape, SpriteSize,
};
use super::projection::Projector;
use super::scanline::{Hline, PolygonBounds, fill_polygon};
use super::shape_groups::ShapeGroups;
use super::{
    DISPLAY_HEIGHT, MAX_DYNAMIC_MODELS, MAX_FACES, MAX_SPRITES, MAX_STATIC_MODELS, MAX_VERTICES,
};
use crate::math::{Fixed, Point3d, Vertex3d};
use crate::world::{Camera3d, Face, Model3d, ModelItem, RigidTransform, Sprite3d, Sprite3dItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModelHandle(u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(u8);

impl ModelHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SpriteHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a rendered face came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Index into the current static model list.
    Static(u16),
    Dynamic(ModelHandle),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Face { source: ModelSource, face_index: u16 },
    Sprite(SpriteHandle),
}

/// One primitive queued by the last frame, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedPrimitive {
    pub primitive: Primitive,
    pub projected_z: i32,
}

/// A face that passed the back-face test.
struct ValidFace<'a> {
    face: &'a Face,
    source: ModelSource,
    face_index: u16,
    first_vertex: u16,
    shading: u8,
    projected_z: i32,
}

impl ValidFace<'_> {
    /// Projected ring of the face, and its vertex count.
    #[inline]
    fn points(&self, projected: &[IVec2]) -> ([IVec2; 4], usize) {
        let first = self.first_vertex as usize;
        let points = self.face.indices().map(|i| projected[first + i]);
        (points, self.face.vertex_count())
    }
}

enum Candidate {
    Face {
        valid_index: u16,
        bounds: PolygonBounds,
    },
    Sprite {
        handle: SpriteHandle,
        top_y: i32,
        attributes: SpriteAttributes,
    },
}

pub struct Models<'a> {
    static_items: Vec<&'a ModelItem>,
    dynamic_models: [Option<Model3d<'a>>; MAX_DYNAMIC_MODELS],
    sprites: [Option<Sprite3d<'a>>; MAX_SPRITES],
    shape_groups: ShapeGroups,

    /* per-frame scratch, reset every update */
    projected: Vec<IVec2>,
    valid_faces: Vec<ValidFace<'a>>,
    candidates: Vec<Candidate>,
    depths: Vec<i32>,
    order: Vec<u16>,
    hlines: Box<[Hline; DISPLAY_HEIGHT as usize]>,
    rendered: Vec<RenderedPrimitive>,
}

impl Default for Models<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Models<'a> {
    pub fn new() -> Self {
        let max_candidates = MAX_FACES + MAX_SPRITES;
        Self {
            static_items: Vec::with_capacity(MAX_STATIC_MODELS),
            dynamic_models: std::array::from_fn(|_| None),
            sprites: std::array::from_fn(|_| None),
            shape_groups: ShapeGroups::new(),
            projected: Vec::with_capacity(MAX_VERTICES),
            valid_faces: Vec::with_capacity(MAX_FACES),
            candidates: Vec::with_capacity(max_candidates),
            depths: Vec::with_capacity(max_candidates),
            order: Vec::with_capacity(max_candidates),
            hlines: Box::new([Hline::default(); DISPLAY_HEIGHT as usize]),
            rendered: Vec::with_capacity(max_candidates),
        }
    }

    /*────────────────────────── static list ────────────────────────*/

    #[inline]
    pub fn static_model_items(&self) -> &[&'a ModelItem] {
        &self.static_items
    }

    pub fn set_static_model_items(&mut self, items: &[&'a ModelItem]) {
        assert!(
            items.len() <= MAX_STATIC_MODELS,
            "too many static models: {}",
            items.len()
        );
        self.static_items.clear();
        self.static_items.extend_from_slice(items);
    }

    /*──────────────────────── dynamic models ───────────────────────*/

    /// Places `item` in the lowest free slot.
    pub fn create_dynamic_model(&mut self, item: &'a ModelItem) -> ModelHandle {
        let Some(slot) = self.dynamic_models.iter().position(Option::is_none) else {
            panic!("no more dynamic models available");
        };
        self.dynamic_models[slot] = Some(Model3d::new(item));
        ModelHandle(slot as u8)
    }

    pub fn destroy_dynamic_model(&mut self, handle: ModelHandle) {
        let slot = &mut self.dynamic_models[handle.index()];
        assert!(slot.is_some(), "dynamic model not found: {}", handle.index());
        *slot = None;
    }

    pub fn dynamic_model(&self, handle: ModelHandle) -> &Model3d<'a> {
        match &self.dynamic_models[handle.index()] {
            Some(model) => model,
            None => panic!("dynamic model not found: {}", handle.index()),
        }
    }

    pub fn dynamic_model_mut(&mut self, handle: ModelHandle) -> &mut Model3d<'a> {
        match &mut self.dynamic_models[handle.index()] {
            Some(model) => model,
            None => panic!("dynamic model not found: {}", handle.index()),
        }
    }

    pub fn dynamic_models_count(&self) -> usize {
        self.dynamic_models.iter().flatten().count()
    }

    /*─────────────────────────── sprites ───────────────────────────*/

    pub fn create_sprite(&mut self, item: &'a Sprite3dItem) -> SpriteHandle {
        let Some(slot) = self.sprites.iter().position(Option::is_none) else {
            panic!("no more sprites available");
        };
        self.sprites[slot] = Some(Sprite3d::new(item));
        SpriteHandle(slot as u8)
    }

    pub fn destroy_sprite(&mut self, handle: SpriteHandle) {
        let slot = &mut self.sprites[handle.index()];
        assert!(slot.is_some(), "sprite not found: {}", handle.index());
        *slot = None;
    }

    pub fn sprite(&self, handle: SpriteHandle) -> &Sprite3d<'a> {
        match &self.sprites[handle.index()] {
            Some(sprite) => sprite,
            None => panic!("sprite not found: {}", handle.index()),
        }
    }

    pub fn sprite_mut(&mut self, handle: SpriteHandle) -> &mut Sprite3d<'a> {
        match &mut self.sprites[handle.index()] {
            Some(sprite) => sprite,
            None => panic!("sprite not found: {}", handle.index()),
        }
    }

    /*─────────────────────────── output ────────────────────────────*/

    pub fn load_colors(&mut self, colors: &[Color]) {
        self.shape_groups.load_colors(colors);
    }

    pub fn set_fade(&mut self, color: Color, intensity: Fixed) {
        self.shape_groups.set_fade(color, intensity);
    }

    #[inline]
    pub fn shape_groups(&self) -> &ShapeGroups {
        &self.shape_groups
    }

    /// Primitives queued by the last `update`, farthest first.
    #[inline]
    pub fn rendered(&self) -> &[RenderedPrimitive] {
        &self.rendered
    }

    /// Renders one frame and commits it to the sprite table.
    pub fn update(&mut self, camera: &Camera3d, hw: &mut impl SpriteHardware) {
        self.render(camera, hw);
        self.shape_groups.update(hw);
    }

    fn render(&mut self, camera: &Camera3d, hw: &mut impl SpriteHardware) {
        let projector = Projector::new(camera);
        let camera_position = *camera.position();

        let Self {
            static_items,
            dynamic_models,
            sprites,
            shape_groups,
            projected,
            valid_faces,
            candidates,
            depths,
            order,
            hlines,
            rendered,
        } = self;

        projected.clear();
        valid_faces.clear();
        candidates.clear();
        depths.clear();
        order.clear();
        rendered.clear();

        /*──── static models: world-space vertices ────*/
        for (model_index, &item) in static_items.iter().enumerate() {
            let first_vertex = projected.len();
            let points = item.vertices().iter().map(|v| *v.point());
            if !project_model(&projector, points, projected) {
                continue;
            }
            for (face_index, face) in item.faces().iter().enumerate() {
                let vr = *face.centroid() - camera_position;
                if vr.safe_dot_product(face.normal().point()) < Fixed::ZERO {
                    push_valid_face(
                        valid_faces,
                        ValidFace {
                            face,
                            source: ModelSource::Static(model_index as u16),
                            face_index: face_index as u16,
                            first_vertex: first_vertex as u16,
                            shading: face.shading(),
                            projected_z: -vr.y.data(),
                        },
                    );
                }
            }
        }

        /*──── dynamic models: rotated on the fly ────*/
        for (slot, model) in dynamic_models.iter_mut().enumerate() {
            let Some(model) = model else { continue };
            model.update();
            let item = model.item();
            let first_vertex = projected.len();
            let points = item.vertices().iter().map(|v| model.transform(v));
            if !project_model(&projector, points, projected) {
                continue;
            }
            for (face_index, face) in item.faces().iter().enumerate() {
                let centroid = model.transform(&Vertex3d::new(*face.centroid()));
                let normal = model.rotate(face.normal());
                let vr = centroid - camera_position;
                if vr.safe_dot_product(&normal) < Fixed::ZERO {
                    push_valid_face(
                        valid_faces,
                        ValidFace {
                            face,
                            source: ModelSource::Dynamic(ModelHandle(slot as u8)),
                            face_index: face_index as u16,
                            first_vertex: first_vertex as u16,
                            shading: model.face_shading(face_index).resolve(normal.y),
                            projected_z: -vr.y.data(),
                        },
                    );
                }
            }
        }

        /*──── screen-box cull ────*/
        for (valid_index, valid) in valid_faces.iter().enumerate() {
            let (points, count) = valid.points(projected);
            let bounds = PolygonBounds::of(&points[..count]);
            if bounds.on_screen() {
                candidates.push(Candidate::Face {
                    valid_index: valid_index as u16,
                    bounds,
                });
                depths.push(valid.projected_z);
            }
        }

        /*──── sprites ────*/
        for (slot, sprite) in sprites.iter().enumerate() {
            let Some(sprite) = sprite else { continue };
            let Some((corner, sprite_scale, vcz)) = projector.project_sprite(sprite.position())
            else {
                continue;
            };
            let affine_scale = Fixed::from_data(sprite_scale).unsafe_multiplication(sprite.scale());
            if affine_scale <= Fixed::ZERO {
                continue;
            }
            let item = sprite.item();
            hw.set_affine_mat(
                item.affine_mat_id,
                affine_scale,
                sprite_rotation(camera.phi(), sprite.theta()),
            );
            let attributes = SpriteAttributes {
                attr0: hw.first_attributes(
                    corner.y,
                    SpriteShape::Square,
                    BppMode::Bpp4,
                    Attr0Flags::AFFINE | Attr0Flags::MOSAIC,
                ),
                attr1: hw.affine_second_attributes(corner.x, SpriteSize::Huge, item.affine_mat_id),
                attr2: hw.third_attributes(item.tiles_id, item.palette_id, 3),
            };
            candidates.push(Candidate::Sprite {
                handle: SpriteHandle(slot as u8),
                top_y: corner.y,
                attributes,
            });
            depths.push(vcz);
        }

        /*──── sort: farthest first, stable on ties ────*/
        order.extend(0..candidates.len() as u16);
        order.sort_unstable_by(|&a, &b| {
            depths[b as usize]
                .cmp(&depths[a as usize])
                .then(a.cmp(&b))
        });

        if !order.is_empty() {
            shape_groups.enable_drawing();
        }

        /*──── emit ────*/
        for &index in order.iter() {
            let index = index as usize;
            let primitive = match &candidates[index] {
                Candidate::Face {
                    valid_index,
                    bounds,
                } => {
                    let valid = &valid_faces[*valid_index as usize];
                    let (points, count) = valid.points(projected);
                    let rows = fill_polygon(&points[..count], bounds, &mut hlines[..]);
                    shape_groups.add_hlines(
                        rows,
                        valid.face.color_index(),
                        valid.shading,
                        &hlines[..],
                    );
                    Primitive::Face {
                        source: valid.source,
                        face_index: valid.face_index,
                    }
                }
                Candidate::Sprite {
                    handle,
                    top_y,
                    attributes,
                } => {
                    shape_groups.add_sprite(*top_y, *attributes);
                    Primitive::Sprite(*handle)
                }
            };
            rendered.push(RenderedPrimitive {
                primitive,
                projected_z: depths[index],
            });
        }

        log::trace!(
            "frame: {} vertices, {} valid faces, {} primitives",
            projected.len(),
            valid_faces.len(),
            rendered.len()
        );
    }
}

/// Appends the screen positions of `points`; on a near-plane failure the
/// partial output is rolled back and `false` returned.
fn project_model(
    projector: &Projector,
    points: impl ExactSizeIterator<Item = Point3d>,
    projected: &mut Vec<IVec2>,
) -> bool {
    let first = projected.len();
    assert!(
        first + points.len() <= MAX_VERTICES,
        "too many vertices: {}",
        first + points.len()
    );
    for point in points {
        match projector.project(&point) {
            Some(screen) => projected.push(screen),
            None => {
                projected.truncate(first);
                return false;
            }
        }
    }
    true
}

#[inline]
fn push_valid_face<'a>(valid_faces: &mut Vec<ValidFace<'a>>, face: ValidFace<'a>) {
    assert!(valid_faces.len() < MAX_FACES, "too many faces");
    valid_faces.push(face);
}

/// Affine rotation in degrees for a billboard seen from a camera at `phi`.
fn sprite_rotation(camera_phi: Fixed, theta: Fixed) -> Fixed {
    let degrees = (camera_phi + theta).right_shift_integer() * 360;
    let mut rotation = Fixed::from_data(degrees >> 4);
    if rotation >= Fixed::from_int(360) {
        rotation -= Fixed::from_int(360);
    }
    rotation
}
