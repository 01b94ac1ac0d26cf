//! Static-model selection: which stage models reach the renderer this frame.

use crate::math::Fixed;
use crate::renderer::{MAX_STATIC_MODELS, Models, Projector};
use crate::world::{Camera3d, ModelItem, Stage, cell_of};

/// Highest camera position the visible-cell radius is sized for.
pub const MAX_CAMERA_Y: i32 = 256;

pub struct Foreground<'a> {
    static_items: Vec<&'a ModelItem>,
}

impl Default for Foreground<'_> {
    fn default() -> Self {
        Self {
            static_items: Vec::with_capacity(MAX_STATIC_MODELS),
        }
    }
}

impl<'a> Foreground<'a> {
    /// Creates the foreground and loads the first static model list.
    pub fn new(stage: &'a Stage, camera: &Camera3d, models: &mut Models<'a>) -> Self {
        let mut foreground = Self::default();
        foreground.update(stage, camera, models);
        foreground
    }

    /// Static models picked by the last [`update`](Self::update).
    #[inline]
    pub fn static_items(&self) -> &[&'a ModelItem] {
        &self.static_items
    }

    /// Collects the models visible from the camera's cell whose cylinder
    /// reaches the screen, farthest-registered first, and hands them to
    /// `models`.
    pub fn update(&mut self, stage: &'a Stage, camera: &Camera3d, models: &mut Models<'a>) {
        let position = camera.position();
        assert!(
            position.y <= Fixed::from_int(MAX_CAMERA_Y),
            "camera too high: {}",
            position.y
        );
        let Some((column, row)) = cell_of(position) else {
            panic!("camera outside the stage grid: {position:?}");
        };

        let projector = Projector::new(camera);
        let items = stage.model_items();
        self.static_items.clear();

        for &model_index in stage.visible_model_grid().cell(column, row).iter().rev() {
            let item = &items[model_index as usize];
            if let Some(cylinder) = item.vertical_cylinder() {
                if !projector.cylinder_visible(cylinder) {
                    continue;
                }
            }
            self.static_items.push(item);
        }

        assert!(
            self.static_items.len() <= MAX_STATIC_MODELS,
            "too many static models: {}",
            self.static_items.len()
        );
        log::trace!(
            "foreground: cell {column},{row}, {} static models",
            self.static_items.len()
        );
        models.set_static_model_items(&self.static_items);
    }
}
