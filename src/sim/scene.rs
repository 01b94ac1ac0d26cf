//! Per-frame driver tying the stage, camera and renderer together.

use super::collision::{CollisionTarget, check_collision};
use super::foreground::Foreground;
use crate::math::{Fixed, Point3d};
use crate::renderer::{Models, SpriteHardware};
use crate::world::{Camera3d, Stage};

/// Camera height above the stage's start position.
pub const DEFAULT_CAMERA_HEIGHT: i32 = 128;

/// Owns the camera, the model pools and the foreground of one stage.
///
/// Static-model selection and collision checks are expensive enough to
/// alternate: even frames reload the foreground, odd frames test the
/// target for collisions. Models are rendered every frame.
pub struct Scene<'a> {
    stage: &'a Stage,
    camera: Camera3d,
    models: Models<'a>,
    foreground: Foreground<'a>,
    frame: u32,
}

impl<'a> Scene<'a> {
    pub fn new(stage: &'a Stage) -> Self {
        let start = *stage.start_position();
        let camera = Camera3d::new(
            start + Point3d::new(Fixed::ZERO, Fixed::from_int(DEFAULT_CAMERA_HEIGHT), Fixed::ZERO),
            stage.start_phi(),
        );
        let mut models = Models::new();
        models.load_colors(stage.model_colors());
        let foreground = Foreground::new(stage, &camera, &mut models);
        Self {
            stage,
            camera,
            models,
            foreground,
            frame: 0,
        }
    }

    #[inline]
    pub fn stage(&self) -> &'a Stage {
        self.stage
    }

    #[inline]
    pub fn camera(&self) -> &Camera3d {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera3d {
        &mut self.camera
    }

    #[inline]
    pub fn models(&self) -> &Models<'a> {
        &self.models
    }

    #[inline]
    pub fn models_mut(&mut self) -> &mut Models<'a> {
        &mut self.models
    }

    #[inline]
    pub fn foreground(&self) -> &Foreground<'a> {
        &self.foreground
    }

    /// Frames run so far.
    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Runs one frame. Returns `true` if `target` crashed this frame.
    pub fn update(
        &mut self,
        hw: &mut impl SpriteHardware,
        target: Option<&mut dyn CollisionTarget>,
    ) -> bool {
        let mut crashed = false;
        if self.frame % 2 == 0 {
            self.foreground.update(self.stage, &self.camera, &mut self.models);
        } else if let Some(target) = target {
            crashed = check_collision(self.stage, target);
        }

        self.models.update(&self.camera, hw);
        self.frame = self.frame.wrapping_add(1);
        crashed
    }
}
