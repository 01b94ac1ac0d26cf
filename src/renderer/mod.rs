//! Rendering layer.
//!
//! *Nothing here touches pixels.* Each frame [`Models::update`] projects the
//! visible models, sorts their faces back to front and hands per-row spans to
//! [`ShapeGroups`], which encodes them as hardware sprite attributes. A
//! desktop front-end can paint the committed rows with [`Software`].

mod hw;
mod models;
mod projection;
mod scanline;
mod shape_groups;
mod software;

pub use hw::{
    ATTR0_HIDE, AffineMat, Attr0Flags, BppMode, Color, GbaSprites, MAX_AFFINE_MATS,
    SpriteAttributes, SpriteHardware, SpriteShape, SpriteSize,
};
pub use models::{ModelHandle, ModelSource, Models, Primitive, RenderedPrimitive, SpriteHandle};
pub use projection::Projector;
pub use scanline::{Hline, PolygonBounds, fill_polygon};
pub use shape_groups::{LineEntry, MAX_PALETTES, PALETTE_SIZE, ShapeGroups, TILES_PER_COLOR};
pub use software::{Rgba, Software};

/*──────────────────────────── constants ───────────────────────────*/

pub const DISPLAY_WIDTH: i32 = 240;
pub const DISPLAY_HEIGHT: i32 = 160;

/// Projection scale is `2^FOCAL_LENGTH_SHIFT / depth`; 8 maps one world
/// unit to one pixel at a depth of 256.
pub const FOCAL_LENGTH_SHIFT: u32 = 8;

/// Smallest raw view depth a vertex may have (24 world units).
pub const NEAR_PLANE: i32 = 24 * 256 * 16;

/// Side of a billboard sprite, in pixels.
pub const SPRITE_SIZE: i32 = 64;

pub const MAX_STATIC_MODELS: usize = 48;
pub const MAX_DYNAMIC_MODELS: usize = 32;
pub const MAX_SPRITES: usize = 8;
pub const MAX_VERTICES: usize = 640;
pub const MAX_FACES: usize = 256;

/// Hardware sprite slots available on one scanline.
pub const MAX_HDMA_SPRITES: usize = 24;
