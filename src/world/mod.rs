mod camera;
mod grid;
mod instance;
mod model;
mod stage;

pub use camera::{Camera3d, MIN_CAMERA_Y};

pub use grid::{
    CELL_SIZE, GRID_COLUMNS, GRID_ROWS, GridError, MAX_CELL_MODELS, MAX_STAGE_MODELS,
    MAX_VISIBLE_MODELS_PER_CELL, ModelGrid, VISIBLE_CELLS_RADIUS, VisibleModelGrid, cell_of,
};

pub use instance::{Model3d, RigidTransform, RotationTerms, Sprite3d, Sprite3dItem, wrap_angle};

pub use model::{
    ContentError, Face, MAX_COLORS, MAX_MODEL_VERTICES, MAX_SHADING, ModelItem, Shading,
    VerticalCylinder,
};

pub use stage::{GROUND_TILE_SIZE, GroundMap, Stage, StageError};
