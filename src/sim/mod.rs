//! Frame-level game logic on top of the renderer: static-model selection,
//! collisions and the scene driver.

mod collision;
mod foreground;
mod scene;

pub use collision::{
    CollisionPoints, CollisionTarget, PLAYER_COLLISION_OFFSETS, check_collision, is_slow_ground,
    player_collision_points,
};
pub use foreground::{Foreground, MAX_CAMERA_Y};
pub use scene::{DEFAULT_CAMERA_HEIGHT, Scene};
