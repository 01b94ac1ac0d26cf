//! Fixed-point 3D renderer that draws flat-shaded polygons as per-scanline
//! hardware sprite spans, plus the stage/foreground logic of a top-down
//! racing game built on top of it.

pub mod content;
pub mod math;
pub mod renderer;
pub mod sim;
pub mod world;
