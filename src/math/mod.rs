mod fixed;
mod lut;
mod point;

pub use fixed::{Fixed, FixedT, RasterFixed};
pub use lut::{
    ANGLE_TURN, DIV_LUT_PRECISION, DIV_LUT_SIZE, SIN_LUT_SIZE, cos, div_lut, lut_division,
    reciprocal, sin, sin_lut,
};
pub use point::{Point3d, Vertex3d};
