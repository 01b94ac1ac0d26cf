//! Sine and reciprocal lookup tables, built lazily on first use.

use once_cell::sync::Lazy;

use super::{Fixed, FixedT};

/// Number of angle units in a full turn.
pub const ANGLE_TURN: i32 = 65536;
pub const SIN_LUT_SIZE: usize = ANGLE_TURN as usize;

pub const DIV_LUT_SIZE: usize = 4096;
pub const DIV_LUT_PRECISION: u32 = 24;

/// `round(sin(2πa / 65536) · 4096)` for every angle unit.
static SIN_LUT: Lazy<Box<[i16]>> = Lazy::new(|| {
    (0..SIN_LUT_SIZE)
        .map(|a| {
            let radians = (a as f64) * std::f64::consts::TAU / SIN_LUT_SIZE as f64;
            (radians.sin() * (1 << Fixed::PRECISION) as f64).round() as i16
        })
        .collect()
});

/// `2^24 / d`, with denominators 0 and 1 mapped to `2^24`.
static DIV_LUT: Lazy<Box<[u32]>> = Lazy::new(|| {
    let one = 1u32 << DIV_LUT_PRECISION;
    (0..DIV_LUT_SIZE as u32)
        .map(|d| if d < 2 { one } else { one / d })
        .collect()
});

#[inline]
pub fn sin_lut() -> &'static [i16] {
    &SIN_LUT
}

#[inline]
pub fn div_lut() -> &'static [u32] {
    &DIV_LUT
}

/// Sine of an angle in `[0, 65536)` units.
#[inline]
pub fn sin(angle: i32) -> Fixed {
    assert!((0..ANGLE_TURN).contains(&angle), "invalid angle: {angle}");
    Fixed::from_data(SIN_LUT[angle as usize] as i32)
}

#[inline]
pub fn cos(angle: i32) -> Fixed {
    assert!((0..ANGLE_TURN).contains(&angle), "invalid angle: {angle}");
    sin((angle + ANGLE_TURN / 4) & (ANGLE_TURN - 1))
}

/// `2^24 / denominator` from the table.
#[inline]
pub fn reciprocal(denominator: i32) -> u32 {
    assert!(
        (0..DIV_LUT_SIZE as i32).contains(&denominator),
        "reciprocal denominator out of range: {denominator}"
    );
    DIV_LUT[denominator as usize]
}

/// `numerator / denominator` as a `FixedT<P>`, using the reciprocal table
/// instead of a hardware divide.
#[inline]
pub fn lut_division<const P: u32>(numerator: i32, denominator: i32) -> FixedT<P> {
    let product = numerator as i64 * reciprocal(denominator) as i64;
    FixedT::from_data((product >> (DIV_LUT_PRECISION - P)) as i32)
}
