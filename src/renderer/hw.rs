//! Sprite attribute encoding and the hardware seam the renderer talks to.

use bitflags::bitflags;

use crate::math::Fixed;

/// Mode bits that hide a sprite slot.
pub const ATTR0_HIDE: u16 = 0x0200;

bitflags! {
    /// Optional `attr0` features.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Attr0Flags: u16 {
        const AFFINE      = 0x0100;
        const DOUBLE_SIZE = 0x0200;
        const BLENDING    = 0x0400;
        const WINDOW      = 0x0800;
        const MOSAIC      = 0x1000;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum SpriteShape {
    Square = 0,
    Wide = 1,
    Tall = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum BppMode {
    Bpp4 = 0,
    Bpp8 = 1,
}

/// Square sprite sizes: 8, 16, 32 and 64 pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum SpriteSize {
    Small = 0,
    Normal = 1,
    Big = 2,
    Huge = 3,
}

impl SpriteSize {
    #[inline]
    pub const fn pixels(self) -> i32 {
        8 << (self as i32)
    }

    /// Tiles an 8x8-tile square sprite of this size occupies.
    #[inline]
    pub const fn tiles(self) -> u16 {
        1 << (2 * self as u16)
    }
}

/// One hardware sprite slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteAttributes {
    pub attr0: u16,
    pub attr1: u16,
    pub attr2: u16,
}

impl SpriteAttributes {
    pub const HIDDEN: Self = Self {
        attr0: ATTR0_HIDE,
        attr1: 0,
        attr2: 0,
    };

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.attr0 & 0x0300 == ATTR0_HIDE
    }

    #[inline]
    pub fn y(&self) -> i32 {
        (self.attr0 & 255) as i32
    }

    #[inline]
    pub fn x(&self) -> i32 {
        (self.attr1 & 511) as i32
    }

    #[inline]
    pub fn size(&self) -> SpriteSize {
        match self.attr1 >> 14 {
            0 => SpriteSize::Small,
            1 => SpriteSize::Normal,
            2 => SpriteSize::Big,
            _ => SpriteSize::Huge,
        }
    }

    #[inline]
    pub fn tiles_id(&self) -> u16 {
        self.attr2 & 0x03FF
    }

    #[inline]
    pub fn palette_id(&self) -> u8 {
        (self.attr2 >> 12) as u8
    }
}

/*───────────────────────────── colors ─────────────────────────────*/

/// 15-bit BGR color, 5 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(u16);

impl Color {
    pub const BLACK: Self = Self(0);

    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self((red & 31) | ((green & 31) << 5) | ((blue & 31) << 10))
    }

    #[inline]
    pub const fn data(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn red(self) -> u16 {
        self.0 & 31
    }

    #[inline]
    pub const fn green(self) -> u16 {
        (self.0 >> 5) & 31
    }

    #[inline]
    pub const fn blue(self) -> u16 {
        (self.0 >> 10) & 31
    }

    /// Scales every channel by `brightness / 32`.
    #[inline]
    pub const fn scaled(self, brightness: u16) -> Self {
        Self::new(
            self.red() * brightness / 32,
            self.green() * brightness / 32,
            self.blue() * brightness / 32,
        )
    }

    /// Linear blend towards `target`; `intensity` in `[0, 1]`.
    pub fn blend(self, target: Color, intensity: Fixed) -> Self {
        let mix = |a: u16, b: u16| -> u16 {
            let (a, b) = (a as i32, b as i32);
            (a + (Fixed::from_int(b - a).unsafe_multiplication(intensity)).integer()) as u16
        };
        Self::new(
            mix(self.red(), target.red()),
            mix(self.green(), target.green()),
            mix(self.blue(), target.blue()),
        )
    }

    /// `0x00RRGGBB` for a desktop frame-buffer.
    #[inline]
    pub fn to_rgb888(self) -> u32 {
        let expand = |c: u16| ((c << 3) | (c >> 2)) as u32;
        (expand(self.red()) << 16) | (expand(self.green()) << 8) | expand(self.blue())
    }
}

/*──────────────────────── hardware seam ───────────────────────────*/

/// Sprite hardware the renderer encodes for.
///
/// The provided methods implement the GBA OAM bit layout; an implementor
/// only has to own the affine matrices.
pub trait SpriteHardware {
    fn first_attributes(&self, y: i32, shape: SpriteShape, bpp: BppMode, flags: Attr0Flags) -> u16 {
        ((y & 255) as u16) | flags.bits() | ((bpp as u16) << 13) | ((shape as u16) << 14)
    }

    fn second_attributes(
        &self,
        x: i32,
        size: SpriteSize,
        horizontal_flip: bool,
        vertical_flip: bool,
    ) -> u16 {
        ((x & 511) as u16)
            | ((horizontal_flip as u16) << 12)
            | ((vertical_flip as u16) << 13)
            | ((size as u16) << 14)
    }

    fn affine_second_attributes(&self, x: i32, size: SpriteSize, affine_mat_id: u8) -> u16 {
        ((x & 511) as u16) | ((affine_mat_id as u16) << 9) | ((size as u16) << 14)
    }

    fn third_attributes(&self, tiles_id: u16, palette_id: u8, bg_priority: u8) -> u16 {
        tiles_id | ((palette_id as u16) << 12) | ((bg_priority as u16) << 10)
    }

    /// Points affine matrix `affine_mat_id` at the given scale and rotation
    /// (degrees, `[0, 360)`).
    fn set_affine_mat(&mut self, affine_mat_id: u8, scale: Fixed, rotation_angle: Fixed);
}

pub const MAX_AFFINE_MATS: usize = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AffineMat {
    pub scale: Fixed,
    pub rotation_angle: Fixed,
}

/// In-memory stand-in for OAM affine matrices.
#[derive(Debug)]
pub struct GbaSprites {
    affine_mats: [AffineMat; MAX_AFFINE_MATS],
}

impl Default for GbaSprites {
    fn default() -> Self {
        Self {
            affine_mats: [AffineMat {
                scale: Fixed::ONE,
                rotation_angle: Fixed::ZERO,
            }; MAX_AFFINE_MATS],
        }
    }
}

impl GbaSprites {
    pub fn affine_mat(&self, affine_mat_id: u8) -> &AffineMat {
        &self.affine_mats[affine_mat_id as usize]
    }
}

impl SpriteHardware for GbaSprites {
    fn set_affine_mat(&mut self, affine_mat_id: u8, scale: Fixed, rotation_angle: Fixed) {
        assert!(
            (affine_mat_id as usize) < MAX_AFFINE_MATS,
            "invalid affine mat id: {affine_mat_id}"
        );
        assert!(
            rotation_angle >= Fixed::ZERO && rotation_angle < Fixed::from_int(360),
            "invalid rotation angle: {rotation_angle}"
        );
        self.affine_mats[affine_mat_id as usize] = AffineMat {
            scale,
            rotation_angle,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_bit_layout() {
        let hw = GbaSprites::default();
        let attr0 = hw.first_attributes(-2, SpriteShape::Square, BppMode::Bpp4, Attr0Flags::MOSAIC);
        assert_eq!(attr0, 254 | 0x1000);
        let attr1 = hw.second_attributes(-1, SpriteSize::Huge, false, true);
        assert_eq!(attr1, 511 | 0x2000 | 0xC000);
        let attr1 = hw.affine_second_attributes(10, SpriteSize::Big, 3);
        assert_eq!(attr1, 10 | (3 << 9) | 0x8000);
        let attr2 = hw.third_attributes(85, 7, 3);
        assert_eq!(attr2, 85 | (7 << 12) | (3 << 10));
    }

    #[test]
    fn attributes_decode() {
        let hw = GbaSprites::default();
        let sprite = SpriteAttributes {
            attr0: hw.first_attributes(40, SpriteShape::Square, BppMode::Bpp4, Attr0Flags::empty()),
            attr1: hw.second_attributes(100, SpriteSize::Normal, false, false),
            attr2: hw.third_attributes(12, 5, 3),
        };
        assert_eq!((sprite.x(), sprite.y()), (100, 40));
        assert_eq!(sprite.size(), SpriteSize::Normal);
        assert_eq!((sprite.tiles_id(), sprite.palette_id()), (12, 5));
        assert!(!sprite.is_hidden());
        assert!(SpriteAttributes::HIDDEN.is_hidden());
    }

    #[test]
    fn color_channels() {
        let c = Color::new(31, 16, 1);
        assert_eq!((c.red(), c.green(), c.blue()), (31, 16, 1));
        assert_eq!(c.scaled(16), Color::new(15, 8, 0));
        assert_eq!(c.scaled(32), c);
        assert_eq!(Color::new(31, 31, 31).to_rgb888(), 0x00FF_FFFF);
    }

    #[test]
    fn color_blend() {
        let black = Color::BLACK;
        let white = Color::new(31, 31, 31);
        assert_eq!(black.blend(white, Fixed::ZERO), black);
        assert_eq!(black.blend(white, Fixed::ONE), white);
        assert_eq!(black.blend(white, Fixed::from_f64(0.5)), Color::new(15, 15, 15));
    }

    #[test]
    fn affine_mats_are_recorded() {
        let mut hw = GbaSprites::default();
        hw.set_affine_mat(2, Fixed::from_f64(0.5), Fixed::from_int(90));
        assert_eq!(hw.affine_mat(2).scale, Fixed::from_f64(0.5));
        assert_eq!(hw.affine_mat(2).rotation_angle, Fixed::from_int(90));
    }
}
