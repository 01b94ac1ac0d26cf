//! CPU painter for the committed scanline entries.
//!
//! Fills a `0x00RRGGBB` frame-buffer by replaying each row's entries far to
//! near, which gives the same result as the hardware's slot priority. Used
//! by the desktop viewer and by tests that want to look at pixels.

use super::hw::Color;
use super::shape_groups::{LineEntry, MAX_PALETTES, PALETTE_SIZE, ShapeGroups};
use super::{DISPLAY_HEIGHT, DISPLAY_WIDTH, SPRITE_SIZE};

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

const WIDTH: usize = DISPLAY_WIDTH as usize;
const HEIGHT: usize = DISPLAY_HEIGHT as usize;

pub struct Software {
    scratch: Vec<Rgba>,
    background: Rgba,
    sprite_color: Rgba,
}

impl Default for Software {
    fn default() -> Self {
        Self::new(Color::new(6, 12, 6), Color::new(31, 24, 4))
    }
}

impl Software {
    /// `background` fills rows before any entry; billboards, which carry no
    /// tile data here, are drawn as `sprite_color` boxes.
    pub fn new(background: Color, sprite_color: Color) -> Self {
        Self {
            scratch: vec![0; WIDTH * HEIGHT],
            background: background.to_rgb888(),
            sprite_color: sprite_color.to_rgb888(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[inline]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.scratch[y * WIDTH + x]
    }

    /// Paints every row and loans the finished buffer to `submit`.
    pub fn draw_frame<F>(&mut self, groups: &ShapeGroups, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        let palettes: [[Rgba; PALETTE_SIZE]; MAX_PALETTES] =
            std::array::from_fn(|shading| groups.faded_palette(shading).map(Color::to_rgb888));

        for (y, row) in self.scratch.chunks_exact_mut(WIDTH).enumerate() {
            row.fill(self.background);
            for entry in groups.line(y) {
                match *entry {
                    LineEntry::Span {
                        xl,
                        xr,
                        color_index,
                        shading,
                    } => {
                        let color = palettes[shading as usize][color_index as usize + 1];
                        row[xl as usize..=xr as usize].fill(color);
                    }
                    LineEntry::Sprite(attributes) => {
                        // 9-bit screen x wraps to negative past 255.
                        let mut x = attributes.x();
                        if x > 255 {
                            x -= 512;
                        }
                        let first = x.max(0) as usize;
                        let last = (x + SPRITE_SIZE - 1).min(DISPLAY_WIDTH - 1);
                        if last >= 0 && first <= last as usize {
                            row[first..=last as usize].fill(self.sprite_color);
                        }
                    }
                }
            }
        }
        submit(&self.scratch, WIDTH, HEIGHT);
    }
}
