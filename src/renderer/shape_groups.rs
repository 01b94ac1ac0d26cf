//! Per-scanline packer turning spans and billboards into hardware sprite
//! attributes.
//!
//! Every row holds a list of entries in the order they were added, which is
//! farthest first. When the frame is committed the list is encoded nearest
//! first, so the nearest entry gets the lowest (highest priority) slot and
//! anything past `MAX_HDMA_SPRITES` slots is the farthest and gets dropped.
//!
//! A span of length `L` is drawn by a square sprite whose tile graphic is a
//! staircase: row `k` holds `k + 1` opaque pixels. Placing the sprite `L`
//! rows above the scanline shows exactly `L + 1` pixels on it.

use super::hw::{
    Attr0Flags, BppMode, Color, SpriteAttributes, SpriteHardware, SpriteShape, SpriteSize,
};
use super::scanline::Hline;
use super::{DISPLAY_HEIGHT, DISPLAY_WIDTH, MAX_HDMA_SPRITES, SPRITE_SIZE};
use crate::math::Fixed;
use crate::world::{MAX_COLORS, MAX_SHADING};

/// Longest span a single 64 px sprite draws.
const SPLIT_LENGTH: i32 = SPRITE_SIZE - 2;

pub const MAX_PALETTES: usize = MAX_SHADING as usize + 1;
pub const PALETTE_SIZE: usize = 16;

/// Tiles reserved per color: one staircase of every sprite size.
pub const TILES_PER_COLOR: u16 = 1 + 4 + 16 + 64;

const ROWS: usize = DISPLAY_HEIGHT as usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEntry {
    Span {
        xl: i16,
        xr: i16,
        color_index: u8,
        shading: u8,
    },
    Sprite(SpriteAttributes),
}

impl LineEntry {
    const EMPTY: Self = Self::Span {
        xl: 0,
        xr: 0,
        color_index: 0,
        shading: 0,
    };
}

/// Fixed-capacity entry lists for every row.
struct LineBuffer {
    entries: Box<[[LineEntry; MAX_HDMA_SPRITES]; ROWS]>,
    counts: [u8; ROWS],
}

impl LineBuffer {
    fn new() -> Self {
        Self {
            entries: Box::new([[LineEntry::EMPTY; MAX_HDMA_SPRITES]; ROWS]),
            counts: [0; ROWS],
        }
    }

    #[inline]
    fn line(&self, y: usize) -> &[LineEntry] {
        &self.entries[y][..self.counts[y] as usize]
    }

    /// Appends an entry; a full row forgets its farthest entry.
    /// Returns `true` if something was dropped.
    fn push(&mut self, y: usize, entry: LineEntry) -> bool {
        let count = self.counts[y] as usize;
        let row = &mut self.entries[y];
        if count == MAX_HDMA_SPRITES {
            row.copy_within(1.., 0);
            row[MAX_HDMA_SPRITES - 1] = entry;
            return true;
        }
        row[count] = entry;
        self.counts[y] += 1;
        false
    }

    fn clear(&mut self) {
        self.counts = [0; ROWS];
    }
}

type SpriteTable = Box<[[SpriteAttributes; MAX_HDMA_SPRITES]; ROWS]>;

pub struct ShapeGroups {
    building: LineBuffer,
    committed: LineBuffer,
    tables: [SpriteTable; 2],
    table_counts: [[u8; ROWS]; 2],
    front: usize,
    palettes: [[Color; PALETTE_SIZE]; MAX_PALETTES],
    fade_color: Color,
    fade_intensity: Fixed,
    drawing_enabled: bool,
    dropped: u32,
}

impl Default for ShapeGroups {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeGroups {
    pub fn new() -> Self {
        Self {
            building: LineBuffer::new(),
            committed: LineBuffer::new(),
            tables: [
                Box::new([[SpriteAttributes::HIDDEN; MAX_HDMA_SPRITES]; ROWS]),
                Box::new([[SpriteAttributes::HIDDEN; MAX_HDMA_SPRITES]; ROWS]),
            ],
            table_counts: [[0; ROWS]; 2],
            front: 0,
            palettes: [[Color::BLACK; PALETTE_SIZE]; MAX_PALETTES],
            fade_color: Color::BLACK,
            fade_intensity: Fixed::ZERO,
            drawing_enabled: false,
            dropped: 0,
        }
    }

    /*─────────────────────────── palettes ──────────────────────────*/

    /// Builds one palette per shading level. Slot 0 stays transparent and
    /// color `i` lands in slot `i + 1`, darkened to `(25 + shading) / 32`.
    pub fn load_colors(&mut self, colors: &[Color]) {
        assert!(colors.len() <= MAX_COLORS, "too many colors: {}", colors.len());
        for (shading, palette) in self.palettes.iter_mut().enumerate() {
            let brightness = 25 + shading as u16;
            palette.fill(Color::BLACK);
            for (slot, color) in palette[1..].iter_mut().zip(colors) {
                *slot = color.scaled(brightness);
            }
        }
        log::debug!("loaded {} model colors", colors.len());
    }

    #[inline]
    pub fn palettes(&self) -> &[[Color; PALETTE_SIZE]; MAX_PALETTES] {
        &self.palettes
    }

    pub fn set_fade(&mut self, color: Color, intensity: Fixed) {
        assert!(
            intensity >= Fixed::ZERO && intensity <= Fixed::ONE,
            "invalid fade intensity: {intensity}"
        );
        self.fade_color = color;
        self.fade_intensity = intensity;
    }

    #[inline]
    pub fn fade(&self) -> (Color, Fixed) {
        (self.fade_color, self.fade_intensity)
    }

    /// Palette `shading` with the current fade applied.
    pub fn faded_palette(&self, shading: usize) -> [Color; PALETTE_SIZE] {
        let palette = self.palettes[shading];
        if self.fade_intensity == Fixed::ZERO {
            return palette;
        }
        palette.map(|c| c.blend(self.fade_color, self.fade_intensity))
    }

    #[inline]
    pub fn tiles_id(color_index: usize, size: SpriteSize) -> u16 {
        let offset = match size {
            SpriteSize::Small => 0,
            SpriteSize::Normal => 1,
            SpriteSize::Big => 5,
            SpriteSize::Huge => 21,
        };
        color_index as u16 * TILES_PER_COLOR + offset
    }

    #[inline]
    pub fn palette_id(shading: u8) -> u8 {
        shading
    }

    /*─────────────────────────── per frame ─────────────────────────*/

    #[inline]
    pub fn enable_drawing(&mut self) {
        self.drawing_enabled = true;
    }

    /// Adds one span per row in `rows` (inclusive), reading `hlines[y]`.
    /// Spans are clipped to the display; rows whose span misses it are
    /// skipped.
    pub fn add_hlines(
        &mut self,
        rows: (usize, usize),
        color_index: usize,
        shading: u8,
        hlines: &[Hline],
    ) {
        let (first, last) = rows;
        for (y, hline) in hlines.iter().enumerate().take(last + 1).skip(first) {
            if hline.xl >= DISPLAY_WIDTH || hline.xr < 0 {
                continue;
            }
            let xl = hline.xl.max(0) as i16;
            let xr = hline.xr.min(DISPLAY_WIDTH - 1) as i16;

            let count = self.building.counts[y] as usize;
            if count > 0 {
                if let LineEntry::Span {
                    xl: last_xl,
                    xr: last_xr,
                    color_index: last_color,
                    shading: last_shading,
                } = &mut self.building.entries[y][count - 1]
                {
                    let touches = xl <= *last_xr + 1 && xr + 1 >= *last_xl;
                    if touches && *last_color as usize == color_index && *last_shading == shading {
                        *last_xl = (*last_xl).min(xl);
                        *last_xr = (*last_xr).max(xr);
                        continue;
                    }
                }
            }

            let entry = LineEntry::Span {
                xl,
                xr,
                color_index: color_index as u8,
                shading,
            };
            if self.building.push(y, entry) {
                self.dropped += 1;
            }
        }
    }

    /// Adds a billboard covering 64 rows from `top_y`.
    pub fn add_sprite(&mut self, top_y: i32, attributes: SpriteAttributes) {
        let first = top_y.max(0);
        let last = (top_y + SPRITE_SIZE).min(DISPLAY_HEIGHT - 1);
        for y in first..=last {
            if self.building.push(y as usize, LineEntry::Sprite(attributes)) {
                self.dropped += 1;
            }
        }
    }

    /// Entries committed by the last `update`, farthest first.
    #[inline]
    pub fn line(&self, y: usize) -> &[LineEntry] {
        self.committed.line(y)
    }

    /// Sprite slots of row `y` in the front table.
    #[inline]
    pub fn sprite_table_line(&self, y: usize) -> &[SpriteAttributes; MAX_HDMA_SPRITES] {
        &self.tables[self.front][y]
    }

    /// Commits the entries added since the last call: encodes them into the
    /// back table, hides slots the previous use of that table left behind
    /// and flips the tables.
    pub fn update(&mut self, hw: &impl SpriteHardware) {
        std::mem::swap(&mut self.building, &mut self.committed);
        self.building.clear();
        let drawing = std::mem::take(&mut self.drawing_enabled);
        if !drawing {
            self.committed.clear();
        }
        if self.dropped > 0 {
            log::trace!("{} scanline entries dropped this frame", self.dropped);
            self.dropped = 0;
        }

        let back = self.front ^ 1;
        let table = &mut self.tables[back];
        let counts = &mut self.table_counts[back];

        for y in 0..ROWS {
            let slots = &mut table[y];
            let mut used = 0;
            for entry in self.committed.line(y).iter().rev() {
                if used == MAX_HDMA_SPRITES {
                    break;
                }
                match *entry {
                    LineEntry::Sprite(attributes) => {
                        slots[used] = attributes;
                        used += 1;
                    }
                    LineEntry::Span {
                        xl,
                        xr,
                        color_index,
                        shading,
                    } => {
                        used = encode_span(
                            hw,
                            y as i32,
                            (xl as i32, xr as i32),
                            color_index as usize,
                            shading,
                            slots,
                            used,
                        );
                    }
                }
            }
            let stale = counts[y] as usize;
            if used < stale {
                slots[used..stale].fill(SpriteAttributes::HIDDEN);
            }
            counts[y] = used as u8;
        }
        self.front = back;
    }
}

#[inline]
fn span_size(length: i32) -> SpriteSize {
    if length < 8 {
        SpriteSize::Small
    } else if length < 16 {
        SpriteSize::Normal
    } else if length < 32 {
        SpriteSize::Big
    } else {
        SpriteSize::Huge
    }
}

/// Writes the sprites for one span starting at slot `used`; returns the new
/// slot count.
fn encode_span(
    hw: &impl SpriteHardware,
    y: i32,
    (mut xl, xr): (i32, i32),
    color_index: usize,
    shading: u8,
    slots: &mut [SpriteAttributes; MAX_HDMA_SPRITES],
    mut used: usize,
) -> usize {
    let size = span_size(xr - xl);
    let attr2 = hw.third_attributes(
        ShapeGroups::tiles_id(color_index, size),
        ShapeGroups::palette_id(shading),
        3,
    );
    loop {
        if used == MAX_HDMA_SPRITES {
            return used;
        }
        let length = xr - xl;
        let split = length > SPLIT_LENGTH;
        let sprite_y = y - if split { SPLIT_LENGTH } else { length };
        slots[used] = SpriteAttributes {
            attr0: hw.first_attributes(
                sprite_y,
                SpriteShape::Square,
                BppMode::Bpp4,
                Attr0Flags::MOSAIC,
            ),
            attr1: hw.second_attributes(xl, size, false, false),
            attr2,
        };
        used += 1;
        if !split {
            return used;
        }
        xl += SPLIT_LENGTH;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::hw::GbaSprites;

    fn hlines(xl: i32, xr: i32) -> Vec<Hline> {
        vec![Hline { xl, xr }; ROWS]
    }

    fn committed(groups: &mut ShapeGroups) {
        groups.enable_drawing();
        groups.update(&GbaSprites::default());
    }

    #[test]
    fn palettes_darken_per_shading() {
        let mut groups = ShapeGroups::new();
        let red = Color::new(31, 0, 0);
        groups.load_colors(&[red]);
        let palettes = groups.palettes();
        assert_eq!(palettes[0][0], Color::BLACK);
        assert_eq!(palettes[0][1], Color::new(31 * 25 / 32, 0, 0));
        assert_eq!(palettes[7][1], red);
        assert_eq!(palettes[7][2], Color::BLACK);
    }

    #[test]
    fn fade_blends_palettes() {
        let mut groups = ShapeGroups::new();
        groups.load_colors(&[Color::new(31, 31, 31)]);
        groups.set_fade(Color::BLACK, Fixed::ONE);
        assert_eq!(groups.faded_palette(7)[1], Color::BLACK);
        groups.set_fade(Color::BLACK, Fixed::ZERO);
        assert_eq!(groups.faded_palette(7)[1], Color::new(31, 31, 31));
    }

    #[test]
    #[should_panic(expected = "invalid fade intensity")]
    fn fade_intensity_is_checked() {
        ShapeGroups::new().set_fade(Color::BLACK, Fixed::from_int(2));
    }

    #[test]
    fn spans_are_encoded_as_staircase_sprites() {
        let mut groups = ShapeGroups::new();
        groups.add_hlines((10, 10), 2, 5, &hlines(100, 112));
        committed(&mut groups);

        let slots = groups.sprite_table_line(10);
        let sprite = slots[0];
        assert_eq!(sprite.y(), (10 - 12) & 255);
        assert_eq!(sprite.x(), 100);
        assert_eq!(sprite.size(), SpriteSize::Normal);
        assert_eq!(sprite.tiles_id(), 2 * TILES_PER_COLOR + 1);
        assert_eq!(sprite.palette_id(), 5);
        assert!(slots[1].is_hidden());
        assert!(groups.sprite_table_line(9)[0].is_hidden());
    }

    #[test]
    fn long_spans_are_split() {
        let mut groups = ShapeGroups::new();
        groups.add_hlines((40, 40), 0, 0, &hlines(0, 150));
        committed(&mut groups);

        let slots = groups.sprite_table_line(40);
        let xs: Vec<i32> = slots.iter().take(3).map(|s| s.x()).collect();
        assert_eq!(xs, [0, 62, 124]);
        assert!(slots[..3].iter().all(|s| s.size() == SpriteSize::Huge));
        assert_eq!(slots[0].y(), (40 - 62) & 255);
        assert_eq!(slots[2].y(), 40 - (150 - 124));
        assert!(slots[3].is_hidden());
    }

    #[test]
    fn spans_are_clipped_and_culled() {
        let mut groups = ShapeGroups::new();
        groups.add_hlines((0, 0), 0, 0, &hlines(-20, 10));
        groups.add_hlines((1, 1), 0, 0, &hlines(300, 400));
        committed(&mut groups);
        assert_eq!(
            groups.line(0),
            &[LineEntry::Span {
                xl: 0,
                xr: 10,
                color_index: 0,
                shading: 0
            }]
        );
        assert!(groups.line(1).is_empty());
    }

    #[test]
    fn touching_spans_of_same_color_merge() {
        let mut groups = ShapeGroups::new();
        groups.add_hlines((5, 5), 1, 3, &hlines(10, 20));
        groups.add_hlines((5, 5), 1, 3, &hlines(21, 30));
        groups.add_hlines((5, 5), 2, 3, &hlines(25, 40));
        committed(&mut groups);
        assert_eq!(groups.line(5).len(), 2);
        assert_eq!(
            groups.line(5)[0],
            LineEntry::Span {
                xl: 10,
                xr: 30,
                color_index: 1,
                shading: 3
            }
        );
    }

    #[test]
    fn nearest_entry_gets_first_slot() {
        let mut groups = ShapeGroups::new();
        groups.add_hlines((0, 0), 1, 0, &hlines(0, 4));
        groups.add_hlines((0, 0), 2, 0, &hlines(50, 54));
        committed(&mut groups);
        let slots = groups.sprite_table_line(0);
        assert_eq!(slots[0].x(), 50);
        assert_eq!(slots[1].x(), 0);
    }

    #[test]
    fn overflow_drops_farthest() {
        let mut groups = ShapeGroups::new();
        for i in 0..(MAX_HDMA_SPRITES as i32 + 3) {
            groups.add_hlines((0, 0), (i % 2) as usize, 0, &hlines(i * 8, i * 8 + 2));
        }
        committed(&mut groups);
        let line = groups.line(0);
        assert_eq!(line.len(), MAX_HDMA_SPRITES);
        assert!(matches!(line[0], LineEntry::Span { xl: 24, .. }));
        let slots = groups.sprite_table_line(0);
        assert!(slots.iter().all(|s| !s.is_hidden()));
        assert_eq!(slots[0].x(), (MAX_HDMA_SPRITES as i32 + 2) * 8);
    }

    #[test]
    fn sprites_cover_their_rows() {
        let mut groups = ShapeGroups::new();
        let attributes = SpriteAttributes {
            attr0: 0x0100,
            attr1: 0,
            attr2: 7,
        };
        groups.add_sprite(-10, attributes);
        committed(&mut groups);
        assert_eq!(groups.line(0), &[LineEntry::Sprite(attributes)]);
        assert_eq!(groups.line(54), &[LineEntry::Sprite(attributes)]);
        assert!(groups.line(55).is_empty());
    }

    #[test]
    fn stale_slots_are_hidden_and_frames_without_drawing_are_empty() {
        let mut groups = ShapeGroups::new();
        let hw = GbaSprites::default();

        groups.add_hlines((3, 3), 0, 0, &hlines(0, 4));
        groups.add_hlines((3, 3), 1, 0, &hlines(10, 14));
        groups.enable_drawing();
        groups.update(&hw);
        assert!(!groups.sprite_table_line(3)[1].is_hidden());

        // Next frame uses the other table.
        groups.add_hlines((3, 3), 0, 0, &hlines(0, 4));
        groups.enable_drawing();
        groups.update(&hw);
        assert!(groups.sprite_table_line(3)[1].is_hidden());

        // Back to the first table: its second slot must be hidden now.
        groups.add_hlines((3, 3), 0, 0, &hlines(0, 4));
        groups.enable_drawing();
        groups.update(&hw);
        assert!(!groups.sprite_table_line(3)[0].is_hidden());
        assert!(groups.sprite_table_line(3)[1].is_hidden());

        groups.add_hlines((3, 3), 0, 0, &hlines(0, 4));
        groups.update(&hw);
        assert!(groups.line(3).is_empty());
        assert!(groups.sprite_table_line(3)[0].is_hidden());
    }
}
