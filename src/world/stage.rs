//! A loaded track: static models, their spatial grids, the ground map and
//! the model palette.

use thiserror::Error;

use super::grid::{ModelGrid, VisibleModelGrid};
use super::model::{ContentError, MAX_COLORS, ModelItem};
use crate::math::{Fixed, Point3d};
use crate::renderer::Color;

/// Side of a ground tile, in world units.
pub const GROUND_TILE_SIZE: i32 = 8;

#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Grid(#[from] super::grid::GridError),
}

/// Tile indices covering the ground plane, row-major over `z` then `x`.
#[derive(Clone, Debug)]
pub struct GroundMap {
    columns: usize,
    rows: usize,
    tiles: Vec<u16>,
}

impl GroundMap {
    pub fn new(columns: usize, rows: usize, tiles: Vec<u16>) -> Result<Self, ContentError> {
        if tiles.len() != columns * rows {
            return Err(ContentError::GroundMapSize {
                columns,
                rows,
                len: tiles.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            tiles,
        })
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Tile under a ground position, `None` off the map.
    pub fn tile_at(&self, x: Fixed, z: Fixed) -> Option<u16> {
        let column = x.right_shift_integer().div_euclid(GROUND_TILE_SIZE);
        let row = z.right_shift_integer().div_euclid(GROUND_TILE_SIZE);
        if column < 0 || row < 0 || column as usize >= self.columns || row as usize >= self.rows {
            return None;
        }
        Some(self.tiles[row as usize * self.columns + column as usize])
    }
}

pub struct Stage {
    model_items: Vec<ModelItem>,
    model_grid: ModelGrid,
    visible_model_grid: VisibleModelGrid,
    ground: GroundMap,
    slow_ground_tile_index: u16,
    model_colors: Vec<Color>,
    start_position: Point3d,
    start_phi: Fixed,
}

impl Stage {
    /// Builds both grids from the models; fails on any content error.
    pub fn new(
        model_items: Vec<ModelItem>,
        ground: GroundMap,
        slow_ground_tile_index: u16,
        model_colors: Vec<Color>,
        start_position: Point3d,
        start_phi: Fixed,
    ) -> Result<Self, StageError> {
        if model_colors.len() > MAX_COLORS {
            return Err(ContentError::TooManyColors(model_colors.len()).into());
        }
        let model_grid = ModelGrid::new(&model_items)?;
        let visible_model_grid = VisibleModelGrid::new(&model_grid, model_items.len())?;
        log::info!(
            "stage loaded: {} models, {} colors, ground {}x{}",
            model_items.len(),
            model_colors.len(),
            ground.columns(),
            ground.rows()
        );
        Ok(Self {
            model_items,
            model_grid,
            visible_model_grid,
            ground,
            slow_ground_tile_index,
            model_colors,
            start_position,
            start_phi,
        })
    }

    #[inline]
    pub fn model_items(&self) -> &[ModelItem] {
        &self.model_items
    }

    #[inline]
    pub fn model_grid(&self) -> &ModelGrid {
        &self.model_grid
    }

    #[inline]
    pub fn visible_model_grid(&self) -> &VisibleModelGrid {
        &self.visible_model_grid
    }

    #[inline]
    pub fn ground(&self) -> &GroundMap {
        &self.ground
    }

    #[inline]
    pub fn slow_ground_tile_index(&self) -> u16 {
        self.slow_ground_tile_index
    }

    #[inline]
    pub fn model_colors(&self) -> &[Color] {
        &self.model_colors
    }

    #[inline]
    pub fn start_position(&self) -> &Point3d {
        &self.start_position
    }

    #[inline]
    pub fn start_phi(&self) -> Fixed {
        self.start_phi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_tile_lookup() {
        let ground = GroundMap::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(ground.tile_at(Fixed::from_int(0), Fixed::from_int(0)), Some(1));
        assert_eq!(ground.tile_at(Fixed::from_int(9), Fixed::from_int(0)), Some(2));
        assert_eq!(ground.tile_at(Fixed::from_int(9), Fixed::from_int(15)), Some(4));
        assert_eq!(ground.tile_at(Fixed::from_int(16), Fixed::from_int(0)), None);
        assert_eq!(ground.tile_at(Fixed::from_f64(-0.5), Fixed::from_int(0)), None);
    }

    #[test]
    fn ground_map_size_is_checked() {
        assert!(matches!(
            GroundMap::new(3, 2, vec![0; 5]),
            Err(ContentError::GroundMapSize { len: 5, .. })
        ));
    }

    #[test]
    fn too_many_colors() {
        let ground = GroundMap::new(1, 1, vec![0]).unwrap();
        let err = Stage::new(
            Vec::new(),
            ground,
            0,
            vec![Color::default(); MAX_COLORS + 1],
            Point3d::ZERO,
            Fixed::ZERO,
        )
        .err()
        .unwrap();
        assert!(matches!(err, StageError::Content(ContentError::TooManyColors(11))));
    }
}
