//! Uniform 32x32 spatial grids over the stage's XZ plane.
//!
//! `ModelGrid` buckets static models by the cells their vertices touch.
//! `VisibleModelGrid` is derived from it at load time: for each cell it lists
//! every model within `VISIBLE_CELLS_RADIUS` cells, so the per-frame query is
//! a single lookup.

use smallvec::SmallVec;
use thiserror::Error;

use super::model::ModelItem;
use crate::math::Point3d;

pub const GRID_COLUMNS: usize = 32;
pub const GRID_ROWS: usize = 32;
/// Cell side, in world units.
pub const CELL_SIZE: i32 = 32;
pub const MAX_CELL_MODELS: usize = 3;
pub const VISIBLE_CELLS_RADIUS: usize = 5;
pub const MAX_STAGE_MODELS: usize = 1024;
/// A cell can see every model of the stage.
pub const MAX_VISIBLE_MODELS_PER_CELL: usize = MAX_STAGE_MODELS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("stage has {0} models (max {MAX_STAGE_MODELS})")]
    TooManyModels(usize),
    #[error("model {model} has no vertices")]
    EmptyModel { model: usize },
    #[error("model {model} leaves the grid (cell {column},{row})")]
    OutOfBounds { model: usize, column: i32, row: i32 },
    #[error("cell {column},{row} holds more than {MAX_CELL_MODELS} models")]
    CellFull { column: usize, row: usize },
    #[error("cell {column},{row} sees more than {MAX_VISIBLE_MODELS_PER_CELL} models")]
    VisibleCellFull { column: usize, row: usize },
}

/// `(column, row)` of the cell holding `point`, if it lies on the grid.
pub fn cell_of(point: &Point3d) -> Option<(usize, usize)> {
    let column = point.x.right_shift_integer().div_euclid(CELL_SIZE);
    let row = point.z.right_shift_integer().div_euclid(CELL_SIZE);
    in_grid(column, row).then_some((column as usize, row as usize))
}

#[inline]
fn in_grid(column: i32, row: i32) -> bool {
    (0..GRID_COLUMNS as i32).contains(&column) && (0..GRID_ROWS as i32).contains(&row)
}

#[inline]
fn cell_index(column: usize, row: usize) -> usize {
    row * GRID_COLUMNS + column
}

/*──────────────────────────── ModelGrid ───────────────────────────*/

pub type GridCell = SmallVec<[u16; MAX_CELL_MODELS]>;

#[derive(Debug)]
pub struct ModelGrid {
    cells: Vec<GridCell>,
}

impl ModelGrid {
    pub fn new(models: &[ModelItem]) -> Result<Self, GridError> {
        if models.len() > MAX_STAGE_MODELS {
            return Err(GridError::TooManyModels(models.len()));
        }
        let mut cells = vec![GridCell::new(); GRID_COLUMNS * GRID_ROWS];

        for (model_index, model) in models.iter().enumerate() {
            let mut vertices = model.vertices().iter().map(|v| {
                let p = v.point();
                (
                    p.x.right_shift_integer().div_euclid(CELL_SIZE),
                    p.z.right_shift_integer().div_euclid(CELL_SIZE),
                )
            });
            let first = vertices
                .next()
                .ok_or(GridError::EmptyModel { model: model_index })?;
            let (min, max) = vertices.fold((first, first), |(min, max), (c, r)| {
                ((min.0.min(c), min.1.min(r)), (max.0.max(c), max.1.max(r)))
            });

            for (column, row) in [min, max] {
                if !in_grid(column, row) {
                    return Err(GridError::OutOfBounds {
                        model: model_index,
                        column,
                        row,
                    });
                }
            }

            for row in min.1 as usize..=max.1 as usize {
                for column in min.0 as usize..=max.0 as usize {
                    let cell = &mut cells[cell_index(column, row)];
                    if cell.len() == MAX_CELL_MODELS {
                        return Err(GridError::CellFull { column, row });
                    }
                    cell.push(model_index as u16);
                }
            }
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn cell(&self, column: usize, row: usize) -> &[u16] {
        &self.cells[cell_index(column, row)]
    }
}

/*──────────────────────── VisibleModelGrid ────────────────────────*/

#[derive(Debug)]
pub struct VisibleModelGrid {
    cells: Vec<Vec<u16>>,
}

impl VisibleModelGrid {
    pub fn new(grid: &ModelGrid, models_count: usize) -> Result<Self, GridError> {
        let mut usage = vec![0u16; models_count];
        let mut cells = Vec::with_capacity(GRID_COLUMNS * GRID_ROWS);

        for row in 0..GRID_ROWS {
            let min_row = row.saturating_sub(VISIBLE_CELLS_RADIUS);
            let max_row = (row + VISIBLE_CELLS_RADIUS).min(GRID_ROWS - 1);

            for column in 0..GRID_COLUMNS {
                let min_column = column.saturating_sub(VISIBLE_CELLS_RADIUS);
                let max_column = (column + VISIBLE_CELLS_RADIUS).min(GRID_COLUMNS - 1);
                let mut visible = Vec::new();

                for other_row in min_row..=max_row {
                    for other_column in min_column..=max_column {
                        for &model in grid.cell(other_column, other_row) {
                            let count = &mut usage[model as usize];
                            if *count == 0 {
                                if visible.len() == MAX_VISIBLE_MODELS_PER_CELL {
                                    return Err(GridError::VisibleCellFull { column, row });
                                }
                                visible.push(model);
                            }
                            *count += 1;
                        }
                    }
                }

                for &model in &visible {
                    usage[model as usize] = 0;
                }
                cells.push(visible);
            }
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn cell(&self, column: usize, row: usize) -> &[u16] {
        &self.cells[cell_index(column, row)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vertex3d;
    use crate::world::{Face, Shading};

    /// Flat square with corners at `(x0, z0)` and `(x1, z1)`.
    fn patch(x0: f64, z0: f64, x1: f64, z1: f64) -> ModelItem {
        let vertices = vec![
            Vertex3d::from_f64(x0, 0.0, z0),
            Vertex3d::from_f64(x1, 0.0, z0),
            Vertex3d::from_f64(x1, 0.0, z1),
            Vertex3d::from_f64(x0, 0.0, z1),
        ];
        let face = Face::quad(
            &vertices,
            Point3d::from_ints(0, 1, 0),
            [0, 1, 2, 3],
            0,
            Shading::Level(0),
        )
        .unwrap();
        ModelItem::new(vertices, vec![face]).unwrap()
    }

    #[test]
    fn model_spanning_cells_is_in_each() {
        let grid = ModelGrid::new(&[patch(20.0, 20.0, 40.0, 40.0)]).unwrap();
        assert_eq!(grid.cell(0, 0), &[0]);
        assert_eq!(grid.cell(1, 0), &[0]);
        assert_eq!(grid.cell(0, 1), &[0]);
        assert_eq!(grid.cell(1, 1), &[0]);
        assert!(grid.cell(2, 1).is_empty());
    }

    #[test]
    fn cell_capacity_is_enforced() {
        let models: Vec<_> = (0..4).map(|_| patch(1.0, 1.0, 2.0, 2.0)).collect();
        assert_eq!(
            ModelGrid::new(&models).unwrap_err(),
            GridError::CellFull { column: 0, row: 0 }
        );
    }

    #[test]
    fn models_off_the_grid_are_rejected() {
        let err = ModelGrid::new(&[patch(-5.0, 4.0, 3.0, 6.0)]).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                model: 0,
                column: -1,
                row: 0
            }
        );
        assert!(ModelGrid::new(&[patch(1000.0, 4.0, 1030.0, 6.0)]).is_err());
    }

    #[test]
    fn visible_grid_lists_neighbours_once() {
        let models = [
            patch(20.0, 20.0, 40.0, 40.0),  // cells (0..=1, 0..=1)
            patch(200.0, 8.0, 210.0, 9.0),  // cell (6, 0)
            patch(300.0, 8.0, 310.0, 9.0),  // cell (9, 0)
        ];
        let grid = ModelGrid::new(&models).unwrap();
        let visible = VisibleModelGrid::new(&grid, models.len()).unwrap();

        assert_eq!(visible.cell(0, 0), &[0]);
        assert_eq!(visible.cell(1, 0), &[0, 1]);
        assert_eq!(visible.cell(6, 0), &[0, 1, 2]);
        assert_eq!(visible.cell(31, 31), &[] as &[u16]);
    }

    #[test]
    fn cell_of_point() {
        assert_eq!(cell_of(&Point3d::from_ints(33, 100, 64)), Some((1, 2)));
        assert_eq!(cell_of(&Point3d::from_ints(-1, 0, 0)), None);
        assert_eq!(cell_of(&Point3d::from_ints(0, 0, 1024)), None);
    }

    #[test]
    fn fully_packed_visible_block_is_accepted() {
        let side = 2 * VISIBLE_CELLS_RADIUS + 1;
        let mut models = Vec::new();
        for row in 0..side {
            for column in 0..side {
                let x = (column as i32 * CELL_SIZE) as f64;
                let z = (row as i32 * CELL_SIZE) as f64;
                for offset in 0..MAX_CELL_MODELS {
                    let o = 1.0 + offset as f64 * 8.0;
                    models.push(patch(x + o, z + o, x + o + 4.0, z + o + 4.0));
                }
            }
        }
        assert_eq!(models.len(), 363);

        let grid = ModelGrid::new(&models).unwrap();
        let visible = VisibleModelGrid::new(&grid, models.len()).unwrap();
        assert_eq!(visible.cell(5, 5).len(), 363);
        assert_eq!(visible.cell(0, 0).len(), 6 * 6 * MAX_CELL_MODELS);
    }
}
