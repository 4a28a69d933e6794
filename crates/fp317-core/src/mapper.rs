//! Global dot coordinates to tile and in-tile addresses.

use crate::{
    config::{Polarity, TILE_HEIGHT, TILE_WIDTH},
    topology::Grid,
};

/// Request for a dot outside the panel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OutOfBounds {
    pub x: usize,
    pub y: usize,
}

/// Everything the actuation layer needs to reach one dot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DotTarget {
    /// Tile-table row owning the dot.
    pub tile: u8,
    /// Column within the tile, `0..28`.
    pub column: u8,
    /// Row within the tile, `0..14`.
    pub row: u8,
    /// Data polarity of the owning tile.
    pub polarity: Polarity,
}

impl Grid {
    /// Maps a panel coordinate to its tile and in-tile address.
    ///
    /// Pure and total over `[0, width) x [0, height)`; anything else is
    /// rejected without producing a partial target.
    pub fn locate(&self, x: usize, y: usize) -> Result<DotTarget, OutOfBounds> {
        if x >= self.width() || y >= self.height() {
            return Err(OutOfBounds { x, y });
        }

        let Some(cell) = self.cell(x / TILE_WIDTH, y / TILE_HEIGHT) else {
            return Err(OutOfBounds { x, y });
        };

        Ok(DotTarget {
            tile: cell.table_index,
            column: (x % TILE_WIDTH) as u8,
            row: (y % TILE_HEIGHT) as u8,
            polarity: cell.polarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TileConfig;

    fn two_by_two() -> Grid {
        Grid::from_tiles(&[
            TileConfig::new(1, 1),
            TileConfig::new(2, 1),
            TileConfig::new(1, 2),
            TileConfig::new(2, 2),
        ])
        .unwrap()
    }

    #[test]
    fn origin_dot_lands_on_the_first_tile() {
        let target = two_by_two().locate(0, 0).unwrap();
        assert_eq!(target.tile, 0);
        assert_eq!(target.column, 0);
        assert_eq!(target.row, 0);
    }

    #[test]
    fn tile_boundaries_split_correctly() {
        let grid = two_by_two();

        let last_of_first = grid.locate(TILE_WIDTH - 1, TILE_HEIGHT - 1).unwrap();
        assert_eq!(last_of_first.tile, 0);
        assert_eq!(last_of_first.column, (TILE_WIDTH - 1) as u8);
        assert_eq!(last_of_first.row, (TILE_HEIGHT - 1) as u8);

        let first_of_neighbor = grid.locate(TILE_WIDTH, 0).unwrap();
        assert_eq!(first_of_neighbor.tile, 1);
        assert_eq!(first_of_neighbor.column, 0);

        let below = grid.locate(TILE_WIDTH + 3, TILE_HEIGHT + 5).unwrap();
        assert_eq!(below.tile, 3);
        assert_eq!(below.column, 3);
        assert_eq!(below.row, 5);
    }

    #[test]
    fn locate_is_total_in_bounds() {
        let grid = two_by_two();

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let target = grid.locate(x, y).unwrap();
                assert!((target.column as usize) < TILE_WIDTH);
                assert!((target.row as usize) < TILE_HEIGHT);
                assert!((target.tile as usize) < grid.tile_count());
            }
        }
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let grid = two_by_two();

        assert_eq!(
            grid.locate(grid.width(), 0),
            Err(OutOfBounds {
                x: grid.width(),
                y: 0
            })
        );
        assert_eq!(
            grid.locate(0, grid.height()),
            Err(OutOfBounds {
                x: 0,
                y: grid.height()
            })
        );
    }

    #[test]
    fn polarity_follows_the_owning_tile() {
        let grid = Grid::from_tiles(&[
            TileConfig::new(1, 1),
            TileConfig::new(1, 2).with_polarity(Polarity::Inverted),
        ])
        .unwrap();

        assert_eq!(grid.locate(0, 0).unwrap().polarity, Polarity::Normal);
        assert_eq!(
            grid.locate(0, TILE_HEIGHT).unwrap().polarity,
            Polarity::Inverted
        );
    }

    #[test]
    fn table_index_survives_disabled_rows() {
        let grid = Grid::from_tiles(&[
            TileConfig::disabled(3, 3),
            TileConfig::new(1, 1),
        ])
        .unwrap();

        assert_eq!(grid.locate(5, 5).unwrap().tile, 1);
    }
}
