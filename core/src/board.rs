use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};
use ndarray::Array2;
use rand::{Rng, RngExt};
use serde::{Deserialize, Serialize};

use crate::*;

/// The grid of tiles plus the number of mines it is meant to hold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    tiles: Array2<Tile>,
    mines: CellCount,
}

impl Board {
    /// Empty board: no mines placed, every number zero.
    pub fn new(config: GameConfig) -> Self {
        let tiles = Array2::from_shape_fn(config.size.to_nd_index(), |(y, x)| {
            Tile::new((x as Coord, y as Coord))
        });
        Self {
            tiles,
            mines: config.mines,
        }
    }

    /// Board with a fixed mine layout, already numbered.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut board = Self::new(GameConfig::new_unchecked(size, 0));
        for &coords in mine_coords {
            let coords = board.config().validate_coords(coords)?;
            board[coords].has_mine = true;
        }
        board.mines = board.mine_count();
        board.config().validate()?;
        board.renumber();
        Ok(board)
    }

    pub fn config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mines)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, columns) = self.tiles.dim();
        (columns as Coord, rows as Coord)
    }

    /// All tiles in `x + y * width` order.
    pub fn tiles(&self) -> &[Tile] {
        self.tiles.as_slice().expect("layout should be standard")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn get(&self, coords: Coord2) -> Option<&Tile> {
        self.tiles.get(coords.to_nd_index())
    }

    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        self.tiles.iter_neighbors(coords)
    }

    pub fn mine_count(&self) -> CellCount {
        self.count_where(|tile| tile.has_mine)
    }

    pub fn opened_count(&self) -> CellCount {
        self.count_where(|tile| tile.opened)
    }

    pub fn flagged_count(&self) -> CellCount {
        self.count_where(|tile| tile.flagged)
    }

    /// Tiles that are neither opened nor mined, the game is won when this hits zero.
    pub fn remaining_safe_count(&self) -> CellCount {
        self.count_where(|tile| tile.is_unopened_safe())
    }

    fn count_where(&self, predicate: impl Fn(&Tile) -> bool) -> CellCount {
        let count = self.tiles.iter().filter(|tile| predicate(tile)).count();
        CellCount::try_from(count).unwrap_or(CellCount::MAX)
    }

    /// Clears every mine and places them again by rejection sampling, skipping
    /// opened tiles and `excluded`, then renumbers the whole board.
    pub fn place_mines<R: Rng + ?Sized>(
        &mut self,
        random: &mut R,
        excluded: Option<Coord2>,
    ) -> Result<()> {
        let excluded = excluded.filter(|&coords| self.get(coords).is_some_and(|tile| !tile.opened));
        let free_tiles = self
            .config()
            .total_tiles()
            .saturating_sub(self.opened_count())
            .saturating_sub(u16::from(excluded.is_some()));
        if self.mines > free_tiles {
            log::warn!(
                "Cannot place {} mines, only {} free tiles left",
                self.mines,
                free_tiles
            );
            return Err(GameError::NotEnoughFreeTiles);
        }

        for tile in self.tiles.iter_mut() {
            tile.has_mine = false;
        }

        let (width, height) = self.size();
        let mut remaining = self.mines;
        let mut attempts: u32 = 0;
        while remaining > 0 {
            attempts += 1;
            let x = random.random_range(0..width);
            let y = random.random_range(0..height);
            if excluded == Some((x, y)) {
                continue;
            }
            let Some(tile) = self.tiles.get_mut((x, y).to_nd_index()) else {
                continue;
            };
            if tile.has_mine || tile.opened {
                continue;
            }
            tile.has_mine = true;
            remaining -= 1;
        }
        log::debug!(
            "Placed {} mines in {} attempts, excluded: {:?}",
            self.mines,
            attempts,
            excluded
        );

        self.renumber();
        Ok(())
    }

    /// Recomputes every tile's number with a full pass over the board.
    pub fn renumber(&mut self) {
        let (width, height) = self.size();
        for y in 0..height {
            for x in 0..width {
                let number = self
                    .neighbors((x, y))
                    .filter(|&pos| self[pos].has_mine)
                    .count();
                self[(x, y)].number = number as u8;
            }
        }
    }

    /// Opens `start` and, through an explicit stack, every tile reachable over
    /// safe zero tiles. Returns how many tiles were opened.
    pub fn flood_open(&mut self, start: Coord2) -> CellCount {
        let mut opened: CellCount = 0;
        let mut to_visit = vec![start];

        while let Some(coords) = to_visit.pop() {
            let tile = &mut self[coords];
            if tile.opened {
                continue;
            }

            tile.opened = true;
            tile.flagged = false;
            opened += 1;
            log::trace!("Flood opened tile at {:?}, number: {}", coords, tile.number);

            if tile.number == 0 && !tile.has_mine {
                to_visit.extend(self.neighbors(coords).filter(|&pos| !self[pos].opened));
            }
        }

        opened
    }

    pub(crate) fn clear_flags(&mut self) {
        for tile in self.tiles.iter_mut() {
            tile.flagged = false;
        }
    }

    pub(crate) fn flag_unopened(&mut self) {
        for tile in self.tiles.iter_mut().filter(|tile| !tile.opened) {
            tile.flagged = true;
        }
    }

    pub(crate) fn coords_where(&self, predicate: impl Fn(&Tile) -> bool) -> Vec<Coord2> {
        self.tiles
            .iter()
            .filter(|tile| predicate(tile))
            .map(Tile::coords)
            .collect()
    }
}

impl Index<Coord2> for Board {
    type Output = Tile;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.tiles[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.tiles[coords.to_nd_index()]
    }
}
