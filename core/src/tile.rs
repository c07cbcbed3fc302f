use serde::{Deserialize, Serialize};

use crate::{Coord, Coord2};

/// One cell of the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    coords: Coord2,
    pub(crate) opened: bool,
    pub(crate) flagged: bool,
    pub(crate) has_mine: bool,
    pub(crate) number: u8,
}

impl Tile {
    pub const fn new(coords: Coord2) -> Self {
        Self {
            coords,
            opened: false,
            flagged: false,
            has_mine: false,
            number: 0,
        }
    }

    pub const fn coords(&self) -> Coord2 {
        self.coords
    }

    pub const fn x(&self) -> Coord {
        self.coords.0
    }

    pub const fn y(&self) -> Coord {
        self.coords.1
    }

    pub const fn is_opened(&self) -> bool {
        self.opened
    }

    pub const fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub const fn has_mine(&self) -> bool {
        self.has_mine
    }

    /// Mines among the eight neighbours.
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// A flag that turned out to sit on a safe tile once the board was revealed.
    pub const fn is_bad_flag(&self) -> bool {
        self.opened && self.flagged && !self.has_mine
    }

    pub(crate) const fn is_unopened_safe(&self) -> bool {
        !self.opened && !self.has_mine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_flag_needs_opened_flagged_and_safe() {
        let mut tile = Tile::new((0, 0));
        tile.flagged = true;
        assert!(!tile.is_bad_flag());

        tile.opened = true;
        assert!(tile.is_bad_flag());

        tile.has_mine = true;
        assert!(!tile.is_bad_flag());
    }
}
