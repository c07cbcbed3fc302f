use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board width and height must be at least 1")]
    InvalidSize,
    #[error("Too many mines, at least one tile must stay safe")]
    TooManyMines,
    #[error("Not enough free tiles left to place every mine")]
    NotEnoughFreeTiles,
    #[error("Invalid coordinates")]
    InvalidCoords,
}

pub type Result<T> = core::result::Result<T, GameError>;
