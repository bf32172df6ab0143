use std::io;

use thiserror::Error;

/// Problems found while turning a text layout into a [`crate::Level`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("layout has no rows")]
    EmptyLayout,
    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        glyph: char,
        row: usize,
        column: usize,
    },
    #[error("teleporter at ({x}, {y}) has no partner")]
    UnpairedTeleporter { x: i32, y: i32 },
    #[error("layout has no player spawn")]
    MissingPlayer,
    #[error("layout has ghosts but no home cells")]
    MissingHome,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),
}
