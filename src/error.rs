//! Error types for content that can be rejected at load or parse time.
//!
//! Contract violations against the ECS store (moving an entity that has no
//! `Loc`, for example) are not represented here: they panic, because the
//! spatial index would otherwise drift out of sync with component data.

use thiserror::Error;

/// Failure while compiling a path code such as `"U3P2FL"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A character that is not a command letter appeared where a command was expected.
    #[error("unknown path command '{ch}' at position {pos}")]
    UnknownCommand { ch: char, pos: usize },

    /// `F` was the last character of the code.
    #[error("face command at position {pos} is missing its direction")]
    MissingFaceDirection { pos: usize },

    /// `F` was followed by something other than `U`, `D`, `L` or `R`.
    #[error("face command at position {pos} has invalid direction '{ch}'")]
    InvalidFaceDirection { ch: char, pos: usize },

    /// A repeat count did not fit in a `u32`.
    #[error("repeat count at position {pos} is too large")]
    CountOverflow { pos: usize },
}

/// Failure while decoding a tile map.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("tile map is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tile map row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Top-level error for the simulation crate.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Map(#[from] MapError),

    /// Configuration, level or progress JSON failed to decode.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
