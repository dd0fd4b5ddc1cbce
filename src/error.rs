use crate::lattice::Coord;
use thiserror::Error;

/// Errors raised by the simulation core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DlaError {
    /// Lattice shape is not two odd dimensions of at least 3
    #[error("invalid lattice shape {0:?}: need exactly two odd dimensions >= 3")]
    InvalidShape(Vec<usize>),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Every perimeter cell has been sealed by the aggregate
    #[error("no entry points left on the lattice perimeter")]
    EntryPointsExhausted,

    #[error("coordinate ({}, {}) outside {rows}x{cols} lattice", .coord.row, .coord.col)]
    OutOfBounds { coord: Coord, rows: usize, cols: usize },

    #[error("walk started at ({}, {}) but no particle was placed there", .0.row, .0.col)]
    ParticleNotPlaced(Coord),

    #[error("the center seed cell can never be cleared")]
    CenterCleared,
}

pub type Result<T> = std::result::Result<T, DlaError>;

/// Errors raised by the sweep driver around the core
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Simulation(#[from] DlaError),

    #[error("invalid sweep config: {0}")]
    InvalidConfig(String),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("could not determine config directory")]
    NoConfigDir,
}

impl DriverError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        DriverError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
