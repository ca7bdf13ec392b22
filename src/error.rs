// src/error.rs
//
// Crate-wide error taxonomy. Configuration problems are caught eagerly at
// construction or synthesis entry; I/O failures always carry the offending
// path. Interpolation and the grid reductions cannot fail on a constructed
// grid and so return plain values.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid grid geometry: {0}")]
    InvalidGrid(String),

    #[error("invalid turbulence spectrum: {0}")]
    InvalidSpectrum(String),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: line {line}: cannot parse {text:?} as three field components", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("{}: truncated grid data (expected {expected} samples, got {got})", .path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        got: usize,
    },
}
