// src/lib.rs

pub mod error;
pub mod field;
pub mod grid;
pub mod grid_io;
pub mod interp;
pub mod spectrum;
#[cfg(feature = "fft")]
pub mod turbulence;
pub mod vec3;
