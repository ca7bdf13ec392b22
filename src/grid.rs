// src/grid.rs

use crate::error::{Error, Result};

/// Dense 3D array of samples on a periodic Cartesian lattice.
///
/// Samples are stored z-fastest: flat index `(ix * ny + iy) * nz + iz`.
/// This matches the on-disk ordering used by `grid_io`, so the flat slice
/// can be streamed to a file without reordering.
///
/// Integer indexing wraps modulo the dimensions, so the grid represents a
/// field that tiles all of space with period `dim * spacing` per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid3D<T> {
    origin: [f64; 3],
    spacing: f64,
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<T>,
}

/// Field samples in Tesla (unless a conversion factor was applied at I/O time).
pub type VectorGrid = Grid3D<[f64; 3]>;

/// Dimensionless modulation factors.
pub type ScalarGrid = Grid3D<f64>;

#[inline]
fn wrap_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let mut v = i % n;
    if v < 0 {
        v += n;
    }
    v as usize
}

impl<T: Copy + Default> Grid3D<T> {
    /// Create a grid with all samples at `T::default()`.
    ///
    /// Geometry is fixed for the lifetime of the grid; contents are mutated
    /// in bulk by the turbulence synthesizer, `grid_io::load*`, or `scale`.
    pub fn new(origin: [f64; 3], spacing: f64, nx: usize, ny: usize, nz: usize) -> Result<Self> {
        if !(spacing > 0.0) {
            return Err(Error::InvalidGrid(format!(
                "spacing must be positive, got {spacing}"
            )));
        }
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(Error::InvalidGrid(format!(
                "all dimensions must be >= 1, got {nx}x{ny}x{nz}"
            )));
        }
        Ok(Self {
            origin,
            spacing,
            nx,
            ny,
            nz,
            data: vec![T::default(); nx * ny * nz],
        })
    }
}

impl<T: Copy> Grid3D<T> {
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Total number of samples (nx * ny * nz, always >= 1).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Physical period of the tiling per axis: `dim * spacing`.
    pub fn extent(&self) -> [f64; 3] {
        [
            self.nx as f64 * self.spacing,
            self.ny as f64 * self.spacing,
            self.nz as f64 * self.spacing,
        ]
    }

    /// Physical position of the sample at integer indices (before wrapping).
    pub fn position_of(&self, ix: usize, iy: usize, iz: usize) -> [f64; 3] {
        [
            self.origin[0] + ix as f64 * self.spacing,
            self.origin[1] + iy as f64 * self.spacing,
            self.origin[2] + iz as f64 * self.spacing,
        ]
    }

    /// Flat index for in-range integer coordinates (z fastest).
    #[inline]
    pub fn flat(&self, ix: usize, iy: usize, iz: usize) -> usize {
        debug_assert!(ix < self.nx && iy < self.ny && iz < self.nz);
        (ix * self.ny + iy) * self.nz + iz
    }

    /// Sample at periodically wrapped integer coordinates. Never fails:
    /// any `isize` index maps back into range.
    #[inline]
    pub fn get(&self, ix: isize, iy: isize, iz: isize) -> T {
        let ix = wrap_index(ix, self.nx);
        let iy = wrap_index(iy, self.ny);
        let iz = wrap_index(iz, self.nz);
        self.data[self.flat(ix, iy, iz)]
    }

    /// Store a sample at periodically wrapped integer coordinates.
    #[inline]
    pub fn set(&mut self, ix: isize, iy: isize, iz: isize, value: T) {
        let ix = wrap_index(ix, self.nx);
        let iy = wrap_index(iy, self.ny);
        let iz = wrap_index(iz, self.nz);
        let idx = self.flat(ix, iy, iz);
        self.data[idx] = value;
    }

    /// All samples in storage (z fastest) order.
    pub fn samples(&self) -> &[T] {
        &self.data
    }

    pub fn samples_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Overwrite every sample with the same value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}
