// src/field.rs
//
// Field facades queried by the propagation engine, plus whole-grid
// statistics. Grids are shared through `Arc` so a modulation grid can back
// several facades at once; replacing a grid swaps the handle in one pointer
// store, and mutating a shared grid is visible to every facade holding it.

use std::sync::Arc;

use rayon::prelude::*;

use crate::grid::{ScalarGrid, VectorGrid};
use crate::interp::interpolate;
use crate::vec3;

/// The query contract the propagation engine sees: a side-effect-free field
/// lookup at arbitrary, unordered positions.
pub trait MagneticField {
    /// Field vector (Tesla) at a physical position (meters).
    fn get_field(&self, position: [f64; 3]) -> [f64; 3];
}

/// Magnetic field on a periodic grid with trilinear interpolation.
pub struct MagneticFieldGrid {
    grid: Arc<VectorGrid>,
}

impl MagneticFieldGrid {
    pub fn new(grid: Arc<VectorGrid>) -> Self {
        Self { grid }
    }

    /// Replace the held grid. Requires exclusive access, so a concurrent
    /// reader can never observe a half-swapped facade; share the facade
    /// across threads behind the caller's lock.
    pub fn set_grid(&mut self, grid: Arc<VectorGrid>) {
        self.grid = grid;
    }

    pub fn grid(&self) -> Arc<VectorGrid> {
        Arc::clone(&self.grid)
    }
}

impl MagneticField for MagneticFieldGrid {
    fn get_field(&self, position: [f64; 3]) -> [f64; 3] {
        interpolate(&self.grid, position)
    }
}

/// Magnetic field grid scaled pointwise by an interpolated scalar
/// modulation grid. The two grids may have different geometry; each is
/// interpolated at the query position independently.
pub struct ModulatedMagneticFieldGrid {
    grid: Arc<VectorGrid>,
    modulation: Arc<ScalarGrid>,
}

impl ModulatedMagneticFieldGrid {
    pub fn new(grid: Arc<VectorGrid>, modulation: Arc<ScalarGrid>) -> Self {
        Self { grid, modulation }
    }

    pub fn set_grid(&mut self, grid: Arc<VectorGrid>) {
        self.grid = grid;
    }

    pub fn set_modulation_grid(&mut self, modulation: Arc<ScalarGrid>) {
        self.modulation = modulation;
    }

    pub fn grid(&self) -> Arc<VectorGrid> {
        Arc::clone(&self.grid)
    }

    pub fn modulation_grid(&self) -> Arc<ScalarGrid> {
        Arc::clone(&self.modulation)
    }
}

impl MagneticField for ModulatedMagneticFieldGrid {
    fn get_field(&self, position: [f64; 3]) -> [f64; 3] {
        let b = interpolate(&self.grid, position);
        let m = interpolate(&self.modulation, position);
        vec3::scale(b, m)
    }
}

/// Componentwise arithmetic mean over all samples.
///
/// Sequential summation in storage order, so the result does not depend on
/// thread count.
pub fn mean_field_strength(grid: &VectorGrid) -> [f64; 3] {
    let mut sum = [0.0f64; 3];
    for v in grid.samples() {
        sum = vec3::add(sum, *v);
    }
    vec3::scale(sum, 1.0 / grid.len() as f64)
}

/// Root mean square of the sample magnitudes.
pub fn rms_field_strength(grid: &VectorGrid) -> f64 {
    let mut sum2 = 0.0f64;
    for v in grid.samples() {
        sum2 += vec3::dot(*v, *v);
    }
    (sum2 / grid.len() as f64).sqrt()
}

/// Multiply every sample in place by a scalar factor.
pub fn scale(grid: &mut VectorGrid, factor: f64) {
    grid.samples_mut().par_iter_mut().for_each(|v| {
        v[0] *= factor;
        v[1] *= factor;
        v[2] *= factor;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform_grid(value: [f64; 3]) -> VectorGrid {
        let mut g = VectorGrid::new([0.0; 3], 1.0, 4, 4, 4).unwrap();
        g.fill(value);
        g
    }

    #[test]
    fn uniform_field_queries_exactly() {
        let facade = MagneticFieldGrid::new(Arc::new(uniform_grid([1.0, 0.0, 0.0])));
        assert_eq!(facade.get_field([2.5, 2.5, 2.5]), [1.0, 0.0, 0.0]);
        assert_eq!(facade.get_field([-17.0, 3.1, 100.0]), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn modulation_scales_the_vector_result() {
        let grid = Arc::new(uniform_grid([2.0, 0.0, -4.0]));
        let mut modulation = ScalarGrid::new([0.0; 3], 1.0, 4, 4, 4).unwrap();
        modulation.fill(0.5);
        let facade = ModulatedMagneticFieldGrid::new(grid, Arc::new(modulation));
        assert_eq!(facade.get_field([1.3, 2.7, 0.4]), [1.0, 0.0, -2.0]);
    }

    #[test]
    fn shared_modulation_grid_backs_multiple_facades() {
        let grid = Arc::new(uniform_grid([1.0, 0.0, 0.0]));
        let modulation = Arc::new({
            let mut m = ScalarGrid::new([0.0; 3], 1.0, 4, 4, 4).unwrap();
            m.fill(3.0);
            m
        });
        let a = ModulatedMagneticFieldGrid::new(Arc::clone(&grid), Arc::clone(&modulation));
        let b = ModulatedMagneticFieldGrid::new(grid, Arc::clone(&modulation));
        assert_eq!(a.get_field([0.0; 3]), b.get_field([0.0; 3]));
        assert_eq!(Arc::strong_count(&modulation), 3);
    }

    #[test]
    fn set_grid_swaps_the_backing_field() {
        let mut facade = MagneticFieldGrid::new(Arc::new(uniform_grid([1.0, 0.0, 0.0])));
        facade.set_grid(Arc::new(uniform_grid([0.0, 2.0, 0.0])));
        assert_eq!(facade.get_field([1.5, 1.5, 1.5]), [0.0, 2.0, 0.0]);
    }

    #[test]
    fn statistics_on_a_uniform_grid() {
        let g = uniform_grid([1.0, 0.0, 0.0]);
        assert_eq!(mean_field_strength(&g), [1.0, 0.0, 0.0]);
        assert_eq!(rms_field_strength(&g), 1.0);
    }

    #[test]
    fn scale_then_inverse_scale_restores_the_grid() {
        let mut g = VectorGrid::new([0.0; 3], 1.0, 3, 3, 3).unwrap();
        for (i, v) in g.samples_mut().iter_mut().enumerate() {
            *v = [i as f64, 2.0 * i as f64, -0.5 * i as f64];
        }
        let original = g.clone();
        scale(&mut g, 7.3);
        scale(&mut g, 1.0 / 7.3);
        for (a, b) in g.samples().iter().zip(original.samples()) {
            for c in 0..3 {
                assert_relative_eq!(a[c], b[c], max_relative = 1e-12);
            }
        }
    }
}
