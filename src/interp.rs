// src/interp.rs
//
// Trilinear interpolation on a periodic Grid3D. Works for both scalar and
// vector grids through the Lerp trait.

use crate::grid::Grid3D;

/// Sample types that support linear blending.
///
/// The blend uses the monotone form `a + t * (b - a)`: it returns `a`
/// bit-exactly when both endpoints coincide, which keeps degenerate
/// (dimension-1) axes and uniform fields exact at every fraction.
pub trait Lerp: Copy {
    fn lerp(a: Self, b: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    #[inline]
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        a + t * (b - a)
    }
}

impl Lerp for [f64; 3] {
    #[inline]
    fn lerp(a: Self, b: Self, t: f64) -> Self {
        [
            a[0] + t * (b[0] - a[0]),
            a[1] + t * (b[1] - a[1]),
            a[2] + t * (b[2] - a[2]),
        ]
    }
}

/// Trilinear sample of a periodic grid at arbitrary physical coordinates.
///
/// The position is mapped to grid-local coordinates `(p - origin) / spacing`,
/// floored to the lower corner cell, and blended over the 8 surrounding
/// lattice samples with periodic index wrap. The blend order is fixed:
/// x first, then y, then z.
///
/// Every real-valued position yields a finite result; positions outside the
/// declared box wrap around. An axis of dimension 1 degenerates to a no-op
/// along that axis (both corners are the same sample).
pub fn interpolate<T: Lerp>(grid: &Grid3D<T>, position: [f64; 3]) -> T {
    let origin = grid.origin();
    let inv = 1.0 / grid.spacing();

    let fx = (position[0] - origin[0]) * inv;
    let fy = (position[1] - origin[1]) * inv;
    let fz = (position[2] - origin[2]) * inv;

    let i0f = fx.floor();
    let j0f = fy.floor();
    let k0f = fz.floor();

    let tx = fx - i0f;
    let ty = fy - j0f;
    let tz = fz - k0f;

    let i0 = i0f as isize;
    let j0 = j0f as isize;
    let k0 = k0f as isize;
    // The float-to-int cast saturates for far-away positions; wrapping the
    // increment keeps the neighbor lookup panic-free, and the periodic index
    // reduction makes the wrapped value as good as any other.
    let i1 = i0.wrapping_add(1);
    let j1 = j0.wrapping_add(1);
    let k1 = k0.wrapping_add(1);

    let v000 = grid.get(i0, j0, k0);
    let v100 = grid.get(i1, j0, k0);
    let v010 = grid.get(i0, j1, k0);
    let v110 = grid.get(i1, j1, k0);
    let v001 = grid.get(i0, j0, k1);
    let v101 = grid.get(i1, j0, k1);
    let v011 = grid.get(i0, j1, k1);
    let v111 = grid.get(i1, j1, k1);

    // x
    let v00 = T::lerp(v000, v100, tx);
    let v10 = T::lerp(v010, v110, tx);
    let v01 = T::lerp(v001, v101, tx);
    let v11 = T::lerp(v011, v111, tx);
    // y
    let v0 = T::lerp(v00, v10, ty);
    let v1 = T::lerp(v01, v11, ty);
    // z
    T::lerp(v0, v1, tz)
}
