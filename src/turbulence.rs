// src/turbulence.rs
//
// Spectral synthesis of a turbulent vector field on a periodic grid.
//
// The field is built in frequency space: every wavevector whose wavelength
// falls inside [lmin, lmax] gets an amplitude following the power-law
// spectrum and a random phase/polarization from a seeded generator, the
// spectrum is made Hermitian-symmetric so the inverse transform is real, and
// the real-space result is rescaled to the requested RMS strength.
//
// Compiled only with the `fft` cargo feature; callers detect availability at
// build time, not through a runtime branch.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::grid::VectorGrid;
use crate::spectrum::SpectrumParams;
use crate::vec3::{cross, normalize};

/// How the random orientation at each wavevector is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurbulenceMode {
    /// Polarization transverse to the wavevector, giving a divergence-free
    /// field. This is the physically standard choice for magnetic turbulence
    /// and the default.
    #[default]
    Solenoidal,
    /// Uniformly random orientation with no divergence constraint.
    Isotropic,
}

/// Overwrite `grid` with a solenoidal turbulent field realization.
///
/// The result is deterministic: identical grid dimensions/spacing and
/// identical parameters reproduce the same field. Its RMS magnitude equals
/// `params.brms` up to floating rounding. Wavelengths the grid cannot
/// represent (below twice the spacing, or above the box size) are silently
/// absent from the realization; an entirely empty band leaves the grid zero.
pub fn init_turbulence(grid: &mut VectorGrid, params: &SpectrumParams) -> Result<()> {
    init_turbulence_with_mode(grid, params, TurbulenceMode::default())
}

/// Like [`init_turbulence`], with an explicit orientation strategy.
pub fn init_turbulence_with_mode(
    grid: &mut VectorGrid,
    params: &SpectrumParams,
    mode: TurbulenceMode,
) -> Result<()> {
    params.validate()?;

    let (nx, ny, nz) = grid.dims();
    let spacing = grid.spacing();
    let n = nx * ny * nz;

    if params.lmin < 2.0 * spacing {
        debug!(
            lmin = params.lmin,
            nyquist = 2.0 * spacing,
            "lmin below the Nyquist wavelength; band clipped to the grid resolution"
        );
    }

    let k_min = 2.0 * PI / params.lmax;
    let k_max = 2.0 * PI / params.lmin;

    // Frequency-space field components, laid out z-fastest like the grid.
    let zero = Complex::new(0.0, 0.0);
    let mut bkx = vec![zero; n];
    let mut bky = vec![zero; n];
    let mut bkz = vec![zero; n];

    let flat = |ix: usize, iy: usize, iz: usize| (ix * ny + iy) * nz + iz;

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut active_modes = 0usize;

    // Visit each +k/-k pair once, in fixed lattice order so the random
    // stream is reproducible. The mirror slot gets the complex conjugate,
    // which makes the inverse transform real-valued.
    for ix in 0..nx {
        for iy in 0..ny {
            for iz in 0..nz {
                let idx = flat(ix, iy, iz);
                let midx = flat((nx - ix) % nx, (ny - iy) % ny, (nz - iz) % nz);
                if midx < idx {
                    continue;
                }

                let kx = 2.0 * PI * signed_frequency(ix, nx) / spacing;
                let ky = 2.0 * PI * signed_frequency(iy, ny) / spacing;
                let kz = 2.0 * PI * signed_frequency(iz, nz) / spacing;
                let k = (kx * kx + ky * ky + kz * kz).sqrt();

                // Outside the band (including k = 0) the amplitude is zero.
                if k < k_min || k > k_max {
                    continue;
                }
                active_modes += 1;

                // Power spectrum ~ k^s, so amplitudes go as k^(s/2).
                let amplitude = k.powf(params.spectral_index / 2.0);
                let phase = 2.0 * PI * rng.random::<f64>();

                let orientation = match mode {
                    TurbulenceMode::Solenoidal => {
                        let pol = 2.0 * PI * rng.random::<f64>();
                        transverse_unit([kx, ky, kz], pol)
                    }
                    TurbulenceMode::Isotropic => {
                        let u = 2.0 * rng.random::<f64>() - 1.0;
                        let az = 2.0 * PI * rng.random::<f64>();
                        let r = (1.0 - u * u).sqrt();
                        [r * az.cos(), r * az.sin(), u]
                    }
                };

                // Self-conjugate modes (DC and Nyquist combinations) must be
                // real for the transform to be real.
                let g = if idx == midx {
                    Complex::new(amplitude * phase.cos(), 0.0)
                } else {
                    Complex::from_polar(amplitude, phase)
                };

                bkx[idx] = g * orientation[0];
                bky[idx] = g * orientation[1];
                bkz[idx] = g * orientation[2];
                if midx != idx {
                    bkx[midx] = g.conj() * orientation[0];
                    bky[midx] = g.conj() * orientation[1];
                    bkz[midx] = g.conj() * orientation[2];
                }
            }
        }
    }

    debug!(
        active_modes,
        total = n,
        k_min,
        k_max,
        "filled turbulence spectrum"
    );

    let mut planner = FftPlanner::<f64>::new();
    let fft_x = planner.plan_fft_inverse(nx);
    let fft_y = planner.plan_fft_inverse(ny);
    let fft_z = planner.plan_fft_inverse(nz);

    fft3_in_place(&mut bkx, nx, ny, nz, &fft_x, &fft_y, &fft_z);
    fft3_in_place(&mut bky, nx, ny, nz, &fft_x, &fft_y, &fft_z);
    fft3_in_place(&mut bkz, nx, ny, nz, &fft_x, &fft_y, &fft_z);

    // Pack real parts into the grid. The transforms are unnormalised; the
    // RMS rescale below absorbs the 1/n factor.
    let mut sum2 = 0.0;
    for (idx, sample) in grid.samples_mut().iter_mut().enumerate() {
        let v = [bkx[idx].re, bky[idx].re, bkz[idx].re];
        sum2 += v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        *sample = v;
    }

    let rms = (sum2 / n as f64).sqrt();
    if rms > 0.0 {
        let factor = params.brms / rms;
        grid.samples_mut().par_iter_mut().for_each(|v| {
            v[0] *= factor;
            v[1] *= factor;
            v[2] *= factor;
        });
    } else {
        debug!("no representable modes in [lmin, lmax]; grid left at zero");
    }

    Ok(())
}

/// Signed frequency in cycles per cell for FFT bin `i` of `n`:
/// `i/n` up to the Nyquist bin, `(i-n)/n` beyond it.
#[inline]
fn signed_frequency(i: usize, n: usize) -> f64 {
    if i <= n / 2 {
        i as f64 / n as f64
    } else {
        (i as f64 - n as f64) / n as f64
    }
}

/// Unit vector transverse to `k`, rotated by `pol` within the transverse
/// plane. For `k` along z the plane is spanned by x and y.
fn transverse_unit(k: [f64; 3], pol: f64) -> [f64; 3] {
    let kn = normalize(k);
    let (e1, e2) = if kn[0].abs() < 1e-12 && kn[1].abs() < 1e-12 {
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    } else {
        let e1 = normalize(cross(kn, [0.0, 0.0, 1.0]));
        (e1, cross(kn, e1))
    };
    let (s, c) = pol.sin_cos();
    [
        e1[0] * c + e2[0] * s,
        e1[1] * c + e2[1] * s,
        e1[2] * c + e2[2] * s,
    ]
}

/// In-place 3D FFT over a z-fastest array, applied as 1D passes: contiguous
/// z lines (parallel), then gathered y lines, then gathered x lines. The
/// transform direction is set by the plans; no normalisation is applied.
fn fft3_in_place(
    data: &mut [Complex<f64>],
    nx: usize,
    ny: usize,
    nz: usize,
    fft_x: &Arc<dyn Fft<f64>>,
    fft_y: &Arc<dyn Fft<f64>>,
    fft_z: &Arc<dyn Fft<f64>>,
) {
    debug_assert_eq!(data.len(), nx * ny * nz);

    // 1) z lines are contiguous
    data.par_chunks_mut(nz).for_each(|line| {
        fft_z.process(line);
    });

    let mut buf = vec![Complex::new(0.0, 0.0); ny.max(nx)];

    // 2) y lines: stride nz within each x-plane
    for ix in 0..nx {
        let plane = &mut data[ix * ny * nz..(ix + 1) * ny * nz];
        for iz in 0..nz {
            for iy in 0..ny {
                buf[iy] = plane[iy * nz + iz];
            }
            fft_y.process(&mut buf[..ny]);
            for iy in 0..ny {
                plane[iy * nz + iz] = buf[iy];
            }
        }
    }

    // 3) x lines: stride ny*nz
    let stride = ny * nz;
    for iy in 0..ny {
        for iz in 0..nz {
            let base = iy * nz + iz;
            for ix in 0..nx {
                buf[ix] = data[ix * stride + base];
            }
            fft_x.process(&mut buf[..nx]);
            for ix in 0..nx {
                data[ix * stride + base] = buf[ix];
            }
        }
    }
}
