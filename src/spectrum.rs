// src/spectrum.rs
//
// Power-law turbulence spectrum parameters and the analytic correlation
// length. Nothing here touches a realized grid or the FFT; the synthesis
// itself lives in `turbulence` (behind the `fft` feature).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters of a homogeneous, isotropic power-law turbulence spectrum.
///
/// The *power* spectrum (amplitude squared) follows `k^spectral_index`
/// between the wavelengths `lmin` and `lmax`; `-11/3` is a Kolmogorov
/// spectrum. `brms` is the RMS field strength of the realized field, and
/// `seed` fixes the random phases and polarizations for reproducible runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumParams {
    pub brms: f64,
    pub lmin: f64,
    pub lmax: f64,
    pub spectral_index: f64,
    pub seed: u64,
}

impl SpectrumParams {
    pub fn new(brms: f64, lmin: f64, lmax: f64, spectral_index: f64, seed: u64) -> Result<Self> {
        let p = Self {
            brms,
            lmin,
            lmax,
            spectral_index,
            seed,
        };
        p.validate()?;
        Ok(p)
    }

    /// Kolmogorov spectrum (`spectral_index = -11/3`).
    pub fn kolmogorov(brms: f64, lmin: f64, lmax: f64, seed: u64) -> Result<Self> {
        Self::new(brms, lmin, lmax, -11.0 / 3.0, seed)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.lmin > 0.0) {
            return Err(Error::InvalidSpectrum(format!(
                "lmin must be positive, got {}",
                self.lmin
            )));
        }
        if !(self.lmin < self.lmax) {
            return Err(Error::InvalidSpectrum(format!(
                "lmin must be smaller than lmax, got lmin={} lmax={}",
                self.lmin, self.lmax
            )));
        }
        if !(self.brms >= 0.0) {
            return Err(Error::InvalidSpectrum(format!(
                "brms must be non-negative, got {}",
                self.brms
            )));
        }
        if !self.spectral_index.is_finite() {
            return Err(Error::InvalidSpectrum(format!(
                "spectral index must be finite, got {}",
                self.spectral_index
            )));
        }
        Ok(())
    }
}

/// `∫ k^p dk` over `[kmin, kmax]`, with the logarithmic limit at `p = -1`.
fn power_integral(p: f64, kmin: f64, kmax: f64) -> f64 {
    if (p + 1.0).abs() < 1e-12 {
        (kmax / kmin).ln()
    } else {
        (kmax.powf(p + 1.0) - kmin.powf(p + 1.0)) / (p + 1.0)
    }
}

/// Correlation length of a power-law turbulence spectrum.
///
/// Spectrum-weighted average length scale over the support of the power law,
/// with the energy spectrum `E(k) ∝ k^(spectral_index + 2)` between
/// `kmin = 2π/lmax` and `kmax = 2π/lmin`:
///
/// `Lc = π · ∫ k⁻¹ E(k) dk / ∫ E(k) dk`
///
/// For a Kolmogorov spectrum over a wide band this approaches `lmax / 5`.
/// Purely analytic; independent of any realized grid or random state.
pub fn turbulent_correlation_length(lmin: f64, lmax: f64, spectral_index: f64) -> Result<f64> {
    if !(lmin > 0.0) || !(lmin < lmax) {
        return Err(Error::InvalidSpectrum(format!(
            "need 0 < lmin < lmax, got lmin={lmin} lmax={lmax}"
        )));
    }
    let kmin = 2.0 * PI / lmax;
    let kmax = 2.0 * PI / lmin;
    // E(k) = k^(-a) with a = -spectral_index - 2 (a = 5/3 for Kolmogorov).
    let a = -spectral_index - 2.0;
    Ok(PI * power_integral(-1.0 - a, kmin, kmax) / power_integral(-a, kmin, kmax))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const KOLMOGOROV: f64 = -11.0 / 3.0;

    #[test]
    fn params_validation() {
        assert!(SpectrumParams::kolmogorov(1.0, 1.0, 10.0, 42).is_ok());
        assert!(SpectrumParams::kolmogorov(1.0, 0.0, 10.0, 42).is_err());
        assert!(SpectrumParams::kolmogorov(1.0, 10.0, 10.0, 42).is_err());
        assert!(SpectrumParams::kolmogorov(-1.0, 1.0, 10.0, 42).is_err());
        assert!(SpectrumParams::new(1.0, 1.0, 10.0, f64::NAN, 0).is_err());
    }

    #[test]
    fn matches_closed_form_for_kolmogorov() {
        // Lc = lmax/2 · (a-1)/a · (1-r^a)/(1-r^(a-1)) with r = lmin/lmax.
        let (lmin, lmax) = (1.0, 100.0);
        let a = -KOLMOGOROV - 2.0;
        let r: f64 = lmin / lmax;
        let expected =
            lmax / 2.0 * (a - 1.0) / a * (1.0 - r.powf(a)) / (1.0 - r.powf(a - 1.0));
        let lc = turbulent_correlation_length(lmin, lmax, KOLMOGOROV).unwrap();
        assert_relative_eq!(lc, expected, max_relative = 1e-10);
    }

    #[test]
    fn lies_between_the_band_limits() {
        for &(lmin, lmax) in &[(1.0, 4.0), (1.0, 100.0), (0.5, 2.0)] {
            let lc = turbulent_correlation_length(lmin, lmax, KOLMOGOROV).unwrap();
            assert!(lc > lmin && lc < lmax, "Lc={lc} outside ({lmin}, {lmax})");
        }
    }

    #[test]
    fn monotonic_in_lmax() {
        let mut prev = 0.0;
        for lmax in [2.0, 5.0, 10.0, 50.0, 200.0] {
            let lc = turbulent_correlation_length(1.0, lmax, KOLMOGOROV).unwrap();
            assert!(lc > prev, "Lc not increasing at lmax={lmax}");
            prev = lc;
        }
    }

    #[test]
    fn handles_degenerate_exponents() {
        // a = 1 and a = 0 hit the logarithmic branch of the integral.
        for s in [-3.0, -2.0] {
            let lc = turbulent_correlation_length(1.0, 10.0, s).unwrap();
            assert!(lc.is_finite() && lc > 0.0);
        }
    }

    #[test]
    fn params_serialize_round_trip() {
        let p = SpectrumParams::kolmogorov(2e-9, 0.5, 8.0, 1234).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: SpectrumParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
