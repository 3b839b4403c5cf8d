//! Discretized spectral integration basis.
//!
//! Resamples the embedded CIE data onto the 1 nm working axis and fixes the
//! illuminant normalization so the reference white has unit luminance.

use crate::data;

/// Integration step of the working wavelength axis, nm.
pub const STEP: f32 = 1.0;

/// Number of 1 nm samples from 360 to 830 nm inclusive.
pub const N_SAMPLES: usize = 471;

/// The fitter's spectral integration state.
///
/// All sequences are aligned one-to-one with the wavelength axis. The
/// illuminant is scaled by k so that `sum(illuminant * y_bar) * STEP == 1`,
/// pinning the reference white's luminance to one. `weights[i]` premultiplies
/// cmf, illuminant, and step per channel, so a tristimulus integral is just
/// `sum(reflectance_i * weights_i)` — the same factors feed the analytic
/// gradients.
#[derive(Debug, Clone)]
pub struct SpectralBasis {
    /// Wavelengths in nm, ascending, fixed 1 nm step.
    pub wavelengths: Vec<f32>,
    /// Wavelength normalized to [0, 1] across the axis.
    pub wavelength_norm: Vec<f32>,
    /// Squared normalized wavelength.
    pub wavelength_norm_sq: Vec<f32>,
    /// x̄ resampled to the working axis.
    pub x_bar: Vec<f32>,
    /// ȳ resampled to the working axis.
    pub y_bar: Vec<f32>,
    /// z̄ resampled to the working axis.
    pub z_bar: Vec<f32>,
    /// Illuminant, normalized to a unit luminance integral.
    pub illuminant: Vec<f32>,
    /// Per-wavelength (x̄, ȳ, z̄) · illuminant · step integration weights.
    pub weights: Vec<[f32; 3]>,
}

impl SpectralBasis {
    /// Builds the basis from the embedded CIE tables. Inputs are
    /// compile-time constants; there are no error paths.
    pub fn new() -> Self {
        let span = data::LAMBDA_MAX - data::LAMBDA_MIN;

        let wavelengths: Vec<f32> = (0..N_SAMPLES)
            .map(|i| data::LAMBDA_MIN + i as f32 * STEP)
            .collect();
        let wavelength_norm: Vec<f32> = wavelengths
            .iter()
            .map(|&l| (l - data::LAMBDA_MIN) / span)
            .collect();
        let wavelength_norm_sq: Vec<f32> = wavelength_norm.iter().map(|&t| t * t).collect();

        let x_bar: Vec<f32> = wavelengths.iter().map(|&l| data::sample(&data::CIE_X, l)).collect();
        let y_bar: Vec<f32> = wavelengths.iter().map(|&l| data::sample(&data::CIE_Y, l)).collect();
        let z_bar: Vec<f32> = wavelengths.iter().map(|&l| data::sample(&data::CIE_Z, l)).collect();

        let d65: Vec<f32> = wavelengths.iter().map(|&l| data::sample(&data::D65_SPD, l)).collect();
        let luminance: f32 = d65.iter().zip(&y_bar).map(|(&s, &y)| s * y).sum::<f32>() * STEP;
        let k = 1.0 / luminance;
        let illuminant: Vec<f32> = d65.iter().map(|&s| s * k).collect();

        let weights: Vec<[f32; 3]> = (0..N_SAMPLES)
            .map(|i| {
                let w = illuminant[i] * STEP;
                [x_bar[i] * w, y_bar[i] * w, z_bar[i] * w]
            })
            .collect();

        Self {
            wavelengths,
            wavelength_norm,
            wavelength_norm_sq,
            x_bar,
            y_bar,
            z_bar,
            illuminant,
            weights,
        }
    }
}

impl Default for SpectralBasis {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_shape() {
        let basis = SpectralBasis::new();
        assert_eq!(basis.wavelengths.len(), N_SAMPLES);
        assert_eq!(basis.wavelengths[0], 360.0);
        assert_eq!(basis.wavelengths[N_SAMPLES - 1], 830.0);
        // Monotonically increasing, fixed step
        for pair in basis.wavelengths.windows(2) {
            assert_eq!(pair[1] - pair[0], STEP);
        }
    }

    #[test]
    fn test_wavelength_norm_bounds() {
        let basis = SpectralBasis::new();
        assert_eq!(basis.wavelength_norm[0], 0.0);
        assert_eq!(basis.wavelength_norm[N_SAMPLES - 1], 1.0);
        assert_eq!(basis.wavelength_norm_sq[N_SAMPLES - 1], 1.0);
    }

    #[test]
    fn test_illuminant_unit_luminance() {
        let basis = SpectralBasis::new();
        let integral: f32 = basis
            .illuminant
            .iter()
            .zip(&basis.y_bar)
            .map(|(&s, &y)| s * y)
            .sum::<f32>()
            * STEP;
        approx::assert_relative_eq!(integral, 1.0, max_relative = 1e-5);
    }

    #[test]
    fn test_weights_sum_matches_unit_reflectance_y() {
        let basis = SpectralBasis::new();
        // Y of a perfect reflector equals the illuminant luminance integral
        let y: f32 = basis.weights.iter().map(|w| w[1]).sum();
        assert!((y - 1.0).abs() < 1e-5);
    }
}
