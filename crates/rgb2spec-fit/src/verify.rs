//! Table verification: reconstruct RGB values through a fitted table and
//! report perceptual error statistics.

use rayon::prelude::*;
use rgb2spec_math::Vec3;
use rgb2spec_primaries::ColorSpace;
use rgb2spec_table::{Interpolation, SpectrumTable};

use crate::basis::SpectralBasis;
use crate::lab::delta_e;
use crate::model::eval_xyz;

/// Round-trips an RGB value through the table: look up coefficients,
/// integrate the modeled spectrum, convert back to gamut RGB (clamped to
/// the non-negative octant).
pub fn reconstruct(
    table: &SpectrumTable,
    basis: &SpectralBasis,
    cs: &ColorSpace,
    rgb: Vec3,
    interp: Interpolation,
) -> Vec3 {
    let coeff = table.coefficients(rgb, interp);
    let xyz = eval_xyz(basis, coeff);
    (cs.xyz_to_rgb * xyz).max_zero()
}

/// ΔE between an RGB value and its table reconstruction.
pub fn reconstruction_error(
    table: &SpectrumTable,
    basis: &SpectralBasis,
    cs: &ColorSpace,
    rgb: Vec3,
    interp: Interpolation,
) -> f32 {
    delta_e(reconstruct(table, basis, cs, rgb, interp), rgb, cs)
}

/// ΔE statistics over a swept RGB lattice.
#[derive(Debug, Clone, Copy)]
pub struct VerifyStats {
    /// Number of lattice points evaluated.
    pub count: usize,
    /// Mean ΔE.
    pub mean_delta_e: f32,
    /// Largest ΔE.
    pub max_delta_e: f32,
}

/// Sweeps a `steps³` lattice over the unit RGB cube and reconstructs each
/// point through the table with trilinear lookup.
pub fn sweep(
    table: &SpectrumTable,
    basis: &SpectralBasis,
    cs: &ColorSpace,
    steps: usize,
) -> VerifyStats {
    let steps = steps.max(2);
    let inv = 1.0 / (steps - 1) as f32;
    let count = steps * steps * steps;

    let (sum, max) = (0..count)
        .into_par_iter()
        .map(|i| {
            let r = (i / (steps * steps)) as f32 * inv;
            let g = ((i / steps) % steps) as f32 * inv;
            let b = (i % steps) as f32 * inv;
            let e = reconstruction_error(
                table,
                basis,
                cs,
                Vec3::new(r, g, b),
                Interpolation::Trilinear,
            );
            (e as f64, e)
        })
        .reduce(|| (0.0f64, 0.0f32), |a, b| (a.0 + b.0, a.1.max(b.1)));

    VerifyStats {
        count,
        mean_delta_e: (sum / count as f64) as f32,
        max_delta_e: max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::z_nodes;
    use rgb2spec_primaries::Gamut;

    #[test]
    fn test_uniform_grey_reconstructs_without_table_data() {
        // Uniform inputs use the closed-form constant spectrum, so even a
        // zeroed table reproduces the achromatic axis of its own gamut.
        let n = 4;
        let table =
            SpectrumTable::new(n, z_nodes(n), vec![[0.0; 3]; 3 * n * n * n]).unwrap();
        let basis = SpectralBasis::new();
        let cs = ColorSpace::from_gamut(Gamut::Srgb);

        let e = reconstruction_error(
            &table,
            &basis,
            &cs,
            Vec3::splat(0.5),
            Interpolation::Nearest,
        );
        // The embedded observer data is 5 nm-resampled, so allow a small
        // perceptual tolerance rather than exact equality
        assert!(e < 1.0, "dE = {e}");
    }

    #[test]
    fn test_black_reconstructs_exactly() {
        let n = 4;
        let table =
            SpectrumTable::new(n, z_nodes(n), vec![[0.0; 3]; 3 * n * n * n]).unwrap();
        let basis = SpectralBasis::new();
        let cs = ColorSpace::from_gamut(Gamut::Srgb);

        let out = reconstruct(&table, &basis, &cs, Vec3::ZERO, Interpolation::Nearest);
        assert!(out.length() < 1e-4, "black -> {out:?}");
    }
}
