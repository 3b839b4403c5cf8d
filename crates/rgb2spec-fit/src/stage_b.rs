//! Stage B: per-node refinement.
//!
//! The warm-start predictor seeds raw coefficients for every grid cell;
//! those become free parameters refined directly against the exact target
//! grid by Adam under a cosine-annealed schedule, minimizing ΔE. Cells are
//! independent, so each epoch evaluates and differentiates them in
//! parallel before a single synchronous parameter update.

use std::path::Path;

use rayon::prelude::*;
use rgb2spec_math::Vec3;
use rgb2spec_primaries::ColorSpace;
use rgb2spec_table::SpectrumTable;
use tracing::info;

use crate::basis::SpectralBasis;
use crate::config::FitConfig;
use crate::error::{FitError, FitResult};
use crate::grid::TargetGrid;
use crate::lab::delta_e_with_grad;
use crate::model::{CoeffScales, eval_xyz_with_jacobian};
use crate::optim::{Adam, cosine_lr};
use crate::stage_a::Predictor;

/// Decodes the current raw parameters into a serializable table.
fn build_table(
    grid: &TargetGrid,
    scales: &CoeffScales,
    raw: &[f32],
) -> Result<SpectrumTable, rgb2spec_table::TableError> {
    let coeffs: Vec<[f32; 3]> = raw
        .par_chunks(3)
        .map(|r| scales.decode([r[0], r[1], r[2]]))
        .collect();
    SpectrumTable::new(grid.size, grid.z_nodes.clone(), coeffs)
}

/// Refines per-cell coefficients against the target grid and serializes
/// the result.
///
/// Checkpoints are written every `checkpoint_interval` epochs when an
/// output path is given; the final table is written unconditionally at the
/// end of the budget. A failed write aborts the gamut.
pub fn refine(
    basis: &SpectralBasis,
    cs: &ColorSpace,
    grid: &TargetGrid,
    predictor: &Predictor,
    config: &FitConfig,
    out_path: Option<&Path>,
) -> FitResult<SpectrumTable> {
    let scales = predictor.scales;
    let mut raw = predictor.raw_coefficients(&grid.targets);
    let mut grads = vec![0.0f32; raw.len()];
    let mut opt = Adam::new(raw.len());

    let total = config.stage_b_iters;
    for epoch in 1..=total {
        let lr = cosine_lr(config.learning_rate, epoch - 1, total);

        // Per-cell ΔE and its gradient w.r.t. the cell's raw parameters
        let (de_sum, de_max) = grads
            .par_chunks_mut(3)
            .zip(raw.par_chunks(3))
            .zip(grid.targets.par_iter())
            .map(|((grad, r), &target)| {
                let raw3 = [r[0], r[1], r[2]];
                let coeff = scales.decode(raw3);
                let (xyz, jac) = eval_xyz_with_jacobian(basis, coeff);
                let rgb = cs.xyz_to_rgb * xyz;

                // The model need not cover negative-lobed RGB; clamped
                // channels contribute no gradient
                let clamped = rgb.max_zero();
                let (de, de_drgb) = delta_e_with_grad(clamped, target, cs);
                let masked = Vec3::new(
                    if rgb.x > 0.0 { de_drgb.x } else { 0.0 },
                    if rgb.y > 0.0 { de_drgb.y } else { 0.0 },
                    if rgb.z > 0.0 { de_drgb.z } else { 0.0 },
                );

                let de_dxyz = cs.xyz_to_rgb.transform_transpose(masked);
                let de_dcoeff = jac.transform_transpose(de_dxyz);
                let dg = scales.decode_grad(raw3);
                grad[0] = de_dcoeff.x * dg[0];
                grad[1] = de_dcoeff.y * dg[1];
                grad[2] = de_dcoeff.z * dg[2];
                (de as f64, de)
            })
            .reduce(|| (0.0f64, 0.0f32), |a, b| (a.0 + b.0, a.1.max(b.1)));

        let de_mean = (de_sum / grid.targets.len() as f64) as f32;
        if !de_mean.is_finite() {
            return Err(FitError::NumericalDivergence {
                stage: "grid refinement",
                iteration: epoch,
            });
        }

        opt.step(&mut raw, &grads, lr);

        if epoch % config.log_interval.max(1) == 0 || epoch == 1 || epoch == total {
            info!(
                gamut = %cs.gamut,
                "refine epoch {epoch}/{total} lr={lr:.2e} dE_mean={de_mean:.4} dE_max={de_max:.4}"
            );
        }

        if let Some(path) = out_path {
            if config.checkpoint_interval > 0 && epoch % config.checkpoint_interval == 0 {
                let table = build_table(grid, &scales, &raw)?;
                table.write(path)?;
                info!(gamut = %cs.gamut, "checkpoint written to {}", path.display());
            }
        }
    }

    let table = build_table(grid, &scales, &raw)?;
    if let Some(path) = out_path {
        table.write(path)?;
        info!(gamut = %cs.gamut, "final table written to {}", path.display());
    }
    Ok(table)
}
