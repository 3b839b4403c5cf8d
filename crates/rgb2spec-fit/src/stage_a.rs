//! Stage A: warm-start predictor training.
//!
//! A small MLP learns to map an RGB triple to raw spectral coefficients so
//! that the decode → spectrum → tristimulus → gamut round trip returns the
//! input. Reconstruction error concentrates at saturated green and at
//! near-black colors with exact zero channels, so those two families get
//! their own weighted loss terms, applied as separate gradient steps within
//! each iteration.

use rand::Rng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use rgb2spec_math::Vec3;
use rgb2spec_primaries::ColorSpace;
use tracing::info;

use crate::basis::SpectralBasis;
use crate::config::FitConfig;
use crate::error::{FitError, FitResult};
use crate::lab::delta_e;
use crate::model::{CoeffScales, eval_xyz_with_jacobian};
use crate::nn::Mlp;
use crate::optim::{Adam, Adam2, cosine_lr};

/// The trained warm-start predictor: the MLP plus the learned decode
/// scales it was trained against. Stage B freezes both.
#[derive(Debug, Clone)]
pub struct Predictor {
    /// RGB → raw coefficient network.
    pub mlp: Mlp,
    /// Learned decode scales.
    pub scales: CoeffScales,
}

impl Predictor {
    /// Evaluates the predictor on a slice of RGB triples, returning the
    /// flat raw coefficient buffer (3 per input).
    pub fn raw_coefficients(&self, rgbs: &[Vec3]) -> Vec<f32> {
        // Chunked to bound peak activation memory on grid-sized inputs
        const CHUNK: usize = 8192;
        let mut out = Vec::with_capacity(rgbs.len() * 3);
        for chunk in rgbs.chunks(CHUNK) {
            let mut input = Vec::with_capacity(chunk.len() * 3);
            for rgb in chunk {
                input.extend_from_slice(&rgb.to_array());
            }
            out.extend_from_slice(&self.mlp.forward(&input, chunk.len()));
        }
        out
    }

    /// Decoded coefficients for a single RGB value.
    pub fn coefficients(&self, rgb: Vec3) -> [f32; 3] {
        let raw = self.mlp.forward(&rgb.to_array(), 1);
        self.scales.decode([raw[0], raw[1], raw[2]])
    }
}

/// Result of one forward/backward evaluation over a batch.
struct BatchEval {
    /// Weighted MSE loss of the batch.
    loss: f32,
    /// Predicted RGB per sample, for monitoring.
    pred: Vec<Vec3>,
    /// d loss / d raw outputs, flat `[batch][3]`.
    raw_grads: Vec<f32>,
    /// d loss / d scales.
    scale_grads: [f32; 3],
}

/// Forward + reverse through the spectral pipeline for one mini-batch.
///
/// Loss is `weight * mean((pred - target)²)` over all batch elements and
/// channels, matching an elementwise MSE mean.
fn eval_batch(
    basis: &SpectralBasis,
    cs: &ColorSpace,
    scales: &CoeffScales,
    raw_out: &[f32],
    targets: &[Vec3],
    weight: f32,
) -> BatchEval {
    let batch = targets.len();
    let norm = 2.0 * weight / (batch as f32 * 3.0);

    let per_sample: Vec<(Vec3, [f32; 3], [f32; 3], f32)> = targets
        .par_iter()
        .enumerate()
        .map(|(n, &target)| {
            let raw = [raw_out[3 * n], raw_out[3 * n + 1], raw_out[3 * n + 2]];
            let coeff = scales.decode(raw);
            let (xyz, jac) = eval_xyz_with_jacobian(basis, coeff);
            let rgb = cs.xyz_to_rgb * xyz;

            let diff = rgb - target;
            let dl_drgb = diff * norm;
            let dl_dxyz = cs.xyz_to_rgb.transform_transpose(dl_drgb);
            let dl_dcoeff = jac.transform_transpose(dl_dxyz);

            let dg = scales.decode_grad(raw);
            let sg = scales.scale_grad(raw);
            let raw_grad = [
                dl_dcoeff.x * dg[0],
                dl_dcoeff.y * dg[1],
                dl_dcoeff.z * dg[2],
            ];
            let scale_grad = [
                dl_dcoeff.x * sg[0],
                dl_dcoeff.y * sg[1],
                dl_dcoeff.z * sg[2],
            ];
            (rgb, raw_grad, scale_grad, diff.dot(diff))
        })
        .collect();

    let mut pred = Vec::with_capacity(batch);
    let mut raw_grads = Vec::with_capacity(batch * 3);
    let mut scale_grads = [0.0f32; 3];
    let mut sq_sum = 0.0f64;
    for (rgb, rg, sg, sq) in per_sample {
        pred.push(rgb);
        raw_grads.extend_from_slice(&rg);
        for i in 0..3 {
            scale_grads[i] += sg[i];
        }
        sq_sum += sq as f64;
    }

    BatchEval {
        loss: weight * (sq_sum / (batch as f64 * 3.0)) as f32,
        pred,
        raw_grads,
        scale_grads,
    }
}

/// Mean and max ΔE of a batch against its targets.
fn delta_e_stats(pred: &[Vec3], targets: &[Vec3], cs: &ColorSpace) -> (f32, f32) {
    let (sum, max) = pred
        .par_iter()
        .zip(targets)
        .map(|(&p, &t)| delta_e(p, t, cs))
        .map(|e| (e as f64, e))
        .reduce(|| (0.0, 0.0), |a, b| (a.0 + b.0, a.1.max(b.1)));
    ((sum / pred.len() as f64) as f32, max)
}

/// Trains the warm-start predictor for one gamut.
///
/// Fixed iteration budget, no early stopping; a non-finite loss is fatal.
pub fn train_warm_start(
    basis: &SpectralBasis,
    cs: &ColorSpace,
    config: &FitConfig,
    rng: &mut StdRng,
) -> FitResult<Predictor> {
    let mut mlp = Mlp::new(3, config.hidden_width, config.hidden_layers, 3, rng);
    let mut scales = CoeffScales::INIT;

    let mut layer_opts: Vec<Adam2> = mlp
        .layers
        .iter()
        .map(|l| Adam2::new(l.weight.len(), l.bias.len()))
        .collect();
    let mut scale_opt = Adam::new(3);

    // Pre-generated sampling pool of uniform RGB triples
    let pool: Vec<Vec3> = (0..config.pool_size)
        .map(|_| Vec3::new(rng.r#gen(), rng.r#gen(), rng.r#gen()))
        .collect();

    let total = config.stage_a_iters;
    for iter in 0..total {
        let lr = cosine_lr(config.learning_rate, iter, total);

        // General batch from the pool
        let general: Vec<Vec3> = (0..config.batch_size)
            .map(|_| pool[rng.gen_range(0..pool.len())])
            .collect();
        // Saturated green: R = B = 0
        let green: Vec<Vec3> = (0..config.batch_size)
            .map(|_| Vec3::new(0.0, rng.r#gen(), 0.0))
            .collect();
        // Dark: low intensity with a random channel subset forced to zero
        let dark: Vec<Vec3> = (0..config.batch_size)
            .map(|_| {
                let mut rgb = Vec3::new(
                    rng.r#gen::<f32>() * config.dark_intensity,
                    rng.r#gen::<f32>() * config.dark_intensity,
                    rng.r#gen::<f32>() * config.dark_intensity,
                );
                for ch in 0..3 {
                    if rng.gen_bool(0.5) {
                        rgb[ch] = 0.0;
                    }
                }
                rgb
            })
            .collect();

        let mut monitor: Vec<(&str, Vec<Vec3>, Vec<Vec3>)> = Vec::new();

        // Three sequential updates: general (with scale regularization),
        // green, dark
        let batches: [(&'static str, &[Vec3], f32, bool); 3] = [
            ("general", general.as_slice(), 1.0, true),
            ("green", green.as_slice(), config.green_weight, false),
            ("dark", dark.as_slice(), config.dark_weight, false),
        ];
        for (label, targets, weight, regularize) in batches {
            let mut input = Vec::with_capacity(targets.len() * 3);
            for rgb in targets {
                input.extend_from_slice(&rgb.to_array());
            }
            let cache = mlp.forward_cached(&input, targets.len());
            let mut eval = eval_batch(basis, cs, &scales, &cache.output, targets, weight);

            let mut loss = eval.loss;
            if regularize {
                loss += config.scale_reg * scales.squared_norm();
                eval.scale_grads[0] += 2.0 * config.scale_reg * scales.a;
                eval.scale_grads[1] += 2.0 * config.scale_reg * scales.b;
                eval.scale_grads[2] += 2.0 * config.scale_reg * scales.c;
            }
            if !loss.is_finite() {
                return Err(FitError::NumericalDivergence {
                    stage: "warm-start training",
                    iteration: iter,
                });
            }

            let grads = mlp.backward(&cache, &eval.raw_grads);
            for (layer, (opt, grad)) in mlp
                .layers
                .iter_mut()
                .zip(layer_opts.iter_mut().zip(&grads))
            {
                opt.weight.step(&mut layer.weight, &grad.weight, lr);
                opt.bias.step(&mut layer.bias, &grad.bias, lr);
            }
            let mut s = [scales.a, scales.b, scales.c];
            scale_opt.step(&mut s, &eval.scale_grads, lr);
            scales = CoeffScales {
                a: s[0],
                b: s[1],
                c: s[2],
            };

            if label != "dark" {
                monitor.push((label, std::mem::take(&mut eval.pred), targets.to_vec()));
            }
        }

        if iter % config.log_interval.max(1) == 0 || iter + 1 == total {
            let mut line = format!("warm-start iter {iter}/{total} lr={lr:.2e}");
            for (label, pred, targets) in &monitor {
                let (mean, max) = delta_e_stats(pred, targets, cs);
                line.push_str(&format!(" dE_{label}={mean:.4}/{max:.4}"));
            }
            info!(gamut = %cs.gamut, "{line}");
        }
    }

    if !mlp.is_finite() || !scales.is_finite() {
        return Err(FitError::NumericalDivergence {
            stage: "warm-start training",
            iteration: total,
        });
    }

    Ok(Predictor { mlp, scales })
}
