//! # rgb2spec-fit
//!
//! The spectral table fitting engine. For a given RGB gamut it fits, per
//! grid cell of a 3-axis target grid, the three coefficients of a sigmoid
//! quadratic reflectance model such that integrating that spectrum against
//! the CIE 1931 2° observer and the D65 illuminant, then converting
//! XYZ→RGB, reproduces the cell's target color within a small ΔE.
//!
//! # Pipeline
//!
//! 1. [`SpectralBasis`] - 1 nm wavelength axis, CMFs, unit-luminance D65.
//! 2. [`TargetGrid`] - double-smoothstep z-nodes, 3 × N³ RGB targets.
//! 3. Stage A ([`stage_a`]) - a warm-start MLP learns RGB → raw
//!    coefficients by stochastic gradient descent, with adversarial green
//!    and dark batches.
//! 4. Stage B ([`stage_b`]) - per-cell coefficients are refined directly
//!    against the grid, minimizing ΔE, with periodic checkpoints.
//!
//! Gradients throughout are closed-form; there is no autodiff runtime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use rgb2spec_fit::{FitConfig, fit_gamut};
//! use rgb2spec_primaries::Gamut;
//!
//! let config = FitConfig::default();
//! let table = fit_gamut(Gamut::Srgb, &config, None).unwrap();
//! assert_eq!(table.size(), config.table_size);
//! ```
//!
//! # Dependencies
//!
//! - [`rgb2spec-math`] / [`rgb2spec-primaries`] / [`rgb2spec-table`]
//! - [`rayon`] - data-parallel batch evaluation inside each step
//! - [`rand`] - seeded stochastic sampling and predictor init
//! - [`tracing`] - training monitor lines
//!
//! # Used By
//!
//! - `rgb2spec-cli` - the `fit` and `verify` subcommands

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod basis;
mod config;
pub mod data;
mod error;
pub mod grid;
pub mod lab;
pub mod model;
pub mod nn;
pub mod optim;
pub mod stage_a;
pub mod stage_b;
pub mod verify;

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rgb2spec_primaries::{ColorSpace, Gamut};
use rgb2spec_table::SpectrumTable;
use tracing::info;

pub use basis::SpectralBasis;
pub use config::FitConfig;
pub use error::{FitError, FitResult};
pub use grid::TargetGrid;
pub use stage_a::Predictor;
pub use verify::VerifyStats;

/// Runs the full two-stage fit for one gamut.
///
/// When `out_path` is given, Stage B checkpoints there periodically and the
/// final table is written there unconditionally; the returned table is the
/// final coefficient state either way. Stages run strictly sequentially on
/// the calling thread.
pub fn fit_gamut(
    gamut: Gamut,
    config: &FitConfig,
    out_path: Option<&Path>,
) -> FitResult<SpectrumTable> {
    let basis = SpectralBasis::new();
    let cs = ColorSpace::from_gamut(gamut);
    let grid = TargetGrid::build(config.table_size);
    let mut rng = StdRng::seed_from_u64(config.seed);

    info!(gamut = %gamut, "stage A: training warm-start predictor");
    let predictor = stage_a::train_warm_start(&basis, &cs, config, &mut rng)?;

    info!(gamut = %gamut, "stage B: refining {} grid cells", grid.cell_count());
    stage_b::refine(&basis, &cs, &grid, &predictor, config, out_path)
}
