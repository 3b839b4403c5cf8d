//! Fitting configuration.
//!
//! Every constant of the fitting procedure lives here so the CLI can
//! override it; the defaults are the full production training settings.

/// Configuration for a full two-stage fit of one gamut.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Grid resolution N per axis (tables are N^3 per major axis).
    pub table_size: usize,
    /// Stage A iteration budget. Fixed; there is no early stopping.
    pub stage_a_iters: usize,
    /// Stage B epoch budget. Fixed; there is no early stopping.
    pub stage_b_iters: usize,
    /// Base learning rate, cosine-annealed to zero over each stage.
    pub learning_rate: f32,
    /// Mini-batch size for each Stage A update.
    pub batch_size: usize,
    /// Size of the pre-generated uniform RGB sampling pool.
    pub pool_size: usize,
    /// Loss weight of the pure-green adversarial batch.
    pub green_weight: f32,
    /// Loss weight of the dark/zero-channel adversarial batch.
    pub dark_weight: f32,
    /// Upper bound of the per-channel intensity in the dark batch.
    pub dark_intensity: f32,
    /// L2 penalty applied to the learned coefficient scales.
    pub scale_reg: f32,
    /// Width of each hidden layer of the warm-start predictor.
    pub hidden_width: usize,
    /// Number of hidden layers of the warm-start predictor.
    pub hidden_layers: usize,
    /// Stage B epochs between checkpoint serializations.
    pub checkpoint_interval: usize,
    /// Iterations between monitoring log lines.
    pub log_interval: usize,
    /// RNG seed for pool generation, batch sampling, and predictor init.
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            table_size: 64,
            stage_a_iters: 15000,
            stage_b_iters: 15000,
            learning_rate: 1e-3,
            batch_size: 4096,
            pool_size: 1 << 20,
            green_weight: 5.0,
            dark_weight: 5.0,
            dark_intensity: 0.1,
            scale_reg: 1e-6,
            hidden_width: 512,
            hidden_layers: 5,
            checkpoint_interval: 2500,
            log_interval: 1000,
            seed: 0,
        }
    }
}
