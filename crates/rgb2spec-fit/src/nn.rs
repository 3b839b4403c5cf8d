//! Fixed-shape multi-layer perceptron for the warm-start predictor.
//!
//! Parameters live in flat row-major buffers with explicit strides; the
//! reverse pass is written out by hand. The computation graph is small and
//! fixed (linear / ReLU stacks), so no autodiff machinery is carried.

use rand::Rng;
use rand::rngs::StdRng;
use rayon::prelude::*;

/// One dense layer, `output = weight · input + bias`.
///
/// `weight` is `[fan_out][fan_in]` row-major.
#[derive(Debug, Clone)]
pub struct Linear {
    /// Weight buffer, `fan_out * fan_in` entries.
    pub weight: Vec<f32>,
    /// Bias buffer, `fan_out` entries.
    pub bias: Vec<f32>,
    /// Input width.
    pub fan_in: usize,
    /// Output width.
    pub fan_out: usize,
}

impl Linear {
    /// Uniform init in ±1/√fan_in for weights and biases.
    pub fn new(fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / (fan_in as f32).sqrt();
        let mut sample = |n: usize| -> Vec<f32> {
            (0..n)
                .map(|_| (rng.r#gen::<f32>() * 2.0 - 1.0) * bound)
                .collect()
        };
        let weight = sample(fan_out * fan_in);
        let bias = sample(fan_out);
        Self {
            weight,
            bias,
            fan_in,
            fan_out,
        }
    }

    /// Applies the layer to a `[batch][fan_in]` buffer.
    pub fn forward(&self, input: &[f32], batch: usize) -> Vec<f32> {
        debug_assert_eq!(input.len(), batch * self.fan_in);
        let mut output = vec![0.0f32; batch * self.fan_out];
        output
            .par_chunks_mut(self.fan_out)
            .zip(input.par_chunks(self.fan_in))
            .for_each(|(out_row, in_row)| {
                for o in 0..self.fan_out {
                    let w = &self.weight[o * self.fan_in..(o + 1) * self.fan_in];
                    let mut acc = self.bias[o];
                    for (wi, xi) in w.iter().zip(in_row) {
                        acc += wi * xi;
                    }
                    out_row[o] = acc;
                }
            });
        output
    }
}

/// Gradients for one layer, same shapes as the parameters.
#[derive(Debug, Clone)]
pub struct LayerGrads {
    /// d loss / d weight.
    pub weight: Vec<f32>,
    /// d loss / d bias.
    pub bias: Vec<f32>,
}

/// Activations retained by a forward pass for the reverse pass.
///
/// `inputs[l]` is the (post-ReLU) input of layer l; `output` is the raw
/// final-layer output.
#[derive(Debug)]
pub struct ForwardCache {
    /// Input buffer of each layer.
    pub inputs: Vec<Vec<f32>>,
    /// Final layer output, `[batch][out]`.
    pub output: Vec<f32>,
    /// Batch size of the pass.
    pub batch: usize,
}

/// A ReLU MLP with a linear output layer.
#[derive(Debug, Clone)]
pub struct Mlp {
    /// Dense layers, applied in order with ReLU between (not after the last).
    pub layers: Vec<Linear>,
}

impl Mlp {
    /// Builds `input → hidden_width × hidden_layers → output`.
    pub fn new(
        input: usize,
        hidden_width: usize,
        hidden_layers: usize,
        output: usize,
        rng: &mut StdRng,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden_layers + 1);
        let mut fan_in = input;
        for _ in 0..hidden_layers {
            layers.push(Linear::new(fan_in, hidden_width, rng));
            fan_in = hidden_width;
        }
        layers.push(Linear::new(fan_in, output, rng));
        Self { layers }
    }

    /// Forward pass without retaining activations.
    pub fn forward(&self, input: &[f32], batch: usize) -> Vec<f32> {
        let mut x = self.layers[0].forward(input, batch);
        for layer in &self.layers[1..] {
            relu_inplace(&mut x);
            x = layer.forward(&x, batch);
        }
        x
    }

    /// Forward pass retaining per-layer inputs for [`Mlp::backward`].
    pub fn forward_cached(&self, input: &[f32], batch: usize) -> ForwardCache {
        let mut inputs = Vec::with_capacity(self.layers.len());
        inputs.push(input.to_vec());
        let mut x = self.layers[0].forward(input, batch);
        for layer in &self.layers[1..] {
            relu_inplace(&mut x);
            inputs.push(x.clone());
            x = layer.forward(&x, batch);
        }
        ForwardCache {
            inputs,
            output: x,
            batch,
        }
    }

    /// Reverse pass: gradients for every layer given d loss / d output.
    pub fn backward(&self, cache: &ForwardCache, grad_output: &[f32]) -> Vec<LayerGrads> {
        let batch = cache.batch;
        let mut grads_rev: Vec<LayerGrads> = Vec::with_capacity(self.layers.len());
        let mut delta = grad_output.to_vec();

        for l in (0..self.layers.len()).rev() {
            let layer = &self.layers[l];
            let input = &cache.inputs[l];

            // dW[o][i] = Σ_n delta[n][o] · input[n][i]
            let mut weight = vec![0.0f32; layer.fan_out * layer.fan_in];
            weight
                .par_chunks_mut(layer.fan_in)
                .enumerate()
                .for_each(|(o, w_row)| {
                    for n in 0..batch {
                        let d = delta[n * layer.fan_out + o];
                        if d != 0.0 {
                            let in_row = &input[n * layer.fan_in..(n + 1) * layer.fan_in];
                            for (w, x) in w_row.iter_mut().zip(in_row) {
                                *w += d * x;
                            }
                        }
                    }
                });

            let mut bias = vec![0.0f32; layer.fan_out];
            for n in 0..batch {
                let d_row = &delta[n * layer.fan_out..(n + 1) * layer.fan_out];
                for (b, d) in bias.iter_mut().zip(d_row) {
                    *b += d;
                }
            }

            grads_rev.push(LayerGrads { weight, bias });

            if l > 0 {
                // din[n][i] = Σ_o delta[n][o] · W[o][i], masked by the ReLU
                // that produced input[n][i]
                let mut din = vec![0.0f32; batch * layer.fan_in];
                din.par_chunks_mut(layer.fan_in)
                    .enumerate()
                    .for_each(|(n, din_row)| {
                        let d_row = &delta[n * layer.fan_out..(n + 1) * layer.fan_out];
                        for (o, &d) in d_row.iter().enumerate() {
                            if d != 0.0 {
                                let w_row =
                                    &layer.weight[o * layer.fan_in..(o + 1) * layer.fan_in];
                                for (g, w) in din_row.iter_mut().zip(w_row) {
                                    *g += d * w;
                                }
                            }
                        }
                        let in_row = &input[n * layer.fan_in..(n + 1) * layer.fan_in];
                        for (g, &x) in din_row.iter_mut().zip(in_row) {
                            if x <= 0.0 {
                                *g = 0.0;
                            }
                        }
                    });
                delta = din;
            }
        }

        grads_rev.reverse();
        grads_rev
    }

    /// True if every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.layers
            .iter()
            .all(|l| l.weight.iter().all(|w| w.is_finite()) && l.bias.iter().all(|b| b.is_finite()))
    }
}

#[inline]
fn relu_inplace(x: &mut [f32]) {
    for v in x {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}
