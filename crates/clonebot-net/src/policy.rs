//! The two-head behavior-clone policy network.

use clonebot_schema::{ACTION_LEN, BINARY_LEN, CONTINUOUS_LEN};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    activation::Activation,
    linear::{Linear, LinearGrads},
    loss::{BINARY_LOSS_WEIGHT, bce, mse},
    optimizer::Adam,
};

/// Feedforward policy: shared ReLU/dropout trunk, a tanh head for the five
/// continuous outputs and a sigmoid head for the four button outputs.
///
/// Predictions concatenate continuous-first, matching the action vector
/// layout; that ordering is part of the contract with the inference
/// consumer and must never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyNetwork {
    input_size: usize,
    dropout: f32,
    hidden: Vec<Linear>,
    continuous_head: Linear,
    binary_head: Linear,
}

struct TrunkTrace {
    input: Vec<f32>,
    output: Vec<f32>,
    mask: Option<Vec<f32>>,
}

impl PolicyNetwork {
    pub fn random<R>(input_size: usize, hidden_sizes: &[usize], dropout: f32, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut hidden = Vec::with_capacity(hidden_sizes.len());
        let mut prev = input_size;
        for &width in hidden_sizes {
            hidden.push(Linear::random(prev, width, rng));
            prev = width;
        }
        Self {
            input_size,
            dropout,
            hidden,
            continuous_head: Linear::random(prev, CONTINUOUS_LEN, rng),
            binary_head: Linear::random(prev, BINARY_LEN, rng),
        }
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        ACTION_LEN
    }

    #[must_use]
    pub fn hidden_sizes(&self) -> Vec<usize> {
        self.hidden.iter().map(|l| l.out_dim).collect()
    }

    #[must_use]
    pub fn hidden_layers(&self) -> &[Linear] {
        &self.hidden
    }

    #[must_use]
    pub fn continuous_head(&self) -> &Linear {
        &self.continuous_head
    }

    #[must_use]
    pub fn binary_head(&self) -> &Linear {
        &self.binary_head
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.hidden
            .iter()
            .map(Linear::param_count)
            .sum::<usize>()
            + self.continuous_head.param_count()
            + self.binary_head.param_count()
    }

    /// Inference-mode forward pass; returns the 9-wide concatenated action
    /// prediction per batch row.
    #[must_use]
    pub fn forward(&self, features: &[f32], batch: usize) -> Vec<f32> {
        let traces = self.forward_trunk(features, batch, None);
        let trunk_out = traces.last().map_or(features, |t| t.output.as_slice());
        let (y_cont, y_bin) = self.forward_heads(trunk_out, batch);

        let mut out = Vec::with_capacity(batch * ACTION_LEN);
        for b in 0..batch {
            out.extend_from_slice(&y_cont[b * CONTINUOUS_LEN..(b + 1) * CONTINUOUS_LEN]);
            out.extend_from_slice(&y_bin[b * BINARY_LEN..(b + 1) * BINARY_LEN]);
        }
        out
    }

    /// Single-sample convenience wrapper around [`PolicyNetwork::forward`].
    #[must_use]
    pub fn predict(&self, features: &[f32]) -> Vec<f32> {
        self.forward(features, 1)
    }

    /// One optimization step over a batch; returns the blended loss.
    pub fn train_batch<R>(
        &mut self,
        features: &[f32],
        targets: &[f32],
        batch: usize,
        optimizer: &mut Adam,
        rng: &mut R,
    ) -> f32
    where
        R: RngCore,
    {
        let (loss, grads) = self.compute_grads(features, targets, batch, Some(rng));
        optimizer.step(self.param_slices_mut(), &grads);
        loss
    }

    /// Forward-only blended loss, dropout disabled.
    #[must_use]
    pub fn eval_loss(&self, features: &[f32], targets: &[f32], batch: usize) -> f32 {
        let traces = self.forward_trunk(features, batch, None);
        let trunk_out = traces.last().map_or(features, |t| t.output.as_slice());
        let (y_cont, y_bin) = self.forward_heads(trunk_out, batch);
        let (t_cont, t_bin) = split_targets(targets, batch);
        mse(&y_cont, &t_cont) + BINARY_LOSS_WEIGHT * bce(&y_bin, &t_bin)
    }

    fn forward_trunk(
        &self,
        features: &[f32],
        batch: usize,
        mut dropout_rng: Option<&mut dyn RngCore>,
    ) -> Vec<TrunkTrace> {
        debug_assert_eq!(features.len(), batch * self.input_size);
        let mut traces: Vec<TrunkTrace> = Vec::with_capacity(self.hidden.len());
        for layer in &self.hidden {
            let input = traces
                .last()
                .map_or_else(|| features.to_vec(), |t| t.output.clone());
            let mut output = layer.forward(&input, batch);
            Activation::Relu.apply(&mut output);

            let mask = dropout_rng.as_mut().filter(|_| self.dropout > 0.0).map(|rng| {
                let keep = 1.0 - self.dropout;
                let scale = 1.0 / keep;
                let mut mask = vec![0.0f32; output.len()];
                for (m, o) in mask.iter_mut().zip(&mut output) {
                    if rng.random::<f32>() < keep {
                        *m = scale;
                        *o *= scale;
                    } else {
                        *o = 0.0;
                    }
                }
                mask
            });

            traces.push(TrunkTrace {
                input,
                output,
                mask,
            });
        }
        traces
    }

    fn forward_heads(&self, trunk_out: &[f32], batch: usize) -> (Vec<f32>, Vec<f32>) {
        let mut y_cont = self.continuous_head.forward(trunk_out, batch);
        Activation::Tanh.apply(&mut y_cont);
        let mut y_bin = self.binary_head.forward(trunk_out, batch);
        Activation::Sigmoid.apply(&mut y_bin);
        (y_cont, y_bin)
    }

    /// Loss and per-tensor gradients for one batch. The gradient order
    /// matches [`PolicyNetwork::param_slices_mut`].
    fn compute_grads(
        &self,
        features: &[f32],
        targets: &[f32],
        batch: usize,
        dropout_rng: Option<&mut dyn RngCore>,
    ) -> (f32, Vec<Vec<f32>>) {
        let traces = self.forward_trunk(features, batch, dropout_rng);
        let trunk_out = traces.last().map_or(features, |t| t.output.as_slice());
        let (y_cont, y_bin) = self.forward_heads(trunk_out, batch);
        let (t_cont, t_bin) = split_targets(targets, batch);

        let loss = mse(&y_cont, &t_cont) + BINARY_LOSS_WEIGHT * bce(&y_bin, &t_bin);

        // d loss / d pre-activation for each head. Tanh folds in through
        // 1 - y^2; sigmoid + BCE collapse to (y - t) / n.
        let n_cont = y_cont.len() as f32;
        let dz_cont: Vec<f32> = y_cont
            .iter()
            .zip(&t_cont)
            .map(|(y, t)| 2.0 * (y - t) / n_cont * Activation::Tanh.grad_from_output(*y))
            .collect();
        let n_bin = y_bin.len() as f32;
        let dz_bin: Vec<f32> = y_bin
            .iter()
            .zip(&t_bin)
            .map(|(y, t)| BINARY_LOSS_WEIGHT * (y - t) / n_bin)
            .collect();

        let g_cont = self.continuous_head.backward(trunk_out, &dz_cont, batch);
        let g_bin = self.binary_head.backward(trunk_out, &dz_bin, batch);
        let mut d_out: Vec<f32> = g_cont
            .input
            .iter()
            .zip(&g_bin.input)
            .map(|(a, b)| a + b)
            .collect();

        let mut trunk_grads_rev: Vec<LinearGrads> = Vec::with_capacity(self.hidden.len());
        for (layer, trace) in self.hidden.iter().zip(&traces).rev() {
            let mut dz = d_out;
            for (i, d) in dz.iter_mut().enumerate() {
                let scale = trace.mask.as_ref().map_or(1.0, |m| m[i]);
                *d *= scale * Activation::Relu.grad_from_output(trace.output[i]);
            }
            let g = layer.backward(&trace.input, &dz, batch);
            d_out = g.input.clone();
            trunk_grads_rev.push(g);
        }

        let mut grads = Vec::with_capacity(2 * (self.hidden.len() + 2));
        for g in trunk_grads_rev.into_iter().rev() {
            grads.push(g.weight);
            grads.push(g.bias);
        }
        grads.push(g_cont.weight);
        grads.push(g_cont.bias);
        grads.push(g_bin.weight);
        grads.push(g_bin.bias);
        (loss, grads)
    }

    fn param_slices_mut(&mut self) -> Vec<&mut [f32]> {
        let mut params = Vec::with_capacity(2 * (self.hidden.len() + 2));
        for layer in &mut self.hidden {
            params.push(layer.weight.as_mut_slice());
            params.push(layer.bias.as_mut_slice());
        }
        params.push(self.continuous_head.weight.as_mut_slice());
        params.push(self.continuous_head.bias.as_mut_slice());
        params.push(self.binary_head.weight.as_mut_slice());
        params.push(self.binary_head.bias.as_mut_slice());
        params
    }
}

fn split_targets(targets: &[f32], batch: usize) -> (Vec<f32>, Vec<f32>) {
    debug_assert_eq!(targets.len(), batch * ACTION_LEN);
    let mut cont = Vec::with_capacity(batch * CONTINUOUS_LEN);
    let mut bin = Vec::with_capacity(batch * BINARY_LEN);
    for row in targets.chunks_exact(ACTION_LEN) {
        cont.extend_from_slice(&row[..CONTINUOUS_LEN]);
        bin.extend_from_slice(&row[CONTINUOUS_LEN..]);
    }
    (cont, bin)
}
