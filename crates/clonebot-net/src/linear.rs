use rand::Rng;
use serde::{Deserialize, Serialize};

/// Dense layer with weights stored row-major as `[out_dim][in_dim]`.
///
/// The storage order matches the ONNX `Gemm` convention with `transB = 1`,
/// so the exporter can hand the buffer over without reshaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linear {
    pub in_dim: usize,
    pub out_dim: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

/// Gradients from one backward pass through a layer.
#[derive(Debug, Clone)]
pub struct LinearGrads {
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
    /// Gradient with respect to the layer input, for the previous layer.
    pub input: Vec<f32>,
}

impl Linear {
    /// Uniform init in `±1/sqrt(in_dim)` for both weights and biases, the
    /// standard dense-layer default.
    pub fn random<R>(in_dim: usize, out_dim: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let bound = 1.0 / (in_dim as f32).sqrt();
        let mut sample = || rng.random_range(-bound..=bound);
        Self {
            in_dim,
            out_dim,
            weight: (0..in_dim * out_dim).map(|_| sample()).collect(),
            bias: (0..out_dim).map(|_| sample()).collect(),
        }
    }

    /// Forward pass over a batch laid out row-major as `[batch][in_dim]`.
    #[must_use]
    pub fn forward(&self, input: &[f32], batch: usize) -> Vec<f32> {
        debug_assert_eq!(input.len(), batch * self.in_dim);
        let mut output = vec![0.0; batch * self.out_dim];
        for b in 0..batch {
            let row = &input[b * self.in_dim..(b + 1) * self.in_dim];
            let out_row = &mut output[b * self.out_dim..(b + 1) * self.out_dim];
            for (o, out) in out_row.iter_mut().enumerate() {
                let weights = &self.weight[o * self.in_dim..(o + 1) * self.in_dim];
                let mut acc = self.bias[o];
                for (x, w) in row.iter().zip(weights) {
                    acc += x * w;
                }
                *out = acc;
            }
        }
        output
    }

    /// Backward pass: given the forward input and the loss gradient at the
    /// layer output, produces parameter gradients and the input gradient.
    #[must_use]
    pub fn backward(&self, input: &[f32], grad_output: &[f32], batch: usize) -> LinearGrads {
        debug_assert_eq!(input.len(), batch * self.in_dim);
        debug_assert_eq!(grad_output.len(), batch * self.out_dim);
        let mut grads = LinearGrads {
            weight: vec![0.0; self.weight.len()],
            bias: vec![0.0; self.bias.len()],
            input: vec![0.0; input.len()],
        };
        for b in 0..batch {
            let row = &input[b * self.in_dim..(b + 1) * self.in_dim];
            let grad_row = &grad_output[b * self.out_dim..(b + 1) * self.out_dim];
            let input_grad_row = &mut grads.input[b * self.in_dim..(b + 1) * self.in_dim];
            for (o, &g) in grad_row.iter().enumerate() {
                grads.bias[o] += g;
                let weights = &self.weight[o * self.in_dim..(o + 1) * self.in_dim];
                let weight_grads = &mut grads.weight[o * self.in_dim..(o + 1) * self.in_dim];
                for i in 0..self.in_dim {
                    weight_grads[i] += g * row[i];
                    input_grad_row[i] += g * weights[i];
                }
            }
        }
        grads
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.weight.len() + self.bias.len()
    }
}

#[cfg(test)]
mod tests {
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_forward_known_values() {
        let layer = Linear {
            in_dim: 2,
            out_dim: 2,
            // Row 0 = [1, 2], row 1 = [3, 4].
            weight: vec![1.0, 2.0, 3.0, 4.0],
            bias: vec![0.5, -0.5],
        };
        let out = layer.forward(&[1.0, 1.0, 2.0, 0.0], 2);
        assert_eq!(out, vec![3.5, 6.5, 2.5, 5.5]);
    }

    #[test]
    fn test_backward_matches_finite_difference() {
        let mut rng = Pcg64Mcg::new(7);
        let mut layer = Linear::random(3, 2, &mut rng);
        let input: Vec<f32> = (0..6).map(|i| 0.1 * i as f32 - 0.2).collect();
        let grad_out = vec![1.0, -0.5, 0.3, 0.7];

        let grads = layer.backward(&input, &grad_out, 2);

        // Scalar loss L = sum(grad_out * output); check dL/dw numerically.
        let h = 1e-3f32;
        for p in [0, 2, 5] {
            let orig = layer.weight[p];
            layer.weight[p] = orig + h;
            let hi: f32 = layer
                .forward(&input, 2)
                .iter()
                .zip(&grad_out)
                .map(|(y, g)| y * g)
                .sum();
            layer.weight[p] = orig - h;
            let lo: f32 = layer
                .forward(&input, 2)
                .iter()
                .zip(&grad_out)
                .map(|(y, g)| y * g)
                .sum();
            layer.weight[p] = orig;
            let numeric = (hi - lo) / (2.0 * h);
            assert!(
                (numeric - grads.weight[p]).abs() < 1e-2,
                "weight {p}: numeric {numeric} vs analytic {}",
                grads.weight[p]
            );
        }
    }

    #[test]
    fn test_random_init_is_bounded_by_fan_in() {
        let mut rng = Pcg64Mcg::new(99);
        let layer = Linear::random(16, 8, &mut rng);
        let bound = 1.0 / 4.0;
        assert!(layer.weight.iter().all(|w| w.abs() <= bound));
        assert!(layer.bias.iter().all(|b| b.abs() <= bound));
    }
}
