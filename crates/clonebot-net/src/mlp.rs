//! Plain single-output-head perceptron used for synthesized test models.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{activation::Activation, linear::Linear};

/// One fully connected layer with an optional activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpLayer {
    pub linear: Linear,
    pub activation: Option<Activation>,
}

/// A feedforward stack of [`MlpLayer`]s. Unlike [`PolicyNetwork`] this has a
/// single output head and no training support; it exists to synthesize
/// throwaway models with known shapes.
///
/// [`PolicyNetwork`]: crate::PolicyNetwork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    layers: Vec<MlpLayer>,
}

impl Mlp {
    /// Builds a randomly initialized network from `dims` (input size first,
    /// output size last) with ReLU between hidden layers and
    /// `final_activation` on the output layer.
    ///
    /// # Panics
    ///
    /// Panics if `dims` has fewer than two entries.
    pub fn random<R>(dims: &[usize], final_activation: Option<Activation>, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        assert!(dims.len() >= 2, "need at least input and output sizes");
        let mut layers = Vec::with_capacity(dims.len() - 1);
        for (i, pair) in dims.windows(2).enumerate() {
            let activation = if i + 2 < dims.len() {
                Some(Activation::Relu)
            } else {
                final_activation
            };
            layers.push(MlpLayer {
                linear: Linear::random(pair[0], pair[1], rng),
                activation,
            });
        }
        Self { layers }
    }

    #[must_use]
    pub fn layers(&self) -> &[MlpLayer] {
        &self.layers
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers[0].linear.in_dim
    }

    #[must_use]
    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].linear.out_dim
    }

    #[must_use]
    pub fn forward(&self, input: &[f32], batch: usize) -> Vec<f32> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.linear.forward(&current, batch);
            if let Some(activation) = layer.activation {
                activation.apply(&mut current);
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use rand_pcg::Pcg64Mcg;

    use super::*;

    #[test]
    fn test_random_shapes_and_activations() {
        let mut rng = Pcg64Mcg::new(7);
        let net = Mlp::random(&[64, 32, 10], Some(Activation::Tanh), &mut rng);
        assert_eq!(net.input_size(), 64);
        assert_eq!(net.output_size(), 10);
        assert_eq!(net.layers().len(), 2);
        assert_eq!(net.layers()[0].activation, Some(Activation::Relu));
        assert_eq!(net.layers()[1].activation, Some(Activation::Tanh));
    }

    #[test]
    fn test_forward_batch_dims() {
        let mut rng = Pcg64Mcg::new(9);
        let net = Mlp::random(&[16, 8, 4], Some(Activation::Tanh), &mut rng);
        let out = net.forward(&vec![0.5; 16 * 3], 3);
        assert_eq!(out.len(), 4 * 3);
        assert!(out.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
