use serde::{Deserialize, Serialize};

/// Elementwise nonlinearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    /// ONNX operator name for this activation.
    #[must_use]
    pub fn op_name(self) -> &'static str {
        match self {
            Self::Relu => "Relu",
            Self::Tanh => "Tanh",
            Self::Sigmoid => "Sigmoid",
        }
    }

    pub fn apply(self, values: &mut [f32]) {
        for v in values {
            *v = match self {
                Self::Relu => v.max(0.0),
                Self::Tanh => v.tanh(),
                Self::Sigmoid => 1.0 / (1.0 + (-*v).exp()),
            };
        }
    }

    /// Derivative expressed in terms of the activation output.
    #[must_use]
    pub fn grad_from_output(self, output: f32) -> f32 {
        match self {
            Self::Relu => {
                if output > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Tanh => 1.0 - output * output,
            Self::Sigmoid => output * (1.0 - output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu() {
        let mut values = [-1.0, 0.0, 2.5];
        Activation::Relu.apply(&mut values);
        assert_eq!(values, [0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_sigmoid_midpoint() {
        let mut values = [0.0];
        Activation::Sigmoid.apply(&mut values);
        assert!((values[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_grad_matches_finite_difference() {
        let h = 1e-3f32;
        for act in [Activation::Relu, Activation::Tanh, Activation::Sigmoid] {
            for x in [-0.9f32, -0.3, 0.4, 1.2] {
                let mut lo = [x - h];
                let mut hi = [x + h];
                let mut y = [x];
                act.apply(&mut lo);
                act.apply(&mut hi);
                act.apply(&mut y);
                let numeric = (hi[0] - lo[0]) / (2.0 * h);
                let analytic = act.grad_from_output(y[0]);
                assert!(
                    (numeric - analytic).abs() < 1e-2,
                    "{act:?} at {x}: numeric {numeric} vs analytic {analytic}"
                );
            }
        }
    }
}
