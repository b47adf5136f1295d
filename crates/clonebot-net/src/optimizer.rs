//! Adam optimizer with serializable moment state.

use serde::{Deserialize, Serialize};

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Moments {
    m: Vec<f32>,
    v: Vec<f32>,
}

/// Adam with the standard defaults (beta1 0.9, beta2 0.999, eps 1e-8).
///
/// Moment buffers are allocated lazily on the first step so the optimizer
/// can be constructed before the parameter shapes are known. The whole
/// state serializes into checkpoints, so resuming restores momentum
/// exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step_count: u64,
    moments: Vec<Moments>,
}

impl Adam {
    #[must_use]
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step_count: 0,
            moments: Vec::new(),
        }
    }

    /// Applies one update across the full ordered parameter list.
    ///
    /// The tensor order must stay identical across calls; it defines which
    /// moment buffer belongs to which tensor.
    ///
    /// # Panics
    ///
    /// Panics if the parameter and gradient lists disagree in shape.
    pub fn step(&mut self, mut params: Vec<&mut [f32]>, grads: &[Vec<f32>]) {
        assert_eq!(params.len(), grads.len());
        if self.moments.is_empty() {
            self.moments = params
                .iter()
                .map(|p| Moments {
                    m: vec![0.0; p.len()],
                    v: vec![0.0; p.len()],
                })
                .collect();
        }
        assert_eq!(self.moments.len(), params.len());

        self.step_count += 1;
        let bias1 = 1.0 - self.beta1.powi(self.step_count as i32);
        let bias2 = 1.0 - self.beta2.powi(self.step_count as i32);

        for ((param, grad), moments) in params.iter_mut().zip(grads).zip(&mut self.moments) {
            assert_eq!(param.len(), grad.len());
            for ((p, &g), (m, v)) in param
                .iter_mut()
                .zip(grad)
                .zip(moments.m.iter_mut().zip(&mut moments.v))
            {
                *m = self.beta1 * *m + (1.0 - self.beta1) * g;
                *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
                let m_hat = *m / bias1;
                let v_hat = *v / bias2;
                *p -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
            }
        }
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }
}
