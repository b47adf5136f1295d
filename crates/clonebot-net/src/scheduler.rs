//! Plateau-triggered learning-rate decay.

use serde::{Deserialize, Serialize};

/// Halves the learning rate after `patience` consecutive epochs without a
/// strict validation-loss improvement.
///
/// The plateau counter is deliberately not stored in checkpoints: resuming
/// a run restarts the counter from zero. A known resume-fidelity gap, kept
/// for compatibility with how the tool has always behaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceLrOnPlateau {
    factor: f32,
    patience: usize,
    best: f32,
    bad_epochs: usize,
}

impl ReduceLrOnPlateau {
    #[must_use]
    pub fn new(factor: f32, patience: usize) -> Self {
        Self {
            factor,
            patience,
            best: f32::INFINITY,
            bad_epochs: 0,
        }
    }

    /// Feeds one epoch's validation loss; decays `learning_rate` in place
    /// when the plateau is reached. Returns true when a decay happened.
    pub fn step(&mut self, metric: f32, learning_rate: &mut f32) -> bool {
        if metric < self.best {
            self.best = metric;
            self.bad_epochs = 0;
            return false;
        }
        self.bad_epochs += 1;
        if self.bad_epochs >= self.patience {
            *learning_rate *= self.factor;
            self.bad_epochs = 0;
            return true;
        }
        false
    }
}
