//! Loss terms for the two output heads.
//!
//! The blended training loss is `mse(continuous) + BINARY_LOSS_WEIGHT *
//! bce(binary)`; buttons are weighted lower so the regression targets
//! dominate early training.

/// Weight applied to the binary-head BCE term.
pub const BINARY_LOSS_WEIGHT: f32 = 0.5;

/// Probability clamp keeping `ln` finite for saturated sigmoid outputs.
const BCE_EPS: f32 = 1e-7;

/// Mean squared error over all elements.
#[must_use]
pub fn mse(predictions: &[f32], targets: &[f32]) -> f32 {
    debug_assert_eq!(predictions.len(), targets.len());
    if predictions.is_empty() {
        return 0.0;
    }
    let sum: f32 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    sum / predictions.len() as f32
}

/// Mean binary cross-entropy over all elements; predictions are
/// probabilities in `(0, 1)`.
#[must_use]
pub fn bce(predictions: &[f32], targets: &[f32]) -> f32 {
    debug_assert_eq!(predictions.len(), targets.len());
    if predictions.is_empty() {
        return 0.0;
    }
    let sum: f32 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| {
            let p = p.clamp(BCE_EPS, 1.0 - BCE_EPS);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    sum / predictions.len() as f32
}
