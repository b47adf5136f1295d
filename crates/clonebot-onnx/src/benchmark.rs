//! Single-sample inference latency measurement.

use std::time::Instant;

use rand::Rng as _;

use crate::session::OnnxSession;

const WARMUP_ITERATIONS: usize = 10;
const MEASURE_ITERATIONS: usize = 1000;

/// Verdict on whether the model is fast enough for per-frame use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LatencyRating {
    /// Under 0.5 ms per inference.
    #[display("excellent, suitable for per-frame inference")]
    Excellent,
    /// Under 1 ms per inference.
    #[display("good, suitable for real-time use")]
    Good,
    /// Under 2 ms per inference.
    #[display("acceptable, may limit tick rate")]
    Acceptable,
    /// 2 ms or more per inference.
    #[display("too slow for real-time use")]
    TooSlow,
}

impl LatencyRating {
    #[must_use]
    pub fn from_mean_ms(mean_ms: f64) -> Self {
        if mean_ms < 0.5 {
            Self::Excellent
        } else if mean_ms < 1.0 {
            Self::Good
        } else if mean_ms < 2.0 {
            Self::Acceptable
        } else {
            Self::TooSlow
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub iterations: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub rating: LatencyRating,
}

impl std::fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} iterations: mean {:.3} ms, min {:.3} ms, max {:.3} ms ({})",
            self.iterations, self.mean_ms, self.min_ms, self.max_ms, self.rating
        )
    }
}

/// Times single-row inference over a random input after a short warmup.
pub fn benchmark_model(session: &OnnxSession) -> anyhow::Result<BenchmarkReport> {
    let mut rng = rand::rng();
    let input: Vec<f32> = (0..session.input_dim())
        .map(|_| rng.random_range(-1.0..1.0))
        .collect();
    for _ in 0..WARMUP_ITERATIONS {
        session.predict(&input)?;
    }

    let mut total_ms = 0.0f64;
    let mut min_ms = f64::INFINITY;
    let mut max_ms = 0.0f64;
    for _ in 0..MEASURE_ITERATIONS {
        let start = Instant::now();
        session.predict(&input)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        total_ms += elapsed_ms;
        min_ms = min_ms.min(elapsed_ms);
        max_ms = max_ms.max(elapsed_ms);
    }

    let mean_ms = total_ms / MEASURE_ITERATIONS as f64;
    Ok(BenchmarkReport {
        iterations: MEASURE_ITERATIONS,
        mean_ms,
        min_ms,
        max_ms,
        rating: LatencyRating::from_mean_ms(mean_ms),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(LatencyRating::from_mean_ms(0.1), LatencyRating::Excellent);
        assert_eq!(LatencyRating::from_mean_ms(0.7), LatencyRating::Good);
        assert_eq!(LatencyRating::from_mean_ms(1.5), LatencyRating::Acceptable);
        assert_eq!(LatencyRating::from_mean_ms(2.0), LatencyRating::TooSlow);
    }
}
