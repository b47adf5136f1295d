//! Loading and running exported models through `tract`.

use std::path::Path;

use anyhow::{Context as _, ensure};
use tract_onnx::prelude::*;

/// An optimized single-row inference plan over an exported model.
///
/// Opening a session is also the post-export verification step: a model
/// that parses, type-checks against its declared input width and runs a
/// dummy forward pass is considered sound.
pub struct OnnxSession {
    plan: TypedRunnableModel<TypedModel>,
    input_dim: usize,
    output_dim: usize,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("input_dim", &self.input_dim)
            .field("output_dim", &self.output_dim)
            .finish_non_exhaustive()
    }
}

impl OnnxSession {
    /// Loads `path`, pins the input to `[1, input_dim]` f32 and optimizes
    /// the graph.
    pub fn open(path: &Path, input_dim: usize) -> anyhow::Result<Self> {
        ensure!(input_dim > 0, "input_dim must be positive");

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to load model {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)),
            )
            .context("input shape does not match the model")?
            .into_optimized()
            .context("failed to optimize model")?
            .into_runnable()
            .context("failed to plan model")?;

        // A dummy forward pass pins down the output width and proves the
        // graph actually executes.
        let dummy = tract_ndarray::ArrayD::<f32>::zeros(tract_ndarray::IxDyn(&[1, input_dim]))
            .into_tvalue();
        let outputs = plan.run(tvec!(dummy)).context("model failed to run")?;
        ensure!(!outputs.is_empty(), "model produced no outputs");
        let output_dim = outputs[0]
            .to_array_view::<f32>()
            .context("model output is not f32")?
            .len();
        ensure!(output_dim > 0, "model output is empty");

        Ok(Self {
            plan,
            input_dim,
            output_dim,
        })
    }

    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Runs one feature vector through the model.
    pub fn predict(&self, input: &[f32]) -> anyhow::Result<Vec<f32>> {
        ensure!(
            input.len() == self.input_dim,
            "input has {} values, model expects {}",
            input.len(),
            self.input_dim
        );
        let tensor = tract_ndarray::ArrayD::from_shape_vec(
            tract_ndarray::IxDyn(&[1, self.input_dim]),
            input.to_vec(),
        )?
        .into_tvalue();
        let outputs = self.plan.run(tvec!(tensor)).context("model failed to run")?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .context("model output is not f32")?;
        Ok(view.iter().copied().collect())
    }
}
