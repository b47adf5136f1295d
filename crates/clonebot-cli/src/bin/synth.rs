//! Synthesizes small throwaway ONNX models for integration testing the
//! in-game inference runtime.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use clonebot_net::{Activation, Mlp};
use clonebot_onnx::{OnnxSession, model_from_mlp, write_model};
use rand::{SeedableRng as _, rngs::StdRng};

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Create small random ONNX models for runtime testing")]
struct SynthArgs {
    /// Directory the models are written to
    #[arg(long, default_value = "models")]
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = SynthArgs::parse();
    let mut rng = StdRng::from_os_rng();

    synthesize(&args.output_dir.join("test_model.onnx"), &[64, 32, 10], &mut rng)?;
    synthesize(
        &args.output_dir.join("test_model_small.onnx"),
        &[16, 8, 4],
        &mut rng,
    )?;
    Ok(())
}

/// Builds a random `dims` network with a tanh output, writes it and
/// round-trips it through an inference session.
fn synthesize(path: &Path, dims: &[usize], rng: &mut StdRng) -> anyhow::Result<()> {
    eprintln!(
        "creating test model {:?} -> {}",
        dims,
        path.display()
    );
    let network = Mlp::random(dims, Some(Activation::Tanh), rng);
    write_model(&model_from_mlp(&network), path)?;

    let session = OnnxSession::open(path, network.input_size())
        .context("synthesized model failed verification")?;
    anyhow::ensure!(
        session.output_dim() == network.output_size(),
        "model has {} outputs, expected {}",
        session.output_dim(),
        network.output_size()
    );
    eprintln!(
        "  verified: input [batch, {}] -> output [batch, {}]",
        network.input_size(),
        network.output_size()
    );
    println!("{}", path.display());
    Ok(())
}
