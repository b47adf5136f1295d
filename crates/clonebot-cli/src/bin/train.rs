//! Behavior-clone trainer: recordings in, checkpoints and an ONNX policy
//! out.

use std::path::PathBuf;

use anyhow::{Context as _, bail, ensure};
use clap::Parser;
use clonebot_data::{Dataset, expand_data_pattern};
use clonebot_net::{Checkpoint, PolicyNetwork, TrainConfig, Trainer};
use clonebot_onnx::{OnnxSession, benchmark_model, model_from_policy, write_model};
use clonebot_schema::{EncoderConfig, FEATURE_LEN};
use rand::{SeedableRng as _, rngs::StdRng};

const ONNX_FILE_NAME: &str = "behavior_clone.onnx";
const DEFAULT_LEARNING_RATE: f32 = 0.001;
const DEFAULT_HIDDEN_SIZES: [usize; 3] = [128, 64, 32];
const DEFAULT_DROPOUT: f32 = 0.2;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Train a behavior-clone policy from gameplay recordings")]
struct TrainArgs {
    /// Recording file or glob pattern
    #[arg(long)]
    data: String,
    #[arg(long, default_value_t = 50)]
    epochs: usize,
    #[arg(long, default_value_t = 64)]
    batch_size: usize,
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    learning_rate: f32,
    /// Trunk layer widths
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_HIDDEN_SIZES)]
    hidden_sizes: Vec<usize>,
    #[arg(long, default_value_t = DEFAULT_DROPOUT)]
    dropout: f32,
    /// Fraction of samples held out for validation
    #[arg(long, default_value_t = 0.2)]
    val_split: f32,
    /// Resume from a previous checkpoint
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Directory for checkpoints and the exported model
    #[arg(long, default_value = "models")]
    output_dir: PathBuf,
    #[arg(long, default_value = "auto")]
    device: Device,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
enum Device {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

fn main() -> anyhow::Result<()> {
    let args = TrainArgs::parse();
    if args.device == Device::Cuda {
        bail!("no CUDA support is built in; use --device cpu");
    }
    ensure!(
        (0.0..1.0).contains(&args.dropout),
        "--dropout must be in [0, 1)"
    );
    ensure!(
        (0.0..1.0).contains(&args.val_split),
        "--val-split must be in [0, 1)"
    );
    ensure!(!args.hidden_sizes.is_empty(), "--hidden-sizes needs at least one width");

    let paths = expand_data_pattern(&args.data)?;
    if paths.is_empty() {
        bail!("no recording files found matching '{}'", args.data);
    }
    eprintln!("found {} recording files", paths.len());

    let (dataset, report) = Dataset::load_files(&paths, &EncoderConfig::default());
    eprintln!("{report}");
    if dataset.is_empty() {
        bail!("no valid samples in dataset");
    }

    let mut rng = StdRng::from_os_rng();
    let (train, val) = dataset.split(args.val_split, &mut rng);
    eprintln!(
        "train samples: {}, val samples: {}",
        train.len(),
        val.len()
    );

    let mut trainer = match &args.checkpoint {
        Some(path) => {
            for flag in ignored_resume_flags(&args) {
                eprintln!("warning: {flag} is ignored when resuming; the checkpoint's value wins");
            }
            let checkpoint = Checkpoint::load(path)?;
            eprintln!(
                "resuming from {} (epoch {})",
                path.display(),
                checkpoint.epoch
            );
            ensure!(
                checkpoint.network.input_size() == FEATURE_LEN,
                "checkpoint expects {} inputs",
                checkpoint.network.input_size()
            );
            Trainer::resume(checkpoint)
        }
        None => {
            let network =
                PolicyNetwork::random(FEATURE_LEN, &args.hidden_sizes, args.dropout, &mut rng);
            eprintln!(
                "new network: {} -> {:?} -> 9 ({} parameters)",
                FEATURE_LEN,
                args.hidden_sizes,
                network.param_count()
            );
            Trainer::new(network, args.learning_rate)
        }
    };

    let config = TrainConfig {
        epochs: args.epochs,
        batch_size: args.batch_size,
        checkpoint_dir: args.output_dir.clone(),
    };
    let report = trainer.fit(train.samples(), val.samples(), &config, &mut rng)?;
    eprintln!(
        "training complete: best val loss {:.6}",
        report.best_val_loss
    );

    let onnx_path = args.output_dir.join(ONNX_FILE_NAME);
    write_model(&model_from_policy(trainer.network()), &onnx_path)?;
    eprintln!("exported {}", onnx_path.display());

    let session = OnnxSession::open(&onnx_path, FEATURE_LEN)
        .context("exported model failed verification")?;
    ensure!(
        session.output_dim() == trainer.network().output_size(),
        "exported model has {} outputs, expected {}",
        session.output_dim(),
        trainer.network().output_size()
    );
    eprintln!("verified exported model, benchmarking...");
    eprintln!("{}", benchmark_model(&session)?);

    println!("best model: {}", args.output_dir.join("best_model.json").display());
    println!("onnx model: {}", onnx_path.display());
    Ok(())
}

/// Architecture and optimizer flags that a resumed checkpoint overrides.
fn ignored_resume_flags(args: &TrainArgs) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if args.learning_rate != DEFAULT_LEARNING_RATE {
        ignored.push("--learning-rate");
    }
    if args.hidden_sizes != DEFAULT_HIDDEN_SIZES {
        ignored.push("--hidden-sizes");
    }
    if args.dropout != DEFAULT_DROPOUT {
        ignored.push("--dropout");
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_args() -> TrainArgs {
        TrainArgs {
            data: "data/*.json".to_owned(),
            epochs: 50,
            batch_size: 64,
            learning_rate: DEFAULT_LEARNING_RATE,
            hidden_sizes: DEFAULT_HIDDEN_SIZES.to_vec(),
            dropout: DEFAULT_DROPOUT,
            val_split: 0.2,
            checkpoint: Some(PathBuf::from("models/best_model.json")),
            output_dir: PathBuf::from("models"),
            device: Device::Auto,
        }
    }

    #[test]
    fn test_default_resume_flags_produce_no_warnings() {
        assert!(ignored_resume_flags(&default_args()).is_empty());
    }

    #[test]
    fn test_overridden_architecture_flags_are_reported_on_resume() {
        let args = TrainArgs {
            learning_rate: 0.01,
            hidden_sizes: vec![64, 32],
            ..default_args()
        };
        assert_eq!(
            ignored_resume_flags(&args),
            ["--learning-rate", "--hidden-sizes"]
        );
    }
}
