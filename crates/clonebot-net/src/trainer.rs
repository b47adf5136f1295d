//! Epoch loop: minibatch optimization, validation, LR scheduling and
//! checkpoint side effects.

use std::path::PathBuf;

use anyhow::ensure;
use chrono::Utc;
use clonebot_schema::{ACTION_LEN, FEATURE_LEN, Sample};
use rand::{Rng, seq::SliceRandom as _};

use crate::{
    checkpoint::Checkpoint,
    optimizer::Adam,
    policy::PolicyNetwork,
    scheduler::ReduceLrOnPlateau,
};

/// Epochs between periodic checkpoints.
const CHECKPOINT_INTERVAL: usize = 10;

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub checkpoint_dir: PathBuf,
}

/// Summary of a completed [`Trainer::fit`] run.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub epochs_run: usize,
    pub best_val_loss: f32,
    pub final_learning_rate: f32,
}

pub struct Trainer {
    network: PolicyNetwork,
    optimizer: Adam,
    scheduler: ReduceLrOnPlateau,
    start_epoch: usize,
    best_val_loss: f32,
}

impl Trainer {
    #[must_use]
    pub fn new(network: PolicyNetwork, learning_rate: f32) -> Self {
        Self {
            network,
            optimizer: Adam::new(learning_rate),
            scheduler: ReduceLrOnPlateau::new(0.5, 5),
            start_epoch: 1,
            best_val_loss: f32::INFINITY,
        }
    }

    /// Continues a prior run. The next epoch picks up after the
    /// checkpoint's last completed one.
    #[must_use]
    pub fn resume(checkpoint: Checkpoint) -> Self {
        Self {
            network: checkpoint.network,
            optimizer: checkpoint.optimizer,
            scheduler: ReduceLrOnPlateau::new(0.5, 5),
            start_epoch: checkpoint.epoch + 1,
            best_val_loss: checkpoint.val_loss,
        }
    }

    #[must_use]
    pub fn network(&self) -> &PolicyNetwork {
        &self.network
    }

    /// Runs the epoch loop. Writes `best_model.json` whenever the
    /// validation loss improves and `checkpoint_epoch_N.json` every
    /// [`CHECKPOINT_INTERVAL`] epochs. With an empty validation set the
    /// training loss stands in as the improvement signal.
    pub fn fit<R>(
        &mut self,
        train: &[Sample],
        val: &[Sample],
        config: &TrainConfig,
        rng: &mut R,
    ) -> anyhow::Result<FitReport>
    where
        R: Rng,
    {
        ensure!(!train.is_empty(), "no training samples");
        ensure!(config.batch_size > 0, "batch size must be positive");
        let epochs = config.epochs;

        let mut indices: Vec<usize> = (0..train.len()).collect();
        let mut epochs_run = 0;
        for epoch in self.start_epoch..=epochs {
            indices.shuffle(rng);
            let mut loss_sum = 0.0f64;
            for chunk in indices.chunks(config.batch_size) {
                let (features, targets) = flatten(train, chunk);
                let loss = self.network.train_batch(
                    &features,
                    &targets,
                    chunk.len(),
                    &mut self.optimizer,
                    rng,
                );
                loss_sum += f64::from(loss) * chunk.len() as f64;
            }
            let train_loss = (loss_sum / train.len() as f64) as f32;

            let val_loss = if val.is_empty() {
                train_loss
            } else {
                self.batched_eval_loss(val, config.batch_size)
            };

            if self
                .scheduler
                .step(val_loss, &mut self.optimizer.learning_rate)
            {
                eprintln!(
                    "epoch {epoch}: plateau, reducing learning rate to {}",
                    self.optimizer.learning_rate
                );
            }
            eprintln!(
                "epoch {epoch}/{epochs}: train loss {train_loss:.6}, val loss {val_loss:.6}, \
                 lr {:.6}",
                self.optimizer.learning_rate
            );

            if val_loss < self.best_val_loss {
                self.best_val_loss = val_loss;
                let path = config.checkpoint_dir.join("best_model.json");
                self.checkpoint(epoch, val_loss).save(&path)?;
                eprintln!("epoch {epoch}: new best val loss, saved {}", path.display());
            }
            if epoch % CHECKPOINT_INTERVAL == 0 {
                let path = config
                    .checkpoint_dir
                    .join(format!("checkpoint_epoch_{epoch}.json"));
                self.checkpoint(epoch, val_loss).save(&path)?;
            }
            epochs_run += 1;
        }

        Ok(FitReport {
            epochs_run,
            best_val_loss: self.best_val_loss,
            final_learning_rate: self.optimizer.learning_rate,
        })
    }

    fn batched_eval_loss(&self, samples: &[Sample], batch_size: usize) -> f32 {
        let indices: Vec<usize> = (0..samples.len()).collect();
        let mut loss_sum = 0.0f64;
        for chunk in indices.chunks(batch_size) {
            let (features, targets) = flatten(samples, chunk);
            let loss = self.network.eval_loss(&features, &targets, chunk.len());
            loss_sum += f64::from(loss) * chunk.len() as f64;
        }
        (loss_sum / samples.len() as f64) as f32
    }

    fn checkpoint(&self, epoch: usize, val_loss: f32) -> Checkpoint {
        Checkpoint {
            epoch,
            val_loss,
            saved_at: Utc::now(),
            network: self.network.clone(),
            optimizer: self.optimizer.clone(),
        }
    }
}

fn flatten(samples: &[Sample], indices: &[usize]) -> (Vec<f32>, Vec<f32>) {
    let mut features = Vec::with_capacity(indices.len() * FEATURE_LEN);
    let mut targets = Vec::with_capacity(indices.len() * ACTION_LEN);
    for &i in indices {
        features.extend_from_slice(&samples[i].features);
        targets.extend_from_slice(&samples[i].actions);
    }
    (features, targets)
}
