//! Training checkpoints serialized as JSON.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{optimizer::Adam, policy::PolicyNetwork};

/// Everything needed to resume training: the network, the optimizer state
/// and the position in the epoch schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last completed epoch (1-based).
    pub epoch: usize,
    /// Validation loss at `epoch`.
    pub val_loss: f32,
    pub saved_at: DateTime<Utc>,
    pub network: PolicyNetwork,
    pub optimizer: Adam,
}

impl Checkpoint {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create checkpoint {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open checkpoint {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse checkpoint {}", path.display()))
    }
}
